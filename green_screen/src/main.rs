//! Interactive entry point.

use anyhow::Context;
use green_screen::app::run;
use green_screen::config::AppConfig;

fn main() -> anyhow::Result<()> {
    env_logger::init();

    println!();
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║        Green Screen — depth matte with foot-fall MIDI        ║");
    println!("╚══════════════════════════════════════════════════════════════╝");
    println!();
    println!("  Sensor: simulated performer");
    println!("  Keys:   N = near mode   Esc = quit");
    println!();
    println!("  Opening window…");
    println!();

    run(AppConfig::default()).context("green screen stopped")
}
