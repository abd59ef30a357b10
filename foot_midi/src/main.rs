//! midi_check: plays the four foot-marker notes so you can confirm a synth
//! is connected before a performance.

use std::thread;
use std::time::Duration;

use foot_midi::{connect_first_port, MidiError, MidiPlayer, MidiSink, NullSink};
use foot_midi::FootTrigger;
use matte_core::{FootMarkers, ScreenPoint, FOOT_MARKER_COUNT};

fn main() {
    env_logger::init();

    println!();
    println!("╔══════════════════════════════════════════════════════════╗");
    println!("║              Green Screen — MIDI output check            ║");
    println!("╚══════════════════════════════════════════════════════════╝");
    println!();

    let sink: Box<dyn MidiSink> = match connect_first_port("midi_check") {
        Ok(s) => Box::new(s),
        Err(MidiError::NoPorts) => {
            eprintln!("  No MIDI output ports found.");
            eprintln!("  Linux: start `fluidsynth` or `timidity -iA` first.");
            Box::new(NullSink)
        }
        Err(e) => {
            eprintln!("  {e}");
            Box::new(NullSink)
        }
    };
    println!("  Port: {}", sink.name());

    let mut player = MidiPlayer::new(sink);
    player.select_instrument(0);

    // Step each foot down and up in turn, exactly as the tracker would.
    let mut trigger = FootTrigger::default();
    let mut markers = FootMarkers::default();
    for slot in 0..FOOT_MARKER_COUNT {
        println!("  Slot {slot} down");
        markers.set(slot, Some(ScreenPoint { x: 1.0, y: 1.0 }));
        trigger.fire(&markers, &mut player);
        thread::sleep(Duration::from_millis(400));

        markers.set(slot, None);
        trigger.fire(&markers, &mut player);
        thread::sleep(Duration::from_millis(100));
    }

    player.stop_all();
    println!();
    println!("  Done.");
}
