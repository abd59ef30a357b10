//! Start-up configuration.

use std::time::Duration;

use matte_core::Resolution;

/// The background shipped with the binary: a dusk landscape.
pub const DEFAULT_BACKGROUND: &[u8] = include_bytes!("../assets/background.png");

/// Which [`Renderer`](crate::renderer::Renderer) to build at start-up.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RendererKind {
    /// A desktop window.
    #[default]
    Window,
    /// An off-screen canvas; nothing is shown.
    Headless,
}

/// Configuration for the full application.
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub depth_resolution: Resolution,
    pub color_resolution: Resolution,
    /// Nominal depth frame rate; sets the colour/depth pairing tolerance.
    pub depth_fps:        u32,
    pub renderer:         RendererKind,
    /// Start with the sensor in near-range mode.
    pub near_mode:        bool,
    pub midi:             bool,
    /// General MIDI program selected when the MIDI port opens.
    pub instrument:       u8,
    /// Encoded image (PNG or JPEG) drawn behind the performer.  `None` uses a
    /// procedural gradient.
    pub background:       Option<Vec<u8>>,
    /// Longest the loop blocks waiting on the sensor before pumping window
    /// input again.
    pub ui_poll:          Duration,
    pub window_title:     String,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            depth_resolution: Resolution::DEPTH_320X240,
            color_resolution: Resolution::COLOR_640X480,
            depth_fps:        30,
            renderer:         RendererKind::Window,
            near_mode:        false,
            midi:             true,
            instrument:       0,
            background:       Some(DEFAULT_BACKGROUND.to_vec()),
            ui_poll:          Duration::from_millis(20),
            window_title:     "Green Screen".to_string(),
        }
    }
}
