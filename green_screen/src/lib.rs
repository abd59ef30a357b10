//! # green_screen
//!
//! A depth-camera green screen.  The performer the sensor tracks is cut out
//! of the color image and laid over a static background, their feet are
//! marked with red dots, and a note sounds on a MIDI synth whenever a foot
//! comes down.
//!
//! ## Pipeline
//!
//! | Stage | Crate | What happens |
//! |---|---|---|
//! | Sensor | [`sensor`], [`sim`] | Depth, color and skeleton frames on three clocks |
//! | Sync | `frame_sync` | Decide when depth and color are a matching pair |
//! | Matte | `matte_core` | Depth → color registration, then cut out player pixels |
//! | Feet | `matte_core` | Smooth joints, project feet onto the output surface |
//! | Output | [`renderer`] | Background, matte, markers, status bar |
//! | Sound | `foot_midi` | Note on as a foot lands, note off as it lifts |
//!
//! ## Sensors
//!
//! * (default) **Simulation**: [`sim::SimulatedSensor`] plays a performer
//!   stepping in place in front of a wall.  No hardware needed.
//! * Any other device plugs in by implementing [`sensor::SensorSource`].
//!
//! ### Keys
//!
//! | Key | Action |
//! |---|---|
//! | `N` | Toggle near mode |
//! | `Escape` | Quit |

pub mod error;
pub mod config;
pub mod sensor;
pub mod sim;
pub mod background;
pub mod renderer;
pub mod app;
