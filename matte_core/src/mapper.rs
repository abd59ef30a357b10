//! Depth → color coordinate registration.
//!
//! The depth and color cameras sit a few centimetres apart, so a depth pixel
//! and the color pixel showing the same point in the scene do not line up.
//! A [`Registration`] produces, for every depth pixel, the color-space
//! coordinate it corresponds to.  [`CoordinateMapper`] keeps the latest map
//! and refreshes it once per new depth frame.

use log::{trace, warn};
use thiserror::Error;

use crate::frame::{depth_mm, DepthFrame, FrameGeometry, Resolution};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MapError {
    #[error("depth frame is {got_w}x{got_h}, registration expects {want_w}x{want_h}")]
    ResolutionMismatch {
        got_w:  usize,
        got_h:  usize,
        want_w: usize,
        want_h: usize,
    },
    #[error("coordinate buffer holds {got} values, need {want}")]
    BufferLength { got: usize, want: usize },
    #[error("sensor registration failed: {0}")]
    Sensor(String),
}

// ════════════════════════════════════════════════════════════════════════════
// Registration trait
// ════════════════════════════════════════════════════════════════════════════

/// Anything that can register a depth frame against the color camera.
///
/// `out` is interleaved `(x, y)` pairs, one per depth pixel, in depth-grid
/// order.  Coordinates outside the color frame are allowed; the compositor
/// treats them as "no match".  Returning an error means the whole frame
/// failed, not a single pixel.
pub trait Registration {
    fn map_depth_frame(&self, depth: &DepthFrame, out: &mut [i32]) -> Result<(), MapError>;
}

// ════════════════════════════════════════════════════════════════════════════
// NominalRegistration: factory-default approximation
// ════════════════════════════════════════════════════════════════════════════

/// Registration from nominal optics: scale by the color-to-depth divisor, then
/// shift horizontally by the stereo parallax `baseline_px_m / depth_m`.
///
/// Pixels with no depth reading get no parallax.
#[derive(Clone, Copy, Debug)]
pub struct NominalRegistration {
    pub geometry:      FrameGeometry,
    /// Camera baseline times color focal length, in pixel·metres.
    pub baseline_px_m: f32,
}

impl NominalRegistration {
    /// ≈ 25 mm baseline × 531 px focal length at 640×480.
    pub const DEFAULT_BASELINE_PX_M: f32 = 13.3;

    pub fn new(geometry: FrameGeometry) -> Self {
        let scale = geometry.color.width as f32 / Resolution::COLOR_640X480.width as f32;
        NominalRegistration {
            geometry,
            baseline_px_m: Self::DEFAULT_BASELINE_PX_M * scale,
        }
    }

    /// Color coordinate for depth pixel `(x, y)` with raw sample `raw`.
    pub fn map_pixel(&self, x: usize, y: usize, raw: u16) -> (i32, i32) {
        let div = self.geometry.divisor as i32;
        let mm = depth_mm(raw);
        let shift = if mm == 0 {
            0
        } else {
            (self.baseline_px_m * 1000.0 / mm as f32).round() as i32
        };
        (x as i32 * div + shift, y as i32 * div)
    }
}

impl Registration for NominalRegistration {
    fn map_depth_frame(&self, depth: &DepthFrame, out: &mut [i32]) -> Result<(), MapError> {
        let want = self.geometry.depth;
        let got = depth.resolution();
        if got != want {
            return Err(MapError::ResolutionMismatch {
                got_w: got.width,
                got_h: got.height,
                want_w: want.width,
                want_h: want.height,
            });
        }
        if out.len() != want.pixel_count() * 2 {
            return Err(MapError::BufferLength { got: out.len(), want: want.pixel_count() * 2 });
        }

        for (i, &raw) in depth.pixels().iter().enumerate() {
            let (cx, cy) = self.map_pixel(i % want.width, i / want.width, raw);
            out[i * 2]     = cx;
            out[i * 2 + 1] = cy;
        }
        Ok(())
    }
}

// ════════════════════════════════════════════════════════════════════════════
// ColorCoordinateMap
// ════════════════════════════════════════════════════════════════════════════

/// One color-space `(x, y)` per depth pixel, stored interleaved.
///
/// Valid only for the depth frame it was computed from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ColorCoordinateMap {
    depth:  Resolution,
    coords: Vec<i32>,
}

impl ColorCoordinateMap {
    /// A map pointing every depth pixel at `(-1, -1)`, i.e. nowhere.
    pub fn new(depth: Resolution) -> Self {
        ColorCoordinateMap {
            depth,
            coords: vec![-1; depth.pixel_count() * 2],
        }
    }

    #[inline]
    pub fn get(&self, depth_index: usize) -> (i32, i32) {
        (self.coords[depth_index * 2], self.coords[depth_index * 2 + 1])
    }

    pub fn depth_resolution(&self) -> Resolution { self.depth }

    /// Raw interleaved coordinates; always `2 × depth pixel count` long.
    pub fn as_slice(&self) -> &[i32] { &self.coords }
}

// ════════════════════════════════════════════════════════════════════════════
// CoordinateMapper
// ════════════════════════════════════════════════════════════════════════════

/// Owns the current [`ColorCoordinateMap`].
///
/// [`refresh`](Self::refresh) maps into a scratch buffer and swaps it in only
/// on success, so a failed registration leaves the previous map in force.
#[derive(Debug)]
pub struct CoordinateMapper {
    map:     ColorCoordinateMap,
    scratch: Vec<i32>,
}

impl CoordinateMapper {
    pub fn new(depth: Resolution) -> Self {
        CoordinateMapper {
            map:     ColorCoordinateMap::new(depth),
            scratch: vec![-1; depth.pixel_count() * 2],
        }
    }

    pub fn map(&self) -> &ColorCoordinateMap { &self.map }

    pub fn refresh<R: Registration + ?Sized>(
        &mut self,
        depth: &DepthFrame,
        registration: &R,
    ) -> Result<(), MapError> {
        if let Err(e) = registration.map_depth_frame(depth, &mut self.scratch) {
            warn!("depth→color registration failed, keeping previous map: {e}");
            return Err(e);
        }
        std::mem::swap(&mut self.map.coords, &mut self.scratch);
        trace!("coordinate map refreshed for depth frame at {:?}", depth.timestamp());
        Ok(())
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
