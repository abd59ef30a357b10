//! Frame storage: depth, color, and the composite output.
//!
//! All buffers are allocated once at their stream's resolution and then
//! overwritten in place as new frames arrive.

use std::time::Duration;

use thiserror::Error;

// ════════════════════════════════════════════════════════════════════════════
// Pixel formats
// ════════════════════════════════════════════════════════════════════════════

/// Composite pixel meaning "do not draw here".
///
/// Zero RGB with the alpha byte fully set.  The renderer's blend stage treats
/// alpha as transparency, so this lets the background show through.
pub const TRANSPARENCY: u32 = 0xFF00_0000;

const PLAYER_INDEX_BITS: u16 = 3;
const PLAYER_INDEX_MASK: u16 = (1 << PLAYER_INDEX_BITS) - 1;

/// Player-segmentation index embedded in a raw depth sample (0 = no player).
#[inline]
pub fn player_index(raw: u16) -> u16 {
    raw & PLAYER_INDEX_MASK
}

/// Depth in millimetres of a raw depth sample.
#[inline]
pub fn depth_mm(raw: u16) -> u16 {
    raw >> PLAYER_INDEX_BITS
}

/// Pack a depth (mm) and a player index into one raw sample.
#[inline]
pub fn pack_depth(mm: u16, player: u16) -> u16 {
    (mm << PLAYER_INDEX_BITS) | (player & PLAYER_INDEX_MASK)
}

// ════════════════════════════════════════════════════════════════════════════
// Resolution / FrameGeometry
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Resolution {
    pub width:  usize,
    pub height: usize,
}

impl Resolution {
    pub const DEPTH_320X240: Resolution = Resolution { width: 320, height: 240 };
    pub const COLOR_640X480: Resolution = Resolution { width: 640, height: 480 };

    pub const fn new(width: usize, height: usize) -> Self {
        Resolution { width, height }
    }

    pub const fn pixel_count(&self) -> usize {
        self.width * self.height
    }

    /// True when `(x, y)` lies inside the frame.
    #[inline]
    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && (x as usize) < self.width && (y as usize) < self.height
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GeometryError {
    #[error("resolution {0}x{1} has a zero dimension")]
    Empty(usize, usize),
    #[error("color {color_w}x{color_h} is not an integer multiple of depth {depth_w}x{depth_h}")]
    NotDivisible {
        depth_w: usize,
        depth_h: usize,
        color_w: usize,
        color_h: usize,
    },
    #[error("color/depth ratio differs per axis ({x} horizontally, {y} vertically)")]
    UnevenDivisor { x: usize, y: usize },
}

/// The depth and color resolutions plus their integer ratio.
///
/// Color resolution must be the same integer multiple of depth resolution on
/// both axes; [`FrameGeometry::new`] refuses anything else.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameGeometry {
    pub depth:   Resolution,
    pub color:   Resolution,
    /// Color-to-depth divisor.
    pub divisor: usize,
}

impl FrameGeometry {
    pub fn new(depth: Resolution, color: Resolution) -> Result<Self, GeometryError> {
        for r in [depth, color] {
            if r.pixel_count() == 0 {
                return Err(GeometryError::Empty(r.width, r.height));
            }
        }
        if color.width % depth.width != 0 || color.height % depth.height != 0 {
            return Err(GeometryError::NotDivisible {
                depth_w: depth.width,
                depth_h: depth.height,
                color_w: color.width,
                color_h: color.height,
            });
        }
        let x = color.width / depth.width;
        let y = color.height / depth.height;
        if x != y {
            return Err(GeometryError::UnevenDivisor { x, y });
        }
        Ok(FrameGeometry { depth, color, divisor: x })
    }

    /// Depth-grid index holding the segmentation for color pixel `(x, y)`.
    /// Nearest-neighbour: no interpolation.
    #[inline]
    pub fn depth_index_for(&self, x: usize, y: usize) -> usize {
        x / self.divisor + (y / self.divisor) * self.depth.width
    }
}

// ════════════════════════════════════════════════════════════════════════════
// DepthFrame
// ════════════════════════════════════════════════════════════════════════════

/// Latest depth-and-player-index frame.
#[derive(Clone, Debug)]
pub struct DepthFrame {
    resolution: Resolution,
    pixels:     Vec<u16>,
    timestamp:  Duration,
}

impl DepthFrame {
    pub fn new(resolution: Resolution) -> Self {
        DepthFrame {
            resolution,
            pixels:    vec![0; resolution.pixel_count()],
            timestamp: Duration::ZERO,
        }
    }

    /// Overwrite this frame with `src`.
    ///
    /// A short source (e.g. a frame with no valid data) only overwrites its
    /// own length; the remainder keeps the previous contents.
    pub fn copy_from(&mut self, src: &[u16], timestamp: Duration) {
        let n = src.len().min(self.pixels.len());
        self.pixels[..n].copy_from_slice(&src[..n]);
        self.timestamp = timestamp;
    }

    pub fn resolution(&self) -> Resolution { self.resolution }
    pub fn pixels(&self)     -> &[u16]     { &self.pixels }
    pub fn pixels_mut(&mut self) -> &mut [u16] { &mut self.pixels }
    pub fn timestamp(&self)  -> Duration   { self.timestamp }

    pub fn set_timestamp(&mut self, timestamp: Duration) {
        self.timestamp = timestamp;
    }
}

// ════════════════════════════════════════════════════════════════════════════
// ColorFrame
// ════════════════════════════════════════════════════════════════════════════

/// Latest color frame, one 32-bit word per pixel.
#[derive(Clone, Debug)]
pub struct ColorFrame {
    resolution: Resolution,
    pixels:     Vec<u32>,
    timestamp:  Duration,
}

impl ColorFrame {
    pub fn new(resolution: Resolution) -> Self {
        ColorFrame {
            resolution,
            pixels:    vec![0; resolution.pixel_count()],
            timestamp: Duration::ZERO,
        }
    }

    pub fn copy_from(&mut self, src: &[u32], timestamp: Duration) {
        let n = src.len().min(self.pixels.len());
        self.pixels[..n].copy_from_slice(&src[..n]);
        self.timestamp = timestamp;
    }

    pub fn resolution(&self) -> Resolution { self.resolution }
    pub fn pixels(&self)     -> &[u32]     { &self.pixels }
    pub fn pixels_mut(&mut self) -> &mut [u32] { &mut self.pixels }
    pub fn timestamp(&self)  -> Duration   { self.timestamp }

    pub fn set_timestamp(&mut self, timestamp: Duration) {
        self.timestamp = timestamp;
    }

    /// Sample at `(x, y)`.  Caller guarantees the point is in bounds.
    #[inline]
    pub fn at(&self, x: usize, y: usize) -> u32 {
        self.pixels[x + y * self.resolution.width]
    }
}

// ════════════════════════════════════════════════════════════════════════════
// CompositeBuffer
// ════════════════════════════════════════════════════════════════════════════

/// Matted output at color resolution.
#[derive(Clone, Debug, PartialEq)]
pub struct CompositeBuffer {
    resolution: Resolution,
    pixels:     Vec<u32>,
}

impl CompositeBuffer {
    /// A fully transparent buffer.
    pub fn new(resolution: Resolution) -> Self {
        CompositeBuffer {
            resolution,
            pixels: vec![TRANSPARENCY; resolution.pixel_count()],
        }
    }

    /// Wrap pixels produced elsewhere; `None` if the length is wrong.
    pub fn from_pixels(resolution: Resolution, pixels: Vec<u32>) -> Option<Self> {
        (pixels.len() == resolution.pixel_count()).then_some(CompositeBuffer { resolution, pixels })
    }

    pub fn resolution(&self) -> Resolution { self.resolution }
    pub fn pixels(&self)     -> &[u32]     { &self.pixels }
    pub(crate) fn pixels_mut(&mut self) -> &mut [u32] { &mut self.pixels }

    /// Row stride in bytes.
    pub fn stride(&self) -> usize {
        self.resolution.width * std::mem::size_of::<u32>()
    }

    pub fn opaque_count(&self) -> usize {
        self.pixels.iter().filter(|&&p| p != TRANSPARENCY).count()
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn depth_packing() {
        let raw = pack_depth(2500, 3);
        assert_eq!(player_index(raw), 3);
        assert_eq!(depth_mm(raw), 2500);
        assert_eq!(player_index(pack_depth(800, 0)), 0);
    }

    #[test]
    fn geometry_standard_divisor() {
        let g = FrameGeometry::new(Resolution::DEPTH_320X240, Resolution::COLOR_640X480).unwrap();
        assert_eq!(g.divisor, 2);
        assert_eq!(g.depth_index_for(0, 0), 0);
        assert_eq!(g.depth_index_for(1, 1), 0);
        assert_eq!(g.depth_index_for(2, 0), 1);
        assert_eq!(g.depth_index_for(0, 2), 320);
        assert_eq!(g.depth_index_for(639, 479), 320 * 240 - 1);
    }

    #[test]
    fn geometry_rejects_fractional_ratio() {
        let err = FrameGeometry::new(Resolution::new(300, 240), Resolution::COLOR_640X480);
        assert!(matches!(err, Err(GeometryError::NotDivisible { .. })));
    }

    #[test]
    fn geometry_rejects_uneven_axes() {
        let err = FrameGeometry::new(Resolution::new(320, 240), Resolution::new(640, 720));
        assert_eq!(err, Err(GeometryError::UnevenDivisor { x: 2, y: 3 }));
    }

    #[test]
    fn geometry_rejects_empty() {
        assert!(FrameGeometry::new(Resolution::new(0, 240), Resolution::COLOR_640X480).is_err());
    }

    #[test]
    fn composite_starts_transparent() {
        let c = CompositeBuffer::new(Resolution::new(4, 3));
        assert_eq!(c.pixels().len(), 12);
        assert_eq!(c.opaque_count(), 0);
        assert_eq!(c.stride(), 16);
    }

    #[test]
    fn short_copy_keeps_tail() {
        let mut d = DepthFrame::new(Resolution::new(2, 2));
        d.copy_from(&[1, 2, 3, 4], Duration::from_millis(5));
        d.copy_from(&[9], Duration::from_millis(6));
        assert_eq!(d.pixels(), &[9, 2, 3, 4]);
        assert_eq!(d.timestamp(), Duration::from_millis(6));
    }

    #[test]
    fn contains_bounds() {
        let r = Resolution::new(100, 100);
        assert!(r.contains(0, 0));
        assert!(r.contains(99, 99));
        assert!(!r.contains(100, 50));
        assert!(!r.contains(-1, 0));
    }
}
