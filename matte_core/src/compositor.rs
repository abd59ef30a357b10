//! The matting pass.
//!
//! Walks the color-resolution output and, per pixel, either copies a color
//! sample (a segmented player is there and the registration found a matching
//! color pixel) or writes [`TRANSPARENCY`].
//!
//! The whole buffer is recomputed every pass.  Segmentation can change at any
//! pixel between frames, so there is no dirty-region tracking.

use crate::frame::{player_index, ColorFrame, CompositeBuffer, DepthFrame, FrameGeometry, TRANSPARENCY};
use crate::mapper::ColorCoordinateMap;

/// Produce `out` from the latest depth, color and coordinate map.
///
/// All four buffers must match `geometry`; mismatches are a programming
/// error and panic on the first out-of-range index.
pub fn compose(
    geometry: &FrameGeometry,
    depth:    &DepthFrame,
    color:    &ColorFrame,
    map:      &ColorCoordinateMap,
    out:      &mut CompositeBuffer,
) {
    let color_res = geometry.color;
    let depth_px  = depth.pixels();
    let dst       = out.pixels_mut();

    for y in 0..color_res.height {
        let row = &mut dst[y * color_res.width..(y + 1) * color_res.width];
        for (x, px) in row.iter_mut().enumerate() {
            let depth_index = geometry.depth_index_for(x, y);

            *px = if player_index(depth_px[depth_index]) == 0 {
                TRANSPARENCY
            } else {
                let (cx, cy) = map.get(depth_index);
                if color_res.contains(cx, cy) {
                    color.at(cx as usize, cy as usize)
                } else {
                    // segmented, but nothing to sample
                    TRANSPARENCY
                }
            };
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
