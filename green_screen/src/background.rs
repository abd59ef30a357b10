//! The static image drawn behind the performer.

use image::imageops::FilterType;
use log::debug;
use matte_core::Resolution;

use crate::error::RenderError;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Background {
    resolution: Resolution,
    pixels:     Vec<u32>,
}

impl Background {
    /// A vertical gradient, dark blue at the top to teal at the bottom.
    pub fn procedural(resolution: Resolution) -> Self {
        let h = resolution.height.max(1) as u32;
        let mut pixels = Vec::with_capacity(resolution.pixel_count());
        for y in 0..resolution.height as u32 {
            let g = 0x20 + 0x60 * y / h;
            let b = 0x60 + 0x40 * y / h;
            let row = 0xFF000000 | (0x10 << 16) | (g << 8) | b;
            pixels.extend(std::iter::repeat(row).take(resolution.width));
        }
        Background { resolution, pixels }
    }

    /// Decode PNG or JPEG bytes and stretch the image to `resolution`.
    pub fn decode(bytes: &[u8], resolution: Resolution) -> Result<Self, RenderError> {
        let img = image::load_from_memory(bytes).map_err(|e| RenderError::Background(e.to_string()))?;
        debug!(
            "background {}x{} scaled to {}x{}",
            img.width(), img.height(), resolution.width, resolution.height,
        );
        let rgba = img
            .resize_exact(resolution.width as u32, resolution.height as u32, FilterType::CatmullRom)
            .to_rgba8();
        let pixels = rgba
            .pixels()
            .map(|p| {
                let [r, g, b, _] = p.0;
                0xFF000000 | (r as u32) << 16 | (g as u32) << 8 | b as u32
            })
            .collect();
        Ok(Background { resolution, pixels })
    }

    pub fn resolution(&self) -> Resolution { self.resolution }
    pub fn pixels(&self)     -> &[u32]     { &self.pixels }

    #[inline]
    pub fn at(&self, x: usize, y: usize) -> u32 {
        self.pixels[y * self.resolution.width + x]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_BACKGROUND;

    #[test]
    fn procedural_fills_every_pixel() {
        let bg = Background::procedural(Resolution::new(8, 4));
        assert_eq!(bg.pixels().len(), 32);
        assert!(bg.pixels().iter().all(|&p| p >> 24 == 0xFF));
        // gets lighter towards the bottom
        assert!(bg.at(0, 3) & 0xFF > bg.at(0, 0) & 0xFF);
    }

    #[test]
    fn bundled_background_decodes_at_any_size() {
        let bg = Background::decode(DEFAULT_BACKGROUND, Resolution::COLOR_640X480).unwrap();
        assert_eq!(bg.resolution(), Resolution::COLOR_640X480);
        assert_eq!(bg.pixels().len(), 640 * 480);

        let small = Background::decode(DEFAULT_BACKGROUND, Resolution::new(20, 10)).unwrap();
        assert_eq!(small.pixels().len(), 200);
    }

    #[test]
    fn garbage_is_a_background_error() {
        let err = Background::decode(b"not an image", Resolution::new(4, 4)).unwrap_err();
        assert!(matches!(err, RenderError::Background(_)));
    }
}
