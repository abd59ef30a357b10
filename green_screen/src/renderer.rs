//! Software-rendered output.
//!
//! Every renderer paints the same [`Canvas`]:
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │  background image (stretched to the surface)  │
//! │                                              │
//! │        performer, alpha-blended on top       │
//! │                                              │
//! │            ●            ●   foot markers     │
//! │  status text                 key legend      │
//! └──────────────────────────────────────────────┘
//! ```
//!
//! [`WindowRenderer`] puts it on screen with `minifb`; [`HeadlessRenderer`]
//! keeps it in memory.

use std::time::Duration;

use log::{debug, info, warn};
use matte_core::{CompositeBuffer, FootMarkers, Resolution};
use minifb::{Key, KeyRepeat, Window, WindowOptions};

use crate::background::Background;
use crate::error::RenderError;

// ════════════════════════════════════════════════════════════════════════════
// Layout constants
// ════════════════════════════════════════════════════════════════════════════

const MARKER_RADIUS: isize = 10;
const MARKER_COLOR:  u32   = 0xFFFF0000;
const FONT_SCALE:    usize = 2;
const STATUS_H:      usize = 5 * FONT_SCALE + 6;
const STATUS_BG:     u32   = 0xFF101820;
const STATUS_FG:     u32   = 0xFFEEEEEE;
const LEGEND_FG:     u32   = 0xFF888888;
const LEGEND:        &str  = "N=near mode  Esc=quit";

// ════════════════════════════════════════════════════════════════════════════
// Renderer trait
// ════════════════════════════════════════════════════════════════════════════

/// Window input gathered since the last poll.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct UiInput {
    pub toggle_near_mode: bool,
    pub quit:             bool,
}

/// Something that can show a composite frame.
pub trait Renderer {
    /// Prepare for composites of `width × height` pixels, `stride` bytes per
    /// row.
    fn initialize(&mut self, width: usize, height: usize, stride: usize) -> Result<(), RenderError>;

    /// Background, then the composite blended on top, then the foot markers.
    fn draw(&mut self, composite: &CompositeBuffer, feet: &FootMarkers) -> Result<(), RenderError>;

    /// Current output size; foot markers are projected into this space.
    fn surface_size(&self) -> (usize, usize);

    fn set_status(&mut self, status: &str);

    fn poll_input(&mut self) -> UiInput { UiInput::default() }

    fn release(&mut self);
}

impl<R: Renderer + ?Sized> Renderer for Box<R> {
    fn initialize(&mut self, width: usize, height: usize, stride: usize) -> Result<(), RenderError> {
        (**self).initialize(width, height, stride)
    }
    fn draw(&mut self, composite: &CompositeBuffer, feet: &FootMarkers) -> Result<(), RenderError> {
        (**self).draw(composite, feet)
    }
    fn surface_size(&self) -> (usize, usize) { (**self).surface_size() }
    fn set_status(&mut self, status: &str)   { (**self).set_status(status) }
    fn poll_input(&mut self) -> UiInput      { (**self).poll_input() }
    fn release(&mut self)                    { (**self).release() }
}

fn check_stride(width: usize, stride: usize) -> Result<(), RenderError> {
    if stride != width * 4 {
        return Err(RenderError::Stride { width, stride });
    }
    Ok(())
}

/// Decode `bytes`, or fall back to the gradient.
fn load_background(bytes: Option<&[u8]>, resolution: Resolution) -> Background {
    match bytes.map(|b| Background::decode(b, resolution)) {
        Some(Ok(bg)) => bg,
        Some(Err(e)) => {
            warn!("{e}; using the plain gradient");
            Background::procedural(resolution)
        }
        None => Background::procedural(resolution),
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Canvas
// ════════════════════════════════════════════════════════════════════════════

/// An ARGB pixel buffer the size of the output surface.
#[derive(Clone, Debug, Default)]
pub struct Canvas {
    width:  usize,
    height: usize,
    buf:    Vec<u32>,
}

impl Canvas {
    pub fn new(width: usize, height: usize) -> Self {
        Canvas { width, height, buf: vec![0xFF000000; width * height] }
    }

    pub fn resize(&mut self, width: usize, height: usize) {
        if (width, height) != (self.width, self.height) {
            debug!("canvas resized to {width}x{height}");
            *self = Canvas::new(width, height);
        }
    }

    pub fn size(&self)   -> (usize, usize) { (self.width, self.height) }
    pub fn pixels(&self) -> &[u32]         { &self.buf }

    pub fn at(&self, x: usize, y: usize) -> u32 {
        self.buf[y * self.width + x]
    }

    /// One full frame.
    pub fn paint(
        &mut self,
        background: &Background,
        composite:  &CompositeBuffer,
        feet:       &FootMarkers,
        status:     &str,
    ) {
        if self.width == 0 || self.height == 0 {
            return;
        }
        self.draw_background(background);
        self.draw_matte(composite);
        for p in feet.present() {
            self.fill_circle(p.x.round() as isize, p.y.round() as isize, MARKER_RADIUS, MARKER_COLOR);
        }

        let y = self.height.saturating_sub(STATUS_H);
        self.fill_rect(0, y, self.width, STATUS_H, STATUS_BG);
        self.draw_label(status, 6, y + 3, STATUS_FG);
        let legend_w = LEGEND.chars().count() * 4 * FONT_SCALE;
        self.draw_label(LEGEND, self.width.saturating_sub(legend_w + 6), y + 3, LEGEND_FG);
    }

    fn draw_background(&mut self, bg: &Background) {
        let res = bg.resolution();
        for y in 0..self.height {
            let sy = y * res.height / self.height;
            for x in 0..self.width {
                let sx = x * res.width / self.width;
                self.buf[y * self.width + x] = bg.at(sx, sy);
            }
        }
    }

    /// Nearest-neighbour stretch of the composite over whatever is already
    /// drawn.  The alpha byte is inverted: 0 is opaque, 0xFF fully
    /// transparent.
    fn draw_matte(&mut self, composite: &CompositeBuffer) {
        let res = composite.resolution();
        let src = composite.pixels();
        for y in 0..self.height {
            let sy = y * res.height / self.height;
            for x in 0..self.width {
                let sx = x * res.width / self.width;
                let s = src[sy * res.width + sx];
                let a = s >> 24;
                let d = &mut self.buf[y * self.width + x];
                *d = match a {
                    0xFF => *d,
                    0    => 0xFF000000 | s,
                    _    => blend(s, *d, a as f32 / 255.0),
                };
            }
        }
    }

    fn fill_rect(&mut self, x: usize, y: usize, w: usize, h: usize, color: u32) {
        for row in y..(y + h).min(self.height) {
            for col in x..(x + w).min(self.width) {
                self.buf[row * self.width + col] = color;
            }
        }
    }

    fn set_pixel(&mut self, x: isize, y: isize, color: u32) {
        if x >= 0 && y >= 0 && (x as usize) < self.width && (y as usize) < self.height {
            self.buf[y as usize * self.width + x as usize] = color;
        }
    }

    fn fill_circle(&mut self, cx: isize, cy: isize, r: isize, color: u32) {
        for dy in -r..=r {
            for dx in -r..=r {
                if dx * dx + dy * dy <= r * r {
                    self.set_pixel(cx + dx, cy + dy, color);
                }
            }
        }
    }

    /// 3×5 bitmap font, each dot `FONT_SCALE` pixels square.
    fn draw_label(&mut self, text: &str, x: usize, y: usize, color: u32) {
        let mut cx = x;
        for ch in text.chars() {
            if cx + 4 * FONT_SCALE > self.width { break; }
            for (row, &bits) in char_glyph(ch).iter().enumerate() {
                for col in 0..3usize {
                    if bits & (1 << (2 - col)) == 0 { continue; }
                    let px = (cx + col * FONT_SCALE) as isize;
                    let py = (y + row * FONT_SCALE) as isize;
                    for d in 0..(FONT_SCALE * FONT_SCALE) as isize {
                        self.set_pixel(px + d % FONT_SCALE as isize, py + d / FONT_SCALE as isize, color);
                    }
                }
            }
            cx += 4 * FONT_SCALE; // 3 wide + 1 gap
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Minimal 3×5 bitmap font
// ────────────────────────────────────────────────────────────────────────────

fn char_glyph(c: char) -> [u8; 5] {
    match c {
        '0' => [0b111, 0b101, 0b101, 0b101, 0b111],
        '1' => [0b010, 0b110, 0b010, 0b010, 0b111],
        '2' => [0b111, 0b001, 0b111, 0b100, 0b111],
        '3' => [0b111, 0b001, 0b111, 0b001, 0b111],
        '4' => [0b101, 0b101, 0b111, 0b001, 0b001],
        '5' => [0b111, 0b100, 0b111, 0b001, 0b111],
        '6' => [0b111, 0b100, 0b111, 0b101, 0b111],
        '7' => [0b111, 0b001, 0b001, 0b001, 0b001],
        '8' => [0b111, 0b101, 0b111, 0b101, 0b111],
        '9' => [0b111, 0b101, 0b111, 0b001, 0b111],
        'a' | 'A' => [0b111, 0b101, 0b111, 0b101, 0b101],
        'b' | 'B' => [0b110, 0b101, 0b110, 0b101, 0b110],
        'c' | 'C' => [0b111, 0b100, 0b100, 0b100, 0b111],
        'd' | 'D' => [0b110, 0b101, 0b101, 0b101, 0b110],
        'e' | 'E' => [0b111, 0b100, 0b111, 0b100, 0b111],
        'f' | 'F' => [0b111, 0b100, 0b111, 0b100, 0b100],
        'g' | 'G' => [0b111, 0b100, 0b101, 0b101, 0b111],
        'h' | 'H' => [0b101, 0b101, 0b111, 0b101, 0b101],
        'i' | 'I' => [0b111, 0b010, 0b010, 0b010, 0b111],
        'j' | 'J' => [0b001, 0b001, 0b001, 0b101, 0b111],
        'k' | 'K' => [0b101, 0b101, 0b110, 0b101, 0b101],
        'l' | 'L' => [0b100, 0b100, 0b100, 0b100, 0b111],
        'm' | 'M' => [0b101, 0b111, 0b101, 0b101, 0b101],
        'n' | 'N' => [0b111, 0b101, 0b101, 0b101, 0b101],
        'o' | 'O' => [0b111, 0b101, 0b101, 0b101, 0b111],
        'p' | 'P' => [0b111, 0b101, 0b111, 0b100, 0b100],
        'q' | 'Q' => [0b111, 0b101, 0b101, 0b111, 0b001],
        'r' | 'R' => [0b110, 0b101, 0b110, 0b101, 0b101],
        's' | 'S' => [0b111, 0b100, 0b111, 0b001, 0b111],
        't' | 'T' => [0b111, 0b010, 0b010, 0b010, 0b010],
        'u' | 'U' => [0b101, 0b101, 0b101, 0b101, 0b111],
        'v' | 'V' => [0b101, 0b101, 0b101, 0b010, 0b010],
        'w' | 'W' => [0b101, 0b101, 0b101, 0b111, 0b101],
        'x' | 'X' => [0b101, 0b101, 0b010, 0b101, 0b101],
        'y' | 'Y' => [0b101, 0b101, 0b111, 0b010, 0b010],
        'z' | 'Z' => [0b111, 0b001, 0b010, 0b100, 0b111],
        '!' => [0b010, 0b010, 0b010, 0b000, 0b010],
        '(' => [0b001, 0b010, 0b010, 0b010, 0b001],
        ')' => [0b100, 0b010, 0b010, 0b010, 0b100],
        '/' => [0b001, 0b001, 0b010, 0b100, 0b100],
        '-' => [0b000, 0b000, 0b111, 0b000, 0b000],
        '.' => [0b000, 0b000, 0b000, 0b000, 0b010],
        ',' => [0b000, 0b000, 0b000, 0b010, 0b100],
        ':' => [0b000, 0b010, 0b000, 0b010, 0b000],
        '=' => [0b000, 0b111, 0b000, 0b111, 0b000],
        '+' => [0b000, 0b010, 0b111, 0b010, 0b000],
        ' ' => [0b000, 0b000, 0b000, 0b000, 0b000],
        _   => [0b000, 0b000, 0b010, 0b000, 0b000], // fallback dot
    }
}

/// Mix two ARGB colors. `t` = 0.0 → all `a`, `t` = 1.0 → all `b`.
fn blend(a: u32, b: u32, t: f32) -> u32 {
    let t = t.clamp(0.0, 1.0);
    let lerp = |ca: u32, cb: u32| (ca as f32 * (1.0 - t) + cb as f32 * t).round() as u32;
    let ar = (a >> 16) & 0xFF; let br = (b >> 16) & 0xFF;
    let ag = (a >>  8) & 0xFF; let bg = (b >>  8) & 0xFF;
    let ab =  a        & 0xFF; let bb =  b        & 0xFF;
    0xFF000000 | (lerp(ar, br) << 16) | (lerp(ag, bg) << 8) | lerp(ab, bb)
}

// ════════════════════════════════════════════════════════════════════════════
// HeadlessRenderer
// ════════════════════════════════════════════════════════════════════════════

/// Paints into memory only.  Used by tests and when no display is wanted.
#[derive(Debug)]
pub struct HeadlessRenderer {
    surface:     (usize, usize),
    bg_bytes:    Option<Vec<u8>>,
    background:  Option<Background>,
    canvas:      Canvas,
    status:      String,
    frames:      u64,
    last_feet:   FootMarkers,
    frame_limit: Option<u64>,
}

impl HeadlessRenderer {
    /// Surface of `width × height`; background is the plain gradient.
    pub fn new(width: usize, height: usize) -> Self {
        HeadlessRenderer {
            surface:     (width, height),
            bg_bytes:    None,
            background:  None,
            canvas:      Canvas::default(),
            status:      String::new(),
            frames:      0,
            last_feet:   FootMarkers::default(),
            frame_limit: None,
        }
    }

    pub fn with_background(mut self, bytes: Vec<u8>) -> Self {
        self.bg_bytes = Some(bytes);
        self
    }

    /// Ask to quit once `frames` frames have been drawn.
    pub fn with_frame_limit(mut self, frames: u64) -> Self {
        self.frame_limit = Some(frames);
        self
    }

    pub fn frames(&self)    -> u64          { self.frames }
    pub fn canvas(&self)    -> &Canvas      { &self.canvas }
    pub fn status(&self)    -> &str         { &self.status }
    pub fn last_feet(&self) -> &FootMarkers { &self.last_feet }

    /// Change the surface size, as a window resize would.
    pub fn resize(&mut self, width: usize, height: usize) {
        self.surface = (width, height);
    }
}

impl Renderer for HeadlessRenderer {
    fn initialize(&mut self, width: usize, height: usize, stride: usize) -> Result<(), RenderError> {
        check_stride(width, stride)?;
        self.background = Some(load_background(self.bg_bytes.as_deref(), Resolution::new(width, height)));
        Ok(())
    }

    fn draw(&mut self, composite: &CompositeBuffer, feet: &FootMarkers) -> Result<(), RenderError> {
        let background = self.background.as_ref().ok_or(RenderError::NotInitialized)?;
        self.canvas.resize(self.surface.0, self.surface.1);
        self.canvas.paint(background, composite, feet, &self.status);
        self.last_feet = *feet;
        self.frames += 1;
        Ok(())
    }

    fn surface_size(&self) -> (usize, usize) { self.surface }

    fn set_status(&mut self, status: &str) {
        self.status = status.to_string();
    }

    fn poll_input(&mut self) -> UiInput {
        UiInput {
            toggle_near_mode: false,
            quit: self.frame_limit.is_some_and(|n| self.frames >= n),
        }
    }

    fn release(&mut self) {
        self.background = None;
    }
}

// ════════════════════════════════════════════════════════════════════════════
// WindowRenderer
// ════════════════════════════════════════════════════════════════════════════

/// A resizable `minifb` window.
///
/// If presenting a frame fails the window is treated as lost: it is dropped
/// and a fresh one is opened on the next draw.
pub struct WindowRenderer {
    title:      String,
    bg_bytes:   Option<Vec<u8>>,
    window:     Option<Window>,
    /// Size to use when (re)opening the window.
    size:       (usize, usize),
    background: Option<Background>,
    canvas:     Canvas,
    status:     String,
    /// A frame was presented since the last input poll.
    presented:  bool,
}

impl WindowRenderer {
    pub fn new(title: &str, background: Option<Vec<u8>>) -> Self {
        WindowRenderer {
            title:      title.to_string(),
            bg_bytes:   background,
            window:     None,
            size:       (0, 0),
            background: None,
            canvas:     Canvas::default(),
            status:     String::new(),
            presented:  false,
        }
    }

    pub fn is_open(&self) -> bool {
        self.window.as_ref().is_some_and(|w| w.is_open())
    }

    fn open_window(&self) -> Result<Window, RenderError> {
        let (w, h) = self.size;
        let mut window = Window::new(
            &self.title,
            w, h,
            WindowOptions {
                resize: true,
                ..WindowOptions::default()
            },
        ).map_err(|e| RenderError::Window(e.to_string()))?;

        window.limit_update_rate(Some(Duration::from_millis(16))); // ~60fps
        Ok(window)
    }
}

impl Renderer for WindowRenderer {
    fn initialize(&mut self, width: usize, height: usize, stride: usize) -> Result<(), RenderError> {
        check_stride(width, stride)?;
        self.size = (width, height);
        self.background = Some(load_background(self.bg_bytes.as_deref(), Resolution::new(width, height)));
        self.window = Some(self.open_window()?);
        info!("window open at {width}x{height}");
        Ok(())
    }

    fn draw(&mut self, composite: &CompositeBuffer, feet: &FootMarkers) -> Result<(), RenderError> {
        let background = self.background.as_ref().ok_or(RenderError::NotInitialized)?;

        if self.window.is_none() {
            match self.open_window() {
                Ok(w) => {
                    info!("window recreated");
                    self.window = Some(w);
                }
                Err(e) => {
                    warn!("{e}; will retry next frame");
                    return Ok(());
                }
            }
        }
        let Some(window) = self.window.as_mut() else {
            return Ok(());
        };

        let (w, h) = window.get_size();
        self.canvas.resize(w, h);
        self.canvas.paint(background, composite, feet, &self.status);

        if let Err(e) = window.update_with_buffer(self.canvas.pixels(), w, h) {
            warn!("present failed ({e}); discarding the window");
            self.size = (w.max(1), h.max(1));
            self.window = None;
        }
        self.presented = true;
        Ok(())
    }

    fn surface_size(&self) -> (usize, usize) {
        self.window.as_ref().map_or(self.size, |w| w.get_size())
    }

    fn set_status(&mut self, status: &str) {
        self.status = status.to_string();
    }

    fn poll_input(&mut self) -> UiInput {
        let Some(window) = self.window.as_mut() else {
            return UiInput::default();
        };
        // key state only refreshes when the window is updated
        if !self.presented {
            window.update();
        }
        self.presented = false;

        UiInput {
            toggle_near_mode: window.is_key_pressed(Key::N, KeyRepeat::No),
            quit: !window.is_open() || window.is_key_down(Key::Escape),
        }
    }

    fn release(&mut self) {
        if self.window.take().is_some() {
            info!("window closed");
        }
        self.background = None;
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use matte_core::{ScreenPoint, TRANSPARENCY};

    #[test]
    fn blend_endpoints() {
        assert_eq!(blend(0xFF102030, 0xFFA0B0C0, 0.0), 0xFF102030);
        assert_eq!(blend(0xFF102030, 0xFFA0B0C0, 1.0), 0xFFA0B0C0);
        assert_eq!(blend(0xFF000000, 0xFF0000FF, 0.5), 0xFF000080);
    }

    #[test]
    fn transparent_composite_shows_background() {
        let res = Resolution::new(8, 40);
        let bg = Background::procedural(res);
        let composite = CompositeBuffer::new(res);
        let mut canvas = Canvas::new(8, 40);
        canvas.paint(&bg, &composite, &FootMarkers::default(), "");
        // rows above the status bar are pure background
        assert_eq!(canvas.at(3, 0), bg.at(3, 0));
        assert!(composite.pixels().iter().all(|&p| p == TRANSPARENCY));
    }

    #[test]
    fn opaque_composite_covers_background_and_stretches() {
        let res = Resolution::new(2, 2);
        let bg = Background::procedural(Resolution::new(40, 40));
        let composite = CompositeBuffer::from_pixels(res, vec![0x00112233, TRANSPARENCY, TRANSPARENCY, TRANSPARENCY]).unwrap();
        let mut canvas = Canvas::new(40, 40);
        canvas.draw_background(&bg);
        canvas.draw_matte(&composite);
        // top-left quarter is the performer, the rest is background
        assert_eq!(canvas.at(0, 0), 0xFF112233);
        assert_eq!(canvas.at(19, 19), 0xFF112233);
        assert_eq!(canvas.at(20, 0), bg.at(20, 0));
    }

    #[test]
    fn marker_is_a_red_disc() {
        let res = Resolution::new(100, 100);
        let bg = Background::procedural(res);
        let mut feet = FootMarkers::default();
        feet.set(0, Some(ScreenPoint { x: 50.0, y: 40.0 }));
        let mut canvas = Canvas::new(100, 100);
        canvas.paint(&bg, &CompositeBuffer::new(res), &feet, "");
        assert_eq!(canvas.at(50, 40), MARKER_COLOR);
        assert_eq!(canvas.at(60, 40), MARKER_COLOR);
        assert_ne!(canvas.at(61, 40), MARKER_COLOR);
        assert_ne!(canvas.at(58, 48), MARKER_COLOR);
    }

    #[test]
    fn marker_off_screen_is_clipped() {
        let res = Resolution::new(20, 20);
        let mut feet = FootMarkers::default();
        feet.set(1, Some(ScreenPoint { x: -5.0, y: 300.0 }));
        let mut canvas = Canvas::new(20, 20);
        canvas.paint(&Background::procedural(res), &CompositeBuffer::new(res), &feet, "");
        assert!(canvas.pixels().iter().all(|&p| p != MARKER_COLOR));
    }

    #[test]
    fn status_text_lands_in_the_status_bar() {
        let res = Resolution::new(200, 60);
        let mut canvas = Canvas::new(200, 60);
        canvas.paint(&Background::procedural(res), &CompositeBuffer::new(res), &FootMarkers::default(), "HI");
        let bar = 60 - STATUS_H;
        let lit = (bar..60).flat_map(|y| (0..20).map(move |x| (x, y)))
            .filter(|&(x, y)| canvas.at(x, y) == STATUS_FG)
            .count();
        assert!(lit > 0);
    }

    #[test]
    fn headless_needs_initialize() {
        let mut r = HeadlessRenderer::new(64, 48);
        let c = CompositeBuffer::new(Resolution::new(64, 48));
        assert!(matches!(r.draw(&c, &FootMarkers::default()), Err(RenderError::NotInitialized)));
        r.initialize(64, 48, 64 * 4).unwrap();
        r.draw(&c, &FootMarkers::default()).unwrap();
        assert_eq!(r.frames(), 1);
        assert_eq!(r.canvas().size(), (64, 48));
    }

    #[test]
    fn headless_rejects_bad_stride() {
        let mut r = HeadlessRenderer::new(64, 48);
        assert!(matches!(r.initialize(64, 48, 64 * 3), Err(RenderError::Stride { .. })));
    }

    #[test]
    fn headless_bad_background_falls_back() {
        let res = Resolution::new(16, 64);
        let mut r = HeadlessRenderer::new(16, 64).with_background(b"junk".to_vec());
        r.initialize(16, 64, 64).unwrap();
        r.draw(&CompositeBuffer::new(res), &FootMarkers::default()).unwrap();
        assert_eq!(r.canvas().at(0, 0), Background::procedural(res).at(0, 0));
    }

    #[test]
    fn headless_frame_limit_requests_quit() {
        let mut r = HeadlessRenderer::new(8, 8).with_frame_limit(2);
        r.initialize(8, 8, 32).unwrap();
        let c = CompositeBuffer::new(Resolution::new(8, 8));
        assert!(!r.poll_input().quit);
        r.draw(&c, &FootMarkers::default()).unwrap();
        r.draw(&c, &FootMarkers::default()).unwrap();
        assert!(r.poll_input().quit);
    }
}
