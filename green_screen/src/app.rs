//! Top-level pipeline.
//!
//! [`GreenScreen`] owns the sensor, the renderer, the optional MIDI player
//! and every frame buffer.  Each call to [`GreenScreen::update`] drains the
//! streams that have a frame waiting, decides whether the depth and color it
//! holds are a matching pair, and if so mattes and draws one frame.

use std::thread;
use std::time::Duration;

use foot_midi::{open_output, FootTrigger, MidiPlayer};
use frame_sync::{StreamKind, StreamSet, SyncPolicy};
use log::{debug, info, trace, warn};
use matte_core::{
    compose, ColorFrame, CompositeBuffer, CoordinateMapper, DepthFrame, FootMarkers,
    FootProjector, FrameGeometry, JointSmoother, SkeletonFrame,
};

use crate::config::{AppConfig, RendererKind};
use crate::error::AppError;
use crate::renderer::{HeadlessRenderer, Renderer, WindowRenderer};
use crate::sensor::{connect_first, SensorSource};
use crate::sim::SimulatedSensor;

pub const NO_SENSOR: &str = "No ready Kinect found!";

// ════════════════════════════════════════════════════════════════════════════
// GreenScreen
// ════════════════════════════════════════════════════════════════════════════

pub struct GreenScreen<R: Renderer = Box<dyn Renderer>> {
    geometry:  FrameGeometry,
    sensor:    Option<Box<dyn SensorSource>>,
    renderer:  R,
    midi:      Option<MidiPlayer>,
    trigger:   FootTrigger,

    streams:   StreamSet,
    policy:    SyncPolicy,

    depth:     DepthFrame,
    color:     ColorFrame,
    skeleton:  SkeletonFrame,
    mapper:    CoordinateMapper,
    composite: CompositeBuffer,
    smoother:  JointSmoother,
    feet:      FootProjector,

    near_mode: bool,
    tracking:  usize,
    status:    String,
    passes:    u64,
    shut_down: bool,
}

impl<R: Renderer> GreenScreen<R> {
    /// Build the pipeline and open the renderer and sensor.
    ///
    /// Only a renderer that cannot start is fatal.  A missing or failing
    /// sensor leaves the pipeline running with a status message and no
    /// frames.
    pub fn new(
        cfg:      &AppConfig,
        sensor:   Option<Box<dyn SensorSource>>,
        renderer: R,
        midi:     Option<MidiPlayer>,
    ) -> Result<Self, AppError> {
        let geometry = FrameGeometry::new(cfg.depth_resolution, cfg.color_resolution)?;

        let mut app = GreenScreen {
            geometry,
            sensor:    None,
            renderer,
            midi,
            trigger:   FootTrigger::default(),
            streams:   StreamSet::default(),
            policy:    SyncPolicy::new(cfg.depth_fps),
            depth:     DepthFrame::new(geometry.depth),
            color:     ColorFrame::new(geometry.color),
            skeleton:  SkeletonFrame::default(),
            mapper:    CoordinateMapper::new(geometry.depth),
            composite: CompositeBuffer::new(geometry.color),
            smoother:  JointSmoother::default(),
            feet:      FootProjector::default(),
            near_mode: cfg.near_mode,
            tracking:  0,
            status:    String::new(),
            passes:    0,
            shut_down: false,
        };

        app.renderer.initialize(geometry.color.width, geometry.color.height, app.composite.stride())?;

        if let Some(player) = app.midi.as_mut() {
            player.select_instrument(cfg.instrument);
        }

        match sensor {
            Some(mut s) => match s.initialize(geometry, cfg.near_mode) {
                Ok(()) => {
                    app.sensor = Some(s);
                    app.set_status(if cfg.near_mode { "Near mode on" } else { "Ready" });
                }
                Err(e) => {
                    warn!("sensor failed to start: {e}");
                    app.set_status(NO_SENSOR);
                }
            },
            None => {
                warn!("no sensor connected");
                app.set_status(NO_SENSOR);
            }
        }
        Ok(app)
    }

    // ── Per-cycle work ────────────────────────────────────────────────────

    /// Block until the sensor has something, at most `timeout`.
    pub fn wait(&mut self, timeout: Duration) -> bool {
        match self.sensor.as_mut() {
            Some(s) => s.wait_any(timeout),
            None => {
                thread::sleep(timeout);
                false
            }
        }
    }

    /// Drain every ready stream, then compose and draw if the policy allows.
    /// Returns whether a frame was drawn.
    pub fn update(&mut self) -> bool {
        let Some(sensor) = self.sensor.as_mut() else {
            return false;
        };
        self.streams.begin_cycle();

        if sensor.is_ready(StreamKind::Depth) {
            self.streams.signal(StreamKind::Depth);
            match sensor.next_depth_frame(&mut self.depth) {
                Ok(()) => {
                    self.streams.consume(StreamKind::Depth, self.depth.timestamp());
                    // on failure the previous map stays in force
                    let _ = self.mapper.refresh(&self.depth, sensor.registration());
                }
                Err(e) => {
                    trace!("depth fetch: {e}");
                    self.streams.fail(StreamKind::Depth);
                }
            }
        }

        if sensor.is_ready(StreamKind::Color) {
            self.streams.signal(StreamKind::Color);
            match sensor.next_color_frame(&mut self.color) {
                Ok(()) => {
                    self.streams.consume(StreamKind::Color, self.color.timestamp());
                }
                Err(e) => {
                    trace!("color fetch: {e}");
                    self.streams.fail(StreamKind::Color);
                }
            }
        }

        if sensor.is_ready(StreamKind::Skeleton) {
            self.streams.signal(StreamKind::Skeleton);
            match sensor.next_skeleton_frame(&mut self.skeleton) {
                Ok(()) => {
                    self.streams.consume(StreamKind::Skeleton, self.skeleton.timestamp);
                    self.process_skeleton();
                }
                Err(e) => {
                    trace!("skeleton fetch: {e}");
                    self.streams.fail(StreamKind::Skeleton);
                }
            }
        }

        if !self.policy.should_compose(&self.streams.timestamps(), self.streams.updates()) {
            return false;
        }

        compose(&self.geometry, &self.depth, &self.color, self.mapper.map(), &mut self.composite);
        if let Err(e) = self.renderer.draw(&self.composite, self.feet.markers()) {
            warn!("draw failed: {e}");
        }
        self.passes += 1;
        trace!("pass {} ({} opaque)", self.passes, self.composite.opaque_count());
        true
    }

    fn process_skeleton(&mut self) {
        self.smoother.apply(&mut self.skeleton);

        let (w, h) = self.renderer.surface_size();
        self.feet.update(&self.skeleton, w, h);
        if let Some(player) = self.midi.as_mut() {
            self.trigger.fire(self.feet.markers(), player);
        }

        let tracking = self.skeleton.tracked().count();
        if tracking != self.tracking {
            debug!("tracking {tracking} skeleton(s)");
            self.tracking = tracking;
        }
    }

    // ── Controls ──────────────────────────────────────────────────────────

    /// Flip near mode and pass it straight to the sensor.
    pub fn toggle_near_mode(&mut self) {
        let Some(sensor) = self.sensor.as_mut() else {
            return;
        };
        let want = !self.near_mode;
        match sensor.set_near_mode(want) {
            Ok(()) => {
                self.near_mode = want;
                info!("near mode {}", if want { "on" } else { "off" });
                self.set_status(if want { "Near mode on" } else { "Near mode off" });
            }
            // sensor kept its old range
            Err(e) => warn!("near mode: {e}"),
        }
    }

    pub fn set_status(&mut self, status: &str) {
        if self.status != status {
            debug!("status: {status}");
            self.status = status.to_string();
            self.renderer.set_status(status);
        }
    }

    /// Silence MIDI, close the renderer and the sensor.  Safe to call more
    /// than once; also runs on drop.
    pub fn shutdown(&mut self) {
        if self.shut_down {
            return;
        }
        self.shut_down = true;
        if let Some(player) = self.midi.as_mut() {
            player.stop_all();
        }
        self.renderer.release();
        if let Some(sensor) = self.sensor.as_mut() {
            sensor.shutdown();
        }
        info!("shut down after {} passes", self.passes);
    }

    // ── Accessors ─────────────────────────────────────────────────────────

    pub fn renderer(&self)     -> &R                { &self.renderer }
    pub fn renderer_mut(&mut self) -> &mut R        { &mut self.renderer }
    pub fn composite(&self)    -> &CompositeBuffer  { &self.composite }
    pub fn markers(&self)      -> &FootMarkers      { self.feet.markers() }
    pub fn streams(&self)      -> &StreamSet        { &self.streams }
    pub fn status(&self)       -> &str              { &self.status }
    pub fn passes(&self)       -> u64               { self.passes }
    pub fn near_mode(&self)    -> bool              { self.near_mode }
    pub fn has_sensor(&self)   -> bool              { self.sensor.is_some() }
}

impl<R: Renderer> Drop for GreenScreen<R> {
    fn drop(&mut self) {
        self.shutdown();
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Event loop
// ════════════════════════════════════════════════════════════════════════════

/// Run the full application until the window closes or Escape is pressed.
///
/// This is the entry point called from `main.rs`.  It picks the renderer
/// named in `cfg`, connects the simulated sensor, opens MIDI if enabled and
/// drives the wait/update/input loop.
pub fn run(cfg: AppConfig) -> Result<(), AppError> {
    let geometry = FrameGeometry::new(cfg.depth_resolution, cfg.color_resolution)?;

    let renderer: Box<dyn Renderer> = match cfg.renderer {
        RendererKind::Window => Box::new(WindowRenderer::new(&cfg.window_title, cfg.background.clone())),
        RendererKind::Headless => {
            let mut r = HeadlessRenderer::new(geometry.color.width, geometry.color.height);
            if let Some(bytes) = cfg.background.clone() {
                r = r.with_background(bytes);
            }
            Box::new(r)
        }
    };

    let simulated: Box<dyn SensorSource> = Box::new(SimulatedSensor::new(geometry));
    let sensor = connect_first(vec![simulated]);

    let midi = cfg.midi.then(|| {
        let player = MidiPlayer::new(open_output("green_screen"));
        info!("MIDI out: {}", player.sink_name());
        player
    });

    let mut app = GreenScreen::new(&cfg, sensor, renderer, midi)?;

    loop {
        app.wait(cfg.ui_poll);
        app.update();

        let input = app.renderer_mut().poll_input();
        if input.quit {
            break;
        }
        if input.toggle_near_mode {
            app.toggle_near_mode();
        }
    }

    app.shutdown();
    Ok(())
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
