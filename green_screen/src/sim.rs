//! A sensor that needs no hardware.
//!
//! One performer walks on stage, sways side to side and steps in place, then
//! leaves for a moment and comes back.  All three streams run at 30 fps on
//! their own clocks, color a few milliseconds behind depth, so the pipeline
//! sees the same interleaving a real device produces.
//!
//! The clock is either the wall clock ([`SimulatedSensor::new`]) or a manual
//! one that only moves when [`wait_any`](SensorSource::wait_any) or
//! [`advance`](SimulatedSensor::advance) moves it
//! ([`SimulatedSensor::manual`]), which makes the scene deterministic in
//! tests.

use std::f32::consts::TAU;
use std::thread;
use std::time::{Duration, Instant};

use frame_sync::StreamKind;
use log::{debug, info, trace};
use matte_core::{
    pack_depth, ColorFrame, DepthFrame, DepthImageProjection, FrameGeometry, JointIndex,
    JointTrackingState, NominalRegistration, Registration, SkeletonData, SkeletonFrame,
    SkeletonProjection, SkeletonTrackingState, Vector4, REFERENCE,
};

use crate::sensor::{SensorError, SensorSource, SensorStatus};

// ════════════════════════════════════════════════════════════════════════════
// Scene constants
// ════════════════════════════════════════════════════════════════════════════

const FRAME_PERIOD:  Duration = Duration::from_nanos(33_333_333);
/// Start offsets of the depth, color and skeleton clocks.
const PHASE:         [Duration; 3] = [
    Duration::from_millis(0),
    Duration::from_millis(7),
    Duration::from_millis(3),
];

/// Performer distance from the sensor (m).
const PERFORMER_Z:   f32 = 2.4;
/// The performer is on stage for the first `ON_STAGE_S` of every `CYCLE_S`.
const CYCLE_S:       f32 = 12.0;
const ON_STAGE_S:    f32 = 10.0;
const SWAY_M:        f32 = 0.5;
const SWAY_S:        f32 = 8.0;
const STEP_S:        f32 = 1.2;
const STEP_LIFT_M:   f32 = 0.25;
/// A foot lifted higher than this is reported as not tracked.
const LOST_LIFT_M:   f32 = 0.15;

const WALL_MM:       u16 = 3800;
const FLOOR_NEAR_MM: u16 = 1800;
const RANGE_DEFAULT: (u16, u16) = (800, 4000);
const RANGE_NEAR:    (u16, u16) = (400, 3000);

const PLAYER:        u16 = 1;

// body-part labels
const NONE:  u8 = 0;
const BARE:  u8 = 1;
const TORSO: u8 = 2;
const LEGS:  u8 = 3;

const SKIN:  u32 = 0x00D8A47F;
const SHIRT: u32 = 0x00C0392B;
const JEANS: u32 = 0x002C4F8C;

/// `(from, to, radius in metres, label)`, drawn in order.
const BONES: [(JointIndex, JointIndex, f32, u8); 18] = [
    (JointIndex::HipLeft,        JointIndex::HipRight,      0.12, LEGS),
    (JointIndex::HipLeft,        JointIndex::KneeLeft,      0.08, LEGS),
    (JointIndex::KneeLeft,       JointIndex::AnkleLeft,     0.06, LEGS),
    (JointIndex::AnkleLeft,      JointIndex::FootLeft,      0.05, LEGS),
    (JointIndex::HipRight,       JointIndex::KneeRight,     0.08, LEGS),
    (JointIndex::KneeRight,      JointIndex::AnkleRight,    0.06, LEGS),
    (JointIndex::AnkleRight,     JointIndex::FootRight,     0.05, LEGS),
    (JointIndex::HipCenter,      JointIndex::ShoulderCenter, 0.16, TORSO),
    (JointIndex::ShoulderLeft,   JointIndex::ShoulderRight, 0.07, TORSO),
    (JointIndex::ShoulderLeft,   JointIndex::ElbowLeft,     0.05, TORSO),
    (JointIndex::ElbowLeft,      JointIndex::WristLeft,     0.04, BARE),
    (JointIndex::WristLeft,      JointIndex::HandLeft,      0.05, BARE),
    (JointIndex::ShoulderRight,  JointIndex::ElbowRight,    0.05, TORSO),
    (JointIndex::ElbowRight,     JointIndex::WristRight,    0.04, BARE),
    (JointIndex::WristRight,     JointIndex::HandRight,     0.05, BARE),
    (JointIndex::Spine,          JointIndex::ShoulderCenter, 0.17, TORSO),
    (JointIndex::ShoulderCenter, JointIndex::Head,          0.05, BARE),
    (JointIndex::Head,           JointIndex::Head,          0.12, BARE),
];

fn stream_slot(kind: StreamKind) -> usize {
    match kind {
        StreamKind::Depth    => 0,
        StreamKind::Color    => 1,
        StreamKind::Skeleton => 2,
    }
}

// ════════════════════════════════════════════════════════════════════════════
// SimulatedSensor
// ════════════════════════════════════════════════════════════════════════════

enum SimClock {
    Wall(Instant),
    Manual(Duration),
}

pub struct SimulatedSensor {
    geometry:     FrameGeometry,
    registration: NominalRegistration,
    projection:   DepthImageProjection,
    clock:        SimClock,
    open:         bool,
    near_mode:    bool,
    /// When each stream's next frame becomes available.
    next_due:     [Duration; 3],
}

impl SimulatedSensor {
    /// Runs on the wall clock.
    pub fn new(geometry: FrameGeometry) -> Self {
        Self::with_clock(geometry, SimClock::Wall(Instant::now()))
    }

    /// Runs on a clock that starts at zero and only moves when told to.
    pub fn manual(geometry: FrameGeometry) -> Self {
        Self::with_clock(geometry, SimClock::Manual(Duration::ZERO))
    }

    fn with_clock(geometry: FrameGeometry, clock: SimClock) -> Self {
        SimulatedSensor {
            geometry,
            registration: NominalRegistration::new(geometry),
            projection:   DepthImageProjection::default(),
            clock,
            open:         false,
            near_mode:    false,
            next_due:     PHASE,
        }
    }

    pub fn near_mode(&self) -> bool { self.near_mode }

    pub fn now(&self) -> Duration {
        match self.clock {
            SimClock::Wall(start) => start.elapsed(),
            SimClock::Manual(t)   => t,
        }
    }

    /// Move a manual clock forward.  No effect on the wall clock.
    pub fn advance(&mut self, by: Duration) {
        if let SimClock::Manual(t) = &mut self.clock {
            *t += by;
        }
    }

    /// Claim the newest due frame of `kind`, returning its capture time.
    /// Frames that fell due while nobody was looking are dropped.
    fn take(&mut self, kind: StreamKind) -> Result<Duration, SensorError> {
        if !self.open {
            return Err(SensorError::NotReady);
        }
        let now = self.now();
        let slot = stream_slot(kind);
        let due = self.next_due[slot];
        if now < due {
            return Err(SensorError::NotReady);
        }
        let missed = ((now - due).as_nanos() / FRAME_PERIOD.as_nanos()) as u32;
        let stamp = due + FRAME_PERIOD * missed;
        if missed > 0 {
            trace!("sim {kind}: dropped {missed} stale frame(s)");
        }
        self.next_due[slot] = stamp + FRAME_PERIOD;
        Ok(stamp)
    }

    fn range(&self) -> (u16, u16) {
        if self.near_mode { RANGE_NEAR } else { RANGE_DEFAULT }
    }

    /// Body-part label per depth pixel for the scene at `t`.
    fn rasterize(&self, t: Duration) -> Vec<u8> {
        let res = self.geometry.depth;
        let mut labels = vec![NONE; res.pixel_count()];
        let Some(performer) = performer(t) else {
            return labels;
        };

        let sx = res.width as f32 / REFERENCE.width as f32;
        let sy = res.height as f32 / REFERENCE.height as f32;
        let pts = performer.joints.map(|j| {
            let (x, y, _) = self.projection.to_depth_image(j);
            (x as f32 * sx, y as f32 * sy)
        });
        let px_per_m = self.projection.focal_px / PERFORMER_Z * sx;

        for (a, b, radius, label) in BONES {
            let (ax, ay) = pts[a.idx()];
            let (bx, by) = pts[b.idx()];
            let r = radius * px_per_m;
            let x0 = (ax.min(bx) - r).floor().max(0.0) as usize;
            let y0 = (ay.min(by) - r).floor().max(0.0) as usize;
            let x1 = ((ax.max(bx) + r).ceil() as usize).min(res.width.saturating_sub(1));
            let y1 = ((ay.max(by) + r).ceil() as usize).min(res.height.saturating_sub(1));
            for y in y0..=y1 {
                for x in x0..=x1 {
                    if segment_dist_sq(x as f32, y as f32, (ax, ay), (bx, by)) <= r * r {
                        labels[y * res.width + x] = label;
                    }
                }
            }
        }
        labels
    }

    fn background_mm(&self, y: usize) -> u16 {
        let h = self.geometry.depth.height as f32;
        let horizon = h * 0.75;
        let y = y as f32;
        if y < horizon {
            WALL_MM
        } else {
            let k = (y - horizon) / (h - horizon);
            WALL_MM - ((WALL_MM - FLOOR_NEAR_MM) as f32 * k) as u16
        }
    }
}

impl SensorSource for SimulatedSensor {
    fn status(&self) -> SensorStatus { SensorStatus::Connected }

    fn initialize(&mut self, geometry: FrameGeometry, near_mode: bool) -> Result<(), SensorError> {
        self.geometry = geometry;
        self.registration = NominalRegistration::new(geometry);
        self.near_mode = near_mode;
        let now = self.now();
        self.next_due = PHASE.map(|p| now + p);
        self.open = true;
        info!(
            "simulated sensor open: depth {}x{}, color {}x{}",
            geometry.depth.width, geometry.depth.height,
            geometry.color.width, geometry.color.height,
        );
        Ok(())
    }

    fn wait_any(&mut self, timeout: Duration) -> bool {
        if !self.open {
            return false;
        }
        let now = self.now();
        let earliest = self.next_due.iter().copied().min().unwrap_or(now);
        if earliest > now {
            let wait = (earliest - now).min(timeout);
            match &mut self.clock {
                SimClock::Wall(_)   => thread::sleep(wait),
                SimClock::Manual(t) => *t += wait,
            }
        }
        StreamKind::ALL.iter().any(|&k| self.is_ready(k))
    }

    fn is_ready(&self, kind: StreamKind) -> bool {
        self.open && self.now() >= self.next_due[stream_slot(kind)]
    }

    fn next_depth_frame(&mut self, frame: &mut DepthFrame) -> Result<(), SensorError> {
        let stamp = self.take(StreamKind::Depth)?;
        let res = self.geometry.depth;
        if frame.resolution() != res {
            return Err(SensorError::Sdk(format!(
                "depth buffer is {}x{}, stream is {}x{}",
                frame.resolution().width, frame.resolution().height, res.width, res.height,
            )));
        }

        let labels = self.rasterize(stamp);
        let (lo, hi) = self.range();
        let in_range = |mm: u16| if (lo..=hi).contains(&mm) { mm } else { 0 };
        let body_mm = in_range((PERFORMER_Z * 1000.0) as u16);
        for (i, px) in frame.pixels_mut().iter_mut().enumerate() {
            *px = if labels[i] != NONE {
                pack_depth(body_mm, PLAYER)
            } else {
                pack_depth(in_range(self.background_mm(i / res.width)), 0)
            };
        }
        frame.set_timestamp(stamp);
        Ok(())
    }

    fn next_color_frame(&mut self, frame: &mut ColorFrame) -> Result<(), SensorError> {
        let stamp = self.take(StreamKind::Color)?;
        let geometry = self.geometry;
        if frame.resolution() != geometry.color {
            return Err(SensorError::Sdk(format!(
                "color buffer is {}x{}, stream is {}x{}",
                frame.resolution().width, frame.resolution().height,
                geometry.color.width, geometry.color.height,
            )));
        }

        // Colour pixel (cx, cy) shows whatever depth pixel maps onto it.
        let labels = self.rasterize(stamp);
        let body_raw = pack_depth((PERFORMER_Z * 1000.0) as u16, PLAYER);
        let (shift, _) = self.registration.map_pixel(0, 0, body_raw);
        let cw = geometry.color.width;
        let dw = geometry.depth.width;
        let div = geometry.divisor as i32;

        for (i, px) in frame.pixels_mut().iter_mut().enumerate() {
            let (cx, cy) = ((i % cw) as i32, (i / cw) as i32);
            let dx = (cx - shift).div_euclid(div);
            let label = if dx >= 0 && (dx as usize) < dw {
                labels[(cy / div) as usize * dw + dx as usize]
            } else {
                NONE
            };
            *px = match label {
                BARE  => SKIN,
                TORSO => SHIRT,
                LEGS  => JEANS,
                _     => studio(cx, cy, geometry.color.height as i32),
            };
        }
        frame.set_timestamp(stamp);
        Ok(())
    }

    fn next_skeleton_frame(&mut self, frame: &mut SkeletonFrame) -> Result<(), SensorError> {
        let stamp = self.take(StreamKind::Skeleton)?;
        *frame = SkeletonFrame { timestamp: stamp, ..SkeletonFrame::default() };
        if let Some(performer) = performer(stamp) {
            frame.skeletons[0] = performer;
        }
        Ok(())
    }

    fn registration(&self) -> &dyn Registration { &self.registration }

    fn set_near_mode(&mut self, enabled: bool) -> Result<(), SensorError> {
        if !self.open {
            return Err(SensorError::Disconnected);
        }
        debug!("sim near mode {}", if enabled { "on" } else { "off" });
        self.near_mode = enabled;
        Ok(())
    }

    fn shutdown(&mut self) {
        if self.open {
            info!("simulated sensor closed");
        }
        self.open = false;
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Scene
// ════════════════════════════════════════════════════════════════════════════

/// The performer's skeleton at `t`, or `None` while off stage.
fn performer(t: Duration) -> Option<SkeletonData> {
    let t = t.as_secs_f32();
    if t % CYCLE_S >= ON_STAGE_S {
        return None;
    }

    let hx = SWAY_M * (TAU * t / SWAY_S).sin();
    let step = (TAU * t / STEP_S).sin();
    let lift_l = step.max(0.0) * STEP_LIFT_M;
    let lift_r = (-step).max(0.0) * STEP_LIFT_M;
    let wave = 0.15 * (TAU * t / 2.0).sin();

    let at = |dx: f32, dy: f32| Vector4::new(hx + dx, dy, PERFORMER_Z);
    let foot = |lift: f32| {
        if lift > LOST_LIFT_M { JointTrackingState::NotTracked } else { JointTrackingState::Tracked }
    };
    let ankle = |lift: f32| {
        if lift > LOST_LIFT_M { JointTrackingState::Inferred } else { JointTrackingState::Tracked }
    };
    let tracked = JointTrackingState::Tracked;

    let mut s = SkeletonData {
        tracking: SkeletonTrackingState::Tracked,
        position: at(0.0, -0.10),
        ..SkeletonData::default()
    };
    s.set_joint(JointIndex::HipCenter,      at(0.0, -0.10), tracked);
    s.set_joint(JointIndex::Spine,          at(0.0, 0.15), tracked);
    s.set_joint(JointIndex::ShoulderCenter, at(0.0, 0.45), tracked);
    s.set_joint(JointIndex::Head,           at(0.0, 0.65), tracked);

    s.set_joint(JointIndex::ShoulderLeft,   at(-0.18, 0.40), tracked);
    s.set_joint(JointIndex::ElbowLeft,      at(-0.28, 0.15 + wave), tracked);
    s.set_joint(JointIndex::WristLeft,      at(-0.32, -0.05 + 2.0 * wave), tracked);
    s.set_joint(JointIndex::HandLeft,       at(-0.33, -0.12 + 2.0 * wave), tracked);
    s.set_joint(JointIndex::ShoulderRight,  at(0.18, 0.40), tracked);
    s.set_joint(JointIndex::ElbowRight,     at(0.28, 0.15 - wave), tracked);
    s.set_joint(JointIndex::WristRight,     at(0.32, -0.05 - 2.0 * wave), tracked);
    s.set_joint(JointIndex::HandRight,      at(0.33, -0.12 - 2.0 * wave), tracked);

    s.set_joint(JointIndex::HipLeft,        at(-0.10, -0.15), tracked);
    s.set_joint(JointIndex::KneeLeft,       at(-0.11, -0.52 + 0.6 * lift_l), tracked);
    s.set_joint(JointIndex::AnkleLeft,      at(-0.12, -0.88 + lift_l), ankle(lift_l));
    s.set_joint(JointIndex::FootLeft,       at(-0.14, -0.95 + lift_l), foot(lift_l));
    s.set_joint(JointIndex::HipRight,       at(0.10, -0.15), tracked);
    s.set_joint(JointIndex::KneeRight,      at(0.11, -0.52 + 0.6 * lift_r), tracked);
    s.set_joint(JointIndex::AnkleRight,     at(0.12, -0.88 + lift_r), ankle(lift_r));
    s.set_joint(JointIndex::FootRight,      at(0.14, -0.95 + lift_r), foot(lift_r));
    Some(s)
}

fn segment_dist_sq(px: f32, py: f32, (ax, ay): (f32, f32), (bx, by): (f32, f32)) -> f32 {
    let (vx, vy) = (bx - ax, by - ay);
    let len_sq = vx * vx + vy * vy;
    let t = if len_sq > 0.0 {
        (((px - ax) * vx + (py - ay) * vy) / len_sq).clamp(0.0, 1.0)
    } else {
        0.0
    };
    let (dx, dy) = (ax + t * vx - px, ay + t * vy - py);
    dx * dx + dy * dy
}

/// The room behind the performer: a painted wall over a tiled floor.
fn studio(x: i32, y: i32, height: i32) -> u32 {
    let horizon = height * 3 / 4;
    if y < horizon {
        let shade = 0x70 + (y * 0x40 / horizon.max(1)) as u32;
        (shade << 16) | ((shade - 0x10) << 8) | (shade - 0x30)
    } else if ((x / 40) + (y / 20)) % 2 == 0 {
        0x00605040
    } else {
        0x00483828
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use matte_core::{depth_mm, player_index, Resolution};

    fn geometry() -> FrameGeometry {
        FrameGeometry::new(Resolution::DEPTH_320X240, Resolution::COLOR_640X480).unwrap()
    }

    fn open_sensor() -> SimulatedSensor {
        let mut s = SimulatedSensor::manual(geometry());
        s.initialize(geometry(), false).unwrap();
        s
    }

    #[test]
    fn nothing_ready_before_initialize() {
        let mut s = SimulatedSensor::manual(geometry());
        assert!(!s.is_ready(StreamKind::Depth));
        assert!(!s.wait_any(Duration::from_millis(50)));
        let mut d = DepthFrame::new(Resolution::DEPTH_320X240);
        assert_eq!(s.next_depth_frame(&mut d), Err(SensorError::NotReady));
    }

    #[test]
    fn streams_tick_on_their_own_phase() {
        let mut s = open_sensor();
        assert!(s.is_ready(StreamKind::Depth));
        assert!(!s.is_ready(StreamKind::Color));
        assert!(!s.is_ready(StreamKind::Skeleton));

        s.advance(Duration::from_millis(3));
        assert!(s.is_ready(StreamKind::Skeleton));
        assert!(!s.is_ready(StreamKind::Color));

        s.advance(Duration::from_millis(4));
        assert!(s.is_ready(StreamKind::Color));
    }

    #[test]
    fn a_frame_is_taken_once() {
        let mut s = open_sensor();
        let mut d = DepthFrame::new(Resolution::DEPTH_320X240);
        s.next_depth_frame(&mut d).unwrap();
        assert_eq!(d.timestamp(), Duration::ZERO);
        assert_eq!(s.next_depth_frame(&mut d), Err(SensorError::NotReady));
        assert!(!s.is_ready(StreamKind::Depth));
    }

    #[test]
    fn wait_any_moves_manual_clock_to_next_frame() {
        let mut s = open_sensor();
        let mut d = DepthFrame::new(Resolution::DEPTH_320X240);
        s.next_depth_frame(&mut d).unwrap();
        // skeleton (3 ms) comes before color (7 ms)
        assert!(s.wait_any(Duration::from_secs(1)));
        assert_eq!(s.now(), Duration::from_millis(3));
        assert!(s.is_ready(StreamKind::Skeleton));
    }

    #[test]
    fn wait_any_respects_timeout() {
        let mut s = open_sensor();
        let mut d = DepthFrame::new(Resolution::DEPTH_320X240);
        let mut c = ColorFrame::new(Resolution::COLOR_640X480);
        let mut k = SkeletonFrame::default();
        s.advance(Duration::from_millis(10));
        s.next_depth_frame(&mut d).unwrap();
        s.next_color_frame(&mut c).unwrap();
        s.next_skeleton_frame(&mut k).unwrap();

        assert!(!s.wait_any(Duration::from_millis(1)));
        assert_eq!(s.now(), Duration::from_millis(11));
    }

    #[test]
    fn late_reader_gets_newest_frame() {
        let mut s = open_sensor();
        s.advance(Duration::from_millis(100));
        let mut d = DepthFrame::new(Resolution::DEPTH_320X240);
        s.next_depth_frame(&mut d).unwrap();
        assert_eq!(d.timestamp(), FRAME_PERIOD * 3);
    }

    #[test]
    fn performer_is_player_one_in_front_of_wall() {
        let mut s = open_sensor();
        s.advance(Duration::from_secs(1));
        let mut d = DepthFrame::new(Resolution::DEPTH_320X240);
        s.next_depth_frame(&mut d).unwrap();

        let body: Vec<u16> = d.pixels().iter().copied().filter(|&p| player_index(p) == 1).collect();
        assert!(body.len() > 500, "{} body pixels", body.len());
        assert!(body.iter().all(|&p| depth_mm(p) == 2400));
        assert_eq!(depth_mm(d.pixels()[0]), WALL_MM);
    }

    #[test]
    fn off_stage_has_no_player_and_no_skeleton() {
        let mut s = open_sensor();
        s.advance(Duration::from_secs(11));
        let mut d = DepthFrame::new(Resolution::DEPTH_320X240);
        let mut k = SkeletonFrame::default();
        s.next_depth_frame(&mut d).unwrap();
        s.next_skeleton_frame(&mut k).unwrap();
        assert!(d.pixels().iter().all(|&p| player_index(p) == 0));
        assert_eq!(k.tracked().count(), 0);
    }

    #[test]
    fn near_mode_drops_the_far_wall() {
        let mut s = open_sensor();
        s.set_near_mode(true).unwrap();
        let mut d = DepthFrame::new(Resolution::DEPTH_320X240);
        s.next_depth_frame(&mut d).unwrap();
        assert_eq!(depth_mm(d.pixels()[0]), 0);
        assert!(s.near_mode());
    }

    #[test]
    fn skeleton_has_feet_on_the_floor() {
        let mut s = open_sensor();
        let mut k = SkeletonFrame::default();
        s.advance(Duration::from_millis(3));
        s.next_skeleton_frame(&mut k).unwrap();
        let (_, skel) = k.tracked().next().unwrap();
        // t ≈ 0: neither foot lifted
        assert!(skel.state(JointIndex::FootLeft).is_usable());
        assert!(skel.state(JointIndex::FootRight).is_usable());
        assert!(skel.joint(JointIndex::FootLeft).y < -0.8);
    }

    #[test]
    fn lifted_foot_is_lost() {
        // a quarter step in, the left foot is at the top of its lift
        let s = performer(Duration::from_secs_f32(STEP_S / 4.0)).unwrap();
        assert_eq!(s.state(JointIndex::FootLeft), JointTrackingState::NotTracked);
        assert_eq!(s.state(JointIndex::FootRight), JointTrackingState::Tracked);
    }

    #[test]
    fn color_shows_performer_where_depth_maps() {
        let mut s = open_sensor();
        let mut d = DepthFrame::new(Resolution::DEPTH_320X240);
        let mut c = ColorFrame::new(Resolution::COLOR_640X480);
        s.advance(Duration::from_millis(10));
        s.next_depth_frame(&mut d).unwrap();
        s.next_color_frame(&mut c).unwrap();

        // middle of the torso, well inside the silhouette
        let reg = NominalRegistration::new(geometry());
        let spine = performer(Duration::ZERO).unwrap().joint(JointIndex::Spine);
        let (x, y, _) = DepthImageProjection::default().to_depth_image(spine);
        let (x, y) = (x as usize, y as usize);
        let raw = d.pixels()[y * 320 + x];
        assert_eq!(player_index(raw), 1);
        let (cx, cy) = reg.map_pixel(x, y, raw);
        let px = c.at(cx as usize, cy as usize);
        assert!([SKIN, SHIRT, JEANS].contains(&px), "{px:#010x}");
        assert_eq!(px >> 24, 0);
    }
}
