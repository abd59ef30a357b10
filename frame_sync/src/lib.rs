//! # frame_sync
//!
//! Three independently clocked sensor streams (depth, color, skeleton) and
//! the rule that decides when there is enough fresh data to build a new
//! composite frame.
//!
//! Each stream is a [`StreamClock`]: a tiny state machine that remembers
//! whether the stream has signalled a frame, whether that frame was taken, and
//! the timestamp of the last frame taken.  [`SyncPolicy::should_compose`] is a
//! pure function over those timestamps, so the gating rule can be tested
//! without any event loop.
//!
//! ```text
//!          signal()            consume(ts)
//!   Idle ───────────► FrameReady ───────────► Consumed
//!    ▲                    │                      │
//!    └────── fail() ──────┘                      │
//!                          ◄──── signal() ───────┘
//! ```
//!
//! ## Example
//!
//! ```rust
//! use frame_sync::{StreamKind, StreamSet, SyncPolicy};
//! use std::time::Duration;
//!
//! let policy = SyncPolicy::default();          // 30 fps depth
//! let mut streams = StreamSet::default();
//!
//! streams.signal(StreamKind::Depth);
//! streams.consume(StreamKind::Depth, Duration::from_millis(1000));
//! streams.signal(StreamKind::Color);
//! streams.consume(StreamKind::Color, Duration::from_millis(1010));
//!
//! assert!(policy.should_compose(&streams.timestamps(), streams.updates()));
//! ```

use std::fmt;
use std::time::Duration;

use log::{debug, trace};

// ════════════════════════════════════════════════════════════════════════════
// StreamKind / StreamPhase
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StreamKind {
    Depth,
    Color,
    Skeleton,
}

impl StreamKind {
    pub const ALL: [StreamKind; 3] = [StreamKind::Depth, StreamKind::Color, StreamKind::Skeleton];

    pub fn name(self) -> &'static str {
        match self {
            StreamKind::Depth    => "depth",
            StreamKind::Color    => "color",
            StreamKind::Skeleton => "skeleton",
        }
    }
}

impl fmt::Display for StreamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum StreamPhase {
    /// Nothing signalled since the last fetch attempt.
    #[default]
    Idle,
    /// The stream signalled a frame that has not been fetched yet.
    FrameReady,
    /// The last signalled frame was fetched.
    Consumed,
}

// ════════════════════════════════════════════════════════════════════════════
// StreamClock
// ════════════════════════════════════════════════════════════════════════════

/// Readiness and timing of one stream.
#[derive(Clone, Debug, Default)]
pub struct StreamClock {
    phase:     StreamPhase,
    last_seen: Option<Duration>,
    frames:    u64,
    failures:  u64,
}

impl StreamClock {
    pub fn phase(&self)     -> StreamPhase      { self.phase }
    pub fn last_seen(&self) -> Option<Duration> { self.last_seen }
    pub fn frames(&self)    -> u64              { self.frames }
    pub fn failures(&self)  -> u64              { self.failures }

    pub fn is_ready(&self) -> bool {
        self.phase == StreamPhase::FrameReady
    }

    /// The stream has a frame waiting.
    pub fn signal(&mut self) {
        self.phase = StreamPhase::FrameReady;
    }

    /// A signalled frame was fetched.  Returns false (and changes nothing)
    /// when no frame was signalled.
    pub fn consume(&mut self, timestamp: Duration) -> bool {
        if self.phase != StreamPhase::FrameReady {
            return false;
        }
        self.phase = StreamPhase::Consumed;
        self.last_seen = Some(timestamp);
        self.frames += 1;
        true
    }

    /// Fetching the signalled frame failed.  The last timestamp stands.
    pub fn fail(&mut self) {
        if self.phase == StreamPhase::FrameReady {
            self.phase = StreamPhase::Idle;
            self.failures += 1;
        }
    }

    /// Start of a new wake-up cycle: a frame consumed last cycle is no longer
    /// news.
    pub fn settle(&mut self) {
        if self.phase == StreamPhase::Consumed {
            self.phase = StreamPhase::Idle;
        }
    }

    fn consumed_this_cycle(&self) -> bool {
        self.phase == StreamPhase::Consumed
    }
}

// ════════════════════════════════════════════════════════════════════════════
// StreamSet
// ════════════════════════════════════════════════════════════════════════════

/// Last-seen timestamps of the three streams.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Timestamps {
    pub depth:    Option<Duration>,
    pub color:    Option<Duration>,
    pub skeleton: Option<Duration>,
}

/// Which streams delivered a new frame this cycle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Updates {
    pub depth:    bool,
    pub color:    bool,
    pub skeleton: bool,
}

impl Updates {
    pub fn any(&self) -> bool {
        self.depth || self.color || self.skeleton
    }
}

/// The depth, color and skeleton clocks together.
#[derive(Clone, Debug, Default)]
pub struct StreamSet {
    depth:    StreamClock,
    color:    StreamClock,
    skeleton: StreamClock,
}

impl StreamSet {
    pub fn clock(&self, kind: StreamKind) -> &StreamClock {
        match kind {
            StreamKind::Depth    => &self.depth,
            StreamKind::Color    => &self.color,
            StreamKind::Skeleton => &self.skeleton,
        }
    }

    fn clock_mut(&mut self, kind: StreamKind) -> &mut StreamClock {
        match kind {
            StreamKind::Depth    => &mut self.depth,
            StreamKind::Color    => &mut self.color,
            StreamKind::Skeleton => &mut self.skeleton,
        }
    }

    /// Begin a wake-up cycle.
    pub fn begin_cycle(&mut self) {
        for k in StreamKind::ALL {
            self.clock_mut(k).settle();
        }
    }

    pub fn signal(&mut self, kind: StreamKind) {
        self.clock_mut(kind).signal();
    }

    pub fn consume(&mut self, kind: StreamKind, timestamp: Duration) -> bool {
        let ok = self.clock_mut(kind).consume(timestamp);
        if ok {
            trace!("{kind} frame consumed at {timestamp:?}");
        } else {
            debug!("{kind} consume without a signalled frame ignored");
        }
        ok
    }

    pub fn fail(&mut self, kind: StreamKind) {
        trace!("{kind} fetch failed, skipped this cycle");
        self.clock_mut(kind).fail();
    }

    pub fn timestamps(&self) -> Timestamps {
        Timestamps {
            depth:    self.depth.last_seen(),
            color:    self.color.last_seen(),
            skeleton: self.skeleton.last_seen(),
        }
    }

    pub fn updates(&self) -> Updates {
        Updates {
            depth:    self.depth.consumed_this_cycle(),
            color:    self.color.consumed_this_cycle(),
            skeleton: self.skeleton.consumed_this_cycle(),
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// SyncPolicy
// ════════════════════════════════════════════════════════════════════════════

/// When to build a composite.
///
/// Depth is the slower, resolution-limiting stream, so output is paced by
/// depth: a pass runs when something new arrived, both depth and color have
/// been seen at least once, and the color frame does not lead the depth frame
/// by more than half a depth-frame interval.  A skeleton update counts as
/// something new.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SyncPolicy {
    pub depth_fps: u32,
}

impl Default for SyncPolicy {
    fn default() -> Self {
        SyncPolicy { depth_fps: 30 }
    }
}

impl SyncPolicy {
    pub fn new(depth_fps: u32) -> Self {
        SyncPolicy { depth_fps: depth_fps.max(1) }
    }

    /// Tolerance for color leading depth.
    pub fn half_frame(&self) -> Duration {
        Duration::from_secs(1) / self.depth_fps.max(1) / 2
    }

    pub fn should_compose(&self, stamps: &Timestamps, updates: Updates) -> bool {
        if !updates.any() {
            return false;
        }
        let (Some(depth), Some(color)) = (stamps.depth, stamps.color) else {
            return false;
        };
        // depth leading color is fine; saturating_sub gives zero then
        color.saturating_sub(depth) <= self.half_frame()
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(v: u64) -> Duration { Duration::from_millis(v) }

    fn stamps(depth: Option<u64>, color: Option<u64>) -> Timestamps {
        Timestamps { depth: depth.map(ms), color: color.map(ms), skeleton: None }
    }

    const DEPTH: Updates = Updates { depth: true, color: false, skeleton: false };
    const SKEL:  Updates = Updates { depth: false, color: false, skeleton: true };

    #[test]
    fn half_frame_at_30fps() {
        let h = SyncPolicy::default().half_frame();
        assert!(h > ms(16) && h < ms(17));
    }

    #[test]
    fn nothing_new_means_no_pass() {
        let p = SyncPolicy::default();
        assert!(!p.should_compose(&stamps(Some(100), Some(100)), Updates::default()));
    }

    #[test]
    fn needs_both_depth_and_color_once() {
        let p = SyncPolicy::default();
        assert!(!p.should_compose(&stamps(None, None), DEPTH));
        assert!(!p.should_compose(&stamps(Some(100), None), DEPTH));
        assert!(!p.should_compose(&stamps(None, Some(100)), DEPTH));
        assert!(p.should_compose(&stamps(Some(100), Some(100)), DEPTH));
    }

    #[test]
    fn color_leading_by_more_than_half_frame_waits() {
        let p = SyncPolicy::default();
        assert!(p.should_compose(&stamps(Some(1000), Some(1016)), DEPTH));
        assert!(!p.should_compose(&stamps(Some(1000), Some(1017)), DEPTH));
        assert!(!p.should_compose(&stamps(Some(1000), Some(1100)), DEPTH));
    }

    #[test]
    fn depth_leading_color_is_fine() {
        let p = SyncPolicy::default();
        assert!(p.should_compose(&stamps(Some(1100), Some(1000)), DEPTH));
    }

    #[test]
    fn skeleton_alone_triggers_but_stays_gated() {
        let p = SyncPolicy::default();
        assert!(p.should_compose(&stamps(Some(500), Some(505)), SKEL));
        assert!(!p.should_compose(&stamps(None, Some(505)), SKEL));
        assert!(!p.should_compose(&stamps(Some(500), Some(600)), SKEL));
    }

    #[test]
    fn clock_transitions() {
        let mut c = StreamClock::default();
        assert_eq!(c.phase(), StreamPhase::Idle);
        assert!(!c.consume(ms(5)), "consume from Idle is ignored");
        assert_eq!(c.last_seen(), None);

        c.signal();
        assert!(c.is_ready());
        assert!(c.consume(ms(33)));
        assert_eq!(c.phase(), StreamPhase::Consumed);
        assert_eq!(c.last_seen(), Some(ms(33)));

        c.signal();
        c.fail();
        assert_eq!(c.phase(), StreamPhase::Idle);
        assert_eq!(c.last_seen(), Some(ms(33)), "failure keeps the old timestamp");
        assert_eq!(c.frames(), 1);
        assert_eq!(c.failures(), 1);
    }

    #[test]
    fn updates_reflect_only_this_cycle() {
        let mut s = StreamSet::default();
        s.begin_cycle();
        s.signal(StreamKind::Color);
        s.consume(StreamKind::Color, ms(40));
        assert_eq!(s.updates(), Updates { depth: false, color: true, skeleton: false });

        s.begin_cycle();
        assert!(!s.updates().any());
        assert_eq!(s.timestamps().color, Some(ms(40)));
    }

    #[test]
    fn failed_stream_does_not_block_others() {
        let mut s = StreamSet::default();
        s.begin_cycle();
        for k in StreamKind::ALL { s.signal(k); }
        s.fail(StreamKind::Depth);
        s.consume(StreamKind::Color, ms(10));
        s.consume(StreamKind::Skeleton, ms(11));
        let u = s.updates();
        assert!(!u.depth && u.color && u.skeleton);
    }
}
