//! Temporal smoothing of joint positions.
//!
//! A Holt double-exponential filter with jitter suppression and a cap on how
//! far a prediction may stray from the raw reading.  Default parameters are
//! the sensor vendor's defaults.

use log::trace;

use crate::skeleton::{SkeletonFrame, Vector4, JOINT_COUNT, SKELETON_COUNT};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SmoothParams {
    /// 0 = raw data, towards 1 = heavier smoothing (more lag).
    pub smoothing:            f32,
    /// How quickly the trend follows the data.
    pub correction:           f32,
    /// How many frames of trend to project forward.
    pub prediction:           f32,
    /// Movements smaller than this (metres) are damped as jitter.
    pub jitter_radius:        f32,
    /// Maximum distance (metres) a prediction may sit from the raw reading.
    pub max_deviation_radius: f32,
}

impl Default for SmoothParams {
    fn default() -> Self {
        SmoothParams {
            smoothing:            0.5,
            correction:           0.5,
            prediction:           0.5,
            jitter_radius:        0.05,
            max_deviation_radius: 0.04,
        }
    }
}

#[derive(Clone, Copy, Debug, Default)]
struct JointHistory {
    raw:      Vector4,
    filtered: Vector4,
    trend:    Vector4,
    frames:   u32,
}

/// Per-skeleton-slot, per-joint filter state.
#[derive(Debug)]
pub struct JointSmoother {
    params:  SmoothParams,
    history: [[JointHistory; JOINT_COUNT]; SKELETON_COUNT],
}

impl Default for JointSmoother {
    fn default() -> Self {
        JointSmoother::new(SmoothParams::default())
    }
}

impl JointSmoother {
    pub fn new(params: SmoothParams) -> Self {
        JointSmoother {
            params,
            history: [[JointHistory::default(); JOINT_COUNT]; SKELETON_COUNT],
        }
    }

    pub fn params(&self) -> SmoothParams { self.params }

    /// Smooth every joint of every tracked skeleton in place.
    ///
    /// Untracked skeletons and untracked joints drop their history, so a
    /// person re-entering the scene starts fresh.
    pub fn apply(&mut self, frame: &mut SkeletonFrame) {
        for (slot, skel) in frame.skeletons.iter_mut().enumerate() {
            if !skel.is_tracked() {
                self.history[slot] = [JointHistory::default(); JOINT_COUNT];
                continue;
            }
            for j in 0..JOINT_COUNT {
                if !skel.states[j].is_usable() {
                    self.history[slot][j] = JointHistory::default();
                    continue;
                }
                skel.joints[j] = self.filter(slot, j, skel.joints[j]);
            }
        }
        trace!("smoothed skeleton frame at {:?}", frame.timestamp);
    }

    fn filter(&mut self, slot: usize, joint: usize, raw: Vector4) -> Vector4 {
        let p = self.params;
        let h = &mut self.history[slot][joint];

        let (filtered, trend) = match h.frames {
            0 => (raw, Vector4::default()),
            1 => {
                let filtered = raw.add(h.raw).scale(0.5);
                let diff = filtered.sub(h.filtered);
                let trend = diff.scale(p.correction).add(h.trend.scale(1.0 - p.correction));
                (filtered, trend)
            }
            _ => {
                // damp small movements towards the previous estimate
                let diff = raw.sub(h.filtered);
                let len = diff.length();
                let input = if len <= p.jitter_radius && p.jitter_radius > 0.0 {
                    let k = len / p.jitter_radius;
                    raw.scale(k).add(h.filtered.scale(1.0 - k))
                } else {
                    raw
                };
                let filtered = input
                    .scale(1.0 - p.smoothing)
                    .add(h.filtered.add(h.trend).scale(p.smoothing));
                let diff = filtered.sub(h.filtered);
                let trend = diff.scale(p.correction).add(h.trend.scale(1.0 - p.correction));
                (filtered, trend)
            }
        };

        let mut predicted = filtered.add(trend.scale(p.prediction));
        let dev = predicted.sub(raw).length();
        if dev > p.max_deviation_radius && dev > 0.0 {
            let k = p.max_deviation_radius / dev;
            predicted = predicted.scale(k).add(raw.scale(1.0 - k));
        }

        *h = JointHistory {
            raw,
            filtered,
            trend,
            frames: h.frames.saturating_add(1),
        };
        predicted.w = raw.w;
        predicted
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::skeleton::{JointIndex, JointTrackingState, SkeletonTrackingState};

    fn frame_with_foot(pos: Vector4) -> SkeletonFrame {
        let mut f = SkeletonFrame::default();
        f.skeletons[0].tracking = SkeletonTrackingState::Tracked;
        f.skeletons[0].set_joint(JointIndex::FootRight, pos, JointTrackingState::Tracked);
        f
    }

    fn close(a: Vector4, b: Vector4) -> bool {
        a.sub(b).length() < 1e-5
    }

    #[test]
    fn first_frame_passes_through() {
        let mut s = JointSmoother::default();
        let p = Vector4::new(0.3, -0.8, 2.0);
        let mut f = frame_with_foot(p);
        s.apply(&mut f);
        assert!(close(f.skeletons[0].joint(JointIndex::FootRight), p));
    }

    #[test]
    fn stationary_joint_stays_put() {
        let mut s = JointSmoother::default();
        let p = Vector4::new(-0.1, -0.9, 2.5);
        for _ in 0..10 {
            let mut f = frame_with_foot(p);
            s.apply(&mut f);
            assert!(close(f.skeletons[0].joint(JointIndex::FootRight), p));
        }
    }

    #[test]
    fn prediction_never_strays_past_max_deviation() {
        let mut s = JointSmoother::default();
        let max = s.params().max_deviation_radius;
        for i in 0..30 {
            let raw = Vector4::new(i as f32 * 0.2, 0.0, 2.0);
            let mut f = frame_with_foot(raw);
            s.apply(&mut f);
            let out = f.skeletons[0].joint(JointIndex::FootRight);
            assert!(out.sub(raw).length() <= max + 1e-4, "frame {i}");
        }
    }

    #[test]
    fn jitter_is_damped() {
        let mut s = JointSmoother::default();
        let base = Vector4::new(0.0, 0.0, 2.0);
        for _ in 0..5 {
            let mut f = frame_with_foot(base);
            s.apply(&mut f);
        }
        let jittered = Vector4::new(0.01, 0.0, 2.0);
        let mut f = frame_with_foot(jittered);
        s.apply(&mut f);
        let out = f.skeletons[0].joint(JointIndex::FootRight);
        assert!(out.x < jittered.x);
        assert!(out.x >= 0.0);
    }

    #[test]
    fn untracked_slot_is_left_alone_and_reset() {
        let mut s = JointSmoother::default();
        let mut f = frame_with_foot(Vector4::new(1.0, 1.0, 1.0));
        s.apply(&mut f);
        s.apply(&mut f);

        let mut gone = SkeletonFrame::default();
        gone.skeletons[0].joints[JointIndex::FootRight.idx()] = Vector4::new(9.0, 9.0, 9.0);
        s.apply(&mut gone);
        assert_eq!(gone.skeletons[0].joint(JointIndex::FootRight), Vector4::new(9.0, 9.0, 9.0));

        // back in view: history restarted, so the first frame passes through
        let p = Vector4::new(-1.0, 0.0, 3.0);
        let mut back = frame_with_foot(p);
        s.apply(&mut back);
        assert!(close(back.skeletons[0].joint(JointIndex::FootRight), p));
    }
}
