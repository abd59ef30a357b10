//! Skeleton → screen projection and the foot-marker set.
//!
//! Projection is two-stage: joints are first projected into a fixed
//! reference depth-image space ([`REFERENCE`], 320×240), then rescaled
//! linearly to whatever size the output surface currently has.  The
//! reference projection is defined only at that one resolution; the rescale
//! keeps the overlay correct when the window is resized.

use log::trace;

use crate::frame::Resolution;
use crate::skeleton::{JointIndex, SkeletonData, SkeletonFrame, Vector4, JOINT_COUNT};

/// Resolution of the reference projection space.
pub const REFERENCE: Resolution = Resolution::DEPTH_320X240;

/// Skeletons that get foot markers.
pub const MARKED_SKELETONS: usize = 2;

/// Right + left foot for each marked skeleton.
pub const FOOT_MARKER_COUNT: usize = MARKED_SKELETONS * 2;

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ScreenPoint {
    pub x: f32,
    pub y: f32,
}

// ════════════════════════════════════════════════════════════════════════════
// SkeletonProjection
// ════════════════════════════════════════════════════════════════════════════

/// Projects a sensor-space point into [`REFERENCE`] depth-image pixels.
pub trait SkeletonProjection {
    /// Returns `(x, y, packed_depth)`.
    fn to_depth_image(&self, point: Vector4) -> (i32, i32, u16);
}

/// Nominal pinhole model of the depth camera.
#[derive(Clone, Copy, Debug)]
pub struct DepthImageProjection {
    /// Focal length in reference pixels.
    pub focal_px: f32,
}

impl DepthImageProjection {
    pub const NOMINAL_FOCAL_320X240: f32 = 285.63;
}

impl Default for DepthImageProjection {
    fn default() -> Self {
        DepthImageProjection { focal_px: Self::NOMINAL_FOCAL_320X240 }
    }
}

impl SkeletonProjection for DepthImageProjection {
    fn to_depth_image(&self, p: Vector4) -> (i32, i32, u16) {
        if p.z <= f32::EPSILON {
            return (0, 0, 0);
        }
        let w = REFERENCE.width as f32;
        let h = REFERENCE.height as f32;
        let fx = 0.5 + p.x * (self.focal_px / p.z) / w;
        let fy = 0.5 - p.y * (self.focal_px / p.z) / h;
        let x = (fx * w + 0.5) as i32;
        let y = (fy * h + 0.5) as i32;
        let depth = (((p.z * 1000.0) as u32).min(u16::MAX as u32 >> 3) as u16) << 3;
        (x, y, depth)
    }
}

/// Project `point` and rescale from [`REFERENCE`] to a `width × height`
/// surface.
pub fn skeleton_to_screen<P: SkeletonProjection + ?Sized>(
    projection: &P,
    point:      Vector4,
    width:      usize,
    height:     usize,
) -> ScreenPoint {
    let (x, y, _) = projection.to_depth_image(point);
    ScreenPoint {
        x: x as f32 * width as f32 / REFERENCE.width as f32,
        y: y as f32 * height as f32 / REFERENCE.height as f32,
    }
}

// ════════════════════════════════════════════════════════════════════════════
// FootMarkers
// ════════════════════════════════════════════════════════════════════════════

/// Exactly [`FOOT_MARKER_COUNT`] marker slots; `None` means "don't draw".
///
/// Slot `2·s` is skeleton `s`'s right foot, `2·s + 1` its left foot.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FootMarkers {
    slots: [Option<ScreenPoint>; FOOT_MARKER_COUNT],
}

impl FootMarkers {
    pub fn right_slot(skeleton: usize) -> usize { skeleton * 2 }
    pub fn left_slot(skeleton: usize)  -> usize { skeleton * 2 + 1 }

    pub fn clear(&mut self) {
        self.slots = [None; FOOT_MARKER_COUNT];
    }

    pub fn get(&self, slot: usize) -> Option<ScreenPoint> {
        self.slots.get(slot).copied().flatten()
    }

    pub fn set(&mut self, slot: usize, point: Option<ScreenPoint>) {
        if let Some(s) = self.slots.get_mut(slot) {
            *s = point;
        }
    }

    pub fn slots(&self) -> &[Option<ScreenPoint>; FOOT_MARKER_COUNT] { &self.slots }

    /// Present markers only.
    pub fn present(&self) -> impl Iterator<Item = ScreenPoint> + '_ {
        self.slots.iter().flatten().copied()
    }

    pub fn presence(&self) -> [bool; FOOT_MARKER_COUNT] {
        self.slots.map(|s| s.is_some())
    }
}

// ════════════════════════════════════════════════════════════════════════════
// FootProjector
// ════════════════════════════════════════════════════════════════════════════

/// Turns a (smoothed) skeleton frame into screen-space joints and markers.
#[derive(Debug)]
pub struct FootProjector<P: SkeletonProjection = DepthImageProjection> {
    projection:   P,
    joint_points: [Option<[ScreenPoint; JOINT_COUNT]>; MARKED_SKELETONS],
    markers:      FootMarkers,
}

impl Default for FootProjector<DepthImageProjection> {
    fn default() -> Self {
        FootProjector::new(DepthImageProjection::default())
    }
}

impl<P: SkeletonProjection> FootProjector<P> {
    pub fn new(projection: P) -> Self {
        FootProjector {
            projection,
            joint_points: [None; MARKED_SKELETONS],
            markers:      FootMarkers::default(),
        }
    }

    pub fn markers(&self) -> &FootMarkers { &self.markers }

    /// Screen positions of every joint of marked skeleton `n`, or `None` if
    /// the last update marked fewer skeletons.
    pub fn joint_points(&self, n: usize) -> Option<&[ScreenPoint; JOINT_COUNT]> {
        self.joint_points.get(n)?.as_ref()
    }

    /// Recompute markers for a `width × height` surface.
    ///
    /// All slots are cleared first; the first [`MARKED_SKELETONS`] tracked
    /// skeletons then fill their foot slots where the foot joint is tracked
    /// or inferred.
    pub fn update(&mut self, frame: &SkeletonFrame, width: usize, height: usize) -> &FootMarkers {
        self.markers.clear();
        self.joint_points = [None; MARKED_SKELETONS];

        let marked: Vec<&SkeletonData> = frame.tracked().map(|(_, s)| s).take(MARKED_SKELETONS).collect();
        for (n, skel) in marked.into_iter().enumerate() {
            let points: [ScreenPoint; JOINT_COUNT] = std::array::from_fn(|j| {
                skeleton_to_screen(&self.projection, skel.joints[j], width, height)
            });
            self.joint_points[n] = Some(points);

            for (joint, slot) in [
                (JointIndex::FootRight, FootMarkers::right_slot(n)),
                (JointIndex::FootLeft,  FootMarkers::left_slot(n)),
            ] {
                if skel.state(joint).is_usable() {
                    self.markers.set(slot, Some(points[joint.idx()]));
                }
            }
        }

        trace!("foot markers: {:?}", self.markers.presence());
        &self.markers
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::skeleton::{JointTrackingState, SkeletonTrackingState};

    /// Projection that returns fixed reference coordinates.
    struct At(i32, i32);
    impl SkeletonProjection for At {
        fn to_depth_image(&self, _: Vector4) -> (i32, i32, u16) { (self.0, self.1, 0) }
    }

    fn tracked_skeleton(right: JointTrackingState, left: JointTrackingState) -> SkeletonData {
        let mut s = SkeletonData { tracking: SkeletonTrackingState::Tracked, ..Default::default() };
        s.set_joint(JointIndex::FootRight, Vector4::new(0.2, -0.9, 2.0), right);
        s.set_joint(JointIndex::FootLeft, Vector4::new(-0.2, -0.9, 2.0), left);
        s
    }

    #[test]
    fn optical_axis_hits_reference_centre() {
        let (x, y, d) = DepthImageProjection::default().to_depth_image(Vector4::new(0.0, 0.0, 2.0));
        assert_eq!((x, y), (160, 120));
        assert_eq!(d, 2000 << 3);
    }

    #[test]
    fn right_and_up_move_right_and_up() {
        let p = DepthImageProjection::default();
        let (x, y, _) = p.to_depth_image(Vector4::new(0.5, 0.5, 2.0));
        assert!(x > 160);
        assert!(y < 120);
    }

    #[test]
    fn zero_depth_projects_to_origin() {
        assert_eq!(DepthImageProjection::default().to_depth_image(Vector4::new(1.0, 1.0, 0.0)), (0, 0, 0));
    }

    #[test]
    fn rescale_is_linear() {
        let p = At(100, 60);
        let a = skeleton_to_screen(&p, Vector4::default(), 320, 240);
        assert_eq!(a, ScreenPoint { x: 100.0, y: 60.0 });
        let b = skeleton_to_screen(&p, Vector4::default(), 640, 240);
        assert_eq!(b.x, 2.0 * a.x);
        assert_eq!(b.y, a.y);
        let c = skeleton_to_screen(&p, Vector4::default(), 800, 600);
        assert_eq!(c, ScreenPoint { x: 250.0, y: 150.0 });
    }

    #[test]
    fn doubling_width_doubles_x_for_real_projection() {
        let p = DepthImageProjection::default();
        let pt = Vector4::new(0.3, -0.4, 2.2);
        let a = skeleton_to_screen(&p, pt, 500, 400);
        let b = skeleton_to_screen(&p, pt, 1000, 400);
        assert_eq!(b.x, 2.0 * a.x);
    }

    #[test]
    fn markers_reset_each_update() {
        let mut fp = FootProjector::new(At(10, 20));
        let mut f = SkeletonFrame::default();
        f.skeletons[0] = tracked_skeleton(JointTrackingState::Tracked, JointTrackingState::Tracked);
        fp.update(&f, 320, 240);
        assert_eq!(fp.markers().present().count(), 2);

        let empty = SkeletonFrame::default();
        fp.update(&empty, 320, 240);
        assert_eq!(fp.markers().present().count(), 0);
    }

    #[test]
    fn not_tracked_foot_leaves_slot_absent() {
        let mut fp = FootProjector::new(At(10, 20));
        let mut f = SkeletonFrame::default();
        f.skeletons[0] = tracked_skeleton(JointTrackingState::NotTracked, JointTrackingState::Inferred);
        let m = fp.update(&f, 320, 240);
        assert_eq!(m.get(FootMarkers::right_slot(0)), None);
        assert_eq!(m.get(FootMarkers::left_slot(0)), Some(ScreenPoint { x: 10.0, y: 20.0 }));
    }

    #[test]
    fn first_two_tracked_skeletons_fill_slots_in_order() {
        let mut fp = FootProjector::new(At(0, 0));
        let mut f = SkeletonFrame::default();
        f.skeletons[1] = tracked_skeleton(JointTrackingState::Tracked, JointTrackingState::NotTracked);
        f.skeletons[3] = tracked_skeleton(JointTrackingState::NotTracked, JointTrackingState::Tracked);
        f.skeletons[5] = tracked_skeleton(JointTrackingState::Tracked, JointTrackingState::Tracked);
        let m = fp.update(&f, 320, 240);
        assert_eq!(m.presence(), [true, false, false, true]);
    }

    #[test]
    fn origin_projection_is_still_a_present_marker() {
        let mut fp = FootProjector::new(At(0, 0));
        let mut f = SkeletonFrame::default();
        f.skeletons[0] = tracked_skeleton(JointTrackingState::Tracked, JointTrackingState::NotTracked);
        let m = fp.update(&f, 640, 480);
        assert_eq!(m.get(0), Some(ScreenPoint { x: 0.0, y: 0.0 }));
    }

    #[test]
    fn joint_points_only_for_skeletons_marked_this_update() {
        let mut fp = FootProjector::new(At(10, 20));
        let mut f = SkeletonFrame::default();
        f.skeletons[0] = tracked_skeleton(JointTrackingState::Tracked, JointTrackingState::Tracked);
        f.skeletons[2] = tracked_skeleton(JointTrackingState::Tracked, JointTrackingState::Tracked);
        fp.update(&f, 320, 240);
        assert!(fp.joint_points(0).is_some());
        assert_eq!(fp.joint_points(1).map(|p| p[JointIndex::FootLeft.idx()]), Some(ScreenPoint { x: 10.0, y: 20.0 }));

        f.skeletons[2] = SkeletonData::default();
        fp.update(&f, 320, 240);
        assert!(fp.joint_points(0).is_some());
        assert_eq!(fp.joint_points(1), None);

        fp.update(&SkeletonFrame::default(), 320, 240);
        assert_eq!(fp.joint_points(0), None);
        assert_eq!(fp.joint_points(MARKED_SKELETONS), None);
    }
}
