//! Skeleton-tracking data as delivered by the sensor.
//!
//! Positions are in sensor space: metres, x to the sensor's right, y up,
//! z away from the sensor.

use std::time::Duration;

/// Skeleton records in every frame, tracked or not.
pub const SKELETON_COUNT: usize = 6;

/// Joints per skeleton.
pub const JOINT_COUNT: usize = 20;

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Vector4 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub w: f32,
}

impl Vector4 {
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Vector4 { x, y, z, w: 1.0 }
    }

    pub fn sub(self, o: Vector4) -> Vector4 {
        Vector4 { x: self.x - o.x, y: self.y - o.y, z: self.z - o.z, w: self.w }
    }

    pub fn add(self, o: Vector4) -> Vector4 {
        Vector4 { x: self.x + o.x, y: self.y + o.y, z: self.z + o.z, w: self.w }
    }

    pub fn scale(self, k: f32) -> Vector4 {
        Vector4 { x: self.x * k, y: self.y * k, z: self.z * k, w: self.w }
    }

    pub fn length(self) -> f32 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Joints
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(usize)]
pub enum JointIndex {
    HipCenter      = 0,
    Spine          = 1,
    ShoulderCenter = 2,
    Head           = 3,
    ShoulderLeft   = 4,
    ElbowLeft      = 5,
    WristLeft      = 6,
    HandLeft       = 7,
    ShoulderRight  = 8,
    ElbowRight     = 9,
    WristRight     = 10,
    HandRight      = 11,
    HipLeft        = 12,
    KneeLeft       = 13,
    AnkleLeft      = 14,
    FootLeft       = 15,
    HipRight       = 16,
    KneeRight      = 17,
    AnkleRight     = 18,
    FootRight      = 19,
}

impl JointIndex {
    pub const ALL: [JointIndex; JOINT_COUNT] = [
        JointIndex::HipCenter,
        JointIndex::Spine,
        JointIndex::ShoulderCenter,
        JointIndex::Head,
        JointIndex::ShoulderLeft,
        JointIndex::ElbowLeft,
        JointIndex::WristLeft,
        JointIndex::HandLeft,
        JointIndex::ShoulderRight,
        JointIndex::ElbowRight,
        JointIndex::WristRight,
        JointIndex::HandRight,
        JointIndex::HipLeft,
        JointIndex::KneeLeft,
        JointIndex::AnkleLeft,
        JointIndex::FootLeft,
        JointIndex::HipRight,
        JointIndex::KneeRight,
        JointIndex::AnkleRight,
        JointIndex::FootRight,
    ];

    pub fn idx(self) -> usize { self as usize }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum JointTrackingState {
    #[default]
    NotTracked,
    /// Occluded; position estimated from neighbouring joints.
    Inferred,
    Tracked,
}

impl JointTrackingState {
    /// Tracked or inferred: good enough to draw.
    pub fn is_usable(self) -> bool {
        !matches!(self, JointTrackingState::NotTracked)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SkeletonTrackingState {
    #[default]
    NotTracked,
    /// Only the overall position is known, no joints.
    PositionOnly,
    Tracked,
}

// ════════════════════════════════════════════════════════════════════════════
// SkeletonData / SkeletonFrame
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SkeletonData {
    pub tracking: SkeletonTrackingState,
    pub position: Vector4,
    pub joints:   [Vector4; JOINT_COUNT],
    pub states:   [JointTrackingState; JOINT_COUNT],
}

impl SkeletonData {
    pub fn joint(&self, j: JointIndex) -> Vector4 { self.joints[j.idx()] }
    pub fn state(&self, j: JointIndex) -> JointTrackingState { self.states[j.idx()] }

    pub fn set_joint(&mut self, j: JointIndex, pos: Vector4, state: JointTrackingState) {
        self.joints[j.idx()] = pos;
        self.states[j.idx()] = state;
    }

    pub fn is_tracked(&self) -> bool {
        self.tracking == SkeletonTrackingState::Tracked
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct SkeletonFrame {
    pub timestamp: Duration,
    pub skeletons: [SkeletonData; SKELETON_COUNT],
}

impl SkeletonFrame {
    /// Tracked skeleton records in slot order.
    pub fn tracked(&self) -> impl Iterator<Item = (usize, &SkeletonData)> {
        self.skeletons.iter().enumerate().filter(|(_, s)| s.is_tracked())
    }
}
