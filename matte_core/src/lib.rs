//! # matte_core
//!
//! The pixel-level heart of the green screen: depth/color frame storage,
//! depth→color registration, the matting compositor, and the projection of
//! tracked skeleton joints onto the screen.
//!
//! Nothing here touches a window, a device, or a MIDI port.  The application
//! crate feeds frames in and hands the results to its renderer.
//!
//! ## Pipeline
//!
//! ```text
//!   DepthFrame ──► CoordinateMapper ──► ColorCoordinateMap ─┐
//!       │                                                    ▼
//!       └──────────────────────────────────────────────► compose() ──► CompositeBuffer
//!   ColorFrame ─────────────────────────────────────────────┘
//!
//!   SkeletonFrame ──► JointSmoother ──► FootProjector ──► FootMarkers
//! ```
//!
//! ## Quick start
//!
//! ```rust
//! use matte_core::{
//!     compose, pack_depth, ColorFrame, CompositeBuffer, CoordinateMapper,
//!     DepthFrame, FrameGeometry, NominalRegistration, Resolution, TRANSPARENCY,
//! };
//! use std::time::Duration;
//!
//! let geometry = FrameGeometry::new(Resolution::DEPTH_320X240, Resolution::COLOR_640X480).unwrap();
//! let mut depth = DepthFrame::new(geometry.depth);
//! let color     = ColorFrame::new(geometry.color);
//! depth.copy_from(&vec![pack_depth(2000, 0); geometry.depth.pixel_count()], Duration::ZERO);
//!
//! let mut mapper = CoordinateMapper::new(geometry.depth);
//! mapper.refresh(&depth, &NominalRegistration::new(geometry)).unwrap();
//!
//! let mut out = CompositeBuffer::new(geometry.color);
//! compose(&geometry, &depth, &color, mapper.map(), &mut out);
//! assert!(out.pixels().iter().all(|&p| p == TRANSPARENCY));
//! ```

pub mod frame;
pub mod mapper;
pub mod compositor;
pub mod skeleton;
pub mod smoothing;
pub mod projector;

pub use frame::{
    depth_mm, pack_depth, player_index, ColorFrame, CompositeBuffer, DepthFrame,
    FrameGeometry, GeometryError, Resolution, TRANSPARENCY,
};
pub use mapper::{ColorCoordinateMap, CoordinateMapper, MapError, NominalRegistration, Registration};
pub use compositor::compose;
pub use skeleton::{
    JointIndex, JointTrackingState, SkeletonData, SkeletonFrame, SkeletonTrackingState,
    Vector4, JOINT_COUNT, SKELETON_COUNT,
};
pub use smoothing::{JointSmoother, SmoothParams};
pub use projector::{
    skeleton_to_screen, DepthImageProjection, FootMarkers, FootProjector, ScreenPoint,
    SkeletonProjection, FOOT_MARKER_COUNT, MARKED_SKELETONS, REFERENCE,
};
