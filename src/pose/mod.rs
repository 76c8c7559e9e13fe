pub mod geometry;
pub mod keypoint;

pub use geometry::{angle_at, distance, midpoint};
pub use keypoint::{Keypoint, KeypointIndex, Pose, VisiblePose};
