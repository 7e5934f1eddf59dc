pub mod frame;
pub mod joints;

pub use frame::{Body, Keypoint, PoseFrame};
pub use joints::{Joint, Side, JOINT_COUNT};
