use serde::{Deserialize, Serialize};

use super::joints::{Joint, Side, JOINT_COUNT};

/// A single tracked body joint in normalized image space (0..1),
/// with the pose model's detection confidence.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Keypoint {
    pub x: f32,
    pub y: f32,
    /// Confidence in 0..1. Defaults to 0 when the upstream model
    /// omitted the joint entirely.
    #[serde(default)]
    pub visibility: f32,
}

impl Keypoint {
    pub fn new(x: f32, y: f32, visibility: f32) -> Self {
        Self { x, y, visibility }
    }

    pub fn pos(&self) -> (f32, f32) {
        (self.x, self.y)
    }
}

/// One complete set of keypoints, indexed by [`Joint`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Body {
    keypoints: [Keypoint; JOINT_COUNT],
}

impl Body {
    pub fn new(keypoints: [Keypoint; JOINT_COUNT]) -> Self {
        Self { keypoints }
    }

    pub fn joint(&self, joint: Joint) -> &Keypoint {
        &self.keypoints[joint.index()]
    }

    /// The (shoulder, elbow, wrist) keypoints of one arm.
    pub fn arm(&self, side: Side) -> (&Keypoint, &Keypoint, &Keypoint) {
        let (s, e, w) = side.arm();
        (self.joint(s), self.joint(e), self.joint(w))
    }

    /// Midpoint y of a left/right joint pair.
    pub fn pair_y(&self, left: Joint, right: Joint) -> f32 {
        (self.joint(left).y + self.joint(right).y) / 2.0
    }

    /// Midpoint x of a left/right joint pair.
    pub fn pair_x(&self, left: Joint, right: Joint) -> f32 {
        (self.joint(left).x + self.joint(right).x) / 2.0
    }
}

/// One inference cycle's output. `body: None` is the distinct "no subject
/// detected" signal, as opposed to a subject whose joints are merely
/// below the visibility threshold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PoseFrame {
    /// Capture timestamp. The engine requires these to be non-decreasing
    /// across the frame stream; it does not reorder.
    pub timestamp_ms: u64,
    pub body: Option<Body>,
}

impl PoseFrame {
    pub fn new(timestamp_ms: u64, body: Option<Body>) -> Self {
        Self { timestamp_ms, body }
    }

    /// A frame in which the pose model found no subject.
    pub fn empty(timestamp_ms: u64) -> Self {
        Self {
            timestamp_ms,
            body: None,
        }
    }
}
