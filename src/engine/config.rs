use serde::{Deserialize, Serialize};

/// Tunable thresholds for the whole counting pipeline.
///
/// Every geometric and temporal constant lives here rather than inline in
/// the algorithms, so the numbers can be tuned and tested independently
/// of the state machine logic.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EngineConfig {
    /// Minimum keypoint confidence for a joint to count as visible.
    pub visibility_threshold: f32,

    /// Consecutive net-positive gate passes required to lock in.
    pub body_ready_threshold: u32,

    /// Smoothed elbow angle below this flips the stage to Down.
    pub down_angle_deg: f32,

    /// Smoothed elbow angle above this flips the stage back to Up.
    /// Separated from `down_angle_deg` by a dead zone so noise near a
    /// single boundary cannot toggle the stage.
    pub up_angle_deg: f32,

    /// Exponential smoothing weight on the previous value, in [0, 1).
    /// Higher favors stability over responsiveness.
    pub smoothing_factor: f32,

    /// Arms-extended rest angle the smoother is reseeded to on lock-in.
    pub neutral_angle_deg: f32,

    /// Minimum time between two counted reps.
    pub rep_cooldown_ms: u64,

    /// Consecutive posture failures tolerated before counting suspends.
    pub bad_frame_tolerance: u32,

    /// Max |shoulder y - hip y| for a prone torso, normalized coords.
    pub horizontal_tolerance: f32,

    /// Max height of wrists above shoulders before the posture reads as
    /// arms-raised rather than plank.
    pub hand_height_tolerance: f32,

    /// Shoulder-to-hip x spread below this, combined with a y spread
    /// above `upright_y_spread`, reads as a standing torso.
    pub upright_x_spread: f32,
    pub upright_y_spread: f32,

    /// Every Nth rep is flagged as a milestone for external audio/UI.
    pub milestone_every: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            visibility_threshold: 0.35,
            body_ready_threshold: 8,
            down_angle_deg: 105.0,
            up_angle_deg: 145.0,
            smoothing_factor: 0.7,
            neutral_angle_deg: 160.0,
            rep_cooldown_ms: 200,
            bad_frame_tolerance: 5,
            horizontal_tolerance: 0.32,
            hand_height_tolerance: 0.25,
            upright_x_spread: 0.05,
            upright_y_spread: 0.20,
            milestone_every: 10,
        }
    }
}
