//! Position gate: cheap geometric heuristics that decide whether the
//! subject is in a valid prone exercise posture. A stack of simple 2D
//! checks stands in for full 3D pose classification.

use serde::{Deserialize, Serialize};

use super::config::EngineConfig;
use super::geometry::{arm_visible, is_visible};
use crate::pose::{Body, Joint, Side};

/// Why a frame was rejected by the gate. Surfaced as status text so the
/// subject can correct their posture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PostureFault {
    IncompleteBody,
    NotHorizontal,
    HandsTooHigh,
    Standing,
}

impl PostureFault {
    pub fn as_str(&self) -> &'static str {
        match self {
            PostureFault::IncompleteBody => "incomplete body",
            PostureFault::NotHorizontal => "not horizontal",
            PostureFault::HandsTooHigh => "hands too high",
            PostureFault::Standing => "standing",
        }
    }
}

/// Classify the frame's posture. Checks run in a fixed order and the
/// first failure wins.
pub fn check_posture(body: &Body, config: &EngineConfig) -> Result<(), PostureFault> {
    let vis = config.visibility_threshold;

    // Shoulders and hips anchor every later measurement; at least one
    // full arm is needed for the angle signal.
    let shoulders_visible = is_visible(body.joint(Joint::LeftShoulder), vis)
        && is_visible(body.joint(Joint::RightShoulder), vis);
    let hips_visible = is_visible(body.joint(Joint::LeftHip), vis)
        && is_visible(body.joint(Joint::RightHip), vis);
    let any_arm_visible =
        arm_visible(body, Side::Left, vis) || arm_visible(body, Side::Right, vis);

    if !(shoulders_visible && hips_visible && any_arm_visible) {
        return Err(PostureFault::IncompleteBody);
    }

    let shoulder_y = body.pair_y(Joint::LeftShoulder, Joint::RightShoulder);
    let hip_y = body.pair_y(Joint::LeftHip, Joint::RightHip);

    // Shoulders and hips on roughly the same height line; rejects
    // standing and seated postures.
    if (shoulder_y - hip_y).abs() > config.horizontal_tolerance {
        return Err(PostureFault::NotHorizontal);
    }

    // Image y grows downward, so a large positive shoulder-minus-wrist
    // difference means the hands float above the torso, a standing
    // bent-arm pose that would otherwise mimic the angle pattern.
    let mut wrist_sum = 0.0;
    let mut wrist_count = 0.0;
    for joint in [Joint::LeftWrist, Joint::RightWrist] {
        let kp = body.joint(joint);
        if is_visible(kp, vis) {
            wrist_sum += kp.y;
            wrist_count += 1.0;
        }
    }
    if wrist_count > 0.0 && shoulder_y - wrist_sum / wrist_count > config.hand_height_tolerance {
        return Err(PostureFault::HandsTooHigh);
    }

    // Near-vertical torso: no horizontal spread between shoulder and hip
    // midpoints but plenty of vertical spread. Catches uprights that
    // squeak past the horizontal tolerance.
    let shoulder_mid_x = body.pair_x(Joint::LeftShoulder, Joint::RightShoulder);
    let hip_mid_x = body.pair_x(Joint::LeftHip, Joint::RightHip);
    let x_spread = (shoulder_mid_x - hip_mid_x).abs();
    let y_spread = (shoulder_y - hip_y).abs();
    if x_spread < config.upright_x_spread && y_spread > config.upright_y_spread {
        return Err(PostureFault::Standing);
    }

    Ok(())
}
