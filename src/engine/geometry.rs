//! Pure keypoint geometry: joint angles and visibility tests.

use crate::pose::{Body, Keypoint, Side};

/// Unsigned angle in degrees at vertex `b`, formed by the rays `b -> a`
/// and `b -> c`, folded into [0, 180].
///
/// Total for any finite input; coincident points yield a finite but
/// meaningless angle, which the visibility gating upstream is expected
/// to keep out of the signal path.
pub fn angle_between(a: (f32, f32), b: (f32, f32), c: (f32, f32)) -> f32 {
    let to_c = (c.1 - b.1).atan2(c.0 - b.0);
    let to_a = (a.1 - b.1).atan2(a.0 - b.0);
    let deg = (to_c - to_a).to_degrees().abs();
    if deg > 180.0 {
        360.0 - deg
    } else {
        deg
    }
}

/// A keypoint is visible when its confidence strictly exceeds the threshold.
pub fn is_visible(keypoint: &Keypoint, threshold: f32) -> bool {
    keypoint.visibility > threshold
}

/// Whether one arm's full shoulder/elbow/wrist triple is visible.
pub fn arm_visible(body: &Body, side: Side, threshold: f32) -> bool {
    let (shoulder, elbow, wrist) = body.arm(side);
    is_visible(shoulder, threshold) && is_visible(elbow, threshold) && is_visible(wrist, threshold)
}

/// Raw elbow-flexion angle for one frame.
///
/// Uses whichever side has its full arm visible; the mean of both sides
/// when both qualify; `None` when neither arm is usable.
pub fn elbow_angle(body: &Body, threshold: f32) -> Option<f32> {
    let left = side_elbow_angle(body, Side::Left, threshold);
    let right = side_elbow_angle(body, Side::Right, threshold);

    match (left, right) {
        (Some(l), Some(r)) => Some((l + r) / 2.0),
        (Some(l), None) => Some(l),
        (None, Some(r)) => Some(r),
        (None, None) => None,
    }
}

fn side_elbow_angle(body: &Body, side: Side, threshold: f32) -> Option<f32> {
    if !arm_visible(body, side, threshold) {
        return None;
    }
    let (shoulder, elbow, wrist) = body.arm(side);
    Some(angle_between(shoulder.pos(), elbow.pos(), wrist.pos()))
}
