//! Hysteresis rep state machine with cooldown debouncing.

use serde::{Deserialize, Serialize};

use super::config::EngineConfig;

/// Hysteresis state of the tracked elbow angle. `Up` is arms extended,
/// `Down` is the bottom of a push-up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Stage {
    Up,
    Down,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Up => "up",
            Stage::Down => "down",
        }
    }
}

/// Two-threshold rep detector. The dead zone between the down and up
/// thresholds keeps a noisy signal near a single boundary from toggling
/// the stage; the cooldown absorbs residual jitter that survives
/// smoothing.
#[derive(Debug, Clone)]
pub struct RepCounter {
    stage: Stage,
    last_rep_ms: Option<u64>,
}

impl RepCounter {
    pub fn new() -> Self {
        Self {
            stage: Stage::Up,
            last_rep_ms: None,
        }
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// Back to the arms-extended start state. Called on lock-in.
    pub fn reset(&mut self) {
        self.stage = Stage::Up;
        self.last_rep_ms = None;
    }

    /// Advance the state machine by one smoothed-angle sample.
    /// Returns true when a rep should be counted.
    ///
    /// When the up threshold is crossed inside the cooldown window the
    /// stage still flips to Up so the machine cannot wedge in Down, but
    /// no rep is counted and the cooldown clock is left untouched.
    pub fn advance(&mut self, smoothed_deg: f32, now_ms: u64, config: &EngineConfig) -> bool {
        if self.stage == Stage::Up && smoothed_deg < config.down_angle_deg {
            self.stage = Stage::Down;
            return false;
        }

        if self.stage == Stage::Down && smoothed_deg > config.up_angle_deg {
            self.stage = Stage::Up;

            let cooled = match self.last_rep_ms {
                Some(last) => now_ms.saturating_sub(last) > config.rep_cooldown_ms,
                None => true,
            };
            if cooled {
                self.last_rep_ms = Some(now_ms);
                return true;
            }
        }

        false
    }
}

impl Default for RepCounter {
    fn default() -> Self {
        Self::new()
    }
}
