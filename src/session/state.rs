use std::fmt;

use serde::{Deserialize, Serialize};

use crate::engine::{PostureFault, Stage};

/// Session lifecycle phase. A session starts awaiting lock-in and, once
/// locked, never drops back; only an explicit stop ends it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Phase {
    AwaitingLock,
    Locked,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::AwaitingLock => "awaiting lock",
            Phase::Locked => "locked",
        }
    }
}

/// Semantic session status for external display. Emitted only when it
/// changes from the previously reported value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SessionStatus {
    /// Accumulating lock-in evidence: `streak` of `needed` frames.
    LockingIn { streak: u32, needed: u32 },
    /// Gate rejection, with the first failing check.
    BadPosture(PostureFault),
    /// The pose model reported no subject at all.
    SubjectLost,
    /// Lock-in complete, counting armed.
    Ready,
    /// Actively counting; `reps` is the running total.
    Counting { reps: u32 },
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionStatus::LockingIn { streak, needed } => {
                write!(f, "locking in, {streak}/{needed}")
            }
            SessionStatus::BadPosture(fault) => write!(f, "bad posture: {}", fault.as_str()),
            SessionStatus::SubjectLost => write!(f, "subject lost"),
            SessionStatus::Ready => write!(f, "ready"),
            SessionStatus::Counting { reps } => write!(f, "rep {reps}"),
        }
    }
}

/// Point-in-time read copy of the counting state, for synchronous
/// queries. Never a live reference into the session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub rep_count: u32,
    pub phase: Phase,
    pub stage: Stage,
    /// Defined only once the session is locked.
    pub smoothed_angle: Option<f32>,
}
