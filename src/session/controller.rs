use chrono::{DateTime, Utc};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::engine::geometry::elbow_angle;
use crate::engine::{check_posture, AngleSmoother, EngineConfig, PostureFault, RepCounter};
use crate::models::SessionRecord;
use crate::pose::PoseFrame;

use super::state::{Phase, SessionSnapshot, SessionStatus};

/// Observable side effects of one processed frame, for the host's UI,
/// audio, and persistence collaborators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SessionEvent {
    StatusChanged { status: SessionStatus },
    RepCounted { count: u32, milestone: bool },
    ReadinessChanged { locked: bool },
    /// Emitted by the frame feed once the session has been stopped.
    Finished { record: SessionRecord },
}

/// One workout's counting state. Owns every mutable piece of the
/// pipeline; collaborators only ever see snapshots and events.
///
/// Frames must arrive in capture order with non-decreasing timestamps;
/// the session never reorders or buffers them.
pub struct WorkoutSession {
    id: String,
    config: EngineConfig,
    phase: Phase,
    rep_count: u32,
    lock_streak: u32,
    bad_streak: u32,
    smoother: AngleSmoother,
    counter: RepCounter,
    last_status: Option<SessionStatus>,
    started_at: DateTime<Utc>,
    first_frame_ms: Option<u64>,
    last_frame_ms: Option<u64>,
}

impl WorkoutSession {
    pub fn new(config: EngineConfig) -> Self {
        let smoother = AngleSmoother::new(config.smoothing_factor, config.neutral_angle_deg);
        Self {
            id: Uuid::new_v4().to_string(),
            config,
            phase: Phase::AwaitingLock,
            rep_count: 0,
            lock_streak: 0,
            bad_streak: 0,
            smoother,
            counter: RepCounter::new(),
            last_status: None,
            started_at: Utc::now(),
            first_frame_ms: None,
            last_frame_ms: None,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Push one pose-model result through the pipeline. Returns the
    /// events the frame produced, in emission order.
    pub fn process_frame(&mut self, frame: &PoseFrame) -> Vec<SessionEvent> {
        let mut events = Vec::new();

        if self.first_frame_ms.is_none() {
            self.first_frame_ms = Some(frame.timestamp_ms);
        }
        self.last_frame_ms = Some(frame.timestamp_ms);

        match self.phase {
            Phase::AwaitingLock => self.drive_lock_in(frame, &mut events),
            Phase::Locked => self.drive_counting(frame, &mut events),
        }

        events
    }

    /// Point-in-time copy of the counting state.
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            rep_count: self.rep_count,
            phase: self.phase,
            stage: self.counter.stage(),
            smoothed_angle: match self.phase {
                Phase::Locked => Some(self.smoother.value()),
                Phase::AwaitingLock => None,
            },
        }
    }

    /// Stop the session and hand its final record to the caller.
    pub fn finish(self) -> SessionRecord {
        let active_ms = match (self.first_frame_ms, self.last_frame_ms) {
            (Some(first), Some(last)) => last.saturating_sub(first),
            _ => 0,
        };
        info!("session {}: finished with {} reps", self.id, self.rep_count);
        SessionRecord {
            id: self.id,
            started_at: self.started_at,
            stopped_at: Utc::now(),
            rep_count: self.rep_count,
            active_ms,
        }
    }

    /// Lock-in accumulates net-positive gate evidence. A failing frame
    /// decrements the streak (floor zero) instead of resetting it, so a
    /// single tracking flicker does not restart the whole countdown.
    fn drive_lock_in(&mut self, frame: &PoseFrame, events: &mut Vec<SessionEvent>) {
        let verdict = match &frame.body {
            Some(body) => check_posture(body, &self.config).map_err(Some),
            None => Err(None),
        };

        match verdict {
            Ok(()) => {
                self.lock_streak += 1;
                if self.lock_streak >= self.config.body_ready_threshold {
                    self.lock_in(events);
                } else {
                    self.set_status(
                        SessionStatus::LockingIn {
                            streak: self.lock_streak,
                            needed: self.config.body_ready_threshold,
                        },
                        events,
                    );
                }
            }
            Err(fault) => {
                self.lock_streak = self.lock_streak.saturating_sub(1);
                let status = match fault {
                    Some(fault) => SessionStatus::BadPosture(fault),
                    None => SessionStatus::SubjectLost,
                };
                self.set_status(status, events);
            }
        }
    }

    fn lock_in(&mut self, events: &mut Vec<SessionEvent>) {
        self.phase = Phase::Locked;
        self.counter.reset();
        self.smoother.reseed(self.config.neutral_angle_deg);
        self.bad_streak = 0;
        info!(
            "session {}: subject locked in after {} frames",
            self.id, self.lock_streak
        );
        events.push(SessionEvent::ReadinessChanged { locked: true });
        self.set_status(SessionStatus::Ready, events);
    }

    /// Once locked, every frame re-runs the gate. Failures below the
    /// tolerance are glitches and still drive the counter when an angle
    /// is available; at the tolerance, counting suspends until a passing
    /// frame resets the streak. The phase never drops back.
    fn drive_counting(&mut self, frame: &PoseFrame, events: &mut Vec<SessionEvent>) {
        let body = match &frame.body {
            Some(body) => body,
            None => {
                self.register_bad_frame(None, events);
                return;
            }
        };

        match check_posture(body, &self.config) {
            Ok(()) => {
                self.bad_streak = 0;
                if matches!(
                    self.last_status,
                    Some(SessionStatus::BadPosture(_)) | Some(SessionStatus::SubjectLost)
                ) {
                    self.set_status(
                        SessionStatus::Counting {
                            reps: self.rep_count,
                        },
                        events,
                    );
                }
            }
            Err(fault) => {
                if self.register_bad_frame(Some(fault), events) {
                    return;
                }
            }
        }

        let Some(raw) = elbow_angle(body, self.config.visibility_threshold) else {
            // Neither arm usable this frame; skip it for counting.
            return;
        };

        let smoothed = self.smoother.push(raw);
        if self
            .counter
            .advance(smoothed, frame.timestamp_ms, &self.config)
        {
            self.rep_count += 1;
            let milestone =
                self.config.milestone_every > 0 && self.rep_count % self.config.milestone_every == 0;
            info!(
                "session {}: rep {}{}",
                self.id,
                self.rep_count,
                if milestone { " (milestone)" } else { "" }
            );
            events.push(SessionEvent::RepCounted {
                count: self.rep_count,
                milestone,
            });
            self.set_status(
                SessionStatus::Counting {
                    reps: self.rep_count,
                },
                events,
            );
        }
    }

    /// Bookkeeping for a frame the gate rejected (or that had no
    /// subject). Returns true when counting is suspended for this frame.
    fn register_bad_frame(
        &mut self,
        fault: Option<PostureFault>,
        events: &mut Vec<SessionEvent>,
    ) -> bool {
        self.bad_streak += 1;
        if self.bad_streak == self.config.bad_frame_tolerance {
            warn!(
                "session {}: counting suspended after {} consecutive bad frames",
                self.id, self.bad_streak
            );
        }

        let status = match fault {
            Some(fault) => SessionStatus::BadPosture(fault),
            None => SessionStatus::SubjectLost,
        };
        self.set_status(status, events);

        self.bad_streak >= self.config.bad_frame_tolerance
    }

    fn set_status(&mut self, status: SessionStatus, events: &mut Vec<SessionEvent>) {
        if self.last_status.as_ref() != Some(&status) {
            self.last_status = Some(status.clone());
            events.push(SessionEvent::StatusChanged { status });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::Stage;
    use crate::pose::{Body, Joint, Keypoint, JOINT_COUNT};

    /// Smoothing off and small thresholds so sequences are exact.
    fn test_config() -> EngineConfig {
        EngineConfig {
            body_ready_threshold: 3,
            smoothing_factor: 0.0,
            down_angle_deg: 110.0,
            up_angle_deg: 145.0,
            rep_cooldown_ms: 150,
            bad_frame_tolerance: 3,
            ..EngineConfig::default()
        }
    }

    /// Horizontal plank whose elbow angle is constructed exactly: the
    /// wrist sits on a ray `angle_deg` away from the elbow->shoulder ray.
    fn plank_keypoints(angle_deg: f32) -> [Keypoint; JOINT_COUNT] {
        let mut keypoints = [Keypoint::new(0.5, 0.5, 0.9); JOINT_COUNT];
        let dir = (angle_deg - 90.0).to_radians();
        for (shoulder, elbow, wrist, x) in [
            (Joint::LeftShoulder, Joint::LeftElbow, Joint::LeftWrist, 0.30),
            (
                Joint::RightShoulder,
                Joint::RightElbow,
                Joint::RightWrist,
                0.34,
            ),
        ] {
            keypoints[shoulder.index()] = Keypoint::new(x, 0.50, 0.9);
            keypoints[elbow.index()] = Keypoint::new(x, 0.62, 0.9);
            keypoints[wrist.index()] =
                Keypoint::new(x + 0.12 * dir.cos(), 0.62 + 0.12 * dir.sin(), 0.9);
        }
        keypoints[Joint::LeftHip.index()] = Keypoint::new(0.62, 0.55, 0.9);
        keypoints[Joint::RightHip.index()] = Keypoint::new(0.66, 0.55, 0.9);
        keypoints[Joint::LeftKnee.index()] = Keypoint::new(0.78, 0.58, 0.9);
        keypoints[Joint::RightKnee.index()] = Keypoint::new(0.80, 0.58, 0.9);
        keypoints[Joint::LeftAnkle.index()] = Keypoint::new(0.90, 0.60, 0.9);
        keypoints[Joint::RightAnkle.index()] = Keypoint::new(0.92, 0.60, 0.9);
        keypoints
    }

    fn plank(angle_deg: f32, t: u64) -> PoseFrame {
        PoseFrame::new(t, Some(Body::new(plank_keypoints(angle_deg))))
    }

    /// Gate fails NotHorizontal but the arms (and so the angle) stay valid.
    fn tilted(angle_deg: f32, t: u64) -> PoseFrame {
        let mut keypoints = plank_keypoints(angle_deg);
        keypoints[Joint::LeftHip.index()] = Keypoint::new(0.62, 0.90, 0.9);
        keypoints[Joint::RightHip.index()] = Keypoint::new(0.66, 0.90, 0.9);
        PoseFrame::new(t, Some(Body::new(keypoints)))
    }

    /// Gate fails IncompleteBody and no raw angle can be computed.
    fn arms_hidden(t: u64) -> PoseFrame {
        let mut keypoints = plank_keypoints(160.0);
        for joint in [
            Joint::LeftElbow,
            Joint::RightElbow,
            Joint::LeftWrist,
            Joint::RightWrist,
        ] {
            let kp = keypoints[joint.index()];
            keypoints[joint.index()] = Keypoint::new(kp.x, kp.y, 0.1);
        }
        PoseFrame::new(t, Some(Body::new(keypoints)))
    }

    fn locked_session(config: EngineConfig) -> WorkoutSession {
        let mut session = WorkoutSession::new(config);
        for i in 0..3 {
            session.process_frame(&plank(160.0, i * 33));
        }
        assert_eq!(session.snapshot().phase, Phase::Locked);
        session
    }

    fn reps_in(events: &[SessionEvent]) -> u32 {
        events
            .iter()
            .filter(|e| matches!(e, SessionEvent::RepCounted { .. }))
            .count() as u32
    }

    #[test]
    fn test_lock_in_requires_consecutive_evidence() {
        let mut session = WorkoutSession::new(test_config());
        session.process_frame(&plank(160.0, 0));
        session.process_frame(&plank(160.0, 33));
        session.process_frame(&PoseFrame::empty(66));
        assert_eq!(session.snapshot().phase, Phase::AwaitingLock);

        session.process_frame(&plank(160.0, 99));
        assert_eq!(session.snapshot().phase, Phase::AwaitingLock);
        session.process_frame(&plank(160.0, 132));
        assert_eq!(session.snapshot().phase, Phase::Locked);
    }

    #[test]
    fn test_lock_streak_floor_is_zero() {
        let mut session = WorkoutSession::new(test_config());
        for i in 0..4 {
            session.process_frame(&PoseFrame::empty(i * 33));
        }
        for i in 4..6 {
            session.process_frame(&plank(160.0, i * 33));
        }
        assert_eq!(session.snapshot().phase, Phase::AwaitingLock);
        session.process_frame(&plank(160.0, 198));
        assert_eq!(session.snapshot().phase, Phase::Locked);
    }

    #[test]
    fn test_lock_emits_progress_then_readiness() {
        let mut session = WorkoutSession::new(test_config());
        let first = session.process_frame(&plank(160.0, 0));
        assert!(first.contains(&SessionEvent::StatusChanged {
            status: SessionStatus::LockingIn {
                streak: 1,
                needed: 3
            }
        }));

        session.process_frame(&plank(160.0, 33));
        let locking = session.process_frame(&plank(160.0, 66));
        assert!(locking.contains(&SessionEvent::ReadinessChanged { locked: true }));
        assert!(locking.contains(&SessionEvent::StatusChanged {
            status: SessionStatus::Ready
        }));
    }

    #[test]
    fn test_single_rep_scenario() {
        let mut session = locked_session(test_config());
        let mut total = 0;
        let mut t = 1000;
        for angle in [160.0, 150.0, 120.0, 95.0, 100.0, 140.0, 150.0, 160.0] {
            total += reps_in(&session.process_frame(&plank(angle, t)));
            t += 100;
        }
        assert_eq!(total, 1);
        let snapshot = session.snapshot();
        assert_eq!(snapshot.rep_count, 1);
        assert_eq!(snapshot.stage, Stage::Up);
    }

    #[test]
    fn test_back_to_back_excursions_hit_cooldown() {
        // Two full excursions 80ms apart: both flip the stage, only the
        // first one counts.
        let mut session = locked_session(test_config());
        let sequence = [160.0, 150.0, 120.0, 95.0, 100.0, 140.0, 150.0, 160.0];
        let mut total = 0;
        let mut t = 1000;
        for angle in sequence.iter().chain(sequence.iter()) {
            total += reps_in(&session.process_frame(&plank(*angle, t)));
            t += 10;
        }
        assert_eq!(total, 1);
        assert_eq!(session.snapshot().stage, Stage::Up);
    }

    #[test]
    fn test_spaced_excursions_all_count() {
        let mut session = locked_session(test_config());
        let mut total = 0;
        for rep in 0u64..3 {
            let base = 1000 + rep * 1000;
            total += reps_in(&session.process_frame(&plank(95.0, base)));
            total += reps_in(&session.process_frame(&plank(160.0, base + 500)));
        }
        assert_eq!(total, 3);
        assert_eq!(session.snapshot().rep_count, 3);
    }

    #[test]
    fn test_unusable_angle_glitch_does_not_interrupt_rep() {
        let mut session = locked_session(test_config());
        session.process_frame(&plank(95.0, 1000));
        // Two frames with both arms hidden: gate failures below the
        // tolerance, no angle, rep still completes afterwards.
        session.process_frame(&arms_hidden(1033));
        session.process_frame(&arms_hidden(1066));
        let events = session.process_frame(&plank(160.0, 1100));
        assert_eq!(reps_in(&events), 1);
    }

    #[test]
    fn test_tolerated_gate_failure_still_drives_counter() {
        let mut session = locked_session(test_config());
        session.process_frame(&tilted(95.0, 1000));
        let events = session.process_frame(&tilted(160.0, 1400));
        assert_eq!(reps_in(&events), 1);
    }

    #[test]
    fn test_suspension_at_tolerance_blocks_counting() {
        let mut session = locked_session(test_config());
        session.process_frame(&plank(95.0, 1000));

        session.process_frame(&tilted(120.0, 1033));
        session.process_frame(&tilted(120.0, 1066));
        // Third consecutive failure reaches the tolerance: this frame
        // would cross the up threshold but must not count.
        let suspended = session.process_frame(&tilted(160.0, 1100));
        assert_eq!(reps_in(&suspended), 0);
        assert_eq!(session.snapshot().stage, Stage::Down);

        // First passing frame resets the streak and counting resumes.
        let resumed = session.process_frame(&plank(160.0, 1400));
        assert_eq!(reps_in(&resumed), 1);
    }

    #[test]
    fn test_missing_frames_never_reset_phase() {
        let mut session = locked_session(test_config());
        for i in 0..5 {
            session.process_frame(&PoseFrame::empty(1000 + i * 33));
            assert_eq!(session.snapshot().phase, Phase::Locked);
        }
        session.process_frame(&plank(95.0, 2000));
        let events = session.process_frame(&plank(160.0, 2400));
        assert_eq!(reps_in(&events), 1);
    }

    #[test]
    fn test_status_changes_are_deduplicated() {
        let mut session = WorkoutSession::new(test_config());
        let first = session.process_frame(&PoseFrame::empty(0));
        let second = session.process_frame(&PoseFrame::empty(33));
        assert_eq!(
            first
                .iter()
                .filter(|e| matches!(e, SessionEvent::StatusChanged { .. }))
                .count(),
            1
        );
        assert!(second.is_empty());
    }

    #[test]
    fn test_snapshot_is_idempotent() {
        let mut session = locked_session(test_config());
        session.process_frame(&plank(95.0, 1000));
        assert_eq!(session.snapshot(), session.snapshot());
    }

    #[test]
    fn test_smoothed_angle_only_defined_once_locked() {
        let mut session = WorkoutSession::new(test_config());
        session.process_frame(&plank(160.0, 0));
        assert!(session.snapshot().smoothed_angle.is_none());

        let mut session = locked_session(test_config());
        session.process_frame(&plank(120.0, 1000));
        assert_eq!(session.snapshot().smoothed_angle, Some(120.0));
    }

    #[test]
    fn test_milestone_flag_on_every_nth_rep() {
        let config = EngineConfig {
            milestone_every: 2,
            ..test_config()
        };
        let mut session = locked_session(config);
        let mut milestones = Vec::new();
        for rep in 0u64..4 {
            let base = 1000 + rep * 1000;
            session.process_frame(&plank(95.0, base));
            for event in session.process_frame(&plank(160.0, base + 500)) {
                if let SessionEvent::RepCounted { count, milestone } = event {
                    milestones.push((count, milestone));
                }
            }
        }
        assert_eq!(
            milestones,
            vec![(1, false), (2, true), (3, false), (4, true)]
        );
    }

    #[test]
    fn test_finish_reports_frame_span_and_count() {
        let mut session = locked_session(test_config());
        session.process_frame(&plank(95.0, 1000));
        session.process_frame(&plank(160.0, 1500));
        let record = session.finish();
        assert_eq!(record.rep_count, 1);
        assert_eq!(record.active_ms, 1500);
        assert!(!record.id.is_empty());
        assert!(record.stopped_at >= record.started_at);
    }

    #[test]
    fn test_recovery_status_after_bad_posture() {
        let mut session = locked_session(test_config());
        session.process_frame(&tilted(160.0, 1000));
        let events = session.process_frame(&plank(160.0, 1033));
        assert!(events.contains(&SessionEvent::StatusChanged {
            status: SessionStatus::Counting { reps: 0 }
        }));
    }
}
