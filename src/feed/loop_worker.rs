use log::{info, warn};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::pose::PoseFrame;
use crate::session::{SessionEvent, WorkoutSession};

/// Drain the frame channel into the session until the feeder hangs up
/// or the session is cancelled, then emit the final record.
///
/// All engine mutation happens on this one task; the host only ever
/// talks to it through the channels.
pub async fn session_loop(
    mut session: WorkoutSession,
    mut frames: mpsc::Receiver<PoseFrame>,
    events: mpsc::Sender<SessionEvent>,
    cancel_token: CancellationToken,
) {
    let mut last_timestamp_ms: Option<u64> = None;

    loop {
        tokio::select! {
            // Drain frames already buffered in the channel before
            // honoring a stop, so no delivered frame is silently lost.
            biased;
            maybe_frame = frames.recv() => {
                let Some(frame) = maybe_frame else {
                    info!("session {}: frame feed closed", session.id());
                    break;
                };

                // Out-of-order delivery is a caller contract violation;
                // flag it but process the frame as-is.
                if let Some(last) = last_timestamp_ms {
                    if frame.timestamp_ms < last {
                        warn!(
                            "session {}: frame timestamp went backwards ({} < {})",
                            session.id(),
                            frame.timestamp_ms,
                            last
                        );
                    }
                }
                last_timestamp_ms = Some(frame.timestamp_ms);

                for event in session.process_frame(&frame) {
                    if events.send(event).await.is_err() {
                        warn!("session {}: event receiver dropped", session.id());
                        return;
                    }
                }
            }
            _ = cancel_token.cancelled() => {
                info!("session {}: stop requested", session.id());
                break;
            }
        }
    }

    let record = session.finish();
    if events
        .send(SessionEvent::Finished { record })
        .await
        .is_err()
    {
        warn!("final session record had no receiver");
    }
}
