use anyhow::{bail, Context, Result};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::engine::EngineConfig;
use crate::pose::PoseFrame;
use crate::session::{SessionEvent, WorkoutSession};

use super::loop_worker::session_loop;

const FRAME_CHANNEL_CAPACITY: usize = 32;
const EVENT_CHANNEL_CAPACITY: usize = 32;

/// Host-side handle for one counting session. Owns the single task the
/// engine runs on; frames go in over a channel, events come back over
/// another, and `stop` finalizes the session.
pub struct FrameFeed {
    handle: Option<JoinHandle<()>>,
    cancel_token: Option<CancellationToken>,
    frame_tx: Option<mpsc::Sender<PoseFrame>>,
}

impl FrameFeed {
    pub fn new() -> Self {
        Self {
            handle: None,
            cancel_token: None,
            frame_tx: None,
        }
    }

    /// Spawn a fresh session and return its event stream. The stream
    /// ends with a `Finished` event carrying the session record.
    pub fn start(&mut self, config: EngineConfig) -> Result<mpsc::Receiver<SessionEvent>> {
        if self.handle.is_some() {
            bail!("session already active");
        }

        let (frame_tx, frame_rx) = mpsc::channel(FRAME_CHANNEL_CAPACITY);
        let (event_tx, event_rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        let cancel_token = CancellationToken::new();

        let session = WorkoutSession::new(config);
        let handle = tokio::spawn(session_loop(
            session,
            frame_rx,
            event_tx,
            cancel_token.clone(),
        ));

        self.handle = Some(handle);
        self.cancel_token = Some(cancel_token);
        self.frame_tx = Some(frame_tx);
        Ok(event_rx)
    }

    /// Deliver one pose-model result to the running session.
    pub async fn push_frame(&self, frame: PoseFrame) -> Result<()> {
        let tx = self
            .frame_tx
            .as_ref()
            .context("no active session to feed")?;
        tx.send(frame)
            .await
            .map_err(|_| anyhow::anyhow!("session loop is gone"))
    }

    /// Stop the session. The loop emits `Finished` on the event stream
    /// before exiting.
    pub async fn stop(&mut self) -> Result<()> {
        self.frame_tx.take();
        if let Some(token) = self.cancel_token.take() {
            token.cancel();
        }

        if let Some(handle) = self.handle.take() {
            handle.await.context("session loop task failed to join")?;
        }
        Ok(())
    }
}

impl Default for FrameFeed {
    fn default() -> Self {
        Self::new()
    }
}
