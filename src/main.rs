use std::path::PathBuf;

use anyhow::{Context, Result};
use log::{info, warn};
use tokio::io::{AsyncBufReadExt, BufReader};

use repcam::{ConfigStore, EngineConfig, FrameFeed, PoseFrame, SessionEvent};

/// Reads pose frames as JSON lines on stdin (one `PoseFrame` per line),
/// drives a counting session, and prints the final session record as
/// JSON on stdout. Pass a config file path as the first argument to
/// override the built-in thresholds.
#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    let config = match std::env::args().nth(1) {
        Some(path) => ConfigStore::new(PathBuf::from(path))?.engine(),
        None => EngineConfig::default(),
    };

    let mut feed = FrameFeed::new();
    let mut events = feed.start(config)?;

    let reporter = tokio::spawn(async move {
        let mut record = None;
        while let Some(event) = events.recv().await {
            match event {
                SessionEvent::StatusChanged { status } => info!("status: {status}"),
                SessionEvent::RepCounted { count, milestone } => {
                    info!("rep {count}{}", if milestone { " - milestone!" } else { "" })
                }
                SessionEvent::ReadinessChanged { locked } => {
                    info!(
                        "{}",
                        if locked {
                            "locked in, counting"
                        } else {
                            "waiting for position"
                        }
                    )
                }
                SessionEvent::Finished { record: r } => record = Some(r),
            }
        }
        record
    });

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<PoseFrame>(&line) {
            Ok(frame) => feed.push_frame(frame).await?,
            Err(err) => warn!("skipping malformed frame: {err}"),
        }
    }

    feed.stop().await?;

    let record = reporter
        .await
        .context("event reporter task failed")?
        .context("session ended without a final record")?;
    println!("{}", serde_json::to_string_pretty(&record)?);

    Ok(())
}
