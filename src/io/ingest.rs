//! Detection stream ingest
//!
//! Reads newline-delimited JSON `DetectionFrame` records from a file or
//! stdin and forwards them to the pipeline channel in arrival order.
//! Malformed lines are logged and skipped; end of stream closes the channel,
//! which ends the pipeline. The source handle is released when this task
//! returns, on success or error.

use crate::domain::types::DetectionFrame;
use anyhow::Context;
use std::path::PathBuf;
use tokio::fs::File;
use tokio::io::{AsyncBufRead, BufReader};
use tokio::io::AsyncBufReadExt;
use tokio::sync::{mpsc, watch};
use tracing::{info, warn};

/// Run the ingest task until the stream ends or shutdown is signalled
pub async fn run_ingest(
    path: Option<PathBuf>,
    tx: mpsc::Sender<DetectionFrame>,
    shutdown_rx: watch::Receiver<bool>,
) -> anyhow::Result<()> {
    match path {
        Some(path) => {
            let file = File::open(&path)
                .await
                .with_context(|| format!("Failed to open detection stream {}", path.display()))?;
            info!(path = %path.display(), "ingest_started");
            read_frames(BufReader::new(file), tx, shutdown_rx).await;
        }
        None => {
            info!("ingest_started_stdin");
            read_frames(BufReader::new(tokio::io::stdin()), tx, shutdown_rx).await;
        }
    }
    Ok(())
}

/// Parse frames line by line and forward them with backpressure
async fn read_frames<R>(
    reader: R,
    tx: mpsc::Sender<DetectionFrame>,
    mut shutdown_rx: watch::Receiver<bool>,
) where
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();
    let mut forwarded = 0u64;
    let mut skipped = 0u64;

    loop {
        tokio::select! {
            line = lines.next_line() => {
                match line {
                    Ok(Some(line)) => {
                        let line = line.trim();
                        if line.is_empty() {
                            continue;
                        }
                        match serde_json::from_str::<DetectionFrame>(line) {
                            Ok(frame) => {
                                // Backpressure: wait for the pipeline rather than drop frames
                                if tx.send(frame).await.is_err() {
                                    info!("pipeline_gone");
                                    return;
                                }
                                forwarded += 1;
                            }
                            Err(e) => {
                                // Transient input error: skip the line, keep the stream
                                skipped += 1;
                                warn!(error = %e, "frame_parse_failed");
                            }
                        }
                    }
                    Ok(None) => {
                        info!(forwarded = %forwarded, skipped = %skipped, "ingest_exhausted");
                        return;
                    }
                    Err(e) => {
                        warn!(error = %e, "ingest_read_error");
                        return;
                    }
                }
            }
            _ = shutdown_rx.changed() => {
                if *shutdown_rx.borrow() {
                    info!(forwarded = %forwarded, "ingest_shutdown");
                    return;
                }
            }
        }
    }
}
