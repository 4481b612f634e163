//! Footfall - people counting core
//!
//! Turns an external person detector's per-frame bounding boxes into durable
//! track identities, directional entry/exit counts, and throttled alerts.
//!
//! Module structure:
//! - `domain/` - Core types (boxes, centroids, ids, reports)
//! - `io/` - External interfaces (detection ingest, notification sinks, CSV)
//! - `services/` - Counting logic (registry, crossings, throttles, pipeline)
//! - `infra/` - Infrastructure (config, metrics)

use clap::Parser;
use footfall::infra::{Config, Metrics};
use footfall::io::{
    create_notify_channel, run_ingest, CountLogWriter, LogSink, NotificationSink, Notifier,
    WebhookSink,
};
use footfall::services::{Pipeline, StatusBoard};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tracing::{error, info};
use tracing_subscriber::fmt::time::UtcTime;
use tracing_subscriber::EnvFilter;

/// Footfall - people counting and crowd alerting service
#[derive(Parser, Debug)]
#[command(name = "footfall", version, about)]
struct Args {
    /// Path to TOML configuration file
    #[arg(short, long, default_value = "config/dev.toml")]
    config: String,
    /// Detection stream (JSONL, one frame per line); stdin when omitted
    #[arg(short, long)]
    input: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize structured logging with configurable level via RUST_LOG env var
    // Default: INFO, use RUST_LOG=debug for full event visibility
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_timer(UtcTime::rfc_3339())
        .with_target(false)
        .init();

    info!(git_hash = env!("GIT_HASH"), "footfall starting");

    let args = Args::parse();

    // Configuration errors are fatal: no partial operation on a bad config
    let config = Config::from_file(&args.config)?;
    info!(
        config_file = %config.config_file(),
        confidence_threshold = %config.confidence_threshold(),
        skip_frames = %config.skip_frames(),
        max_disappeared = %config.max_disappeared(),
        max_distance = %config.max_distance(),
        dwell_threshold_secs = %config.dwell_threshold_secs(),
        cooldown_secs = %config.cooldown_secs(),
        entry_exit_threshold = %config.entry_exit_threshold(),
        webhook = %config.webhook_url().unwrap_or("disabled"),
        "config_loaded"
    );

    // Create shutdown signal
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    // Create shared components
    let metrics = Arc::new(Metrics::new());
    let board = Arc::new(StatusBoard::new(
        Duration::from_secs(config.dwell_threshold_secs()),
        Duration::from_secs(config.cooldown_secs()),
        config.history_capacity(),
    ));

    // Notification sinks: structured log always, webhook when configured
    let mut sinks: Vec<Box<dyn NotificationSink>> = vec![Box::new(LogSink)];
    if let Some(url) = config.webhook_url() {
        let timeout = Duration::from_millis(config.webhook_timeout_ms());
        sinks.push(Box::new(WebhookSink::new(url, timeout)?));
    }

    // Start the notification worker (fire-and-forget dispatch)
    let (notify_tx, notify_rx) = create_notify_channel(config.notify_channel_capacity(), metrics.clone());
    let notifier = Notifier::new(notify_rx, sinks);
    let notifier_shutdown = shutdown_rx.clone();
    tokio::spawn(async move {
        notifier.run(notifier_shutdown).await;
    });

    // Start detection ingest (bounded channel for backpressure)
    let (frame_tx, frame_rx) = mpsc::channel(config.frame_channel_capacity());
    let ingest_shutdown = shutdown_rx.clone();
    let input = args.input.clone();
    tokio::spawn(async move {
        if let Err(e) = run_ingest(input, frame_tx, ingest_shutdown).await {
            error!(error = %e, "ingest error");
        }
    });

    // Start metrics reporter
    let metrics_clone = metrics.clone();
    let metrics_interval = config.metrics_interval_secs();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(std::time::Duration::from_secs(metrics_interval));
        loop {
            interval.tick().await;
            metrics_clone.report().log();
        }
    });

    // Handle shutdown on Ctrl+C
    let shutdown_signal = shutdown_tx;
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        info!("shutdown_signal_received");
        let _ = shutdown_signal.send(true);
    });

    // Run the pipeline - consumes frames until the source is exhausted
    let mut pipeline = Pipeline::new(config.clone(), board.clone(), metrics.clone(), Some(notify_tx));
    info!("pipeline_started");
    pipeline.run(frame_rx, shutdown_rx).await;

    // Export the crossing ledger on the way out
    let writer = CountLogWriter::new(config.count_log_file());
    writer.write(&board.crossing_log());

    let snapshot = board.snapshot();
    info!(
        entries = %snapshot.entries,
        exits = %snapshot.exits,
        live_count = %snapshot.live_count,
        "footfall shutdown complete"
    );
    Ok(())
}
