//! Notification dispatch
//!
//! The pipeline enqueues events with a non-blocking `try_send`; the
//! `Notifier` worker drains the queue and fans out to sinks. A full queue
//! drops the event and counts the drop; a failing sink is logged and
//! skipped. Nothing on this path can stall the frame loop.

use crate::domain::report::{epoch_ms, LogEntry, StatusSnapshot, HOURS_PER_DAY};
use crate::domain::types::{Classification, Direction, TrackId};
use crate::infra::metrics::Metrics;
use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

/// Discrete events forwarded to notification/log collaborators
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Notification {
    /// An identity crossed the counting line
    Crossing { direction: Direction, id: TrackId, ts: u64 },
    /// Aggregate counters changed
    CountUpdate {
        live_count: usize,
        entries: u32,
        exits: u32,
        hourly: [u32; HOURS_PER_DAY],
        ts: u64,
    },
    /// Sustained crowd presence held for the dwell threshold
    DwellAlert { count: usize, ts: u64 },
    /// Net entries reached the configured occupancy level
    ThresholdAlert { entries: u32, exits: u32, ts: u64 },
    /// Cooldown-admitted discrete detection
    Detection { count: usize, classification: Classification, ts: u64 },
}

impl Notification {
    pub fn kind(&self) -> &'static str {
        match self {
            Notification::Crossing { .. } => "crossing",
            Notification::CountUpdate { .. } => "count_update",
            Notification::DwellAlert { .. } => "dwell_alert",
            Notification::ThresholdAlert { .. } => "threshold_alert",
            Notification::Detection { .. } => "detection",
        }
    }
}

/// Sender handle for notifications
///
/// Clone to share across producers. Non-blocking: a full channel drops the
/// message and bumps the drop counter.
#[derive(Clone)]
pub struct NotifySender {
    tx: mpsc::Sender<Notification>,
    metrics: Arc<Metrics>,
}

impl NotifySender {
    fn send(&self, notification: Notification) {
        let kind = notification.kind();
        match self.tx.try_send(notification) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                self.metrics.record_notification_dropped();
                warn!(kind = %kind, "notification_dropped");
            }
            Err(TrySendError::Closed(_)) => {
                debug!(kind = %kind, "notifier_closed");
            }
        }
    }

    pub fn send_crossing(&self, id: TrackId, direction: Direction) {
        self.send(Notification::Crossing { direction, id, ts: epoch_ms() });
    }

    pub fn send_count_update(&self, snapshot: StatusSnapshot) {
        self.send(Notification::CountUpdate {
            live_count: snapshot.live_count,
            entries: snapshot.entries,
            exits: snapshot.exits,
            hourly: snapshot.hourly,
            ts: snapshot.timestamp,
        });
    }

    pub fn send_dwell_alert(&self, entry: &LogEntry) {
        self.send(Notification::DwellAlert { count: entry.count, ts: epoch_ms() });
    }

    pub fn send_threshold_alert(&self, entries: u32, exits: u32) {
        self.send(Notification::ThresholdAlert { entries, exits, ts: epoch_ms() });
    }

    pub fn send_detection(&self, entry: &LogEntry) {
        self.send(Notification::Detection {
            count: entry.count,
            classification: entry.classification,
            ts: epoch_ms(),
        });
    }
}

/// A delivery target for notifications
#[async_trait]
pub trait NotificationSink: Send + Sync {
    fn name(&self) -> &'static str;
    async fn deliver(&self, notification: &Notification) -> anyhow::Result<()>;
}

/// POSTs each event as JSON to a configured endpoint
pub struct WebhookSink {
    client: reqwest::Client,
    url: String,
}

impl WebhookSink {
    pub fn new(url: &str, timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client, url: url.to_string() })
    }
}

#[async_trait]
impl NotificationSink for WebhookSink {
    fn name(&self) -> &'static str {
        "webhook"
    }

    async fn deliver(&self, notification: &Notification) -> anyhow::Result<()> {
        let response = self.client.post(&self.url).json(notification).send().await?;
        response.error_for_status()?;
        Ok(())
    }
}

/// Writes each event to the structured log; always available
pub struct LogSink;

#[async_trait]
impl NotificationSink for LogSink {
    fn name(&self) -> &'static str {
        "log"
    }

    async fn deliver(&self, notification: &Notification) -> anyhow::Result<()> {
        let payload = serde_json::to_string(notification)?;
        info!(kind = %notification.kind(), payload = %payload, "notification");
        Ok(())
    }
}

/// Worker that drains the notification channel into the sinks
pub struct Notifier {
    rx: mpsc::Receiver<Notification>,
    sinks: Vec<Box<dyn NotificationSink>>,
}

impl Notifier {
    pub fn new(rx: mpsc::Receiver<Notification>, sinks: Vec<Box<dyn NotificationSink>>) -> Self {
        Self { rx, sinks }
    }

    pub async fn run(mut self, mut shutdown_rx: watch::Receiver<bool>) {
        loop {
            tokio::select! {
                notification = self.rx.recv() => {
                    match notification {
                        Some(n) => self.dispatch(&n).await,
                        None => break, // All senders gone
                    }
                }
                _ = shutdown_rx.changed() => {
                    if *shutdown_rx.borrow() {
                        break;
                    }
                }
            }
        }
        info!("notifier_stopped");
    }

    async fn dispatch(&self, notification: &Notification) {
        for sink in &self.sinks {
            if let Err(e) = sink.deliver(notification).await {
                // Sink failures never propagate into the processing loop
                warn!(
                    sink = %sink.name(),
                    kind = %notification.kind(),
                    error = %e,
                    "notification_failed"
                );
            }
        }
    }
}

/// Create a notification channel pair
pub fn create_notify_channel(
    capacity: usize,
    metrics: Arc<Metrics>,
) -> (NotifySender, mpsc::Receiver<Notification>) {
    let (tx, rx) = mpsc::channel(capacity);
    (NotifySender { tx, metrics }, rx)
}
