//! Lock-free metrics collection and periodic reporting
//!
//! Uses atomics for hot-path operations to avoid mutex contention.
//! All counter updates are lock-free; reporting swaps the windowed values
//! to get a consistent snapshot.
//!
//! NOTE: All atomics use Relaxed ordering intentionally—these are statistical
//! counters only. Do NOT use these atomics for coordination or logic decisions.

use crate::domain::types::Direction;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;
use tracing::info;

/// Update an atomic max value using compare-and-swap loop
#[inline]
fn update_atomic_max(atomic_max: &AtomicU64, new_value: u64) {
    let mut current_max = atomic_max.load(Ordering::Relaxed);
    while new_value > current_max {
        match atomic_max.compare_exchange_weak(
            current_max,
            new_value,
            Ordering::Relaxed,
            Ordering::Relaxed,
        ) {
            Ok(_) => break,
            Err(actual) => current_max = actual,
        }
    }
}

/// Lock-free metrics collector for the frame pipeline
pub struct Metrics {
    /// Total frames ever processed (monotonic)
    frames_total: AtomicU64,
    /// Frames since last report (reset on report)
    frames_since_report: AtomicU64,
    /// Total raw detections received (monotonic)
    detections_total: AtomicU64,
    /// Track ids handed out by the registry (monotonic)
    tracks_registered_total: AtomicU64,
    /// Track histories dropped after eviction (monotonic)
    tracks_evicted_total: AtomicU64,
    /// Downward crossings counted (monotonic)
    crossings_in_total: AtomicU64,
    /// Upward crossings counted (monotonic)
    crossings_out_total: AtomicU64,
    /// Dwell-debounced crowd alerts emitted (monotonic)
    dwell_alerts_total: AtomicU64,
    /// Occupancy threshold alerts emitted (monotonic)
    threshold_alerts_total: AtomicU64,
    /// Cooldown-admitted detection log entries (monotonic)
    detection_logs_total: AtomicU64,
    /// Notifications dropped because the channel was full (monotonic)
    notifications_dropped: AtomicU64,
    /// Sum of frame latencies in microseconds (reset on report)
    latency_sum_us: AtomicU64,
    /// Max frame latency in microseconds (reset on report)
    latency_max_us: AtomicU64,
    /// Last report time (only touched by the reporter)
    last_report: parking_lot::Mutex<Instant>,
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            frames_total: AtomicU64::new(0),
            frames_since_report: AtomicU64::new(0),
            detections_total: AtomicU64::new(0),
            tracks_registered_total: AtomicU64::new(0),
            tracks_evicted_total: AtomicU64::new(0),
            crossings_in_total: AtomicU64::new(0),
            crossings_out_total: AtomicU64::new(0),
            dwell_alerts_total: AtomicU64::new(0),
            threshold_alerts_total: AtomicU64::new(0),
            detection_logs_total: AtomicU64::new(0),
            notifications_dropped: AtomicU64::new(0),
            latency_sum_us: AtomicU64::new(0),
            latency_max_us: AtomicU64::new(0),
            last_report: parking_lot::Mutex::new(Instant::now()),
        }
    }

    /// Record one processed frame with its latency and raw detection count
    pub fn record_frame(&self, latency_us: u64, detections: u64) {
        self.frames_total.fetch_add(1, Ordering::Relaxed);
        self.frames_since_report.fetch_add(1, Ordering::Relaxed);
        self.detections_total.fetch_add(detections, Ordering::Relaxed);
        self.latency_sum_us.fetch_add(latency_us, Ordering::Relaxed);
        update_atomic_max(&self.latency_max_us, latency_us);
    }

    pub fn record_tracks_registered(&self, count: u64) {
        self.tracks_registered_total.fetch_add(count, Ordering::Relaxed);
    }

    pub fn record_tracks_evicted(&self, count: u64) {
        self.tracks_evicted_total.fetch_add(count, Ordering::Relaxed);
    }

    pub fn record_crossing(&self, direction: Direction) {
        match direction {
            Direction::In => self.crossings_in_total.fetch_add(1, Ordering::Relaxed),
            Direction::Out => self.crossings_out_total.fetch_add(1, Ordering::Relaxed),
        };
    }

    pub fn record_dwell_alert(&self) {
        self.dwell_alerts_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_threshold_alert(&self) {
        self.threshold_alerts_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_detection_log(&self) {
        self.detection_logs_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_notification_dropped(&self) {
        self.notifications_dropped.fetch_add(1, Ordering::Relaxed);
    }

    /// Produce a summary, resetting the windowed counters
    pub fn report(&self) -> MetricsSummary {
        let mut last_report = self.last_report.lock();
        let elapsed = last_report.elapsed();
        *last_report = Instant::now();
        drop(last_report);

        let frames = self.frames_since_report.swap(0, Ordering::Relaxed);
        let latency_sum = self.latency_sum_us.swap(0, Ordering::Relaxed);
        let latency_max = self.latency_max_us.swap(0, Ordering::Relaxed);

        let frames_per_sec = if elapsed.as_secs_f64() > 0.0 {
            frames as f64 / elapsed.as_secs_f64()
        } else {
            0.0
        };
        let avg_latency_us = if frames > 0 { latency_sum / frames } else { 0 };

        MetricsSummary {
            frames_total: self.frames_total.load(Ordering::Relaxed),
            frames_per_sec,
            avg_frame_latency_us: avg_latency_us,
            max_frame_latency_us: latency_max,
            detections_total: self.detections_total.load(Ordering::Relaxed),
            tracks_registered: self.tracks_registered_total.load(Ordering::Relaxed),
            tracks_evicted: self.tracks_evicted_total.load(Ordering::Relaxed),
            crossings_in: self.crossings_in_total.load(Ordering::Relaxed),
            crossings_out: self.crossings_out_total.load(Ordering::Relaxed),
            dwell_alerts: self.dwell_alerts_total.load(Ordering::Relaxed),
            threshold_alerts: self.threshold_alerts_total.load(Ordering::Relaxed),
            detection_logs: self.detection_logs_total.load(Ordering::Relaxed),
            notifications_dropped: self.notifications_dropped.load(Ordering::Relaxed),
        }
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot of metrics at report time
#[derive(Debug, Clone, Serialize)]
pub struct MetricsSummary {
    pub frames_total: u64,
    pub frames_per_sec: f64,
    pub avg_frame_latency_us: u64,
    pub max_frame_latency_us: u64,
    pub detections_total: u64,
    pub tracks_registered: u64,
    pub tracks_evicted: u64,
    pub crossings_in: u64,
    pub crossings_out: u64,
    pub dwell_alerts: u64,
    pub threshold_alerts: u64,
    pub detection_logs: u64,
    pub notifications_dropped: u64,
}

impl MetricsSummary {
    /// Emit the summary as a single structured log line
    pub fn log(&self) {
        info!(
            frames_total = %self.frames_total,
            frames_per_sec = %format!("{:.1}", self.frames_per_sec),
            avg_latency_us = %self.avg_frame_latency_us,
            max_latency_us = %self.max_frame_latency_us,
            tracks_registered = %self.tracks_registered,
            tracks_evicted = %self.tracks_evicted,
            crossings_in = %self.crossings_in,
            crossings_out = %self.crossings_out,
            dwell_alerts = %self.dwell_alerts,
            threshold_alerts = %self.threshold_alerts,
            notifications_dropped = %self.notifications_dropped,
            "metrics_report"
        );
    }
}
