//! Frame processing pipeline
//!
//! The Pipeline is the single frame-order-preserving loop that coordinates:
//! - Identity maintenance (registry update per frame)
//! - Crossing detection (per-id history observation, count commits)
//! - Alert throttling (dwell and cooldown gates)
//! - Notification dispatch (fire-and-forget, never awaited per frame)
//!
//! One frame at a time, sequentially: the centroid histories only make sense
//! if frames arrive in order, so there is no parallel frame processing.


use crate::domain::report::local_hour;
use crate::domain::types::{Centroid, DetectionFrame, Direction};
use crate::infra::config::Config;
use crate::infra::metrics::Metrics;
use crate::io::notify::NotifySender;
use crate::services::crossing::{CrossingCounter, Observation};
use crate::services::registry::CentroidRegistry;
use crate::services::status::StatusBoard;
use smallvec::SmallVec;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

/// Central per-frame processor
pub struct Pipeline {
    /// Identity assignment across frames
    registry: CentroidRegistry,
    /// Per-id crossing state
    counter: CrossingCounter,
    /// Shared aggregate state (totals, ledger, throttles)
    board: Arc<StatusBoard>,
    /// Metrics collector
    metrics: Arc<Metrics>,
    /// Notification sender (None runs headless)
    notify: Option<NotifySender>,
    /// Application configuration
    config: Config,
    /// (entries, exits, live) last published, to gate count updates on change
    last_published: (u32, u32, usize),
}

impl Pipeline {
    pub fn new(
        config: Config,
        board: Arc<StatusBoard>,
        metrics: Arc<Metrics>,
        notify: Option<NotifySender>,
    ) -> Self {
        Self {
            registry: CentroidRegistry::new(config.max_disappeared(), config.max_distance()),
            counter: CrossingCounter::new(),
            board,
            metrics,
            notify,
            config,
            last_published: (0, 0, 0),
        }
    }

    /// Consume frames until the source is exhausted or shutdown is signalled
    pub async fn run(
        &mut self,
        mut frame_rx: mpsc::Receiver<DetectionFrame>,
        mut shutdown_rx: watch::Receiver<bool>,
    ) {
        loop {
            tokio::select! {
                frame = frame_rx.recv() => {
                    match frame {
                        Some(frame) => self.process_frame(frame),
                        None => {
                            info!("frame_source_exhausted");
                            break;
                        }
                    }
                }
                _ = shutdown_rx.changed() => {
                    if *shutdown_rx.borrow() {
                        info!("pipeline_shutdown");
                        break;
                    }
                }
            }
        }
    }

    /// Process a single frame: filter, track, count, throttle, publish
    pub fn process_frame(&mut self, frame: DetectionFrame) {
        let started = Instant::now();

        // Dimensions come from the frame source; zero means state corruption
        // upstream, not a bad detection
        assert!(frame.width > 0 && frame.height > 0, "frame dimensions must be positive");

        let centroids: SmallVec<[Centroid; 8]> = frame
            .detections
            .iter()
            .filter(|d| d.confidence > self.config.confidence_threshold())
            .filter(|d| d.label == self.config.person_label())
            .map(|d| d.bbox.centroid())
            .collect();

        let objects = self.registry.update(&centroids);
        let live_count = objects.len();

        let mut fresh_tracks = 0usize;
        for (&id, point) in objects.iter() {
            match self.counter.observe(id, point.centroid, frame.height) {
                Observation::New => fresh_tracks += 1,
                Observation::Tracked => {}
                Observation::Crossed(direction) => {
                    let (entries, exits) = self.board.record_crossing(direction);
                    self.metrics.record_crossing(direction);
                    info!(
                        id = %id,
                        direction = %direction.as_str(),
                        entries = %entries,
                        exits = %exits,
                        "crossing_counted"
                    );
                    if let Some(ref notify) = self.notify {
                        notify.send_crossing(id, direction);
                    }

                    if direction == Direction::In
                        && entries.saturating_sub(exits) >= self.config.entry_exit_threshold()
                    {
                        self.metrics.record_threshold_alert();
                        warn!(entries = %entries, exits = %exits, "occupancy_threshold_exceeded");
                        if let Some(ref notify) = self.notify {
                            notify.send_threshold_alert(entries, exits);
                        }
                    }
                }
            }
        }

        // Histories die with their ids; a re-registered person starts fresh
        let evicted = self.counter.retain(|id| objects.contains_key(id));
        if fresh_tracks > 0 {
            self.metrics.record_tracks_registered(fresh_tracks as u64);
        }
        if evicted > 0 {
            self.metrics.record_tracks_evicted(evicted as u64);
            debug!(evicted = %evicted, "histories_pruned");
        }

        let alerts = self.board.observe_frame(live_count, fresh_tracks, local_hour(), Instant::now());
        if let Some(entry) = alerts.dwell_alert {
            self.metrics.record_dwell_alert();
            info!(count = %entry.count, "crowd_dwell_alert");
            if let Some(ref notify) = self.notify {
                notify.send_dwell_alert(&entry);
            }
        }
        if let Some(entry) = alerts.detection {
            self.metrics.record_detection_log();
            debug!(
                count = %entry.count,
                classification = %entry.classification.as_str(),
                "detection_logged"
            );
            if let Some(ref notify) = self.notify {
                notify.send_detection(&entry);
            }
        }

        // Publish a count update only when consumers would see a change
        let (entries, exits) = self.board.totals();
        let published = (entries, exits, live_count);
        if published != self.last_published {
            self.last_published = published;
            if let Some(ref notify) = self.notify {
                notify.send_count_update(self.board.snapshot());
            }
        }

        let latency_us = started.elapsed().as_micros() as u64;
        self.metrics.record_frame(latency_us, frame.detections.len() as u64);
    }

    /// Current number of live tracks
    pub fn live_tracks(&self) -> usize {
        self.registry.len()
    }
}
