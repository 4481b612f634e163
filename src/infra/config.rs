//! Configuration loading from TOML files
//!
//! Every recognized option is enumerated here with its default. Invalid or
//! missing numeric settings are a startup error: the process refuses to run
//! on a bad config rather than operating partially.

use anyhow::{bail, Context};
use serde::Deserialize;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DetectorSection {
    /// Minimum detector confidence for a box to be considered
    pub confidence_threshold: f32,
    /// Detector cadence hint for the upstream caller (run every N frames)
    pub skip_frames: u32,
    /// Class label accepted by the counting core
    pub person_label: String,
}

impl Default for DetectorSection {
    fn default() -> Self {
        Self { confidence_threshold: 0.4, skip_frames: 30, person_label: "person".to_string() }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TrackerSection {
    /// Consecutive unmatched frames before an object is evicted
    pub max_disappeared: u32,
    /// Maximum centroid distance (pixels) for a match to be applied
    pub max_distance: f32,
}

impl Default for TrackerSection {
    fn default() -> Self {
        Self { max_disappeared: 40, max_distance: 50.0 }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AlertsSection {
    /// Continuous crowd presence required before the dwell alert fires
    pub dwell_threshold_secs: u64,
    /// Minimum spacing between detection log emissions
    pub cooldown_secs: u64,
    /// `entries - exits` level that triggers the occupancy alert
    pub entry_exit_threshold: u32,
}

impl Default for AlertsSection {
    fn default() -> Self {
        Self { dwell_threshold_secs: 3, cooldown_secs: 5, entry_exit_threshold: 10 }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct IngestSection {
    /// Bound of the frame channel between ingest and the pipeline
    pub frame_channel_capacity: usize,
}

impl Default for IngestSection {
    fn default() -> Self {
        Self { frame_channel_capacity: 64 }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct NotifySection {
    /// Webhook endpoint for outbound alerts (disabled when absent)
    pub webhook_url: Option<String>,
    /// Webhook request timeout
    pub webhook_timeout_ms: Option<u64>,
    /// Bound of the notification channel; full channel drops, never blocks
    pub channel_capacity: Option<usize>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ReportSection {
    /// Crossing ledger CSV output path
    pub count_log_file: String,
    /// Detection log entries retained (oldest dropped beyond this)
    pub history_capacity: usize,
    /// Interval for the periodic metrics summary line
    pub metrics_interval_secs: u64,
}

impl Default for ReportSection {
    fn default() -> Self {
        Self {
            count_log_file: "data/counting_data.csv".to_string(),
            history_capacity: 100,
            metrics_interval_secs: 10,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct TomlConfig {
    #[serde(default)]
    pub detector: DetectorSection,
    #[serde(default)]
    pub tracker: TrackerSection,
    #[serde(default)]
    pub alerts: AlertsSection,
    #[serde(default)]
    pub ingest: IngestSection,
    #[serde(default)]
    pub notify: NotifySection,
    #[serde(default)]
    pub report: ReportSection,
}

/// Main configuration struct used throughout the application
#[derive(Debug, Clone)]
pub struct Config {
    confidence_threshold: f32,
    skip_frames: u32,
    person_label: String,
    max_disappeared: u32,
    max_distance: f32,
    dwell_threshold_secs: u64,
    cooldown_secs: u64,
    entry_exit_threshold: u32,
    frame_channel_capacity: usize,
    webhook_url: Option<String>,
    webhook_timeout_ms: u64,
    notify_channel_capacity: usize,
    count_log_file: String,
    history_capacity: usize,
    metrics_interval_secs: u64,
    config_file: String,
}

impl Default for Config {
    fn default() -> Self {
        Self::from_toml(TomlConfig::default(), "default")
    }
}

impl Config {
    fn from_toml(toml_config: TomlConfig, origin: &str) -> Self {
        Self {
            confidence_threshold: toml_config.detector.confidence_threshold,
            skip_frames: toml_config.detector.skip_frames,
            person_label: toml_config.detector.person_label,
            max_disappeared: toml_config.tracker.max_disappeared,
            max_distance: toml_config.tracker.max_distance,
            dwell_threshold_secs: toml_config.alerts.dwell_threshold_secs,
            cooldown_secs: toml_config.alerts.cooldown_secs,
            entry_exit_threshold: toml_config.alerts.entry_exit_threshold,
            frame_channel_capacity: toml_config.ingest.frame_channel_capacity,
            webhook_url: toml_config.notify.webhook_url,
            webhook_timeout_ms: toml_config.notify.webhook_timeout_ms.unwrap_or(2000),
            notify_channel_capacity: toml_config.notify.channel_capacity.unwrap_or(256),
            count_log_file: toml_config.report.count_log_file,
            history_capacity: toml_config.report.history_capacity,
            metrics_interval_secs: toml_config.report.metrics_interval_secs,
            config_file: origin.to_string(),
        }
    }

    /// Load configuration from a TOML file
    ///
    /// A missing file, a parse failure, or an out-of-range value all fail
    /// here - there is no fallback to defaults for an explicit config.
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;

        let toml_config: TomlConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;

        let config = Self::from_toml(toml_config, &path.display().to_string());
        config.validate()?;
        Ok(config)
    }

    /// Validate thresholds; called at startup, never per frame
    pub fn validate(&self) -> anyhow::Result<()> {
        if !(self.confidence_threshold > 0.0 && self.confidence_threshold < 1.0) {
            bail!(
                "detector.confidence_threshold must be in (0, 1), got {}",
                self.confidence_threshold
            );
        }
        if self.skip_frames == 0 {
            bail!("detector.skip_frames must be at least 1");
        }
        if self.person_label.is_empty() {
            bail!("detector.person_label must not be empty");
        }
        if self.max_disappeared == 0 {
            bail!("tracker.max_disappeared must be a positive integer");
        }
        if !(self.max_distance > 0.0 && self.max_distance.is_finite()) {
            bail!("tracker.max_distance must be positive, got {}", self.max_distance);
        }
        if self.entry_exit_threshold == 0 {
            bail!("alerts.entry_exit_threshold must be a positive integer");
        }
        if self.frame_channel_capacity == 0 {
            bail!("ingest.frame_channel_capacity must be at least 1");
        }
        if self.notify_channel_capacity == 0 {
            bail!("notify.channel_capacity must be at least 1");
        }
        if self.webhook_timeout_ms == 0 {
            bail!("notify.webhook_timeout_ms must be at least 1");
        }
        if self.history_capacity == 0 {
            bail!("report.history_capacity must be at least 1");
        }
        if self.metrics_interval_secs == 0 {
            bail!("report.metrics_interval_secs must be at least 1");
        }
        Ok(())
    }

    // Getters for all config fields
    pub fn confidence_threshold(&self) -> f32 {
        self.confidence_threshold
    }

    pub fn skip_frames(&self) -> u32 {
        self.skip_frames
    }

    pub fn person_label(&self) -> &str {
        &self.person_label
    }

    pub fn max_disappeared(&self) -> u32 {
        self.max_disappeared
    }

    pub fn max_distance(&self) -> f32 {
        self.max_distance
    }

    pub fn dwell_threshold_secs(&self) -> u64 {
        self.dwell_threshold_secs
    }

    pub fn cooldown_secs(&self) -> u64 {
        self.cooldown_secs
    }

    pub fn entry_exit_threshold(&self) -> u32 {
        self.entry_exit_threshold
    }

    pub fn frame_channel_capacity(&self) -> usize {
        self.frame_channel_capacity
    }

    pub fn webhook_url(&self) -> Option<&str> {
        self.webhook_url.as_deref()
    }

    pub fn webhook_timeout_ms(&self) -> u64 {
        self.webhook_timeout_ms
    }

    pub fn notify_channel_capacity(&self) -> usize {
        self.notify_channel_capacity
    }

    pub fn count_log_file(&self) -> &str {
        &self.count_log_file
    }

    pub fn history_capacity(&self) -> usize {
        self.history_capacity
    }

    pub fn metrics_interval_secs(&self) -> u64 {
        self.metrics_interval_secs
    }

    pub fn config_file(&self) -> &str {
        &self.config_file
    }

    /// Builder method for tests to set max_disappeared
    #[cfg(test)]
    pub fn with_max_disappeared(mut self, frames: u32) -> Self {
        self.max_disappeared = frames;
        self
    }

    /// Builder method for tests to set max_distance
    #[cfg(test)]
    pub fn with_max_distance(mut self, distance: f32) -> Self {
        self.max_distance = distance;
        self
    }

    /// Builder method for tests to set dwell_threshold_secs
    #[cfg(test)]
    pub fn with_dwell_threshold_secs(mut self, secs: u64) -> Self {
        self.dwell_threshold_secs = secs;
        self
    }

    /// Builder method for tests to set cooldown_secs
    #[cfg(test)]
    pub fn with_cooldown_secs(mut self, secs: u64) -> Self {
        self.cooldown_secs = secs;
        self
    }

    /// Builder method for tests to set entry_exit_threshold
    #[cfg(test)]
    pub fn with_entry_exit_threshold(mut self, threshold: u32) -> Self {
        self.entry_exit_threshold = threshold;
        self
    }

    /// Builder method for tests to set confidence_threshold
    #[cfg(test)]
    pub fn with_confidence_threshold(mut self, threshold: f32) -> Self {
        self.confidence_threshold = threshold;
        self
    }
}
