//! Reporting artifacts: detection log entries, status snapshots, and the
//! crossing ledger backing the CSV export

use crate::domain::types::Classification;
use chrono::{Local, Timelike};
use serde::Serialize;
use std::time::{SystemTime, UNIX_EPOCH};

/// Number of slots in the hourly occupancy aggregate
pub const HOURS_PER_DAY: usize = 24;

/// Get current epoch milliseconds
#[inline]
pub fn epoch_ms() -> u64 {
    SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_millis() as u64
}

/// Wall-clock stamp for detection log entries (`YYYY-MM-DD HH:MM:SS`)
pub fn log_timestamp() -> String {
    Local::now().format("%Y-%m-%d %H:%M:%S").to_string()
}

/// Wall-clock stamp for ledger rows (`YYYY-MM-DD HH:MM`)
pub fn ledger_timestamp() -> String {
    Local::now().format("%Y-%m-%d %H:%M").to_string()
}

/// Local hour of day, indexes the hourly maxima array
#[inline]
pub fn local_hour() -> usize {
    Local::now().hour() as usize
}

/// One immutable detection log record
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogEntry {
    pub timestamp: String,
    pub count: usize,
    pub classification: Classification,
}

impl LogEntry {
    pub fn new(count: usize, classification: Classification) -> Self {
        Self { timestamp: log_timestamp(), count, classification }
    }
}

/// Copy-out view of the shared counter state for concurrent readers
#[derive(Debug, Clone, Serialize)]
pub struct StatusSnapshot {
    /// People currently tracked
    pub live_count: usize,
    /// Total downward ("in") crossings
    pub entries: u32,
    /// Total upward ("out") crossings
    pub exits: u32,
    /// Maximum live count observed per local hour of day
    pub hourly: [u32; HOURS_PER_DAY],
    /// Recent detection log, newest first
    pub history: Vec<LogEntry>,
    /// Snapshot time (epoch ms)
    pub timestamp: u64,
}

/// Four parallel columns backing the counting CSV export
///
/// Columns grow independently: `move_in`/`in_time` on entries,
/// `move_out`/`out_time` on exits. Rows are only aligned at export time.
#[derive(Debug, Clone, Default)]
pub struct CrossingLog {
    pub move_in: Vec<u32>,
    pub in_time: Vec<String>,
    pub move_out: Vec<u32>,
    pub out_time: Vec<String>,
}

impl CrossingLog {
    /// Record an entry crossing with its running ordinal
    pub fn push_entry(&mut self, ordinal: u32, at: String) {
        self.move_in.push(ordinal);
        self.in_time.push(at);
    }

    /// Record an exit crossing with its running ordinal
    pub fn push_exit(&mut self, ordinal: u32, at: String) {
        self.move_out.push(ordinal);
        self.out_time.push(at);
    }

    pub fn is_empty(&self) -> bool {
        self.move_in.is_empty() && self.move_out.is_empty()
    }

    /// Length of the longest column - the export row count
    pub fn longest(&self) -> usize {
        self.move_in.len().max(self.move_out.len())
    }
}
