//! Shared counter state and its synchronized accessor
//!
//! Single source of truth for everything the pipeline derives: entry/exit
//! totals, the crossing ledger, the bounded detection log, the hourly
//! occupancy maxima, and the dwell/cooldown throttles. The pipeline is the
//! only writer. Readers take copy-out snapshots so the lock is never held
//! across serialization or IO.

use crate::domain::report::{epoch_ms, ledger_timestamp, CrossingLog, LogEntry, StatusSnapshot, HOURS_PER_DAY};
use crate::domain::types::{Classification, Direction};
use crate::services::dwell::{Cooldown, DwellMonitor};
#[cfg(test)]
use crate::services::dwell::DwellPhase;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::time::{Duration, Instant};

struct BoardState {
    entries: u32,
    exits: u32,
    live_count: usize,
    ledger: CrossingLog,
    hourly: [u32; HOURS_PER_DAY],
    /// Detection log, newest first, bounded by `history_capacity`
    history: VecDeque<LogEntry>,
    dwell: DwellMonitor,
    detection_cooldown: Cooldown,
}

/// Throttle outcomes for one frame
#[derive(Debug, Default)]
pub struct FrameAlerts {
    /// Sustained crowd presence crossed the dwell threshold this frame
    pub dwell_alert: Option<LogEntry>,
    /// Cooldown-admitted detection log entry for newly seen people
    pub detection: Option<LogEntry>,
}

/// Synchronized aggregate state shared between the pipeline and readers
pub struct StatusBoard {
    inner: Mutex<BoardState>,
    history_capacity: usize,
}

impl StatusBoard {
    pub fn new(dwell_threshold: Duration, cooldown: Duration, history_capacity: usize) -> Self {
        Self {
            inner: Mutex::new(BoardState {
                entries: 0,
                exits: 0,
                live_count: 0,
                ledger: CrossingLog::default(),
                hourly: [0; HOURS_PER_DAY],
                history: VecDeque::with_capacity(history_capacity),
                dwell: DwellMonitor::new(dwell_threshold),
                detection_cooldown: Cooldown::new(cooldown),
            }),
            history_capacity,
        }
    }

    /// Record a committed crossing; returns the updated (entries, exits)
    pub fn record_crossing(&self, direction: Direction) -> (u32, u32) {
        let at = ledger_timestamp();
        let mut state = self.inner.lock();
        match direction {
            Direction::In => {
                state.entries += 1;
                let ordinal = state.entries;
                state.ledger.push_entry(ordinal, at);
            }
            Direction::Out => {
                state.exits += 1;
                let ordinal = state.exits;
                state.ledger.push_exit(ordinal, at);
            }
        }
        (state.entries, state.exits)
    }

    /// Evaluate the dwell and cooldown gates for one frame
    ///
    /// `fresh_tracks` is how many ids were seen for the first time this
    /// frame; a positive value is a discrete "new detection" event for the
    /// cooldown path. `hour` indexes the hourly maxima. Both alert paths
    /// update the hourly maximum for their qualifying events.
    pub fn observe_frame(
        &self,
        live_count: usize,
        fresh_tracks: usize,
        hour: usize,
        now: Instant,
    ) -> FrameAlerts {
        let mut state = self.inner.lock();
        state.live_count = live_count;
        let mut alerts = FrameAlerts::default();

        if state.dwell.observe(live_count, now) {
            let entry = LogEntry::new(live_count, Classification::Crowd);
            state.hourly[hour] = state.hourly[hour].max(live_count as u32);
            push_history(&mut state, entry.clone(), self.history_capacity);
            alerts.dwell_alert = Some(entry);
        }

        if fresh_tracks > 0 && state.detection_cooldown.try_emit(now) {
            let entry = LogEntry::new(live_count, Classification::from_count(live_count));
            state.hourly[hour] = state.hourly[hour].max(live_count as u32);
            push_history(&mut state, entry.clone(), self.history_capacity);
            alerts.detection = Some(entry);
        }

        alerts
    }

    /// Copy-out view for readers; the lock is released before the caller
    /// serializes anything
    pub fn snapshot(&self) -> StatusSnapshot {
        let state = self.inner.lock();
        StatusSnapshot {
            live_count: state.live_count,
            entries: state.entries,
            exits: state.exits,
            hourly: state.hourly,
            history: state.history.iter().cloned().collect(),
            timestamp: epoch_ms(),
        }
    }

    /// Clone of the CSV ledger columns
    pub fn crossing_log(&self) -> CrossingLog {
        self.inner.lock().ledger.clone()
    }

    /// Current (entries, exits)
    pub fn totals(&self) -> (u32, u32) {
        let state = self.inner.lock();
        (state.entries, state.exits)
    }

    /// Clear the detection log, hourly maxima, and throttle state
    ///
    /// Crossing totals and the ledger survive. Idempotent.
    pub fn reset(&self) {
        let mut state = self.inner.lock();
        state.history.clear();
        state.hourly = [0; HOURS_PER_DAY];
        state.dwell.reset();
        state.detection_cooldown.reset();
    }

    #[cfg(test)]
    pub fn dwell_phase(&self) -> DwellPhase {
        self.inner.lock().dwell.phase()
    }
}

/// Newest entries sit at the front; the oldest fall off the back
fn push_history(state: &mut BoardState, entry: LogEntry, capacity: usize) {
    state.history.push_front(entry);
    state.history.truncate(capacity);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn board() -> StatusBoard {
        StatusBoard::new(Duration::from_secs(3), Duration::from_secs(5), 100)
    }

    #[test]
    fn test_record_crossings_updates_totals_and_ledger() {
        let board = board();
        assert_eq!(board.record_crossing(Direction::In), (1, 0));
        assert_eq!(board.record_crossing(Direction::In), (2, 0));
        assert_eq!(board.record_crossing(Direction::Out), (2, 1));

        let ledger = board.crossing_log();
        assert_eq!(ledger.move_in, vec![1, 2]);
        assert_eq!(ledger.move_out, vec![1]);
        assert_eq!(ledger.in_time.len(), 2);
    }

    #[test]
    fn test_dwell_alert_records_crowd_entry_and_hourly_max() {
        let board = board();
        let start = Instant::now();

        assert!(board.observe_frame(3, 0, 14, start).dwell_alert.is_none());
        let alerts = board.observe_frame(3, 0, 14, start + Duration::from_secs(3));
        let entry = alerts.dwell_alert.expect("dwell alert after threshold");
        assert_eq!(entry.classification, Classification::Crowd);
        assert_eq!(entry.count, 3);

        let snapshot = board.snapshot();
        assert_eq!(snapshot.hourly[14], 3);
        assert_eq!(snapshot.history.len(), 1);
    }

    #[test]
    fn test_detection_path_is_cooldown_gated() {
        let board = board();
        let start = Instant::now();

        let first = board.observe_frame(1, 1, 9, start);
        assert!(first.detection.is_some());
        assert_eq!(first.detection.unwrap().classification, Classification::Normal);

        // Another fresh track inside the cooldown window is suppressed
        let second = board.observe_frame(1, 1, 9, start + Duration::from_secs(2));
        assert!(second.detection.is_none());

        // Admitted again once the window elapses
        let third = board.observe_frame(2, 1, 9, start + Duration::from_secs(5));
        assert!(third.detection.is_some());
    }

    #[test]
    fn test_no_detection_log_without_fresh_tracks() {
        let board = board();
        let alerts = board.observe_frame(1, 0, 0, Instant::now());
        assert!(alerts.detection.is_none());
    }

    #[test]
    fn test_history_is_bounded_oldest_dropped() {
        let board = StatusBoard::new(Duration::from_secs(0), Duration::from_secs(0), 3);
        let start = Instant::now();

        for i in 0..5u64 {
            board.observe_frame(1, 1, 0, start + Duration::from_secs(i * 10));
        }

        let snapshot = board.snapshot();
        assert_eq!(snapshot.history.len(), 3);
    }

    #[test]
    fn test_snapshot_is_copy_out() {
        let board = board();
        board.record_crossing(Direction::In);
        let snapshot = board.snapshot();

        board.record_crossing(Direction::In);
        // The earlier snapshot is unaffected by later writes
        assert_eq!(snapshot.entries, 1);
        assert_eq!(board.snapshot().entries, 2);
    }

    #[test]
    fn test_reset_clears_log_hourly_and_throttles() {
        let board = StatusBoard::new(Duration::from_secs(0), Duration::from_secs(5), 100);
        let start = Instant::now();

        board.record_crossing(Direction::In);
        board.observe_frame(2, 1, 6, start);
        board.observe_frame(2, 0, 6, start + Duration::from_secs(1));
        assert_eq!(board.dwell_phase(), DwellPhase::Reported);

        board.reset();

        let snapshot = board.snapshot();
        assert_eq!(snapshot.hourly, [0; HOURS_PER_DAY]);
        assert!(snapshot.history.is_empty());
        assert_eq!(board.dwell_phase(), DwellPhase::Idle);
        // Crossing totals survive a log reset
        assert_eq!(snapshot.entries, 1);

        // Idempotent
        board.reset();
        assert!(board.snapshot().history.is_empty());
    }
}
