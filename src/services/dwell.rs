//! Dwell debounce and cooldown throttling
//!
//! Two independent timing gates with different consumers. `DwellMonitor`
//! reports a sustained condition once per continuous occurrence, after a
//! minimum hold time. `Cooldown` enforces a minimum spacing between
//! emissions of a single event kind. Their trigger conditions differ, so
//! they stay separate state machines rather than one unified throttle.

use crate::domain::types::CROWD_MIN_COUNT;
use std::time::{Duration, Instant};

/// Phase of the dwell state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DwellPhase {
    /// Condition absent
    Idle,
    /// Condition holds, hold timer running, nothing reported yet
    Pending,
    /// Reported for this continuous occurrence; suppressed until reset
    Reported,
}

/// Debounces a sustained "crowd present" condition
pub struct DwellMonitor {
    phase: DwellPhase,
    pending_since: Option<Instant>,
    threshold: Duration,
}

impl DwellMonitor {
    pub fn new(threshold: Duration) -> Self {
        Self { phase: DwellPhase::Idle, pending_since: None, threshold }
    }

    /// Drive the state machine with this frame's live count
    ///
    /// Returns true exactly when the sustained condition should be reported:
    /// at most once per continuous interval with the condition held, and only
    /// after it has held for the full threshold. Any frame below the crowd
    /// minimum returns the machine to idle.
    pub fn observe(&mut self, live_count: usize, now: Instant) -> bool {
        if live_count < CROWD_MIN_COUNT {
            self.phase = DwellPhase::Idle;
            self.pending_since = None;
            return false;
        }

        match self.phase {
            DwellPhase::Idle => {
                self.phase = DwellPhase::Pending;
                self.pending_since = Some(now);
                false
            }
            DwellPhase::Pending => {
                let held = self
                    .pending_since
                    .map(|since| now.duration_since(since) >= self.threshold)
                    .unwrap_or(false);
                if held {
                    self.phase = DwellPhase::Reported;
                    true
                } else {
                    false
                }
            }
            DwellPhase::Reported => false,
        }
    }

    pub fn phase(&self) -> DwellPhase {
        self.phase
    }

    /// Return to idle, discarding the hold timer
    pub fn reset(&mut self) {
        self.phase = DwellPhase::Idle;
        self.pending_since = None;
    }
}

/// Minimum-interval gate for one event kind
pub struct Cooldown {
    min_interval: Duration,
    last_emit: Option<Instant>,
}

impl Cooldown {
    pub fn new(min_interval: Duration) -> Self {
        Self { min_interval, last_emit: None }
    }

    /// Admit the event and record the emission if the interval has elapsed
    pub fn try_emit(&mut self, now: Instant) -> bool {
        match self.last_emit {
            Some(last) if now.duration_since(last) < self.min_interval => false,
            _ => {
                self.last_emit = Some(now);
                true
            }
        }
    }

    /// Forget the previous emission
    pub fn reset(&mut self) {
        self.last_emit = None;
    }
}
