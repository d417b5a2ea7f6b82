//! Debounce timer as an explicit state machine.
//!
//! DESIGN
//! ======
//! The debouncer never sleeps or spawns; it only computes deadlines. The
//! owning actor sleeps until `deadline()` and then calls `poll_fire`. A burst
//! of `schedule` calls keeps pushing the deadline out by `quiet`, but never
//! past `first + max_wait`, so continuous edits still fire at a bounded
//! cadence.

#[cfg(test)]
#[path = "debounce_test.rs"]
mod debounce_test;

use std::time::Duration;

use tokio::time::Instant;

/// Quiet delay and upper bound for one domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DebounceTiming {
    pub quiet: Duration,
    pub max_wait: Duration,
}

impl DebounceTiming {
    pub const SCENE: Self = Self::from_millis(10, 50);
    pub const EDITOR: Self = Self::from_millis(10, 50);
    pub const CAMERA: Self = Self::from_millis(100, 200);

    #[must_use]
    pub const fn from_millis(quiet_ms: u64, max_wait_ms: u64) -> Self {
        Self { quiet: Duration::from_millis(quiet_ms), max_wait: Duration::from_millis(max_wait_ms) }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DebounceState {
    Idle,
    Pending { first: Instant, deadline: Instant },
}

#[derive(Debug, Clone)]
pub struct Debouncer {
    timing: DebounceTiming,
    state: DebounceState,
}

impl Debouncer {
    #[must_use]
    pub fn new(timing: DebounceTiming) -> Self {
        Self { timing, state: DebounceState::Idle }
    }

    #[must_use]
    pub fn timing(&self) -> DebounceTiming {
        self.timing
    }

    /// Record an event at `now` and move the deadline.
    pub fn schedule(&mut self, now: Instant) {
        let first = match self.state {
            DebounceState::Idle => now,
            DebounceState::Pending { first, .. } => first,
        };
        let deadline = (now + self.timing.quiet).min(first + self.timing.max_wait);
        self.state = DebounceState::Pending { first, deadline };
    }

    /// Drop the pending fire. Returns whether one was pending.
    pub fn cancel(&mut self) -> bool {
        let was_pending = self.is_pending();
        self.state = DebounceState::Idle;
        was_pending
    }

    /// Fire now if pending, regardless of the deadline.
    pub fn flush(&mut self) -> bool {
        self.cancel()
    }

    #[must_use]
    pub fn is_pending(&self) -> bool {
        matches!(self.state, DebounceState::Pending { .. })
    }

    #[must_use]
    pub fn deadline(&self) -> Option<Instant> {
        match self.state {
            DebounceState::Idle => None,
            DebounceState::Pending { deadline, .. } => Some(deadline),
        }
    }

    /// Fire if the deadline has passed. Returns true exactly once per burst.
    pub fn poll_fire(&mut self, now: Instant) -> bool {
        match self.state {
            DebounceState::Pending { deadline, .. } if now >= deadline => {
                self.state = DebounceState::Idle;
                true
            }
            _ => false,
        }
    }
}
