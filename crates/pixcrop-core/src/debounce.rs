//! Debounced recomputation scheduling.
//!
//! Coalesces a burst of dependency changes (region, scale, rotation) into a
//! single recomputation after a quiet period. The scheduler is a pure
//! decision state machine over caller-supplied timestamps: the host's
//! single event loop owns time, calls [`DebounceScheduler::notify`] on every
//! change and [`DebounceScheduler::fire`] on every tick, and runs the work
//! itself when `fire` returns true. No threads or timers are spawned here,
//! which keeps the timing contract deterministic and testable.

use std::time::Duration;

/// Default quiet period between the last change and the recomputation.
pub const DEFAULT_QUIET_PERIOD: Duration = Duration::from_millis(100);

/// Coalesces change bursts into a single deferred firing.
///
/// Timestamps are monotonic offsets from an arbitrary epoch owned by the
/// host (e.g. `performance.now()` in a browser), which keeps the scheduler
/// portable to wasm targets where `Instant::now` is unavailable.
///
/// Each `notify` supersedes the previous deadline, so a burst of N changes
/// inside the quiet period fires exactly once, after the last change.
/// `cancel` disarms the scheduler; a cancelled deadline can never fire.
#[derive(Debug, Clone)]
pub struct DebounceScheduler {
    quiet_period: Duration,
    deadline: Option<Duration>,
}

impl DebounceScheduler {
    /// Create a scheduler with the given quiet period.
    pub fn new(quiet_period: Duration) -> Self {
        Self {
            quiet_period,
            deadline: None,
        }
    }

    /// The configured quiet period.
    pub fn quiet_period(&self) -> Duration {
        self.quiet_period
    }

    /// A dependency changed: supersede any pending deadline and arm a new
    /// one a full quiet period from `now`.
    pub fn notify(&mut self, now: Duration) {
        self.deadline = Some(now + self.quiet_period);
    }

    /// Disarm the scheduler. Pending work is abandoned, not run.
    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    /// True while a deadline is armed.
    pub fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }

    /// Time left until the armed deadline, or `None` when disarmed.
    /// A deadline that has already passed reports `Some(ZERO)`.
    pub fn remaining(&self, now: Duration) -> Option<Duration> {
        self.deadline
            .map(|deadline| deadline.saturating_sub(now))
    }

    /// Poll the deadline: returns true exactly once when the quiet period
    /// has elapsed, disarming the scheduler.
    pub fn fire(&mut self, now: Duration) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }
}

impl Default for DebounceScheduler {
    fn default() -> Self {
        Self::new(DEFAULT_QUIET_PERIOD)
    }
}
