//! Collection Cost Budget
//!
//! Bounds the wall-clock time spent computing volume sizes. Each completed
//! collection adds its measured duration to a running balance; once per window
//! the balance is decremented by the limit (floored at zero). A scrape is admitted
//! while the balance does not exceed the limit.
//!
//! Because the cost is the measured collection time, slow backends exhaust the
//! budget faster and get collected less often.
//!
//! The state sits behind a mutex: requests are handled concurrently and each
//! admit or record is a read-modify-write of the shared balance. Callers pass the
//! current `Instant` in, which keeps the throttle testable without a real clock.

use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

/// Snapshot of the throttle's accounting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BudgetState {
    pub consumed_cost_ms: u64,
    /// `None` until the first admission check
    pub window_start: Option<Instant>,
    pub cost_limit_ms: u64,
    pub window: Duration,
}

/// Process-wide admission controller for size collections
#[derive(Debug)]
pub struct BudgetThrottle {
    state: Mutex<BudgetState>,
}

impl BudgetThrottle {
    /// `cost_limit_ms` must be positive; zero is raised to one millisecond.
    pub fn new(cost_limit_ms: u64, window: Duration) -> Self {
        Self {
            state: Mutex::new(BudgetState {
                consumed_cost_ms: 0,
                window_start: None,
                cost_limit_ms: cost_limit_ms.max(1),
                window,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, BudgetState> {
        // The state is plain data and stays consistent even if a holder panicked
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Applies the window decay, then decides whether a collection may run.
    ///
    /// The decay fires at most once per call however many windows have passed,
    /// and runs even when the call is rejected so the window anchor advances.
    pub fn admit(&self, now: Instant) -> bool {
        let mut state = self.lock();

        let window_elapsed = match state.window_start {
            Some(start) => now.saturating_duration_since(start) >= state.window,
            None => true,
        };
        if window_elapsed {
            state.window_start = Some(now);
            state.consumed_cost_ms = state.consumed_cost_ms.saturating_sub(state.cost_limit_ms);
        }

        state.consumed_cost_ms <= state.cost_limit_ms
    }

    /// Adds the measured duration of a collection that actually ran
    pub fn record_cost(&self, elapsed: Duration) {
        let elapsed_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX);
        let mut state = self.lock();
        state.consumed_cost_ms = state.consumed_cost_ms.saturating_add(elapsed_ms);
    }

    pub fn snapshot(&self) -> BudgetState {
        *self.lock()
    }
}
