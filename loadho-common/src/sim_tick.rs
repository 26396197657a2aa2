//! Simulation clock and recurring timers
//!
//! All components run as callbacks on a single logical clock measured in
//! milliseconds. Periodic work (load sampling, threshold control) is driven by
//! [`RecurringTimer`], which re-arms itself after each firing instead of a
//! callback scheduling itself again.

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

/// Length of a run on the simulated clock.
///
/// The clock resolution is `tick_duration_ms`; a run lasts `total_ticks` of
/// them. With `real_time` set, the clock paces itself against the wall clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationTimeConfig {
    pub tick_duration_ms: u64,
    pub total_ticks: u64,
    pub real_time: bool,
}

impl Default for SimulationTimeConfig {
    fn default() -> Self {
        // 58 s at 1 ms resolution
        Self {
            tick_duration_ms: 1,
            total_ticks: 58_000,
            real_time: false,
        }
    }
}

impl SimulationTimeConfig {
    /// End of the run (ms).
    pub fn total_duration_ms(&self) -> u64 {
        self.total_ticks.saturating_mul(self.tick_duration_ms)
    }
}

/// Monotonic simulated clock.
///
/// Only moves forward; the engine advances it to the timestamp of
/// each event it dispatches.
#[derive(Debug)]
pub struct SimulationClock {
    now_ms: u64,
    config: SimulationTimeConfig,
    wall_start: Instant,
}

impl SimulationClock {
    pub fn new(config: SimulationTimeConfig) -> Self {
        Self {
            now_ms: 0,
            config,
            wall_start: Instant::now(),
        }
    }

    /// Current simulated time (ms)
    pub fn now_ms(&self) -> u64 {
        self.now_ms
    }

    /// Simulated instant at which the run ends
    pub fn end_ms(&self) -> u64 {
        self.config.total_duration_ms()
    }

    /// Moves the clock to `time_ms`.
    ///
    /// Returns false (and leaves the clock untouched) if `time_ms` lies in the
    /// past.
    pub fn advance_to(&mut self, time_ms: u64) -> bool {
        if time_ms < self.now_ms {
            return false;
        }
        if self.config.real_time {
            let wall_ms = u64::try_from(self.wall_start.elapsed().as_millis()).unwrap_or(u64::MAX);
            if let Some(ahead) = time_ms.checked_sub(wall_ms).filter(|&d| d > 0) {
                std::thread::sleep(Duration::from_millis(ahead));
            }
        }
        self.now_ms = time_ms;
        true
    }
}

/// Recurring timer on the simulation clock.
///
/// Fires at `first_due`, then every `period_ms` after that. A cancelled timer
/// never fires again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecurringTimer {
    period_ms: u64,
    next_due_ms: Option<u64>,
    fired: u64,
}

impl RecurringTimer {
    /// Creates a timer whose first expiry is `first_due_ms`.
    ///
    /// A zero period is clamped to 1 ms so the timer always makes progress.
    pub fn new(period_ms: u64, first_due_ms: u64) -> Self {
        Self {
            period_ms: period_ms.max(1),
            next_due_ms: Some(first_due_ms),
            fired: 0,
        }
    }

    /// Next expiry, or `None` once cancelled
    pub fn next_due(&self) -> Option<u64> {
        self.next_due_ms
    }

    pub fn fire_count(&self) -> u64 {
        self.fired
    }

    /// Fires the timer if it is due, re-arming it one period after the
    /// expiry that just passed.
    pub fn fire(&mut self, now_ms: u64) -> bool {
        match self.next_due_ms {
            Some(due) if now_ms >= due => {
                self.next_due_ms = Some(due + self.period_ms);
                self.fired += 1;
                true
            }
            _ => false,
        }
    }

    pub fn cancel(&mut self) {
        self.next_due_ms = None;
    }
}
