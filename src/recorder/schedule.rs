//! Fixed-period tick pacing
//!
//! Each tick sleeps for whatever is left of the period after its work. A tick
//! that overruns is not shortened, dropped or doubled: the next one starts
//! immediately and the run drifts from the nominal grid.

use std::time::{Duration, Instant};

/// Time left in the period after `elapsed` of work, never negative
pub fn sleep_budget(period: Duration, elapsed: Duration) -> Duration {
    period.saturating_sub(elapsed)
}

#[derive(Debug, Clone)]
pub struct FixedPeriodScheduler {
    period: Duration,
    tick_started: Option<Instant>,
    overruns: u64,
}

impl FixedPeriodScheduler {
    pub fn new(period: Duration) -> Self {
        Self {
            period,
            tick_started: None,
            overruns: 0,
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Mark the start of a tick
    pub fn begin_tick(&mut self) {
        self.tick_started = Some(Instant::now());
    }

    /// Sleep out the rest of the current tick's period.
    pub fn finish_tick(&mut self) {
        let elapsed = self
            .tick_started
            .take()
            .map(|start| start.elapsed())
            .unwrap_or_default();
        if elapsed > self.period {
            self.overruns += 1;
            return;
        }

        let budget = sleep_budget(self.period, elapsed);
        if !budget.is_zero() {
            std::thread::sleep(budget);
        }
    }

    /// Number of ticks whose work took longer than one period
    pub fn overruns(&self) -> u64 {
        self.overruns
    }
}
