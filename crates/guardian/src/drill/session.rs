//! One timed, checklist-gated run of a drill.
//!
//! A [`DrillSession`] is active from the moment it is created. It leaves that
//! state exactly once, by being consumed by
//! [`DrillBook::complete`](super::DrillBook::complete) or
//! [`DrillBook::cancel`](super::DrillBook::cancel); the move makes resuming a
//! finished session unrepresentable.

use std::collections::BTreeSet;
use std::time::Duration;

use chrono::NaiveDate;
use serde::Serialize;

use super::DrillTask;
use crate::timer::PeriodicTimer;

/// An in-progress drill.
#[derive(Debug)]
pub struct DrillSession {
    task: Box<DrillTask>,
    checked: BTreeSet<usize>,
    elapsed_seconds: u64,
    running: bool,
    timer: Option<PeriodicTimer>,
}

impl DrillSession {
    /// Start a session for `task`: nothing checked, clock at zero, running.
    #[must_use]
    pub fn new(task: DrillTask) -> Self {
        Self {
            task: Box::new(task),
            checked: BTreeSet::new(),
            elapsed_seconds: 0,
            running: true,
            timer: None,
        }
    }

    /// The drill being run.
    #[must_use]
    pub fn task(&self) -> &DrillTask {
        &self.task
    }

    /// Flip the checked state of step `index`.
    ///
    /// Returns the new state, or `None` if there is no such step.
    pub fn toggle_step(&mut self, index: usize) -> Option<bool> {
        if index >= self.task.steps.len() {
            return None;
        }
        if self.checked.remove(&index) {
            Some(false)
        } else {
            self.checked.insert(index);
            Some(true)
        }
    }

    /// Whether step `index` is checked.
    #[must_use]
    pub fn is_checked(&self, index: usize) -> bool {
        self.checked.contains(&index)
    }

    /// Number of checked steps.
    #[must_use]
    pub fn checked_count(&self) -> usize {
        self.checked.len()
    }

    /// Whether every step is checked, in whatever order.
    #[must_use]
    pub fn can_complete(&self) -> bool {
        self.checked.len() == self.task.steps.len()
    }

    /// Fraction of steps checked, `0.0` for a drill without steps.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn progress_ratio(&self) -> f64 {
        if self.task.steps.is_empty() {
            return 0.0;
        }
        self.checked.len() as f64 / self.task.steps.len() as f64
    }

    /// Progress as a whole percentage.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn progress_percent(&self) -> u8 {
        (self.progress_ratio() * 100.0).round() as u8
    }

    /// Seconds counted so far.
    #[must_use]
    pub fn elapsed_seconds(&self) -> u64 {
        self.elapsed_seconds
    }

    /// Elapsed time as `MM:SS`.
    #[must_use]
    pub fn formatted_elapsed(&self) -> String {
        format_clock(self.elapsed_seconds)
    }

    /// Whether the clock is running.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Advance the clock by one second.
    pub fn tick(&mut self) {
        if self.running {
            self.elapsed_seconds += 1;
        }
    }

    /// Attach a timer that ticks the clock every `period`.
    ///
    /// Replaces any timer already attached. Must be called from within a tokio
    /// runtime.
    pub fn start_timer(&mut self, period: Duration) {
        self.timer = Some(PeriodicTimer::start(period));
    }

    /// Whether a timer is attached.
    #[must_use]
    pub fn has_timer(&self) -> bool {
        self.timer.is_some()
    }

    /// Apply every tick the timer has fired so far. Returns how many.
    pub fn pump_timer(&mut self) -> u64 {
        let fired = self.timer.as_mut().map_or(0, PeriodicTimer::drain);
        for _ in 0..fired {
            self.tick();
        }
        fired
    }

    /// Wait for the next timer tick and apply it.
    ///
    /// Returns the new elapsed time, or `None` if no timer is attached.
    pub async fn next_tick(&mut self) -> Option<u64> {
        let timer = self.timer.as_mut()?;
        if !timer.tick().await {
            return None;
        }
        self.tick();
        Some(self.elapsed_seconds)
    }

    /// Freeze the clock and release the timer.
    pub(super) fn stop(&mut self) {
        self.running = false;
        if let Some(mut timer) = self.timer.take() {
            timer.cancel();
        }
    }
}

/// How a session ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SessionOutcome {
    /// Every step was checked and the drill recorded as performed.
    Completed {
        /// Drill id.
        task_id: String,
        /// Date recorded as last performed.
        performed_on: NaiveDate,
        /// Time on the clock when completed.
        elapsed_seconds: u64,
    },
    /// Abandoned; nothing was recorded.
    Cancelled {
        /// Drill id.
        task_id: String,
        /// Time on the clock when cancelled.
        elapsed_seconds: u64,
    },
}

impl SessionOutcome {
    /// Whether the drill was recorded as performed.
    #[must_use]
    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed { .. })
    }

    /// Final clock reading.
    #[must_use]
    pub fn elapsed_seconds(&self) -> u64 {
        match self {
            Self::Completed {
                elapsed_seconds, ..
            }
            | Self::Cancelled {
                elapsed_seconds, ..
            } => *elapsed_seconds,
        }
    }
}

/// Format seconds as `MM:SS`. Minutes keep counting past 59.
#[must_use]
pub fn format_clock(seconds: u64) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}
