//! Periodic tick source with an explicit stop handle.
//!
//! A [`PeriodicTimer`] owns one tokio task that sends a unit tick on a channel
//! once per period. The owner pulls ticks from the channel; nothing runs on
//! its behalf. Cancelling or dropping the timer aborts the task.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::trace;

/// Shortest accepted period.
const MIN_PERIOD: Duration = Duration::from_millis(1);

/// Handle to a running periodic tick task.
#[derive(Debug)]
pub struct PeriodicTimer {
    handle: JoinHandle<()>,
    ticks: mpsc::UnboundedReceiver<()>,
    period: Duration,
}

impl PeriodicTimer {
    /// Start ticking every `period`, first tick one period from now.
    ///
    /// Must be called from within a tokio runtime.
    #[must_use]
    pub fn start(period: Duration) -> Self {
        let period = period.max(MIN_PERIOD);
        let (tx, ticks) = mpsc::unbounded_channel();

        let handle = tokio::spawn(async move {
            let mut interval = time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Burst);
            loop {
                interval.tick().await;
                if tx.send(()).is_err() {
                    break;
                }
            }
        });
        trace!(?period, "Timer started");

        Self {
            handle,
            ticks,
            period,
        }
    }

    /// The tick period.
    #[must_use]
    pub fn period(&self) -> Duration {
        self.period
    }

    /// Wait for the next tick.
    ///
    /// Returns `false` once the timer has been cancelled and every pending
    /// tick consumed.
    pub async fn tick(&mut self) -> bool {
        self.ticks.recv().await.is_some()
    }

    /// Consume every tick that has already fired, without waiting.
    pub fn drain(&mut self) -> u64 {
        let mut count = 0;
        while self.ticks.try_recv().is_ok() {
            count += 1;
        }
        count
    }

    /// Stop the tick task. Ticks not yet consumed are still drained.
    pub fn cancel(&mut self) {
        if !self.handle.is_finished() {
            trace!("Timer cancelled");
        }
        self.handle.abort();
    }

    /// Whether the tick task has stopped.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Drop for PeriodicTimer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_ticks_once_per_period() {
        let started = Instant::now();
        let mut timer = PeriodicTimer::start(Duration::from_secs(1));

        for _ in 0..3 {
            assert!(timer.tick().await);
        }
        assert_eq!(started.elapsed(), Duration::from_secs(3));
    }

    #[tokio::test(start_paused = true)]
    async fn test_drain_counts_fired_ticks() {
        let mut timer = PeriodicTimer::start(Duration::from_millis(100));
        assert_eq!(timer.drain(), 0);

        time::sleep(Duration::from_millis(350)).await;
        assert_eq!(timer.drain(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_stops_ticks() {
        let mut timer = PeriodicTimer::start(Duration::from_secs(1));
        assert!(timer.tick().await);

        timer.cancel();
        assert!(!timer.tick().await);
        assert!(timer.is_finished());
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_period_is_raised() {
        let timer = PeriodicTimer::start(Duration::ZERO);
        assert_eq!(timer.period(), MIN_PERIOD);
    }
}
