//! Fixed-interval driver for the collector

use super::Collector;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

/// Runs one cycle immediately, then one per interval, until cancelled
///
/// Cycles never overlap: a cycle that outlasts the interval defers the next
/// one instead of running alongside it.
pub struct Scheduler {
    collector: Arc<Collector>,
    interval: Duration,
}

impl Scheduler {
    pub fn new(collector: Arc<Collector>, interval: Duration) -> Self {
        Self {
            collector,
            // tokio rejects a zero period
            interval: interval.max(Duration::from_millis(1)),
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Drive cycles until `cancel` fires; returns the number of cycles run
    pub async fn run(&self, cancel: CancellationToken) -> u64 {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        tracing::info!(
            assets = ?self.collector.assets(),
            interval_secs = self.interval.as_secs_f64(),
            "Collector started"
        );

        let mut cycles = 0u64;
        loop {
            tokio::select! {
                biased;

                _ = cancel.cancelled() => {
                    tracing::info!("Shutdown requested, stopping collector");
                    break;
                }

                _ = ticker.tick() => {
                    cycles += 1;
                    tracing::debug!(cycle = cycles, "Starting collection cycle");
                    self.collector.run_cycle(&cancel).await;
                }
            }
        }

        tracing::info!(cycles, "Collector stopped");
        cycles
    }
}
