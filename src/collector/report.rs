//! Cycle outcome summary

use crate::sink::SinkKind;
use chrono::{DateTime, Utc};

/// Result of one sink write
#[derive(Debug, Clone, PartialEq)]
pub enum StepOutcome {
    Succeeded,
    Failed(String),
}

impl StepOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, StepOutcome::Succeeded)
    }
}

impl<E: std::fmt::Display> From<Result<(), E>> for StepOutcome {
    fn from(result: Result<(), E>) -> Self {
        match result {
            Ok(()) => StepOutcome::Succeeded,
            Err(e) => StepOutcome::Failed(e.to_string()),
        }
    }
}

/// What happened to one asset during a cycle
#[derive(Debug, Clone, PartialEq)]
pub enum AssetStatus {
    /// Shutdown was requested before work on this asset started
    Cancelled,
    /// The price fetch failed; no tick was produced and no sink was touched
    FetchFailed(String),
    /// Processing panicked; which sinks saw the tick is unknown
    Aborted(String),
    /// A tick was produced and offered to every sink
    Delivered {
        store: StepOutcome,
        cache: StepOutcome,
        publish: StepOutcome,
    },
}

/// Per-asset entry of a [`CycleReport`]
#[derive(Debug, Clone, PartialEq)]
pub struct AssetOutcome {
    pub asset: String,
    pub status: AssetStatus,
}

impl AssetOutcome {
    /// Outcome of the write to `kind`, if a tick was produced
    pub fn sink(&self, kind: SinkKind) -> Option<&StepOutcome> {
        match &self.status {
            AssetStatus::Delivered {
                store,
                cache,
                publish,
            } => Some(match kind {
                SinkKind::Store => store,
                SinkKind::Cache => cache,
                SinkKind::Publish => publish,
            }),
            _ => None,
        }
    }
}

/// Summary of one collection cycle
///
/// Cycles never fail as a whole; this is what callers get instead.
#[derive(Debug, Clone, PartialEq)]
pub struct CycleReport {
    /// Timestamp shared by every tick of the cycle
    pub captured_at: DateTime<Utc>,
    /// One entry per configured asset, in configured order
    pub outcomes: Vec<AssetOutcome>,
}

impl CycleReport {
    /// Number of assets considered
    pub fn attempted(&self) -> usize {
        self.outcomes.len()
    }

    /// Number of ticks produced (successful fetches)
    pub fn ticks_produced(&self) -> usize {
        self.count(|s| matches!(s, AssetStatus::Delivered { .. }))
    }

    pub fn fetch_failures(&self) -> usize {
        self.count(|s| matches!(s, AssetStatus::FetchFailed(_)))
    }

    pub fn cancelled(&self) -> usize {
        self.count(|s| matches!(s, AssetStatus::Cancelled))
    }

    pub fn aborted(&self) -> usize {
        self.count(|s| matches!(s, AssetStatus::Aborted(_)))
    }

    /// Successful writes to `kind` across all assets
    pub fn sink_successes(&self, kind: SinkKind) -> usize {
        self.outcomes
            .iter()
            .filter_map(|o| o.sink(kind))
            .filter(|s| s.is_success())
            .count()
    }

    /// Failed writes to `kind` across all assets
    pub fn sink_failures(&self, kind: SinkKind) -> usize {
        self.outcomes
            .iter()
            .filter_map(|o| o.sink(kind))
            .filter(|s| !s.is_success())
            .count()
    }

    /// Every asset fetched and every sink write succeeded
    pub fn is_clean(&self) -> bool {
        self.outcomes.iter().all(|o| match &o.status {
            AssetStatus::Delivered {
                store,
                cache,
                publish,
            } => store.is_success() && cache.is_success() && publish.is_success(),
            _ => false,
        })
    }

    /// Outcome for a given asset
    pub fn outcome(&self, asset: &str) -> Option<&AssetOutcome> {
        self.outcomes.iter().find(|o| o.asset == asset)
    }

    fn count(&self, pred: impl Fn(&AssetStatus) -> bool) -> usize {
        self.outcomes.iter().filter(|o| pred(&o.status)).count()
    }
}
