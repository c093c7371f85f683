//! Collection cycle orchestrator

use super::report::{AssetOutcome, AssetStatus, CycleReport, StepOutcome};
use crate::sink::{SinkError, SinkKind, Sinks};
use crate::source::PriceSource;
use crate::telemetry;
use crate::tick::{normalize, MarketTick};
use chrono::{DateTime, Utc};
use futures_util::stream::{self, StreamExt};
use futures_util::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;

/// Trim identifiers and drop the ones left empty, keeping order
pub fn normalize_asset_ids<I, S>(ids: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    ids.into_iter()
        .map(|id| id.as_ref().trim().to_string())
        .filter(|id| !id.is_empty())
        .collect()
}

/// Runs collection cycles over a fixed asset list
///
/// Holds no state between cycles besides the asset list and the shared
/// source and sink handles.
pub struct Collector {
    assets: Vec<String>,
    source: Arc<dyn PriceSource>,
    sinks: Sinks,
    concurrency: usize,
}

impl Collector {
    /// Create a collector processing assets one at a time
    pub fn new<I, S>(assets: I, source: Arc<dyn PriceSource>, sinks: Sinks) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let assets = normalize_asset_ids(assets);
        if assets.is_empty() {
            tracing::warn!("Collector created with no assets");
        }

        Self {
            assets,
            source,
            sinks,
            concurrency: 1,
        }
    }

    /// Allow up to `n` assets to be processed at once
    pub fn with_concurrency(mut self, n: usize) -> Self {
        self.concurrency = n.max(1);
        self
    }

    /// Configured asset identifiers, trimmed
    pub fn assets(&self) -> &[String] {
        &self.assets
    }

    /// Run one cycle stamped with the current time
    pub async fn run_cycle(&self, cancel: &CancellationToken) -> CycleReport {
        self.run_cycle_at(Utc::now(), cancel).await
    }

    /// Run one cycle with every tick stamped `captured_at`
    ///
    /// Never fails: fetch and sink errors are logged, counted and reported
    /// per asset. Assets not yet started when `cancel` fires are reported as
    /// cancelled; work already started runs to completion.
    pub async fn run_cycle_at(
        &self,
        captured_at: DateTime<Utc>,
        cancel: &CancellationToken,
    ) -> CycleReport {
        let started = Instant::now();

        let outcomes: Vec<AssetOutcome> = stream::iter(self.assets.iter().cloned())
            .map(|asset| async move { self.guarded_asset(asset, captured_at, cancel).await })
            .buffered(self.concurrency)
            .collect()
            .await;

        let report = CycleReport {
            captured_at,
            outcomes,
        };

        let elapsed = started.elapsed();
        telemetry::record_cycle(&report, elapsed);

        tracing::info!(
            captured_at = %captured_at,
            assets = report.attempted(),
            ticks = report.ticks_produced(),
            fetch_failures = report.fetch_failures(),
            store_failures = report.sink_failures(SinkKind::Store),
            cache_failures = report.sink_failures(SinkKind::Cache),
            publish_failures = report.sink_failures(SinkKind::Publish),
            cancelled = report.cancelled(),
            aborted = report.aborted(),
            elapsed_ms = elapsed.as_millis() as u64,
            "Collection cycle finished"
        );

        report
    }

    /// Run one asset, turning a panic into an aborted outcome for that asset only
    async fn guarded_asset(
        &self,
        asset: String,
        captured_at: DateTime<Utc>,
        cancel: &CancellationToken,
    ) -> AssetOutcome {
        let work = AssertUnwindSafe(self.collect_asset(&asset, captured_at, cancel));
        match work.catch_unwind().await {
            Ok(outcome) => outcome,
            Err(payload) => {
                let reason = panic_message(payload.as_ref());
                tracing::error!(asset = %asset, reason = %reason, "Asset processing panicked");
                AssetOutcome {
                    asset,
                    status: AssetStatus::Aborted(reason),
                }
            }
        }
    }

    /// Fetch, normalize and fan out one asset
    async fn collect_asset(
        &self,
        asset: &str,
        captured_at: DateTime<Utc>,
        cancel: &CancellationToken,
    ) -> AssetOutcome {
        if cancel.is_cancelled() {
            tracing::debug!(asset, "Shutdown requested, skipping asset");
            return AssetOutcome {
                asset: asset.to_string(),
                status: AssetStatus::Cancelled,
            };
        }

        let quote = match self.source.fetch(asset).await {
            Ok(quote) => {
                telemetry::record_fetch(true);
                quote
            }
            Err(e) => {
                telemetry::record_fetch(false);
                tracing::warn!(asset, error = %e, "Price fetch failed, skipping asset");
                return AssetOutcome {
                    asset: asset.to_string(),
                    status: AssetStatus::FetchFailed(e.to_string()),
                };
            }
        };

        let tick = normalize(asset, quote, captured_at, self.source.source_tag());
        let status = self.fan_out(&tick).await;

        AssetOutcome {
            asset: tick.asset_symbol,
            status,
        }
    }

    /// Offer the tick to every sink; each write stands on its own
    async fn fan_out(&self, tick: &MarketTick) -> AssetStatus {
        let store = settle(SinkKind::Store, tick, self.sinks.store.append(tick).await);

        let cache = settle(
            SinkKind::Cache,
            tick,
            self.sinks.cache.set_latest(&tick.asset_symbol, tick).await,
        );

        let published = match serde_json::to_vec(tick) {
            Ok(payload) => {
                self.sinks
                    .publisher
                    .publish(&tick.asset_symbol, &payload)
                    .await
            }
            Err(e) => Err(SinkError::from(e)),
        };
        let publish = settle(SinkKind::Publish, tick, published);

        AssetStatus::Delivered {
            store,
            cache,
            publish,
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        msg.to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "panic with non-string payload".to_string()
    }
}

/// Log and count one sink write, reducing it to a step outcome
fn settle(kind: SinkKind, tick: &MarketTick, result: Result<(), SinkError>) -> StepOutcome {
    telemetry::record_sink_write(kind, result.is_ok());

    match &result {
        Ok(()) => tracing::debug!(
            asset = %tick.asset_symbol,
            sink = %kind,
            price = tick.price(),
            timestamp = %tick.timestamp,
            "Tick delivered"
        ),
        Err(e) => tracing::warn!(
            asset = %tick.asset_symbol,
            sink = %kind,
            error = %e,
            "Sink write failed"
        ),
    }

    result.into()
}
