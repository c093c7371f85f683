//! Fakes shared by the integration tests

use async_trait::async_trait;
use market_collector::sink::{SinkError, SinkKind, Sinks, TickCache, TickPublisher, TickStore};
use market_collector::source::{FetchError, PriceSource};
use market_collector::tick::{MarketTick, Quote};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Price source answering from a fixed table; unknown assets fail
#[derive(Default)]
pub struct ScriptedSource {
    quotes: HashMap<String, Quote>,
    pub calls: Mutex<Vec<String>>,
}

impl ScriptedSource {
    pub fn new(quotes: &[(&str, f64, f64)]) -> Self {
        Self {
            quotes: quotes
                .iter()
                .map(|(asset, price, volume)| (asset.to_string(), Quote::new(*price, *volume)))
                .collect(),
            calls: Mutex::new(vec![]),
        }
    }

    pub async fn calls(&self) -> Vec<String> {
        self.calls.lock().await.clone()
    }
}

#[async_trait]
impl PriceSource for ScriptedSource {
    async fn fetch(&self, asset_id: &str) -> Result<Quote, FetchError> {
        self.calls.lock().await.push(asset_id.to_string());
        self.quotes
            .get(asset_id)
            .cloned()
            .ok_or_else(|| FetchError::MissingAsset {
                asset: asset_id.to_string(),
            })
    }

    fn source_tag(&self) -> &str {
        "coingecko"
    }
}

/// Records every tick offered to it and fails for selected assets
#[derive(Default)]
pub struct RecordingSink {
    kind: Option<SinkKind>,
    failing: HashSet<String>,
    accepted: Mutex<Vec<MarketTick>>,
    attempts: Mutex<Vec<String>>,
}

impl RecordingSink {
    pub fn new(kind: SinkKind) -> Self {
        Self {
            kind: Some(kind),
            ..Default::default()
        }
    }

    pub fn failing_for(kind: SinkKind, assets: &[&str]) -> Self {
        Self {
            kind: Some(kind),
            failing: assets.iter().map(|a| a.to_string()).collect(),
            ..Default::default()
        }
    }

    pub async fn accepted(&self) -> Vec<MarketTick> {
        self.accepted.lock().await.clone()
    }

    pub async fn attempts(&self) -> Vec<String> {
        self.attempts.lock().await.clone()
    }

    async fn offer(&self, tick: MarketTick) -> Result<(), SinkError> {
        self.attempts.lock().await.push(tick.asset_symbol.clone());
        if self.failing.contains(&tick.asset_symbol) {
            return Err(SinkError::Unavailable {
                sink: self.kind.unwrap_or(SinkKind::Store),
                reason: "injected failure".to_string(),
            });
        }
        self.accepted.lock().await.push(tick);
        Ok(())
    }
}

#[async_trait]
impl TickStore for RecordingSink {
    async fn append(&self, tick: &MarketTick) -> Result<(), SinkError> {
        self.offer(tick.clone()).await
    }
}

#[async_trait]
impl TickCache for RecordingSink {
    async fn set_latest(&self, _asset_symbol: &str, tick: &MarketTick) -> Result<(), SinkError> {
        self.offer(tick.clone()).await
    }

    async fn latest(&self, asset_symbol: &str) -> Result<Option<MarketTick>, SinkError> {
        Ok(self
            .accepted
            .lock()
            .await
            .iter()
            .rev()
            .find(|t| t.asset_symbol == asset_symbol)
            .cloned())
    }
}

#[async_trait]
impl TickPublisher for RecordingSink {
    async fn publish(&self, _key: &str, payload: &[u8]) -> Result<(), SinkError> {
        let tick: MarketTick = serde_json::from_slice(payload)?;
        self.offer(tick).await
    }
}

/// The three recording sinks plus the bundle handed to the collector
pub struct Harness {
    pub store: Arc<RecordingSink>,
    pub cache: Arc<RecordingSink>,
    pub publisher: Arc<RecordingSink>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with(
            RecordingSink::new(SinkKind::Store),
            RecordingSink::new(SinkKind::Cache),
            RecordingSink::new(SinkKind::Publish),
        )
    }

    pub fn with(store: RecordingSink, cache: RecordingSink, publisher: RecordingSink) -> Self {
        Self {
            store: Arc::new(store),
            cache: Arc::new(cache),
            publisher: Arc::new(publisher),
        }
    }

    pub fn sinks(&self) -> Sinks {
        Sinks::new(
            self.store.clone(),
            self.cache.clone(),
            self.publisher.clone(),
        )
    }
}
