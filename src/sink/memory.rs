//! In-process sinks
//!
//! Hold everything in memory; used for dry runs.

use super::{SinkError, TickCache, TickPublisher, TickStore};
use crate::tick::MarketTick;
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Store that keeps every appended tick
#[derive(Debug, Default)]
pub struct MemoryStore {
    ticks: RwLock<Vec<MarketTick>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// All ticks appended so far, in append order
    pub async fn ticks(&self) -> Vec<MarketTick> {
        self.ticks.read().await.clone()
    }
}

#[async_trait]
impl TickStore for MemoryStore {
    async fn append(&self, tick: &MarketTick) -> Result<(), SinkError> {
        self.ticks.write().await.push(tick.clone());
        Ok(())
    }
}

/// Cache holding the latest tick per asset
#[derive(Debug, Default)]
pub struct MemoryCache {
    latest: RwLock<HashMap<String, MarketTick>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of assets with a cached tick
    pub async fn len(&self) -> usize {
        self.latest.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.latest.read().await.is_empty()
    }
}

#[async_trait]
impl TickCache for MemoryCache {
    async fn set_latest(&self, asset_symbol: &str, tick: &MarketTick) -> Result<(), SinkError> {
        self.latest
            .write()
            .await
            .insert(asset_symbol.to_string(), tick.clone());
        Ok(())
    }

    async fn latest(&self, asset_symbol: &str) -> Result<Option<MarketTick>, SinkError> {
        Ok(self.latest.read().await.get(asset_symbol).cloned())
    }
}

/// One message handed to [`MemoryPublisher`]
#[derive(Debug, Clone, PartialEq)]
pub struct PublishedMessage {
    pub key: String,
    pub payload: Vec<u8>,
}

/// Publisher that records messages instead of sending them
#[derive(Debug, Default)]
pub struct MemoryPublisher {
    messages: RwLock<Vec<PublishedMessage>>,
}

impl MemoryPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Messages in send order
    pub async fn messages(&self) -> Vec<PublishedMessage> {
        self.messages.read().await.clone()
    }

    /// Decode every recorded payload back into a tick
    pub async fn ticks(&self) -> Result<Vec<MarketTick>, serde_json::Error> {
        self.messages
            .read()
            .await
            .iter()
            .map(|m| serde_json::from_slice(&m.payload))
            .collect()
    }
}

#[async_trait]
impl TickPublisher for MemoryPublisher {
    async fn publish(&self, key: &str, payload: &[u8]) -> Result<(), SinkError> {
        self.messages.write().await.push(PublishedMessage {
            key: key.to_string(),
            payload: payload.to_vec(),
        });
        Ok(())
    }
}
