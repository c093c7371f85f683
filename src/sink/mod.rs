//! Fan-out sinks
//!
//! Every tick goes to three independent destinations:
//! - a durable append-only store (Postgres)
//! - a latest-value cache (Redis)
//! - a publish channel (Kafka)

mod kafka;
mod memory;
mod postgres;
mod redis_cache;

pub use kafka::{KafkaPublisher, KafkaPublisherConfig, TICKS_TOPIC};
pub use memory::{MemoryCache, MemoryPublisher, MemoryStore, PublishedMessage};
pub use postgres::{build_pool, PostgresStore, MARKET_DATA_TABLE};
pub use redis_cache::{RedisCache, RedisCacheConfig, LATEST_KEY_PREFIX};

use crate::tick::MarketTick;
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Which sink an operation targeted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SinkKind {
    Store,
    Cache,
    Publish,
}

impl SinkKind {
    /// Label used in logs and metrics
    pub fn as_str(&self) -> &'static str {
        match self {
            SinkKind::Store => "store",
            SinkKind::Cache => "cache",
            SinkKind::Publish => "publish",
        }
    }
}

impl fmt::Display for SinkKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failure delivering a tick to a sink
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("store write failed: {0}")]
    Store(#[from] tokio_postgres::Error),
    #[error("store connection unavailable: {0}")]
    StorePool(#[from] deadpool_postgres::PoolError),
    #[error("store pool setup failed: {0}")]
    StorePoolBuild(#[from] deadpool_postgres::BuildError),
    #[error("cache operation failed: {0}")]
    Cache(#[from] redis::RedisError),
    #[error("publish failed: {0}")]
    Publish(#[from] rdkafka::error::KafkaError),
    #[error("tick serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("{sink} unavailable: {reason}")]
    Unavailable { sink: SinkKind, reason: String },
}

/// Durable append-only tick storage
#[async_trait]
pub trait TickStore: Send + Sync {
    /// Persist one tick; duplicates are accepted
    async fn append(&self, tick: &MarketTick) -> Result<(), SinkError>;
}

/// Most-recent tick per asset
#[async_trait]
pub trait TickCache: Send + Sync {
    /// Overwrite the latest tick for `asset_symbol`
    async fn set_latest(&self, asset_symbol: &str, tick: &MarketTick) -> Result<(), SinkError>;

    /// Read back the latest tick for `asset_symbol`, if any
    async fn latest(&self, asset_symbol: &str) -> Result<Option<MarketTick>, SinkError>;
}

/// Fire-and-forget publication of serialized ticks
#[async_trait]
pub trait TickPublisher: Send + Sync {
    /// Send one serialized tick, keyed by asset symbol
    async fn publish(&self, key: &str, payload: &[u8]) -> Result<(), SinkError>;
}

/// Handles to the three sinks, shared across cycles
#[derive(Clone)]
pub struct Sinks {
    pub store: Arc<dyn TickStore>,
    pub cache: Arc<dyn TickCache>,
    pub publisher: Arc<dyn TickPublisher>,
}

impl Sinks {
    pub fn new(
        store: Arc<dyn TickStore>,
        cache: Arc<dyn TickCache>,
        publisher: Arc<dyn TickPublisher>,
    ) -> Self {
        Self {
            store,
            cache,
            publisher,
        }
    }
}
