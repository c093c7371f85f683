//! Process wiring
//!
//! Opens the price source and all three sink connections once at startup.
//! Any failure here is fatal: the collector never runs degraded.

use crate::collector::{Collector, Scheduler};
use crate::config::Config;
use crate::sink::{KafkaPublisher, PostgresStore, RedisCache, SinkError, Sinks};
use crate::source::CoinGeckoClient;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

/// How long to wait for a broker when checking Kafka at startup
const KAFKA_PROBE_TIMEOUT: Duration = Duration::from_secs(5);
/// How long to wait for queued messages on shutdown
const KAFKA_FLUSH_TIMEOUT: Duration = Duration::from_secs(5);

/// Failure establishing a connection at startup
#[derive(Debug, Error)]
pub enum SetupError {
    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
    #[error("failed to connect to Postgres: {0}")]
    Store(#[source] SinkError),
    #[error("failed to connect to Redis: {0}")]
    Cache(#[from] redis::RedisError),
    #[error("failed to set up Kafka publisher: {0}")]
    Publisher(String),
}

impl From<rdkafka::error::KafkaError> for SetupError {
    fn from(e: rdkafka::error::KafkaError) -> Self {
        SetupError::Publisher(e.to_string())
    }
}

/// Long-lived connections plus the collector built on them
pub struct App {
    collector: Arc<Collector>,
    poll_interval: Duration,
    publisher: Arc<KafkaPublisher>,
}

impl App {
    /// Open every connection described by `config`
    pub async fn connect(config: &Config) -> Result<Self, SetupError> {
        let source = Arc::new(CoinGeckoClient::with_config(
            config.source.to_client_config(),
        )?);

        let store = PostgresStore::connect(&config.store.url, config.store.pool_size)
            .await
            .map_err(SetupError::Store)?;
        let store = Arc::new(store);
        let cache = Arc::new(RedisCache::connect(&config.cache.to_client_config()).await?);

        let publisher = Arc::new(KafkaPublisher::new(&config.publisher.to_client_config())?);
        publisher
            .verify(KAFKA_PROBE_TIMEOUT)
            .await
            .map_err(|e| SetupError::Publisher(e.to_string()))?;

        let sinks = Sinks::new(store, cache, publisher.clone());
        let collector = Collector::new(&config.collector.assets, source, sinks)
            .with_concurrency(config.collector.concurrency);

        Ok(Self {
            collector: Arc::new(collector),
            poll_interval: config.collector.poll_interval(),
            publisher,
        })
    }

    pub fn collector(&self) -> Arc<Collector> {
        Arc::clone(&self.collector)
    }

    /// Run cycles until `cancel` fires
    pub async fn run(&self, cancel: CancellationToken) -> u64 {
        Scheduler::new(self.collector(), self.poll_interval)
            .run(cancel)
            .await
    }

    /// Flush pending publishes and drop every connection
    pub fn close(self) {
        if let Err(e) = self.publisher.flush(KAFKA_FLUSH_TIMEOUT) {
            tracing::warn!(error = %e, "Kafka flush on shutdown failed");
        }
        tracing::info!("Connections released");
    }
}
