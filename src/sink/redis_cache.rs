//! Redis latest-value cache
//!
//! One key per asset (`latest:<symbol>`) holding the JSON-encoded tick.

use super::{SinkError, TickCache};
use crate::tick::MarketTick;
use async_trait::async_trait;
use redis::aio::ConnectionManager;
use std::time::Duration;

/// Prefix for latest-tick keys
pub const LATEST_KEY_PREFIX: &str = "latest:";

/// Configuration for the Redis cache
#[derive(Debug, Clone)]
pub struct RedisCacheConfig {
    /// `host:port` or a full `redis://` URL
    pub addr: String,
    /// Key prefix, followed by the asset symbol
    pub key_prefix: String,
    /// Expiry applied on every write, none by default
    pub ttl: Option<Duration>,
}

impl Default for RedisCacheConfig {
    fn default() -> Self {
        Self {
            addr: "localhost:6379".to_string(),
            key_prefix: LATEST_KEY_PREFIX.to_string(),
            ttl: None,
        }
    }
}

impl RedisCacheConfig {
    /// Connection URL for the configured address
    pub fn url(&self) -> String {
        if self.addr.contains("://") {
            self.addr.clone()
        } else {
            format!("redis://{}", self.addr)
        }
    }
}

/// Latest-tick cache backed by a reconnecting Redis connection
pub struct RedisCache {
    conn: ConnectionManager,
    key_prefix: String,
    ttl: Option<Duration>,
}

impl RedisCache {
    /// Connect and PING once so an unreachable server fails at startup
    pub async fn connect(config: &RedisCacheConfig) -> Result<Self, redis::RedisError> {
        let client = redis::Client::open(config.url())?;
        let mut conn = ConnectionManager::new(client).await?;
        let _: String = redis::cmd("PING").query_async(&mut conn).await?;

        tracing::info!(addr = %config.addr, "Redis cache ready");

        Ok(Self {
            conn,
            key_prefix: config.key_prefix.clone(),
            ttl: config.ttl.filter(|ttl| ttl.as_secs() > 0),
        })
    }

    fn key_for(&self, asset_symbol: &str) -> String {
        latest_key(&self.key_prefix, asset_symbol)
    }
}

fn latest_key(prefix: &str, asset_symbol: &str) -> String {
    format!("{}{}", prefix, asset_symbol)
}

#[async_trait]
impl TickCache for RedisCache {
    async fn set_latest(&self, asset_symbol: &str, tick: &MarketTick) -> Result<(), SinkError> {
        let payload = serde_json::to_string(tick)?;

        let mut cmd = redis::cmd("SET");
        cmd.arg(self.key_for(asset_symbol)).arg(payload);
        if let Some(ttl) = self.ttl {
            cmd.arg("EX").arg(ttl.as_secs());
        }

        // ConnectionManager clones share one multiplexed connection
        let mut conn = self.conn.clone();
        cmd.query_async::<_, ()>(&mut conn).await?;
        Ok(())
    }

    async fn latest(&self, asset_symbol: &str) -> Result<Option<MarketTick>, SinkError> {
        let mut conn = self.conn.clone();
        let raw: Option<String> = redis::cmd("GET")
            .arg(self.key_for(asset_symbol))
            .query_async(&mut conn)
            .await?;

        let tick = raw.map(|s| serde_json::from_str(&s)).transpose()?;
        Ok(tick)
    }
}
