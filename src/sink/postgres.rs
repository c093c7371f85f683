//! Postgres tick store
//!
//! Append-only `market_data` table, one row per tick. Writes go through a
//! small connection pool so a dropped connection is replaced on the next
//! append instead of failing every write after it.

use super::{SinkError, TickStore};
use crate::tick::MarketTick;
use async_trait::async_trait;
use deadpool_postgres::{Manager, ManagerConfig, Pool, RecyclingMethod};
use tokio_postgres::types::Json;
use tokio_postgres::NoTls;

/// Table receiving every tick
pub const MARKET_DATA_TABLE: &str = "market_data";

const CREATE_TABLE_SQL: &str = r#"
    CREATE TABLE IF NOT EXISTS market_data (
        asset_symbol TEXT NOT NULL,
        timestamp TIMESTAMPTZ NOT NULL,
        open DOUBLE PRECISION NOT NULL,
        high DOUBLE PRECISION NOT NULL,
        low DOUBLE PRECISION NOT NULL,
        close DOUBLE PRECISION NOT NULL,
        volume DOUBLE PRECISION NOT NULL,
        source TEXT NOT NULL,
        raw_json JSONB NOT NULL DEFAULT '{}'::jsonb
    );
    CREATE INDEX IF NOT EXISTS market_data_asset_ts_idx
        ON market_data (asset_symbol, timestamp DESC);
"#;

const INSERT_TICK_SQL: &str = r#"
    INSERT INTO market_data (asset_symbol, timestamp, open, high, low, close, volume, source, raw_json)
    VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
"#;

/// Build a lazily-connecting pool for `url`
///
/// Closed connections are discarded when checked out, so the pool heals
/// after a server restart.
pub fn build_pool(url: &str, max_size: usize) -> Result<Pool, SinkError> {
    let pg_config: tokio_postgres::Config = url.parse()?;
    let manager = Manager::from_config(
        pg_config,
        NoTls,
        ManagerConfig {
            recycling_method: RecyclingMethod::Fast,
        },
    );
    let pool = Pool::builder(manager).max_size(max_size.max(1)).build()?;
    Ok(pool)
}

/// Tick store backed by a Postgres connection pool
pub struct PostgresStore {
    pool: Pool,
}

impl PostgresStore {
    /// Build the pool, open a first connection and make sure the table exists
    pub async fn connect(url: &str, pool_size: usize) -> Result<Self, SinkError> {
        let store = Self {
            pool: build_pool(url, pool_size)?,
        };
        store.ensure_schema().await?;

        tracing::info!(table = MARKET_DATA_TABLE, pool_size, "Postgres store ready");
        Ok(store)
    }

    /// Create the tick table if it does not exist
    pub async fn ensure_schema(&self) -> Result<(), SinkError> {
        let client = self.pool.get().await?;
        client.batch_execute(CREATE_TABLE_SQL).await?;
        Ok(())
    }
}

#[async_trait]
impl TickStore for PostgresStore {
    async fn append(&self, tick: &MarketTick) -> Result<(), SinkError> {
        let client = self.pool.get().await?;
        let statement = client.prepare_cached(INSERT_TICK_SQL).await?;
        client
            .execute(
                &statement,
                &[
                    &tick.asset_symbol,
                    &tick.timestamp,
                    &tick.open,
                    &tick.high,
                    &tick.low,
                    &tick.close,
                    &tick.volume,
                    &tick.source,
                    &Json(&tick.raw_json),
                ],
            )
            .await?;
        Ok(())
    }
}
