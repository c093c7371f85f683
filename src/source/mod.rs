//! Price source module
//!
//! Fetches spot price and 24-hour volume for one asset per call

mod coingecko;

pub use coingecko::{CoinGeckoClient, CoinGeckoConfig, COINGECKO_API_URL};

use crate::tick::Quote;
use async_trait::async_trait;
use thiserror::Error;

/// Errors that cause an asset to be skipped for the current cycle
#[derive(Debug, Error)]
pub enum FetchError {
    /// Network or transport failure, including client timeouts
    #[error("quote request for {asset} failed: {source}")]
    Transport {
        asset: String,
        #[source]
        source: reqwest::Error,
    },
    /// Quote API answered with a non-success status
    #[error("quote API returned {status} for {asset}")]
    Status {
        asset: String,
        status: reqwest::StatusCode,
    },
    /// Response body is not the expected keyed object
    #[error("malformed quote response for {asset}: {reason}")]
    Decode { asset: String, reason: String },
    /// Requested asset absent from the response map
    #[error("{asset} missing from quote response")]
    MissingAsset { asset: String },
    /// Asset present but without a numeric price
    #[error("{asset} quote has no numeric price")]
    MissingPrice { asset: String },
}

impl FetchError {
    /// Asset identifier the failed fetch was for
    pub fn asset(&self) -> &str {
        match self {
            FetchError::Transport { asset, .. }
            | FetchError::Status { asset, .. }
            | FetchError::Decode { asset, .. }
            | FetchError::MissingAsset { asset }
            | FetchError::MissingPrice { asset } => asset,
        }
    }
}

/// Trait for price source implementations
#[async_trait]
pub trait PriceSource: Send + Sync {
    /// Fetch the current quote for one asset; a single attempt, no retries
    async fn fetch(&self, asset_id: &str) -> Result<Quote, FetchError>;

    /// Provenance tag stamped on every tick built from this source
    fn source_tag(&self) -> &str;
}
