//! CoinGecko simple-price client
//!
//! Issues `GET /simple/price?ids=<asset>&vs_currencies=<ccy>&include_24hr_vol=true`
//! and reads `<asset>.<ccy>` and `<asset>.<ccy>_24h_vol` from the keyed response.

use super::{FetchError, PriceSource};
use crate::tick::{Quote, TickMetadata};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;

/// CoinGecko public API base URL
pub const COINGECKO_API_URL: &str = "https://api.coingecko.com/api/v3";

/// Configuration for the CoinGecko client
#[derive(Debug, Clone)]
pub struct CoinGeckoConfig {
    /// Base URL for the API
    pub base_url: String,
    /// Fiat reference currency (e.g., "usd")
    pub vs_currency: String,
    /// Request timeout, the deadline for every fetch
    pub timeout: Duration,
    /// Provenance tag for ticks built from this source
    pub source_tag: String,
}

impl Default for CoinGeckoConfig {
    fn default() -> Self {
        Self {
            base_url: COINGECKO_API_URL.to_string(),
            vs_currency: "usd".to_string(),
            timeout: Duration::from_secs(15),
            source_tag: "coingecko".to_string(),
        }
    }
}

/// Client for CoinGecko's simple-price endpoint
pub struct CoinGeckoClient {
    config: CoinGeckoConfig,
    client: Client,
}

impl CoinGeckoClient {
    /// Create a client around an existing HTTP client
    pub fn new(config: CoinGeckoConfig, client: Client) -> Self {
        Self { config, client }
    }

    /// Create a client owning a fresh HTTP client with the configured timeout
    pub fn with_config(config: CoinGeckoConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self::new(config, client))
    }

    fn price_url(&self) -> String {
        format!("{}/simple/price", self.config.base_url.trim_end_matches('/'))
    }

    fn volume_key(&self) -> String {
        format!("{}_24h_vol", self.config.vs_currency)
    }

    /// Extract the quote for `asset_id` from a decoded response body
    fn parse_quote(&self, asset_id: &str, body: Value) -> Result<Quote, FetchError> {
        let mut by_asset: HashMap<String, HashMap<String, Value>> = serde_json::from_value(body)
            .map_err(|e| FetchError::Decode {
                asset: asset_id.to_string(),
                reason: e.to_string(),
            })?;

        let mut fields = by_asset
            .remove(asset_id)
            .ok_or_else(|| FetchError::MissingAsset {
                asset: asset_id.to_string(),
            })?;

        let price = fields
            .remove(&self.config.vs_currency)
            .as_ref()
            .and_then(Value::as_f64)
            .ok_or_else(|| FetchError::MissingPrice {
                asset: asset_id.to_string(),
            })?;

        // Volume is best-effort
        let volume = fields
            .remove(&self.volume_key())
            .as_ref()
            .and_then(Value::as_f64)
            .unwrap_or(0.0);

        let metadata: TickMetadata = fields.into_iter().collect();

        Ok(Quote {
            price,
            volume,
            metadata,
        })
    }
}

#[async_trait]
impl PriceSource for CoinGeckoClient {
    async fn fetch(&self, asset_id: &str) -> Result<Quote, FetchError> {
        let url = self.price_url();

        tracing::debug!(asset = asset_id, url = %url, "Fetching quote");

        let response = self
            .client
            .get(&url)
            .query(&[
                ("ids", asset_id),
                ("vs_currencies", self.config.vs_currency.as_str()),
                ("include_24hr_vol", "true"),
            ])
            .send()
            .await
            .map_err(|e| FetchError::Transport {
                asset: asset_id.to_string(),
                source: e,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                asset: asset_id.to_string(),
                status,
            });
        }

        let body: Value = response.json().await.map_err(|e| FetchError::Decode {
            asset: asset_id.to_string(),
            reason: e.to_string(),
        })?;

        self.parse_quote(asset_id, body)
    }

    fn source_tag(&self) -> &str {
        &self.config.source_tag
    }
}
