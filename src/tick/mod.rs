//! Market tick model
//!
//! Canonical record produced once per (asset, cycle) and handed to every sink

mod normalizer;

pub use normalizer::normalize;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Key under which the provenance tag is always stored in `raw_json`
pub const SOURCE_KEY: &str = "source";

/// Source-specific metadata attached to a tick
pub type TickMetadata = BTreeMap<String, serde_json::Value>;

/// Spot quote as returned by a price source
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Quote {
    /// Last trade price in the reference currency
    pub price: f64,
    /// 24-hour trading volume, zero when the source omits it
    pub volume: f64,
    /// Any extra fields the source reported alongside price and volume
    pub metadata: TickMetadata,
}

impl Quote {
    /// Create a quote without extra metadata
    pub fn new(price: f64, volume: f64) -> Self {
        Self {
            price,
            volume,
            metadata: TickMetadata::new(),
        }
    }
}

/// One normalized price/volume record for one asset at one capture instant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketTick {
    /// Asset identifier, trimmed
    pub asset_symbol: String,
    /// Cycle capture time, shared by every tick of the cycle
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    /// 24-hour volume
    pub volume: f64,
    /// Provenance tag of the price source
    pub source: String,
    /// Open-ended metadata, always carries [`SOURCE_KEY`]
    pub raw_json: TickMetadata,
}

impl MarketTick {
    /// Last price; all four OHLC fields carry the same value
    pub fn price(&self) -> f64 {
        self.close
    }
}
