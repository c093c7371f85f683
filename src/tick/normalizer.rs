//! Tick normalizer

use super::{MarketTick, Quote, SOURCE_KEY};
use chrono::{DateTime, Utc};

/// Build the canonical tick for one fetched quote
///
/// The source provides no intracycle OHLC, so the fetched price is copied into
/// open, high, low and close. Extra quote metadata is kept in `raw_json`; the
/// provenance tag always wins over a source field of the same name.
pub fn normalize(
    asset_id: &str,
    quote: Quote,
    captured_at: DateTime<Utc>,
    source_tag: &str,
) -> MarketTick {
    let Quote {
        price,
        volume,
        metadata,
    } = quote;

    let mut raw_json = metadata;
    raw_json.insert(SOURCE_KEY.to_string(), source_tag.into());

    MarketTick {
        asset_symbol: asset_id.trim().to_string(),
        timestamp: captured_at,
        open: price,
        high: price,
        low: price,
        close: price,
        volume,
        source: source_tag.to_string(),
        raw_json,
    }
}
