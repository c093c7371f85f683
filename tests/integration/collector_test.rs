//! End-to-end collection cycle scenarios

use crate::support::{Harness, RecordingSink, ScriptedSource};
use chrono::Utc;
use market_collector::collector::{AssetStatus, Collector, StepOutcome};
use market_collector::sink::{SinkKind, TickCache};
use std::sync::Arc;
use tokio_test::assert_ok;
use tokio_util::sync::CancellationToken;

fn quotes() -> ScriptedSource {
    ScriptedSource::new(&[("bitcoin", 50000.0, 1e9), ("ethereum", 3000.0, 5e8)])
}

#[tokio::test]
async fn test_two_assets_reach_every_sink() {
    let harness = Harness::new();
    let collector = Collector::new(["bitcoin", "ethereum"], Arc::new(quotes()), harness.sinks());

    let report = collector.run_cycle(&CancellationToken::new()).await;

    assert!(report.is_clean());
    assert_eq!(report.ticks_produced(), 2);

    for sink in [&harness.store, &harness.cache, &harness.publisher] {
        let ticks = sink.accepted().await;
        let symbols: Vec<&str> = ticks.iter().map(|t| t.asset_symbol.as_str()).collect();
        assert_eq!(symbols, vec!["bitcoin", "ethereum"]);
        assert_eq!(ticks[0].timestamp, ticks[1].timestamp);
        assert_eq!(ticks[0].timestamp, report.captured_at);
    }

    let stored = harness.store.accepted().await;
    assert_eq!(stored[0].close, 50000.0);
    assert_eq!(stored[0].volume, 1e9);
    assert_eq!(stored[1].close, 3000.0);
    assert_eq!(stored[1].volume, 5e8);
    for tick in &stored {
        assert_eq!(tick.open, tick.close);
        assert_eq!(tick.high, tick.close);
        assert_eq!(tick.low, tick.close);
        assert_eq!(tick.source, "coingecko");
    }
}

#[tokio::test]
async fn test_fetch_failure_isolated_to_one_asset() {
    let harness = Harness::new();
    let source = Arc::new(ScriptedSource::new(&[("bitcoin", 50000.0, 1e9)]));
    let collector = Collector::new(["bitcoin", "ethereum"], source.clone(), harness.sinks());

    let report = collector.run_cycle(&CancellationToken::new()).await;

    assert_eq!(source.calls().await, vec!["bitcoin", "ethereum"]);
    assert_eq!(report.ticks_produced(), 1);
    assert_eq!(report.fetch_failures(), 1);
    assert!(matches!(
        report.outcome("ethereum").map(|o| &o.status),
        Some(AssetStatus::FetchFailed(_))
    ));

    for sink in [&harness.store, &harness.cache, &harness.publisher] {
        assert_eq!(sink.attempts().await, vec!["bitcoin"]);
    }
}

#[tokio::test]
async fn test_failure_on_first_asset_does_not_stop_later_ones() {
    let harness = Harness::new();
    let source = Arc::new(ScriptedSource::new(&[
        ("ethereum", 3000.0, 5e8),
        ("solana", 100.0, 1e7),
    ]));
    let collector = Collector::new(["bitcoin", "ethereum", "solana"], source, harness.sinks());

    let report = collector.run_cycle(&CancellationToken::new()).await;

    assert_eq!(report.ticks_produced(), 2);
    assert_eq!(harness.store.attempts().await, vec!["ethereum", "solana"]);
}

#[tokio::test]
async fn test_store_failure_does_not_block_cache_or_publish() {
    let harness = Harness::with(
        RecordingSink::failing_for(SinkKind::Store, &["bitcoin"]),
        RecordingSink::new(SinkKind::Cache),
        RecordingSink::new(SinkKind::Publish),
    );
    let collector = Collector::new(["bitcoin", "ethereum"], Arc::new(quotes()), harness.sinks());

    let report = collector.run_cycle(&CancellationToken::new()).await;

    let bitcoin = report.outcome("bitcoin").unwrap();
    assert!(matches!(bitcoin.sink(SinkKind::Store), Some(StepOutcome::Failed(_))));
    assert_eq!(bitcoin.sink(SinkKind::Cache), Some(&StepOutcome::Succeeded));
    assert_eq!(bitcoin.sink(SinkKind::Publish), Some(&StepOutcome::Succeeded));

    let stored: Vec<String> = harness
        .store
        .accepted()
        .await
        .into_iter()
        .map(|t| t.asset_symbol)
        .collect();
    assert_eq!(stored, vec!["ethereum"]);

    assert!(assert_ok!(harness.cache.latest("bitcoin").await).is_some());
    let published = harness.publisher.accepted().await;
    assert!(published.iter().any(|t| t.asset_symbol == "bitcoin"));

    assert_eq!(report.sink_failures(SinkKind::Store), 1);
    assert_eq!(report.sink_successes(SinkKind::Store), 1);
    assert_eq!(report.sink_successes(SinkKind::Cache), 2);
    assert_eq!(report.sink_successes(SinkKind::Publish), 2);
}

#[tokio::test]
async fn test_every_sink_failing_still_completes_cycle() {
    let harness = Harness::with(
        RecordingSink::failing_for(SinkKind::Store, &["bitcoin", "ethereum"]),
        RecordingSink::failing_for(SinkKind::Cache, &["bitcoin", "ethereum"]),
        RecordingSink::failing_for(SinkKind::Publish, &["bitcoin", "ethereum"]),
    );
    let collector = Collector::new(["bitcoin", "ethereum"], Arc::new(quotes()), harness.sinks());

    let report = collector.run_cycle(&CancellationToken::new()).await;

    assert_eq!(report.ticks_produced(), 2);
    for kind in [SinkKind::Store, SinkKind::Cache, SinkKind::Publish] {
        assert_eq!(report.sink_failures(kind), 2);
    }
    // Every sink was still tried for every asset
    for sink in [&harness.store, &harness.cache, &harness.publisher] {
        assert_eq!(sink.attempts().await, vec!["bitcoin", "ethereum"]);
    }
}

#[tokio::test]
async fn test_whitespace_identifier_stored_trimmed() {
    let harness = Harness::new();
    let source = Arc::new(quotes());
    let collector = Collector::new([" bitcoin "], source.clone(), harness.sinks());

    collector.run_cycle(&CancellationToken::new()).await;

    assert_eq!(source.calls().await, vec!["bitcoin"]);
    assert_eq!(harness.store.accepted().await[0].asset_symbol, "bitcoin");
    assert!(harness.cache.latest("bitcoin").await.unwrap().is_some());
}

#[tokio::test]
async fn test_cache_holds_latest_after_two_cycles() {
    let harness = Harness::new();
    let collector = Collector::new(["bitcoin"], Arc::new(quotes()), harness.sinks());
    let cancel = CancellationToken::new();

    let first = Utc::now();
    let second = first + chrono::Duration::seconds(30);
    collector.run_cycle_at(first, &cancel).await;
    collector.run_cycle_at(second, &cancel).await;

    let latest = harness.cache.latest("bitcoin").await.unwrap().unwrap();
    assert_eq!(latest.timestamp, second);
    // The store keeps both; no dedup across cycles
    assert_eq!(harness.store.accepted().await.len(), 2);
}

#[tokio::test]
async fn test_cancelled_cycle_issues_no_work() {
    let harness = Harness::new();
    let source = Arc::new(quotes());
    let collector = Collector::new(["bitcoin", "ethereum"], source.clone(), harness.sinks());
    let cancel = CancellationToken::new();
    cancel.cancel();

    let report = collector.run_cycle(&cancel).await;

    assert_eq!(report.cancelled(), 2);
    assert!(source.calls().await.is_empty());
    assert!(harness.store.attempts().await.is_empty());
}
