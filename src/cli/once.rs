//! Once command implementation

use crate::app::App;
use crate::collector::{AssetStatus, Collector, CycleReport};
use crate::config::Config;
use crate::sink::{MemoryCache, MemoryPublisher, MemoryStore, Sinks};
use crate::source::CoinGeckoClient;
use clap::Args;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

#[derive(Args, Debug)]
pub struct OnceArgs {
    /// Fetch live quotes but keep ticks in memory and print them
    #[arg(long)]
    pub dry_run: bool,
}

impl OnceArgs {
    pub async fn execute(&self, config: &Config) -> anyhow::Result<()> {
        let cancel = super::shutdown_token();
        if self.dry_run {
            dry_run(config, &cancel).await?;
            return Ok(());
        }

        let app = App::connect(config).await?;
        let report = app.collector().run_cycle(&cancel).await;
        print_report(&report);
        app.close();
        Ok(())
    }
}

/// One cycle against live quotes with in-memory sinks
async fn dry_run(config: &Config, cancel: &CancellationToken) -> anyhow::Result<CycleReport> {
    let source = Arc::new(CoinGeckoClient::with_config(
        config.source.to_client_config(),
    )?);
    let store = Arc::new(MemoryStore::new());
    let sinks = Sinks::new(
        store.clone(),
        Arc::new(MemoryCache::new()),
        Arc::new(MemoryPublisher::new()),
    );

    let collector = Collector::new(&config.collector.assets, source, sinks)
        .with_concurrency(config.collector.concurrency);
    let report = collector.run_cycle(cancel).await;

    for tick in store.ticks().await {
        println!("{}", serde_json::to_string(&tick)?);
    }
    print_report(&report);
    Ok(report)
}

fn print_report(report: &CycleReport) {
    println!("Cycle at {}", report.captured_at.to_rfc3339());
    for outcome in &report.outcomes {
        match &outcome.status {
            AssetStatus::Cancelled => println!("  {}: cancelled", outcome.asset),
            AssetStatus::FetchFailed(reason) => {
                println!("  {}: fetch failed ({})", outcome.asset, reason)
            }
            AssetStatus::Aborted(reason) => {
                println!("  {}: aborted ({})", outcome.asset, reason)
            }
            AssetStatus::Delivered {
                store,
                cache,
                publish,
            } => println!(
                "  {}: store={:?} cache={:?} publish={:?}",
                outcome.asset, store, cache, publish
            ),
        }
    }
    println!(
        "  {} of {} assets produced ticks",
        report.ticks_produced(),
        report.attempted()
    );
}
