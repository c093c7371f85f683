//! CLI interface for market-collector
//!
//! Provides subcommands for:
//! - `run`: Poll on the configured interval until interrupted
//! - `once`: Run a single collection cycle
//! - `latest`: Show the cached latest tick for an asset
//! - `config`: Show the effective configuration

mod latest;
mod once;
mod run;

pub use latest::LatestArgs;
pub use once::OnceArgs;
pub use run::RunArgs;

use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;

#[derive(Parser, Debug)]
#[command(name = "market-collector")]
#[command(about = "Polls spot quotes and fans ticks out to Postgres, Redis and Kafka")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to configuration file
    #[arg(short, long, default_value = "collector.toml")]
    pub config: String,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Poll until SIGINT/SIGTERM
    Run(RunArgs),
    /// Run one collection cycle and exit
    Once(OnceArgs),
    /// Show the cached latest tick for an asset
    Latest(LatestArgs),
    /// Show the effective configuration
    Config,
}

/// Token cancelled on the first SIGINT or SIGTERM
pub fn shutdown_token() -> CancellationToken {
    let token = CancellationToken::new();
    let trigger = token.clone();

    tokio::spawn(async move {
        wait_for_signal().await;
        tracing::info!("Received shutdown signal");
        trigger.cancel();
    });

    token
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{signal, SignalKind};

    match signal(SignalKind::terminate()) {
        Ok(mut sigterm) => {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {}
                _ = sigterm.recv() => {}
            }
        }
        Err(e) => {
            tracing::warn!(error = %e, "SIGTERM handler unavailable, listening for Ctrl-C only");
            let _ = tokio::signal::ctrl_c().await;
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    let _ = tokio::signal::ctrl_c().await;
}
