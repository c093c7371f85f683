use clap::Parser;
use market_collector::cli::{Cli, Commands};
use market_collector::config::Config;
use std::path::Path;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration; a missing file means defaults
    let mut config = if Path::new(&cli.config).exists() {
        Config::load(&cli.config)?
    } else {
        eprintln!("Warning: {} not found, using default configuration", cli.config);
        Config::default()
    };
    config.apply_env()?;
    config.validate()?;

    // Initialize telemetry
    let _telemetry = market_collector::telemetry::init_telemetry(&config.telemetry)?;

    match cli.command {
        Commands::Run(args) => {
            tracing::info!("Starting collector");
            args.execute(&config).await?;
        }
        Commands::Once(args) => {
            tracing::info!(dry_run = args.dry_run, "Running single collection cycle");
            args.execute(&config).await?;
        }
        Commands::Latest(args) => {
            args.execute(&config).await?;
        }
        Commands::Config => {
            println!("Current configuration:");
            print!("{}", toml::to_string_pretty(&config)?);
        }
    }

    Ok(())
}
