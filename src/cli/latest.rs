//! Latest command implementation

use crate::config::Config;
use crate::sink::{RedisCache, TickCache};
use clap::Args;

#[derive(Args, Debug)]
pub struct LatestArgs {
    /// Asset identifier, as configured
    pub asset: String,
}

impl LatestArgs {
    pub async fn execute(&self, config: &Config) -> anyhow::Result<()> {
        let cache = RedisCache::connect(&config.cache.to_client_config()).await?;
        let asset = self.asset.trim();

        match cache.latest(asset).await? {
            Some(tick) => println!("{}", serde_json::to_string_pretty(&tick)?),
            None => println!("No cached tick for {}", asset),
        }
        Ok(())
    }
}
