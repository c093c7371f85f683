//! Run command implementation

use super::shutdown_token;
use crate::app::App;
use crate::config::Config;
use clap::Args;

#[derive(Args, Debug)]
pub struct RunArgs {}

impl RunArgs {
    pub async fn execute(&self, config: &Config) -> anyhow::Result<()> {
        let app = App::connect(config).await?;
        let cancel = shutdown_token();

        app.run(cancel).await;
        app.close();
        Ok(())
    }
}
