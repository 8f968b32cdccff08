use anyhow::Result;
use clap::Parser;
use funding_arb_watcher::{cli, config::AppConfig, utils};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    utils::init_logging();

    let cli = cli::Cli::parse();
    let config = AppConfig::load()?;
    tracing::info!(
        sources = config.sources.len(),
        min_spread_apr = config.arbitrage.min_spread_apr,
        telegram = config.telegram.is_some(),
        "[INIT] funding-arb-watcher starting"
    );

    cli::run(cli, config).await
}
