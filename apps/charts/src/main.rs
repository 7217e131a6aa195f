use anyhow::Result;
use charts::{
    Cli, Command,
    config::Config,
    pipeline::{self, RunSettings},
};
use clap::Parser;
use market::{CharmingRenderer, ImgurClient, Ledger, PriceClient};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let config = Config::from_env()?;

    let imgur = ImgurClient::new(config.imgur_api.clone(), &config.imgur_client_id)?;

    match cli.command.unwrap_or(Command::Run) {
        Command::Delete { delete_hash } => imgur.delete(&delete_hash).await?,
        Command::Run => {
            let price_client = PriceClient::new(
                config.coingecko_api.clone(),
                config.query.clone(),
                config.rate_limit_delay,
            )?;
            let ledger = Ledger::new(&config.ledger_path);
            let settings = RunSettings {
                fast_span: config.fast_span,
                slow_span: config.slow_span,
                pacing: config.pacing,
                chart_dir: config.chart_dir.clone(),
            };

            let summary = pipeline::run(
                &config.assets,
                &price_client,
                &CharmingRenderer::default(),
                &imgur,
                &ledger,
                &settings,
            )
            .await;

            for chart in &summary.published {
                info!(asset = %chart.label, url = %chart.url, delete_hash = ?chart.delete_hash, "latest chart");
            }
        }
    }

    Ok(())
}
