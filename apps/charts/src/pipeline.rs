use std::{path::PathBuf, time::Duration};

use anyhow::{Context, Result};
use market::{
    Asset, ChartRenderer, EmaSeries, ImageHost, Ledger, PriceSource, PublishedChart, chart,
};
use tracing::{debug, info, instrument, warn};

#[derive(Debug, Clone)]
pub struct RunSettings {
    pub fast_span: usize,
    pub slow_span: usize,
    /// Pause between assets, not after the last one.
    pub pacing: Duration,
    pub chart_dir: PathBuf,
}

#[derive(Debug, Default)]
pub struct RunSummary {
    pub processed: usize,
    pub skipped: usize,
    pub failed: usize,
    pub published: Vec<PublishedChart>,
    /// Labels in the previous ledger that were not published this run.
    pub dropped: Vec<String>,
}

/// Fetch, chart and publish every asset in order, then rewrite the ledger
/// with what was published. Per-asset failures are logged and never abort the
/// run.
#[instrument(name = "run", skip_all, fields(assets = assets.len()))]
pub async fn run<P, R, H>(
    assets: &[Asset],
    source: &P,
    renderer: &R,
    host: &H,
    ledger: &Ledger,
    settings: &RunSettings,
) -> RunSummary
where
    P: PriceSource,
    R: ChartRenderer,
    H: ImageHost,
{
    let mut summary = RunSummary::default();

    let previous = ledger.read().unwrap_or_else(|e| {
        warn!(error = %format!("{e:#}"), "could not read previous ledger");
        Vec::new()
    });
    if let Err(e) = ledger.reset() {
        warn!(error = %format!("{e:#}"), "could not reset ledger");
    }

    for (i, asset) in assets.iter().enumerate() {
        if i > 0 && !settings.pacing.is_zero() {
            debug!(secs = settings.pacing.as_secs_f64(), "pacing");
            tokio::time::sleep(settings.pacing).await;
        }

        summary.processed += 1;
        info!(asset = %asset.label, id = %asset.id, "processing");

        match process_asset(asset, source, renderer, host, settings).await {
            Ok(Some(published)) => {
                info!(asset = %asset.label, url = %published.url, "published chart");
                if let Err(e) = ledger.append(&published) {
                    warn!(asset = %asset.label, error = %format!("{e:#}"), "ledger append failed");
                }
                summary.published.push(published);
            }
            Ok(None) => {
                warn!(asset = %asset.label, "no price data, skipping");
                summary.skipped += 1;
            }
            Err(e) => {
                warn!(asset = %asset.label, error = %format!("{e:#}"), "failed to chart or publish");
                summary.failed += 1;
            }
        }
    }

    if let Err(e) = ledger.write_all(&summary.published) {
        warn!(error = %format!("{e:#}"), "could not write ledger");
    }

    summary.dropped = previous
        .into_iter()
        .map(|entry| entry.label)
        .filter(|label| !summary.published.iter().any(|p| &p.label == label))
        .collect();
    if !summary.dropped.is_empty() {
        warn!(dropped = ?summary.dropped, "assets no longer in ledger");
    }

    info!(
        processed = summary.processed,
        published = summary.published.len(),
        skipped = summary.skipped,
        failed = summary.failed,
        ledger = %ledger.path().display(),
        "run complete"
    );

    summary
}

async fn process_asset<P, R, H>(
    asset: &Asset,
    source: &P,
    renderer: &R,
    host: &H,
    settings: &RunSettings,
) -> Result<Option<PublishedChart>>
where
    P: PriceSource,
    R: ChartRenderer,
    H: ImageHost,
{
    let prices = source.fetch(&asset.id).await;
    if prices.is_empty() {
        return Ok(None);
    }

    let ema = EmaSeries::compute(&prices, settings.fast_span, settings.slow_span)?;

    debug!(asset = %asset.label, "rendering chart");
    let image = renderer
        .render(&asset.label, &prices, &ema)
        .context("rendering chart")?;

    match chart::save_chart(&settings.chart_dir, &asset.label, &image) {
        Ok(path) => debug!(path = %path.display(), bytes = image.len(), "saved chart"),
        Err(e) => warn!(asset = %asset.label, error = %format!("{e:#}"), "could not save chart"),
    }

    let file_name = format!("{}_chart.png", asset.label);
    let upload = host.upload(&file_name, image).await.context("uploading chart")?;

    Ok(Some(PublishedChart {
        label: asset.label.clone(),
        url: upload.link,
        delete_hash: upload.delete_hash,
    }))
}
