use std::{env::var, path::PathBuf, str::FromStr, time::Duration};

use anyhow::{Context, Result, bail, ensure};
use market::{Asset, PriceQuery, defaults};

pub const DEFAULT_ASSETS: &str = "ETH=ethereum,AVAX=avalanche-2,XLM=stellar,ONDO=ondo-finance";

#[derive(Debug, Clone)]
pub struct Config {
    pub imgur_client_id: String,
    pub imgur_api: String,
    pub coingecko_api: String,
    pub query: PriceQuery,
    pub fast_span: usize,
    pub slow_span: usize,
    pub rate_limit_delay: Duration,
    pub pacing: Duration,
    pub chart_dir: PathBuf,
    pub ledger_path: PathBuf,
    pub assets: Vec<Asset>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let imgur_client_id = lookup("IMGUR_CLIENT_ID")
            .filter(|id| !id.trim().is_empty())
            .context("IMGUR_CLIENT_ID not set")?;

        let fast_span = parse(&lookup, "EMA_FAST_SPAN", 10)?;
        let slow_span = parse(&lookup, "EMA_SLOW_SPAN", 20)?;
        ensure!(
            fast_span > 0 && fast_span < slow_span,
            "EMA_FAST_SPAN ({fast_span}) must be positive and below EMA_SLOW_SPAN ({slow_span})"
        );

        Ok(Self {
            imgur_client_id,
            imgur_api: get("IMGUR_API_BASE_URL", defaults::IMGUR_API),
            coingecko_api: get("COINGECKO_API_BASE_URL", defaults::COINGECKO_API),
            query: PriceQuery {
                vs_currency: get("VS_CURRENCY", "usd"),
                days: parse(&lookup, "HISTORY_DAYS", 7)?,
                interval: get("HISTORY_INTERVAL", "daily"),
            },
            fast_span,
            slow_span,
            rate_limit_delay: Duration::from_secs(parse(&lookup, "RATE_LIMIT_DELAY_SECS", 10)?),
            pacing: Duration::from_secs(parse(&lookup, "REQUEST_PACING_SECS", 2)?),
            chart_dir: PathBuf::from(get("CHART_DIR", ".")),
            ledger_path: PathBuf::from(get("LEDGER_PATH", defaults::LEDGER_PATH)),
            assets: parse_assets(&get("CHART_ASSETS", DEFAULT_ASSETS))?,
        })
    }
}

fn parse<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{key} is not valid: {raw:?}")),
        None => Ok(default),
    }
}

/// Parse `LABEL=id,LABEL=id`.
pub fn parse_assets(raw: &str) -> Result<Vec<Asset>> {
    let mut assets = Vec::new();

    for item in raw.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        let Some((label, id)) = item.split_once('=') else {
            bail!("asset {item:?} is not LABEL=id");
        };
        let (label, id) = (label.trim(), id.trim());
        ensure!(!label.is_empty() && !id.is_empty(), "asset {item:?} is not LABEL=id");

        assets.push(Asset::new(label.to_uppercase(), id));
    }

    ensure!(!assets.is_empty(), "no assets configured");
    Ok(assets)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_apply() {
        let config = config(&[("IMGUR_CLIENT_ID", "abc")]).unwrap();

        assert_eq!(config.imgur_client_id, "abc");
        assert_eq!(config.query.vs_currency, "usd");
        assert_eq!(config.query.days, 7);
        assert_eq!(config.query.interval, "daily");
        assert_eq!((config.fast_span, config.slow_span), (10, 20));
        assert_eq!(config.rate_limit_delay, Duration::from_secs(10));
        assert_eq!(config.ledger_path, PathBuf::from("latest_chart_urls.txt"));

        let labels: Vec<_> = config.assets.iter().map(|a| a.label.as_str()).collect();
        assert_eq!(labels, ["ETH", "AVAX", "XLM", "ONDO"]);
        assert_eq!(config.assets[1].id, "avalanche-2");
    }

    #[test]
    fn missing_client_id_fails() {
        assert!(config(&[]).is_err());
        assert!(config(&[("IMGUR_CLIENT_ID", "  ")]).is_err());
    }

    #[test]
    fn rejects_bad_numbers_and_spans() {
        assert!(config(&[("IMGUR_CLIENT_ID", "abc"), ("HISTORY_DAYS", "week")]).is_err());
        assert!(config(&[("IMGUR_CLIENT_ID", "abc"), ("EMA_FAST_SPAN", "30")]).is_err());
        assert!(config(&[("IMGUR_CLIENT_ID", "abc"), ("EMA_FAST_SPAN", "0")]).is_err());
    }

    #[test]
    fn asset_override() {
        let config = config(&[("IMGUR_CLIENT_ID", "abc"), ("CHART_ASSETS", " btc=bitcoin , ")]).unwrap();
        assert_eq!(config.assets, vec![Asset::new("BTC", "bitcoin")]);
    }

    #[test]
    fn malformed_assets() {
        assert!(parse_assets("ETH").is_err());
        assert!(parse_assets("=ethereum").is_err());
        assert!(parse_assets(" , ").is_err());
    }
}
