use std::future::Future;
use std::time::Duration;

use anyhow::{Context, Error, Result, bail};
use chrono::DateTime;
use reqwest::{Client, Method, StatusCode};
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::model::{PricePoint, PriceSeries};

pub const DEFAULT_BASE_API: &str = "https://api.coingecko.com/api/v3";

#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: StatusCode,
    pub body: String,
}

pub trait Transport {
    fn get(&self, url: &str, query: &[(&str, &str)]) -> impl Future<Output = Result<RawResponse>>;
}

impl Transport for Client {
    async fn get(&self, url: &str, query: &[(&str, &str)]) -> Result<RawResponse> {
        let res = self.request(Method::GET, url).query(query).send().await?;
        let status = res.status();
        let body = res.text().await?;
        Ok(RawResponse { status, body })
    }
}

pub trait PriceSource {
    /// Empty on any failure; the reason is logged.
    fn fetch(&self, asset_id: &str) -> impl Future<Output = PriceSeries>;
}

#[derive(Debug, Clone)]
pub struct PriceQuery {
    pub vs_currency: String,
    pub days: u32,
    pub interval: String,
}

impl Default for PriceQuery {
    fn default() -> Self {
        Self {
            vs_currency: "usd".to_string(),
            days: 7,
            interval: "daily".to_string(),
        }
    }
}

#[derive(Clone)]
pub struct PriceClient<T = Client> {
    transport: T,
    base_api: String,
    query: PriceQuery,
    rate_limit_delay: Duration,
}

impl PriceClient<Client> {
    pub fn new(base_api: String, query: PriceQuery, rate_limit_delay: Duration) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("charts/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self::with_transport(client, base_api, query, rate_limit_delay))
    }
}

impl<T: Transport> PriceClient<T> {
    pub fn with_transport(
        transport: T,
        base_api: String,
        query: PriceQuery,
        rate_limit_delay: Duration,
    ) -> Self {
        Self {
            transport,
            base_api,
            query,
            rate_limit_delay,
        }
    }

    /// Retries once after `rate_limit_delay` on 429.
    pub async fn try_fetch(&self, asset_id: &str) -> Result<PriceSeries, Error> {
        let url = format!(
            "{}/coins/{}/market_chart",
            self.base_api.trim_end_matches('/'),
            asset_id
        );
        let days = self.query.days.to_string();
        let query = [
            ("vs_currency", self.query.vs_currency.as_str()),
            ("days", days.as_str()),
            ("interval", self.query.interval.as_str()),
        ];

        let mut res = self.transport.get(&url, &query).await?;

        if res.status == StatusCode::TOO_MANY_REQUESTS {
            warn!(
                asset = asset_id,
                delay_secs = self.rate_limit_delay.as_secs_f64(),
                "rate limited, retrying once"
            );
            tokio::time::sleep(self.rate_limit_delay).await;
            res = self.transport.get(&url, &query).await?;

            if res.status == StatusCode::TOO_MANY_REQUESTS {
                bail!("still rate limited after retry");
            }
        }

        parse_market_chart(res)
    }
}

impl<T: Transport> PriceSource for PriceClient<T> {
    async fn fetch(&self, asset_id: &str) -> PriceSeries {
        match self.try_fetch(asset_id).await {
            Ok(series) => {
                info!(asset = asset_id, points = series.len(), "fetched prices");
                series
            }
            Err(e) => {
                warn!(asset = asset_id, error = %format!("{e:#}"), "fetch failed");
                PriceSeries::empty()
            }
        }
    }
}

//
// Match CoinGecko /coins/{id}/market_chart JSON
// https://docs.coingecko.com/reference/coins-id-market-chart
//
#[derive(Debug, Deserialize)]
struct MarketChartResponse {
    prices: Option<Vec<(f64, Option<f64>)>>,
}

fn parse_market_chart(res: RawResponse) -> Result<PriceSeries> {
    if !res.status.is_success() {
        bail!("provider returned {}", res.status);
    }

    let chart: MarketChartResponse =
        serde_json::from_str(&res.body).context("malformed market chart body")?;

    let Some(prices) = chart.prices else {
        bail!("no 'prices' field in response");
    };

    let total = prices.len();
    let series = PriceSeries::new(prices.into_iter().filter_map(|(ms, price)| {
        let timestamp = DateTime::from_timestamp_millis(ms as i64)?;
        Some(PricePoint {
            timestamp,
            price: price?,
        })
    }));

    if series.len() < total {
        debug!(total, kept = series.len(), "discarded unusable points");
    }

    Ok(series)
}
