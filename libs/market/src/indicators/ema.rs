use anyhow::{Result, anyhow, ensure};
use ta::Next;
use ta::indicators::ExponentialMovingAverage;

use crate::model::{EmaSeries, PriceSeries};

/// Exponential moving average seeded with the first price,
/// `alpha = 2 / (span + 1)`.
pub fn ema(prices: &[f64], span: usize) -> Result<Vec<f64>> {
    ensure!(!prices.is_empty(), "prices is empty");

    let mut indicator = ExponentialMovingAverage::new(span)
        .map_err(|e| anyhow!("invalid EMA span {span}: {e:?}"))?;

    Ok(prices.iter().map(|&x| indicator.next(x)).collect())
}

impl EmaSeries {
    pub fn compute(series: &PriceSeries, fast_span: usize, slow_span: usize) -> Result<Self> {
        let prices = series.prices();

        Ok(Self {
            fast_span,
            slow_span,
            fast: ema(&prices, fast_span)?,
            slow: ema(&prices, slow_span)?,
        })
    }
}
