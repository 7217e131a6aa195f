use chrono::{DateTime, Utc};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PricePoint {
    pub timestamp: DateTime<Utc>,
    pub price: f64,
}

// Timestamps strictly increasing, prices finite. Anything else is dropped on construction.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PriceSeries {
    points: Vec<PricePoint>,
}

impl PriceSeries {
    pub fn new(points: impl IntoIterator<Item = PricePoint>) -> Self {
        let mut kept: Vec<PricePoint> = Vec::new();

        for point in points {
            if !point.price.is_finite() {
                debug!(timestamp = %point.timestamp, "dropping non-finite price");
                continue;
            }
            if let Some(last) = kept.last()
                && point.timestamp <= last.timestamp
            {
                debug!(timestamp = %point.timestamp, "dropping out-of-order point");
                continue;
            }
            kept.push(point);
        }

        Self { points: kept }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn points(&self) -> &[PricePoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn prices(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.price).collect()
    }

    pub fn last_price(&self) -> Option<f64> {
        self.points.last().map(|p| p.price)
    }

    pub fn date_labels(&self, format: &str) -> Vec<String> {
        self.points
            .iter()
            .map(|p| p.timestamp.format(format).to_string())
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EmaSeries {
    pub fast_span: usize,
    pub slow_span: usize,
    pub fast: Vec<f64>,
    pub slow: Vec<f64>,
}

impl EmaSeries {
    pub fn len(&self) -> usize {
        self.fast.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fast.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Asset {
    pub label: String,
    pub id: String,
}

impl Asset {
    pub fn new(label: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            id: id.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishedChart {
    pub label: String,
    pub url: String,
    pub delete_hash: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(secs: i64, price: f64) -> PricePoint {
        PricePoint {
            timestamp: Utc.timestamp_opt(secs, 0).unwrap(),
            price,
        }
    }

    #[test]
    fn keeps_strictly_increasing_points() {
        let series = PriceSeries::new([at(1, 1.0), at(2, 2.0), at(2, 9.0), at(1, 9.0), at(3, 3.0)]);
        assert_eq!(series.prices(), vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn drops_non_finite_prices() {
        let series = PriceSeries::new([at(1, f64::NAN), at(2, 2.0), at(3, f64::INFINITY)]);
        assert_eq!(series.prices(), vec![2.0]);
        assert_eq!(series.last_price(), Some(2.0));
    }

    #[test]
    fn formats_date_labels() {
        let series = PriceSeries::new([at(0, 1.0), at(86_400, 2.0)]);
        assert_eq!(
            series.date_labels("%Y-%m-%d"),
            vec!["1970-01-01".to_string(), "1970-01-02".to_string()]
        );
    }
}
