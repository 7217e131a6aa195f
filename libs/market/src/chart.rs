use std::path::{Path, PathBuf};

use anyhow::{Context, Error, Result, ensure};
use charming::{
    Chart, ImageFormat, ImageRenderer,
    component::{Axis, Legend, Title},
    element::{AxisLabel, AxisType, LineStyle, SplitLine, Symbol, TextStyle},
    series::Line,
};

use crate::model::{EmaSeries, PriceSeries};

pub const WIDTH: u32 = 1200;
pub const HEIGHT: u32 = 700;

const DATE_FORMAT: &str = "%Y-%m-%d";

pub trait ChartRenderer {
    fn render(&self, label: &str, prices: &PriceSeries, ema: &EmaSeries) -> Result<Vec<u8>>;
}

#[derive(Debug, Clone, Copy)]
pub struct CharmingRenderer {
    pub width: u32,
    pub height: u32,
}

impl Default for CharmingRenderer {
    fn default() -> Self {
        Self {
            width: WIDTH,
            height: HEIGHT,
        }
    }
}

impl ChartRenderer for CharmingRenderer {
    fn render(&self, label: &str, prices: &PriceSeries, ema: &EmaSeries) -> Result<Vec<u8>> {
        let chart = build_chart(label, prices, ema)?;
        let mut renderer = ImageRenderer::new(self.width, self.height);
        let png_bytes = renderer.render_format(ImageFormat::Png, &chart)?;
        Ok(png_bytes)
    }
}

pub fn build_chart(label: &str, prices: &PriceSeries, ema: &EmaSeries) -> Result<Chart, Error> {
    ensure!(!prices.is_empty(), "prices is empty");
    ensure!(
        prices.len() == ema.fast.len() && prices.len() == ema.slow.len(),
        "length mismatch: prices={}, fast={}, slow={}",
        prices.len(),
        ema.fast.len(),
        ema.slow.len()
    );

    let last_price = prices.last_price().unwrap_or_default();

    let chart = Chart::new()
        .background_color("#0b0c17")
        .title(
            Title::new()
                .text(format!("{} | ${:.2}", label.to_uppercase(), last_price))
                .left("center")
                .top("2%")
                .text_style(TextStyle::new().color("#ffffff").font_size(14)),
        )
        .legend(Legend::new().top("7%"))
        .x_axis(
            Axis::new()
                .type_(AxisType::Category)
                .name("Date")
                .data(prices.date_labels(DATE_FORMAT))
                .axis_label(AxisLabel::new().rotate(45).color("#a0a0a0"))
                .split_line(SplitLine::new().line_style(LineStyle::new().color("#2d2f45"))),
        )
        .y_axis(
            Axis::new()
                .type_(AxisType::Value)
                .name("Price (USD)")
                .scale(true)
                .axis_label(AxisLabel::new().color("#a0a0a0"))
                .split_line(SplitLine::new().line_style(LineStyle::new().color("#2d2f45"))),
        )
        .series(
            Line::new()
                .name("Price")
                .data(prices.prices())
                .symbol(Symbol::None)
                .line_style(LineStyle::new().width(2).color("#a0a0a0")),
        )
        .series(
            Line::new()
                .name(format!("EMA{}", ema.fast_span))
                .data(ema.fast.clone())
                .symbol(Symbol::None)
                .line_style(LineStyle::new().width(1).color("#0064FF")),
        )
        .series(
            Line::new()
                .name(format!("EMA{}", ema.slow_span))
                .data(ema.slow.clone())
                .symbol(Symbol::None)
                .line_style(LineStyle::new().width(1).color("#FF6400")),
        );

    Ok(chart)
}

pub fn chart_path(dir: &Path, label: &str) -> PathBuf {
    dir.join(format!("{label}_chart.png"))
}

pub fn save_chart(dir: &Path, label: &str, bytes: &[u8]) -> Result<PathBuf> {
    let path = chart_path(dir, label);
    std::fs::write(&path, bytes).with_context(|| format!("writing {}", path.display()))?;
    Ok(path)
}
