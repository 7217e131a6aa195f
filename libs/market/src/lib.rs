mod ledger;
mod model;
mod price_client;
mod publisher;

pub mod chart;
pub mod indicators;

pub use chart::{CharmingRenderer, ChartRenderer};
pub use ledger::Ledger;
pub use model::{Asset, EmaSeries, PricePoint, PriceSeries, PublishedChart};
pub use price_client::{PriceClient, PriceQuery, PriceSource, RawResponse, Transport};
pub use publisher::{ImageHost, ImgurClient, Upload};

pub mod defaults {
    pub use crate::ledger::DEFAULT_PATH as LEDGER_PATH;
    pub use crate::price_client::DEFAULT_BASE_API as COINGECKO_API;
    pub use crate::publisher::DEFAULT_IMGUR_API as IMGUR_API;
}
