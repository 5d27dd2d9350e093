pub mod price_series;
pub mod window;

pub use price_series::{AssetSeries, AssetSummary, PriceHistorySummary, PriceSeries};
pub use window::PriceWindow;
