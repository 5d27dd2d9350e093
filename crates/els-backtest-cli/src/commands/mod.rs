pub mod backtest;
pub mod case;
pub mod schedule;

use clap::Args;
use els_backtest_core::market::PriceSeries;

use crate::input::csv_prices;

/// Closing price history loaded from CSV.
#[derive(Args, Debug, Default)]
pub struct PriceArgs {
    /// CSV of closing prices: `date,<asset>,...` with ISO dates
    #[arg(long)]
    pub prices: Option<String>,

    /// Assets to use, comma separated, in worst-of order (default: all columns)
    #[arg(long, value_delimiter = ',')]
    pub assets: Option<Vec<String>>,

    /// Restrict the history to its last N years
    #[arg(long)]
    pub lookback_years: Option<u32>,
}

impl PriceArgs {
    pub fn load(&self) -> Result<Option<PriceSeries>, Box<dyn std::error::Error>> {
        let Some(path) = self.prices.as_deref() else {
            return Ok(None);
        };
        let series = csv_prices::load_prices(path, self.assets.as_deref())?;
        let series = csv_prices::apply_lookback(series, self.lookback_years)?;
        tracing::debug!(
            path,
            days = series.len(),
            from = %series.first_date(),
            to = %series.last_date(),
            "loaded price history"
        );
        Ok(Some(series))
    }
}
