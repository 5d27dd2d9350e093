use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::window::PriceWindow;
use crate::calendar::{check_trading_dates, snap_index};
use crate::error::ElsBacktestError;
use crate::types::{Price, Rate};
use crate::ElsBacktestResult;

/// Closing prices of one underlying, aligned with the series' dates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetSeries {
    pub name: String,
    pub prices: Vec<Price>,
}

/// Aligned multi-asset price history.
///
/// Dates are unique and strictly increasing, every asset has exactly one
/// positive price per date and there is at least one asset. These hold for
/// any value of this type, including deserialised ones.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "PriceSeriesData")]
pub struct PriceSeries {
    dates: Vec<NaiveDate>,
    assets: Vec<AssetSeries>,
}

#[derive(Deserialize)]
struct PriceSeriesData {
    dates: Vec<NaiveDate>,
    assets: Vec<AssetSeries>,
}

impl TryFrom<PriceSeriesData> for PriceSeries {
    type Error = ElsBacktestError;

    fn try_from(data: PriceSeriesData) -> Result<Self, Self::Error> {
        PriceSeries::new(data.dates, data.assets)
    }
}

fn invalid(field: &str, reason: String) -> ElsBacktestError {
    ElsBacktestError::InvalidInput {
        field: field.into(),
        reason,
    }
}

impl PriceSeries {
    pub fn new(dates: Vec<NaiveDate>, assets: Vec<AssetSeries>) -> ElsBacktestResult<Self> {
        if dates.is_empty() {
            return Err(invalid("dates", "at least one trading date required".into()));
        }
        if assets.is_empty() {
            return Err(invalid("assets", "at least one asset required".into()));
        }
        check_trading_dates(&dates)?;
        for asset in &assets {
            if asset.prices.len() != dates.len() {
                return Err(invalid(
                    "prices",
                    format!(
                        "asset '{}' has {} prices for {} dates",
                        asset.name,
                        asset.prices.len(),
                        dates.len()
                    ),
                ));
            }
            if let Some(pos) = asset.prices.iter().position(|p| *p <= Decimal::ZERO) {
                return Err(invalid(
                    "prices",
                    format!(
                        "asset '{}' has non-positive price {} on {}",
                        asset.name, asset.prices[pos], dates[pos]
                    ),
                ));
            }
        }
        Ok(PriceSeries { dates, assets })
    }

    /// Convenience constructor for a single underlying.
    pub fn single(
        name: impl Into<String>,
        dates: Vec<NaiveDate>,
        prices: Vec<Price>,
    ) -> ElsBacktestResult<Self> {
        PriceSeries::new(
            dates,
            vec![AssetSeries {
                name: name.into(),
                prices,
            }],
        )
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn assets(&self) -> &[AssetSeries] {
        &self.assets
    }

    pub fn asset_names(&self) -> Vec<&str> {
        self.assets.iter().map(|a| a.name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    pub fn first_date(&self) -> NaiveDate {
        self.dates[0]
    }

    pub fn last_date(&self) -> NaiveDate {
        self.dates[self.dates.len() - 1]
    }

    /// View over trading days `start..=end` (indices into `dates()`).
    ///
    /// Indices are clamped to the series; `end < start` gives a one-day view
    /// at `start`.
    pub fn window(&self, start: usize, end: usize) -> PriceWindow<'_> {
        let last = self.dates.len() - 1;
        let start = start.min(last);
        PriceWindow::new(self, start, end.clamp(start, last))
    }

    /// History from the first trading date on or after `from`.
    pub fn since(&self, from: NaiveDate) -> ElsBacktestResult<PriceSeries> {
        let start = snap_index(&self.dates, from).ok_or(ElsBacktestError::DateOutOfRange {
            date: from,
            last_available: self.last_date(),
        })?;
        Ok(PriceSeries {
            dates: self.dates[start..].to_vec(),
            assets: self
                .assets
                .iter()
                .map(|a| AssetSeries {
                    name: a.name.clone(),
                    prices: a.prices[start..].to_vec(),
                })
                .collect(),
        })
    }

    /// First/last/high/low per asset over the whole history.
    pub fn summary(&self) -> PriceHistorySummary {
        let assets = self
            .assets
            .iter()
            .map(|a| {
                let first = a.prices[0];
                let last = a.prices[a.prices.len() - 1];
                let high = a.prices.iter().copied().fold(first, Decimal::max);
                let low = a.prices.iter().copied().fold(first, Decimal::min);
                AssetSummary {
                    name: a.name.clone(),
                    first,
                    last,
                    high,
                    low,
                    total_return: last / first - Decimal::ONE,
                }
            })
            .collect();
        PriceHistorySummary {
            start_date: self.first_date(),
            end_date: self.last_date(),
            trading_days: self.len(),
            assets,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetSummary {
    pub name: String,
    pub first: Price,
    pub last: Price,
    pub high: Price,
    pub low: Price,
    pub total_return: Rate,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceHistorySummary {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub trading_days: usize,
    pub assets: Vec<AssetSummary>,
}
