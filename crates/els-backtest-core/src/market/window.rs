use chrono::NaiveDate;

use super::price_series::{AssetSeries, PriceSeries};
use crate::types::Price;

/// Contiguous slice of a price history, from an issuance date through a
/// maturity date inclusive. Keeps a handle on the full series so dates
/// outside the window can still be snapped against the whole calendar.
#[derive(Debug, Clone, Copy)]
pub struct PriceWindow<'a> {
    series: &'a PriceSeries,
    start: usize,
    end: usize,
}

impl<'a> PriceWindow<'a> {
    pub(crate) fn new(series: &'a PriceSeries, start: usize, end: usize) -> Self {
        PriceWindow { series, start, end }
    }

    /// Full trading calendar of the underlying series.
    pub fn calendar(&self) -> &'a [NaiveDate] {
        self.series.dates()
    }

    pub fn dates(&self) -> &'a [NaiveDate] {
        &self.series.dates()[self.start..=self.end]
    }

    pub fn len(&self) -> usize {
        self.end - self.start + 1
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn first_date(&self) -> NaiveDate {
        self.series.dates()[self.start]
    }

    pub fn last_date(&self) -> NaiveDate {
        self.series.dates()[self.end]
    }

    pub fn asset_count(&self) -> usize {
        self.series.assets().len()
    }

    pub fn asset_name(&self, asset: usize) -> &'a str {
        &self.series.assets()[asset].name
    }

    pub fn asset_prices(&self, asset: usize) -> &'a [Price] {
        &self.series.assets()[asset].prices[self.start..=self.end]
    }

    pub fn assets(&self) -> impl Iterator<Item = (&'a str, &'a [Price])> + 'a {
        let (start, end) = (self.start, self.end);
        self.series
            .assets()
            .iter()
            .map(move |a: &'a AssetSeries| (a.name.as_str(), &a.prices[start..=end]))
    }

    /// Position within the window of a full-calendar index, if covered.
    pub fn offset_of(&self, calendar_index: usize) -> Option<usize> {
        if calendar_index < self.start || calendar_index > self.end {
            return None;
        }
        Some(calendar_index - self.start)
    }
}
