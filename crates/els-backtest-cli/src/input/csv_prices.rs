use chrono::{Months, NaiveDate};
use els_backtest_core::market::{AssetSeries, PriceSeries};
use rust_decimal::Decimal;
use std::io::Read;
use std::str::FromStr;

use super::file;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Load a `date,<asset>,...` closing price file.
///
/// Blank cells carry the previous close forward. Leading rows where any
/// selected asset has not started trading yet are dropped.
pub fn load_prices(
    path: &str,
    assets: Option<&[String]>,
) -> Result<PriceSeries, Box<dyn std::error::Error>> {
    let (canonical, contents) = file::read_to_string(path)?;
    parse_prices(contents.as_bytes(), assets)
        .map_err(|e| format!("Failed to load prices from '{}': {}", canonical.display(), e).into())
}

pub fn parse_prices<R: Read>(
    reader: R,
    assets: Option<&[String]>,
) -> Result<PriceSeries, Box<dyn std::error::Error>> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let headers = rdr.headers()?.clone();
    if headers.len() < 2 {
        return Err("expected a date column followed by at least one asset column".into());
    }

    let columns: Vec<(usize, String)> = match assets {
        Some(wanted) => wanted
            .iter()
            .map(|name| {
                headers
                    .iter()
                    .position(|h| h == name)
                    .filter(|&i| i > 0)
                    .map(|i| (i, name.clone()))
                    .ok_or_else(|| format!("asset '{name}' not found in header"))
            })
            .collect::<Result<_, _>>()?,
        None => headers
            .iter()
            .enumerate()
            .skip(1)
            .map(|(i, h)| (i, h.to_string()))
            .collect(),
    };

    let mut rows: Vec<(NaiveDate, Vec<Option<Decimal>>)> = Vec::new();
    for (line, record) in rdr.records().enumerate() {
        let record = record?;
        let raw_date = record.get(0).unwrap_or_default();
        let date = NaiveDate::parse_from_str(raw_date, DATE_FORMAT)
            .map_err(|e| format!("row {}: bad date '{raw_date}': {e}", line + 2))?;
        let cells = columns
            .iter()
            .map(|(i, name)| match record.get(*i).unwrap_or_default() {
                "" => Ok(None),
                cell => Decimal::from_str(cell)
                    .map(Some)
                    .map_err(|e| format!("row {}: bad {name} price '{cell}': {e}", line + 2)),
            })
            .collect::<Result<Vec<_>, _>>()?;
        rows.push((date, cells));
    }
    rows.sort_by_key(|(date, _)| *date);

    let mut last: Vec<Option<Decimal>> = vec![None; columns.len()];
    let mut dates = Vec::with_capacity(rows.len());
    let mut prices: Vec<Vec<Decimal>> = vec![Vec::with_capacity(rows.len()); columns.len()];
    for (date, cells) in rows {
        for (slot, cell) in last.iter_mut().zip(cells) {
            if cell.is_some() {
                *slot = cell;
            }
        }
        let filled: Option<Vec<Decimal>> = last.iter().copied().collect();
        if let Some(filled) = filled {
            dates.push(date);
            for (series, price) in prices.iter_mut().zip(filled) {
                series.push(price);
            }
        }
    }

    let assets = columns
        .into_iter()
        .zip(prices)
        .map(|((_, name), prices)| AssetSeries { name, prices })
        .collect();
    Ok(PriceSeries::new(dates, assets)?)
}

/// Keep only the last `years` years of history.
pub fn apply_lookback(
    series: PriceSeries,
    years: Option<u32>,
) -> Result<PriceSeries, Box<dyn std::error::Error>> {
    let Some(years) = years else {
        return Ok(series);
    };
    let from = years
        .checked_mul(12)
        .and_then(|months| series.last_date().checked_sub_months(Months::new(months)))
        .ok_or("lookback reaches before the supported date range")?;
    if from <= series.first_date() {
        return Ok(series);
    }
    Ok(series.since(from)?)
}
