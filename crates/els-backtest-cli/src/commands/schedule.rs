use chrono::NaiveDate;
use clap::Args;
use serde::Serialize;
use serde_json::Value;
use std::time::Instant;

use els_backtest_core::calendar::{add_months, snap, SnapOutcome};
use els_backtest_core::types::Ratio;
use els_backtest_core::with_metadata;

use super::PriceArgs;
use crate::input::product::ProductArgs;

/// Arguments for printing an observation schedule
#[derive(Args)]
pub struct ScheduleArgs {
    /// Issuance date
    #[arg(long)]
    pub issuance: NaiveDate,

    #[command(flatten)]
    pub prices: PriceArgs,

    #[command(flatten)]
    pub product: ProductArgs,
}

#[derive(Debug, Serialize)]
struct ScheduleRow {
    step: u32,
    scheduled: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    snapped: Option<SnapOutcome>,
    early_level: Ratio,
}

#[derive(Debug, Serialize)]
struct Schedule {
    issuance_date: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    snapped_issuance: Option<SnapOutcome>,
    maturity_date: Option<NaiveDate>,
    observations: Vec<ScheduleRow>,
}

pub fn run_schedule(args: ScheduleArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let start = Instant::now();
    let product = args.product.resolve()?;
    let prices = args.prices.load()?;
    let calendar = prices.as_ref().map(|p| p.dates());
    let snap_on = |date| calendar.map(|dates| snap(dates, date));

    let observations: Vec<ScheduleRow> = product
        .schedule(args.issuance)
        .into_iter()
        .zip(&product.early_levels)
        .enumerate()
        .map(|(i, (scheduled, level))| ScheduleRow {
            step: i as u32 + 1,
            scheduled,
            snapped: snap_on(scheduled),
            early_level: *level,
        })
        .collect();

    let mut warnings = Vec::new();
    if calendar.is_none() {
        warnings.push("no --prices given; dates are not adjusted to trading days".to_string());
    } else if observations
        .iter()
        .any(|o| matches!(o.snapped, Some(SnapOutcome::NotFound)))
    {
        warnings.push("some observations fall after the last trading date".to_string());
    }

    let schedule = Schedule {
        issuance_date: args.issuance,
        snapped_issuance: snap_on(args.issuance),
        maturity_date: add_months(args.issuance, product.maturity_months),
        observations,
    };
    let assumptions = serde_json::json!({
        "product": product.to_string(),
        "business_day_convention": "following",
    });

    let output = with_metadata(
        "Calendar-month observation schedule with month-end clamping",
        &assumptions,
        warnings,
        start.elapsed().as_micros() as u64,
        schedule,
    );
    Ok(serde_json::to_value(output)?)
}
