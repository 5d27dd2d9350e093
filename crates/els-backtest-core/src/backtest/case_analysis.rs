use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use super::driver::{BacktestResult, RollingBacktest, MIN_WINDOW_OBSERVATIONS};
use crate::calendar::{add_months, snap_index, ObservationDate};
use crate::error::ElsBacktestError;
use crate::market::PriceSeries;
use crate::product::ProductSpec;
use crate::simulation::{simulate_case, SimulationCase};
use crate::types::{with_metadata, ComputationOutput, Ratio};
use crate::ElsBacktestResult;

/// Which issuance to pull out of a backtest for a closer look.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CasePick {
    First,
    WorstLoss,
    FirstKnockIn,
    Date(NaiveDate),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaseAnalysis {
    pub requested_date: NaiveDate,
    pub issuance_date: NaiveDate,
    /// The requested date was not a trading day
    pub rolled_forward: bool,
    pub scheduled_maturity: NaiveDate,
    pub maturity_date: NaiveDate,
    pub observations: Vec<ObservationDate>,
    pub lowest_worst_of: Ratio,
    pub knock_in_recovered: bool,
    pub case: SimulationCase,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaseAnalysisInput {
    pub product: ProductSpec,
    pub prices: PriceSeries,
    pub pick: CasePick,
}

/// Issuance date for `pick` within a finished backtest.
pub fn resolve_pick(result: &BacktestResult, pick: CasePick) -> ElsBacktestResult<NaiveDate> {
    let case = match pick {
        CasePick::Date(date) => return Ok(date),
        CasePick::First => result
            .first_case()
            .ok_or_else(|| ElsBacktestError::NoValidCases("backtest has no cases".into()))?,
        CasePick::WorstLoss => result.worst_loss_case().ok_or_else(|| {
            ElsBacktestError::InsufficientData("no case finished with a loss".into())
        })?,
        CasePick::FirstKnockIn => result.first_knock_in_case().ok_or_else(|| {
            ElsBacktestError::InsufficientData("no case touched the knock-in barrier".into())
        })?,
    };
    Ok(case.issuance_date)
}

/// Simulate the note issued on `requested_date` (rolled forward to a trading
/// day) with its full day-by-day path.
pub fn analyze_case(
    prices: &PriceSeries,
    product: &ProductSpec,
    requested_date: NaiveDate,
) -> ElsBacktestResult<CaseAnalysis> {
    let dates = prices.dates();
    let out_of_range = |date| ElsBacktestError::DateOutOfRange {
        date,
        last_available: prices.last_date(),
    };

    let start = snap_index(dates, requested_date).ok_or_else(|| out_of_range(requested_date))?;
    let issuance_date = dates[start];
    let scheduled_maturity = add_months(issuance_date, product.maturity_months)
        .ok_or_else(|| out_of_range(issuance_date))?;
    let end = snap_index(dates, scheduled_maturity).ok_or_else(|| out_of_range(scheduled_maturity))?;

    let window = prices.window(start, end);
    let case = simulate_case(&window, product, issuance_date, true)?;
    let lowest_worst_of = case
        .path_detail
        .as_ref()
        .and_then(|d| d.lowest_worst_of())
        .ok_or_else(|| ElsBacktestError::InsufficientData("empty price window".into()))?;

    Ok(CaseAnalysis {
        requested_date,
        issuance_date,
        rolled_forward: issuance_date != requested_date,
        scheduled_maturity,
        maturity_date: dates[end],
        observations: ObservationDate::resolve(dates, &product.schedule(issuance_date)),
        lowest_worst_of,
        knock_in_recovered: case.recovered_from_knock_in(),
        case,
    })
}

/// Single-case analysis wrapped in the standard output envelope.
pub fn analyze_case_report(
    input: &CaseAnalysisInput,
) -> ElsBacktestResult<ComputationOutput<CaseAnalysis>> {
    let start = Instant::now();
    input.product.validate()?;

    let requested = match input.pick {
        CasePick::Date(date) => date,
        pick => {
            let result = RollingBacktest::new(&input.prices, &input.product).run()?;
            resolve_pick(&result, pick)?
        }
    };
    let analysis = analyze_case(&input.prices, &input.product, requested)?;

    let mut warnings = Vec::new();
    if analysis.rolled_forward {
        warnings.push(format!(
            "{} is not a trading day; analysed the next trading day {}",
            analysis.requested_date, analysis.issuance_date
        ));
    }
    let window_len = analysis
        .case
        .path_detail
        .as_ref()
        .map_or(0, |d| d.dates.len());
    if window_len < MIN_WINDOW_OBSERVATIONS {
        warnings.push(format!(
            "window holds only {window_len} trading days; a rolling backtest would skip this date"
        ));
    }

    let assumptions = serde_json::json!({
        "product": input.product.to_string(),
        "assets": input.prices.asset_names(),
        "pick": input.pick,
        "business_day_convention": "following",
    });

    Ok(with_metadata(
        "Step-down autocall replay of one historical issuance with worst-of path detail",
        &assumptions,
        warnings,
        start.elapsed().as_micros() as u64,
        analysis,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulation::RedemptionStep;
    use chrono::{Datelike, Weekday};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn series() -> PriceSeries {
        let dates: Vec<NaiveDate> = d(2021, 1, 4)
            .iter_days()
            .take_while(|x| *x <= d(2022, 6, 30))
            .filter(|x| !matches!(x.weekday(), Weekday::Sat | Weekday::Sun))
            .collect();
        // Slide 1% per month from the start of 2021
        let prices = dates
            .iter()
            .map(|x| {
                let months = (x.year() - 2021) * 12 + x.month0() as i32;
                dec!(100) - Decimal::from(months)
            })
            .collect();
        PriceSeries::single("HSI", dates, prices).unwrap()
    }

    fn product() -> ProductSpec {
        ProductSpec {
            maturity_months: 12,
            obs_interval_months: 6,
            early_levels: vec![dec!(0.97), dec!(0.95)],
            coupon_annual: dec!(0.05),
            knock_in: dec!(0.50),
        }
    }

    #[test]
    fn test_weekend_request_rolls_forward() {
        let analysis = analyze_case(&series(), &product(), d(2021, 2, 6)).unwrap();
        assert!(analysis.rolled_forward);
        assert_eq!(analysis.issuance_date, d(2021, 2, 8));
        assert_eq!(analysis.scheduled_maturity, d(2022, 2, 8));
        assert_eq!(analysis.maturity_date, d(2022, 2, 8));
        assert_eq!(analysis.observations.len(), 2);
        assert!(analysis.case.path_detail.is_some());
    }

    #[test]
    fn test_sliding_market_matures_without_knock_in() {
        let analysis = analyze_case(&series(), &product(), d(2021, 1, 4)).unwrap();
        assert_eq!(analysis.case.redemption_step, RedemptionStep::Matured);
        assert!(!analysis.case.knock_in_touched);
        assert_eq!(analysis.case.net_return, dec!(0.05));
        assert_eq!(analysis.lowest_worst_of, dec!(0.88));
        assert!(!analysis.knock_in_recovered);
    }

    #[test]
    fn test_maturity_beyond_history_is_out_of_range() {
        let result = analyze_case(&series(), &product(), d(2021, 12, 1));
        assert!(matches!(
            result,
            Err(ElsBacktestError::DateOutOfRange { date, .. }) if date == d(2022, 12, 1)
        ));
        assert!(analyze_case(&series(), &product(), d(2023, 1, 1)).is_err());
    }

    #[test]
    fn test_report_resolves_pick() {
        let input = CaseAnalysisInput {
            product: product(),
            prices: series(),
            pick: CasePick::First,
        };
        let out = analyze_case_report(&input).unwrap();
        assert_eq!(out.result.issuance_date, d(2021, 1, 4));
        assert!(out.warnings.is_empty());

        let no_loss = CaseAnalysisInput {
            pick: CasePick::WorstLoss,
            ..input
        };
        assert!(matches!(
            analyze_case_report(&no_loss),
            Err(ElsBacktestError::InsufficientData(_))
        ));
    }
}
