use chrono::NaiveDate;
use napi::Result as NapiResult;
use napi_derive::napi;
use serde::Deserialize;

use els_backtest_core::backtest::BacktestResult;
use els_backtest_core::calendar::{check_trading_dates, ObservationDate};
use els_backtest_core::market::PriceSeries;
use els_backtest_core::product::ProductSpec;

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

// ---------------------------------------------------------------------------
// Backtest
// ---------------------------------------------------------------------------

#[napi]
pub fn run_backtest(input_json: String) -> NapiResult<String> {
    let input: els_backtest_core::report::BacktestInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output =
        els_backtest_core::report::run_backtest_report(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn analyze_case(input_json: String) -> NapiResult<String> {
    let input: els_backtest_core::backtest::case_analysis::CaseAnalysisInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = els_backtest_core::backtest::case_analysis::analyze_case_report(&input)
        .map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

/// Re-aggregate a previously returned set of cases.
#[napi]
pub fn summarize_results(result_json: String) -> NapiResult<String> {
    let result: BacktestResult = serde_json::from_str(&result_json).map_err(to_napi_error)?;
    let stats = els_backtest_core::statistics::summarize(&result).map_err(to_napi_error)?;
    serde_json::to_string(&stats).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Calendar and market data
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct ScheduleInput {
    product: ProductSpec,
    issuance_date: NaiveDate,
    /// Strictly increasing trading calendar to snap against; with none given
    /// every observation comes back `NotFound`
    #[serde(default)]
    trading_dates: Vec<NaiveDate>,
}

#[napi]
pub fn observation_schedule(input_json: String) -> NapiResult<String> {
    let input: ScheduleInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    input.product.validate().map_err(to_napi_error)?;
    check_trading_dates(&input.trading_dates).map_err(to_napi_error)?;
    let observations = ObservationDate::resolve(
        &input.trading_dates,
        &input.product.schedule(input.issuance_date),
    );
    serde_json::to_string(&observations).map_err(to_napi_error)
}

#[napi]
pub fn price_history_summary(prices_json: String) -> NapiResult<String> {
    let prices: PriceSeries = serde_json::from_str(&prices_json).map_err(to_napi_error)?;
    serde_json::to_string(&prices.summary()).map_err(to_napi_error)
}
