use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::info;

use crate::backtest::{NoProgress, ProgressObserver, RollingBacktest, SkipCounts};
use crate::market::{PriceHistorySummary, PriceSeries};
use crate::product::ProductSpec;
use crate::simulation::SimulationCase;
use crate::statistics::{summarize, BacktestStatistics};
use crate::types::{with_metadata, ComputationOutput};
use crate::ElsBacktestResult;

/// Input for a full rolling backtest with summary statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktestInput {
    pub product: ProductSpec,
    pub prices: PriceSeries,
    /// Return every per-issuance case alongside the statistics
    #[serde(default)]
    pub include_cases: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktestReport {
    pub product_terms: String,
    pub history: PriceHistorySummary,
    pub statistics: BacktestStatistics,
    pub skipped: SkipCounts,
    pub scan_stopped_at: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cases: Option<Vec<SimulationCase>>,
}

/// Run the rolling backtest over the whole history and summarise it.
pub fn run_backtest_report(
    input: &BacktestInput,
) -> ElsBacktestResult<ComputationOutput<BacktestReport>> {
    run_backtest_report_with_progress(input, &mut NoProgress)
}

pub fn run_backtest_report_with_progress(
    input: &BacktestInput,
    observer: &mut dyn ProgressObserver,
) -> ElsBacktestResult<ComputationOutput<BacktestReport>> {
    let start = Instant::now();
    input.product.validate()?;

    let result =
        RollingBacktest::new(&input.prices, &input.product).run_with_progress(observer)?;
    let statistics = summarize(&result)?;

    let mut warnings = Vec::new();
    let skipped = result.skipped;
    if skipped.insufficient_window > 0 {
        warnings.push(format!(
            "{} issuance dates skipped: window shorter than {} trading days",
            skipped.insufficient_window,
            crate::backtest::MIN_WINDOW_OBSERVATIONS
        ));
    }
    if skipped.maturity_before_issuance > 0 {
        warnings.push(format!(
            "{} issuance dates skipped: maturity snapped before issuance",
            skipped.maturity_before_issuance
        ));
    }
    if skipped.simulation_failed > 0 {
        warnings.push(format!(
            "{} issuance dates skipped: simulation failed",
            skipped.simulation_failed
        ));
    }
    if let Some(date) = result.scan_stopped_at {
        warnings.push(format!(
            "issuance scan stopped at {date}: maturity falls after the last trading date"
        ));
    }
    if statistics.case_count < 30 {
        warnings.push(format!(
            "only {} cases; statistics are not representative",
            statistics.case_count
        ));
    }

    info!(
        cases = statistics.case_count,
        success_rate = %statistics.success_rate,
        "backtest report ready"
    );

    let assumptions = serde_json::json!({
        "product": input.product,
        "assets": input.prices.asset_names(),
        "business_day_convention": "following",
        "day_count": "actual/365.25",
        "issuance": "every trading date whose maturity fits the history",
    });

    let report = BacktestReport {
        product_terms: input.product.to_string(),
        history: input.prices.summary(),
        statistics,
        skipped,
        scan_stopped_at: result.scan_stopped_at,
        cases: input.include_cases.then_some(result.cases),
    };

    Ok(with_metadata(
        "Rolling historical backtest of a worst-of step-down autocallable with knock-in",
        &assumptions,
        warnings,
        start.elapsed().as_micros() as u64,
        report,
    ))
}
