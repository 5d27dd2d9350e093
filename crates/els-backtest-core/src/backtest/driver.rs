use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::progress::{NoProgress, Progress, ProgressObserver, PROGRESS_INTERVAL};
use crate::calendar::{add_months, snap_index};
use crate::error::ElsBacktestError;
use crate::market::PriceSeries;
use crate::product::step_down::{MAX_MATURITY_MONTHS, MIN_OBS_INTERVAL_MONTHS};
use crate::product::ProductSpec;
use crate::simulation::{simulate_case, RedemptionStep, SimulationCase};
use crate::ElsBacktestResult;

/// Fewest trading days a window may hold and still be simulated.
pub const MIN_WINDOW_OBSERVATIONS: usize = 10;

/// Why a candidate issuance date produced no case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    MaturityBeforeIssuance,
    InsufficientWindow,
    SimulationFailed,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::MaturityBeforeIssuance => write!(f, "maturity before issuance"),
            SkipReason::InsufficientWindow => {
                write!(f, "fewer than {MIN_WINDOW_OBSERVATIONS} trading days in window")
            }
            SkipReason::SimulationFailed => write!(f, "simulation failed"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum CaseOutcome {
    Simulated(SimulationCase),
    Skipped(SkipReason),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkipCounts {
    pub maturity_before_issuance: usize,
    pub insufficient_window: usize,
    pub simulation_failed: usize,
}

impl SkipCounts {
    fn record(&mut self, reason: SkipReason) {
        match reason {
            SkipReason::MaturityBeforeIssuance => self.maturity_before_issuance += 1,
            SkipReason::InsufficientWindow => self.insufficient_window += 1,
            SkipReason::SimulationFailed => self.simulation_failed += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.maturity_before_issuance + self.insufficient_window + self.simulation_failed
    }
}

/// Cases of one rolling backtest, in ascending issuance-date order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "BacktestResultData")]
pub struct BacktestResult {
    pub cases: Vec<SimulationCase>,
    /// Scheduled observations per note; sizes the redemption histogram
    pub observation_count: usize,
    pub skipped: SkipCounts,
    /// First issuance date whose maturity lies beyond the price history
    pub scan_stopped_at: Option<NaiveDate>,
}

/// Largest observation count a validated product can schedule.
const MAX_OBSERVATIONS: usize = (MAX_MATURITY_MONTHS / MIN_OBS_INTERVAL_MONTHS) as usize;

#[derive(Deserialize)]
struct BacktestResultData {
    cases: Vec<SimulationCase>,
    observation_count: usize,
    #[serde(default)]
    skipped: SkipCounts,
    #[serde(default)]
    scan_stopped_at: Option<NaiveDate>,
}

impl TryFrom<BacktestResultData> for BacktestResult {
    type Error = ElsBacktestError;

    fn try_from(data: BacktestResultData) -> Result<Self, Self::Error> {
        if data.observation_count > MAX_OBSERVATIONS {
            return Err(ElsBacktestError::InvalidInput {
                field: "observation_count".into(),
                reason: format!("must be at most {MAX_OBSERVATIONS}"),
            });
        }
        let result = BacktestResult {
            cases: data.cases,
            observation_count: data.observation_count,
            skipped: data.skipped,
            scan_stopped_at: data.scan_stopped_at,
        };
        result.check_consistency()?;
        Ok(result)
    }
}

impl BacktestResult {
    /// Early redemption steps lie in `1..=observation_count` and issuance
    /// dates are strictly increasing.
    pub fn check_consistency(&self) -> ElsBacktestResult<()> {
        let invalid = |reason: String| ElsBacktestError::InvalidInput {
            field: "cases".into(),
            reason,
        };
        for case in &self.cases {
            if let RedemptionStep::Early(step) = case.redemption_step {
                if step == 0 || step as usize > self.observation_count {
                    return Err(invalid(format!(
                        "case issued {} redeemed at step {step}, outside 1..={}",
                        case.issuance_date, self.observation_count
                    )));
                }
            }
        }
        if let Some(w) = self
            .cases
            .windows(2)
            .find(|w| w[1].issuance_date <= w[0].issuance_date)
        {
            return Err(invalid(format!(
                "issuance dates must be strictly increasing ({} followed by {})",
                w[0].issuance_date, w[1].issuance_date
            )));
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.cases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cases.is_empty()
    }

    pub fn first_case(&self) -> Option<&SimulationCase> {
        self.cases.first()
    }

    /// Lowest net return among losing cases; earliest issuance wins ties.
    pub fn worst_loss_case(&self) -> Option<&SimulationCase> {
        self.cases
            .iter()
            .filter(|c| c.is_loss())
            .fold(None, |worst: Option<&SimulationCase>, c| match worst {
                Some(w) if w.net_return <= c.net_return => Some(w),
                _ => Some(c),
            })
    }

    pub fn first_knock_in_case(&self) -> Option<&SimulationCase> {
        self.cases.iter().find(|c| c.knock_in_touched)
    }

    pub fn case_on(&self, issuance_date: NaiveDate) -> Option<&SimulationCase> {
        self.cases
            .binary_search_by_key(&issuance_date, |c| c.issuance_date)
            .ok()
            .map(|i| &self.cases[i])
    }
}

/// Rolls a note over every trading date of a price history.
#[derive(Debug, Clone, Copy)]
pub struct RollingBacktest<'a> {
    prices: &'a PriceSeries,
    product: &'a ProductSpec,
}

impl<'a> RollingBacktest<'a> {
    pub fn new(prices: &'a PriceSeries, product: &'a ProductSpec) -> Self {
        RollingBacktest { prices, product }
    }

    /// Trading-day index of the snapped maturity for the note issued at
    /// `issuance_index`, or `None` when maturity is past the last date.
    fn maturity_index(&self, issuance_index: usize) -> Option<usize> {
        let issuance = self.prices.dates()[issuance_index];
        let scheduled = add_months(issuance, self.product.maturity_months)?;
        snap_index(self.prices.dates(), scheduled)
    }

    /// Number of leading issuance dates whose maturity fits in the history.
    ///
    /// Maturity dates are monotonic in issuance date, so the first failure
    /// ends the candidate range.
    pub fn candidate_count(&self) -> usize {
        (0..self.prices.len())
            .position(|i| self.maturity_index(i).is_none())
            .unwrap_or(self.prices.len())
    }

    /// Simulate the note issued on trading day `issuance_index`.
    pub fn evaluate_issuance(&self, issuance_index: usize) -> CaseOutcome {
        let Some(maturity_index) = self.maturity_index(issuance_index) else {
            return CaseOutcome::Skipped(SkipReason::InsufficientWindow);
        };
        if maturity_index < issuance_index {
            return CaseOutcome::Skipped(SkipReason::MaturityBeforeIssuance);
        }
        if maturity_index - issuance_index + 1 < MIN_WINDOW_OBSERVATIONS {
            return CaseOutcome::Skipped(SkipReason::InsufficientWindow);
        }

        let window = self.prices.window(issuance_index, maturity_index);
        let issuance = window.first_date();
        match simulate_case(&window, self.product, issuance, false) {
            Ok(case) => CaseOutcome::Simulated(case),
            Err(e) => {
                debug!(%issuance, error = %e, "dropping case");
                CaseOutcome::Skipped(SkipReason::SimulationFailed)
            }
        }
    }

    pub fn run(&self) -> ElsBacktestResult<BacktestResult> {
        self.run_with_progress(&mut NoProgress)
    }

    /// Scan every candidate issuance date in ascending order.
    ///
    /// Fails up front with `StructureMismatch` for an inconsistent product,
    /// and with `NoValidCases` when no date yields a case. Anything that goes
    /// wrong for a single date only drops that date.
    pub fn run_with_progress(
        &self,
        observer: &mut dyn ProgressObserver,
    ) -> ElsBacktestResult<BacktestResult> {
        self.product.check_structure()?;

        let total = self.candidate_count();
        let scan_stopped_at = self.prices.dates().get(total).copied();
        let mut collector = CaseCollector::new(total, observer);

        #[cfg(feature = "parallel")]
        {
            use rayon::prelude::*;
            // Indexed collect keeps issuance order
            let outcomes: Vec<CaseOutcome> = (0..total)
                .into_par_iter()
                .map(|i| self.evaluate_issuance(i))
                .collect();
            for (i, outcome) in outcomes.into_iter().enumerate() {
                collector.push(self.prices.dates()[i], outcome);
            }
        }
        #[cfg(not(feature = "parallel"))]
        for i in 0..total {
            collector.push(self.prices.dates()[i], self.evaluate_issuance(i));
        }

        let (cases, skipped) = collector.finish();

        if cases.is_empty() {
            return Err(ElsBacktestError::NoValidCases(format!(
                "{} trading days from {} to {} cannot hold a full {}-month note",
                self.prices.len(),
                self.prices.first_date(),
                self.prices.last_date(),
                self.product.maturity_months
            )));
        }

        info!(
            cases = cases.len(),
            skipped = skipped.total(),
            stopped_at = ?scan_stopped_at,
            "backtest complete"
        );

        Ok(BacktestResult {
            cases,
            observation_count: self.product.observation_count(),
            skipped,
            scan_stopped_at,
        })
    }
}

/// Accumulates outcomes in order and drives progress notifications.
struct CaseCollector<'o> {
    total: usize,
    processed: usize,
    cases: Vec<SimulationCase>,
    skipped: SkipCounts,
    observer: &'o mut dyn ProgressObserver,
}

impl<'o> CaseCollector<'o> {
    fn new(total: usize, observer: &'o mut dyn ProgressObserver) -> Self {
        CaseCollector {
            total,
            processed: 0,
            cases: Vec::with_capacity(total),
            skipped: SkipCounts::default(),
            observer,
        }
    }

    fn push(&mut self, issuance: NaiveDate, outcome: CaseOutcome) {
        match outcome {
            CaseOutcome::Simulated(case) => self.cases.push(case),
            CaseOutcome::Skipped(reason) => {
                debug!(%issuance, %reason, "skipping issuance date");
                self.skipped.record(reason);
            }
        }
        self.processed += 1;
        if self.processed % PROGRESS_INTERVAL == 0 {
            self.observer.on_progress(Progress {
                processed: self.processed,
                total: self.total,
            });
        }
    }

    fn finish(self) -> (Vec<SimulationCase>, SkipCounts) {
        if self.processed % PROGRESS_INTERVAL != 0 || self.processed == 0 {
            self.observer.on_progress(Progress {
                processed: self.processed,
                total: self.total,
            });
        }
        (self.cases, self.skipped)
    }
}

/// Run a rolling backtest of `product` over `prices`.
pub fn run_backtest(
    prices: &PriceSeries,
    product: &ProductSpec,
) -> ElsBacktestResult<BacktestResult> {
    RollingBacktest::new(prices, product).run()
}
