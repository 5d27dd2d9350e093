use super::driver::{BacktestResult, RollingBacktest};
use super::progress::{NoProgress, ProgressObserver};
use crate::market::PriceSeries;
use crate::product::ProductSpec;
use crate::ElsBacktestResult;

/// Everything one backtest run owns: the price snapshot, the product terms
/// and the resulting cases.
///
/// Built fresh for every run; a new run replaces the old value wholesale.
#[derive(Debug, Clone)]
pub struct BacktestRun {
    pub product: ProductSpec,
    pub prices: PriceSeries,
    pub result: BacktestResult,
}

impl BacktestRun {
    pub fn execute(prices: PriceSeries, product: ProductSpec) -> ElsBacktestResult<Self> {
        Self::execute_with_progress(prices, product, &mut NoProgress)
    }

    pub fn execute_with_progress(
        prices: PriceSeries,
        product: ProductSpec,
        observer: &mut dyn ProgressObserver,
    ) -> ElsBacktestResult<Self> {
        let result = RollingBacktest::new(&prices, &product).run_with_progress(observer)?;
        Ok(BacktestRun {
            product,
            prices,
            result,
        })
    }

    #[cfg(feature = "statistics")]
    pub fn statistics(&self) -> ElsBacktestResult<crate::statistics::BacktestStatistics> {
        crate::statistics::summarize(&self.result)
    }

    /// Re-simulate one issuance with its full path.
    #[cfg(feature = "case_analysis")]
    pub fn analyze(
        &self,
        pick: super::case_analysis::CasePick,
    ) -> ElsBacktestResult<super::case_analysis::CaseAnalysis> {
        let requested = super::case_analysis::resolve_pick(&self.result, pick)?;
        super::case_analysis::analyze_case(&self.prices, &self.product, requested)
    }
}
