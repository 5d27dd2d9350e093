pub mod driver;
pub mod progress;
pub mod run;

#[cfg(feature = "case_analysis")]
pub mod case_analysis;

pub use driver::{
    run_backtest, BacktestResult, CaseOutcome, RollingBacktest, SkipCounts, SkipReason,
    MIN_WINDOW_OBSERVATIONS,
};
pub use progress::{NoProgress, Progress, ProgressObserver, PROGRESS_INTERVAL};
pub use run::BacktestRun;
