pub mod backtest;
pub mod calendar;
pub mod error;
pub mod market;
pub mod product;
pub mod simulation;
pub mod types;

#[cfg(feature = "statistics")]
pub mod report;
#[cfg(feature = "statistics")]
pub mod statistics;

pub use error::ElsBacktestError;
pub use types::*;

/// Standard result type for all ELS backtest operations
pub type ElsBacktestResult<T> = Result<T, ElsBacktestError>;
