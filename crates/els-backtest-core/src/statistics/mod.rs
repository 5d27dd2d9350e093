pub mod descriptive;
pub mod summary;
pub mod yearly;

pub use summary::{summarize, BacktestStatistics, RedemptionBucket};
pub use yearly::{yearly_breakdown, YearlyStatistics};
