pub mod schedule;
pub mod trading_days;

pub use schedule::{add_months, observation_count, observation_schedule, ObservationDate};
pub use trading_days::{check_trading_dates, snap, snap_index, SnapOutcome};
