pub mod autocall;
pub mod case;

pub use autocall::{simulate_case, worst_of_series, DAYS_PER_YEAR};
pub use case::{AssetPath, PathDetail, RedemptionStep, SimulationCase};
