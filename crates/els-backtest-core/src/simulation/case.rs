use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::{Rate, Ratio};

/// How a simulated note ended: called at observation `n` (1-based) or held
/// to maturity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RedemptionStep {
    Early(u32),
    Matured,
}

impl RedemptionStep {
    pub fn step(self) -> Option<u32> {
        match self {
            RedemptionStep::Early(n) => Some(n),
            RedemptionStep::Matured => None,
        }
    }

    pub fn is_early(self) -> bool {
        matches!(self, RedemptionStep::Early(_))
    }
}

impl std::fmt::Display for RedemptionStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RedemptionStep::Early(n) => write!(f, "early #{n}"),
            RedemptionStep::Matured => write!(f, "matured"),
        }
    }
}

/// Normalised path of one underlying (1.0 = issuance fixing).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetPath {
    pub name: String,
    pub path: Vec<Ratio>,
}

/// Day-by-day record of one simulated note, for explaining a single case.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathDetail {
    pub dates: Vec<NaiveDate>,
    pub worst_of: Vec<Ratio>,
    pub asset_paths: Vec<AssetPath>,
    pub knock_in_level: Ratio,
    pub knock_in_touched: bool,
    /// First date the worst-of closed below the barrier, when the breach counts
    pub first_breach_date: Option<NaiveDate>,
    pub redemption_date: NaiveDate,
    pub redemption_step: RedemptionStep,
}

impl PathDetail {
    /// Lowest worst-of level over the recorded window.
    pub fn lowest_worst_of(&self) -> Option<Ratio> {
        self.worst_of.iter().copied().min()
    }
}

/// Outcome of one simulated issuance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationCase {
    pub issuance_date: NaiveDate,
    /// Calendar year of issuance, used for year-grouped statistics
    pub year: i32,
    pub net_return: Rate,
    pub knock_in_touched: bool,
    pub redemption_step: RedemptionStep,
    pub redemption_date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path_detail: Option<PathDetail>,
}

impl SimulationCase {
    pub fn is_loss(&self) -> bool {
        self.net_return < Decimal::ZERO
    }

    /// Touched the barrier yet returned at least principal.
    pub fn recovered_from_knock_in(&self) -> bool {
        self.knock_in_touched && !self.is_loss()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_redemption_step_serde() {
        assert_eq!(
            serde_json::to_string(&RedemptionStep::Early(3)).unwrap(),
            r#"{"early":3}"#
        );
        assert_eq!(
            serde_json::to_string(&RedemptionStep::Matured).unwrap(),
            r#""matured""#
        );
        assert_eq!(RedemptionStep::Early(2).step(), Some(2));
        assert_eq!(RedemptionStep::Matured.step(), None);
    }

    #[test]
    fn test_early_steps_sort_before_matured() {
        let mut steps = vec![
            RedemptionStep::Matured,
            RedemptionStep::Early(2),
            RedemptionStep::Early(1),
        ];
        steps.sort();
        assert_eq!(
            steps,
            vec![
                RedemptionStep::Early(1),
                RedemptionStep::Early(2),
                RedemptionStep::Matured
            ]
        );
    }

    #[test]
    fn test_loss_and_recovery_flags() {
        let date = NaiveDate::from_ymd_opt(2020, 1, 2).unwrap();
        let mut case = SimulationCase {
            issuance_date: date,
            year: 2020,
            net_return: dec!(0.0),
            knock_in_touched: true,
            redemption_step: RedemptionStep::Matured,
            redemption_date: date,
            path_detail: None,
        };
        assert!(!case.is_loss());
        assert!(case.recovered_from_knock_in());

        case.net_return = dec!(-0.35);
        assert!(case.is_loss());
        assert!(!case.recovered_from_knock_in());
    }
}
