use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::calendar::{observation_count, observation_schedule};
use crate::error::ElsBacktestError;
use crate::types::{Rate, Ratio};
use crate::ElsBacktestResult;

pub const MIN_MATURITY_MONTHS: u32 = 6;
pub const MAX_MATURITY_MONTHS: u32 = 60;
pub const MIN_OBS_INTERVAL_MONTHS: u32 = 1;
pub const MAX_OBS_INTERVAL_MONTHS: u32 = 12;

/// Terms of a step-down autocallable note with a knock-in barrier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductSpec {
    /// Tenor in calendar months
    pub maturity_months: u32,
    /// Months between early redemption observations
    pub obs_interval_months: u32,
    /// Worst-of trigger per observation, as a fraction of the issuance fixing
    pub early_levels: Vec<Ratio>,
    /// Annual coupon paid pro rata on redemption
    pub coupon_annual: Rate,
    /// Knock-in barrier as a fraction of the issuance fixing
    pub knock_in: Ratio,
}

impl Default for ProductSpec {
    /// 3-year note, semi-annual observations stepping 95 down to 70,
    /// 8% coupon, 40% knock-in.
    fn default() -> Self {
        ProductSpec {
            maturity_months: 36,
            obs_interval_months: 6,
            early_levels: vec![
                dec!(0.95),
                dec!(0.90),
                dec!(0.85),
                dec!(0.80),
                dec!(0.75),
                dec!(0.70),
            ],
            coupon_annual: dec!(0.08),
            knock_in: dec!(0.40),
        }
    }
}

impl ProductSpec {
    pub fn observation_count(&self) -> usize {
        observation_count(self.maturity_months, self.obs_interval_months)
    }

    /// Calendar observation dates for a note issued on `issuance`.
    pub fn schedule(&self, issuance: NaiveDate) -> Vec<NaiveDate> {
        observation_schedule(issuance, self.maturity_months, self.obs_interval_months)
    }

    pub fn maturity_years(&self) -> Decimal {
        Decimal::from(self.maturity_months) / dec!(12)
    }

    /// Net return of a note that reaches maturity without a knock-in.
    pub fn full_term_coupon(&self) -> Rate {
        self.coupon_annual * self.maturity_years()
    }

    /// The one invariant the simulator depends on: one trigger level per
    /// scheduled observation.
    pub fn check_structure(&self) -> ElsBacktestResult<()> {
        let observations = self.observation_count();
        if self.early_levels.len() != observations {
            return Err(ElsBacktestError::StructureMismatch {
                early_levels: self.early_levels.len(),
                observations,
            });
        }
        Ok(())
    }

    /// Range checks applied where product terms enter the system (CLI,
    /// bindings, report API). Includes the structural check.
    pub fn validate(&self) -> ElsBacktestResult<()> {
        if !(MIN_MATURITY_MONTHS..=MAX_MATURITY_MONTHS).contains(&self.maturity_months) {
            return Err(ElsBacktestError::InvalidInput {
                field: "maturity_months".into(),
                reason: format!(
                    "must be between {MIN_MATURITY_MONTHS} and {MAX_MATURITY_MONTHS}"
                ),
            });
        }
        if !(MIN_OBS_INTERVAL_MONTHS..=MAX_OBS_INTERVAL_MONTHS).contains(&self.obs_interval_months)
        {
            return Err(ElsBacktestError::InvalidInput {
                field: "obs_interval_months".into(),
                reason: format!(
                    "must be between {MIN_OBS_INTERVAL_MONTHS} and {MAX_OBS_INTERVAL_MONTHS}"
                ),
            });
        }
        if self.coupon_annual < Decimal::ZERO {
            return Err(ElsBacktestError::InvalidInput {
                field: "coupon_annual".into(),
                reason: "must be non-negative".into(),
            });
        }
        if self.knock_in <= Decimal::ZERO || self.knock_in >= Decimal::ONE {
            return Err(ElsBacktestError::InvalidInput {
                field: "knock_in".into(),
                reason: "must be between 0 and 1 (exclusive), e.g. 0.40 for 40%".into(),
            });
        }
        if let Some(level) = self.early_levels.iter().find(|l| **l <= Decimal::ZERO) {
            return Err(ElsBacktestError::InvalidInput {
                field: "early_levels".into(),
                reason: format!("trigger levels must be positive, got {level}"),
            });
        }
        self.check_structure()
    }
}

impl std::fmt::Display for ProductSpec {
    /// Compact term sheet line, e.g. `36M/6M (6 obs) 95-90-85-80-75-70, KI 40%, 8% p.a.`
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let levels: Vec<String> = self
            .early_levels
            .iter()
            .map(|l| (l * dec!(100)).normalize().to_string())
            .collect();
        write!(
            f,
            "{}M/{}M ({} obs) {}, KI {}%, {}% p.a.",
            self.maturity_months,
            self.obs_interval_months,
            self.observation_count(),
            levels.join("-"),
            (self.knock_in * dec!(100)).normalize(),
            (self.coupon_annual * dec!(100)).normalize(),
        )
    }
}
