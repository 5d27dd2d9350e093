use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use super::descriptive::{mean, median, rate, sample_std_dev};
use super::yearly::{yearly_breakdown, YearlyStatistics};
use crate::backtest::BacktestResult;
use crate::error::ElsBacktestError;
use crate::simulation::RedemptionStep;
use crate::types::Rate;
use crate::ElsBacktestResult;

/// Loss depth thresholds reported separately (strictly beyond).
pub const DEEP_LOSS_10: Rate = dec!(-0.10);
pub const DEEP_LOSS_20: Rate = dec!(-0.20);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RedemptionBucket {
    pub step: RedemptionStep,
    pub count: usize,
    pub rate: Rate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestStatistics {
    pub case_count: usize,
    /// Share of cases returning at least principal
    pub success_rate: Rate,
    pub mean_return: Rate,
    pub median_return: Rate,
    pub std_dev: Option<Rate>,

    pub knock_in_count: usize,
    pub knock_in_rate: Rate,
    /// Touched the barrier but still returned at least principal
    pub knock_in_recovery_count: usize,
    pub knock_in_recovery_rate: Rate,

    pub loss_count: usize,
    pub loss_rate: Rate,
    pub loss_beyond_10pct_count: usize,
    pub loss_beyond_10pct_rate: Rate,
    pub loss_beyond_20pct_count: usize,
    pub loss_beyond_20pct_rate: Rate,

    pub worst_return: Rate,
    pub worst_return_date: NaiveDate,
    pub best_return: Rate,

    pub redemption_distribution: Vec<RedemptionBucket>,
    pub yearly: Vec<YearlyStatistics>,
}

impl BacktestStatistics {
    pub fn early_redemption_rate(&self) -> Rate {
        self.redemption_distribution
            .iter()
            .filter(|b| b.step.is_early())
            .map(|b| b.rate)
            .sum()
    }
}

/// Reduce a backtest to summary statistics. Pure: the same result always
/// yields the same statistics.
pub fn summarize(result: &BacktestResult) -> ElsBacktestResult<BacktestStatistics> {
    let cases = &result.cases;
    let n = cases.len();
    if n == 0 {
        return Err(ElsBacktestError::InsufficientData(
            "cannot summarise a backtest with no cases".into(),
        ));
    }
    result.check_consistency()?;

    let returns: Vec<Decimal> = cases.iter().map(|c| c.net_return).collect();
    let count = |pred: &dyn Fn(&Decimal) -> bool| returns.iter().filter(|r| pred(r)).count();

    let success = count(&|r| *r >= Decimal::ZERO);
    let losses = count(&|r| *r < Decimal::ZERO);
    let beyond_10 = count(&|r| *r < DEEP_LOSS_10);
    let beyond_20 = count(&|r| *r < DEEP_LOSS_20);
    let knock_ins = cases.iter().filter(|c| c.knock_in_touched).count();
    let recoveries = cases.iter().filter(|c| c.recovered_from_knock_in()).count();

    // First minimum in issuance order
    let worst = cases
        .iter()
        .skip(1)
        .fold(&cases[0], |w, c| if c.net_return < w.net_return { c } else { w });
    let best_return = returns.iter().copied().fold(returns[0], Decimal::max);

    Ok(BacktestStatistics {
        case_count: n,
        success_rate: rate(success, n),
        mean_return: mean(&returns),
        median_return: median(&returns),
        std_dev: sample_std_dev(&returns),
        knock_in_count: knock_ins,
        knock_in_rate: rate(knock_ins, n),
        knock_in_recovery_count: recoveries,
        knock_in_recovery_rate: rate(recoveries, n),
        loss_count: losses,
        loss_rate: rate(losses, n),
        loss_beyond_10pct_count: beyond_10,
        loss_beyond_10pct_rate: rate(beyond_10, n),
        loss_beyond_20pct_count: beyond_20,
        loss_beyond_20pct_rate: rate(beyond_20, n),
        worst_return: worst.net_return,
        worst_return_date: worst.issuance_date,
        best_return,
        redemption_distribution: redemption_distribution(result),
        yearly: yearly_breakdown(cases),
    })
}

/// One bucket per scheduled observation (including empty ones) plus the
/// matured bucket.
fn redemption_distribution(result: &BacktestResult) -> Vec<RedemptionBucket> {
    let n = result.cases.len();
    let mut counts = vec![0usize; result.observation_count];
    let mut matured = 0usize;
    for case in &result.cases {
        match case.redemption_step {
            // Steps are checked to lie in 1..=observation_count
            RedemptionStep::Early(step) => counts[step as usize - 1] += 1,
            RedemptionStep::Matured => matured += 1,
        }
    }

    counts
        .into_iter()
        .enumerate()
        .map(|(i, count)| RedemptionBucket {
            step: RedemptionStep::Early(i as u32 + 1),
            count,
            rate: rate(count, n),
        })
        .chain(std::iter::once(RedemptionBucket {
            step: RedemptionStep::Matured,
            count: matured,
            rate: rate(matured, n),
        }))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backtest::SkipCounts;
    use crate::simulation::SimulationCase;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn case(date: NaiveDate, ret: Decimal, ki: bool, step: RedemptionStep) -> SimulationCase {
        use chrono::Datelike;
        SimulationCase {
            issuance_date: date,
            year: date.year(),
            net_return: ret,
            knock_in_touched: ki,
            redemption_step: step,
            redemption_date: date,
            path_detail: None,
        }
    }

    fn sample() -> BacktestResult {
        BacktestResult {
            cases: vec![
                case(d(2019, 3, 4), dec!(0.04), false, RedemptionStep::Early(1)),
                case(d(2019, 3, 5), dec!(-0.25), true, RedemptionStep::Matured),
                case(d(2020, 3, 2), dec!(0.08), true, RedemptionStep::Early(2)),
                case(d(2020, 3, 3), dec!(-0.25), true, RedemptionStep::Matured),
                case(d(2020, 3, 4), dec!(-0.05), false, RedemptionStep::Early(1)),
            ],
            observation_count: 3,
            skipped: SkipCounts::default(),
            scan_stopped_at: None,
        }
    }

    #[test]
    fn test_summary_counts_and_rates() {
        let s = summarize(&sample()).unwrap();
        assert_eq!(s.case_count, 5);
        assert_eq!(s.success_rate, dec!(0.4));
        assert_eq!(s.mean_return, dec!(-0.086));
        assert_eq!(s.median_return, dec!(-0.05));
        assert_eq!(s.knock_in_count, 3);
        assert_eq!(s.knock_in_recovery_count, 1);
        assert_eq!(s.loss_count, 3);
        assert_eq!(s.loss_beyond_10pct_count, 2);
        assert_eq!(s.loss_beyond_20pct_count, 2);
        assert_eq!(s.loss_beyond_20pct_rate, dec!(0.4));
        assert_eq!(s.best_return, dec!(0.08));
    }

    #[test]
    fn test_worst_case_ties_resolve_to_earliest() {
        let s = summarize(&sample()).unwrap();
        assert_eq!(s.worst_return, dec!(-0.25));
        assert_eq!(s.worst_return_date, d(2019, 3, 5));
    }

    #[test]
    fn test_redemption_distribution_includes_empty_steps() {
        let s = summarize(&sample()).unwrap();
        let counts: Vec<(RedemptionStep, usize)> = s
            .redemption_distribution
            .iter()
            .map(|b| (b.step, b.count))
            .collect();
        assert_eq!(
            counts,
            vec![
                (RedemptionStep::Early(1), 2),
                (RedemptionStep::Early(2), 1),
                (RedemptionStep::Early(3), 0),
                (RedemptionStep::Matured, 2),
            ]
        );
        assert_eq!(s.early_redemption_rate(), dec!(0.6));
    }

    #[test]
    fn test_loss_threshold_is_strict() {
        let mut r = sample();
        r.cases = vec![
            case(d(2019, 3, 4), dec!(-0.10), true, RedemptionStep::Matured),
            case(d(2019, 3, 5), dec!(-0.20), true, RedemptionStep::Matured),
        ];
        let s = summarize(&r).unwrap();
        assert_eq!(s.loss_beyond_10pct_count, 1);
        assert_eq!(s.loss_beyond_20pct_count, 0);
    }

    #[test]
    fn test_summarize_is_idempotent() {
        let r = sample();
        assert_eq!(summarize(&r).unwrap(), summarize(&r).unwrap());
    }

    #[test]
    fn test_out_of_range_step_rejected() {
        let mut r = sample();
        r.cases[0].redemption_step = RedemptionStep::Early(0);
        assert!(matches!(
            summarize(&r),
            Err(ElsBacktestError::InvalidInput { .. })
        ));

        r.cases[0].redemption_step = RedemptionStep::Early(4);
        assert!(matches!(
            summarize(&r),
            Err(ElsBacktestError::InvalidInput { .. })
        ));
    }

    #[test]
    fn test_deserialised_result_is_checked() {
        let mut json = serde_json::to_value(sample()).unwrap();
        assert!(serde_json::from_value::<BacktestResult>(json.clone()).is_ok());

        json["cases"][0]["redemption_step"] = serde_json::json!({ "early": 0 });
        assert!(serde_json::from_value::<BacktestResult>(json.clone()).is_err());

        let mut unordered = serde_json::to_value(sample()).unwrap();
        unordered["cases"][1]["issuance_date"] = serde_json::json!("2019-03-01");
        assert!(serde_json::from_value::<BacktestResult>(unordered).is_err());

        let mut oversized = serde_json::to_value(sample()).unwrap();
        oversized["observation_count"] = serde_json::json!(1_000_000_000u64);
        assert!(serde_json::from_value::<BacktestResult>(oversized).is_err());
    }

    #[test]
    fn test_empty_result_rejected() {
        let mut r = sample();
        r.cases.clear();
        assert!(matches!(
            summarize(&r),
            Err(ElsBacktestError::InsufficientData(_))
        ));
    }
}
