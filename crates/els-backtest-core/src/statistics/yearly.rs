use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::descriptive::{mean, median, rate, sample_std_dev};
use crate::simulation::SimulationCase;
use crate::types::Rate;

/// Outcomes of all notes issued in one calendar year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YearlyStatistics {
    pub year: i32,
    pub sample_count: usize,
    pub mean_return: Rate,
    pub median_return: Rate,
    pub std_dev: Option<Rate>,
    pub knock_in_count: usize,
    pub success_rate: Rate,
}

/// Group cases by issuance year, ascending.
pub fn yearly_breakdown(cases: &[SimulationCase]) -> Vec<YearlyStatistics> {
    let mut by_year: BTreeMap<i32, Vec<&SimulationCase>> = BTreeMap::new();
    for case in cases {
        by_year.entry(case.year).or_default().push(case);
    }

    by_year
        .into_iter()
        .map(|(year, group)| {
            let returns: Vec<Decimal> = group.iter().map(|c| c.net_return).collect();
            let success = returns.iter().filter(|r| **r >= Decimal::ZERO).count();
            YearlyStatistics {
                year,
                sample_count: group.len(),
                mean_return: mean(&returns),
                median_return: median(&returns),
                std_dev: sample_std_dev(&returns),
                knock_in_count: group.iter().filter(|c| c.knock_in_touched).count(),
                success_rate: rate(success, group.len()),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulation::RedemptionStep;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn case(y: i32, ret: Decimal, ki: bool) -> SimulationCase {
        let date = NaiveDate::from_ymd_opt(y, 5, 10).unwrap();
        SimulationCase {
            issuance_date: date,
            year: y,
            net_return: ret,
            knock_in_touched: ki,
            redemption_step: RedemptionStep::Matured,
            redemption_date: date,
            path_detail: None,
        }
    }

    #[test]
    fn test_groups_by_year_in_order() {
        let cases = vec![
            case(2018, dec!(0.04), false),
            case(2018, dec!(0.08), false),
            case(2018, dec!(-0.30), true),
            case(2020, dec!(0.06), false),
        ];
        let table = yearly_breakdown(&cases);
        assert_eq!(table.len(), 2);

        let y2018 = &table[0];
        assert_eq!(y2018.year, 2018);
        assert_eq!(y2018.sample_count, 3);
        assert_eq!(y2018.median_return, dec!(0.04));
        assert_eq!(y2018.knock_in_count, 1);
        assert!(y2018.success_rate > dec!(0.66) && y2018.success_rate < dec!(0.67));
        assert!(y2018.std_dev.is_some());

        let y2020 = &table[1];
        assert_eq!(y2020.year, 2020);
        assert_eq!(y2020.std_dev, None);
        assert_eq!(y2020.success_rate, Decimal::ONE);
    }
}
