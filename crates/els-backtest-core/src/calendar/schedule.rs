use chrono::{Months, NaiveDate};
use serde::{Deserialize, Serialize};

use super::trading_days::{snap, SnapOutcome};

/// Advance `date` by whole calendar months, keeping the day of month and
/// clamping to the last day when the target month is shorter.
///
/// Returns `None` only when the result overflows the supported date range.
pub fn add_months(date: NaiveDate, months: u32) -> Option<NaiveDate> {
    date.checked_add_months(Months::new(months))
}

/// Number of scheduled observations: `maturity_months / obs_interval_months`.
pub fn observation_count(maturity_months: u32, obs_interval_months: u32) -> usize {
    if obs_interval_months == 0 {
        return 0;
    }
    (maturity_months / obs_interval_months) as usize
}

/// Calendar observation dates, unadjusted for trading days.
///
/// Element `i` (1-based) is `issuance + i * obs_interval_months` months.
pub fn observation_schedule(
    issuance: NaiveDate,
    maturity_months: u32,
    obs_interval_months: u32,
) -> Vec<NaiveDate> {
    let n = observation_count(maturity_months, obs_interval_months) as u32;
    (1..=n)
        .map_while(|i| add_months(issuance, i * obs_interval_months))
        .collect()
}

/// A scheduled observation paired with its trading-day adjustment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservationDate {
    pub step: u32,
    pub scheduled: NaiveDate,
    pub snapped: SnapOutcome,
}

impl ObservationDate {
    /// Snap each date of an observation schedule against `trading_dates`.
    pub fn resolve(trading_dates: &[NaiveDate], schedule: &[NaiveDate]) -> Vec<ObservationDate> {
        schedule
            .iter()
            .enumerate()
            .map(|(i, &scheduled)| ObservationDate {
                step: i as u32 + 1,
                scheduled,
                snapped: snap(trading_dates, scheduled),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_observation_count_uses_integer_division() {
        assert_eq!(observation_count(36, 6), 6);
        assert_eq!(observation_count(36, 4), 9);
        assert_eq!(observation_count(40, 12), 3);
        assert_eq!(observation_count(6, 12), 0);
        assert_eq!(observation_count(36, 0), 0);
    }

    #[test]
    fn test_schedule_semi_annual_three_year() {
        let dates = observation_schedule(d(2020, 1, 15), 36, 6);
        assert_eq!(
            dates,
            vec![
                d(2020, 7, 15),
                d(2021, 1, 15),
                d(2021, 7, 15),
                d(2022, 1, 15),
                d(2022, 7, 15),
                d(2023, 1, 15),
            ]
        );
    }

    #[test]
    fn test_schedule_clamps_to_month_end() {
        // Each element is measured from issuance, not from the previous date
        let dates = observation_schedule(d(2021, 8, 31), 6, 1);
        assert_eq!(
            dates,
            vec![
                d(2021, 9, 30),
                d(2021, 10, 31),
                d(2021, 11, 30),
                d(2021, 12, 31),
                d(2022, 1, 31),
                d(2022, 2, 28),
            ]
        );
    }

    #[test]
    fn test_schedule_leap_day() {
        let dates = observation_schedule(d(2020, 2, 29), 24, 12);
        assert_eq!(dates, vec![d(2021, 2, 28), d(2022, 2, 28)]);
    }

    #[test]
    fn test_resolve_snaps_forward() {
        let trading = vec![d(2020, 7, 1), d(2020, 7, 6), d(2021, 1, 4)];
        let schedule = vec![d(2020, 7, 4), d(2021, 1, 4), d(2021, 7, 4)];
        let resolved = ObservationDate::resolve(&trading, &schedule);
        assert_eq!(resolved.len(), 3);
        assert_eq!(resolved[0].step, 1);
        assert_eq!(resolved[0].snapped, SnapOutcome::Found(d(2020, 7, 6)));
        assert_eq!(resolved[1].snapped, SnapOutcome::Found(d(2021, 1, 4)));
        assert_eq!(resolved[2].snapped, SnapOutcome::NotFound);
    }
}
