use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::ElsBacktestError;
use crate::ElsBacktestResult;

/// Outcome of rolling a calendar date onto the trading calendar.
///
/// `NotFound` is routine: it means the target lies after the last trading
/// date on record, and callers use it to stop scanning rather than fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "date", rename_all = "snake_case")]
pub enum SnapOutcome {
    Found(NaiveDate),
    NotFound,
}

impl SnapOutcome {
    pub fn date(self) -> Option<NaiveDate> {
        match self {
            SnapOutcome::Found(d) => Some(d),
            SnapOutcome::NotFound => None,
        }
    }

    pub fn is_found(self) -> bool {
        matches!(self, SnapOutcome::Found(_))
    }
}

/// A trading calendar must be strictly increasing for snapping to hold.
pub fn check_trading_dates(trading_dates: &[NaiveDate]) -> ElsBacktestResult<()> {
    match trading_dates.windows(2).find(|w| w[1] <= w[0]) {
        Some(w) => Err(ElsBacktestError::InvalidInput {
            field: "dates".into(),
            reason: format!("must be strictly increasing ({} followed by {})", w[0], w[1]),
        }),
        None => Ok(()),
    }
}

/// Earliest trading date on or after `target` (following business day).
///
/// `trading_dates` must be sorted ascending. Never rolls backward.
pub fn snap(trading_dates: &[NaiveDate], target: NaiveDate) -> SnapOutcome {
    match snap_index(trading_dates, target) {
        Some(idx) => SnapOutcome::Found(trading_dates[idx]),
        None => SnapOutcome::NotFound,
    }
}

/// Position of the snapped trading date within `trading_dates`.
pub fn snap_index(trading_dates: &[NaiveDate], target: NaiveDate) -> Option<usize> {
    let pos = trading_dates.partition_point(|d| *d < target);
    if pos < trading_dates.len() {
        Some(pos)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn calendar() -> Vec<NaiveDate> {
        // Thu, Fri, then Mon after a weekend
        vec![d(2020, 1, 2), d(2020, 1, 3), d(2020, 1, 6), d(2020, 1, 7)]
    }

    #[test]
    fn test_snap_exact_trading_day_is_unchanged() {
        assert_eq!(snap(&calendar(), d(2020, 1, 3)), SnapOutcome::Found(d(2020, 1, 3)));
    }

    #[test]
    fn test_snap_weekend_rolls_forward() {
        assert_eq!(snap(&calendar(), d(2020, 1, 4)), SnapOutcome::Found(d(2020, 1, 6)));
        assert_eq!(snap(&calendar(), d(2020, 1, 5)), SnapOutcome::Found(d(2020, 1, 6)));
    }

    #[test]
    fn test_snap_before_first_date_returns_first() {
        assert_eq!(snap(&calendar(), d(2019, 12, 25)), SnapOutcome::Found(d(2020, 1, 2)));
    }

    #[test]
    fn test_snap_last_date_is_found() {
        assert_eq!(snap_index(&calendar(), d(2020, 1, 7)), Some(3));
    }

    #[test]
    fn test_snap_beyond_last_date_is_not_found() {
        let outcome = snap(&calendar(), d(2020, 1, 8));
        assert_eq!(outcome, SnapOutcome::NotFound);
        assert!(!outcome.is_found());
        assert_eq!(outcome.date(), None);
    }

    #[test]
    fn test_calendar_order_is_checked() {
        assert!(check_trading_dates(&calendar()).is_ok());
        assert!(check_trading_dates(&[]).is_ok());
        assert!(check_trading_dates(&[d(2020, 1, 3), d(2020, 1, 2)]).is_err());
        assert!(check_trading_dates(&[d(2020, 1, 2), d(2020, 1, 2)]).is_err());
    }

    #[test]
    fn test_snap_empty_calendar() {
        assert_eq!(snap(&[], d(2020, 1, 2)), SnapOutcome::NotFound);
    }
}
