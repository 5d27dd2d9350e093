use chrono::{Datelike, NaiveDate, Weekday};
use els_backtest_core::backtest::{run_backtest, BacktestRun, RollingBacktest};
use els_backtest_core::market::{AssetSeries, PriceSeries};
use els_backtest_core::product::ProductSpec;
use els_backtest_core::simulation::{RedemptionStep, DAYS_PER_YEAR};
use els_backtest_core::ElsBacktestError;
use pretty_assertions::assert_eq;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

fn weekdays(from: NaiveDate, to: NaiveDate) -> Vec<NaiveDate> {
    from.iter_days()
        .take_while(|x| *x <= to)
        .filter(|x| !matches!(x.weekday(), Weekday::Sat | Weekday::Sun))
        .collect()
}

/// Triangle wave between 60 and 110 with a 300 trading-day period.
fn triangle(i: usize) -> Decimal {
    let phase = (i % 300) as i64 - 150;
    dec!(60) + Decimal::from(phase.abs()) / dec!(3)
}

fn two_asset_history() -> PriceSeries {
    let dates = weekdays(d(2015, 1, 1), d(2020, 12, 31));
    let a: Vec<Decimal> = (0..dates.len()).map(triangle).collect();
    let b: Vec<Decimal> = (0..dates.len()).map(|i| triangle(i + 75)).collect();
    PriceSeries::new(
        dates,
        vec![
            AssetSeries {
                name: "KOSPI200".into(),
                prices: a,
            },
            AssetSeries {
                name: "EUROSTOXX50".into(),
                prices: b,
            },
        ],
    )
    .unwrap()
}

fn standard_note(knock_in: Decimal) -> ProductSpec {
    ProductSpec {
        knock_in,
        ..ProductSpec::default()
    }
}

#[test]
fn test_single_observation_early_redemption() {
    let dates = weekdays(d(2020, 1, 1), d(2020, 12, 31));
    let prices: Vec<Decimal> = dates
        .iter()
        .map(|x| if *x >= d(2020, 7, 2) { dec!(105) } else { dec!(100) })
        .collect();
    let series = PriceSeries::single("SPX", dates, prices).unwrap();
    let product = ProductSpec {
        maturity_months: 6,
        obs_interval_months: 6,
        early_levels: vec![dec!(0.95)],
        coupon_annual: dec!(0.08),
        knock_in: dec!(0.40),
    };

    let result = run_backtest(&series, &product).unwrap();
    let case = result.case_on(d(2020, 1, 2)).unwrap();

    assert_eq!(case.redemption_step, RedemptionStep::Early(1));
    assert_eq!(case.redemption_date, d(2020, 7, 2));
    assert!(!case.knock_in_touched);
    let expected = dec!(0.08) * (Decimal::from(182) / DAYS_PER_YEAR);
    assert_eq!(case.net_return, expected);
    assert!((case.net_return - dec!(0.03987)).abs() < dec!(0.00001));
}

#[test]
fn test_breach_then_recovery_pays_final_performance() {
    let dates = weekdays(d(2020, 1, 1), d(2020, 7, 31));
    let prices: Vec<Decimal> = dates
        .iter()
        .map(|x| {
            if *x == d(2020, 3, 16) {
                dec!(35)
            } else if *x >= d(2020, 7, 1) {
                dec!(110)
            } else {
                dec!(100)
            }
        })
        .collect();
    let series = PriceSeries::single("SPX", dates, prices).unwrap();
    let product = ProductSpec {
        maturity_months: 6,
        obs_interval_months: 6,
        early_levels: vec![dec!(1.5)],
        coupon_annual: dec!(0.08),
        knock_in: dec!(0.40),
    };

    let result = run_backtest(&series, &product).unwrap();
    let case = result.case_on(d(2020, 1, 2)).unwrap();

    assert_eq!(case.redemption_step, RedemptionStep::Matured);
    assert!(case.knock_in_touched);
    assert_eq!(case.net_return, dec!(0.10));
    assert!(case.recovered_from_knock_in());
}

#[test]
fn test_short_history_yields_no_valid_cases() {
    let dates = weekdays(d(2020, 1, 1), d(2020, 3, 31));
    let n = dates.len();
    let series = PriceSeries::single("SPX", dates, vec![dec!(100); n]).unwrap();

    let err = run_backtest(&series, &ProductSpec::default()).unwrap_err();
    assert!(matches!(err, ElsBacktestError::NoValidCases(_)));
}

#[test]
fn test_scan_ends_where_maturity_leaves_history() {
    let series = two_asset_history();
    let product = ProductSpec::default();
    let result = run_backtest(&series, &product).unwrap();

    let stopped = result.scan_stopped_at.unwrap();
    let last = result.cases.last().unwrap();
    assert!(last.issuance_date < stopped);
    assert!(last.redemption_date <= series.last_date());
    assert!(result
        .cases
        .windows(2)
        .all(|w| w[0].issuance_date < w[1].issuance_date));

    let total = RollingBacktest::new(&series, &product).candidate_count();
    assert_eq!(result.len() + result.skipped.total(), total);
    assert_eq!(series.dates()[total], stopped);
}

#[test]
fn test_lower_barrier_never_raises_knock_in_rate() {
    let series = two_asset_history();
    let barriers = [dec!(0.80), dec!(0.70), dec!(0.65), dec!(0.60), dec!(0.55)];

    let knock_ins: Vec<usize> = barriers
        .iter()
        .map(|ki| {
            run_backtest(&series, &standard_note(*ki))
                .unwrap()
                .cases
                .iter()
                .filter(|c| c.knock_in_touched)
                .count()
        })
        .collect();

    assert!(knock_ins.windows(2).all(|w| w[1] <= w[0]), "{knock_ins:?}");
    assert!(knock_ins[0] > 0);
}

#[test]
fn test_barrier_does_not_move_redemption_timing() {
    let series = two_asset_history();
    let high = run_backtest(&series, &standard_note(dec!(0.75))).unwrap();
    let low = run_backtest(&series, &standard_note(dec!(0.45))).unwrap();

    let steps = |r: &els_backtest_core::backtest::BacktestResult| {
        r.cases
            .iter()
            .map(|c| (c.issuance_date, c.redemption_step))
            .collect::<Vec<_>>()
    };
    assert_eq!(steps(&high), steps(&low));
}

#[test]
fn test_run_owns_inputs_and_results() {
    let series = two_asset_history();
    let run = BacktestRun::execute(series.clone(), ProductSpec::default()).unwrap();
    assert_eq!(run.prices, series);
    assert_eq!(run.result, run_backtest(&series, &ProductSpec::default()).unwrap());
}
