use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::case::{AssetPath, PathDetail, RedemptionStep, SimulationCase};
use crate::calendar::snap_index;
use crate::error::ElsBacktestError;
use crate::market::PriceWindow;
use crate::product::ProductSpec;
use crate::types::Ratio;
use crate::ElsBacktestResult;

/// Day count basis for pro-rata coupons on early redemption.
pub const DAYS_PER_YEAR: Decimal = dec!(365.25);

/// Each asset divided by its own price on the first date of the window.
fn normalize(window: &PriceWindow<'_>) -> ElsBacktestResult<Vec<AssetPath>> {
    window
        .assets()
        .map(|(name, prices)| {
            let base = prices[0];
            if base <= Decimal::ZERO {
                return Err(ElsBacktestError::InvalidInput {
                    field: "prices".into(),
                    reason: format!("asset '{name}' has non-positive issuance fixing {base}"),
                });
            }
            Ok(AssetPath {
                name: name.to_string(),
                path: prices.iter().map(|p| p / base).collect(),
            })
        })
        .collect()
}

/// Per-date minimum across the normalised paths.
pub fn worst_of_series(paths: &[AssetPath]) -> Vec<Ratio> {
    let Some(first) = paths.first() else {
        return Vec::new();
    };
    let mut worst = first.path.clone();
    for asset in &paths[1..] {
        for (w, v) in worst.iter_mut().zip(&asset.path) {
            if *v < *w {
                *w = *v;
            }
        }
    }
    worst
}

/// Run one note from `issuance_date` through the end of `window`.
///
/// Observation dates are snapped against the full calendar behind the
/// window. An observation that cannot be snapped, or that snaps past the
/// window, ends early-redemption checking and the note is settled at the
/// last date of the window.
pub fn simulate_case(
    window: &PriceWindow<'_>,
    product: &ProductSpec,
    issuance_date: NaiveDate,
    with_detail: bool,
) -> ElsBacktestResult<SimulationCase> {
    let paths = normalize(window)?;
    let worst = worst_of_series(&paths);

    product.check_structure()?;

    // Strict: a close exactly on the barrier is not a breach
    let first_breach = worst.iter().position(|w| *w < product.knock_in);
    let dates = window.dates();

    let schedule = product.schedule(issuance_date);
    for (i, (obs_date, level)) in schedule.iter().zip(&product.early_levels).enumerate() {
        let Some(obs_offset) =
            snap_index(window.calendar(), *obs_date).and_then(|idx| window.offset_of(idx))
        else {
            break;
        };

        // Inclusive of the observation date itself
        let knocked_in = first_breach.is_some_and(|b| b <= obs_offset);

        if worst[obs_offset] >= *level {
            let redemption_date = dates[obs_offset];
            let holding_days = (redemption_date - issuance_date).num_days();
            let holding_years = Decimal::from(holding_days) / DAYS_PER_YEAR;
            let net_return = product.coupon_annual * holding_years;
            let step = RedemptionStep::Early(i as u32 + 1);
            return Ok(build_case(
                issuance_date,
                net_return,
                knocked_in,
                step,
                redemption_date,
                first_breach,
                with_detail.then_some((dates, worst, paths, product.knock_in)),
            ));
        }
    }

    let knocked_in = first_breach.is_some();
    let final_worst = *worst.last().ok_or_else(|| {
        ElsBacktestError::InsufficientData("price window has no observations".into())
    })?;
    // Settles on the terminal worst-of, not the path minimum
    let net_return = if knocked_in {
        final_worst - Decimal::ONE
    } else {
        product.full_term_coupon()
    };

    Ok(build_case(
        issuance_date,
        net_return,
        knocked_in,
        RedemptionStep::Matured,
        window.last_date(),
        first_breach,
        with_detail.then_some((dates, worst, paths, product.knock_in)),
    ))
}

fn build_case(
    issuance_date: NaiveDate,
    net_return: Decimal,
    knock_in_touched: bool,
    redemption_step: RedemptionStep,
    redemption_date: NaiveDate,
    first_breach: Option<usize>,
    detail: Option<(&[NaiveDate], Vec<Ratio>, Vec<AssetPath>, Ratio)>,
) -> SimulationCase {
    let path_detail = detail.map(|(dates, worst_of, asset_paths, knock_in_level)| PathDetail {
        first_breach_date: first_breach
            .filter(|_| knock_in_touched)
            .map(|b| dates[b]),
        dates: dates.to_vec(),
        worst_of,
        asset_paths,
        knock_in_level,
        knock_in_touched,
        redemption_date,
        redemption_step,
    });

    SimulationCase {
        issuance_date,
        year: issuance_date.year(),
        net_return,
        knock_in_touched,
        redemption_step,
        redemption_date,
        path_detail,
    }
}
