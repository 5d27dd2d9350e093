use rust_decimal::Decimal;
use rust_decimal::MathematicalOps;
use rust_decimal_macros::dec;

use crate::types::Rate;

pub fn mean(values: &[Decimal]) -> Decimal {
    if values.is_empty() {
        return Decimal::ZERO;
    }
    let sum: Decimal = values.iter().copied().sum();
    sum / Decimal::from(values.len() as u64)
}

pub fn median(values: &[Decimal]) -> Decimal {
    if values.is_empty() {
        return Decimal::ZERO;
    }
    let mut sorted = values.to_vec();
    sorted.sort();
    let n = sorted.len();
    if n % 2 == 1 {
        sorted[n / 2]
    } else {
        (sorted[n / 2 - 1] + sorted[n / 2]) / dec!(2)
    }
}

/// Sample standard deviation (n - 1). `None` below two observations.
pub fn sample_std_dev(values: &[Decimal]) -> Option<Decimal> {
    if values.len() < 2 {
        return None;
    }
    let m = mean(values);
    let sum_sq: Decimal = values.iter().map(|v| (*v - m) * (*v - m)).sum();
    let variance = sum_sq / Decimal::from((values.len() - 1) as u64);
    variance.sqrt()
}

/// `count / total` as a fraction; zero for an empty population.
pub fn rate(count: usize, total: usize) -> Rate {
    if total == 0 {
        return Decimal::ZERO;
    }
    Decimal::from(count as u64) / Decimal::from(total as u64)
}
