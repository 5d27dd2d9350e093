use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// Number of processed issuance dates between progress notifications.
pub const PROGRESS_INTERVAL: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Progress {
    pub processed: usize,
    pub total: usize,
}

impl Progress {
    pub fn percent(&self) -> Decimal {
        if self.total == 0 {
            return dec!(100);
        }
        Decimal::from(self.processed as u64) * dec!(100) / Decimal::from(self.total as u64)
    }

    pub fn is_complete(&self) -> bool {
        self.processed >= self.total
    }
}

/// Receives informational progress from a running backtest. Has no effect
/// on results.
pub trait ProgressObserver {
    fn on_progress(&mut self, progress: Progress);
}

impl<F: FnMut(Progress)> ProgressObserver for F {
    fn on_progress(&mut self, progress: Progress) {
        self(progress)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressObserver for NoProgress {
    fn on_progress(&mut self, _progress: Progress) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percent() {
        let p = Progress {
            processed: 25,
            total: 200,
        };
        assert_eq!(p.percent(), dec!(12.5));
        assert!(!p.is_complete());
        assert_eq!(Progress { processed: 0, total: 0 }.percent(), dec!(100));
    }

    #[test]
    fn test_closure_observer() {
        let mut seen = Vec::new();
        {
            let mut observer = |p: Progress| seen.push(p.processed);
            observer.on_progress(Progress {
                processed: 10,
                total: 20,
            });
        }
        assert_eq!(seen, vec![10]);
    }
}
