use clap::Args;
use colored::Colorize;
use serde_json::Value;

use els_backtest_core::backtest::Progress;
use els_backtest_core::report::{run_backtest_report_with_progress, BacktestInput};

use super::PriceArgs;
use crate::input;
use crate::input::product::ProductArgs;

/// Arguments for a rolling historical backtest
#[derive(Args)]
pub struct BacktestArgs {
    /// Path to JSON request with `product` and `prices` (overrides the flags below)
    #[arg(long)]
    pub input: Option<String>,

    #[command(flatten)]
    pub prices: PriceArgs,

    #[command(flatten)]
    pub product: ProductArgs,

    /// Include every simulated case in the output
    #[arg(long)]
    pub include_cases: bool,

    /// Report progress on stderr
    #[arg(long)]
    pub progress: bool,
}

pub fn run_backtest(args: BacktestArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let mut request: BacktestInput = if let Some(ref path) = args.input {
        input::file::read_json(path)?
    } else if let Some(prices) = args.prices.load()? {
        BacktestInput {
            product: args.product.resolve()?,
            prices,
            include_cases: false,
        }
    } else if let Some(data) = input::stdin::read_stdin()? {
        data
    } else {
        return Err("--prices is required (or provide --input)".into());
    };
    request.include_cases |= args.include_cases;

    let output = if args.progress {
        let mut observer = |p: Progress| {
            eprint!(
                "\r{} {}/{} ({}%)",
                "backtesting".cyan(),
                p.processed,
                p.total,
                p.percent().round_dp(1)
            );
            if p.is_complete() {
                eprintln!();
            }
        };
        run_backtest_report_with_progress(&request, &mut observer)?
    } else {
        run_backtest_report_with_progress(&request, &mut els_backtest_core::backtest::NoProgress)?
    };
    Ok(serde_json::to_value(output)?)
}
