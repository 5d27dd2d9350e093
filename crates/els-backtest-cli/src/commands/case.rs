use chrono::NaiveDate;
use clap::{Args, ValueEnum};
use serde_json::Value;

use els_backtest_core::backtest::case_analysis::{analyze_case_report, CaseAnalysisInput, CasePick};

use super::PriceArgs;
use crate::input;
use crate::input::product::ProductArgs;

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum PickArg {
    First,
    WorstLoss,
    FirstKnockIn,
}

impl From<PickArg> for CasePick {
    fn from(pick: PickArg) -> Self {
        match pick {
            PickArg::First => CasePick::First,
            PickArg::WorstLoss => CasePick::WorstLoss,
            PickArg::FirstKnockIn => CasePick::FirstKnockIn,
        }
    }
}

/// Arguments for replaying a single issuance
#[derive(Args)]
pub struct CaseArgs {
    /// Path to JSON request with `product`, `prices` and `pick`
    #[arg(long)]
    pub input: Option<String>,

    #[command(flatten)]
    pub prices: PriceArgs,

    #[command(flatten)]
    pub product: ProductArgs,

    /// Issuance date (rolled forward to the next trading day)
    #[arg(long, conflicts_with = "pick")]
    pub date: Option<NaiveDate>,

    /// Pick a case from a full backtest instead of a date
    #[arg(long, value_enum, default_value = "first")]
    pub pick: PickArg,
}

pub fn run_case(args: CaseArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let request: CaseAnalysisInput = if let Some(ref path) = args.input {
        input::file::read_json(path)?
    } else if let Some(prices) = args.prices.load()? {
        CaseAnalysisInput {
            product: args.product.resolve()?,
            prices,
            pick: args.date.map_or_else(|| args.pick.into(), CasePick::Date),
        }
    } else if let Some(data) = input::stdin::read_stdin()? {
        data
    } else {
        return Err("--prices is required (or provide --input)".into());
    };

    let output = analyze_case_report(&request)?;
    Ok(serde_json::to_value(output)?)
}
