mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;

use commands::backtest::BacktestArgs;
use commands::case::CaseArgs;
use commands::schedule::ScheduleArgs;

/// Rolling historical backtests of step-down autocallable notes
#[derive(Parser)]
#[command(
    name = "elsbt",
    version,
    about = "Rolling historical backtests of step-down autocallable notes",
    long_about = "Replays a worst-of step-down autocallable with a knock-in barrier as if \
                  it had been issued on every trading day of a price history, and reports \
                  redemption, knock-in and loss statistics with decimal precision. \
                  Set RUST_LOG for diagnostics on stderr."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,
}

#[derive(Subcommand)]
enum Commands {
    /// Backtest a note over every issuance date of a price history
    Backtest(BacktestArgs),
    /// Replay one issuance date with its full worst-of path
    Case(CaseArgs),
    /// Print the observation schedule for an issuance date
    Schedule(ScheduleArgs),
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing();

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Backtest(args) => commands::backtest::run_backtest(args),
        Commands::Case(args) => commands::case::run_case(args),
        Commands::Schedule(args) => commands::schedule::run_schedule(args),
        Commands::Version => {
            println!("elsbt {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            tracing::debug!(error = %e, "command failed");
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
