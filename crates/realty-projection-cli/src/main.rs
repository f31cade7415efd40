mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;
use tracing_subscriber::EnvFilter;

use commands::correction::CorrectionArgs;
use commands::project::{ProjectArgs, StrategyArgs};
use commands::returns::ReturnsArgs;
use commands::schedule::ScheduleArgs;

/// Amortization schedules and investment-return projections for off-plan property
#[derive(Parser)]
#[command(
    name = "rproj",
    version,
    about = "Amortization schedules and investment-return projections for off-plan property",
    long_about = "A CLI for building monthly amortization schedules under additive monetary \
                  correction and projecting returns (ROI, IRR, payback, net profit) for \
                  future-sale, appreciation and rental strategies across scenarios, with \
                  decimal precision."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,

    /// Log computation details to stderr
    #[arg(long, short, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the month-by-month amortization schedule
    Schedule(ScheduleArgs),
    /// Tabulate accumulated monetary correction
    Correction(CorrectionArgs),
    /// ROI, IRR, payback and net profit for a monthly cash-flow vector
    Returns(ReturnsArgs),
    /// Evaluate a single investment strategy
    Strategy(StrategyArgs),
    /// Run strategies across scenarios with a most-favorable summary
    Project(ProjectArgs),
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

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Schedule(args) => commands::schedule::run_schedule(args),
        Commands::Correction(args) => commands::correction::run_correction(args),
        Commands::Returns(args) => commands::returns::run_returns(args),
        Commands::Strategy(args) => commands::project::run_strategy(args),
        Commands::Project(args) => commands::project::run_project(args),
        Commands::Version => {
            println!("rproj {}", env!("CARGO_PKG_VERSION"));
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
