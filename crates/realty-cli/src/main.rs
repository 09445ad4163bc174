mod commands;
mod input;
mod logging;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;
use tracing::debug;

use commands::mortgage::AmortizeArgs;
use commands::portfolio::PortfolioArgs;
use commands::projection::{IrrArgs, ProjectArgs, PropertyArgs, StressArgs};
use commands::register::RegisterArgs;
use commands::simulation::{MonteCarloArgs, PathsArgs};

/// Real-estate portfolio simulation and analytics
#[derive(Parser)]
#[command(
    name = "rpa",
    version,
    about = "Real-estate portfolio simulation and analytics",
    long_about = "A CLI for real-estate investment analysis: mortgage amortization, \
                  hold-period cash-flow projection, IRR, leveraged portfolio simulation, \
                  Monte Carlo sampling and vacancy/expense stress tests."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,

    /// Log level for stderr diagnostics (overridden by RUST_LOG)
    #[arg(long, default_value = "warn", global = true)]
    log_level: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Fixed-rate mortgage amortization schedule
    Amortize(AmortizeArgs),
    /// Project a property's hold-period cash flows and IRR
    Project(ProjectArgs),
    /// Internal rate of return of a cash-flow series
    Irr(IrrArgs),
    /// NOI, cap rate, cash-on-cash and IRR for one property
    Property(PropertyArgs),
    /// Deterministic leveraged portfolio simulation
    Portfolio(PortfolioArgs),
    /// Portfolio Monte Carlo over appreciation and rent growth
    MonteCarlo(MonteCarloArgs),
    /// Single-property Monte Carlo yearly paths
    Paths(PathsArgs),
    /// Vacancy and expense shock stress test
    Stress(StressArgs),
    /// Analyse a property register (demo register unless --input is given)
    Register(RegisterArgs),
    /// Print the two-property sample portfolio as JSON
    SamplePortfolio,
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

fn main() {
    let cli = Cli::parse();
    logging::init_logging(&cli.log_level);

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Amortize(args) => commands::mortgage::run_amortize(args),
        Commands::Project(args) => commands::projection::run_project(args),
        Commands::Irr(args) => commands::projection::run_irr(args),
        Commands::Property(args) => commands::projection::run_property(args),
        Commands::Portfolio(args) => commands::portfolio::run_portfolio(args),
        Commands::MonteCarlo(args) => commands::simulation::run_monte_carlo(args),
        Commands::Paths(args) => commands::simulation::run_paths(args),
        Commands::Stress(args) => commands::projection::run_stress(args),
        Commands::Register(args) => commands::register::run_register(args),
        Commands::SamplePortfolio => commands::portfolio::run_sample_portfolio(),
        Commands::Version => {
            println!("rpa {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            debug!("command succeeded");
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
