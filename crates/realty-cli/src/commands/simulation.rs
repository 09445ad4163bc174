use clap::Args;
use serde_json::Value;

use realty_core::monte_carlo::simulation::{self, PathSimulationInput, PortfolioMonteCarloInput};
use realty_core::portfolio::simulation::sample_portfolio;

use crate::commands::portfolio::model_from_flags;
use crate::input;

/// Arguments for the portfolio-level Monte Carlo simulation
#[derive(Args)]
pub struct MonteCarloArgs {
    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Horizon in years, applied to the sample portfolio
    #[arg(long, default_value_t = 10)]
    pub years: u32,

    /// Number of trials (1-1000)
    #[arg(long, default_value_t = 500)]
    pub iterations: u32,

    #[arg(long, default_value_t = 0.03)]
    pub appreciation_rate: f64,

    #[arg(long, default_value_t = 0.01)]
    pub appreciation_volatility: f64,

    #[arg(long, default_value_t = 0.02)]
    pub rent_growth_rate: f64,

    #[arg(long, default_value_t = 0.01)]
    pub rent_growth_volatility: f64,

    /// Grow expenses at this rate instead of half the rent growth
    #[arg(long)]
    pub expense_growth_rate: Option<f64>,

    /// Charge the full mortgage payment even when it exceeds rent
    #[arg(long)]
    pub full_debt_service: bool,

    /// Random seed for reproducible runs
    #[arg(long)]
    pub seed: Option<u64>,

    /// Print only the summary, not the individual runs
    #[arg(long)]
    pub summary_only: bool,
}

/// Arguments for single-property Monte Carlo paths
#[derive(Args)]
pub struct PathsArgs {
    /// Path to JSON input file
    #[arg(long)]
    pub input: Option<String>,

    /// Override the iteration count from the input
    #[arg(long)]
    pub iterations: Option<u32>,

    /// Override the seed from the input
    #[arg(long)]
    pub seed: Option<u64>,

    /// Print only the distributions, not the paths
    #[arg(long)]
    pub summary_only: bool,
}

pub fn run_monte_carlo(args: MonteCarloArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let mc_input: PortfolioMonteCarloInput =
        match input::read_input(args.input.as_deref(), "Monte Carlo simulation")? {
            Some(parsed) => parsed,
            None => PortfolioMonteCarloInput {
                properties: sample_portfolio(),
                years: args.years,
                iterations: args.iterations,
                appreciation_rate: args.appreciation_rate,
                appreciation_volatility: args.appreciation_volatility,
                rent_growth_rate: args.rent_growth_rate,
                rent_growth_volatility: args.rent_growth_volatility,
                model: model_from_flags(args.expense_growth_rate, args.full_debt_service),
                seed: args.seed,
            },
        };
    let mut result = simulation::run_portfolio_monte_carlo(&mc_input)?;
    if args.summary_only {
        result.result.runs.clear();
    }
    Ok(serde_json::to_value(result)?)
}

pub fn run_paths(args: PathsArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let mut path_input: PathSimulationInput =
        input::require_input(args.input.as_deref(), "Monte Carlo paths")?;
    if let Some(iterations) = args.iterations {
        path_input.iterations = iterations;
    }
    if args.seed.is_some() {
        path_input.seed = args.seed;
    }
    let mut result = simulation::run_path_simulation(&path_input)?;
    if args.summary_only {
        result.result.paths.clear();
    }
    Ok(serde_json::to_value(result)?)
}
