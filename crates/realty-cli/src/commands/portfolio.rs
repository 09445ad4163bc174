use clap::Args;
use serde_json::Value;

use realty_core::config::{DebtServiceModel, ExpenseGrowth, ModelConfig};
use realty_core::portfolio::simulation::{self, PortfolioSimulationInput};

use crate::input;

/// Arguments for the deterministic portfolio simulation
#[derive(Args)]
pub struct PortfolioArgs {
    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Horizon in years, applied to the sample portfolio
    #[arg(long, default_value_t = 10)]
    pub years: u32,

    /// Annual appreciation rate
    #[arg(long, default_value_t = 0.03)]
    pub appreciation_rate: f64,

    /// Annual rent growth rate
    #[arg(long, default_value_t = 0.02)]
    pub rent_growth_rate: f64,

    /// Grow expenses at this rate instead of half the rent growth
    #[arg(long)]
    pub expense_growth_rate: Option<f64>,

    /// Charge the full mortgage payment even when it exceeds rent
    #[arg(long)]
    pub full_debt_service: bool,
}

/// Build model options from flags; defaults match the JSON defaults.
pub fn model_from_flags(expense_growth_rate: Option<f64>, full_debt_service: bool) -> ModelConfig {
    ModelConfig {
        expense_growth: match expense_growth_rate {
            Some(rate) => ExpenseGrowth::Independent { rate },
            None => ExpenseGrowth::HalfRentGrowth,
        },
        debt_service: if full_debt_service {
            DebtServiceModel::Full
        } else {
            DebtServiceModel::CappedAtRent
        },
    }
}

pub fn run_portfolio(args: PortfolioArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let sim_input: PortfolioSimulationInput =
        match input::read_input(args.input.as_deref(), "portfolio simulation")? {
            Some(parsed) => parsed,
            None => PortfolioSimulationInput {
                properties: simulation::sample_portfolio(),
                years: args.years,
                appreciation_rate: args.appreciation_rate,
                rent_growth_rate: args.rent_growth_rate,
                model: model_from_flags(args.expense_growth_rate, args.full_debt_service),
            },
        };
    let result = simulation::run_portfolio_simulation(&sim_input)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_sample_portfolio() -> Result<Value, Box<dyn std::error::Error>> {
    Ok(serde_json::to_value(simulation::sample_portfolio())?)
}
