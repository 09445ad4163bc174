use clap::Args;
use serde_json::Value;

use realty_core::real_estate::cash_flow::{self, ProjectionInput};
use realty_core::config::IrrConfig;
use realty_core::real_estate::property::{self, PropertyAssumptions};
use realty_core::scenarios::stress::{self, StressInput};
use realty_core::time_value::{self, IrrInput};

use crate::input;

/// Arguments for a hold-period cash-flow projection
#[derive(Args)]
pub struct ProjectArgs {
    /// Path to JSON input file
    #[arg(long)]
    pub input: Option<String>,
}

/// Arguments for a standalone IRR calculation
#[derive(Args)]
pub struct IrrArgs {
    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Periodic cash flows (comma-separated, e.g. "-100,60,60")
    #[arg(long, value_delimiter = ',', allow_hyphen_values = true)]
    pub cash_flows: Option<Vec<f64>>,

    /// Starting guess for the Newton-Raphson search
    #[arg(long)]
    pub guess: Option<f64>,
}

/// Arguments for single-property income metrics
#[derive(Args)]
pub struct PropertyArgs {
    /// Path to JSON input file
    #[arg(long)]
    pub input: Option<String>,
}

/// Arguments for a vacancy/expense stress test
#[derive(Args)]
pub struct StressArgs {
    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Baseline net operating income
    #[arg(long, allow_hyphen_values = true)]
    pub noi: Option<f64>,

    /// Baseline vacancy rate
    #[arg(long)]
    pub vacancy_rate: Option<f64>,

    /// Baseline annual operating expenses
    #[arg(long)]
    pub annual_expenses: Option<f64>,

    /// Added to the vacancy rate
    #[arg(long, default_value_t = 0.05)]
    pub vacancy_shock: f64,

    /// Proportional expense increase
    #[arg(long, default_value_t = 0.10)]
    pub expense_shock: f64,
}

pub fn run_project(args: ProjectArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let proj_input: ProjectionInput =
        input::require_input(args.input.as_deref(), "cash-flow projection")?;
    let result = cash_flow::run_projection(&proj_input)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_irr(args: IrrArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let irr_input: IrrInput = match input::read_input(args.input.as_deref(), "IRR")? {
        Some(parsed) => parsed,
        None => {
            let cash_flows = args
                .cash_flows
                .ok_or("--cash-flows is required (or provide --input)")?;
            let mut config = IrrConfig::default();
            if let Some(guess) = args.guess {
                config.guess = guess;
            }
            IrrInput { cash_flows, config }
        }
    };
    let result = time_value::calculate_irr(&irr_input)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_property(args: PropertyArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let assumptions: PropertyAssumptions =
        input::require_input(args.input.as_deref(), "property analysis")?;
    let result = property::run_property_analysis(&assumptions)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_stress(args: StressArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let stress_input: StressInput = match input::read_input(args.input.as_deref(), "stress test")? {
        Some(parsed) => parsed,
        None => StressInput {
            noi: args.noi.ok_or("--noi is required (or provide --input)")?,
            vacancy_rate: args
                .vacancy_rate
                .ok_or("--vacancy-rate is required (or provide --input)")?,
            annual_expenses: args
                .annual_expenses
                .ok_or("--annual-expenses is required (or provide --input)")?,
            vacancy_shock: args.vacancy_shock,
            expense_shock: args.expense_shock,
        },
    };
    let result = stress::run_stress_test(&stress_input)?;
    Ok(serde_json::to_value(result)?)
}
