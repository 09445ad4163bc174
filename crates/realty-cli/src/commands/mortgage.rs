use clap::Args;
use serde_json::Value;

use realty_core::mortgage::amortization::{self, AmortizationInput};

use crate::input;

/// Arguments for a mortgage amortization schedule
#[derive(Args)]
pub struct AmortizeArgs {
    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Loan amount
    #[arg(long)]
    pub principal: Option<f64>,

    /// Annual interest rate as a decimal (0.045 = 4.5%)
    #[arg(long)]
    pub rate: Option<f64>,

    /// Term in years
    #[arg(long)]
    pub years: Option<u32>,

    /// Omit the month-by-month schedule from the output
    #[arg(long)]
    pub summary_only: bool,
}

pub fn run_amortize(args: AmortizeArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let amort_input: AmortizationInput = match input::read_input(args.input.as_deref(), "amortization")? {
        Some(parsed) => parsed,
        None => AmortizationInput {
            principal: args
                .principal
                .ok_or("--principal is required (or provide --input)")?,
            annual_rate: args.rate.ok_or("--rate is required (or provide --input)")?,
            years: args.years.ok_or("--years is required (or provide --input)")?,
        },
    };

    let mut result = amortization::build_amortization(&amort_input)?;
    if args.summary_only {
        result.result.schedule.clear();
    }
    Ok(serde_json::to_value(result)?)
}
