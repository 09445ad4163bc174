use chrono::NaiveDate;
use clap::{Args, Subcommand};
use serde_json::Value;
use tracing::info;

use realty_core::register::analysis::{self, RegisterMonteCarloInput, RegisterStressInput};
use realty_core::real_estate::property::PropertyAssumptions;
use realty_core::register::store::PropertyStore;

use crate::input;

/// Arguments for register-wide analysis
#[derive(Args)]
pub struct RegisterArgs {
    /// JSON array of properties to load instead of the demo register
    #[arg(long, global = true)]
    pub input: Option<String>,

    #[command(subcommand)]
    pub action: RegisterAction,
}

#[derive(Subcommand)]
pub enum RegisterAction {
    /// List registered properties with their metrics
    List,
    /// Per-property Monte Carlo paths and expected IRR
    MonteCarlo {
        /// Simulate only this property
        #[arg(long)]
        property_id: Option<String>,
        #[arg(long, default_value_t = 250)]
        iterations: u32,
        /// Override each property's hold period
        #[arg(long)]
        hold_years: Option<u32>,
        /// Paths returned per property
        #[arg(long, default_value_t = 30)]
        max_paths: usize,
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Average stress results across the register
    Stress {
        #[arg(long)]
        property_id: Option<String>,
        #[arg(long, default_value_t = 0.05)]
        vacancy_shock: f64,
        #[arg(long, default_value_t = 0.10)]
        expense_shock: f64,
    },
    /// Headline totals with monthly trend and risk series
    Analytics {
        /// Last month of the series (YYYY-MM-DD); defaults to today
        #[arg(long)]
        as_of: Option<NaiveDate>,
    },
}

fn load_store(path: Option<&str>) -> Result<PropertyStore, Box<dyn std::error::Error>> {
    let properties: Option<Vec<PropertyAssumptions>> = input::read_input(path, "property register")?;
    match properties {
        Some(properties) => {
            let store = PropertyStore::new();
            for p in properties {
                store.create(p)?;
            }
            info!(count = store.len(), "loaded property register");
            Ok(store)
        }
        None => Ok(PropertyStore::with_demo_properties()?),
    }
}

pub fn run_register(args: RegisterArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let store = load_store(args.input.as_deref())?;

    let value = match args.action {
        RegisterAction::List => serde_json::to_value(store.list())?,
        RegisterAction::MonteCarlo {
            property_id,
            iterations,
            hold_years,
            max_paths,
            seed,
        } => {
            let mc_input = RegisterMonteCarloInput {
                property_id,
                iterations,
                hold_years,
                max_paths,
                seed,
                ..Default::default()
            };
            serde_json::to_value(analysis::run_register_monte_carlo(&store, &mc_input)?)?
        }
        RegisterAction::Stress {
            property_id,
            vacancy_shock,
            expense_shock,
        } => {
            let stress_input = RegisterStressInput {
                property_id,
                vacancy_shock,
                expense_shock,
            };
            serde_json::to_value(analysis::run_register_stress(&store, &stress_input)?)?
        }
        RegisterAction::Analytics { as_of } => {
            let as_of = as_of.unwrap_or_else(|| chrono::Utc::now().date_naive());
            serde_json::to_value(analysis::portfolio_analytics(&store, as_of))?
        }
    };
    Ok(value)
}
