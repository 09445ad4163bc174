use napi::Result as NapiResult;
use napi_derive::napi;
use std::sync::OnceLock;

use realty_core::register::store::{demo_properties, PropertyStore, PropertyUpdate};

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

static STORE: OnceLock<PropertyStore> = OnceLock::new();

/// Process-wide register, seeded with the demo properties on first use.
/// A seeding failure is returned to the caller and retried on the next call.
fn register() -> NapiResult<&'static PropertyStore> {
    if let Some(store) = STORE.get() {
        return Ok(store);
    }
    let seeded = PropertyStore::with_demo_properties().map_err(to_napi_error)?;
    Ok(STORE.get_or_init(|| seeded))
}

#[derive(serde::Serialize)]
struct ResetSummary {
    removed: usize,
    seeded: usize,
}

// ---------------------------------------------------------------------------
// Mortgage and time value
// ---------------------------------------------------------------------------

#[napi]
pub fn amortization_schedule(input_json: String) -> NapiResult<String> {
    let input: realty_core::mortgage::amortization::AmortizationInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = realty_core::mortgage::amortization::build_amortization(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn calculate_irr(input_json: String) -> NapiResult<String> {
    let input: realty_core::time_value::IrrInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = realty_core::time_value::calculate_irr(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Single property
// ---------------------------------------------------------------------------

#[napi]
pub fn project_cash_flows(input_json: String) -> NapiResult<String> {
    let input: realty_core::real_estate::cash_flow::ProjectionInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = realty_core::real_estate::cash_flow::run_projection(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn analyze_property(input_json: String) -> NapiResult<String> {
    let input: realty_core::real_estate::property::PropertyAssumptions =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = realty_core::real_estate::property::run_property_analysis(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn stress_test(input_json: String) -> NapiResult<String> {
    let input: realty_core::scenarios::stress::StressInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = realty_core::scenarios::stress::run_stress_test(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Portfolio and Monte Carlo
// ---------------------------------------------------------------------------

#[napi]
pub fn simulate_portfolio(input_json: String) -> NapiResult<String> {
    let input: realty_core::portfolio::simulation::PortfolioSimulationInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output =
        realty_core::portfolio::simulation::run_portfolio_simulation(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn sample_portfolio() -> NapiResult<String> {
    serde_json::to_string(&realty_core::portfolio::simulation::sample_portfolio()).map_err(to_napi_error)
}

#[napi]
pub fn portfolio_monte_carlo(input_json: String) -> NapiResult<String> {
    let input: realty_core::monte_carlo::simulation::PortfolioMonteCarloInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output =
        realty_core::monte_carlo::simulation::run_portfolio_monte_carlo(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn monte_carlo_paths(input_json: String) -> NapiResult<String> {
    let input: realty_core::monte_carlo::simulation::PathSimulationInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = realty_core::monte_carlo::simulation::run_path_simulation(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Property register
// ---------------------------------------------------------------------------

#[napi]
pub fn list_properties() -> NapiResult<String> {
    serde_json::to_string(&register()?.list()).map_err(to_napi_error)
}

#[napi]
pub fn get_property(id: String) -> NapiResult<String> {
    let record = register()?.get(&id).map_err(to_napi_error)?;
    serde_json::to_string(&record).map_err(to_napi_error)
}

#[napi]
pub fn create_property(input_json: String) -> NapiResult<String> {
    let input: realty_core::real_estate::property::PropertyAssumptions =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let record = register()?.create(input).map_err(to_napi_error)?;
    serde_json::to_string(&record).map_err(to_napi_error)
}

#[napi]
pub fn update_property(id: String, update_json: String) -> NapiResult<String> {
    let update: PropertyUpdate = serde_json::from_str(&update_json).map_err(to_napi_error)?;
    let record = register()?.update(&id, update).map_err(to_napi_error)?;
    serde_json::to_string(&record).map_err(to_napi_error)
}

#[napi]
pub fn delete_property(id: String) -> NapiResult<()> {
    register()?.delete(&id).map_err(to_napi_error)
}

#[napi]
pub fn register_monte_carlo(input_json: String) -> NapiResult<String> {
    let input: realty_core::register::analysis::RegisterMonteCarloInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = realty_core::register::analysis::run_register_monte_carlo(register()?, &input)
        .map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn register_stress(input_json: String) -> NapiResult<String> {
    let input: realty_core::register::analysis::RegisterStressInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output =
        realty_core::register::analysis::run_register_stress(register()?, &input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

/// Empty the register, re-seeding the demo properties unless `reseed` is false.
#[napi]
pub fn reset_register(reseed: Option<bool>) -> NapiResult<String> {
    let seeds = if reseed.unwrap_or(true) {
        demo_properties()
    } else {
        Vec::new()
    };
    let seeded = seeds.len();
    let removed = register()?.replace_all(seeds).map_err(to_napi_error)?;
    serde_json::to_string(&ResetSummary { removed, seeded }).map_err(to_napi_error)
}

/// `as_of` is `YYYY-MM-DD`; today (UTC) when omitted.
#[napi]
pub fn portfolio_analytics(as_of: Option<String>) -> NapiResult<String> {
    let as_of = match as_of {
        Some(s) => chrono::NaiveDate::parse_from_str(&s, "%Y-%m-%d").map_err(to_napi_error)?,
        None => chrono::Utc::now().date_naive(),
    };
    let output = realty_core::register::analysis::portfolio_analytics(register()?, as_of);
    serde_json::to_string(&output).map_err(to_napi_error)
}
