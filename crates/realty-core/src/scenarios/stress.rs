use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::RealtyError;
use crate::real_estate::property::calculate_noi;
use crate::types::{with_metadata, ComputationOutput, Money, Rate};
use crate::RealtyResult;

/// Shocked vacancy never exceeds this.
const MAX_STRESSED_VACANCY: Rate = 0.95;

/// Baseline figures and the shocks to apply.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StressInput {
    pub noi: Money,
    pub vacancy_rate: Rate,
    pub annual_expenses: Money,
    /// Added to the vacancy rate
    #[serde(default = "default_vacancy_shock")]
    pub vacancy_shock: Rate,
    /// Proportional expense increase (0.10 = +10%)
    #[serde(default = "default_expense_shock")]
    pub expense_shock: Rate,
}

pub(crate) fn default_vacancy_shock() -> Rate {
    0.05
}

pub(crate) fn default_expense_shock() -> Rate {
    0.10
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StressResult {
    pub stressed_noi: Money,
    /// Stressed vacancy rate
    pub vacancy_rate: Rate,
    /// Stressed expenses
    pub expense_load: Money,
    /// Stressed NOI minus baseline NOI
    pub noi_delta: Money,
}

/// Apply vacancy and expense shocks to a baseline NOI.
///
/// Gross rent is rebuilt as `noi + expenses`. That equals the true gross
/// rent only when the baseline vacancy is zero; otherwise the rebuilt figure
/// is already net of the baseline vacancy and the stressed vacancy is
/// applied on top of it.
pub fn stress_scenario(
    noi: Money,
    vacancy_rate: Rate,
    annual_expenses: Money,
    vacancy_shock: Rate,
    expense_shock: Rate,
) -> StressResult {
    let stressed_vacancy = (vacancy_rate + vacancy_shock).min(MAX_STRESSED_VACANCY);
    let stressed_expenses = annual_expenses * (1.0 + expense_shock);
    let stressed_noi = calculate_noi(noi + annual_expenses, stressed_expenses, stressed_vacancy);

    StressResult {
        stressed_noi,
        vacancy_rate: stressed_vacancy,
        expense_load: stressed_expenses,
        noi_delta: stressed_noi - noi,
    }
}

pub fn run_stress_test(input: &StressInput) -> RealtyResult<ComputationOutput<StressResult>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    if !(0.0..=1.0).contains(&input.vacancy_rate) {
        return Err(RealtyError::invalid("vacancy_rate", "Vacancy rate must be between 0 and 1"));
    }
    if input.annual_expenses < 0.0 {
        return Err(RealtyError::invalid("annual_expenses", "Expenses cannot be negative"));
    }

    let result = stress_scenario(
        input.noi,
        input.vacancy_rate,
        input.annual_expenses,
        input.vacancy_shock,
        input.expense_shock,
    );

    if input.vacancy_rate + input.vacancy_shock > MAX_STRESSED_VACANCY {
        warnings.push(format!(
            "Stressed vacancy capped at {:.0}%",
            MAX_STRESSED_VACANCY * 100.0
        ));
    }
    if result.stressed_noi < 0.0 {
        warnings.push("Stressed NOI is negative — property cannot cover expenses".into());
    }

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Vacancy and Expense Shock Stress Test",
        input,
        warnings,
        elapsed,
        result,
    ))
}
