use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::config::{ExpenseGrowth, IrrConfig};
use crate::error::RealtyError;
use crate::time_value::{solve_irr, IrrSolution};
use crate::types::{with_metadata, ComputationOutput, Money, Rate};
use crate::RealtyResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Assumptions for a single-property hold-period projection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectionInput {
    pub purchase_price: Money,
    /// Year-1 gross potential rent
    pub annual_rent: Money,
    /// Year-1 operating expenses
    pub annual_expenses: Money,
    /// Vacancy and collection loss (0.05 = 5%)
    pub vacancy_rate: Rate,
    /// Annual property value appreciation, used for the terminal value
    pub appreciation_rate: Rate,
    pub rent_growth_rate: Rate,
    pub expense_growth: ExpenseGrowth,
    pub hold_years: u32,
    /// Cash invested at t=0. Defaults to the full purchase price.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initial_outlay: Option<Money>,
}

/// A single year's cash flow summary.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CashFlowSummary {
    pub year: u32,
    /// Rent after vacancy
    pub gross_rent: Money,
    pub expenses: Money,
    pub net_cash_flow: Money,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectionOutput {
    pub projection: Vec<CashFlowSummary>,
    /// Outlay, yearly net flows, terminal value folded into the last flow
    pub cash_flow_series: Vec<Money>,
    pub terminal_value: Money,
    pub irr: IrrSolution,
}

// ---------------------------------------------------------------------------
// Formulas
// ---------------------------------------------------------------------------

/// Project effective rent, expenses and net cash flow for each hold year.
///
/// Year 1 uses the input rent and expenses as given; growth is applied
/// after each year is recorded.
pub fn project_cash_flows(input: &ProjectionInput) -> Vec<CashFlowSummary> {
    let expense_growth = input.expense_growth.rate(input.rent_growth_rate);
    let mut rent = input.annual_rent;
    let mut expenses = input.annual_expenses;

    let mut flows = Vec::with_capacity(input.hold_years as usize);
    for year in 1..=input.hold_years {
        let gross_rent = rent * (1.0 - input.vacancy_rate);
        flows.push(CashFlowSummary {
            year,
            gross_rent,
            expenses,
            net_cash_flow: gross_rent - expenses,
        });
        rent *= 1.0 + input.rent_growth_rate;
        expenses *= 1.0 + expense_growth;
    }
    flows
}

/// Sale value at the end of the hold: price compounded at the appreciation rate.
pub fn terminal_value(input: &ProjectionInput) -> Money {
    input.purchase_price * (1.0 + input.appreciation_rate).powi(input.hold_years as i32)
}

/// Cash-flow series for IRR: `[-outlay, cf_1, ..., cf_n + terminal]`.
pub fn assemble_cash_flow_series(input: &ProjectionInput) -> Vec<Money> {
    let outlay = input.initial_outlay.unwrap_or(input.purchase_price);
    let mut flows = Vec::with_capacity(input.hold_years as usize + 1);
    flows.push(-outlay);
    flows.extend(project_cash_flows(input).iter().map(|s| s.net_cash_flow));
    if let Some(last) = flows.last_mut() {
        *last += terminal_value(input);
    }
    flows
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Project a property's hold period and solve the IRR of the resulting series.
pub fn run_projection(input: &ProjectionInput) -> RealtyResult<ComputationOutput<ProjectionOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    validate_projection(input)?;

    let projection = project_cash_flows(input);
    let cash_flow_series = assemble_cash_flow_series(input);
    let irr = solve_irr(&cash_flow_series, &IrrConfig::default());

    warnings.extend(irr.status.warning());
    if let Some(first) = projection.first() {
        if first.net_cash_flow < 0.0 {
            warnings.push("Year-1 net cash flow is negative".into());
        }
    }

    let output = ProjectionOutput {
        terminal_value: terminal_value(input),
        projection,
        cash_flow_series,
        irr,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Hold-Period Cash Flow Projection",
        input,
        warnings,
        elapsed,
        output,
    ))
}

pub(crate) fn validate_projection(input: &ProjectionInput) -> RealtyResult<()> {
    if input.purchase_price <= 0.0 {
        return Err(RealtyError::invalid("purchase_price", "Purchase price must be positive"));
    }
    if input.annual_rent < 0.0 {
        return Err(RealtyError::invalid("annual_rent", "Rent cannot be negative"));
    }
    if input.annual_expenses < 0.0 {
        return Err(RealtyError::invalid("annual_expenses", "Expenses cannot be negative"));
    }
    if !(0.0..=1.0).contains(&input.vacancy_rate) {
        return Err(RealtyError::invalid("vacancy_rate", "Vacancy rate must be between 0 and 1"));
    }
    if !(1..=40).contains(&input.hold_years) {
        return Err(RealtyError::invalid("hold_years", "Hold period must be between 1 and 40 years"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time_value::IrrStatus;

    fn input(expense_growth: ExpenseGrowth) -> ProjectionInput {
        ProjectionInput {
            purchase_price: 1_000_000.0,
            annual_rent: 100_000.0,
            annual_expenses: 40_000.0,
            vacancy_rate: 0.05,
            appreciation_rate: 0.03,
            rent_growth_rate: 0.04,
            expense_growth,
            hold_years: 3,
            initial_outlay: None,
        }
    }

    #[test]
    fn test_first_year_uses_base_figures() {
        let flows = project_cash_flows(&input(ExpenseGrowth::Independent { rate: 0.01 }));
        assert_eq!(flows.len(), 3);
        assert_eq!(flows[0].year, 1);
        assert!((flows[0].gross_rent - 95_000.0).abs() < 1e-9);
        assert_eq!(flows[0].expenses, 40_000.0);
        assert!((flows[0].net_cash_flow - 55_000.0).abs() < 1e-9);
    }

    #[test]
    fn test_independent_expense_growth() {
        let flows = project_cash_flows(&input(ExpenseGrowth::Independent { rate: 0.01 }));
        assert!((flows[1].expenses - 40_400.0).abs() < 1e-9);
        assert!((flows[1].gross_rent - 98_800.0).abs() < 1e-9);
    }

    #[test]
    fn test_half_rent_expense_growth() {
        let flows = project_cash_flows(&input(ExpenseGrowth::HalfRentGrowth));
        assert!((flows[1].expenses - 40_800.0).abs() < 1e-9);
        assert!((flows[2].expenses - 40_000.0 * 1.02 * 1.02).abs() < 1e-9);
    }

    #[test]
    fn test_series_shape_and_terminal_value() {
        let inp = input(ExpenseGrowth::Independent { rate: 0.01 });
        let series = assemble_cash_flow_series(&inp);
        let flows = project_cash_flows(&inp);
        assert_eq!(series.len(), 4);
        assert_eq!(series[0], -1_000_000.0);
        assert_eq!(series[1], flows[0].net_cash_flow);
        let expected_tv = 1_000_000.0 * 1.03_f64.powi(3);
        assert!((series[3] - (flows[2].net_cash_flow + expected_tv)).abs() < 1e-6);
    }

    #[test]
    fn test_down_payment_outlay() {
        let mut inp = input(ExpenseGrowth::HalfRentGrowth);
        inp.initial_outlay = Some(200_000.0);
        assert_eq!(assemble_cash_flow_series(&inp)[0], -200_000.0);
    }

    #[test]
    fn test_run_projection_solves_positive_irr() {
        let out = run_projection(&input(ExpenseGrowth::Independent { rate: 0.01 })).unwrap();
        assert!(out.result.irr.is_converged());
        assert!(out.warnings.is_empty());
        assert!(out.result.irr.rate > 0.05 && out.result.irr.rate < 0.12);
    }

    #[test]
    fn test_run_projection_warns_on_flat_derivative() {
        // Only the outlay is non-zero, so the NPV slope is zero at any rate
        let mut inp = input(ExpenseGrowth::HalfRentGrowth);
        inp.annual_rent = 0.0;
        inp.annual_expenses = 0.0;
        inp.appreciation_rate = -1.0;
        let out = run_projection(&inp).unwrap();
        assert_eq!(out.result.irr.status, IrrStatus::FlatDerivative);
        assert!(!out.result.irr.is_converged());
        assert!(out
            .warnings
            .iter()
            .any(|w| w.contains("without converging")));
    }

    #[test]
    fn test_run_projection_rejects_bad_vacancy() {
        let mut inp = input(ExpenseGrowth::HalfRentGrowth);
        inp.vacancy_rate = 1.2;
        assert!(run_projection(&inp).is_err());
    }
}
