use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::real_estate::cash_flow::{
    assemble_cash_flow_series, project_cash_flows, validate_projection, CashFlowSummary,
    ProjectionInput,
};
use crate::config::{ExpenseGrowth, IrrConfig};
use crate::error::RealtyError;
use crate::time_value::{solve_irr, IrrStatus};
use crate::types::{with_metadata, ComputationOutput, Money, Rate};
use crate::RealtyResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Operating assumptions for a held property.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyAssumptions {
    pub name: String,
    /// City or metro area
    #[serde(default)]
    pub location: String,
    pub purchase_price: Money,
    pub market_value: Money,
    pub annual_rent: Money,
    pub annual_expenses: Money,
    pub vacancy_rate: Rate,
    #[serde(default = "default_appreciation")]
    pub appreciation_rate: Rate,
    #[serde(default = "default_rent_growth")]
    pub rent_growth_rate: Rate,
    #[serde(default = "default_expense_growth")]
    pub expense_growth_rate: Rate,
    #[serde(default = "default_hold_years")]
    pub hold_years: u32,
}

fn default_appreciation() -> Rate {
    0.03
}

fn default_rent_growth() -> Rate {
    0.02
}

fn default_expense_growth() -> Rate {
    0.015
}

fn default_hold_years() -> u32 {
    10
}

/// Headline income and return metrics.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IncomeMetrics {
    pub noi: Money,
    pub cap_rate: Rate,
    /// 0.0 when `irr_status` says the search failed
    pub irr: Rate,
    pub irr_status: IrrStatus,
    pub cash_on_cash_return: Rate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyAnalysis {
    pub metrics: IncomeMetrics,
    pub cashflow_projection: Vec<CashFlowSummary>,
}

impl PropertyAssumptions {
    /// Hold-period projection with the property's own expense growth rate,
    /// financed entirely with equity at the purchase price.
    pub fn projection_input(&self) -> ProjectionInput {
        ProjectionInput {
            purchase_price: self.purchase_price,
            annual_rent: self.annual_rent,
            annual_expenses: self.annual_expenses,
            vacancy_rate: self.vacancy_rate,
            appreciation_rate: self.appreciation_rate,
            rent_growth_rate: self.rent_growth_rate,
            expense_growth: ExpenseGrowth::Independent {
                rate: self.expense_growth_rate,
            },
            hold_years: self.hold_years,
            initial_outlay: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Formulas
// ---------------------------------------------------------------------------

/// Net Operating Income: rent after vacancy minus operating expenses.
pub fn calculate_noi(annual_rent: Money, annual_expenses: Money, vacancy_rate: Rate) -> Money {
    annual_rent * (1.0 - vacancy_rate) - annual_expenses
}

/// NOI over market value; 0.0 when the value is not positive.
pub fn calculate_cap_rate(noi: Money, market_value: Money) -> Rate {
    if market_value <= 0.0 {
        return 0.0;
    }
    noi / market_value
}

/// NOI over initial equity; 0.0 when no equity was invested.
pub fn calculate_cash_on_cash(noi: Money, initial_equity: Money) -> Rate {
    if initial_equity <= 0.0 {
        return 0.0;
    }
    noi / initial_equity
}

/// Arithmetic mean, 0.0 for an empty slice.
pub fn average(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Year-1 income metrics plus the hold-period projection.
///
/// Cash-on-cash is measured against the full purchase price, matching the
/// all-equity series the IRR is solved on.
pub fn analyze_property(assumptions: &PropertyAssumptions) -> PropertyAnalysis {
    let projection = assumptions.projection_input();
    let cashflow_projection = project_cash_flows(&projection);
    let series = assemble_cash_flow_series(&projection);
    let irr = solve_irr(&series, &IrrConfig::default());

    let noi = calculate_noi(
        assumptions.annual_rent,
        assumptions.annual_expenses,
        assumptions.vacancy_rate,
    );

    PropertyAnalysis {
        metrics: IncomeMetrics {
            noi,
            cap_rate: calculate_cap_rate(noi, assumptions.market_value),
            irr: irr.rate,
            irr_status: irr.status,
            cash_on_cash_return: calculate_cash_on_cash(noi, assumptions.purchase_price),
        },
        cashflow_projection,
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

pub fn run_property_analysis(
    assumptions: &PropertyAssumptions,
) -> RealtyResult<ComputationOutput<PropertyAnalysis>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    validate_assumptions(assumptions)?;

    let analysis = analyze_property(assumptions);
    let m = &analysis.metrics;

    if m.noi < 0.0 {
        warnings.push("NOI is negative — expenses exceed effective rent".into());
    }
    if m.cap_rate > 0.0 && m.cap_rate < 0.03 {
        warnings.push(format!(
            "Cap rate {:.2}% is below 3% — unusually low, verify market value",
            m.cap_rate * 100.0
        ));
    }
    if m.cap_rate > 0.12 {
        warnings.push(format!(
            "Cap rate {:.2}% exceeds 12% — unusually high, may indicate elevated risk",
            m.cap_rate * 100.0
        ));
    }
    if assumptions.vacancy_rate > 0.15 {
        warnings.push(format!(
            "Vacancy rate {:.1}% exceeds 15% — above typical market norms",
            assumptions.vacancy_rate * 100.0
        ));
    }
    warnings.extend(m.irr_status.warning());

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Property Income Analysis (NOI, cap rate, cash-on-cash, unlevered IRR)",
        assumptions,
        warnings,
        elapsed,
        analysis,
    ))
}

pub(crate) fn validate_assumptions(assumptions: &PropertyAssumptions) -> RealtyResult<()> {
    if assumptions.name.trim().is_empty() {
        return Err(RealtyError::invalid("name", "Property name is required"));
    }
    if assumptions.market_value <= 0.0 {
        return Err(RealtyError::invalid("market_value", "Market value must be positive"));
    }
    validate_projection(&assumptions.projection_input())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn aurora() -> PropertyAssumptions {
        PropertyAssumptions {
            name: "Aurora High-Rise".into(),
            location: "Seattle, WA".into(),
            purchase_price: 4_200_000.0,
            market_value: 4_850_000.0,
            annual_rent: 620_000.0,
            annual_expenses: 260_000.0,
            vacancy_rate: 0.06,
            appreciation_rate: 0.035,
            rent_growth_rate: 0.025,
            expense_growth_rate: 0.018,
            hold_years: 10,
        }
    }

    #[test]
    fn test_noi() {
        assert!((calculate_noi(620_000.0, 260_000.0, 0.06) - 322_800.0).abs() < 1e-6);
    }

    #[test]
    fn test_cap_rate_guards_non_positive_value() {
        assert_eq!(calculate_cap_rate(50_000.0, 0.0), 0.0);
        assert_eq!(calculate_cap_rate(50_000.0, -1.0), 0.0);
        assert_eq!(calculate_cap_rate(50_000.0, 1_000_000.0), 0.05);
    }

    #[test]
    fn test_cash_on_cash_guards_non_positive_equity() {
        assert_eq!(calculate_cash_on_cash(10_000.0, 0.0), 0.0);
        assert_eq!(calculate_cash_on_cash(10_000.0, 100_000.0), 0.1);
    }

    #[test]
    fn test_average_empty() {
        assert_eq!(average(&[]), 0.0);
        assert_eq!(average(&[1.0, 2.0, 3.0]), 2.0);
    }

    #[test]
    fn test_analyze_property() {
        let analysis = analyze_property(&aurora());
        let m = analysis.metrics;
        assert!((m.noi - 322_800.0).abs() < 1e-6);
        assert!((m.cap_rate - 322_800.0 / 4_850_000.0).abs() < 1e-12);
        assert!((m.cash_on_cash_return - 322_800.0 / 4_200_000.0).abs() < 1e-12);
        assert_eq!(m.irr_status, IrrStatus::Converged);
        // Roughly yield plus appreciation
        assert!(m.irr > 0.08 && m.irr < 0.14, "irr={}", m.irr);
        assert_eq!(analysis.cashflow_projection.len(), 10);
    }

    #[test]
    fn test_defaults_from_json() {
        let a: PropertyAssumptions = serde_json::from_str(
            r#"{"name":"X","purchase_price":100.0,"market_value":100.0,
                "annual_rent":10.0,"annual_expenses":1.0,"vacancy_rate":0.0}"#,
        )
        .unwrap();
        assert_eq!(a.hold_years, 10);
        assert_eq!(a.expense_growth_rate, 0.015);
        assert_eq!(a.location, "");
    }

    #[test]
    fn test_run_rejects_missing_market_value() {
        let mut a = aurora();
        a.market_value = 0.0;
        assert!(run_property_analysis(&a).is_err());
    }

    #[test]
    fn test_run_warns_when_irr_does_not_converge() {
        let mut a = aurora();
        a.annual_rent = 0.0;
        a.annual_expenses = 0.0;
        a.appreciation_rate = -1.0;
        let out = run_property_analysis(&a).unwrap();
        assert_eq!(out.result.metrics.irr_status, IrrStatus::FlatDerivative);
        assert!(out
            .warnings
            .iter()
            .any(|w| w.contains("without converging")));
    }

    #[test]
    fn test_run_warns_on_high_vacancy() {
        let mut a = aurora();
        a.vacancy_rate = 0.2;
        let out = run_property_analysis(&a).unwrap();
        assert!(out.warnings.iter().any(|w| w.contains("Vacancy")));
    }
}
