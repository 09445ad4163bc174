use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::config::ModelConfig;
use crate::error::RealtyError;
use crate::mortgage::amortization::{amortization_schedule, balance_after_month, monthly_payment};
use crate::types::{with_metadata, ComputationOutput, Money, PortfolioProperty, Rate};
use crate::RealtyResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Deterministic multi-property simulation request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortfolioSimulationInput {
    pub properties: Vec<PortfolioProperty>,
    /// Simulation horizon in years (1..=40)
    pub years: u32,
    #[serde(default = "default_appreciation_rate")]
    pub appreciation_rate: Rate,
    #[serde(default = "default_rent_growth_rate")]
    pub rent_growth_rate: Rate,
    #[serde(default)]
    pub model: ModelConfig,
}

pub(crate) fn default_appreciation_rate() -> Rate {
    0.03
}

pub(crate) fn default_rent_growth_rate() -> Rate {
    0.02
}

/// Per-property outcome over the horizon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyMetrics {
    /// Market value at the end of the horizon
    pub value: Money,
    /// Cash flow of the final year
    pub annual_cashflow: Money,
    pub total_cashflow: Money,
    /// Down payment plus year-0 expenses
    pub total_investment: Money,
    /// Equity at the end of the horizon
    pub equity: Money,
    pub yearly_cashflows: Vec<Money>,
    pub yearly_equity: Vec<Money>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyBreakdown {
    pub name: String,
    pub metrics: PropertyMetrics,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PortfolioTotals {
    pub cashflow: Money,
    pub equity: Money,
    pub investment: Money,
}

impl PortfolioTotals {
    fn add(&mut self, metrics: &PropertyMetrics) {
        self.cashflow += metrics.total_cashflow;
        self.equity += metrics.equity;
        self.investment += metrics.total_investment;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct YearlyPortfolioSnapshot {
    pub year: u32,
    pub annual_cashflow: Money,
    pub cumulative_cashflow: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioResult {
    pub properties: Vec<PropertyBreakdown>,
    pub totals: PortfolioTotals,
    pub yearly: Vec<YearlyPortfolioSnapshot>,
}

// ---------------------------------------------------------------------------
// Simulation
// ---------------------------------------------------------------------------

/// Compound one property's value, rent and expenses over `years`, netting
/// debt service and tracking equity against the amortization schedule.
pub fn property_cashflow(
    property: &PortfolioProperty,
    years: u32,
    appreciation_rate: Rate,
    rent_growth_rate: Rate,
    model: &ModelConfig,
) -> PropertyMetrics {
    let principal = property.purchase_price - property.down_payment;
    let schedule = amortization_schedule(principal, property.mortgage_rate, property.mortgage_years);
    let annual_payment =
        monthly_payment(principal, property.mortgage_rate, property.mortgage_years) * 12.0;
    let expense_growth = model.expense_growth.rate(rent_growth_rate);

    let mut value = property.purchase_price;
    let mut rent = property.annual_rent;
    let mut expenses = property.annual_expenses;

    let mut yearly_cashflows = Vec::with_capacity(years as usize);
    let mut yearly_equity = Vec::with_capacity(years as usize);

    for year in 1..=years {
        value *= 1.0 + appreciation_rate;
        rent *= 1.0 + rent_growth_rate;
        expenses *= 1.0 + expense_growth;

        let debt_service = model.debt_service.annual_charge(annual_payment, rent);
        yearly_cashflows.push(rent - (expenses + debt_service));

        let remaining_balance = balance_after_month(&schedule, year * 12);
        yearly_equity.push((value - remaining_balance).max(0.0));
    }

    PropertyMetrics {
        value,
        annual_cashflow: yearly_cashflows.last().copied().unwrap_or(0.0),
        total_cashflow: yearly_cashflows.iter().sum(),
        total_investment: property.down_payment + property.annual_expenses,
        equity: yearly_equity.last().copied().unwrap_or(property.down_payment),
        yearly_cashflows,
        yearly_equity,
    }
}

/// Horizon totals only, skipping the per-property breakdown and yearly
/// aggregation. Sums in the same order as [`simulate_portfolio`].
pub fn portfolio_totals(
    properties: &[PortfolioProperty],
    years: u32,
    appreciation_rate: Rate,
    rent_growth_rate: Rate,
    model: &ModelConfig,
) -> PortfolioTotals {
    let mut totals = PortfolioTotals::default();
    for p in properties {
        totals.add(&property_cashflow(p, years, appreciation_rate, rent_growth_rate, model));
    }
    totals
}

/// Run every property through [`property_cashflow`] and aggregate.
///
/// Pure and deterministic: identical inputs give bit-identical results.
pub fn simulate_portfolio(input: &PortfolioSimulationInput) -> PortfolioResult {
    let properties: Vec<PropertyBreakdown> = input
        .properties
        .iter()
        .map(|p| PropertyBreakdown {
            name: p.name.clone(),
            metrics: property_cashflow(
                p,
                input.years,
                input.appreciation_rate,
                input.rent_growth_rate,
                &input.model,
            ),
        })
        .collect();

    let mut totals = PortfolioTotals::default();
    for p in &properties {
        totals.add(&p.metrics);
    }

    let mut yearly = Vec::with_capacity(input.years as usize);
    let mut cumulative = 0.0;
    for idx in 0..input.years as usize {
        let annual: Money = properties
            .iter()
            .map(|p| p.metrics.yearly_cashflows[idx])
            .sum();
        cumulative += annual;
        yearly.push(YearlyPortfolioSnapshot {
            year: idx as u32 + 1,
            annual_cashflow: annual,
            cumulative_cashflow: cumulative,
        });
    }

    PortfolioResult {
        properties,
        totals,
        yearly,
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Validated portfolio simulation wrapped in the standard output envelope.
pub fn run_portfolio_simulation(
    input: &PortfolioSimulationInput,
) -> RealtyResult<ComputationOutput<PortfolioResult>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    validate_horizon(input.years)?;
    validate_properties(&input.properties, &mut warnings)?;

    let result = simulate_portfolio(input);

    for p in &result.properties {
        if p.metrics.yearly_cashflows.first().is_some_and(|cf| *cf < 0.0) {
            warnings.push(format!("{}: year-1 cash flow is negative", p.name));
        }
    }

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Deterministic Leveraged Portfolio Projection",
        input,
        warnings,
        elapsed,
        result,
    ))
}

pub(crate) fn validate_horizon(years: u32) -> RealtyResult<()> {
    if !(1..=40).contains(&years) {
        return Err(RealtyError::invalid("years", "Horizon must be between 1 and 40 years"));
    }
    Ok(())
}

pub(crate) fn validate_properties(
    properties: &[PortfolioProperty],
    warnings: &mut Vec<String>,
) -> RealtyResult<()> {
    if properties.is_empty() {
        warnings.push("Portfolio has no properties; totals are zero".into());
    }

    for p in properties {
        let field = |name: &str| format!("{}.{name}", p.name);
        if p.purchase_price <= 0.0 {
            return Err(RealtyError::InvalidInput {
                field: field("purchase_price"),
                reason: "Purchase price must be positive".into(),
            });
        }
        if p.down_payment < 0.0 || p.down_payment > p.purchase_price {
            return Err(RealtyError::InvalidInput {
                field: field("down_payment"),
                reason: "Down payment must be between 0 and the purchase price".into(),
            });
        }
        if p.mortgage_rate < 0.0 {
            return Err(RealtyError::InvalidInput {
                field: field("mortgage_rate"),
                reason: "Mortgage rate cannot be negative".into(),
            });
        }
        if !(1..=40).contains(&p.mortgage_years) {
            return Err(RealtyError::InvalidInput {
                field: field("mortgage_years"),
                reason: "Mortgage term must be between 1 and 40 years".into(),
            });
        }
        if p.annual_rent < 0.0 || p.annual_expenses < 0.0 {
            return Err(RealtyError::InvalidInput {
                field: field("annual_rent"),
                reason: "Rent and expenses cannot be negative".into(),
            });
        }
        if p.down_payment / p.purchase_price < 0.1 {
            warnings.push(format!(
                "{}: down payment below 10% of price — high leverage",
                p.name
            ));
        }
    }
    Ok(())
}

/// Two-property example portfolio: a downtown duplex and a suburban
/// single-family home.
pub fn sample_portfolio() -> Vec<PortfolioProperty> {
    vec![
        PortfolioProperty {
            name: "Downtown Duplex".into(),
            purchase_price: 350_000.0,
            down_payment: 70_000.0,
            mortgage_rate: 0.045,
            mortgage_years: 30,
            annual_rent: 36_000.0,
            annual_expenses: 9_000.0,
        },
        PortfolioProperty {
            name: "Suburban Single Family".into(),
            purchase_price: 280_000.0,
            down_payment: 56_000.0,
            mortgage_rate: 0.042,
            mortgage_years: 30,
            annual_rent: 28_800.0,
            annual_expenses: 7_200.0,
        },
    ]
}
