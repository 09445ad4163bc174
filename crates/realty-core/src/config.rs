//! Model variants and solver settings shared by the projection, portfolio and
//! Monte Carlo engines.
//!
//! Two formula families exist for the same capabilities: expenses either grow
//! at their own rate or at half the rent growth rate, and debt service is
//! either capped at the year's rent or charged in full. Both are selectable
//! here; none is applied implicitly except through the documented defaults.

use serde::{Deserialize, Serialize};

use crate::types::{Money, Rate};

/// How operating expenses compound from one year to the next.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "model", rename_all = "snake_case")]
pub enum ExpenseGrowth {
    /// Expenses grow at their own annual rate.
    Independent { rate: Rate },
    /// Expenses grow at half the rent growth rate.
    HalfRentGrowth,
}

impl ExpenseGrowth {
    /// Annual expense growth rate given the rent growth in force.
    pub fn rate(&self, rent_growth: Rate) -> Rate {
        match self {
            ExpenseGrowth::Independent { rate } => *rate,
            ExpenseGrowth::HalfRentGrowth => rent_growth / 2.0,
        }
    }
}

/// How the annual mortgage payment enters the portfolio cash flow.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DebtServiceModel {
    /// Debt service never exceeds the year's rent: `min(payment, rent)`.
    #[default]
    CappedAtRent,
    /// The full annual payment is charged regardless of rent.
    Full,
}

impl DebtServiceModel {
    pub fn annual_charge(&self, annual_payment: Money, rent: Money) -> Money {
        match self {
            DebtServiceModel::CappedAtRent => annual_payment.min(rent),
            DebtServiceModel::Full => annual_payment,
        }
    }
}

/// Formula selection for the deterministic portfolio simulator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModelConfig {
    #[serde(default = "default_portfolio_expense_growth")]
    pub expense_growth: ExpenseGrowth,
    #[serde(default)]
    pub debt_service: DebtServiceModel,
}

fn default_portfolio_expense_growth() -> ExpenseGrowth {
    ExpenseGrowth::HalfRentGrowth
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            expense_growth: default_portfolio_expense_growth(),
            debt_service: DebtServiceModel::default(),
        }
    }
}

/// Newton-Raphson settings for the IRR solver.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IrrConfig {
    pub guess: Rate,
    pub max_iterations: u32,
    /// Stop when |dNPV/dr| falls below this.
    pub derivative_floor: f64,
    /// Converged when the rate moves less than this in one step.
    pub tolerance: f64,
}

impl Default for IrrConfig {
    fn default() -> Self {
        Self {
            guess: 0.10,
            max_iterations: 100,
            derivative_floor: 1e-9,
            tolerance: 1e-7,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_half_rent_growth_rate() {
        assert_eq!(ExpenseGrowth::HalfRentGrowth.rate(0.04), 0.02);
        assert_eq!(ExpenseGrowth::Independent { rate: 0.015 }.rate(0.04), 0.015);
    }

    #[test]
    fn test_debt_service_cap() {
        assert_eq!(DebtServiceModel::CappedAtRent.annual_charge(20_000.0, 12_000.0), 12_000.0);
        assert_eq!(DebtServiceModel::Full.annual_charge(20_000.0, 12_000.0), 20_000.0);
    }

    #[test]
    fn test_model_config_defaults_from_empty_json() {
        let config: ModelConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, ModelConfig::default());
    }

    #[test]
    fn test_expense_growth_tagged_json() {
        let g: ExpenseGrowth =
            serde_json::from_str(r#"{"model":"independent","rate":0.018}"#).unwrap();
        assert_eq!(g, ExpenseGrowth::Independent { rate: 0.018 });
        let h: ExpenseGrowth = serde_json::from_str(r#"{"model":"half_rent_growth"}"#).unwrap();
        assert_eq!(h, ExpenseGrowth::HalfRentGrowth);
    }
}
