use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::RealtyError;
use crate::types::{with_metadata, ComputationOutput, Money, Rate};
use crate::RealtyResult;

/// Balances below this are treated as fully repaid.
const BALANCE_EPSILON: f64 = 1e-5;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// One month of a fixed-payment mortgage.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AmortizationEntry {
    /// 1-based month index
    pub month: u32,
    pub payment: Money,
    pub principal: Money,
    pub interest: Money,
    /// Balance remaining after this month's payment
    pub balance: Money,
}

/// Input for a standalone amortization schedule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AmortizationInput {
    /// Loan amount
    pub principal: Money,
    /// Annual interest rate
    pub annual_rate: Rate,
    /// Term in years
    pub years: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AmortizationOutput {
    pub monthly_payment: Money,
    pub annual_payment: Money,
    pub total_paid: Money,
    pub total_interest: Money,
    pub schedule: Vec<AmortizationEntry>,
}

// ---------------------------------------------------------------------------
// Formulas
// ---------------------------------------------------------------------------

/// Standard fixed-rate mortgage payment: P * r(1+r)^n / ((1+r)^n - 1)
///
/// A zero rate amortises straight-line over `years * 12` months.
pub fn monthly_payment(principal: Money, annual_rate: Rate, years: u32) -> Money {
    let n_payments = years * 12;
    if annual_rate == 0.0 {
        return principal / f64::from(n_payments);
    }
    let monthly_rate = annual_rate / 12.0;
    let compound = (1.0 + monthly_rate).powi(n_payments as i32);
    principal * (monthly_rate * compound) / (compound - 1.0)
}

/// Month-by-month schedule. Stops after the month the balance reaches zero,
/// so the last entry always carries the payoff.
pub fn amortization_schedule(principal: Money, annual_rate: Rate, years: u32) -> Vec<AmortizationEntry> {
    let payment = monthly_payment(principal, annual_rate, years);
    let monthly_rate = annual_rate / 12.0;
    let total_months = years * 12;

    let mut schedule = Vec::with_capacity(total_months as usize);
    let mut balance = principal;

    for month in 1..=total_months {
        let interest = balance * monthly_rate;
        let principal_paid = payment - interest;
        balance = (balance - principal_paid).max(0.0);
        if balance < BALANCE_EPSILON {
            balance = 0.0;
        }
        schedule.push(AmortizationEntry {
            month,
            payment,
            principal: principal_paid,
            interest,
            balance,
        });
        if balance == 0.0 {
            break;
        }
    }

    schedule
}

/// Balance outstanding after `month` payments, looked up at the nearest
/// covered month. Months past the payoff read the final (zero) balance.
pub fn balance_after_month(schedule: &[AmortizationEntry], month: u32) -> Money {
    let Some(last) = schedule.last() else {
        return 0.0;
    };
    let month = month.min(last.month);
    schedule
        .iter()
        .find(|e| e.month == month)
        .map(|e| e.balance)
        .unwrap_or(0.0)
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Build a full amortization schedule with payment totals.
pub fn build_amortization(
    input: &AmortizationInput,
) -> RealtyResult<ComputationOutput<AmortizationOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    if input.principal < 0.0 {
        return Err(RealtyError::invalid("principal", "Principal cannot be negative"));
    }
    if input.annual_rate < 0.0 {
        return Err(RealtyError::invalid("annual_rate", "Rate cannot be negative"));
    }
    if !(1..=40).contains(&input.years) {
        return Err(RealtyError::invalid("years", "Term must be between 1 and 40 years"));
    }
    if input.annual_rate > 0.15 {
        warnings.push(format!(
            "Mortgage rate {:.2}% exceeds 15% — verify the rate is annual and decimal",
            input.annual_rate * 100.0
        ));
    }

    let payment = monthly_payment(input.principal, input.annual_rate, input.years);
    let schedule = amortization_schedule(input.principal, input.annual_rate, input.years);
    let total_paid: Money = schedule.iter().map(|e| e.payment).sum();
    let total_interest: Money = schedule.iter().map(|e| e.interest).sum();

    let output = AmortizationOutput {
        monthly_payment: payment,
        annual_payment: payment * 12.0,
        total_paid,
        total_interest,
        schedule,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Fixed-Rate Mortgage Amortization",
        input,
        warnings,
        elapsed,
        output,
    ))
}
