use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::debug;

use crate::config::IrrConfig;
use crate::error::RealtyError;
use crate::types::{with_metadata, ComputationOutput, Money, Rate};
use crate::RealtyResult;

/// Why the IRR search stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IrrStatus {
    /// The rate moved less than the tolerance in the last step.
    Converged,
    /// The NPV derivative underflowed; the last guess is reported.
    FlatDerivative,
    /// Ran out of iterations; the last guess is reported.
    IterationLimit,
    /// Fewer than two cash flows. Rate is the 0.0 sentinel.
    InsufficientData,
    /// The search produced NaN or infinity. Rate is the 0.0 sentinel.
    Diverged,
}

impl IrrStatus {
    /// Warning for any outcome other than convergence.
    pub fn warning(self) -> Option<String> {
        match self {
            IrrStatus::Converged => None,
            IrrStatus::FlatDerivative | IrrStatus::IterationLimit => Some(format!(
                "IRR search stopped without converging ({self:?}); last estimate reported"
            )),
            IrrStatus::InsufficientData | IrrStatus::Diverged => Some(format!(
                "IRR could not be determined ({self:?}); reported as 0.0"
            )),
        }
    }
}

/// Outcome of a Newton-Raphson IRR search.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IrrSolution {
    pub rate: Rate,
    pub status: IrrStatus,
    pub iterations: u32,
}

impl IrrSolution {
    /// False when `rate` is the 0.0 "could not determine" sentinel.
    pub fn is_determined(&self) -> bool {
        !matches!(
            self.status,
            IrrStatus::InsufficientData | IrrStatus::Diverged
        )
    }

    /// True only when the rate is a converged root.
    pub fn is_converged(&self) -> bool {
        self.status == IrrStatus::Converged
    }

    fn sentinel(status: IrrStatus, iterations: u32) -> Self {
        IrrSolution {
            rate: 0.0,
            status,
            iterations,
        }
    }
}

/// Cash-flow series for a standalone IRR calculation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IrrInput {
    /// Period cash flows, t=0 first
    pub cash_flows: Vec<Money>,
    #[serde(default)]
    pub config: IrrConfig,
}

/// Net Present Value of a series of cash flows
pub fn npv(rate: Rate, cash_flows: &[Money]) -> RealtyResult<Money> {
    if rate <= -1.0 {
        return Err(RealtyError::InvalidInput {
            field: "rate".into(),
            reason: "Discount rate must be greater than -100%".into(),
        });
    }

    let one_plus_r = 1.0 + rate;
    let mut discount = 1.0;
    let mut result = 0.0;

    for (t, cf) in cash_flows.iter().enumerate() {
        if t > 0 {
            discount *= one_plus_r;
        }
        result += cf / discount;
    }

    Ok(result)
}

/// Internal Rate of Return using Newton-Raphson from a 10% guess.
///
/// Returns 0.0 when the series has fewer than two flows or the search
/// diverges. That 0.0 means "could not determine", not a zero return; use
/// [`solve_irr`] to tell the two apart.
pub fn irr(cash_flows: &[Money]) -> Rate {
    solve_irr(cash_flows, &IrrConfig::default()).rate
}

/// Newton-Raphson IRR search reporting why it stopped.
///
/// There is no bracketing fallback, so series with several sign changes may
/// settle on any root or none.
pub fn solve_irr(cash_flows: &[Money], config: &IrrConfig) -> IrrSolution {
    if cash_flows.len() < 2 {
        return IrrSolution::sentinel(IrrStatus::InsufficientData, 0);
    }

    let mut guess = config.guess;
    let mut status = IrrStatus::IterationLimit;
    let mut iterations = 0;

    for i in 0..config.max_iterations {
        iterations = i + 1;
        let (npv_val, derivative) = npv_and_derivative(guess, cash_flows);

        if derivative.abs() < config.derivative_floor {
            status = IrrStatus::FlatDerivative;
            break;
        }

        let next = guess - npv_val / derivative;
        if !next.is_finite() {
            debug!(iterations, "IRR search diverged");
            return IrrSolution::sentinel(IrrStatus::Diverged, iterations);
        }

        let step = (next - guess).abs();
        guess = next;
        if step < config.tolerance {
            status = IrrStatus::Converged;
            break;
        }
    }

    if !guess.is_finite() {
        return IrrSolution::sentinel(IrrStatus::Diverged, iterations);
    }

    debug!(rate = guess, ?status, iterations, "IRR search finished");
    IrrSolution {
        rate: guess,
        status,
        iterations,
    }
}

/// Solve the IRR of a cash-flow series, reporting the solver status.
pub fn calculate_irr(input: &IrrInput) -> RealtyResult<ComputationOutput<IrrSolution>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    if input.config.max_iterations == 0 {
        return Err(RealtyError::invalid("config.max_iterations", "Must be at least 1"));
    }

    let has_outflow = input.cash_flows.iter().any(|cf| *cf < 0.0);
    let has_inflow = input.cash_flows.iter().any(|cf| *cf > 0.0);
    if !(has_outflow && has_inflow) {
        warnings.push("Cash flows do not change sign; no IRR exists".into());
    }

    let solution = solve_irr(&input.cash_flows, &input.config);
    warnings.extend(solution.status.warning());

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Internal Rate of Return (Newton-Raphson)",
        input,
        warnings,
        elapsed,
        solution,
    ))
}

/// NPV at `rate` and its derivative with respect to the rate.
fn npv_and_derivative(rate: Rate, cash_flows: &[Money]) -> (f64, f64) {
    let one_plus_r = 1.0 + rate;
    let mut npv_val = 0.0;
    let mut derivative = 0.0;

    for (t, cf) in cash_flows.iter().enumerate() {
        let t = t as i32;
        npv_val += cf / one_plus_r.powi(t);
        if t > 0 {
            derivative -= f64::from(t) * cf / one_plus_r.powi(t + 1);
        }
    }

    (npv_val, derivative)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_npv_basic() {
        let cfs = vec![-1000.0, 300.0, 400.0, 500.0];
        let result = npv(0.10, &cfs).unwrap();
        // -1000 + 300/1.1 + 400/1.21 + 500/1.331 ≈ -21.04
        assert!((result - -21.04).abs() < 0.01, "npv={result}");
    }

    #[test]
    fn test_npv_zero_rate() {
        let cfs = vec![-100.0, 50.0, 50.0, 50.0];
        assert_eq!(npv(0.0, &cfs).unwrap(), 50.0);
    }

    #[test]
    fn test_npv_rejects_rate_below_minus_one() {
        assert!(npv(-1.5, &[-100.0, 200.0]).is_err());
    }

    #[test]
    fn test_irr_two_period() {
        // -100 + 60/(1+r) + 60/(1+r)^2 = 0  =>  r ≈ 13.07%
        let rate = irr(&[-100.0, 60.0, 60.0]);
        assert!(rate > 0.0);
        assert!((rate - 0.1307).abs() < 1e-3, "rate={rate}");
    }

    #[test]
    fn test_irr_zeroes_npv() {
        let cfs = vec![-1000.0, 400.0, 400.0, 400.0];
        let solution = solve_irr(&cfs, &IrrConfig::default());
        assert_eq!(solution.status, IrrStatus::Converged);
        assert!(npv(solution.rate, &cfs).unwrap().abs() < 1e-6);
    }

    #[test]
    fn test_irr_single_flow_is_sentinel() {
        assert_eq!(irr(&[1.0]), 0.0);
        let solution = solve_irr(&[1.0], &IrrConfig::default());
        assert_eq!(solution.status, IrrStatus::InsufficientData);
        assert!(!solution.is_determined());
    }

    #[test]
    fn test_irr_empty_is_sentinel() {
        assert_eq!(irr(&[]), 0.0);
    }

    #[test]
    fn test_genuine_zero_irr_is_determined() {
        let solution = solve_irr(&[-100.0, 100.0], &IrrConfig::default());
        assert!(solution.is_determined());
        assert!(solution.is_converged());
        assert!(solution.rate.abs() < 1e-9, "rate={}", solution.rate);
    }

    #[test]
    fn test_irr_no_sign_change_does_not_converge() {
        let solution = solve_irr(&[100.0, 100.0], &IrrConfig::default());
        assert_ne!(solution.status, IrrStatus::Converged);
    }

    #[test]
    fn test_iteration_limit_reported() {
        let config = IrrConfig {
            max_iterations: 1,
            ..IrrConfig::default()
        };
        let solution = solve_irr(&[-1000.0, 400.0, 400.0, 400.0], &config);
        assert_eq!(solution.status, IrrStatus::IterationLimit);
        assert_eq!(solution.iterations, 1);
    }

    #[test]
    fn test_status_warnings() {
        assert_eq!(IrrStatus::Converged.warning(), None);
        assert!(IrrStatus::FlatDerivative
            .warning()
            .is_some_and(|w| w.contains("last estimate")));
        assert!(IrrStatus::Diverged
            .warning()
            .is_some_and(|w| w.contains("reported as 0.0")));
    }

    #[test]
    fn test_calculate_irr_warns_without_sign_change() {
        let input = IrrInput {
            cash_flows: vec![100.0, 100.0],
            config: IrrConfig::default(),
        };
        let out = calculate_irr(&input).unwrap();
        assert!(out.warnings.iter().any(|w| w.contains("sign")));
    }

    #[test]
    fn test_irr_input_default_config() {
        let input: IrrInput = serde_json::from_str(r#"{"cash_flows":[-100.0,60.0,60.0]}"#).unwrap();
        assert_eq!(input.config, IrrConfig::default());
        let out = calculate_irr(&input).unwrap();
        assert_eq!(out.result.status, IrrStatus::Converged);
        assert!(out.warnings.is_empty());
    }
}
