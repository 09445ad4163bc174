use realty_core::config::IrrConfig;
use realty_core::mortgage::amortization::{amortization_schedule, build_amortization, monthly_payment, AmortizationInput};
use realty_core::time_value::{irr, npv, solve_irr, IrrStatus};

// ===========================================================================
// IRR / NPV
// ===========================================================================

#[test]
fn test_irr_round_trip_through_npv() {
    let flows = [-250_000.0, 20_000.0, 22_000.0, 24_000.0, 300_000.0];
    let rate = irr(&flows);
    assert!(npv(rate, &flows).unwrap().abs() < 1e-3);
}

#[test]
fn test_irr_sentinel_for_short_series() {
    assert_eq!(irr(&[]), 0.0);
    assert_eq!(irr(&[-100.0]), 0.0);
    assert_eq!(
        solve_irr(&[-100.0], &IrrConfig::default()).status,
        IrrStatus::InsufficientData
    );
}

#[test]
fn test_irr_known_value() {
    let rate = irr(&[-100.0, 60.0, 60.0]);
    assert!((rate - 0.1307).abs() < 1e-3, "rate={rate}");
}

#[test]
fn test_npv_rejects_rate_at_minus_one() {
    assert!(npv(-1.0, &[-100.0, 110.0]).is_err());
}

// ===========================================================================
// Amortization
// ===========================================================================

#[test]
fn test_thirty_year_schedule_pays_off() {
    let schedule = amortization_schedule(300_000.0, 0.06, 30);
    assert_eq!(schedule.len(), 360);
    assert_eq!(schedule.last().unwrap().balance, 0.0);
    let payment = monthly_payment(300_000.0, 0.06, 30);
    assert!((payment - 1_798.65).abs() < 0.01, "payment={payment}");
}

#[test]
fn test_principal_share_rises_over_time() {
    let schedule = amortization_schedule(200_000.0, 0.05, 15);
    assert!(schedule[100].principal > schedule[0].principal);
    assert!(schedule[100].interest < schedule[0].interest);
}

#[test]
fn test_build_amortization_totals() {
    let out = build_amortization(&AmortizationInput {
        principal: 100_000.0,
        annual_rate: 0.0,
        years: 10,
    })
    .unwrap()
    .result;
    assert!((out.monthly_payment - 100_000.0 / 120.0).abs() < 1e-9);
    assert!(out.total_interest.abs() < 1e-6);
}
