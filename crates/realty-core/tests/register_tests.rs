use chrono::NaiveDate;
use pretty_assertions::assert_eq;
use realty_core::register::analysis::{
    portfolio_analytics, run_register_monte_carlo, run_register_stress, RegisterMonteCarloInput,
    RegisterStressInput,
};
use realty_core::real_estate::property::{calculate_cap_rate, calculate_noi, PropertyAssumptions};
use realty_core::register::store::{PropertyStore, PropertyUpdate};
use realty_core::RealtyError;

// ===========================================================================
// Property register and register-wide analysis
// ===========================================================================

fn duplex() -> PropertyAssumptions {
    PropertyAssumptions {
        name: "Maple Street Duplex".into(),
        location: "Portland, OR".into(),
        purchase_price: 600_000.0,
        market_value: 640_000.0,
        annual_rent: 60_000.0,
        annual_expenses: 18_000.0,
        vacancy_rate: 0.05,
        appreciation_rate: 0.03,
        rent_growth_rate: 0.02,
        expense_growth_rate: 0.015,
        hold_years: 10,
    }
}

#[test]
fn test_create_computes_metrics() {
    let store = PropertyStore::new();
    let record = store.create(duplex()).unwrap();
    let noi = calculate_noi(60_000.0, 18_000.0, 0.05);
    assert_eq!(record.analysis.metrics.noi, noi);
    assert_eq!(record.analysis.metrics.cap_rate, calculate_cap_rate(noi, 640_000.0));
    assert_eq!(record.analysis.cashflow_projection.len(), 10);
    assert_eq!(store.get(&record.id).unwrap(), record);
}

#[test]
fn test_listing_preserves_insertion_order() {
    let store = PropertyStore::with_demo_properties().unwrap();
    let created = store.create(duplex()).unwrap();
    let list = store.list();
    assert_eq!(list.len(), 5);
    assert_eq!(list.last().unwrap().id, created.id);
}

#[test]
fn test_update_hold_years_resizes_projection() {
    let store = PropertyStore::new();
    let id = store.create(duplex()).unwrap().id;
    let updated = store
        .update(
            &id,
            PropertyUpdate {
                hold_years: Some(5),
                ..Default::default()
            },
        )
        .unwrap();
    assert_eq!(updated.analysis.cashflow_projection.len(), 5);
}

#[test]
fn test_record_json_is_flat() {
    let store = PropertyStore::new();
    let record = store.create(duplex()).unwrap();
    let json = serde_json::to_value(&record).unwrap();
    assert_eq!(json["name"], "Maple Street Duplex");
    assert!(json["metrics"]["noi"].is_number());
    assert!(json["cashflow_projection"].is_array());
}

#[test]
fn test_register_stress_averages_all() {
    let store = PropertyStore::with_demo_properties().unwrap();
    let out = run_register_stress(&store, &RegisterStressInput::default())
        .unwrap()
        .result;
    assert_eq!(out.properties_stressed, 4);
    assert!(out.avg_noi_delta < 0.0);
    let expected_vacancy = (0.11 + 0.13 + 0.10 + 0.12) / 4.0;
    assert!((out.avg_vacancy - expected_vacancy).abs() < 1e-12);
}

#[test]
fn test_register_stress_after_clear() {
    let store = PropertyStore::with_demo_properties().unwrap();
    store.clear();
    assert!(matches!(
        run_register_stress(&store, &RegisterStressInput::default()),
        Err(RealtyError::InsufficientData(_))
    ));
}

#[test]
fn test_register_monte_carlo_expected_irr_is_mean() {
    let store = PropertyStore::with_demo_properties().unwrap();
    let mean_irr: f64 = store
        .list()
        .iter()
        .map(|r| r.analysis.metrics.irr)
        .sum::<f64>()
        / 4.0;
    let out = run_register_monte_carlo(
        &store,
        &RegisterMonteCarloInput {
            iterations: 60,
            seed: Some(1),
            ..Default::default()
        },
    )
    .unwrap()
    .result;
    assert!((out.expected_irr - mean_irr).abs() < 1e-12);
}

#[test]
fn test_register_monte_carlo_empty_register() {
    let out = run_register_monte_carlo(&PropertyStore::new(), &RegisterMonteCarloInput::default())
        .unwrap();
    assert_eq!(out.result.paths_returned, 0);
    assert_eq!(out.result.expected_irr, 0.0);
    assert!(!out.warnings.is_empty());
}

#[test]
fn test_analytics_tracks_store_changes() {
    let store = PropertyStore::with_demo_properties().unwrap();
    let as_of = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();
    let before = portfolio_analytics(&store, as_of);
    store.create(duplex()).unwrap();
    let after = portfolio_analytics(&store, as_of);
    assert_eq!(
        after.total_portfolio_value - before.total_portfolio_value,
        640_000.0
    );
    assert_eq!(after.growth_trend.last().unwrap().label, "Mar 2025");
}
