//! Flat-tax behavior: the per-level AGI floor and revenue monotonicity.

use std::sync::Arc;
use ubiplan_core::{
    config::EngineConfig,
    data::{MicroData, US},
    engine::{ReformEngine, ReformOutcome},
    selection::{ReformLevel, ReformSelection},
    synthetic::{self, SyntheticConfig},
};

fn fixture(config: EngineConfig) -> ReformEngine {
    let data = MicroData::default_test().unwrap();
    ReformEngine::new(Arc::new(data), config)
}

fn new_taxes(engine: &ReformEngine, outcome: &ReformOutcome, id: i64) -> f64 {
    outcome
        .target_units
        .iter()
        .find(|ru| engine.data().units[ru.unit].spmfamunit == id)
        .map(|ru| ru.new_taxes)
        .unwrap()
}

fn flat_tax_only(level: ReformLevel, state: &str, rate: f64) -> ReformSelection {
    ReformSelection {
        income_tax_rate: rate,
        ..ReformSelection::no_op(level, state)
    }
}

#[test]
fn federal_flat_tax_floors_negative_agi() {
    let engine = fixture(EngineConfig::default());
    let outcome = engine.apply_reform(&flat_tax_only(ReformLevel::Federal, US, 0.5));

    // Unit 4 has AGI -3,000; unit 1 has AGI 21,000.
    assert_eq!(new_taxes(&engine, &outcome, 4), 0.0);
    assert_eq!(new_taxes(&engine, &outcome, 1), 10_500.0);
}

#[test]
fn state_flat_tax_applies_to_negative_agi() {
    let engine = fixture(EngineConfig::default());
    let outcome = engine.apply_reform(&flat_tax_only(ReformLevel::State, "Alaska", 0.5));

    // No floor at state level: a loss year yields a negative tax.
    assert_eq!(new_taxes(&engine, &outcome, 4), -1_500.0);
    assert_eq!(new_taxes(&engine, &outcome, 3), 23_500.0);
}

#[test]
fn state_floor_is_configurable() {
    let engine = fixture(EngineConfig {
        flat_tax_floor_state: true,
        ..EngineConfig::default()
    });
    let outcome = engine.apply_reform(&flat_tax_only(ReformLevel::State, "Alaska", 0.5));

    assert_eq!(new_taxes(&engine, &outcome, 4), 0.0);
}

#[test]
fn zero_rate_collects_nothing() {
    let engine = fixture(EngineConfig::default());
    let outcome = engine.apply_reform(&flat_tax_only(ReformLevel::Federal, US, 0.0));

    for ru in &outcome.target_units {
        assert_eq!(ru.new_taxes, 0.0);
    }
    assert_eq!(outcome.revenue, 0.0);
}

#[test]
fn revenue_is_monotonic_in_the_rate() {
    let data = synthetic::generate(&SyntheticConfig {
        seed: 3,
        state_count: 5,
        unit_count: 700,
    })
    .unwrap();
    let engine = ReformEngine::new(Arc::new(data), EngineConfig::default());

    let mut last = f64::NEG_INFINITY;
    for step in 0..=10 {
        let rate = step as f64 * 0.05;
        let outcome = engine.apply_reform(&flat_tax_only(ReformLevel::Federal, US, rate));
        assert!(
            outcome.revenue >= last,
            "revenue fell from {last} to {} at rate {rate}",
            outcome.revenue
        );
        last = outcome.revenue;
    }
}
