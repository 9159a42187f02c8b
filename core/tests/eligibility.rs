//! UBI eligibility counting: exclusion groups, overlap corrections, and
//! the non-negativity floor.

use std::sync::Arc;
use ubiplan_core::{
    baseline::compute_baselines,
    config::EngineConfig,
    data::{MicroData, PersonRow, SpmUnitRow, US},
    engine::{ReformEngine, ReformOutcome},
    selection::{ReformLevel, ReformSelection, TaxComponent, UbiExclusion},
    synthetic::{self, SyntheticConfig},
};

fn fixture() -> ReformEngine {
    let data = MicroData::default_test().unwrap();
    ReformEngine::new(Arc::new(data), EngineConfig::default())
}

fn headcount(engine: &ReformEngine, outcome: &ReformOutcome, id: i64) -> f64 {
    outcome
        .target_units
        .iter()
        .find(|ru| engine.data().units[ru.unit].spmfamunit == id)
        .map(|ru| ru.numper_ubi)
        .unwrap()
}

fn selection(excluded: Vec<UbiExclusion>) -> ReformSelection {
    ReformSelection {
        excluded,
        ..ReformSelection::no_op(ReformLevel::Federal, US)
    }
}

#[test]
fn full_inclusion_counts_every_member() {
    let engine = fixture();
    let outcome = engine.apply_reform(&selection(vec![]));

    for ru in &outcome.target_units {
        let unit = &engine.data().units[ru.unit];
        assert_eq!(ru.numper_ubi, unit.numper as f64);
    }
    // 4*900 + 1*750 + 4*1100 + 2*640
    assert_eq!(outcome.ubi_population, 10_030.0);
}

#[test]
fn excluding_children_removes_only_children() {
    let engine = fixture();
    let outcome = engine.apply_reform(&selection(vec![UbiExclusion::Children]));

    assert_eq!(headcount(&engine, &outcome, 1), 2.0);
    assert_eq!(headcount(&engine, &outcome, 2), 1.0);
    assert_eq!(headcount(&engine, &outcome, 3), 2.0);
    assert_eq!(headcount(&engine, &outcome, 4), 2.0);
}

#[test]
fn excluding_children_and_non_citizens_counts_overlap_once() {
    let engine = fixture();
    let outcome = engine.apply_reform(&selection(vec![
        UbiExclusion::Children,
        UbiExclusion::NonCitizens,
    ]));

    // Unit 3 has 2 children and 2 non-citizens, one of whom is a
    // non-citizen child: 4 - 2 - 2 + 1 = 1.
    assert_eq!(headcount(&engine, &outcome, 3), 1.0);
    assert_eq!(headcount(&engine, &outcome, 1), 2.0);
    assert_eq!(headcount(&engine, &outcome, 2), 1.0);
    assert_eq!(headcount(&engine, &outcome, 4), 2.0);
}

#[test]
fn excluding_adults_and_non_citizens_counts_overlap_once() {
    let engine = fixture();
    let outcome = engine.apply_reform(&selection(vec![
        UbiExclusion::Adults,
        UbiExclusion::NonCitizens,
    ]));

    // Unit 3: 4 - 2 adults - 2 non-citizens + 1 non-citizen adult = 1.
    assert_eq!(headcount(&engine, &outcome, 3), 1.0);
    assert_eq!(headcount(&engine, &outcome, 1), 2.0);
    assert_eq!(headcount(&engine, &outcome, 2), 0.0);
    assert_eq!(headcount(&engine, &outcome, 4), 0.0);
}

#[test]
fn headcount_is_never_negative() {
    let data = synthetic::generate(&SyntheticConfig {
        seed: 11,
        state_count: 6,
        unit_count: 800,
    })
    .unwrap();
    let engine = ReformEngine::new(Arc::new(data), EngineConfig::default());

    let mixes: [&[UbiExclusion]; 5] = [
        &[UbiExclusion::Children],
        &[UbiExclusion::Adults],
        &[UbiExclusion::NonCitizens],
        &[UbiExclusion::Children, UbiExclusion::NonCitizens],
        &[UbiExclusion::Adults, UbiExclusion::NonCitizens],
    ];

    for excluded in mixes {
        let outcome = engine.apply_reform(&selection(excluded.to_vec()));
        for ru in &outcome.target_units {
            assert!(
                ru.numper_ubi >= 0.0,
                "negative eligible headcount {} for unit {} under {excluded:?}",
                ru.numper_ubi,
                engine.data().units[ru.unit].key()
            );
        }
    }
}

#[test]
fn zero_eligible_weight_yields_undefined_rate_and_no_payout() {
    // An adult-only population with adults excluded leaves no one to
    // receive the UBI: the rate is undefined, nothing is distributed,
    // and every other output stays finite.
    let units: Vec<SpmUnitRow> = (1..=2).map(adult_only_unit).collect();
    let persons: Vec<PersonRow> = (1..=2).map(lone_adult).collect();
    let baselines = compute_baselines(&persons, &units).unwrap();
    let data = MicroData::new(persons, units, baselines).unwrap();
    let engine = ReformEngine::new(Arc::new(data), EngineConfig::default());

    let reform = ReformSelection {
        repealed_taxes: vec![TaxComponent::IncomeTax],
        excluded: vec![UbiExclusion::Adults],
        ..ReformSelection::no_op(ReformLevel::Federal, US)
    };
    let outcome = engine.apply_reform(&reform);

    assert_eq!(outcome.ubi_population, 0.0);
    assert!(outcome.ubi_annual.is_nan(), "rate should be undefined");
    assert_ne!(outcome.revenue, 0.0, "the repeal still moves revenue");
    for ru in &outcome.target_units {
        let unit = &engine.data().units[ru.unit];
        assert_eq!(ru.total_ubi, 0.0);
        assert!(ru.new_resources.is_finite());
        assert_eq!(ru.new_resources, unit.spmtotres - unit.fedtaxac);
    }
}

fn adult_only_unit(id: i64) -> SpmUnitRow {
    SpmUnitRow {
        spmfamunit: id,
        year: 2020,
        state: "Alabama".into(),
        numper: 1,
        spmtotres: 30_000.0,
        spmthresh: 14_000.0,
        spmwt: 1_000.0,
        adjginc: 35_000.0,
        fedtaxac: -4_000.0,
        fica: -2_600.0,
        stataxac: -1_200.0,
        ctc: 0.0,
        incssi: 0.0,
        incunemp: 0.0,
        eitcred: 0.0,
        spmheat: 0.0,
        spmsnap: 0.0,
        child: 0,
        adult: 1,
        non_citizen: 0,
        non_citizen_child: 0,
        non_citizen_adult: 0,
    }
}

fn lone_adult(id: i64) -> PersonRow {
    PersonRow {
        spmfamunit: id,
        year: 2020,
        state: "Alabama".into(),
        asecwt: 1_000.0,
        adult: true,
        child: false,
        black: false,
        white_non_hispanic: true,
        hispanic: false,
        pwd: false,
        non_citizen: false,
        non_citizen_child: false,
        non_citizen_adult: false,
    }
}

#[test]
fn ubi_population_is_weighted_eligible_headcount() {
    let engine = fixture();
    let outcome = engine.apply_reform(&selection(vec![
        UbiExclusion::Children,
        UbiExclusion::NonCitizens,
    ]));

    // 2*900 + 1*750 + 1*1100 + 2*640
    assert_eq!(outcome.ubi_population, 4_930.0);
}
