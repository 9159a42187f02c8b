//! End-to-end federal reform scenarios on the fixed test dataset, with
//! every dollar figure recomputed by hand from the fixture rows.

use std::sync::Arc;
use ubiplan_core::{
    config::EngineConfig,
    data::{MicroData, US},
    engine::ReformEngine,
    selection::{BenefitComponent, ReformLevel, ReformSelection, TaxComponent},
};

fn fixture() -> ReformEngine {
    let data = MicroData::default_test().unwrap();
    ReformEngine::new(Arc::new(data), EngineConfig::default())
}

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() <= 1e-9 * b.abs().max(1.0)
}

// Fixture federal income tax (stored negated): 12% of non-negative AGI.
// Unit 1: AGI 21,000, wt 900.  Unit 2: AGI 61,000, wt 750.
// Unit 3: AGI 47,000, wt 1,100.  Unit 4: AGI -3,000, wt 640.
const FEDTAX_REVENUE: f64 = -(21_000.0 * 0.12 * 900.0
    + 61_000.0 * 0.12 * 750.0
    + 47_000.0 * 0.12 * 1_100.0);

// Weighted person count with everyone eligible.
const UBI_POPULATION: f64 = 4.0 * 900.0 + 1.0 * 750.0 + 4.0 * 1_100.0 + 2.0 * 640.0;

#[test]
fn income_tax_repeal_with_flat_tax_matches_hand_computation() {
    let engine = fixture();
    let selection = ReformSelection {
        income_tax_rate: 0.2,
        repealed_taxes: vec![TaxComponent::IncomeTax],
        ..ReformSelection::no_op(ReformLevel::Federal, US)
    };

    let outcome = engine.apply_reform(&selection);

    // Flat tax at 20% of floored AGI; unit 4's loss year owes nothing.
    let flat_revenue =
        21_000.0 * 0.2 * 900.0 + 61_000.0 * 0.2 * 750.0 + 47_000.0 * 0.2 * 1_100.0;
    let revenue = FEDTAX_REVENUE + flat_revenue;
    assert!(close(outcome.revenue, revenue), "revenue {}", outcome.revenue);

    let ubi = revenue / UBI_POPULATION;
    assert!(close(outcome.ubi_annual, ubi), "ubi {}", outcome.ubi_annual);

    // Per-unit: resources - fedtaxac (negated, so repeal adds it back)
    // - flat tax + UBI for each member.
    let expected = [
        (1, 18_000.0 + 21_000.0 * 0.12 - 21_000.0 * 0.2 + 4.0 * ubi),
        (2, 52_000.0 + 61_000.0 * 0.12 - 61_000.0 * 0.2 + 1.0 * ubi),
        (3, 44_000.0 + 47_000.0 * 0.12 - 47_000.0 * 0.2 + 4.0 * ubi),
        (4, 24_000.0 + 2.0 * ubi),
    ];
    for (id, resources) in expected {
        let ru = outcome
            .target_units
            .iter()
            .find(|ru| engine.data().units[ru.unit].spmfamunit == id)
            .unwrap();
        assert!(
            close(ru.new_resources, resources),
            "unit {id}: expected {resources}, got {}",
            ru.new_resources
        );
    }
}

#[test]
fn payroll_repeal_draws_from_the_payroll_column() {
    let engine = fixture();
    let selection = ReformSelection {
        repealed_taxes: vec![TaxComponent::EmployeePayroll],
        ..ReformSelection::no_op(ReformLevel::Federal, US)
    };

    let outcome = engine.apply_reform(&selection);

    let revenue = -(21_000.0 * 0.0765 * 900.0
        + 61_000.0 * 0.0765 * 750.0
        + 47_000.0 * 0.0765 * 1_100.0);
    assert!(close(outcome.revenue, revenue), "revenue {}", outcome.revenue);
}

#[test]
fn refundable_credits_are_not_double_counted_with_income_tax_repeal() {
    let engine = fixture();

    let tax_only = ReformSelection {
        repealed_taxes: vec![TaxComponent::IncomeTax],
        ..ReformSelection::no_op(ReformLevel::Federal, US)
    };
    let with_credits = ReformSelection {
        repealed_taxes: vec![TaxComponent::IncomeTax],
        repealed_benefits: vec![BenefitComponent::Ctc, BenefitComponent::Eitc],
        ..ReformSelection::no_op(ReformLevel::Federal, US)
    };

    let a = engine.apply_reform(&tax_only);
    let b = engine.apply_reform(&with_credits);

    // The survey already nets CTC and EITC against income-tax liability,
    // so adding their repeal on top of the tax repeal must change nothing.
    assert!(close(a.revenue, b.revenue));
    assert!(close(a.ubi_annual, b.ubi_annual));
    for (ra, rb) in a.target_units.iter().zip(&b.target_units) {
        assert_eq!(ra.unit, rb.unit);
        assert!(
            close(ra.new_resources, rb.new_resources),
            "unit {}: {} vs {}",
            engine.data().units[ra.unit].key(),
            ra.new_resources,
            rb.new_resources
        );
    }
}

#[test]
fn credit_repeal_without_tax_repeal_still_counts() {
    let engine = fixture();
    let selection = ReformSelection {
        repealed_benefits: vec![BenefitComponent::Ctc],
        ..ReformSelection::no_op(ReformLevel::Federal, US)
    };

    let outcome = engine.apply_reform(&selection);

    // CTC is $2,000 per child in the fixture: units 1 and 3 have two each.
    let revenue = 4_000.0 * 900.0 + 4_000.0 * 1_100.0;
    assert!(close(outcome.revenue, revenue), "revenue {}", outcome.revenue);
}

#[test]
fn report_carries_rounded_figures() {
    let engine = fixture();
    let selection = ReformSelection {
        income_tax_rate: 0.2,
        repealed_taxes: vec![TaxComponent::IncomeTax],
        ..ReformSelection::no_op(ReformLevel::Federal, US)
    };

    let outcome = engine.apply_reform(&selection);
    let report = engine.compute_reform(&selection).unwrap();

    assert_eq!(report.monthly_ubi, (outcome.ubi_annual / 12.0).round());
    assert_eq!(report.state, US);
    assert!(report.percent_better_off.is_finite());

    let text = format!("{report}");
    assert!(text.contains("Monthly UBI"), "display output: {text}");
}
