//! The reform engine — the heart of the microsimulation.
//!
//! STEP ORDER (fixed, documented, never reordered):
//!   1. Scope the reform population (state-level reforms filter first;
//!      federal reforms always run nationwide).
//!   2. Initialize new_resources from baseline resources, revenue at zero.
//!   3. Repeal selected taxes and benefits.
//!   4. Undo the CTC/EITC double count when the income tax goes too.
//!   5. Apply the flat tax on AGI.
//!   6. Count UBI-eligible members per unit.
//!   7. Set the UBI rate that exactly exhausts revenue.
//!   8. Distribute the UBI.
//!
//! RULES:
//!   - The canonical tables are never written. Every computation derives
//!     its own private `ReformedUnit` table, so concurrent requests can
//!     share one engine without interference.
//!   - Degenerate arithmetic (zero eligible weight, zero baselines)
//!     surfaces as NaN in the outputs, never as an error or panic.

use crate::{
    config::EngineConfig,
    data::{MicroData, SpmUnitRow, US},
    error::EngineResult,
    report::ReformReport,
    selection::{BenefitComponent, ReformLevel, ReformSelection, TaxComponent, UbiExclusion},
    stats,
    types::UnitKey,
};
use std::collections::HashMap;
use std::sync::Arc;

/// Per-unit reform results. `unit` indexes the canonical unit table;
/// everything else is computed fresh per request.
#[derive(Debug, Clone, Copy)]
pub struct ReformedUnit {
    pub unit: usize,
    pub new_resources: f64,
    pub new_taxes: f64,
    pub numper_ubi: f64,
    pub total_ubi: f64,
    pub new_resources_per_person: f64,
}

/// A person joined to their unit's reform results — the person-level view
/// the statistics run over.
#[derive(Debug, Clone, Copy)]
pub struct MergedPerson {
    pub person: usize,
    pub new_resources: f64,
    pub new_resources_per_person: f64,
    pub spmthresh: f64,
    pub spmtotres: f64,
}

/// Everything `apply_reform` produces: aggregates plus the target-scoped
/// unit and person tables the statistics consume.
#[derive(Debug)]
pub struct ReformOutcome {
    /// Net new annual revenue over the reform population.
    pub revenue: f64,
    /// The budget-neutral annual payment per eligible person. NaN when
    /// the eligible population weight is zero.
    pub ubi_annual: f64,
    /// Weighted count of UBI-eligible people in the reform population.
    pub ubi_population: f64,
    pub target_units: Vec<ReformedUnit>,
    pub target_persons: Vec<MergedPerson>,
}

pub struct ReformEngine {
    data: Arc<MicroData>,
    config: EngineConfig,
}

impl ReformEngine {
    pub fn new(data: Arc<MicroData>, config: EngineConfig) -> Self {
        Self { data, config }
    }

    pub fn data(&self) -> &MicroData {
        &self.data
    }

    /// One full request: validate, reform, measure, report.
    pub fn compute_reform(&self, selection: &ReformSelection) -> EngineResult<ReformReport> {
        selection.validate(&self.data.baselines)?;

        let outcome = self.apply_reform(selection);
        let stats = stats::compute_statistics(
            &self.data,
            &outcome.target_units,
            &outcome.target_persons,
            &selection.state,
        )?;
        let report = ReformReport::assemble(selection, &outcome, &stats);

        log::info!(
            "{} {} reform: revenue=${:.0} ubi=${:.0}/yr pop={:.0} pov_rate {:.2}%->{:.2}%",
            selection.state,
            selection.level.key(),
            outcome.revenue,
            outcome.ubi_annual,
            outcome.ubi_population,
            stats.baseline_poverty_rate * 100.0,
            stats.poverty_rate * 100.0,
        );

        Ok(report)
    }

    /// The table-level computation, steps 1-8. Assumes a validated
    /// selection. Public so tests and tools can inspect per-unit results.
    pub fn apply_reform(&self, selection: &ReformSelection) -> ReformOutcome {
        let units = &self.data.units;

        // Step 1: the reform population. Federal reforms change taxes for
        // the whole country no matter which state is being inspected; the
        // state dropdown only scopes the statistics below. State-level
        // reforms apply to the chosen state alone.
        let reform_scope: Vec<usize> = match selection.level {
            ReformLevel::Federal => (0..units.len()).collect(),
            ReformLevel::State => (0..units.len())
                .filter(|&i| selection.state == US || units[i].state == selection.state)
                .collect(),
        };

        // Step 2.
        let mut reformed: Vec<ReformedUnit> = reform_scope
            .iter()
            .map(|&i| ReformedUnit {
                unit: i,
                new_resources: units[i].spmtotres,
                new_taxes: 0.0,
                numper_ubi: 0.0,
                total_ubi: 0.0,
                new_resources_per_person: 0.0,
            })
            .collect();
        let mut revenue = 0.0;

        // Step 3: repeals. Amounts carry the prepared tables' signs, so a
        // repealed tax (stored negated) raises resources and costs revenue.
        for &tax in &selection.repealed_taxes {
            for ru in reformed.iter_mut() {
                let unit = &units[ru.unit];
                let amount = tax.amount(unit, selection.level);
                ru.new_resources -= amount;
                revenue += amount * unit.spmwt;
            }
        }
        for &benefit in &selection.repealed_benefits {
            for ru in reformed.iter_mut() {
                let unit = &units[ru.unit];
                let amount = benefit.amount(unit);
                ru.new_resources -= amount;
                revenue += amount * unit.spmwt;
            }
        }

        // Step 4: the survey nets refundable credits against income-tax
        // liability, so repealing both would subtract the credit twice.
        // Add it back once. Only reachable at federal level; state-level
        // selections cannot repeal these benefits.
        if selection.repeals_tax(TaxComponent::IncomeTax) {
            for credit in [BenefitComponent::Ctc, BenefitComponent::Eitc] {
                if selection.repeals_benefit(credit) {
                    for ru in reformed.iter_mut() {
                        let unit = &units[ru.unit];
                        let amount = credit.amount(unit);
                        ru.new_resources += amount;
                        revenue -= amount * unit.spmwt;
                    }
                }
            }
        }

        // Step 5: flat tax on AGI. The floor behavior is per-level config.
        for ru in reformed.iter_mut() {
            let unit = &units[ru.unit];
            ru.new_taxes = self.config.flat_tax_base(selection.level, unit.adjginc)
                * selection.income_tax_rate;
            ru.new_resources -= ru.new_taxes;
            revenue += ru.new_taxes * unit.spmwt;
        }

        // Step 6.
        for ru in reformed.iter_mut() {
            ru.numper_ubi = eligible_headcount(&units[ru.unit], selection);
        }

        // Step 7: the unique uniform payment that spends the revenue
        // exactly. Revenue neutrality over the reform population holds by
        // construction.
        let ubi_population =
            stats::weighted_sum(reformed.iter().map(|ru| (ru.numper_ubi, units[ru.unit].spmwt)));
        let ubi_annual = if ubi_population > 0.0 {
            revenue / ubi_population
        } else {
            log::warn!(
                "{} {} reform: UBI-eligible population weight is zero, reporting NaN rate",
                selection.state,
                selection.level.key()
            );
            f64::NAN
        };

        // Step 8. A degenerate rate distributes nothing, so the rest of
        // the outcome stays finite.
        for ru in reformed.iter_mut() {
            let unit = &units[ru.unit];
            ru.total_ubi = if ubi_annual.is_finite() {
                ubi_annual * ru.numper_ubi
            } else {
                0.0
            };
            ru.new_resources += ru.total_ubi;
            ru.new_resources_per_person = ru.new_resources / unit.numper as f64;
        }

        // Statistics target: the selected state's units, regardless of
        // level. The target INCLUDES people excluded from receiving the
        // UBI — it is the population being measured, not the payees.
        let target_units: Vec<ReformedUnit> = if selection.state == US {
            reformed
        } else {
            reformed
                .into_iter()
                .filter(|ru| units[ru.unit].state == selection.state)
                .collect()
        };

        let target_persons = self.merge_persons(&target_units);

        ReformOutcome {
            revenue,
            ubi_annual,
            ubi_population,
            target_units,
            target_persons,
        }
    }

    /// Join each person to their unit's reform results via the household
    /// key. Persons whose unit is outside the target are dropped.
    fn merge_persons(&self, target_units: &[ReformedUnit]) -> Vec<MergedPerson> {
        let by_key: HashMap<UnitKey, &ReformedUnit> = target_units
            .iter()
            .map(|ru| (self.data.units[ru.unit].key(), ru))
            .collect();

        self.data
            .persons
            .iter()
            .enumerate()
            .filter_map(|(i, p)| {
                by_key.get(&p.key()).map(|ru| {
                    let unit = &self.data.units[ru.unit];
                    MergedPerson {
                        person: i,
                        new_resources: ru.new_resources,
                        new_resources_per_person: ru.new_resources_per_person,
                        spmthresh: unit.spmthresh,
                        spmtotres: unit.spmtotres,
                    }
                })
            })
            .collect()
    }
}

/// UBI-eligible members of one unit. Overlapping exclusions are corrected
/// so a non-citizen child (or adult) is subtracted exactly once when both
/// of its groups are excluded.
fn eligible_headcount(unit: &SpmUnitRow, selection: &ReformSelection) -> f64 {
    let mut eligible = unit.numper as i64;

    if selection.excludes(UbiExclusion::Children) {
        eligible -= unit.child as i64;
    }
    if selection.excludes(UbiExclusion::NonCitizens) {
        eligible -= unit.non_citizen as i64;
    }
    if selection.excludes(UbiExclusion::Children) && selection.excludes(UbiExclusion::NonCitizens)
    {
        eligible += unit.non_citizen_child as i64;
    }
    if selection.excludes(UbiExclusion::Adults) {
        eligible -= unit.adult as i64;
    }
    if selection.excludes(UbiExclusion::Adults) && selection.excludes(UbiExclusion::NonCitizens) {
        eligible += unit.non_citizen_adult as i64;
    }

    eligible.max(0) as f64
}
