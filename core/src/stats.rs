//! Weighted population statistics over a reform outcome.
//!
//! Everything here is a pure function of its inputs: the canonical tables
//! and baselines are read, never written. Rates, shares, and Gini values
//! are fractions; the report layer converts to percentages.
//!
//! Denominator rule: poverty and winner rates divide by the BASELINE
//! population of the selected state, not by re-summing the sample, so
//! published baseline figures and reform deltas stay on the same footing.

use crate::{
    baseline::Demographic,
    data::MicroData,
    engine::{MergedPerson, ReformedUnit},
    error::EngineResult,
};
use serde::Serialize;

/// Sum of value × weight.
pub fn weighted_sum<I>(pairs: I) -> f64
where
    I: IntoIterator<Item = (f64, f64)>,
{
    pairs.into_iter().map(|(value, weight)| value * weight).sum()
}

/// Weighted mean; NaN when the total weight is zero.
pub fn weighted_mean<I>(pairs: I) -> f64
where
    I: IntoIterator<Item = (f64, f64)>,
{
    let (mut total, mut weight_total) = (0.0, 0.0);
    for (value, weight) in pairs {
        total += value * weight;
        weight_total += weight;
    }
    total / weight_total
}

/// Weighted Gini coefficient via Lorenz-curve trapezoids, O(n log n).
/// NaN on an empty or zero-weight population.
pub fn gini<I>(pairs: I) -> f64
where
    I: IntoIterator<Item = (f64, f64)>,
{
    let mut sorted: Vec<(f64, f64)> = pairs.into_iter().filter(|(_, w)| *w > 0.0).collect();
    if sorted.is_empty() {
        return f64::NAN;
    }
    sorted.sort_by(|a, b| a.0.total_cmp(&b.0));

    let total_weight: f64 = sorted.iter().map(|(_, w)| w).sum();
    let total_value: f64 = sorted.iter().map(|(v, w)| v * w).sum();
    if total_value == 0.0 {
        return f64::NAN;
    }

    // Area under the Lorenz curve, one trapezoid per observation.
    let mut cum_value = 0.0;
    let mut area = 0.0;
    for (value, weight) in sorted {
        let prev_value = cum_value;
        cum_value += value * weight;
        area += (weight / total_weight) * (cum_value + prev_value) / total_value;
    }

    1.0 - area
}

/// Relative change vs. a baseline. A zero baseline yields NaN — the
/// caller renders it as undefined, it is not an error.
pub fn relative_change(new: f64, old: f64) -> f64 {
    if old == 0.0 {
        f64::NAN
    } else {
        (new - old) / old
    }
}

/// Poverty rate for one demographic group, next to its baseline.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct GroupStats {
    #[serde(serialize_with = "serialize_demog")]
    pub demog: Demographic,
    pub pov_rate: f64,
    pub baseline_pov_rate: f64,
    pub change: f64,
}

fn serialize_demog<S: serde::Serializer>(d: &Demographic, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(d.key())
}

#[derive(Debug, Clone, Serialize)]
pub struct Stats {
    /// Baseline population of the target state (the shared denominator).
    pub population: f64,
    pub poverty_rate: f64,
    pub baseline_poverty_rate: f64,
    pub poverty_rate_change: f64,
    pub poverty_gap: f64,
    pub baseline_poverty_gap: f64,
    pub poverty_gap_change: f64,
    pub gini: f64,
    pub baseline_gini: f64,
    pub gini_change: f64,
    /// Share of the baseline population strictly better off than baseline.
    pub winners_share: f64,
    pub total_resources: f64,
    pub baseline_total_resources: f64,
    pub avg_resource_change_per_person: f64,
    /// One entry per breakdown group, in display order.
    pub breakdown: Vec<GroupStats>,
}

/// Compute all summary statistics for a reform's target population,
/// relative to the selected state's precomputed baselines.
pub fn compute_statistics(
    data: &MicroData,
    target_units: &[ReformedUnit],
    target_persons: &[MergedPerson],
    state: &str,
) -> EngineResult<Stats> {
    let baselines = &data.baselines;
    let state_baseline = baselines.state(state)?;
    let population = baselines.population(state)?;

    // Person-level facts under the reform.
    let poor: Vec<bool> = target_persons
        .iter()
        .map(|mp| mp.new_resources < mp.spmthresh)
        .collect();

    let total_poor = weighted_sum(
        target_persons
            .iter()
            .zip(&poor)
            .map(|(mp, &p)| (p as u8 as f64, data.persons[mp.person].asecwt)),
    );
    let poverty_rate = total_poor / population;

    let poverty_gap = weighted_sum(target_units.iter().map(|ru| {
        let unit = &data.units[ru.unit];
        ((unit.spmthresh - ru.new_resources).max(0.0), unit.spmwt)
    }));

    let gini_value = gini(
        target_persons
            .iter()
            .map(|mp| (mp.new_resources_per_person, data.persons[mp.person].asecwt)),
    );

    let total_winners = weighted_sum(target_persons.iter().map(|mp| {
        let winner = mp.new_resources > mp.spmtotres;
        (winner as u8 as f64, data.persons[mp.person].asecwt)
    }));

    let total_resources = weighted_sum(
        target_units
            .iter()
            .map(|ru| (ru.new_resources, data.units[ru.unit].spmwt)),
    );

    let mut breakdown = Vec::with_capacity(Demographic::BREAKDOWN.len());
    for demog in Demographic::BREAKDOWN {
        let pov_rate = weighted_mean(
            target_persons
                .iter()
                .zip(&poor)
                .filter(|(mp, _)| demog.flag(&data.persons[mp.person]))
                .map(|(mp, &p)| (p as u8 as f64, data.persons[mp.person].asecwt)),
        );
        let baseline_pov_rate = baselines.demog(state, demog)?.pov_rate;
        breakdown.push(GroupStats {
            demog,
            pov_rate,
            baseline_pov_rate,
            change: relative_change(pov_rate, baseline_pov_rate),
        });
    }

    let baseline_poverty_rate = baselines.demog(state, Demographic::Person)?.pov_rate;

    Ok(Stats {
        population,
        poverty_rate,
        baseline_poverty_rate,
        poverty_rate_change: relative_change(poverty_rate, baseline_poverty_rate),
        poverty_gap,
        baseline_poverty_gap: state_baseline.poverty_gap,
        poverty_gap_change: relative_change(poverty_gap, state_baseline.poverty_gap),
        gini: gini_value,
        baseline_gini: state_baseline.gini,
        gini_change: relative_change(gini_value, state_baseline.gini),
        winners_share: total_winners / population,
        total_resources,
        baseline_total_resources: state_baseline.total_resources,
        avg_resource_change_per_person: (total_resources - state_baseline.total_resources)
            / population,
        breakdown,
    })
}
