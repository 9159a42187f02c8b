//! Deterministic synthetic survey populations.
//!
//! RULE: nothing here touches a platform RNG. All randomness flows
//! through one Pcg64Mcg stream derived from the caller's seed, so a
//! (seed, config) pair always yields byte-identical datasets — property
//! tests and the demo runner stay reproducible.
//!
//! The generated tables follow the prepared-data conventions exactly:
//! tax columns stored negated, demographic counts consistent with the
//! member rows, and baselines computed from the same rows so change
//! metrics are internally coherent.

use crate::{
    baseline,
    data::{MicroData, PersonRow, SpmUnitRow, STATE_NAMES},
    error::EngineResult,
};
use rand::{RngCore, SeedableRng};
use rand_pcg::Pcg64Mcg;

#[derive(Debug, Clone)]
pub struct SyntheticConfig {
    pub seed: u64,
    /// How many states to draw households from (clamped to 51).
    pub state_count: usize,
    pub unit_count: usize,
}

impl Default for SyntheticConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            state_count: 4,
            unit_count: 400,
        }
    }
}

/// Thin deterministic RNG used only by this generator.
struct DataRng {
    inner: Pcg64Mcg,
}

impl DataRng {
    fn new(seed: u64) -> Self {
        Self {
            inner: Pcg64Mcg::seed_from_u64(seed),
        }
    }

    /// Roll a float in [0.0, 1.0).
    fn next_f64(&mut self) -> f64 {
        let bits = self.inner.next_u64();
        (bits >> 11) as f64 * (1.0 / (1u64 << 53) as f64)
    }

    fn below(&mut self, n: u64) -> u64 {
        self.inner.next_u64() % n
    }

    fn chance(&mut self, p: f64) -> bool {
        self.next_f64() < p
    }

    fn range(&mut self, lo: f64, hi: f64) -> f64 {
        lo + self.next_f64() * (hi - lo)
    }

    /// Simplified Pareto draw for income amounts.
    fn pareto(&mut self, x_min: f64, alpha: f64) -> f64 {
        let u = self.next_f64().max(1e-10);
        x_min * u.powf(-1.0 / alpha)
    }
}

/// Generate a full synthetic dataset: person table, unit table, and
/// baselines computed from them.
pub fn generate(config: &SyntheticConfig) -> EngineResult<MicroData> {
    let mut rng = DataRng::new(config.seed);
    let state_count = config.state_count.clamp(1, STATE_NAMES.len());

    let mut persons: Vec<PersonRow> = Vec::new();
    let mut units: Vec<SpmUnitRow> = Vec::with_capacity(config.unit_count);

    for n in 0..config.unit_count {
        let spmfamunit = 1_000 + n as i64;
        let year = 2020;
        let state = STATE_NAMES[rng.below(state_count as u64) as usize];

        let adults = 1 + rng.below(2) as u32;
        let children = rng.below(4) as u32;
        let numper = adults + children;

        // Members first; unit counts are sums over them.
        let mut members = Vec::with_capacity(numper as usize);
        for m in 0..numper {
            let child = m >= adults;
            let non_citizen = rng.chance(if child { 0.04 } else { 0.07 });
            let race = rng.next_f64();
            members.push(PersonRow {
                spmfamunit,
                year,
                state: state.to_string(),
                asecwt: rng.range(300.0, 2_700.0),
                adult: !child,
                child,
                black: race < 0.13,
                white_non_hispanic: (0.13..0.73).contains(&race),
                hispanic: (0.73..0.91).contains(&race),
                pwd: rng.chance(if child { 0.04 } else { 0.10 }),
                non_citizen,
                non_citizen_child: non_citizen && child,
                non_citizen_adult: non_citizen && !child,
            });
        }

        // Household income: Pareto earnings per working adult, with a
        // small share of units carrying a business loss (negative AGI).
        let mut adjginc = 0.0;
        for _ in 0..adults {
            if rng.chance(0.85) {
                adjginc += rng.pareto(9_000.0, 1.6).min(400_000.0);
            }
        }
        if rng.chance(0.03) {
            adjginc -= rng.pareto(5_000.0, 1.5).min(60_000.0);
        }

        let taxable = adjginc.max(0.0);
        let fed_rate = if taxable < 40_000.0 { 0.10 } else { 0.18 };

        let ctc = if children > 0 && taxable > 2_500.0 {
            2_000.0 * children as f64
        } else {
            0.0
        };
        let eitcred = if children > 0 && taxable > 1.0 && taxable < 45_000.0 {
            rng.range(1_500.0, 4_500.0)
        } else {
            0.0
        };
        let incssi = if rng.chance(0.04) { 9_000.0 } else { 0.0 };
        let incunemp = if rng.chance(0.06) {
            rng.range(2_000.0, 7_000.0)
        } else {
            0.0
        };
        let spmheat = if rng.chance(0.05) { 400.0 } else { 0.0 };
        let spmsnap = if taxable < 25_000.0 && rng.chance(0.5) {
            rng.range(1_200.0, 3_600.0)
        } else {
            0.0
        };

        let benefits = ctc + eitcred + incssi + incunemp + spmheat + spmsnap;
        let spmtotres = taxable * (1.0 - fed_rate - 0.0765 - 0.035) + benefits
            + rng.range(0.0, 3_000.0);
        let spmthresh = (9_500.0 + 4_200.0 * numper as f64) * rng.range(0.9, 1.1);

        let non_citizen_adult = members.iter().filter(|p| p.non_citizen_adult).count() as u32;
        let non_citizen_child = members.iter().filter(|p| p.non_citizen_child).count() as u32;

        units.push(SpmUnitRow {
            spmfamunit,
            year,
            state: state.to_string(),
            numper,
            spmtotres,
            spmthresh,
            spmwt: rng.range(250.0, 2_250.0),
            adjginc,
            // Prepared-table sign convention: taxes negated.
            fedtaxac: -(taxable * fed_rate),
            fica: -(taxable * 0.0765),
            stataxac: -(taxable * 0.035),
            ctc,
            incssi,
            incunemp,
            eitcred,
            spmheat,
            spmsnap,
            child: children,
            adult: adults,
            non_citizen: non_citizen_adult + non_citizen_child,
            non_citizen_child,
            non_citizen_adult,
        });
        persons.extend(members);
    }

    log::debug!(
        "synthetic dataset: seed={} {} units, {} persons, {} states",
        config.seed,
        units.len(),
        persons.len(),
        state_count
    );

    let baselines = baseline::compute_baselines(&persons, &units)?;
    MicroData::new(persons, units, baselines)
}
