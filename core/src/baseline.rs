//! Baseline statistics: the precomputed reference the engine compares
//! reform outcomes against.
//!
//! These are computed once by the preparation stage (or by
//! `compute_baselines` for synthetic datasets) and are IMMUTABLE for the
//! process lifetime. The engine only ever reads them: poverty-rate
//! denominators come from here, never from re-summing the sample, so
//! reform deltas stay consistent with the published baseline figures.

use crate::{
    data::{PersonRow, SpmUnitRow},
    error::{EngineError, EngineResult},
    stats,
    types::UnitKey,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A demographic group tracked in the baseline tables. Each group resolves
/// to a person-flag accessor and a stable lookup key, so per-group logic
/// is a single iteration rather than one branch per group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Demographic {
    Person,
    Adult,
    Child,
    Black,
    WhiteNonHispanic,
    Hispanic,
    Pwd,
    NonCitizen,
    NonCitizenChild,
    NonCitizenAdult,
}

impl Demographic {
    pub const ALL: [Demographic; 10] = [
        Demographic::Person,
        Demographic::Adult,
        Demographic::Child,
        Demographic::Black,
        Demographic::WhiteNonHispanic,
        Demographic::Hispanic,
        Demographic::Pwd,
        Demographic::NonCitizen,
        Demographic::NonCitizenChild,
        Demographic::NonCitizenAdult,
    ];

    /// The six groups shown in the poverty-rate breakdown, in display order.
    pub const BREAKDOWN: [Demographic; 6] = [
        Demographic::Child,
        Demographic::Adult,
        Demographic::Pwd,
        Demographic::WhiteNonHispanic,
        Demographic::Black,
        Demographic::Hispanic,
    ];

    pub fn key(self) -> &'static str {
        match self {
            Self::Person => "person",
            Self::Adult => "adult",
            Self::Child => "child",
            Self::Black => "black",
            Self::WhiteNonHispanic => "white_non_hispanic",
            Self::Hispanic => "hispanic",
            Self::Pwd => "pwd",
            Self::NonCitizen => "non_citizen",
            Self::NonCitizenChild => "non_citizen_child",
            Self::NonCitizenAdult => "non_citizen_adult",
        }
    }

    pub fn from_key(key: &str) -> EngineResult<Self> {
        Self::ALL
            .into_iter()
            .find(|d| d.key() == key)
            .ok_or_else(|| EngineError::UnknownKey {
                kind: "demographic",
                key: key.to_string(),
            })
    }

    /// Human label for the breakdown chart series.
    pub fn label(self) -> &'static str {
        match self {
            Self::Person => "Everyone",
            Self::Adult => "Adult",
            Self::Child => "Child",
            Self::Black => "Black",
            Self::WhiteNonHispanic => "White",
            Self::Hispanic => "Hispanic",
            Self::Pwd => "People with disabilities",
            Self::NonCitizen => "Non-citizen",
            Self::NonCitizenChild => "Non-citizen child",
            Self::NonCitizenAdult => "Non-citizen adult",
        }
    }

    /// Whether a person belongs to this group. `Person` is everyone.
    pub fn flag(self, p: &PersonRow) -> bool {
        match self {
            Self::Person => true,
            Self::Adult => p.adult,
            Self::Child => p.child,
            Self::Black => p.black,
            Self::WhiteNonHispanic => p.white_non_hispanic,
            Self::Hispanic => p.hispanic,
            Self::Pwd => p.pwd,
            Self::NonCitizen => p.non_citizen,
            Self::NonCitizenChild => p.non_citizen_child,
            Self::NonCitizenAdult => p.non_citizen_adult,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Metric {
    Pop,
    PovRate,
}

impl Metric {
    pub fn key(self) -> &'static str {
        match self {
            Self::Pop => "pop",
            Self::PovRate => "pov_rate",
        }
    }

    pub fn from_key(key: &str) -> EngineResult<Self> {
        match key {
            "pop" => Ok(Self::Pop),
            "pov_rate" => Ok(Self::PovRate),
            other => Err(EngineError::UnknownKey {
                kind: "metric",
                key: other.to_string(),
            }),
        }
    }
}

/// Per-state scalar baselines. Rates and Gini are fractions, dollars are
/// annual USD.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct StateBaseline {
    pub gini: f64,
    pub poverty_gap: f64,
    pub total_resources: f64,
}

/// Per-(state, demographic) baselines. `pov_rate` is a fraction.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct DemogBaseline {
    pub pop: f64,
    pub pov_rate: f64,
}

/// Row shapes of the prepared baseline file, one row per value, mirroring
/// the preparation stage's two export tables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateStatsRow {
    pub state: String,
    pub gini: f64,
    pub poverty_gap: f64,
    pub total_resources: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DemogStatsRow {
    pub state: String,
    pub demog: String,
    pub metric: String,
    pub value: f64,
}

#[derive(Debug, Clone, Deserialize)]
struct BaselinesFile {
    state_stats: Vec<StateStatsRow>,
    demog_stats: Vec<DemogStatsRow>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BaselineStats {
    state_stats: HashMap<String, StateBaseline>,
    demog_stats: HashMap<String, HashMap<String, DemogBaseline>>,
}

impl BaselineStats {
    /// Parse the prepared baselines.json content. Unknown demographic or
    /// metric keys are rejected, never silently coerced.
    pub fn from_json(content: &str) -> EngineResult<Self> {
        let file: BaselinesFile = serde_json::from_str(content)?;
        Self::from_rows(file.state_stats, file.demog_stats)
    }

    pub fn from_rows(
        state_rows: Vec<StateStatsRow>,
        demog_rows: Vec<DemogStatsRow>,
    ) -> EngineResult<Self> {
        let state_stats = state_rows
            .into_iter()
            .map(|r| {
                (
                    r.state,
                    StateBaseline {
                        gini: r.gini,
                        poverty_gap: r.poverty_gap,
                        total_resources: r.total_resources,
                    },
                )
            })
            .collect();

        let mut demog_stats: HashMap<String, HashMap<String, DemogBaseline>> = HashMap::new();
        for row in demog_rows {
            let demog = Demographic::from_key(&row.demog)?;
            let metric = Metric::from_key(&row.metric)?;
            let entry = demog_stats
                .entry(row.state)
                .or_default()
                .entry(demog.key().to_string())
                .or_insert(DemogBaseline {
                    pop: 0.0,
                    pov_rate: 0.0,
                });
            match metric {
                Metric::Pop => entry.pop = row.value,
                Metric::PovRate => entry.pov_rate = row.value,
            }
        }

        Ok(Self {
            state_stats,
            demog_stats,
        })
    }

    pub fn contains_state(&self, state: &str) -> bool {
        self.state_stats.contains_key(state) && self.demog_stats.contains_key(state)
    }

    pub fn state_count(&self) -> usize {
        self.state_stats.len()
    }

    /// All real states with baselines, sorted; excludes the "US" aggregate.
    pub fn states(&self) -> Vec<&str> {
        let mut states: Vec<&str> = self
            .state_stats
            .keys()
            .map(|s| s.as_str())
            .filter(|s| *s != crate::data::US)
            .collect();
        states.sort_unstable();
        states
    }

    pub fn state(&self, state: &str) -> EngineResult<StateBaseline> {
        self.state_stats
            .get(state)
            .copied()
            .ok_or_else(|| EngineError::MissingBaseline {
                state: state.to_string(),
            })
    }

    pub fn demog(&self, state: &str, demog: Demographic) -> EngineResult<DemogBaseline> {
        self.demog_stats
            .get(state)
            .and_then(|groups| groups.get(demog.key()))
            .copied()
            .ok_or_else(|| EngineError::MissingBaseline {
                state: state.to_string(),
            })
    }

    /// Baseline population of a state: the denominator for poverty and
    /// winner rates.
    pub fn population(&self, state: &str) -> EngineResult<f64> {
        Ok(self.demog(state, Demographic::Person)?.pop)
    }
}

/// Precompute baseline statistics from the prepared tables: one entry per
/// state plus the "US" aggregate. This is the preparation-stage step the
/// dashboard ships as static files; the synthetic generator runs it so its
/// datasets carry internally consistent baselines.
pub fn compute_baselines(
    persons: &[PersonRow],
    units: &[SpmUnitRow],
) -> EngineResult<BaselineStats> {
    let mut unit_index: HashMap<UnitKey, &SpmUnitRow> = HashMap::with_capacity(units.len());
    for unit in units {
        unit_index.insert(unit.key(), unit);
    }

    // Per-person baseline facts, resolved through the household once.
    let mut person_facts = Vec::with_capacity(persons.len());
    for p in persons {
        let unit = unit_index
            .get(&p.key())
            .ok_or(EngineError::UnpairedPerson { key: p.key() })?;
        person_facts.push(PersonFact {
            person: p,
            poor: unit.spmtotres < unit.spmthresh,
            resources_per_person: unit.spmtotres / unit.numper as f64,
        });
    }

    let mut scopes: Vec<&str> = units.iter().map(|u| u.state.as_str()).collect();
    scopes.sort_unstable();
    scopes.dedup();
    scopes.push(crate::data::US);

    let mut state_rows = Vec::with_capacity(scopes.len());
    let mut demog_rows = Vec::new();

    for scope in scopes {
        let nationwide = scope == crate::data::US;
        let scope_units: Vec<&SpmUnitRow> = units
            .iter()
            .filter(|u| nationwide || u.state == scope)
            .collect();
        let scope_facts: Vec<&PersonFact<'_>> = person_facts
            .iter()
            .filter(|f| nationwide || f.person.state == scope)
            .collect();

        let gini = stats::gini(
            scope_facts
                .iter()
                .map(|f| (f.resources_per_person, f.person.asecwt)),
        );
        let poverty_gap = stats::weighted_sum(
            scope_units
                .iter()
                .map(|u| ((u.spmthresh - u.spmtotres).max(0.0), u.spmwt)),
        );
        let total_resources =
            stats::weighted_sum(scope_units.iter().map(|u| (u.spmtotres, u.spmwt)));

        state_rows.push(StateStatsRow {
            state: scope.to_string(),
            gini,
            poverty_gap,
            total_resources,
        });

        for demog in Demographic::ALL {
            let members = scope_facts.iter().filter(|f| demog.flag(f.person));
            let pop = stats::weighted_sum(members.clone().map(|f| (1.0, f.person.asecwt)));
            let pov_rate = stats::weighted_mean(
                members.map(|f| (f.poor as u8 as f64, f.person.asecwt)),
            );
            for (metric, value) in [(Metric::Pop, pop), (Metric::PovRate, pov_rate)] {
                demog_rows.push(DemogStatsRow {
                    state: scope.to_string(),
                    demog: demog.key().to_string(),
                    metric: metric.key().to_string(),
                    value,
                });
            }
        }
    }

    BaselineStats::from_rows(state_rows, demog_rows)
}

struct PersonFact<'a> {
    person: &'a PersonRow,
    poor: bool,
    resources_per_person: f64,
}
