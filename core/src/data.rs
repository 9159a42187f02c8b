//! The two prepared survey tables and their load-time validation.
//!
//! The preparation stage (outside this crate) aggregates raw CPS ASEC
//! person records into SPM units and writes the prepared tables plus the
//! baseline statistics. This module loads those tables and enforces the
//! consistency rules that are fatal at load time:
//!   - every person must belong to exactly one SPM unit,
//!   - every unit must have at least one member,
//!   - every state appearing in the unit table must have baseline stats.
//!
//! SIGN CONVENTION: the preparation stage stores the tax columns
//! (`fedtaxac`, `fica`, `stataxac`) negated. Repealing a tax therefore
//! raises a household's resources and reduces reform revenue. The engine
//! never re-signs these columns; it subtracts them as stored.

use crate::{
    baseline::BaselineStats,
    error::{EngineError, EngineResult},
    types::{Dollars, UnitKey, Weight},
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// The 50 states plus the District of Columbia, as full names.
/// "US" is a pseudo-state meaning the whole country and is not listed here.
pub const STATE_NAMES: [&str; 51] = [
    "Alabama",
    "Alaska",
    "Arizona",
    "Arkansas",
    "California",
    "Colorado",
    "Connecticut",
    "Delaware",
    "District of Columbia",
    "Florida",
    "Georgia",
    "Hawaii",
    "Idaho",
    "Illinois",
    "Indiana",
    "Iowa",
    "Kansas",
    "Kentucky",
    "Louisiana",
    "Maine",
    "Maryland",
    "Massachusetts",
    "Michigan",
    "Minnesota",
    "Mississippi",
    "Missouri",
    "Montana",
    "Nebraska",
    "Nevada",
    "New Hampshire",
    "New Jersey",
    "New Mexico",
    "New York",
    "North Carolina",
    "North Dakota",
    "Ohio",
    "Oklahoma",
    "Oregon",
    "Pennsylvania",
    "Rhode Island",
    "South Carolina",
    "South Dakota",
    "Tennessee",
    "Texas",
    "Utah",
    "Vermont",
    "Virginia",
    "Washington",
    "West Virginia",
    "Wisconsin",
    "Wyoming",
];

/// The nationwide pseudo-state accepted anywhere a state code is.
pub const US: &str = "US";

/// One survey respondent-year.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersonRow {
    pub spmfamunit: i64,
    pub year: u16,
    pub state: String,
    /// Person-level survey weight.
    pub asecwt: Weight,
    pub adult: bool,
    pub child: bool,
    pub black: bool,
    pub white_non_hispanic: bool,
    pub hispanic: bool,
    /// Person with a disability.
    pub pwd: bool,
    pub non_citizen: bool,
    pub non_citizen_child: bool,
    pub non_citizen_adult: bool,
}

impl PersonRow {
    pub fn key(&self) -> UnitKey {
        UnitKey {
            spmfamunit: self.spmfamunit,
            year: self.year,
        }
    }
}

/// One SPM unit (household), aggregated from its members by the
/// preparation stage. Money columns are annual dollars summed over
/// members; demographic columns are member counts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpmUnitRow {
    pub spmfamunit: i64,
    pub year: u16,
    pub state: String,
    /// Member count, >= 1.
    pub numper: u32,
    /// Baseline disposable resources.
    pub spmtotres: Dollars,
    /// SPM poverty threshold.
    pub spmthresh: Dollars,
    /// Unit-level survey weight.
    pub spmwt: Weight,
    /// Adjusted gross income, the flat-tax base.
    pub adjginc: Dollars,
    // Tax columns, stored negated (see module doc).
    pub fedtaxac: Dollars,
    pub fica: Dollars,
    pub stataxac: Dollars,
    // Benefit columns.
    pub ctc: Dollars,
    pub incssi: Dollars,
    pub incunemp: Dollars,
    pub eitcred: Dollars,
    pub spmheat: Dollars,
    pub spmsnap: Dollars,
    // Member counts by group.
    pub child: u32,
    pub adult: u32,
    pub non_citizen: u32,
    pub non_citizen_child: u32,
    pub non_citizen_adult: u32,
}

impl SpmUnitRow {
    pub fn key(&self) -> UnitKey {
        UnitKey {
            spmfamunit: self.spmfamunit,
            year: self.year,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
struct PersonsFile {
    persons: Vec<PersonRow>,
}

#[derive(Debug, Clone, Deserialize)]
struct UnitsFile {
    spm_units: Vec<SpmUnitRow>,
}

/// The canonical dataset: loaded once at process start, read-only for the
/// process lifetime. Every reform computation derives its own private
/// mutable view; nothing here is ever written after construction.
#[derive(Debug)]
pub struct MicroData {
    pub persons: Vec<PersonRow>,
    pub units: Vec<SpmUnitRow>,
    pub baselines: BaselineStats,
    unit_index: HashMap<UnitKey, usize>,
}

impl MicroData {
    /// Validate and index the three tables. Consistency failures here are
    /// configuration errors: there is no per-request recovery from a
    /// person with no household or a state with no baselines.
    pub fn new(
        persons: Vec<PersonRow>,
        units: Vec<SpmUnitRow>,
        baselines: BaselineStats,
    ) -> EngineResult<Self> {
        let mut unit_index = HashMap::with_capacity(units.len());
        for (i, unit) in units.iter().enumerate() {
            if unit.numper == 0 {
                return Err(EngineError::EmptyUnit { key: unit.key() });
            }
            unit_index.insert(unit.key(), i);
        }

        for person in &persons {
            if !unit_index.contains_key(&person.key()) {
                return Err(EngineError::UnpairedPerson { key: person.key() });
            }
        }

        for unit in &units {
            if !baselines.contains_state(&unit.state) {
                return Err(EngineError::MissingBaseline {
                    state: unit.state.clone(),
                });
            }
        }
        if !baselines.contains_state(US) {
            return Err(EngineError::MissingBaseline { state: US.into() });
        }

        log::info!(
            "dataset ready: {} persons, {} SPM units, {} baseline states",
            persons.len(),
            units.len(),
            baselines.state_count()
        );

        Ok(Self {
            persons,
            units,
            baselines,
            unit_index,
        })
    }

    /// Load the prepared tables from the data/ directory.
    /// In tests, use `MicroData::default_test()` or `synthetic::generate`.
    pub fn load(data_dir: &str) -> anyhow::Result<Self> {
        let persons_path = format!("{data_dir}/persons.json");
        let persons_content = std::fs::read_to_string(&persons_path)
            .map_err(|e| anyhow::anyhow!("Cannot read {persons_path}: {e}"))?;
        let persons_file: PersonsFile = serde_json::from_str(&persons_content)?;

        let units_path = format!("{data_dir}/spm_units.json");
        let units_content = std::fs::read_to_string(&units_path)
            .map_err(|e| anyhow::anyhow!("Cannot read {units_path}: {e}"))?;
        let units_file: UnitsFile = serde_json::from_str(&units_content)?;

        let baselines_path = format!("{data_dir}/baselines.json");
        let baselines_content = std::fs::read_to_string(&baselines_path)
            .map_err(|e| anyhow::anyhow!("Cannot read {baselines_path}: {e}"))?;
        let baselines = BaselineStats::from_json(&baselines_content)?;

        Ok(Self::new(
            persons_file.persons,
            units_file.spm_units,
            baselines,
        )?)
    }

    /// Index of the unit a person belongs to. Guaranteed to resolve after
    /// construction-time validation.
    pub fn unit_of(&self, person: &PersonRow) -> Option<usize> {
        self.unit_index.get(&person.key()).copied()
    }

    pub fn unit_by_key(&self, key: &UnitKey) -> Option<&SpmUnitRow> {
        self.unit_index.get(key).map(|&i| &self.units[i])
    }

    /// A small fixed two-state dataset with hand-picked numbers, for unit
    /// tests that assert exact formulas. Baselines are computed from the
    /// same rows, so change metrics are internally consistent.
    pub fn default_test() -> EngineResult<Self> {
        let units = vec![
            // A two-adult, two-child family in poverty before any reform.
            test_unit(1, "Alabama", &[A, A, C, C], 18_000.0, 26_000.0, 900.0, 21_000.0),
            // A single adult comfortably above the threshold.
            test_unit(2, "Alabama", &[A], 52_000.0, 14_000.0, 750.0, 61_000.0),
            // A mixed-citizenship family: one non-citizen adult, one
            // non-citizen child.
            test_unit(3, "Alaska", &[A, NA, C, NC], 44_000.0, 30_000.0, 1_100.0, 47_000.0),
            // A retired couple with a small business loss (negative AGI).
            test_unit(4, "Alaska", &[A, A], 24_000.0, 19_000.0, 640.0, -3_000.0),
        ];

        let persons = units
            .iter()
            .flat_map(|u| {
                let mut members = Vec::new();
                for m in 0..u.numper {
                    let child = m >= u.adult;
                    let non_citizen = if child {
                        m >= u.numper - u.non_citizen_child
                    } else {
                        m >= u.adult - u.non_citizen_adult
                    };
                    members.push(PersonRow {
                        spmfamunit: u.spmfamunit,
                        year: u.year,
                        state: u.state.clone(),
                        asecwt: u.spmwt / u.numper as f64,
                        adult: !child,
                        child,
                        black: m % 3 == 0,
                        white_non_hispanic: m % 3 == 1,
                        hispanic: m % 3 == 2,
                        pwd: m % 4 == 0,
                        non_citizen,
                        non_citizen_child: non_citizen && child,
                        non_citizen_adult: non_citizen && !child,
                    });
                }
                members
            })
            .collect::<Vec<_>>();

        let baselines = crate::baseline::compute_baselines(&persons, &units)?;
        Self::new(persons, units, baselines)
    }
}

// Member shorthand for the test fixture.
const A: u8 = 0; // citizen adult
const NA: u8 = 1; // non-citizen adult
const C: u8 = 2; // citizen child
const NC: u8 = 3; // non-citizen child

fn test_unit(
    id: i64,
    state: &str,
    members: &[u8],
    spmtotres: f64,
    spmthresh: f64,
    spmwt: f64,
    adjginc: f64,
) -> SpmUnitRow {
    let adult = members.iter().filter(|&&m| m == A || m == NA).count() as u32;
    let child = members.iter().filter(|&&m| m == C || m == NC).count() as u32;
    let non_citizen_adult = members.iter().filter(|&&m| m == NA).count() as u32;
    let non_citizen_child = members.iter().filter(|&&m| m == NC).count() as u32;
    SpmUnitRow {
        spmfamunit: id,
        year: 2020,
        state: state.into(),
        numper: adult + child,
        spmtotres,
        spmthresh,
        spmwt,
        adjginc,
        // Stored negated, like the prepared tables. No liability on
        // negative AGI.
        fedtaxac: -(adjginc.max(0.0) * 0.12),
        fica: -(adjginc.max(0.0) * 0.0765),
        stataxac: -(adjginc.max(0.0) * 0.04),
        ctc: 2_000.0 * child as f64,
        incssi: 0.0,
        incunemp: 0.0,
        eitcred: if adjginc > 0.0 && adjginc < 40_000.0 && child > 0 {
            3_000.0
        } else {
            0.0
        },
        spmheat: 0.0,
        spmsnap: if spmtotres < spmthresh { 2_400.0 } else { 0.0 },
        child,
        adult,
        non_citizen: non_citizen_adult + non_citizen_child,
        non_citizen_child,
        non_citizen_adult,
    }
}
