//! The reform selection: the validated input contract of the engine.
//!
//! A selection is transient — constructed fresh per request, never
//! persisted. Validation happens HERE, at the boundary, before any
//! computation: the engine itself assumes a valid selection. Two rules
//! mirror the dashboard's reactive constraints (spec'd at the input
//! boundary, not inside the engine):
//!   - children and adults may not both be excluded from the UBI;
//!   - a state-level reform may only repeal the income tax — federal
//!     benefits and the payroll tax are off the table.

use crate::{
    baseline::BaselineStats,
    data::{SpmUnitRow, US},
    error::{EngineError, EngineResult},
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReformLevel {
    Federal,
    State,
}

impl ReformLevel {
    pub fn key(self) -> &'static str {
        match self {
            Self::Federal => "federal",
            Self::State => "state",
        }
    }

    pub fn from_key(key: &str) -> EngineResult<Self> {
        match key {
            "federal" => Ok(Self::Federal),
            "state" => Ok(Self::State),
            other => Err(EngineError::UnknownKey {
                kind: "reform level",
                key: other.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaxComponent {
    IncomeTax,
    EmployeePayroll,
}

impl TaxComponent {
    pub fn key(self) -> &'static str {
        match self {
            Self::IncomeTax => "income_tax",
            Self::EmployeePayroll => "employee_payroll",
        }
    }

    pub fn from_key(key: &str) -> EngineResult<Self> {
        match key {
            "income_tax" => Ok(Self::IncomeTax),
            "employee_payroll" => Ok(Self::EmployeePayroll),
            other => Err(EngineError::UnknownKey {
                kind: "tax",
                key: other.to_string(),
            }),
        }
    }

    /// The unit column this repeal draws from. At state level the income
    /// tax means the STATE income tax.
    pub fn amount(self, unit: &SpmUnitRow, level: ReformLevel) -> f64 {
        match (self, level) {
            (Self::IncomeTax, ReformLevel::Federal) => unit.fedtaxac,
            (Self::IncomeTax, ReformLevel::State) => unit.stataxac,
            (Self::EmployeePayroll, _) => unit.fica,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BenefitComponent {
    Ctc,
    Ssi,
    Snap,
    Eitc,
    Unemployment,
    EnergySubsidy,
}

impl BenefitComponent {
    pub const ALL: [BenefitComponent; 6] = [
        BenefitComponent::Ctc,
        BenefitComponent::Ssi,
        BenefitComponent::Snap,
        BenefitComponent::Eitc,
        BenefitComponent::Unemployment,
        BenefitComponent::EnergySubsidy,
    ];

    pub fn key(self) -> &'static str {
        match self {
            Self::Ctc => "ctc",
            Self::Ssi => "ssi",
            Self::Snap => "snap",
            Self::Eitc => "eitc",
            Self::Unemployment => "unemployment",
            Self::EnergySubsidy => "energy_subsidy",
        }
    }

    pub fn from_key(key: &str) -> EngineResult<Self> {
        Self::ALL
            .into_iter()
            .find(|b| b.key() == key)
            .ok_or_else(|| EngineError::UnknownKey {
                kind: "benefit",
                key: key.to_string(),
            })
    }

    pub fn amount(self, unit: &SpmUnitRow) -> f64 {
        match self {
            Self::Ctc => unit.ctc,
            Self::Ssi => unit.incssi,
            Self::Snap => unit.spmsnap,
            Self::Eitc => unit.eitcred,
            Self::Unemployment => unit.incunemp,
            Self::EnergySubsidy => unit.spmheat,
        }
    }
}

/// A group excluded from receiving the UBI. The dashboard models this as
/// an exclusion checklist, so we keep that shape rather than inverting it
/// into an inclusion set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UbiExclusion {
    Children,
    Adults,
    NonCitizens,
}

impl UbiExclusion {
    pub fn key(self) -> &'static str {
        match self {
            Self::Children => "children",
            Self::Adults => "adults",
            Self::NonCitizens => "non_citizens",
        }
    }

    pub fn from_key(key: &str) -> EngineResult<Self> {
        match key {
            "children" => Ok(Self::Children),
            "adults" => Ok(Self::Adults),
            "non_citizens" => Ok(Self::NonCitizens),
            other => Err(EngineError::UnknownKey {
                kind: "exclusion",
                key: other.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReformSelection {
    pub level: ReformLevel,
    /// A state name from the baseline tables, or "US" for nationwide.
    pub state: String,
    /// Flat tax rate on AGI, a fraction in [0.0, 0.5].
    pub income_tax_rate: f64,
    pub repealed_taxes: Vec<TaxComponent>,
    pub repealed_benefits: Vec<BenefitComponent>,
    pub excluded: Vec<UbiExclusion>,
}

impl ReformSelection {
    /// A selection that changes nothing: no repeals, zero rate, everyone
    /// eligible. Useful as a starting point and in tests.
    pub fn no_op(level: ReformLevel, state: &str) -> Self {
        Self {
            level,
            state: state.to_string(),
            income_tax_rate: 0.0,
            repealed_taxes: Vec::new(),
            repealed_benefits: Vec::new(),
            excluded: Vec::new(),
        }
    }

    pub fn repeals_tax(&self, tax: TaxComponent) -> bool {
        self.repealed_taxes.contains(&tax)
    }

    pub fn repeals_benefit(&self, benefit: BenefitComponent) -> bool {
        self.repealed_benefits.contains(&benefit)
    }

    pub fn excludes(&self, group: UbiExclusion) -> bool {
        self.excluded.contains(&group)
    }

    /// Reject invalid input before it reaches the engine. Errors here are
    /// contract violations, never coerced or clamped.
    pub fn validate(&self, baselines: &BaselineStats) -> EngineResult<()> {
        if !(0.0..=0.5).contains(&self.income_tax_rate) {
            return Err(EngineError::TaxRateOutOfRange {
                rate: self.income_tax_rate,
            });
        }

        if self.state != US && !baselines.contains_state(&self.state) {
            return Err(EngineError::UnknownState {
                code: self.state.clone(),
            });
        }

        if self.excludes(UbiExclusion::Children) && self.excludes(UbiExclusion::Adults) {
            return Err(EngineError::ExcludedEveryone);
        }

        if self.level == ReformLevel::State {
            if self.repeals_tax(TaxComponent::EmployeePayroll) {
                return Err(EngineError::FederalComponentAtStateLevel {
                    component: TaxComponent::EmployeePayroll.key().to_string(),
                });
            }
            if let Some(benefit) = self.repealed_benefits.first() {
                return Err(EngineError::FederalComponentAtStateLevel {
                    component: benefit.key().to_string(),
                });
            }
        }

        Ok(())
    }
}
