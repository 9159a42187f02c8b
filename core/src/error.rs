use crate::types::UnitKey;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Income tax rate {rate} outside [0.0, 0.5]")]
    TaxRateOutOfRange { rate: f64 },

    #[error("Unknown state code '{code}'")]
    UnknownState { code: String },

    #[error("Cannot exclude both children and adults from the UBI")]
    ExcludedEveryone,

    #[error("Component '{component}' is not repealable in a state-level reform")]
    FederalComponentAtStateLevel { component: String },

    #[error("Unknown {kind} key '{key}'")]
    UnknownKey { kind: &'static str, key: String },

    #[error("Person references SPM unit {key} which is not in the unit table")]
    UnpairedPerson { key: UnitKey },

    #[error("SPM unit {key} has zero members")]
    EmptyUnit { key: UnitKey },

    #[error("No baseline statistics for state '{state}'")]
    MissingBaseline { state: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type EngineResult<T> = Result<T, EngineError>;
