//! Shared primitive types used across the entire engine.

use serde::{Deserialize, Serialize};

/// Composite household key: an SPM unit is unique within a survey year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UnitKey {
    pub spmfamunit: i64,
    pub year: u16,
}

impl std::fmt::Display for UnitKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.spmfamunit, self.year)
    }
}

/// A survey weight (person-level `asecwt` or unit-level `spmwt`).
pub type Weight = f64;

/// An annual dollar amount (USD).
pub type Dollars = f64;
