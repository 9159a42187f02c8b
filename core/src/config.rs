//! Engine configuration.
//!
//! The only tunable today is the flat-tax AGI floor, kept per reform
//! level. The source methodology floors AGI at zero for federal reforms
//! but applies the rate to negative AGI at state level; the two defaults
//! preserve that behavior instead of silently unifying it.

use crate::selection::ReformLevel;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Floor AGI at zero before applying the flat rate in federal reforms.
    #[serde(default = "default_true")]
    pub flat_tax_floor_federal: bool,
    /// Same floor for state-level reforms. Off by default: state reforms
    /// tax negative AGI as-is.
    #[serde(default)]
    pub flat_tax_floor_state: bool,
}

fn default_true() -> bool {
    true
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            flat_tax_floor_federal: true,
            flat_tax_floor_state: false,
        }
    }
}

impl EngineConfig {
    /// Load from data_dir/engine_config.json; missing file means defaults.
    pub fn load(data_dir: &str) -> anyhow::Result<Self> {
        let path = format!("{data_dir}/engine_config.json");
        match std::fs::read_to_string(&path) {
            Ok(content) => Ok(serde_json::from_str(&content)
                .map_err(|e| anyhow::anyhow!("Cannot parse {path}: {e}"))?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(anyhow::anyhow!("Cannot read {path}: {e}")),
        }
    }

    /// The AGI base the flat rate applies to at the given level.
    pub fn flat_tax_base(&self, level: ReformLevel, adjginc: f64) -> f64 {
        let floor = match level {
            ReformLevel::Federal => self.flat_tax_floor_federal,
            ReformLevel::State => self.flat_tax_floor_state,
        };
        if floor {
            adjginc.max(0.0)
        } else {
            adjginc
        }
    }
}
