//! Poem configuration
//!
//! Loaded from a JSON file. Every field is optional; anything missing falls
//! back to the defaults below.
//!
//! ```json
//! {
//!   "encoding": "packed",
//!   "opacity": { "per_block": 5, "max": 50 },
//!   "jitter": { "per_owner": 5, "per_step": 2, "max": 30 },
//!   "limits": { "max_supply": 7, "mints_per_address": 1, "max_held": 3 }
//! }
//! ```

use crate::lifecycle::PopulationLimits;
use crate::machine::{JitterCurve, OpacityCurve};
use crate::store::Encoding;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Top-level configuration for a poem
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoemConfig {
    /// Node storage encoding, fixed for the life of the poem
    pub encoding: Encoding,
    pub opacity: OpacityCurve,
    pub jitter: JitterCurve,
    pub limits: PopulationLimits,
}

impl PoemConfig {
    /// Parse and validate a JSON document
    pub fn from_json(content: &str) -> Result<Self> {
        let config: PoemConfig = serde_json::from_str(content)
            .map_err(|e| Error::Config(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a JSON config file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::from_json(&content)
    }

    /// Reject values the step selection cannot honor
    pub fn validate(&self) -> Result<()> {
        if self.opacity.max > 100 {
            return Err(Error::Config(format!(
                "opacity.max must be at most 100, got {}",
                self.opacity.max
            )));
        }
        if self.jitter.max > 100 {
            return Err(Error::Config(format!(
                "jitter.max must be at most 100, got {}",
                self.jitter.max
            )));
        }
        if self.limits.max_supply == 0 {
            return Err(Error::Config("limits.max_supply must be positive".into()));
        }
        if self.limits.mints_per_address == 0 {
            return Err(Error::Config(
                "limits.mints_per_address must be positive".into(),
            ));
        }
        if self.limits.max_held == 0 {
            return Err(Error::Config("limits.max_held must be positive".into()));
        }
        Ok(())
    }
}
