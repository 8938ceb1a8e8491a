//! Opacity and jitter curves
//!
//! Both map a counter to a percentage in `0..=max`, increase monotonically
//! and saturate. Arithmetic saturates too, so arbitrarily large inputs are
//! safe.

use serde::{Deserialize, Serialize};

/// Probability of "no movement", growing with holding duration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OpacityCurve {
    /// Percentage points added per unit of holding duration
    pub per_block: u32,
    /// Saturation point, at most 100
    pub max: u32,
}

impl Default for OpacityCurve {
    fn default() -> Self {
        OpacityCurve {
            per_block: 5,
            max: 50,
        }
    }
}

impl OpacityCurve {
    pub fn probability(&self, num_blocks_held: u64) -> u8 {
        let raw = num_blocks_held.saturating_mul(self.per_block as u64);
        raw.min(self.max.min(100) as u64) as u8
    }
}

/// Probability of moving to a sibling instead of a child, growing with
/// ownership turnover and depth
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct JitterCurve {
    /// Percentage points per owner beyond the first
    pub per_owner: u32,
    /// Percentage points per step already taken
    pub per_step: u32,
    /// Saturation point, at most 100
    pub max: u32,
}

impl Default for JitterCurve {
    fn default() -> Self {
        JitterCurve {
            per_owner: 5,
            per_step: 2,
            max: 30,
        }
    }
}

impl JitterCurve {
    pub fn probability(&self, num_owners: u32, curr_step: u8) -> u8 {
        let turnover = (num_owners.saturating_sub(1) as u64).saturating_mul(self.per_owner as u64);
        let depth = (curr_step as u64).saturating_mul(self.per_step as u64);
        turnover
            .saturating_add(depth)
            .min(self.max.min(100) as u64) as u8
    }
}
