//! Fixed-length position history

use crate::model::{NodeIndex, MAX_NODES, ROOT, TERMINAL};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// Number of depths, 0..=8
pub const PATH_LEN: usize = 9;

/// Depth of the terminal node
pub const TERMINAL_DEPTH: u8 = (PATH_LEN - 1) as u8;

/// How far back an opaque position may look for the last real one
pub const LOOKBACK: u8 = 7;

/// Position history: `path[0]` is the root, `path[8]` the terminal, and
/// intermediate slots stay 0 until visited (or forever, after an opaque step).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "[NodeIndex; PATH_LEN]", into = "[NodeIndex; PATH_LEN]")]
pub struct Path([NodeIndex; PATH_LEN]);

impl Path {
    pub fn new() -> Self {
        let mut slots = [0; PATH_LEN];
        slots[0] = ROOT;
        slots[PATH_LEN - 1] = TERMINAL;
        Path(slots)
    }

    /// Build a path from raw slots, checking the fixed endpoints
    pub fn from_slots(slots: [NodeIndex; PATH_LEN]) -> Result<Self> {
        if slots[0] != ROOT {
            return Err(Error::InvalidState(format!(
                "path must start at {}, found {}",
                ROOT, slots[0]
            )));
        }
        if slots[PATH_LEN - 1] != TERMINAL {
            return Err(Error::InvalidState(format!(
                "path must end at {}, found {}",
                TERMINAL,
                slots[PATH_LEN - 1]
            )));
        }
        if let Some(&bad) = slots.iter().find(|&&s| s > MAX_NODES) {
            return Err(Error::InvalidState(format!("path holds node {}", bad)));
        }
        Ok(Path(slots))
    }

    pub fn get(&self, depth: u8) -> NodeIndex {
        self.0[depth as usize]
    }

    /// Record a visited node at an intermediate depth
    pub(crate) fn record(&mut self, depth: u8, index: NodeIndex) {
        debug_assert!(depth > 0 && depth < TERMINAL_DEPTH);
        self.0[depth as usize] = index;
    }

    pub fn as_slice(&self) -> &[NodeIndex] {
        &self.0
    }

    /// Slots for depths `0..=curr_step`
    pub fn prefix(&self, curr_step: u8) -> &[NodeIndex] {
        &self.0[..=(curr_step as usize).min(PATH_LEN - 1)]
    }

    /// The most recent non-zero slot at or before `curr_step`, looking back
    /// at most [`LOOKBACK`] slots
    pub fn effective_index(&self, curr_step: u8) -> Result<NodeIndex> {
        let current = self.get(curr_step);
        if current != 0 {
            return Ok(current);
        }
        let floor = curr_step.saturating_sub(LOOKBACK);
        (floor..curr_step)
            .rev()
            .map(|depth| self.get(depth))
            .find(|&index| index != 0)
            .ok_or(Error::NoPriorPosition)
    }
}

impl Default for Path {
    fn default() -> Self {
        Self::new()
    }
}

impl TryFrom<[NodeIndex; PATH_LEN]> for Path {
    type Error = Error;

    fn try_from(slots: [NodeIndex; PATH_LEN]) -> Result<Self> {
        Path::from_slots(slots)
    }
}

impl From<Path> for [NodeIndex; PATH_LEN] {
    fn from(path: Path) -> Self {
        path.0
    }
}
