//! The shared position state machine
//!
//! One [`PositionMachine`] exists per poem. It owns the position history and
//! the depth pointer; every burn advances it by exactly one step.

mod bits;
mod path;
mod probability;
mod threshold;

pub use bits::{select_sibling, SeedBitReader};
pub use path::{Path, LOOKBACK, PATH_LEN, TERMINAL_DEPTH};
pub use probability::{JitterCurve, OpacityCurve};
pub use threshold::{Branch, ThresholdTable};

use crate::entropy;
use crate::model::{Address, NodeIndex, Seed};
use crate::store::NodeStore;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Where a step ended up
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "node", rename_all = "snake_case")]
pub enum StepOutcome {
    /// No movement; the new depth's slot stays 0
    Opaque,
    Child(NodeIndex),
    Sibling(NodeIndex),
    /// Reached the final depth, which always holds the terminal node
    Terminal,
}

impl StepOutcome {
    /// The node recorded at the new depth, if any
    pub fn landed(&self) -> Option<NodeIndex> {
        match self {
            StepOutcome::Child(n) | StepOutcome::Sibling(n) => Some(*n),
            StepOutcome::Opaque | StepOutcome::Terminal => None,
        }
    }
}

/// Audit record of one committed step
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepRecord {
    pub from_depth: u8,
    pub to_depth: u8,
    /// Effective node the step started from
    pub from_node: NodeIndex,
    pub draw: u8,
    pub opacity: u8,
    pub jitter: u8,
    pub outcome: StepOutcome,
}

/// Position history plus depth pointer
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "MachineParts")]
pub struct PositionMachine {
    path: Path,
    curr_step: u8,
    opacity: OpacityCurve,
    jitter: JitterCurve,
}

impl PositionMachine {
    pub fn new(opacity: OpacityCurve, jitter: JitterCurve) -> Self {
        PositionMachine {
            path: Path::new(),
            curr_step: 0,
            opacity,
            jitter,
        }
    }

    /// Restore a machine at an arbitrary position
    pub fn from_parts(
        path: Path,
        curr_step: u8,
        opacity: OpacityCurve,
        jitter: JitterCurve,
    ) -> Result<Self> {
        if curr_step > TERMINAL_DEPTH {
            return Err(Error::InvalidState(format!(
                "curr_step {} exceeds {}",
                curr_step, TERMINAL_DEPTH
            )));
        }
        Ok(PositionMachine {
            path,
            curr_step,
            opacity,
            jitter,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn curr_step(&self) -> u8 {
        self.curr_step
    }

    /// Whether the terminal depth has been reached
    pub fn is_complete(&self) -> bool {
        self.curr_step >= TERMINAL_DEPTH
    }

    /// The true graph position, skipping back over opaque steps
    pub fn effective_current_index(&self) -> Result<NodeIndex> {
        self.path.effective_index(self.curr_step)
    }

    pub fn opacity_probability(&self, num_blocks_held: u64) -> u8 {
        self.opacity.probability(num_blocks_held)
    }

    pub fn jitter_probability(&self, num_owners: u32) -> u8 {
        self.jitter.probability(num_owners, self.curr_step)
    }

    /// Select and commit the next step.
    ///
    /// Everything is computed before anything is written, so an error
    /// leaves the machine unchanged.
    pub fn take_step<S: NodeStore + ?Sized>(
        &mut self,
        store: &S,
        seed: &Seed,
        holder: &Address,
        num_blocks_held: u64,
        num_owners: u32,
    ) -> Result<StepRecord> {
        if self.is_complete() {
            return Err(Error::NoStepsRemaining);
        }

        let from_node = self.effective_current_index()?;
        let draw = entropy::draw(seed, holder);
        let opacity = self.opacity_probability(num_blocks_held);
        let jitter = self.jitter_probability(num_owners);
        let to_depth = self.curr_step + 1;

        let outcome = if to_depth == TERMINAL_DEPTH {
            StepOutcome::Terminal
        } else {
            let node = store.read(from_node)?;
            let table = ThresholdTable::build(&node, opacity, jitter);
            debug!(node = from_node, draw, table = ?table.entries(), "Threshold table");
            match table.select(draw) {
                Branch::Opaque => StepOutcome::Opaque,
                Branch::Child(child) => StepOutcome::Child(child),
                Branch::Jitter => {
                    let sibling = select_sibling(seed, &node.sibling_slots()).ok_or_else(|| {
                        Error::InvalidGraph(format!("node {} has no siblings", from_node))
                    })?;
                    StepOutcome::Sibling(sibling)
                }
            }
        };

        if let Some(index) = outcome.landed() {
            self.path.record(to_depth, index);
        }
        self.curr_step = to_depth;

        let record = StepRecord {
            from_depth: to_depth - 1,
            to_depth,
            from_node,
            draw,
            opacity,
            jitter,
            outcome,
        };
        debug!(?record, "Step committed");
        Ok(record)
    }
}

/// Serialized form, checked by [`PositionMachine::from_parts`] on load
#[derive(Deserialize)]
struct MachineParts {
    path: Path,
    curr_step: u8,
    opacity: OpacityCurve,
    jitter: JitterCurve,
}

impl TryFrom<MachineParts> for PositionMachine {
    type Error = Error;

    fn try_from(parts: MachineParts) -> Result<Self> {
        Self::from_parts(parts.path, parts.curr_step, parts.opacity, parts.jitter)
    }
}

impl Default for PositionMachine {
    fn default() -> Self {
        Self::new(OpacityCurve::default(), JitterCurve::default())
    }
}
