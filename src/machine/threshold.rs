//! Branch threshold tables
//!
//! A table is built fresh for every step from whatever branches the current
//! node actually has. Entries are ordered opaque, children (left, right),
//! jitter; each carries a cumulative threshold and the last one is always
//! 100. A draw in `0..100` selects the first entry whose threshold exceeds it.

use crate::model::{Node, NodeIndex};
use serde::{Deserialize, Serialize};

/// One selectable branch
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Branch {
    /// Stay put; the step records no position
    Opaque,
    /// Move to this child
    Child(NodeIndex),
    /// Move to one of the node's siblings
    Jitter,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ThresholdTable {
    entries: Vec<(Branch, u8)>,
}

impl ThresholdTable {
    /// Build the table for `node` given opacity and jitter percentages.
    ///
    /// Without siblings the jitter share goes to the children; without
    /// children it goes to the siblings; with neither the opaque branch
    /// covers everything.
    pub fn build(node: &Node, opacity: u8, jitter: u8) -> Self {
        let children = node.children();
        let has_siblings = node.has_siblings();

        let opaque = if children.is_empty() && !has_siblings {
            100
        } else {
            opacity.min(100) as u32
        };
        let remaining = 100 - opaque;
        let jitter_mass = match (has_siblings, children.is_empty()) {
            (false, _) => 0,
            (true, true) => remaining,
            (true, false) => (jitter as u32).min(remaining),
        };
        let child_mass = remaining - jitter_mass;

        let mut entries = Vec::with_capacity(children.len() + 2);
        entries.push((Branch::Opaque, opaque as u8));
        let count = children.len() as u32;
        for (i, &child) in children.iter().enumerate() {
            let cumulative = opaque + child_mass * (i as u32 + 1) / count;
            entries.push((Branch::Child(child), cumulative as u8));
        }
        if has_siblings {
            entries.push((Branch::Jitter, 100));
        }
        ThresholdTable { entries }
    }

    /// Pick the branch for a draw in `0..100`
    pub fn select(&self, draw: u8) -> Branch {
        self.entries
            .iter()
            .find(|(_, threshold)| *threshold > draw)
            .map(|(branch, _)| *branch)
            // thresholds end at 100, so only out-of-range draws get here
            .unwrap_or(Branch::Opaque)
    }

    pub fn entries(&self) -> &[(Branch, u8)] {
        &self.entries
    }
}
