//! Node storage
//!
//! A poem graph has 25 fixed node slots. Two encodings keep them:
//!
//! - [`PackedNodeStore`]: one 32-byte word per node (26-byte fragment cap,
//!   fragment left-padded)
//! - [`StructuredNodeStore`]: one record per node (28-byte fragment cap,
//!   fragment right-padded, dense sibling list)
//!
//! Both validate writes the same way; the encoding is chosen once, when the
//! store is created.

mod packed;
mod snapshot;
mod structured;

pub use packed::{PackedNodeStore, PackedWord};
pub use snapshot::{Snapshot, SNAPSHOT_MAGIC, SNAPSHOT_VERSION};
pub use structured::StructuredNodeStore;

use crate::model::{Node, NodeIndex, NodeSpec, Padding, MAX_NODES, MAX_SIBLINGS};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// Storage encoding for graph nodes
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Encoding {
    /// Single fixed-width word per node
    #[default]
    Packed,
    /// Structured record per node
    Structured,
}

impl Encoding {
    /// Maximum fragment length in bytes
    pub fn value_cap(&self) -> usize {
        match self {
            Encoding::Packed => packed::VALUE_CAP,
            Encoding::Structured => structured::VALUE_CAP,
        }
    }

    /// Which side of the fragment field is padded
    pub fn padding(&self) -> Padding {
        match self {
            Encoding::Packed => Padding::Leading,
            Encoding::Structured => Padding::Trailing,
        }
    }

    /// Create an empty store for this encoding
    pub fn new_store(&self) -> AnyNodeStore {
        match self {
            Encoding::Packed => AnyNodeStore::Packed(PackedNodeStore::new()),
            Encoding::Structured => AnyNodeStore::Structured(StructuredNodeStore::new()),
        }
    }
}

impl std::fmt::Display for Encoding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Encoding::Packed => write!(f, "packed"),
            Encoding::Structured => write!(f, "structured"),
        }
    }
}

/// Validated storage for the 25 graph nodes
pub trait NodeStore {
    /// The encoding this store uses
    fn encoding(&self) -> Encoding;

    /// Validate and store a node, replacing any previous node at that index.
    /// Nothing is stored when validation fails.
    fn write(&mut self, spec: &NodeSpec) -> Result<()>;

    /// Decode the node at `index`
    fn read(&self, index: NodeIndex) -> Result<Node>;

    /// Whether a node has been written at `index`
    fn contains(&self, index: NodeIndex) -> bool;

    /// Number of nodes written so far
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A store of either encoding, selected at construction
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AnyNodeStore {
    Packed(PackedNodeStore),
    Structured(StructuredNodeStore),
}

impl NodeStore for AnyNodeStore {
    fn encoding(&self) -> Encoding {
        match self {
            AnyNodeStore::Packed(s) => s.encoding(),
            AnyNodeStore::Structured(s) => s.encoding(),
        }
    }

    fn write(&mut self, spec: &NodeSpec) -> Result<()> {
        match self {
            AnyNodeStore::Packed(s) => s.write(spec),
            AnyNodeStore::Structured(s) => s.write(spec),
        }
    }

    fn read(&self, index: NodeIndex) -> Result<Node> {
        match self {
            AnyNodeStore::Packed(s) => s.read(index),
            AnyNodeStore::Structured(s) => s.read(index),
        }
    }

    fn contains(&self, index: NodeIndex) -> bool {
        match self {
            AnyNodeStore::Packed(s) => s.contains(index),
            AnyNodeStore::Structured(s) => s.contains(index),
        }
    }

    fn len(&self) -> usize {
        match self {
            AnyNodeStore::Packed(s) => s.len(),
            AnyNodeStore::Structured(s) => s.len(),
        }
    }
}

// === Shared validation ===

/// A node's own index must be in 1..=25
pub(crate) fn check_index(index: NodeIndex) -> Result<()> {
    if index == 0 || index > MAX_NODES {
        return Err(Error::out_of_range("index", index, 1, MAX_NODES));
    }
    Ok(())
}

/// Validate everything but the fragment, in write order.
///
/// `empty_slots` lets 0 stand for an unused sibling slot.
pub(crate) fn check_references(spec: &NodeSpec, empty_slots: bool) -> Result<()> {
    if spec.left_child > MAX_NODES {
        return Err(Error::out_of_range("left_child", spec.left_child, 0, MAX_NODES));
    }
    if spec.right_child > MAX_NODES {
        return Err(Error::out_of_range(
            "right_child",
            spec.right_child,
            0,
            MAX_NODES,
        ));
    }
    if spec.siblings.len() > MAX_SIBLINGS {
        return Err(Error::TooManySiblings {
            count: spec.siblings.len(),
            max: MAX_SIBLINGS,
        });
    }
    for &sibling in &spec.siblings {
        if sibling == 0 && empty_slots {
            continue;
        }
        if sibling == spec.index {
            return Err(Error::SelfReferenceNotAllowed(spec.index));
        }
        if sibling == 0 || sibling > MAX_NODES {
            return Err(Error::out_of_range("sibling", sibling, 1, MAX_NODES));
        }
    }
    Ok(())
}
