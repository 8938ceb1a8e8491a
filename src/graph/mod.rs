//! Graph construction and traversal
//!
//! Graphs are written once, during the build phase, and frozen by the first
//! mint. [`default_poem`] builds the 25-fragment poem the engine ships with.

mod traversal;

pub use traversal::{GraphView, TraversalDirection};

use crate::model::{NodeIndex, NodeSpec};
use crate::store::{AnyNodeStore, Encoding, NodeStore};
use crate::Result;
use tracing::debug;

/// The default poem's fragments, by node index (1-based)
pub const DEFAULT_FRAGMENTS: [&str; 25] = [
    "As he ",
    "reached ",
    "dropped ",
    "upwards ",
    "his hands ",
    "his eyes ",
    "joyously, ",
    "to the clouds, ",
    "shyly, ",
    "towards his shoes, ",
    "the sun ",
    "the wind ",
    "the footsteps ",
    "thunderous laughter ",
    "twinkling feathers ",
    "boistered ",
    "assuaged ",
    "echoed in ",
    "brushed ",
    "his excitement. ",
    "his fears. ",
    "his ears. ",
    "His struggle ",
    "His adventure ",
    "was just beginning.",
];

/// Node indices per depth of the default diamond
pub const DEFAULT_LEVELS: [&[NodeIndex]; 9] = [
    &[1],
    &[2, 3],
    &[4, 5, 6],
    &[7, 8, 9, 10],
    &[11, 12, 13, 14, 15],
    &[16, 17, 18, 19],
    &[20, 21, 22],
    &[23, 24],
    &[25],
];

/// Collects node specs and writes them into a store in order
#[derive(Clone, Debug, Default)]
pub struct GraphBuilder {
    specs: Vec<NodeSpec>,
}

impl GraphBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn node(mut self, spec: NodeSpec) -> Self {
        self.specs.push(spec);
        self
    }

    pub fn specs(&self) -> &[NodeSpec] {
        &self.specs
    }

    /// Write every spec, stopping at the first rejected one
    pub fn write_into<S: NodeStore + ?Sized>(&self, store: &mut S) -> Result<()> {
        for spec in &self.specs {
            store.write(spec)?;
            debug!(index = spec.index, value = %spec.value, "Node written");
        }
        Ok(())
    }

    /// Write into a fresh store and check the result is a valid diamond
    pub fn build(&self, encoding: Encoding) -> Result<AnyNodeStore> {
        let mut store = encoding.new_store();
        self.write_into(&mut store)?;
        GraphView::new(&store).validate_diamond()?;
        Ok(store)
    }
}

/// Specs for the default poem.
///
/// Widening levels link position `i` to `i` and `i + 1` below; narrowing
/// levels link it to `i - 1` and `i`. Siblings are the other nodes on the
/// same level.
pub fn default_specs() -> Vec<NodeSpec> {
    let mut specs = Vec::with_capacity(DEFAULT_FRAGMENTS.len());
    for (depth, level) in DEFAULT_LEVELS.iter().enumerate() {
        let next = DEFAULT_LEVELS.get(depth + 1).copied().unwrap_or(&[]);
        for (pos, &index) in level.iter().enumerate() {
            let (left, right) = if next.is_empty() {
                (0, 0)
            } else if next.len() > level.len() {
                (next[pos], next[pos + 1])
            } else {
                let left = if pos > 0 { next[pos - 1] } else { 0 };
                (left, next.get(pos).copied().unwrap_or(0))
            };
            let siblings: Vec<NodeIndex> =
                level.iter().copied().filter(|&s| s != index).collect();
            specs.push(
                NodeSpec::new(index, DEFAULT_FRAGMENTS[index as usize - 1])
                    .children(left, right)
                    .siblings(&siblings),
            );
        }
    }
    specs
}

/// Build the default poem graph in the given encoding
pub fn default_poem(encoding: Encoding) -> Result<AnyNodeStore> {
    default_specs()
        .into_iter()
        .fold(GraphBuilder::new(), GraphBuilder::node)
        .build(encoding)
}
