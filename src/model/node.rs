//! Graph node types

use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// A node slot in the graph, 1-based. 0 means "absent".
pub type NodeIndex = u8;

/// Number of node slots in the graph
pub const MAX_NODES: NodeIndex = 25;

/// Every path starts here
pub const ROOT: NodeIndex = 1;

/// Every path converges here
pub const TERMINAL: NodeIndex = 25;

/// Maximum number of sibling references per node
pub const MAX_SIBLINGS: usize = 4;

/// Which side of a fixed-width fragment field carries the zero padding
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Padding {
    /// Zeros first, fragment in the low-order bytes
    Leading,
    /// Fragment first, zeros after
    Trailing,
}

/// A text fragment exactly as an encoding stores it, padding included
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fragment {
    bytes: Vec<u8>,
    padding: Padding,
}

impl Fragment {
    /// Pad `value` to `width` bytes
    pub fn pad(value: &[u8], width: usize, padding: Padding) -> Result<Self> {
        if value.len() > width {
            return Err(Error::ValueTooLong {
                len: value.len(),
                max: width,
            });
        }
        let mut bytes = vec![0u8; width];
        match padding {
            Padding::Leading => bytes[width - value.len()..].copy_from_slice(value),
            Padding::Trailing => bytes[..value.len()].copy_from_slice(value),
        }
        Ok(Fragment { bytes, padding })
    }

    /// Wrap bytes that are already padded
    pub fn from_padded(bytes: Vec<u8>, padding: Padding) -> Self {
        Fragment { bytes, padding }
    }

    /// The full fixed-width field
    pub fn padded(&self) -> &[u8] {
        &self.bytes
    }

    /// The field with its padding removed.
    ///
    /// Fragments that themselves begin (leading) or end (trailing) with NUL
    /// bytes lose those bytes here; `padded()` is always exact.
    pub fn trimmed(&self) -> &[u8] {
        match self.padding {
            Padding::Leading => {
                let start = self
                    .bytes
                    .iter()
                    .position(|&b| b != 0)
                    .unwrap_or(self.bytes.len());
                &self.bytes[start..]
            }
            Padding::Trailing => {
                let end = self
                    .bytes
                    .iter()
                    .rposition(|&b| b != 0)
                    .map(|i| i + 1)
                    .unwrap_or(0);
                &self.bytes[..end]
            }
        }
    }

    pub fn padding(&self) -> Padding {
        self.padding
    }

    pub fn width(&self) -> usize {
        self.bytes.len()
    }

    /// The trimmed fragment as text
    pub fn text(&self) -> String {
        String::from_utf8_lossy(self.trimmed()).into_owned()
    }

    /// The padded field as `0x`-prefixed hex
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(&self.bytes))
    }
}

/// A node as read back from a store
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    pub index: NodeIndex,
    pub value: Fragment,
    pub left_child: NodeIndex,
    pub right_child: NodeIndex,
    /// Sibling references as the encoding keeps them (slot order)
    pub siblings: Vec<NodeIndex>,
}

impl Node {
    /// Non-zero children, left first
    pub fn children(&self) -> Vec<NodeIndex> {
        [self.left_child, self.right_child]
            .into_iter()
            .filter(|&c| c != 0)
            .collect()
    }

    /// Siblings laid out in four slots, 0 for empty
    pub fn sibling_slots(&self) -> [NodeIndex; MAX_SIBLINGS] {
        let mut slots = [0; MAX_SIBLINGS];
        for (slot, &sibling) in slots.iter_mut().zip(self.siblings.iter()) {
            *slot = sibling;
        }
        slots
    }

    pub fn has_siblings(&self) -> bool {
        self.siblings.iter().any(|&s| s != 0)
    }
}

/// Input to a node write
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeSpec {
    pub index: NodeIndex,
    pub value: String,
    #[serde(default)]
    pub left_child: NodeIndex,
    #[serde(default)]
    pub right_child: NodeIndex,
    #[serde(default)]
    pub siblings: Vec<NodeIndex>,
}

impl NodeSpec {
    pub fn new(index: NodeIndex, value: impl Into<String>) -> Self {
        NodeSpec {
            index,
            value: value.into(),
            left_child: 0,
            right_child: 0,
            siblings: Vec::new(),
        }
    }

    pub fn children(mut self, left: NodeIndex, right: NodeIndex) -> Self {
        self.left_child = left;
        self.right_child = right;
        self
    }

    pub fn siblings(mut self, siblings: &[NodeIndex]) -> Self {
        self.siblings = siblings.to_vec();
        self
    }
}
