//! Packed node encoding: one 32-byte word per node
//!
//! Word layout (big-endian, byte offsets):
//! ```text
//! [0..26)   fragment, zero-padded on the left
//! [26]      left child
//! [27]      right child
//! [28..32)  sibling slots 0..3 (0 = empty)
//! ```

use super::{check_index, check_references, Encoding, NodeStore};
use crate::model::{Fragment, Node, NodeIndex, NodeSpec, Padding, MAX_NODES, MAX_SIBLINGS};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Maximum fragment length for the packed encoding
pub const VALUE_CAP: usize = 26;

const LEFT_CHILD: usize = 26;
const RIGHT_CHILD: usize = 27;
const SIBLINGS: usize = 28;

/// One encoded node
#[derive(Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PackedWord([u8; 32]);

impl PackedWord {
    /// Pack a node. Only the fragment length is checked here;
    /// reference validation belongs to the store.
    pub fn pack(spec: &NodeSpec) -> Result<Self> {
        let fragment = Fragment::pad(spec.value.as_bytes(), VALUE_CAP, Padding::Leading)?;
        let mut word = [0u8; 32];
        word[..VALUE_CAP].copy_from_slice(fragment.padded());
        word[LEFT_CHILD] = spec.left_child;
        word[RIGHT_CHILD] = spec.right_child;
        for (slot, &sibling) in spec.siblings.iter().take(MAX_SIBLINGS).enumerate() {
            word[SIBLINGS + slot] = sibling;
        }
        Ok(PackedWord(word))
    }

    pub fn value(&self) -> Fragment {
        Fragment::from_padded(self.0[..VALUE_CAP].to_vec(), Padding::Leading)
    }

    pub fn left_child(&self) -> NodeIndex {
        self.0[LEFT_CHILD]
    }

    pub fn right_child(&self) -> NodeIndex {
        self.0[RIGHT_CHILD]
    }

    pub fn siblings(&self) -> [NodeIndex; MAX_SIBLINGS] {
        let mut slots = [0; MAX_SIBLINGS];
        slots.copy_from_slice(&self.0[SIBLINGS..SIBLINGS + MAX_SIBLINGS]);
        slots
    }

    pub fn unpack(&self, index: NodeIndex) -> Node {
        Node {
            index,
            value: self.value(),
            left_child: self.left_child(),
            right_child: self.right_child(),
            siblings: self.siblings().to_vec(),
        }
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for PackedWord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PackedWord({})", self.to_hex())
    }
}

/// Node store keeping each node as a [`PackedWord`]
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackedNodeStore {
    words: [PackedWord; MAX_NODES as usize],
    /// Bit `i - 1` set once node `i` has been written
    written: u32,
}

impl PackedNodeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// The raw word for a stored node
    pub fn word(&self, index: NodeIndex) -> Result<PackedWord> {
        check_index(index)?;
        if !self.contains(index) {
            return Err(Error::NoNodeStored(index));
        }
        Ok(self.words[index as usize - 1])
    }
}

impl NodeStore for PackedNodeStore {
    fn encoding(&self) -> Encoding {
        Encoding::Packed
    }

    fn write(&mut self, spec: &NodeSpec) -> Result<()> {
        check_index(spec.index)?;
        let word = PackedWord::pack(spec)?;
        check_references(spec, true)?;

        self.words[spec.index as usize - 1] = word;
        self.written |= 1 << (spec.index - 1);
        Ok(())
    }

    fn read(&self, index: NodeIndex) -> Result<Node> {
        Ok(self.word(index)?.unpack(index))
    }

    fn contains(&self, index: NodeIndex) -> bool {
        index >= 1 && index <= MAX_NODES && self.written & (1 << (index - 1)) != 0
    }

    fn len(&self) -> usize {
        self.written.count_ones() as usize
    }
}
