//! Deterministic block source
//!
//! Outside a real chain, events still need block numbers and block entropy.
//! [`Chain`] derives each block's entropy from the previous one with BLAKE3,
//! so a given genesis always yields the same sequence.

use crate::entropy::BlockContext;
use crate::model::Seed;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// Most blocks a single [`Chain::advance`] may produce
pub const MAX_ADVANCE: u64 = 1_000_000;

/// A simulated, append-only block sequence
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chain {
    head: BlockContext,
}

impl Chain {
    /// Start a chain at block 0 with the given genesis entropy
    pub fn new(genesis: Seed) -> Self {
        Chain {
            head: BlockContext::new(0, genesis),
        }
    }

    /// Start a chain from a human-readable label
    pub fn from_label(label: &str) -> Self {
        Self::new(Seed::digest_many(&[b"poem-genesis", label.as_bytes()]))
    }

    /// The latest block
    pub fn head(&self) -> BlockContext {
        self.head
    }

    /// Produce the next block and return it
    pub fn next_block(&mut self) -> BlockContext {
        let number = self.head.number + 1;
        let entropy = Seed::digest_many(&[self.head.entropy.as_bytes(), &number.to_be_bytes()]);
        self.head = BlockContext::new(number, entropy);
        self.head
    }

    /// Produce `blocks` empty blocks, modelling time passing.
    ///
    /// Each block costs one BLAKE3 hash, so `blocks` is capped at
    /// [`MAX_ADVANCE`].
    pub fn advance(&mut self, blocks: u64) -> Result<BlockContext> {
        if blocks > MAX_ADVANCE {
            return Err(Error::AdvanceTooFar {
                blocks,
                max: MAX_ADVANCE,
            });
        }
        for _ in 0..blocks {
            self.next_block();
        }
        Ok(self.head)
    }
}

impl Default for Chain {
    fn default() -> Self {
        Self::from_label("default")
    }
}
