//! Bit-at-a-time sibling selection

use crate::model::{NodeIndex, Seed, MAX_SIBLINGS};

/// Iterates a seed's bits from most to least significant
pub struct SeedBitReader<'a> {
    seed: &'a Seed,
    position: usize,
}

impl<'a> SeedBitReader<'a> {
    pub fn new(seed: &'a Seed) -> Self {
        SeedBitReader { seed, position: 0 }
    }

    /// Bits consumed so far
    pub fn consumed(&self) -> usize {
        self.position
    }
}

impl Iterator for SeedBitReader<'_> {
    type Item = bool;

    fn next(&mut self) -> Option<bool> {
        if self.position >= Seed::BITS {
            return None;
        }
        let bit = self.seed.bit_msb_first(self.position);
        self.position += 1;
        Some(bit)
    }
}

/// Choose a sibling slot using the seed's bits.
///
/// A cursor walks the four slots cyclically, advancing one slot per bit.
/// The first 1-bit read while the cursor is on a populated slot picks that
/// slot. If the seed runs out first, the first populated slot wins. Returns
/// `None` only when every slot is empty.
pub fn select_sibling(seed: &Seed, slots: &[NodeIndex; MAX_SIBLINGS]) -> Option<NodeIndex> {
    let fallback = slots.iter().copied().find(|&s| s != 0)?;
    let mut cursor = 0;
    for bit in SeedBitReader::new(seed) {
        if bit && slots[cursor] != 0 {
            return Some(slots[cursor]);
        }
        cursor = (cursor + 1) % MAX_SIBLINGS;
    }
    Some(fallback)
}
