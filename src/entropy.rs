//! Entropy accumulation
//!
//! Every ownership event folds its participants and the block it happened in
//! into the poem's running seed. The source is public and weak on purpose;
//! what matters is that it is total (never fails on wraparound) and
//! deterministic.

use crate::model::{Address, Seed};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Block-level inputs for one event
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockContext {
    /// Monotonic block counter
    pub number: u64,
    /// Block-level entropy (difficulty or randomness beacon)
    pub entropy: Seed,
}

impl BlockContext {
    pub fn new(number: u64, entropy: Seed) -> Self {
        BlockContext { number, entropy }
    }
}

/// Fold one event into the seed.
///
/// `seed' = seed + to - from + block.entropy + block.number (mod 2^256)`
///
/// Mints pass `Address::ZERO` as `from`, burns pass it as `to`.
pub fn update(seed: &Seed, from: &Address, to: &Address, block: &BlockContext) -> Seed {
    let next = seed
        .wrapping_add(&Seed::from_address(to))
        .wrapping_sub(&Seed::from_address(from))
        .wrapping_add(&block.entropy)
        .wrapping_add(&Seed::from_u64(block.number));
    debug!(
        block = block.number,
        from = %from.short(),
        to = %to.short(),
        seed = %next,
        "Entropy updated"
    );
    next
}

/// Pseudorandom draw in `0..100` for a step taken by `holder`
pub fn draw(seed: &Seed, holder: &Address) -> u8 {
    seed.wrapping_add(&Seed::from_address(holder)).rem(100) as u8
}
