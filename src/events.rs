//! Event logs and deterministic replay
//!
//! An event log is a JSON array of lifecycle events. Each event is applied
//! at the next block of a [`Chain`]; `hold` only advances the chain.
//!
//! ```json
//! [
//!   { "op": "mint", "to": "0x000000000000000000000000000000000000000a" },
//!   { "op": "hold", "blocks": 12 },
//!   { "op": "burn", "holder": "0x000000000000000000000000000000000000000a", "token": 1 }
//! ]
//! ```

use crate::chain::Chain;
use crate::machine::Path;
use crate::model::{Address, Seed, TokenId};
use crate::poem::Poem;
use crate::Result;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// One lifecycle event
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Event {
    Mint {
        to: Address,
    },
    Transfer {
        from: Address,
        to: Address,
        token: TokenId,
    },
    Burn {
        holder: Address,
        token: TokenId,
    },
    /// Let blocks pass without any event
    Hold {
        blocks: u64,
    },
}

impl Event {
    /// Apply to `poem`, drawing the block from `chain`
    pub fn apply(&self, poem: &mut Poem, chain: &mut Chain) -> Result<()> {
        match self {
            Event::Mint { to } => {
                poem.mint(to, &chain.next_block())?;
            }
            Event::Transfer { from, to, token } => {
                poem.transfer(from, to, *token, &chain.next_block())?;
            }
            Event::Burn { holder, token } => {
                poem.burn(holder, *token, &chain.next_block())?;
            }
            Event::Hold { blocks } => {
                chain.advance(*blocks)?;
            }
        }
        Ok(())
    }
}

/// Shared state after one event
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrajectoryPoint {
    pub block: u64,
    pub path: Path,
    pub curr_step: u8,
    pub seed: Seed,
}

impl TrajectoryPoint {
    fn capture(poem: &Poem, chain: &Chain) -> Self {
        TrajectoryPoint {
            block: chain.head().number,
            path: *poem.path(),
            curr_step: poem.curr_step(),
            seed: *poem.seed(),
        }
    }
}

/// Parse a JSON event log
pub fn parse_log(content: &str) -> Result<Vec<Event>> {
    Ok(serde_json::from_str(content)?)
}

/// Apply `events` in order, recording the state after each one.
///
/// Stops at the first rejected event; the poem keeps everything applied
/// before it.
pub fn replay(
    poem: &mut Poem,
    chain: &mut Chain,
    events: &[Event],
) -> Result<Vec<TrajectoryPoint>> {
    let mut trajectory = Vec::with_capacity(events.len());
    for (i, event) in events.iter().enumerate() {
        event.apply(poem, chain)?;
        let point = TrajectoryPoint::capture(poem, chain);
        debug!(event = i, curr_step = point.curr_step, seed = %point.seed, "Replayed");
        trajectory.push(point);
    }
    Ok(trajectory)
}
