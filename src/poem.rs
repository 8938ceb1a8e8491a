//! High-level Poem API
//!
//! A [`Poem`] ties the node store, the position machine, the entropy seed and
//! the token ledger together. Lifecycle calls run in a fixed order: check,
//! fold entropy, step (burn only), commit. A call that fails at any point
//! leaves the poem exactly as it was.

use crate::config::PoemConfig;
use crate::entropy::{self, BlockContext};
use crate::graph::{self, GraphView};
use crate::lifecycle::Ledger;
use crate::machine::{Path, PositionMachine, StepRecord};
use crate::model::{Address, Node, NodeIndex, NodeSpec, Seed, TokenId};
use crate::store::{AnyNodeStore, NodeStore};
use crate::{Error, Result};
use parking_lot::{Mutex, MutexGuard};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

/// Per-token state a renderer needs
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenView {
    pub token: TokenId,
    pub owner: Address,
    pub num_owners: u32,
    /// Logical clock ticks since the owner received a token
    pub holding_duration: u64,
    /// Opacity percentage a burn would use right now
    pub opacity: u8,
    /// Jitter percentage a burn would use right now
    pub jitter: u8,
}

/// Result of a committed burn
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BurnReceipt {
    pub token: TokenId,
    pub step: StepRecord,
    pub seed: Seed,
}

/// The poem: graph, shared position, seed and tokens
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Poem {
    config: PoemConfig,
    nodes: AnyNodeStore,
    machine: PositionMachine,
    seed: Seed,
    ledger: Ledger,
}

impl Poem {
    /// Create a poem with an empty graph
    pub fn new(config: PoemConfig) -> Result<Self> {
        config.validate()?;
        Ok(Poem {
            nodes: config.encoding.new_store(),
            machine: PositionMachine::new(config.opacity, config.jitter),
            seed: Seed::ONE,
            ledger: Ledger::new(config.limits),
            config,
        })
    }

    /// Create a poem holding the default 25-fragment graph
    pub fn with_default_graph(config: PoemConfig) -> Result<Self> {
        let mut poem = Self::new(config)?;
        poem.nodes = graph::default_poem(poem.config.encoding)?;
        Ok(poem)
    }

    pub fn config(&self) -> &PoemConfig {
        &self.config
    }

    pub fn nodes(&self) -> &AnyNodeStore {
        &self.nodes
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    /// Whether minting has begun, after which the graph is read-only
    pub fn is_frozen(&self) -> bool {
        self.ledger.minted() > 0
    }

    // === Graph ===

    /// Write a node during the build phase
    pub fn write_node(&mut self, spec: &NodeSpec) -> Result<()> {
        if self.is_frozen() {
            warn!(index = spec.index, "Rejected node write on a frozen graph");
            return Err(Error::GraphFrozen);
        }
        self.nodes.write(spec)
    }

    pub fn read_node(&self, index: NodeIndex) -> Result<Node> {
        self.nodes.read(index)
    }

    // === Lifecycle ===

    /// Mint the next token to `to`.
    ///
    /// The first mint activates the poem: the graph must pass diamond
    /// validation and is frozen from then on.
    pub fn mint(&mut self, to: &Address, block: &BlockContext) -> Result<TokenId> {
        let token = self.ledger.check_mint(to).inspect_err(|e| {
            warn!(to = %to, error = %e, "Rejected mint");
        })?;
        if !self.is_frozen() {
            GraphView::new(&self.nodes).validate_diamond()?;
        }

        let seed = entropy::update(&self.seed, &Address::ZERO, to, block);
        self.ledger.mint(to)?;
        self.seed = seed;

        info!(token, to = %to, block = block.number, "Minted");
        Ok(token)
    }

    pub fn transfer(
        &mut self,
        from: &Address,
        to: &Address,
        token: TokenId,
        block: &BlockContext,
    ) -> Result<()> {
        self.ledger
            .check_transfer(from, to, token)
            .inspect_err(|e| {
                warn!(token, from = %from, to = %to, error = %e, "Rejected transfer")
            })?;

        let seed = entropy::update(&self.seed, from, to, block);
        self.ledger.transfer(from, to, token)?;
        self.seed = seed;

        info!(token, from = %from, to = %to, block = block.number, "Transferred");
        Ok(())
    }

    /// Burn `token`, advancing the shared position by one step
    pub fn burn(
        &mut self,
        holder: &Address,
        token: TokenId,
        block: &BlockContext,
    ) -> Result<BurnReceipt> {
        let ticket = self
            .ledger
            .check_burn(holder, token)
            .inspect_err(|e| warn!(token, holder = %holder, error = %e, "Rejected burn"))?;

        let seed = entropy::update(&self.seed, holder, &Address::ZERO, block);
        let mut machine = self.machine.clone();
        let step = machine
            .take_step(
                &self.nodes,
                &seed,
                holder,
                ticket.num_blocks_held,
                ticket.num_owners,
            )
            .inspect_err(|e| warn!(token, error = %e, "Step failed, burn rejected"))?;
        self.ledger.burn(holder, token)?;
        self.machine = machine;
        self.seed = seed;

        info!(
            token,
            holder = %holder,
            block = block.number,
            outcome = ?step.outcome,
            curr_step = step.to_depth,
            "Burned"
        );
        Ok(BurnReceipt { token, step, seed })
    }

    // === Views ===

    pub fn path(&self) -> &Path {
        self.machine.path()
    }

    pub fn curr_step(&self) -> u8 {
        self.machine.curr_step()
    }

    pub fn seed(&self) -> &Seed {
        &self.seed
    }

    pub fn machine(&self) -> &PositionMachine {
        &self.machine
    }

    /// The fragments visited so far, opaque steps skipped
    pub fn verse(&self) -> Result<String> {
        let mut verse = String::new();
        for &index in self.path().prefix(self.curr_step()) {
            if index != 0 {
                verse.push_str(&self.nodes.read(index)?.value.text());
            }
        }
        Ok(verse)
    }

    pub fn token_view(&self, token: TokenId) -> Result<TokenView> {
        let record = self.ledger.token(token)?;
        let holding_duration = self.ledger.holding_duration(&record.owner);
        Ok(TokenView {
            token,
            owner: record.owner,
            num_owners: record.num_owners,
            holding_duration,
            opacity: self.machine.opacity_probability(holding_duration),
            jitter: self.machine.jitter_probability(record.num_owners),
        })
    }

    /// Views of every live token, by id
    pub fn token_views(&self) -> Result<Vec<TokenView>> {
        self.ledger
            .tokens()
            .map(|(token, _)| self.token_view(token))
            .collect()
    }
}

/// A poem shared between threads; every call takes the lock for its whole
/// duration, so events are applied one at a time
#[derive(Clone, Debug)]
pub struct SharedPoem {
    inner: Arc<Mutex<Poem>>,
}

impl SharedPoem {
    pub fn new(poem: Poem) -> Self {
        SharedPoem {
            inner: Arc::new(Mutex::new(poem)),
        }
    }

    /// Hold the lock across several calls
    pub fn lock(&self) -> MutexGuard<'_, Poem> {
        self.inner.lock()
    }

    pub fn mint(&self, to: &Address, block: &BlockContext) -> Result<TokenId> {
        self.inner.lock().mint(to, block)
    }

    pub fn transfer(
        &self,
        from: &Address,
        to: &Address,
        token: TokenId,
        block: &BlockContext,
    ) -> Result<()> {
        self.inner.lock().transfer(from, to, token, block)
    }

    pub fn burn(
        &self,
        holder: &Address,
        token: TokenId,
        block: &BlockContext,
    ) -> Result<BurnReceipt> {
        self.inner.lock().burn(holder, token, block)
    }

    /// Copy of the current state
    pub fn snapshot(&self) -> Poem {
        self.inner.lock().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::Chain;
    use crate::machine::StepOutcome;
    use crate::store::Encoding;

    fn addr(n: u64) -> Address {
        Address::from_low_u64(n)
    }

    fn poem() -> Poem {
        Poem::with_default_graph(PoemConfig::default()).unwrap()
    }

    /// A block that makes the next burn draw `value`, whoever holds the token
    fn block_drawing(poem: &Poem, value: u64) -> BlockContext {
        // seed' = seed - holder + entropy + number, draw = (seed' + holder) % 100
        let base = poem.seed().wrapping_add(&Seed::from_u64(1));
        let offset = (100 + value - base.rem(100) as u64) % 100;
        BlockContext::new(1, Seed::from_u64(offset))
    }

    #[test]
    fn test_new_poem_state() {
        let poem = poem();
        assert_eq!(poem.path().as_slice(), &[1, 0, 0, 0, 0, 0, 0, 0, 25]);
        assert_eq!(poem.curr_step(), 0);
        assert_eq!(*poem.seed(), Seed::ONE);
        assert_eq!(poem.verse().unwrap(), "As he ");
    }

    #[test]
    fn test_mint_then_draw_zero_burn_picks_left() {
        let mut poem = poem();
        let a = addr(0xA);
        let token = poem.mint(&a, &BlockContext::new(1, Seed::ZERO)).unwrap();
        let block = block_drawing(&poem, 0);
        let receipt = poem.burn(&a, token, &block).unwrap();
        assert_eq!(receipt.step.draw, 0);
        assert_eq!(receipt.step.outcome, StepOutcome::Child(2));
        assert_eq!(poem.path().get(1), 2);
        assert_eq!(poem.verse().unwrap(), "As he reached ");
    }

    #[test]
    fn test_writes_frozen_after_first_mint() {
        let mut poem = poem();
        poem.write_node(&NodeSpec::new(5, "his palms ").children(8, 9).siblings(&[4, 6]))
            .unwrap();
        poem.mint(&addr(1), &Chain::default().next_block()).unwrap();
        let err = poem.write_node(&NodeSpec::new(5, "late")).unwrap_err();
        assert!(matches!(err, Error::GraphFrozen));
        assert_eq!(poem.read_node(5).unwrap().value.text(), "his palms ");
    }

    #[test]
    fn test_first_mint_requires_valid_graph() {
        let mut poem = Poem::new(PoemConfig::default()).unwrap();
        poem.write_node(&NodeSpec::new(1, "alone").children(2, 0)).unwrap();
        let before = poem.clone();
        assert!(poem.mint(&addr(1), &BlockContext::new(1, Seed::ONE)).is_err());
        assert_eq!(poem, before);
        assert!(!poem.is_frozen());
    }

    #[test]
    fn test_rejected_calls_leave_state() {
        let mut chain = Chain::default();
        let mut poem = poem();
        poem.mint(&addr(1), &chain.next_block()).unwrap();
        let before = poem.clone();

        assert!(poem.mint(&addr(1), &chain.next_block()).is_err());
        assert!(poem.transfer(&addr(2), &addr(3), 1, &chain.next_block()).is_err());
        assert!(poem.burn(&addr(2), 1, &chain.next_block()).is_err());
        assert!(poem.burn(&addr(1), 9, &chain.next_block()).is_err());
        assert_eq!(poem, before);
    }

    #[test]
    fn test_seed_folds_every_event() {
        let mut chain = Chain::default();
        let mut poem = poem();
        let mut seeds = vec![*poem.seed()];
        poem.mint(&addr(1), &chain.next_block()).unwrap();
        seeds.push(*poem.seed());
        poem.transfer(&addr(1), &addr(2), 1, &chain.next_block()).unwrap();
        seeds.push(*poem.seed());
        poem.burn(&addr(2), 1, &chain.next_block()).unwrap();
        seeds.push(*poem.seed());
        for pair in seeds.windows(2) {
            assert_ne!(pair[0], pair[1]);
        }
    }

    #[test]
    fn test_token_view() {
        let mut chain = Chain::default();
        let mut poem = poem();
        poem.mint(&addr(1), &chain.next_block()).unwrap();
        poem.mint(&addr(2), &chain.next_block()).unwrap();
        poem.mint(&addr(3), &chain.next_block()).unwrap();
        poem.transfer(&addr(2), &addr(4), 2, &chain.next_block()).unwrap();

        let view = poem.token_view(1).unwrap();
        assert_eq!(view.owner, addr(1));
        assert_eq!(view.holding_duration, 3);
        assert_eq!(view.opacity, 15);
        assert_eq!(view.jitter, 0);

        let view = poem.token_view(2).unwrap();
        assert_eq!(view.owner, addr(4));
        assert_eq!(view.num_owners, 2);
        assert_eq!(view.holding_duration, 0);
        assert_eq!(view.jitter, 5);

        assert_eq!(poem.token_views().unwrap().len(), 3);
        assert!(matches!(poem.token_view(7), Err(Error::TokenNotFound(7))));
    }

    #[test]
    fn test_structured_encoding_runs_the_same_lifecycle() {
        let config = PoemConfig {
            encoding: Encoding::Structured,
            ..PoemConfig::default()
        };
        let mut chain = Chain::from_label("structured");
        let mut packed = poem();
        let mut structured = Poem::with_default_graph(config).unwrap();
        for n in 1..=3u64 {
            let block = chain.next_block();
            packed.mint(&addr(n), &block).unwrap();
            structured.mint(&addr(n), &block).unwrap();
        }
        for token in 1..=3u32 {
            let block = chain.next_block();
            let holder = addr(token as u64);
            packed.burn(&holder, token, &block).unwrap();
            structured.burn(&holder, token, &block).unwrap();
        }
        assert_eq!(packed.path(), structured.path());
        assert_eq!(packed.verse().unwrap(), structured.verse().unwrap());
    }

    #[test]
    fn test_shared_poem_serializes_mints() {
        let shared = SharedPoem::new(poem());
        let handles: Vec<_> = (1..=7u64)
            .map(|n| {
                let shared = shared.clone();
                std::thread::spawn(move || {
                    shared.mint(&addr(n), &BlockContext::new(n, Seed::from_u64(n)))
                })
            })
            .collect();
        let mut tokens: Vec<TokenId> = handles
            .into_iter()
            .map(|h| h.join().unwrap().unwrap())
            .collect();
        tokens.sort_unstable();
        assert_eq!(tokens, (1..=7).collect::<Vec<_>>());
        assert!(matches!(
            shared.mint(&addr(8), &BlockContext::new(8, Seed::ONE)),
            Err(Error::OutOfTokens)
        ));
        assert_eq!(shared.lock().ledger().minted(), 7);
    }
}
