//! # poem_engine
//!
//! A shared generative poem driven by a tiny token population.
//!
//! At most seven tokens are ever minted. Every token is a view onto one
//! global position inside a fixed 25-node graph of text fragments, and
//! burning a token moves that position one step deeper. Which way it moves
//! is decided by a seed that every mint, transfer and burn folds block
//! entropy and participant addresses into.
//!
//! ## Core Concepts
//!
//! - **Nodes**: 25 fragments with two children and up to four siblings,
//!   stored in a packed or a structured encoding
//! - **Path**: the position history, root at depth 0 and terminal at depth 8
//! - **Opacity**: chance a step stays put, growing with holding duration
//! - **Jitter**: chance a step moves sideways, growing with owner turnover
//!
//! ## Example
//!
//! ```ignore
//! use poem_engine::{Address, Chain, Poem, PoemConfig};
//!
//! let mut chain = Chain::default();
//! let mut poem = Poem::with_default_graph(PoemConfig::default())?;
//! let alice = Address::from_low_u64(1);
//! let token = poem.mint(&alice, &chain.next_block())?;
//! poem.burn(&alice, token, &chain.next_block())?;
//! println!("{}", poem.verse()?);
//! ```

pub mod chain;
pub mod config;
pub mod entropy;
pub mod events;
pub mod graph;
pub mod lifecycle;
pub mod machine;
pub mod model;
pub mod store;

mod error;
mod poem;

pub use chain::Chain;
pub use config::PoemConfig;
pub use entropy::BlockContext;
pub use error::{Error, Result};
pub use events::{replay, Event, TrajectoryPoint};
pub use graph::{default_poem, GraphBuilder, GraphView, TraversalDirection};
pub use lifecycle::{Ledger, PopulationLimits};
pub use machine::{Path, PositionMachine, StepOutcome, StepRecord};
pub use model::{Address, Node, NodeIndex, NodeSpec, Seed, TokenId};
pub use poem::{BurnReceipt, Poem, SharedPoem, TokenView};
pub use store::{AnyNodeStore, Encoding, NodeStore, Snapshot};

/// Crate version, as reported by the CLI
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
