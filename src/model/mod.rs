//! Core data model types for poem_engine

mod address;
mod node;
mod seed;

pub use address::Address;
pub use node::{
    Fragment, Node, NodeIndex, NodeSpec, Padding, MAX_NODES, MAX_SIBLINGS, ROOT, TERMINAL,
};
pub use seed::Seed;

/// Sequential token identifier, starting at 1
pub type TokenId = u32;
