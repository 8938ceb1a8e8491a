//! Error types for poem_engine

use crate::model::{Address, TokenId};
use thiserror::Error;

/// Result type alias for poem_engine operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in poem_engine operations
#[derive(Error, Debug)]
pub enum Error {
    // === Graph storage ===
    #[error("Index out of range for {field}: {index} (allowed {min}..={max})")]
    IndexOutOfRange {
        field: &'static str,
        index: u8,
        min: u8,
        max: u8,
    },

    #[error("Node {0} cannot be its own sibling")]
    SelfReferenceNotAllowed(u8),

    #[error("Value can't be more than {max} bytes (got {len})")]
    ValueTooLong { len: usize, max: usize },

    #[error("Can't support more than {max} siblings (got {count})")]
    TooManySiblings { count: usize, max: usize },

    #[error("No node stored at index {0}")]
    NoNodeStored(u8),

    #[error("Graph is frozen: minting has already begun")]
    GraphFrozen,

    #[error("Invalid graph: {0}")]
    InvalidGraph(String),

    // === Position machine ===
    #[error("No prior position found within the lookback window")]
    NoPriorPosition,

    #[error("No steps remaining: the poem is complete")]
    NoStepsRemaining,

    #[error("Invalid position state: {0}")]
    InvalidState(String),

    // === Token lifecycle ===
    #[error("Address {0} has already minted")]
    AlreadyMinted(Address),

    #[error("Address {0} already holds the maximum number of tokens")]
    HoldingLimit(Address),

    #[error("Out of tokens")]
    OutOfTokens,

    #[error("Token not found: {0}")]
    TokenNotFound(TokenId),

    #[error("Address {address} does not own token {token}")]
    NotOwner { token: TokenId, address: Address },

    #[error("The zero address cannot hold tokens")]
    ZeroAddress,

    // === Simulated chain ===
    #[error("Cannot advance {blocks} blocks at once (max {max})")]
    AdvanceTooFar { blocks: u64, max: u64 },

    // === Ambient ===
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] bincode::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Corruption detected: {0}")]
    Corruption(String),

    #[error("Invalid snapshot file: {0}")]
    InvalidFile(String),

    #[error("Version mismatch: expected {expected}, found {found}")]
    VersionMismatch { expected: u32, found: u32 },

    #[error("Config error: {0}")]
    Config(String),
}

impl Error {
    /// Shorthand for an out-of-range node reference
    pub(crate) fn out_of_range(field: &'static str, index: u8, min: u8, max: u8) -> Self {
        Error::IndexOutOfRange {
            field,
            index,
            min,
            max,
        }
    }
}
