use crate::{block::BlockHash, chain::transition::TransitionError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChainError {
    #[error("broken chain: parent {parent} of block {hash} not found")]
    BrokenChain { hash: BlockHash, parent: BlockHash },

    #[error("discontinuous number for block {hash}: expected {expected}, got {actual}")]
    DiscontinuousNumber {
        hash: BlockHash,
        expected: u64,
        actual: u64,
    },

    #[error("invalid difficulty for block {hash}: expected {expected}, got {actual}")]
    InvalidDifficulty {
        hash: BlockHash,
        expected: u64,
        actual: u64,
    },

    #[error("invalid state transition for block {hash}: {source}")]
    InvalidTransition {
        hash: BlockHash,
        source: TransitionError,
    },

    #[error("storage error: {0}")]
    Storage(#[from] anyhow::Error),
}

/// Batch insertion failure: the first failing block's error plus what was
/// already durably committed. Committed prefixes are never rolled back.
#[derive(Debug, Error)]
#[error("chain insertion aborted after {committed} block(s) at td {td_reached}: {source}")]
pub struct InsertAborted {
    pub td_reached: u64,
    pub committed: usize,
    #[source]
    pub source: ChainError,
}
