use crate::block::BlockHash;
use serde::{Deserialize, Serialize};

pub mod store;

#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
pub enum Canonicity {
    Canonical,
    Orphaned,
}

/// Current canonical tip. Mutated only by the chain manager, exactly once per
/// successful reorganization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainHead {
    pub hash: BlockHash,
    pub number: u64,
    pub total_difficulty: u64,
}
