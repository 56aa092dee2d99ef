use crate::block::BlockHash;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DbEvent {
    Block(DbBlockEvent),
    Canonicity(DbCanonicityEvent),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DbBlockEvent {
    AlreadySeenBlock { hash: BlockHash, number: u64 },
    NewBlock { hash: BlockHash, number: u64 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DbCanonicityEvent {
    NewCanonicalBlock {
        number: u64,
        hash: BlockHash,
    },
    Reorg {
        old_head: BlockHash,
        new_head: BlockHash,
        branch_point: BlockHash,
    },
}

impl DbEvent {
    pub fn is_new_block_event(&self) -> bool {
        matches!(self, Self::Block(DbBlockEvent::NewBlock { .. }))
    }
}
