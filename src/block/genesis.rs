use crate::{
    block::{Block, BlockHash, ProposerId, StateRoot},
    GENESIS_DIFFICULTY, GENESIS_TIMESTAMP,
};

pub struct GenesisBlock(Block);

impl GenesisBlock {
    /// Creates the network genesis block: number 0, no parent
    pub fn new() -> Self {
        Self(Block {
            parent_hash: BlockHash::ZERO,
            number: 0,
            difficulty: GENESIS_DIFFICULTY,
            state_root: StateRoot::EMPTY,
            proposer: ProposerId::NONE,
            timestamp: GENESIS_TIMESTAMP,
        })
    }

    pub fn to_block(self) -> Block {
        self.0
    }
}

impl Default for GenesisBlock {
    fn default() -> Self {
        Self::new()
    }
}
