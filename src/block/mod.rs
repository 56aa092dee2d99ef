use blake2::{digest::consts::U32, Blake2b, Digest};
use serde::{Deserialize, Serialize};
use std::fmt::{Debug, Display, Formatter, Result};

pub mod genesis;
pub mod store;

#[derive(Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BlockHash(pub [u8; 32]);

#[derive(Clone, Copy, Hash, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateRoot(pub [u8; 32]);

#[derive(Clone, Copy, Hash, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposerId(pub [u8; 20]);

/// Candidate block as submitted by a proposer. The identity hash is a pure
/// function of exactly these fields.
#[derive(Debug, Clone, Hash, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub parent_hash: BlockHash,
    pub number: u64,
    pub difficulty: u64,
    pub state_root: StateRoot,
    pub proposer: ProposerId,
    pub timestamp: u64,
}

/// Block that resolved against known history, stored with its cached hash and
/// cumulative total difficulty. Immutable once written.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachedBlock {
    pub block: Block,
    pub hash: BlockHash,
    pub total_difficulty: u64,
}

impl BlockHash {
    pub const ZERO: Self = Self([0; 32]);

    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl StateRoot {
    pub const EMPTY: Self = Self([0; 32]);
}

impl ProposerId {
    pub const NONE: Self = Self([0; 20]);
}

impl Block {
    /// Identity hash over the header fields, in declaration order
    pub fn hash(&self) -> BlockHash {
        let mut hasher = Blake2b::<U32>::new();
        hasher.update(self.parent_hash.0);
        hasher.update(self.number.to_be_bytes());
        hasher.update(self.difficulty.to_be_bytes());
        hasher.update(self.state_root.0);
        hasher.update(self.proposer.0);
        hasher.update(self.timestamp.to_be_bytes());
        BlockHash(hasher.finalize().into())
    }

    pub fn is_genesis(&self) -> bool {
        self.number == 0
    }
}

impl AttachedBlock {
    pub fn new(block: Block, total_difficulty: u64) -> Self {
        let hash = block.hash();
        Self {
            block,
            hash,
            total_difficulty,
        }
    }

    pub fn number(&self) -> u64 {
        self.block.number
    }

    pub fn parent_hash(&self) -> &BlockHash {
        &self.block.parent_hash
    }
}

impl Display for BlockHash {
    fn fmt(&self, f: &mut Formatter) -> Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

impl Display for StateRoot {
    fn fmt(&self, f: &mut Formatter) -> Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

impl Display for ProposerId {
    fn fmt(&self, f: &mut Formatter) -> Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

impl Debug for BlockHash {
    fn fmt(&self, f: &mut Formatter) -> Result {
        write!(f, "BlockHash {{ {self} }}")
    }
}

impl Debug for StateRoot {
    fn fmt(&self, f: &mut Formatter) -> Result {
        write!(f, "StateRoot {{ {self} }}")
    }
}

impl Debug for ProposerId {
    fn fmt(&self, f: &mut Formatter) -> Result {
        write!(f, "ProposerId {{ {self} }}")
    }
}

impl Debug for AttachedBlock {
    fn fmt(&self, f: &mut Formatter) -> Result {
        write!(
            f,
            "\nAttachedBlock {{\n  number: {:?},\n  hash:   {:?},\n  parent: {:?},\n  td:     {:?} }}",
            self.number(),
            self.hash,
            self.parent_hash(),
            self.total_difficulty
        )
    }
}
