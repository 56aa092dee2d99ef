use crate::{
    block::BlockHash,
    canonicity::{Canonicity, ChainHead},
};

pub trait CanonicityStore {
    /// Add the canonical block's number and hash
    fn add_canonical_block(&self, number: u64, hash: &BlockHash) -> anyhow::Result<()>;

    /// Get the hash of the canonical block at the given number
    fn get_canonical_hash_at_number(&self, number: u64) -> anyhow::Result<Option<BlockHash>>;

    /// Get the persisted canonical head
    fn get_chain_head(&self) -> anyhow::Result<Option<ChainHead>>;

    /// Set the persisted canonical head
    fn set_chain_head(&self, head: &ChainHead) -> anyhow::Result<()>;

    /// Switch the canonical branch in one atomic write: adopt the number
    /// entries of the winning branch, drop stale numbers above the new head,
    /// store the new head record
    fn apply_reorg(
        &self,
        adopted: &[(u64, BlockHash)],
        retired: &[u64],
        head: &ChainHead,
    ) -> anyhow::Result<()>;

    /// Get block canonicity
    fn get_block_canonicity(&self, hash: &BlockHash) -> anyhow::Result<Option<Canonicity>>;
}
