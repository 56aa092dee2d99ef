use crate::{
    block::{AttachedBlock, BlockHash},
    event::db::DbEvent,
};

pub trait BlockStore {
    /// Add the block at its hash; an already stored hash is reported through
    /// the returned event, never overwritten
    fn add_block(&self, block: &AttachedBlock) -> anyhow::Result<DbEvent>;

    /// Get the block with the given hash, canonical or not
    fn get_block(&self, hash: &BlockHash) -> anyhow::Result<Option<AttachedBlock>>;

    /// Check whether the given hash resolves to a stored block
    fn has_block(&self, hash: &BlockHash) -> anyhow::Result<bool>;
}
