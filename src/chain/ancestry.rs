use crate::block::{store::BlockStore, AttachedBlock, BlockHash};
use anyhow::bail;

/// Read-only lineage walks over a block store. All walks are iterative with
/// explicit counters; histories can be long.
pub struct AncestorWalker<'a, S: BlockStore + ?Sized> {
    store: &'a S,
}

impl<'a, S: BlockStore + ?Sized> AncestorWalker<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Up to `depth` ancestors of the given block, nearest parent first.
    /// Stops quietly when genesis is reached, or when the starting hash is
    /// unknown.
    pub fn ancestors(&self, hash: &BlockHash, depth: u64) -> anyhow::Result<Vec<AttachedBlock>> {
        let mut ancestors = Vec::new();
        let Some(mut cursor) = self.store.get_block(hash)? else {
            return Ok(ancestors);
        };

        let mut steps = 0;
        while steps < depth && cursor.number() > 0 {
            cursor = self.parent_of(&cursor)?;
            ancestors.push(cursor.clone());
            steps += 1;
        }
        Ok(ancestors)
    }

    /// Lowest common ancestor of two attached blocks, plus the blocks on
    /// `side`'s branch above the ancestor in ascending height order. Handles
    /// forks of arbitrary depth, including a `side` that descends directly
    /// from `canonical`.
    pub fn branch_point(
        &self,
        side: &AttachedBlock,
        canonical: &AttachedBlock,
    ) -> anyhow::Result<(AttachedBlock, Vec<AttachedBlock>)> {
        let mut side_path = Vec::new();
        let mut a = side.clone();
        let mut b = canonical.clone();

        while a.number() > b.number() {
            side_path.push(a.clone());
            a = self.parent_of(&a)?;
        }
        while b.number() > a.number() {
            b = self.parent_of(&b)?;
        }
        while a.hash != b.hash {
            side_path.push(a.clone());
            a = self.parent_of(&a)?;
            b = self.parent_of(&b)?;
        }

        side_path.reverse();
        Ok((a, side_path))
    }

    fn parent_of(&self, block: &AttachedBlock) -> anyhow::Result<AttachedBlock> {
        if block.number() == 0 {
            bail!("no ancestor below genesis block {}", block.hash);
        }
        match self.store.get_block(block.parent_hash())? {
            Some(parent) => Ok(parent),
            None => bail!(
                "missing parent {} of stored block {}",
                block.parent_hash(),
                block.hash
            ),
        }
    }
}
