use crate::{
    block::{store::BlockStore, AttachedBlock, Block, BlockHash},
    canonicity::{store::CanonicityStore, ChainHead},
    event::{
        db::{DbBlockEvent, DbCanonicityEvent, DbEvent},
        store::EventStore,
    },
    store::ChainStore,
};
use anyhow::{anyhow, ensure};
use std::sync::{Arc, Mutex};
use tracing::{debug, error, info, trace};

pub mod ancestry;
pub mod difficulty;
pub mod error;
pub mod transition;

use ancestry::AncestorWalker;
use difficulty::DifficultyOracle;
use error::{ChainError, InsertAborted};
use transition::{StateTransitionEngine, TransitionError};

/// Fork-choice core. Owns the canonical head; insertion validates candidate
/// blocks against their own lineage lock-free and funnels every
/// compare-and-swap of the head through one mutex.
pub struct ChainManager {
    store: Arc<ChainStore>,
    difficulty_oracle: Box<dyn DifficultyOracle>,
    transition_engine: Box<dyn StateTransitionEngine>,
    head: Mutex<ChainHead>,
}

impl ChainManager {
    /// Open a manager over the given store, attaching the genesis block if no
    /// head has been persisted yet
    pub fn new(
        store: Arc<ChainStore>,
        difficulty_oracle: Box<dyn DifficultyOracle>,
        transition_engine: Box<dyn StateTransitionEngine>,
        genesis: Block,
    ) -> anyhow::Result<Self> {
        let head = match store.get_chain_head()? {
            Some(head) => {
                debug!("Resuming from head {} at height {}", head.hash, head.number);
                head
            }
            None => {
                ensure!(genesis.is_genesis(), "genesis block must have number 0");
                let genesis = AttachedBlock::new(genesis.clone(), genesis.difficulty);
                info!("Attaching genesis block {}", genesis.hash);

                store.add_block(&genesis)?;
                store.add_canonical_block(0, &genesis.hash)?;
                let head = ChainHead {
                    hash: genesis.hash,
                    number: 0,
                    total_difficulty: genesis.total_difficulty,
                };
                store.set_chain_head(&head)?;
                head
            }
        };

        Ok(Self {
            store,
            difficulty_oracle,
            transition_engine,
            head: Mutex::new(head),
        })
    }

    /// Insert an ordered sequence of candidate blocks.
    ///
    /// Returns the final cumulative total difficulty reached by the sequence,
    /// whether or not it became canonical. On the first failing block the
    /// remaining batch is abandoned; the already committed prefix stands.
    pub fn insert_chain(&self, blocks: &[Block]) -> Result<u64, InsertAborted> {
        let mut td = 0;
        for (idx, block) in blocks.iter().enumerate() {
            match self.insert_block(block) {
                Ok(block_td) => td = block_td,
                Err(source) => {
                    error!("Chain insertion aborted at block {idx}: {source}");
                    return Err(InsertAborted {
                        td_reached: td,
                        committed: idx,
                        source,
                    });
                }
            }
        }
        Ok(td)
    }

    /// Snapshot of the current canonical head
    pub fn head(&self) -> ChainHead {
        self.head.lock().expect("head lock not poisoned").clone()
    }

    pub fn get_block(&self, hash: &BlockHash) -> anyhow::Result<Option<AttachedBlock>> {
        self.store.get_block(hash)
    }

    pub fn get_canonical_block_by_number(
        &self,
        number: u64,
    ) -> anyhow::Result<Option<AttachedBlock>> {
        match self.store.get_canonical_hash_at_number(number)? {
            None => Ok(None),
            Some(hash) => self.store.get_block(&hash),
        }
    }

    /// Up to `depth` ancestors of the given block, nearest parent first
    pub fn ancestors(&self, hash: &BlockHash, depth: u64) -> anyhow::Result<Vec<AttachedBlock>> {
        AncestorWalker::new(self.store.as_ref()).ancestors(hash, depth)
    }

    /// Validate, persist and weigh a single candidate block.
    /// No shared lock is held during validation.
    fn insert_block(&self, block: &Block) -> Result<u64, ChainError> {
        let hash = block.hash();

        // idempotent resubmission: the running td comes from the stored record
        if let Some(stored) = self.store.get_block(&hash)? {
            trace!("Block {hash} already stored, skipping re-validation");
            return Ok(stored.total_difficulty);
        }

        let parent = self
            .store
            .get_block(&block.parent_hash)?
            .ok_or(ChainError::BrokenChain {
                hash,
                parent: block.parent_hash,
            })?;

        let expected_number = parent.number() + 1;
        if block.number != expected_number {
            return Err(ChainError::DiscontinuousNumber {
                hash,
                expected: expected_number,
                actual: block.number,
            });
        }

        let expected = self.difficulty_oracle.compute(&parent, block.timestamp);
        if block.difficulty != expected {
            return Err(ChainError::InvalidDifficulty {
                hash,
                expected,
                actual: block.difficulty,
            });
        }

        let computed = self
            .transition_engine
            .apply(&parent.block.state_root, block)
            .map_err(|source| ChainError::InvalidTransition { hash, source })?;
        if computed != block.state_root {
            return Err(ChainError::InvalidTransition {
                hash,
                source: TransitionError::RootMismatch {
                    computed,
                    claimed: block.state_root,
                },
            });
        }

        let td = parent.total_difficulty + block.difficulty;
        let attached = AttachedBlock::new(block.clone(), td);

        let db_event = self.store.add_block(&attached)?;
        if let DbEvent::Block(DbBlockEvent::AlreadySeenBlock { .. }) = db_event {
            // lost a race to an identical insertion
            return Ok(self
                .store
                .get_block(&attached.hash)?
                .map_or(td, |stored| stored.total_difficulty));
        }

        self.try_advance_head(&attached)?;
        Ok(td)
    }

    /// Compare the block's weight against the canonical head and reorganize on
    /// strict improvement. The head lock covers only this compare-and-swap.
    fn try_advance_head(&self, block: &AttachedBlock) -> Result<(), ChainError> {
        let mut head = self.head.lock().expect("head lock not poisoned");

        if block.total_difficulty <= head.total_difficulty {
            // first-seen wins on equal weight
            trace!(
                "Block {} td {} does not improve on head td {}",
                block.hash,
                block.total_difficulty,
                head.total_difficulty
            );
            return Ok(());
        }

        let old_head = head.clone();
        let new_head = ChainHead {
            hash: block.hash,
            number: block.number(),
            total_difficulty: block.total_difficulty,
        };

        let old_head_block = self
            .store
            .get_block(&old_head.hash)?
            .ok_or_else(|| anyhow!("head block {} not in store", old_head.hash))?;

        let walker = AncestorWalker::new(self.store.as_ref());
        let (branch_point, adopted_blocks) = walker.branch_point(block, &old_head_block)?;

        let adopted: Vec<(u64, BlockHash)> = adopted_blocks
            .iter()
            .map(|adopted| (adopted.number(), adopted.hash))
            .collect();
        let retired: Vec<u64> = (new_head.number + 1..=old_head.number).collect();

        self.store.apply_reorg(&adopted, &retired, &new_head)?;

        if branch_point.hash == old_head.hash {
            debug!(
                "Head extended to {} at height {}",
                new_head.hash, new_head.number
            );
        } else {
            info!(
                "Reorg at height {}: head {} replaced by {} with td {}",
                branch_point.number(),
                old_head.hash,
                new_head.hash,
                new_head.total_difficulty
            );
            self.store
                .add_event(&DbEvent::Canonicity(DbCanonicityEvent::Reorg {
                    old_head: old_head.hash,
                    new_head: new_head.hash,
                    branch_point: branch_point.hash,
                }))?;
        }

        *head = new_head;
        Ok(())
    }
}
