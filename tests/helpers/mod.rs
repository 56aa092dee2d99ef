#![allow(dead_code)]

use blake2::{digest::consts::U32, Blake2b, Digest};
use chain_manager::{
    block::{genesis::GenesisBlock, AttachedBlock, Block, ProposerId, StateRoot},
    chain::{
        difficulty::{DifficultyOracle, FixedDifficulty},
        transition::{PassthroughTransition, StateTransitionEngine, TransitionError},
        ChainManager,
    },
    store::ChainStore,
};
use std::sync::Arc;

pub const TEST_DIFFICULTY: u64 = 1_000;
pub const TEST_SPACING: u64 = 13;

/// Sets up a new temp dir, deleted when it goes out of scope
pub fn setup_new_db_dir(prefix: &str) -> anyhow::Result<tempfile::TempDir> {
    let store_dir = tempfile::TempDir::with_prefix(prefix)?;
    if store_dir.path().exists() {
        std::fs::remove_dir_all(store_dir.path())?;
    }
    Ok(store_dir)
}

pub fn test_genesis() -> Block {
    let mut genesis = GenesisBlock::new().to_block();
    genesis.difficulty = TEST_DIFFICULTY;
    genesis
}

/// Fresh manager over a scratch database, validating with fixed difficulty
/// and a permissive transition engine
pub fn new_manager(
    prefix: &str,
) -> anyhow::Result<(tempfile::TempDir, ChainManager, Arc<ChainStore>)> {
    new_manager_with(
        prefix,
        Box::new(FixedDifficulty(TEST_DIFFICULTY)),
        Box::new(PassthroughTransition),
    )
}

pub fn new_manager_with(
    prefix: &str,
    difficulty_oracle: Box<dyn DifficultyOracle>,
    transition_engine: Box<dyn StateTransitionEngine>,
) -> anyhow::Result<(tempfile::TempDir, ChainManager, Arc<ChainStore>)> {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();

    let store_dir = setup_new_db_dir(prefix)?;
    let store = Arc::new(ChainStore::new(store_dir.path())?);
    let manager = ChainManager::new(
        store.clone(),
        difficulty_oracle,
        transition_engine,
        test_genesis(),
    )?;
    Ok((store_dir, manager, store))
}

fn proposer(byte: u8) -> ProposerId {
    let mut proposer = [0u8; 20];
    proposer[19] = byte;
    ProposerId(proposer)
}

/// `n` valid fixed-difficulty blocks extending `parent`; `proposer_byte`
/// keeps competing branches over the same numbers distinct
pub fn make_chain(parent: &AttachedBlock, n: usize, proposer_byte: u8) -> Vec<Block> {
    make_spaced_chain(parent, n, proposer_byte, TEST_SPACING, TEST_DIFFICULTY)
}

/// Like `make_chain` with explicit proposal spacing and per-block difficulty
pub fn make_spaced_chain(
    parent: &AttachedBlock,
    n: usize,
    proposer_byte: u8,
    spacing: u64,
    difficulty: u64,
) -> Vec<Block> {
    let mut blocks = Vec::with_capacity(n);
    let mut parent_hash = parent.hash;
    let mut number = parent.number();
    let mut timestamp = parent.block.timestamp;
    let state_root = parent.block.state_root;

    for _ in 0..n {
        number += 1;
        timestamp += spacing;
        let block = Block {
            parent_hash,
            number,
            difficulty,
            state_root,
            proposer: proposer(proposer_byte),
            timestamp,
        };
        parent_hash = block.hash();
        blocks.push(block);
    }
    blocks
}

/// Difficulty equal to the proposal spacing, letting tests weight branches
/// through timestamps alone
pub struct SpacingDifficulty;

impl DifficultyOracle for SpacingDifficulty {
    fn compute(&self, parent: &AttachedBlock, timestamp: u64) -> u64 {
        timestamp.saturating_sub(parent.block.timestamp)
    }
}

/// Strict engine deriving each state root from the parent root and the
/// block's payload fields
pub struct DigestTransition;

impl StateTransitionEngine for DigestTransition {
    fn apply(&self, parent_root: &StateRoot, block: &Block) -> Result<StateRoot, TransitionError> {
        Ok(digest_root(parent_root, block))
    }
}

pub fn digest_root(parent_root: &StateRoot, block: &Block) -> StateRoot {
    let mut hasher = Blake2b::<U32>::new();
    hasher.update(parent_root.0);
    hasher.update(block.number.to_be_bytes());
    hasher.update(block.proposer.0);
    hasher.update(block.timestamp.to_be_bytes());
    StateRoot(hasher.finalize().into())
}

/// `n` blocks extending `parent` whose claimed roots match `DigestTransition`
pub fn make_executed_chain(parent: &AttachedBlock, n: usize, proposer_byte: u8) -> Vec<Block> {
    let mut blocks = Vec::with_capacity(n);
    let mut parent_hash = parent.hash;
    let mut parent_root = parent.block.state_root;
    let mut number = parent.number();
    let mut timestamp = parent.block.timestamp;

    for _ in 0..n {
        number += 1;
        timestamp += TEST_SPACING;
        let mut block = Block {
            parent_hash,
            number,
            difficulty: TEST_DIFFICULTY,
            state_root: StateRoot::EMPTY,
            proposer: proposer(proposer_byte),
            timestamp,
        };
        block.state_root = digest_root(&parent_root, &block);
        parent_root = block.state_root;
        parent_hash = block.hash();
        blocks.push(block);
    }
    blocks
}
