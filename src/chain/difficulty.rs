use crate::{
    block::AttachedBlock, DIFFICULTY_BOUND_DIVISOR, DIFFICULTY_DURATION_LIMIT, MINIMUM_DIFFICULTY,
};

/// Required difficulty for a child of `parent` proposed at `timestamp`.
/// Implementations must be deterministic and side-effect-free so independent
/// validators of the same block always agree.
pub trait DifficultyOracle: Send + Sync {
    fn compute(&self, parent: &AttachedBlock, timestamp: u64) -> u64;
}

/// Bounded block-to-block adjustment: a proposal spaced inside the duration
/// limit raises difficulty by parent/divisor, a slower one lowers it by the
/// same amount, floored at the minimum difficulty.
#[derive(Debug, Default, Clone, Copy)]
pub struct AdjustedDifficulty;

impl DifficultyOracle for AdjustedDifficulty {
    fn compute(&self, parent: &AttachedBlock, timestamp: u64) -> u64 {
        let parent_difficulty = parent.block.difficulty;
        let adjust = parent_difficulty / DIFFICULTY_BOUND_DIVISOR;
        let spacing = timestamp.saturating_sub(parent.block.timestamp);
        let difficulty = if spacing < DIFFICULTY_DURATION_LIMIT {
            parent_difficulty.saturating_add(adjust)
        } else {
            parent_difficulty.saturating_sub(adjust)
        };
        difficulty.max(MINIMUM_DIFFICULTY)
    }
}

/// Constant required difficulty regardless of lineage, a permissive stand-in
/// for deterministic testing without proposal-work verification
#[derive(Debug, Clone, Copy)]
pub struct FixedDifficulty(pub u64);

impl DifficultyOracle for FixedDifficulty {
    fn compute(&self, _parent: &AttachedBlock, _timestamp: u64) -> u64 {
        self.0
    }
}
