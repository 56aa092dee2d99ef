use crate::block::{Block, StateRoot};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("state transition failed: {0}")]
    Failed(String),

    #[error("state root mismatch: computed {computed}, claimed {claimed}")]
    RootMismatch {
        computed: StateRoot,
        claimed: StateRoot,
    },
}

/// Applies a block's payload to its parent state root. Deterministic given
/// identical inputs; the chain manager rejects a block whose claimed root
/// differs from the computed one.
pub trait StateTransitionEngine: Send + Sync {
    fn apply(&self, parent_root: &StateRoot, block: &Block) -> Result<StateRoot, TransitionError>;
}

/// Accepts every block by echoing its claimed state root, a permissive
/// stand-in for testing without a real execution engine
#[derive(Debug, Default, Clone, Copy)]
pub struct PassthroughTransition;

impl StateTransitionEngine for PassthroughTransition {
    fn apply(&self, _parent_root: &StateRoot, block: &Block) -> Result<StateRoot, TransitionError> {
        Ok(block.state_root)
    }
}
