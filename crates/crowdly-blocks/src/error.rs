//! Error types for pool operations.

use thiserror::Error;

use crate::{BlockId, BlockKind};

/// Errors that can occur while mutating the block pool.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BlockError {
    /// No slot with this id exists in the pool.
    #[error("block not found: {0:?}")]
    UnknownBlock(BlockId),

    /// The slot exists but is hidden, so it cannot anchor or be the target of
    /// an edit.
    #[error("block is not visible: {0:?}")]
    NotVisible(BlockId),

    /// Every slot of this kind is already visible.
    #[error("no free {0} slots left")]
    PoolExhausted(BlockKind),
}
