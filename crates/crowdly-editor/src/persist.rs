//! Persistence adapter: best-effort save/load of the whole pool.
//!
//! The stored value is JSON shaped `{ "blocks": [{id, kind, order, visible,
//! html}, ...] }` with every slot, visible or not. There is no schema version;
//! loading reconciles entries onto a freshly built pool by id instead.

use serde::{Deserialize, Serialize};

use crowdly_blocks::{Block, BlockPool, PoolLayout};

use crate::error::StorageError;
use crate::kv::KvStore;

#[derive(Serialize)]
struct StoredBlocksRef<'a> {
    blocks: &'a [Block],
}

#[derive(Deserialize)]
struct StoredBlocks {
    blocks: Vec<Block>,
}

/// Reads and writes the block list under one key.
pub struct Persistence {
    store: Box<dyn KvStore>,
    key: String,
}

impl Persistence {
    pub fn new(store: Box<dyn KvStore>, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Save every block. Failures are logged and dropped.
    ///
    /// Returns whether the write went through, for callers that want to
    /// report it; the editor itself ignores the answer.
    pub fn save(&mut self, blocks: &[Block]) -> bool {
        match self.try_save(blocks) {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(key = %self.key, "failed to persist blocks: {e}");
                false
            }
        }
    }

    fn try_save(&mut self, blocks: &[Block]) -> Result<(), StorageError> {
        let json = serde_json::to_string(&StoredBlocksRef { blocks })?;
        self.store.set(&self.key, &json)
    }

    /// Load the pool, falling back to the initial pool on any problem.
    pub fn load(&self, layout: PoolLayout) -> BlockPool {
        let raw = match self.store.get(&self.key) {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                tracing::debug!(key = %self.key, "no saved document, starting fresh");
                return BlockPool::initial(layout);
            }
            Err(e) => {
                tracing::warn!(key = %self.key, "failed to read saved document: {e}");
                return BlockPool::initial(layout);
            }
        };

        match serde_json::from_str::<StoredBlocks>(&raw) {
            Ok(stored) => {
                tracing::debug!(key = %self.key, blocks = stored.blocks.len(), "loaded saved document");
                BlockPool::reconcile(layout, stored.blocks)
            }
            Err(e) => {
                tracing::warn!(key = %self.key, "saved document is malformed, starting fresh: {e}");
                BlockPool::initial(layout)
            }
        }
    }

    /// The stored JSON, if any.
    pub fn raw(&self) -> Option<String> {
        self.store.get(&self.key).ok().flatten()
    }
}

// ============================================================================
// Tests
// ============================================================================
