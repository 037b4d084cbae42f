//! Error types for the editor crate.

use std::path::PathBuf;

use thiserror::Error;

use crowdly_blocks::{BlockError, BlockId};

/// Failures of a key-value store.
///
/// These never escape a save: persistence is best effort.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Writing would exceed the store's byte quota.
    #[error("storage quota exceeded: {needed} bytes needed, {quota} allowed")]
    QuotaExceeded { needed: usize, quota: usize },

    /// SQLite backend error.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Encoding the block list failed.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Failures loading the editor configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Errors surfaced by editor operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EditorError {
    /// Pool-level failure (unknown/hidden block, exhausted slots).
    #[error(transparent)]
    Block(#[from] BlockError),

    /// The rich-text engine hasn't finished starting up.
    #[error("editing engine is not ready")]
    EngineNotReady,

    /// The block has nothing rendered on the surface to edit.
    #[error("block {0:?} is not mounted on the surface")]
    NotMounted(BlockId),
}
