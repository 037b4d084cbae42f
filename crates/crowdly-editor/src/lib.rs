//! Editing session, persistence, and undo for the Crowdly block editor.
//!
//! [`Editor`] owns a [`crowdly_blocks::BlockPool`] and wires it to:
//!
//! - a rendering surface ([`ContentSurface`] + [`EditingEngine`]), the source
//!   of truth for a block's content while it is being edited
//! - a [`KvStore`] holding the whole pool as one JSON document, saved after
//!   every change on a best-effort basis
//! - a single-slot [`UndoBuffer`] armed by deletes, whose countdown runs on
//!   an injected [`UndoScheduler`]
//!
//! # Concurrency Model
//!
//! Single-threaded and event driven. The host feeds pointer/keyboard events
//! and undo expiry tickets into the editor one at a time; the only timers are
//! the undo countdown and the engine readiness poll ([`wait_until_ready`]).

pub mod config;
pub mod db;
pub mod editor;
mod error;
pub mod kv;
pub mod persist;
pub mod session;
pub mod surface;
pub mod undo;

pub use config::EditorConfig;
pub use db::SqliteKv;
pub use editor::{Answer, Confirm, ConfirmPrompt, DeleteOutcome, Editor};
pub use error::{ConfigError, EditorError, StorageError};
pub use kv::{KvStore, MemoryKv};
pub use persist::Persistence;
pub use session::EditingSession;
pub use surface::{ContentSurface, EditingEngine, MemorySurface, wait_until_ready};
pub use undo::{
    ManualScheduler, TokioUndoScheduler, UndoBuffer, UndoEntry, UndoLabel, UndoScheduler,
    UndoTicket,
};

/// Result type for editor operations.
pub type Result<T> = std::result::Result<T, EditorError>;
