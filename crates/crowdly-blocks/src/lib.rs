//! Slot pool and ordering for the Crowdly block editor.
//!
//! # Design Philosophy
//!
//! A document is a fixed pool of typed slots (titles, chapters, paragraphs).
//! Nothing is allocated while editing:
//! - "Add" shows the next hidden slot of the requested kind
//! - "Delete" hides slots and clears their markup
//! - Order lives in a float key per block, renormalized after every change
//!
//! Running out of hidden slots is an explicit [`BlockError::PoolExhausted`],
//! never a silent no-op.
//!
//! # Ordering
//!
//! Visible blocks always hold orders `0..N-1`. New blocks are placed with a
//! fractional order right after their anchor and then normalized. Hidden
//! blocks park at `1000 + N` and up, numbered by pool position.

mod error;
pub mod order;
pub mod pool;

pub use crowdly_types::{Block, BlockId, BlockKind, strip_markup};
pub use error::BlockError;
pub use order::{HIDDEN_ORDER_BASE, normalize_orders, normalized};
pub use pool::{BlockPool, PoolLayout, Section};

/// Result type for pool operations.
pub type Result<T> = std::result::Result<T, BlockError>;
