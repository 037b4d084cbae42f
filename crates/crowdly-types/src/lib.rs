//! Shared block types for the Crowdly editor.
//!
//! This crate is the leaf of the workspace: block identity, block kinds, and
//! the serializable `Block` record. It has **no internal crowdly
//! dependencies**; the pool, persistence, and editing layers build on it.
//!
//! # Key Types
//!
//! |---------------|---------------------------------------------------|
//! | Type          | Purpose                                           |
//! |---------------|---------------------------------------------------|
//! | [`BlockId`]   | Stable slot identifier (`title-0`, `p-12`, ...)   |
//! | [`BlockKind`] | What a block *is* (title, chapter, paragraph)     |
//! | [`Block`]     | One content slot: kind, order, visibility, markup |
//! |---------------|---------------------------------------------------|

pub mod block;
pub mod ids;

pub use block::{Block, BlockKind, strip_markup};
pub use ids::BlockId;
