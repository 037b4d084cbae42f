//! Block identifiers.
//!
//! A `BlockId` names one pool slot for the lifetime of the process. Ids are
//! derived from the slot's kind and its index within that kind
//! (`title-0`, `chapter-3`, `p-41`), so a freshly built pool of the same shape
//! always produces the same ids. Persistence relies on that to reconcile
//! stored entries with a new pool.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::BlockKind;

/// Prefix of the rendering-surface element id for a block.
const ELEMENT_PREFIX: &str = "block-";

/// Stable string identifier of a pool slot.
#[derive(Clone, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlockId(String);

impl BlockId {
    /// Wrap an arbitrary identifier (e.g. one read back from storage).
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The id of slot `index` of the given kind.
    pub fn slot(kind: BlockKind, index: usize) -> Self {
        Self(format!("{}-{}", kind.slot_prefix(), index))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Element id of this block on the rendering surface: `block-<id>`.
    pub fn element_id(&self) -> String {
        format!("{ELEMENT_PREFIX}{}", self.0)
    }

    /// Recover a block id from a rendering-surface element id.
    pub fn from_element_id(element_id: &str) -> Option<Self> {
        element_id
            .strip_prefix(ELEMENT_PREFIX)
            .filter(|rest| !rest.is_empty())
            .map(Self::new)
    }
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BlockId({})", self.0)
    }
}

impl From<&str> for BlockId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

// ============================================================================
// Tests
// ============================================================================
