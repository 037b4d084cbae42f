//! Editing session: which single block is in edit mode.
//!
//! The session only tracks the active block and flips edit mode on the
//! engine. Capturing live content back into the pool is a separate step
//! ([`capture`]) so callers about to replace the whole pool can skip it.

use crowdly_blocks::{BlockId, BlockPool};

use crate::surface::{ContentSurface, EditingEngine};

/// Tracks the one block in edit mode.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct EditingSession {
    active: Option<BlockId>,
}

impl EditingSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active(&self) -> Option<&BlockId> {
        self.active.as_ref()
    }

    pub fn is_active(&self, id: &BlockId) -> bool {
        self.active.as_ref() == Some(id)
    }

    /// Put `id` in edit mode, taking any other block out of it first.
    ///
    /// Returns false (and touches nothing) when `id` is already active.
    pub fn activate<E: EditingEngine + ?Sized>(&mut self, engine: &mut E, id: &BlockId) -> bool {
        if self.is_active(id) {
            return false;
        }
        if let Some(previous) = self.active.take() {
            engine.set_editable(&previous, false);
        }
        engine.set_editable(id, true);
        engine.focus_end(id);
        self.active = Some(id.clone());
        tracing::debug!(%id, "editing");
        true
    }

    /// Take every listed block out of edit mode and clear the active block.
    ///
    /// Returns the block that was active, if any.
    pub fn deactivate<E: EditingEngine + ?Sized>(
        &mut self,
        engine: &mut E,
        blocks: &[BlockId],
    ) -> Option<BlockId> {
        for id in blocks {
            engine.set_editable(id, false);
        }
        if let Some(active) = &self.active {
            if !blocks.contains(active) {
                engine.set_editable(active, false);
            }
        }
        let previous = self.active.take();
        if let Some(id) = &previous {
            tracing::debug!(%id, "stopped editing");
        }
        previous
    }
}

/// Copy live markup of every visible block from the surface into the pool.
///
/// Blocks the surface doesn't have mounted keep their pool content. Returns
/// how many blocks changed.
pub fn capture<S: ContentSurface + ?Sized>(surface: &S, pool: &mut BlockPool) -> usize {
    let mut changed = 0;
    for id in pool.visible_ids() {
        if let Some(html) = surface.read(&id) {
            if pool.set_html(&id, &html).unwrap_or(false) {
                changed += 1;
            }
        }
    }
    changed
}

// ============================================================================
// Tests
// ============================================================================
