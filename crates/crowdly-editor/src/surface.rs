//! Rendering surface and rich-text engine capabilities.
//!
//! The block pool never touches rendering. The editor talks to whatever draws
//! the blocks through two traits:
//!
//! - [`ContentSurface`]: read/write a block's live markup. While a block is
//!   being edited, the surface is the source of truth for its content.
//! - [`EditingEngine`]: the rich-text engine: readiness, edit mode, caret.
//!
//! [`MemorySurface`] implements both in memory. Elements are addressed by
//! `block-<id>`, the same ids a browser page would use.

use std::cell::Cell;
use std::collections::BTreeMap;
use std::time::Duration;

use crowdly_blocks::BlockId;

/// Live content of rendered blocks.
pub trait ContentSurface {
    /// Current markup of a mounted block; `None` when it isn't rendered.
    fn read(&self, id: &BlockId) -> Option<String>;

    /// Mount a block, or overwrite the markup of a mounted one.
    fn write(&mut self, id: &BlockId, html: &str);

    /// Unmount a block. Unknown ids are ignored.
    fn remove(&mut self, id: &BlockId);
}

/// The rich-text editing engine attached to the surface.
pub trait EditingEngine {
    /// Whether the engine has finished initializing.
    fn is_ready(&self) -> bool;

    /// Turn edit mode on or off for one block.
    fn set_editable(&mut self, id: &BlockId, editable: bool);

    /// Focus a block and put the caret after its last character.
    fn focus_end(&mut self, id: &BlockId);
}

/// Poll the engine until it reports ready. Returns the number of waits.
pub async fn wait_until_ready<E: EditingEngine + ?Sized>(engine: &E, poll: Duration) -> u32 {
    let mut waits = 0;
    while !engine.is_ready() {
        waits += 1;
        tokio::time::sleep(poll).await;
    }
    if waits > 0 {
        tracing::debug!(waits, "editing engine ready");
    }
    waits
}

#[derive(Debug, Clone, Default, PartialEq)]
struct Element {
    html: String,
    editable: bool,
}

/// In-memory surface and engine.
#[derive(Debug, Default)]
pub struct MemorySurface {
    /// Mounted elements keyed by element id.
    elements: BTreeMap<String, Element>,
    /// Focused block and caret position (in chars).
    focus: Option<(BlockId, usize)>,
    /// Readiness checks left to fail before the engine comes up.
    warmup: Cell<u32>,
}

impl MemorySurface {
    /// A surface whose engine is ready immediately.
    pub fn new() -> Self {
        Self::default()
    }

    /// A surface whose engine reports not-ready for the first `checks` polls.
    pub fn warming_up(checks: u32) -> Self {
        Self {
            warmup: Cell::new(checks),
            ..Self::default()
        }
    }

    /// Ids of mounted blocks.
    pub fn mounted(&self) -> Vec<BlockId> {
        self.elements
            .keys()
            .filter_map(|element| BlockId::from_element_id(element))
            .collect()
    }

    /// Blocks currently in edit mode.
    pub fn editable_ids(&self) -> Vec<BlockId> {
        self.elements
            .iter()
            .filter(|(_, e)| e.editable)
            .filter_map(|(element, _)| BlockId::from_element_id(element))
            .collect()
    }

    pub fn focused(&self) -> Option<&BlockId> {
        self.focus.as_ref().map(|(id, _)| id)
    }

    pub fn caret(&self) -> Option<usize> {
        self.focus.as_ref().map(|(_, caret)| *caret)
    }

    /// Insert text at the caret of the focused block, as a keyboard would.
    ///
    /// Does nothing (and returns false) unless the focused block is editable.
    pub fn type_text(&mut self, text: &str) -> bool {
        let Some((id, caret)) = self.focus.as_mut() else {
            return false;
        };
        let Some(element) = self.elements.get_mut(&id.element_id()) else {
            return false;
        };
        if !element.editable {
            return false;
        }

        let byte = element
            .html
            .char_indices()
            .nth(*caret)
            .map(|(i, _)| i)
            .unwrap_or(element.html.len());
        element.html.insert_str(byte, text);
        *caret += text.chars().count();
        true
    }
}

impl ContentSurface for MemorySurface {
    fn read(&self, id: &BlockId) -> Option<String> {
        self.elements.get(&id.element_id()).map(|e| e.html.clone())
    }

    fn write(&mut self, id: &BlockId, html: &str) {
        let element = self.elements.entry(id.element_id()).or_default();
        element.html = html.to_string();
        if let Some((focused, caret)) = self.focus.as_mut() {
            if focused == id {
                *caret = (*caret).min(html.chars().count());
            }
        }
    }

    fn remove(&mut self, id: &BlockId) {
        self.elements.remove(&id.element_id());
        if self.focused() == Some(id) {
            self.focus = None;
        }
    }
}

impl EditingEngine for MemorySurface {
    fn is_ready(&self) -> bool {
        let left = self.warmup.get();
        if left == 0 {
            return true;
        }
        self.warmup.set(left - 1);
        false
    }

    fn set_editable(&mut self, id: &BlockId, editable: bool) {
        if let Some(element) = self.elements.get_mut(&id.element_id()) {
            element.editable = editable;
        }
        if !editable && self.focused() == Some(id) {
            self.focus = None;
        }
    }

    fn focus_end(&mut self, id: &BlockId) {
        if let Some(element) = self.elements.get(&id.element_id()) {
            self.focus = Some((id.clone(), element.html.chars().count()));
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
