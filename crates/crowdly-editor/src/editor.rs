//! The editor: block pool, surface, session, undo, and persistence wired
//! together behind the user-level operations.
//!
//! | Operation              | Effect                                              |
//! |------------------------|-----------------------------------------------------|
//! | [`Editor::add_after`]  | next hidden slot of the same kind, right after X    |
//! | [`Editor::add_chapter_after`] | chapter + seed paragraph after X's section   |
//! | [`Editor::clone_block`]| copy of X's live content, right after X             |
//! | [`Editor::delete`]     | hide X (chapters: with their paragraphs), arm undo  |
//! | [`Editor::undo`]       | restore the pre-delete snapshot                     |
//! | [`Editor::reset`]      | back to the sample document                         |
//!
//! Every structural change is mounted on the surface and then saved.

use std::fmt;

use crowdly_blocks::{
    Block, BlockError, BlockId, BlockKind, BlockPool, Section, strip_markup,
};

use crate::config::EditorConfig;
use crate::error::EditorError;
use crate::kv::KvStore;
use crate::persist::Persistence;
use crate::session::{EditingSession, capture};
use crate::surface::{ContentSurface, EditingEngine};
use crate::undo::{UndoBuffer, UndoLabel, UndoScheduler, UndoTicket};
use crate::Result;

/// Why a delete needs the user's go-ahead.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConfirmPrompt {
    LastTitle,
    LastChapter,
}

impl fmt::Display for ConfirmPrompt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfirmPrompt::LastTitle => f.write_str("This is the only title. Delete it anyway?"),
            ConfirmPrompt::LastChapter => {
                f.write_str("This is the only chapter. Delete it and its paragraphs anyway?")
            }
        }
    }
}

/// Asks the user to approve a destructive action.
pub trait Confirm {
    fn confirm(&mut self, prompt: ConfirmPrompt) -> bool;
}

/// A fixed answer, for hosts that ask up front.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Answer(pub bool);

impl Confirm for Answer {
    fn confirm(&mut self, _prompt: ConfirmPrompt) -> bool {
        self.0
    }
}

/// Result of [`Editor::delete`].
#[derive(Clone, Debug, PartialEq)]
pub enum DeleteOutcome {
    /// Blocks were hidden and an undo is pending.
    Deleted {
        removed: Vec<BlockId>,
        label: UndoLabel,
    },
    /// The user declined the confirmation; nothing changed.
    Cancelled,
}

/// Block editor over a rendering surface `S`.
pub struct Editor<S> {
    config: EditorConfig,
    pool: BlockPool,
    persistence: Persistence,
    undo: UndoBuffer,
    session: EditingSession,
    surface: S,
}

impl<S: ContentSurface + EditingEngine> Editor<S> {
    /// Load the saved document (or the sample one) and mount it on `surface`.
    pub fn open(
        config: EditorConfig,
        store: Box<dyn KvStore>,
        surface: S,
        scheduler: Box<dyn UndoScheduler>,
    ) -> Self {
        let persistence = Persistence::new(store, config.storage_key.clone());
        let pool = persistence.load(config.pool);
        let undo = UndoBuffer::new(scheduler, config.undo_window());

        let mut editor = Self {
            config,
            pool,
            persistence,
            undo,
            session: EditingSession::new(),
            surface,
        };
        editor.render(true);
        tracing::info!(
            key = editor.persistence.key(),
            visible = editor.pool.visible_ids().len(),
            "editor opened"
        );
        editor
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn pool(&self) -> &BlockPool {
        &self.pool
    }

    /// Every slot in pool order. Content may lag the surface while editing.
    pub fn blocks(&self) -> &[Block] {
        self.pool.blocks()
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    /// Block currently in edit mode.
    pub fn active(&self) -> Option<&BlockId> {
        self.session.active()
    }

    /// Label of the delete that can still be undone.
    pub fn pending_undo(&self) -> Option<UndoLabel> {
        self.undo.pending()
    }

    /// Visible blocks grouped under their headings.
    pub fn outline(&self) -> Vec<Section<'_>> {
        self.pool.sections()
    }

    /// Visible blocks as plain text, one per paragraph, live content first.
    pub fn plain_text(&self) -> String {
        self.pool
            .visible_ordered()
            .into_iter()
            .map(|b| match self.surface.read(&b.id) {
                Some(live) => strip_markup(&live),
                None => b.plain_text(),
            })
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    /// The document as last saved.
    pub fn saved_json(&self) -> Option<String> {
        self.persistence.raw()
    }

    fn visible_block(&self, id: &BlockId) -> Result<&Block> {
        let block = self
            .pool
            .get(id)
            .ok_or_else(|| BlockError::UnknownBlock(id.clone()))?;
        if !block.visible {
            return Err(BlockError::NotVisible(id.clone()).into());
        }
        Ok(block)
    }

    // =========================================================================
    // Editing session
    // =========================================================================

    /// Put a block in edit mode. Returns false when it already was.
    pub fn activate(&mut self, id: &BlockId) -> Result<bool> {
        self.visible_block(id)?;
        if !self.surface.is_ready() {
            return Err(EditorError::EngineNotReady);
        }
        if self.surface.read(id).is_none() {
            return Err(EditorError::NotMounted(id.clone()));
        }
        Ok(self.session.activate(&mut self.surface, id))
    }

    /// Leave edit mode, capturing live content and saving.
    pub fn deactivate(&mut self) {
        self.deactivate_with(false);
    }

    /// Leave edit mode. With `skip_save` the live content is not captured,
    /// for callers about to replace the pool wholesale.
    fn deactivate_with(&mut self, skip_save: bool) {
        let visible = self.pool.visible_ids();
        self.session.deactivate(&mut self.surface, &visible);
        if !skip_save {
            let changed = capture(&self.surface, &mut self.pool);
            tracing::debug!(changed, "captured live content");
            self.save();
        }
    }

    /// A pointer press. `None` means outside every block.
    ///
    /// Pressing anywhere but the active block ends the current session (with
    /// save); pressing a block then starts editing it.
    pub fn click(&mut self, target: Option<&BlockId>) -> Result<()> {
        if let Some(id) = target {
            if self.session.is_active(id) {
                return Ok(());
            }
        }
        if self.session.active().is_some() {
            self.deactivate();
        }
        if let Some(id) = target {
            self.activate(id)?;
        }
        Ok(())
    }

    /// Replace a block's content on the surface.
    ///
    /// For the block being edited this is just a surface write (captured on
    /// deactivate); any other block is committed and saved immediately.
    pub fn set_content(&mut self, id: &BlockId, html: &str) -> Result<()> {
        self.visible_block(id)?;
        self.surface.write(id, html);
        if !self.session.is_active(id) {
            self.pool.set_html(id, html)?;
            self.save();
        }
        Ok(())
    }

    // =========================================================================
    // Structural operations
    // =========================================================================

    /// Show a new empty block of the same kind right after `anchor`.
    pub fn add_after(&mut self, anchor: &BlockId) -> Result<BlockId> {
        let kind = self.visible_block(anchor)?.kind;
        let id = self.pool.insert_after(anchor, kind, "")?;
        self.render(false);
        self.save();
        tracing::info!(%id, %anchor, "added {kind}");
        Ok(id)
    }

    /// Show a new chapter and one paragraph after the section `anchor` is in.
    pub fn add_chapter_after(&mut self, anchor: &BlockId) -> Result<(BlockId, BlockId)> {
        self.visible_block(anchor)?;
        let (chapter, paragraph) = self.pool.insert_section_after(anchor, "", "")?;
        self.render(false);
        self.save();
        tracing::info!(%chapter, %paragraph, %anchor, "added chapter");
        Ok((chapter, paragraph))
    }

    /// Duplicate a block right after itself, copying its live content.
    pub fn clone_block(&mut self, source: &BlockId) -> Result<BlockId> {
        let block = self.visible_block(source)?;
        let kind = block.kind;
        let html = self
            .surface
            .read(source)
            .unwrap_or_else(|| block.html.clone());

        let id = self.pool.insert_after(source, kind, html)?;
        self.render(false);
        self.save();
        tracing::info!(%id, %source, "cloned {kind}");
        Ok(id)
    }

    /// Whether deleting `id` needs confirmation (last title / last chapter).
    pub fn needs_confirmation(&self, id: &BlockId) -> Option<ConfirmPrompt> {
        let block = self.pool.get(id).filter(|b| b.visible)?;
        let prompt = match block.kind {
            BlockKind::Title => ConfirmPrompt::LastTitle,
            BlockKind::Chapter => ConfirmPrompt::LastChapter,
            BlockKind::Paragraph => return None,
        };
        (self.pool.visible_count(block.kind) == 1).then_some(prompt)
    }

    /// Delete a block; chapters take their trailing paragraphs along.
    ///
    /// The pre-delete state (including live content of the block being
    /// edited) becomes the pending undo.
    pub fn delete(&mut self, id: &BlockId, confirm: &mut dyn Confirm) -> Result<DeleteOutcome> {
        let kind = self.visible_block(id)?.kind;
        if let Some(prompt) = self.needs_confirmation(id) {
            if !confirm.confirm(prompt) {
                tracing::info!(%id, "delete cancelled");
                return Ok(DeleteOutcome::Cancelled);
            }
        }

        let removed = self.pool.section_members(id)?;
        if self.session.active().is_some() {
            capture(&self.surface, &mut self.pool);
        }
        let snapshot = self.pool.snapshot();

        if self.session.active().is_some_and(|active| removed.contains(active)) {
            self.deactivate_with(true);
        }

        self.pool.hide(&removed);
        self.render(false);
        self.save();

        let label = if kind == BlockKind::Chapter && removed.len() > 1 {
            UndoLabel::Section {
                paragraphs: removed.len() - 1,
            }
        } else {
            UndoLabel::Deleted(kind)
        };
        self.undo.arm(snapshot, label);
        tracing::info!(%id, blocks = removed.len(), "{label}");

        Ok(DeleteOutcome::Deleted { removed, label })
    }

    /// Restore the pending delete. Returns false when nothing is pending.
    pub fn undo(&mut self) -> bool {
        let Some(entry) = self.undo.fire() else {
            return false;
        };
        self.deactivate_with(true);
        self.pool.restore(entry.snapshot);
        self.render(true);
        self.save();
        tracing::info!(label = %entry.label, "undone");
        true
    }

    /// The undo countdown for `ticket` ran out.
    pub fn expire_undo(&mut self, ticket: UndoTicket) -> bool {
        self.undo.expire(ticket)
    }

    /// Throw the document away and start over from the sample.
    pub fn reset(&mut self) {
        self.deactivate_with(true);
        self.undo.disarm();
        self.pool = BlockPool::initial(self.config.pool);
        self.render(true);
        self.save();
        tracing::info!("reset to sample document");
    }

    // =========================================================================
    // Rendering and persistence
    // =========================================================================

    /// Mount visible blocks and unmount hidden ones.
    ///
    /// Without `force`, blocks that are already mounted keep their live
    /// content, so a structural change never clobbers in-progress edits.
    fn render(&mut self, force: bool) {
        for block in self.pool.blocks() {
            let mounted = self.surface.read(&block.id).is_some();
            if block.visible {
                if force || !mounted {
                    self.surface.write(&block.id, &block.html);
                }
            } else if mounted {
                self.surface.remove(&block.id);
            }
        }
    }

    fn save(&mut self) {
        self.persistence.save(self.pool.blocks());
    }
}
