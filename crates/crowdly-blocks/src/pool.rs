//! Block pool: the canonical list of typed slots.
//!
//! The pool is built once with a fixed number of slots per kind. Showing a
//! hidden slot is the only way to "create" a block, and hiding it is the only
//! way to "delete" one. Every structural mutation ends with an order
//! normalization, so visible orders are always `0..N-1`.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::order::{insertion_order, normalize_orders};
use crate::{Block, BlockError, BlockId, BlockKind, Result};

/// Seed content of the initially visible slots.
pub const PLACEHOLDER_TITLE: &str = "Untitled Story";
pub const PLACEHOLDER_CHAPTER: &str = "Chapter One";
pub const PLACEHOLDER_OPENING: &str = "Once upon a time\u{2026}";
pub const PLACEHOLDER_HINT: &str = "Click any block to start writing.";

/// Number of slots per kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolLayout {
    pub titles: usize,
    pub chapters: usize,
    pub paragraphs: usize,
}

impl Default for PoolLayout {
    fn default() -> Self {
        Self {
            titles: 3,
            chapters: 10,
            paragraphs: 50,
        }
    }
}

impl PoolLayout {
    /// Slot count for one kind.
    pub fn capacity(&self, kind: BlockKind) -> usize {
        match kind {
            BlockKind::Title => self.titles,
            BlockKind::Chapter => self.chapters,
            BlockKind::Paragraph => self.paragraphs,
        }
    }

    /// Total slot count.
    pub fn total(&self) -> usize {
        self.titles + self.chapters + self.paragraphs
    }
}

/// A heading and the paragraphs that follow it, in visible order.
///
/// Paragraphs that come before the first heading form a section with no head.
#[derive(Debug, Clone, PartialEq)]
pub struct Section<'a> {
    pub head: Option<&'a Block>,
    pub paragraphs: Vec<&'a Block>,
}

/// Fixed-size pool of blocks.
#[derive(Debug, Clone, PartialEq)]
pub struct BlockPool {
    layout: PoolLayout,

    /// All slots in construction order: titles, chapters, paragraphs.
    blocks: Vec<Block>,
}

impl BlockPool {
    /// Build the starting pool.
    ///
    /// Slot 0 of every kind is visible with placeholder text, plus a second
    /// paragraph, giving `title-0 → chapter-0 → p-0 → p-1`. Everything else is
    /// hidden and empty. Kinds with zero capacity simply contribute nothing.
    pub fn initial(layout: PoolLayout) -> Self {
        let mut blocks = Vec::with_capacity(layout.total());

        for kind in BlockKind::ALL {
            for index in 0..layout.capacity(kind) {
                let id = BlockId::slot(kind, index);
                let seed = match (kind, index) {
                    (BlockKind::Title, 0) => Some((0.0, PLACEHOLDER_TITLE)),
                    (BlockKind::Chapter, 0) => Some((1.0, PLACEHOLDER_CHAPTER)),
                    (BlockKind::Paragraph, 0) => Some((2.0, PLACEHOLDER_OPENING)),
                    (BlockKind::Paragraph, 1) => Some((3.0, PLACEHOLDER_HINT)),
                    _ => None,
                };
                blocks.push(match seed {
                    Some((order, html)) => Block::shown(id, kind, order, html),
                    None => Block::hidden(id, kind, 0.0),
                });
            }
        }

        normalize_orders(&mut blocks);
        Self {
            layout,
            blocks,
        }
    }

    /// Rebuild from persisted blocks.
    ///
    /// Entries are matched to a freshly built pool by id; only `visible`,
    /// `order`, and `html` are taken from storage. Ids the pool doesn't have
    /// are dropped, and slots storage doesn't mention keep their initial
    /// state. This absorbs layout changes between versions. Markup stored
    /// on a hidden entry is dropped.
    pub fn reconcile(layout: PoolLayout, persisted: impl IntoIterator<Item = Block>) -> Self {
        let mut saved: HashMap<BlockId, Block> =
            persisted.into_iter().map(|b| (b.id.clone(), b)).collect();
        let mut pool = Self::initial(layout);

        for block in pool.blocks.iter_mut() {
            if let Some(entry) = saved.remove(&block.id) {
                block.visible = entry.visible;
                block.order = entry.order;
                // Hidden slots never carry markup.
                block.html = if entry.visible { entry.html } else { String::new() };
            }
        }

        if !saved.is_empty() {
            tracing::debug!(ignored = saved.len(), "dropped persisted blocks with unknown ids");
        }

        normalize_orders(&mut pool.blocks);
        pool
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn layout(&self) -> PoolLayout {
        self.layout
    }

    /// All slots in pool order (visible and hidden).
    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    /// Copy of every slot, for undo and persistence.
    pub fn snapshot(&self) -> Vec<Block> {
        self.blocks.clone()
    }

    /// Replace every slot with a snapshot taken from this pool earlier.
    pub fn restore(&mut self, snapshot: Vec<Block>) {
        self.blocks = snapshot;
    }

    pub fn get(&self, id: &BlockId) -> Option<&Block> {
        self.blocks.iter().find(|b| &b.id == id)
    }

    /// Visible blocks sorted by order.
    pub fn visible_ordered(&self) -> Vec<&Block> {
        let mut visible: Vec<&Block> = self.blocks.iter().filter(|b| b.visible).collect();
        visible.sort_by(|a, b| a.order.total_cmp(&b.order));
        visible
    }

    /// Ids of visible blocks in order.
    pub fn visible_ids(&self) -> Vec<BlockId> {
        self.visible_ordered().into_iter().map(|b| b.id.clone()).collect()
    }

    pub fn visible_count(&self, kind: BlockKind) -> usize {
        self.blocks.iter().filter(|b| b.visible && b.kind == kind).count()
    }

    /// Hidden slots still available for a kind.
    pub fn free_slots(&self, kind: BlockKind) -> usize {
        self.blocks.iter().filter(|b| !b.visible && b.kind == kind).count()
    }

    fn index_of(&self, id: &BlockId) -> Result<usize> {
        self.blocks
            .iter()
            .position(|b| &b.id == id)
            .ok_or_else(|| BlockError::UnknownBlock(id.clone()))
    }

    /// Index of a block that must exist and be visible.
    fn visible_index(&self, id: &BlockId) -> Result<usize> {
        let idx = self.index_of(id)?;
        if !self.blocks[idx].visible {
            return Err(BlockError::NotVisible(id.clone()));
        }
        Ok(idx)
    }

    /// First hidden slot of a kind, in pool order.
    fn next_hidden(&self, kind: BlockKind) -> Option<usize> {
        self.blocks.iter().position(|b| !b.visible && b.kind == kind)
    }

    // =========================================================================
    // Sections
    // =========================================================================

    /// Last block of the section containing `id`.
    ///
    /// Walks forward in visible order from `id` over paragraphs, stopping
    /// before the next title or chapter.
    pub fn section_end(&self, id: &BlockId) -> Result<BlockId> {
        self.visible_index(id)?;
        let ordered = self.visible_ordered();
        let start = ordered.iter().position(|b| &b.id == id).unwrap_or(0);

        let mut end = start;
        while end + 1 < ordered.len() && ordered[end + 1].kind == BlockKind::Paragraph {
            end += 1;
        }
        Ok(ordered[end].id.clone())
    }

    /// Blocks removed together when `id` is deleted.
    ///
    /// A chapter takes its trailing paragraphs with it (up to the next title
    /// or chapter). Titles and paragraphs go alone.
    pub fn section_members(&self, id: &BlockId) -> Result<Vec<BlockId>> {
        let idx = self.visible_index(id)?;
        if self.blocks[idx].kind != BlockKind::Chapter {
            return Ok(vec![id.clone()]);
        }

        let ordered = self.visible_ordered();
        let start = ordered.iter().position(|b| &b.id == id).unwrap_or(0);
        Ok(ordered[start..]
            .iter()
            .enumerate()
            .take_while(|(i, b)| *i == 0 || b.kind == BlockKind::Paragraph)
            .map(|(_, b)| b.id.clone())
            .collect())
    }

    /// Group visible blocks under their headings.
    pub fn sections(&self) -> Vec<Section<'_>> {
        let mut sections: Vec<Section<'_>> = Vec::new();
        for block in self.visible_ordered() {
            if block.kind.is_heading() {
                sections.push(Section {
                    head: Some(block),
                    paragraphs: Vec::new(),
                });
            } else if let Some(current) = sections.last_mut() {
                current.paragraphs.push(block);
            } else {
                sections.push(Section {
                    head: None,
                    paragraphs: vec![block],
                });
            }
        }
        sections
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Show the next hidden slot of `kind` directly after `anchor`.
    pub fn insert_after(
        &mut self,
        anchor: &BlockId,
        kind: BlockKind,
        html: impl Into<String>,
    ) -> Result<BlockId> {
        let anchor_order = self.blocks[self.visible_index(anchor)?].order;
        let slot = self
            .next_hidden(kind)
            .ok_or(BlockError::PoolExhausted(kind))?;

        let block = &mut self.blocks[slot];
        block.visible = true;
        block.order = insertion_order(anchor_order, 0, 1);
        block.html = html.into();
        let id = block.id.clone();

        self.renormalize();
        tracing::debug!(%id, %anchor, "inserted block");
        Ok(id)
    }

    /// Show a new chapter plus one seed paragraph after `anchor`'s section.
    ///
    /// Both slots are checked before anything changes, so an exhausted pool
    /// leaves the document untouched.
    pub fn insert_section_after(
        &mut self,
        anchor: &BlockId,
        chapter_html: impl Into<String>,
        paragraph_html: impl Into<String>,
    ) -> Result<(BlockId, BlockId)> {
        let end = self.section_end(anchor)?;
        let end_order = self.blocks[self.index_of(&end)?].order;

        let chapter_slot = self
            .next_hidden(BlockKind::Chapter)
            .ok_or(BlockError::PoolExhausted(BlockKind::Chapter))?;
        let paragraph_slot = self
            .next_hidden(BlockKind::Paragraph)
            .ok_or(BlockError::PoolExhausted(BlockKind::Paragraph))?;

        let chapter = &mut self.blocks[chapter_slot];
        chapter.visible = true;
        chapter.order = insertion_order(end_order, 0, 2);
        chapter.html = chapter_html.into();
        let chapter_id = chapter.id.clone();

        let paragraph = &mut self.blocks[paragraph_slot];
        paragraph.visible = true;
        paragraph.order = insertion_order(end_order, 1, 2);
        paragraph.html = paragraph_html.into();
        let paragraph_id = paragraph.id.clone();

        self.renormalize();
        tracing::debug!(chapter = %chapter_id, paragraph = %paragraph_id, after = %end, "inserted section");
        Ok((chapter_id, paragraph_id))
    }

    /// Hide and clear the given blocks. Unknown ids are skipped.
    ///
    /// Returns how many blocks actually went from visible to hidden.
    pub fn hide(&mut self, ids: &[BlockId]) -> usize {
        let mut hidden = 0;
        for block in self.blocks.iter_mut().filter(|b| ids.contains(&b.id)) {
            if block.visible {
                hidden += 1;
            }
            block.visible = false;
            block.html.clear();
        }
        self.renormalize();
        hidden
    }

    /// Overwrite a block's markup. Returns whether it changed.
    pub fn set_html(&mut self, id: &BlockId, html: &str) -> Result<bool> {
        let idx = self.index_of(id)?;
        let block = &mut self.blocks[idx];
        if block.html == html {
            return Ok(false);
        }
        block.html = html.to_string();
        Ok(true)
    }

    fn renormalize(&mut self) {
        normalize_orders(&mut self.blocks);
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> BlockId {
        BlockId::from(s)
    }

    fn visible(pool: &BlockPool) -> Vec<String> {
        pool.visible_ordered().iter().map(|b| b.id.to_string()).collect()
    }

    fn small() -> PoolLayout {
        PoolLayout {
            titles: 1,
            chapters: 2,
            paragraphs: 4,
        }
    }

    #[test]
    fn test_initial_pool_shape() {
        let pool = BlockPool::initial(PoolLayout::default());
        assert_eq!(pool.blocks().len(), 63);
        assert_eq!(visible(&pool), vec!["title-0", "chapter-0", "p-0", "p-1"]);

        let orders: Vec<f64> = pool.visible_ordered().iter().map(|b| b.order).collect();
        assert_eq!(orders, vec![0.0, 1.0, 2.0, 3.0]);

        for block in pool.blocks().iter().filter(|b| !b.visible) {
            assert!(block.html.is_empty());
            assert!(block.order >= 1004.0);
        }
        assert_eq!(pool.get(&id("title-0")).unwrap().html, PLACEHOLDER_TITLE);
    }

    #[test]
    fn test_insert_after_same_kind() {
        let mut pool = BlockPool::initial(PoolLayout::default());
        let new_id = pool.insert_after(&id("p-0"), BlockKind::Paragraph, "").unwrap();
        assert_eq!(new_id, id("p-2"));
        assert_eq!(visible(&pool), vec!["title-0", "chapter-0", "p-0", "p-2", "p-1"]);
        assert_eq!(pool.get(&new_id).unwrap().order, 3.0);
    }

    #[test]
    fn test_insert_after_hidden_anchor_fails() {
        let mut pool = BlockPool::initial(PoolLayout::default());
        let err = pool.insert_after(&id("p-7"), BlockKind::Paragraph, "").unwrap_err();
        assert_eq!(err, BlockError::NotVisible(id("p-7")));

        let err = pool.insert_after(&id("nope"), BlockKind::Paragraph, "").unwrap_err();
        assert_eq!(err, BlockError::UnknownBlock(id("nope")));
    }

    #[test]
    fn test_pool_exhausted_changes_nothing() {
        let mut pool = BlockPool::initial(small());
        pool.insert_after(&id("p-1"), BlockKind::Paragraph, "").unwrap();
        pool.insert_after(&id("p-1"), BlockKind::Paragraph, "").unwrap();
        let before = pool.clone();

        let err = pool.insert_after(&id("p-1"), BlockKind::Paragraph, "").unwrap_err();
        assert_eq!(err, BlockError::PoolExhausted(BlockKind::Paragraph));
        assert_eq!(pool, before);

        let err = pool.insert_after(&id("title-0"), BlockKind::Title, "").unwrap_err();
        assert_eq!(err, BlockError::PoolExhausted(BlockKind::Title));
    }

    #[test]
    fn test_section_end_skips_trailing_paragraphs() {
        let pool = BlockPool::initial(PoolLayout::default());
        assert_eq!(pool.section_end(&id("chapter-0")).unwrap(), id("p-1"));
        assert_eq!(pool.section_end(&id("p-0")).unwrap(), id("p-1"));
        assert_eq!(pool.section_end(&id("title-0")).unwrap(), id("title-0"));
    }

    #[test]
    fn test_insert_section_lands_after_whole_section() {
        let mut pool = BlockPool::initial(PoolLayout::default());
        let (chapter, para) = pool.insert_section_after(&id("chapter-0"), "", "").unwrap();
        assert_eq!(chapter, id("chapter-1"));
        assert_eq!(para, id("p-2"));
        assert_eq!(
            visible(&pool),
            vec!["title-0", "chapter-0", "p-0", "p-1", "chapter-1", "p-2"]
        );

        // A second section from the first chapter goes before chapter-1.
        pool.insert_section_after(&id("chapter-0"), "", "").unwrap();
        assert_eq!(
            visible(&pool),
            vec!["title-0", "chapter-0", "p-0", "p-1", "chapter-2", "p-3", "chapter-1", "p-2"]
        );
    }

    #[test]
    fn test_insert_section_needs_both_slots() {
        let mut pool = BlockPool::initial(PoolLayout {
            titles: 1,
            chapters: 3,
            paragraphs: 2,
        });
        let before = pool.clone();
        let err = pool.insert_section_after(&id("chapter-0"), "", "").unwrap_err();
        assert_eq!(err, BlockError::PoolExhausted(BlockKind::Paragraph));
        assert_eq!(pool, before);
    }

    #[test]
    fn test_section_members() {
        let mut pool = BlockPool::initial(PoolLayout::default());
        pool.insert_section_after(&id("chapter-0"), "", "").unwrap();

        assert_eq!(
            pool.section_members(&id("chapter-0")).unwrap(),
            vec![id("chapter-0"), id("p-0"), id("p-1")]
        );
        assert_eq!(
            pool.section_members(&id("chapter-1")).unwrap(),
            vec![id("chapter-1"), id("p-2")]
        );
        assert_eq!(pool.section_members(&id("p-0")).unwrap(), vec![id("p-0")]);
        assert_eq!(pool.section_members(&id("title-0")).unwrap(), vec![id("title-0")]);
    }

    #[test]
    fn test_hide_clears_and_renormalizes() {
        let mut pool = BlockPool::initial(PoolLayout::default());
        let hidden = pool.hide(&[id("chapter-0"), id("p-0")]);
        assert_eq!(hidden, 2);
        assert_eq!(visible(&pool), vec!["title-0", "p-1"]);

        let chapter = pool.get(&id("chapter-0")).unwrap();
        assert!(!chapter.visible);
        assert!(chapter.html.is_empty());
        assert!(chapter.order >= 1002.0);

        // The freed slot is the first one handed out again.
        let reused = pool.insert_after(&id("title-0"), BlockKind::Chapter, "").unwrap();
        assert_eq!(reused, id("chapter-0"));
    }

    #[test]
    fn test_sections_group_paragraphs() {
        let mut pool = BlockPool::initial(PoolLayout::default());
        pool.hide(&[id("title-0"), id("chapter-0")]);
        pool.insert_after(&id("p-1"), BlockKind::Chapter, "Two").unwrap();
        pool.insert_after(&id("chapter-0"), BlockKind::Paragraph, "x").unwrap();

        let sections = pool.sections();
        assert_eq!(sections.len(), 2);
        assert!(sections[0].head.is_none());
        assert_eq!(sections[0].paragraphs.len(), 2);
        assert_eq!(sections[1].head.map(|b| b.id.clone()), Some(id("chapter-0")));
        assert_eq!(sections[1].paragraphs[0].id, id("p-2"));
    }

    #[test]
    fn test_reconcile_applies_known_ids_only() {
        let mut source = BlockPool::initial(PoolLayout::default());
        source.insert_after(&id("p-0"), BlockKind::Paragraph, "<p>new</p>").unwrap();
        source.set_html(&id("title-0"), "My Story").unwrap();

        let mut persisted = source.snapshot();
        persisted.push(Block::shown(id("p-999"), BlockKind::Paragraph, 0.5, "ghost"));

        let restored = BlockPool::reconcile(PoolLayout::default(), persisted);
        assert!(restored.get(&id("p-999")).is_none());
        assert_eq!(restored.blocks(), source.blocks());
    }

    #[test]
    fn test_reconcile_onto_smaller_layout() {
        let mut source = BlockPool::initial(PoolLayout::default());
        for _ in 0..5 {
            source.insert_after(&id("p-1"), BlockKind::Paragraph, "more").unwrap();
        }

        let restored = BlockPool::reconcile(small(), source.snapshot());
        assert_eq!(restored.blocks().len(), small().total());
        assert_eq!(visible(&restored).len(), 6);
        let orders: Vec<f64> = restored.visible_ordered().iter().map(|b| b.order).collect();
        assert_eq!(orders, vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0]);
    }

    #[test]
    fn test_set_html_reports_change() {
        let mut pool = BlockPool::initial(PoolLayout::default());
        assert!(pool.set_html(&id("p-0"), "edited").unwrap());
        assert!(!pool.set_html(&id("p-0"), "edited").unwrap());
        assert!(pool.set_html(&id("missing"), "x").is_err());
    }

    #[test]
    fn test_reconcile_drops_markup_of_hidden_entries() {
        let persisted = vec![
            Block::hidden(id("p-5"), BlockKind::Paragraph, 1010.0),
            Block {
                html: "stale".into(),
                ..Block::hidden(id("p-6"), BlockKind::Paragraph, 1011.0)
            },
        ];
        let restored = BlockPool::reconcile(PoolLayout::default(), persisted);
        let block = restored.get(&id("p-6")).unwrap();
        assert!(!block.visible);
        assert!(block.html.is_empty());
        assert!(restored.blocks().iter().filter(|b| !b.visible).all(|b| b.html.is_empty()));
    }

    #[test]
    fn test_free_slots_track_layout() {
        let mut pool = BlockPool::initial(small());
        assert_eq!(pool.layout(), small());
        assert_eq!(pool.free_slots(BlockKind::Title), 0);
        assert_eq!(pool.free_slots(BlockKind::Chapter), 1);
        assert_eq!(pool.free_slots(BlockKind::Paragraph), 2);

        pool.insert_after(&id("p-1"), BlockKind::Paragraph, "").unwrap();
        pool.hide(&[id("chapter-0")]);
        assert_eq!(pool.free_slots(BlockKind::Paragraph), 1);
        assert_eq!(pool.free_slots(BlockKind::Chapter), 2);
    }
}
