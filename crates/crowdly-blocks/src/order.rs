//! Order normalization.
//!
//! Visible blocks carry dense integer orders `0..N-1`. New blocks are slotted
//! in with a fractional order between their anchor and the next integer, then
//! the whole pool is normalized back to integers. Hidden blocks are parked at
//! `1000 + N` and up so they always sort after every visible block.
//!
//! Hidden blocks are numbered in pool position order. That makes
//! normalization deterministic for hidden slots too, not just visible ones.

use crate::Block;

/// First order value handed to hidden blocks (before adding the visible count).
pub const HIDDEN_ORDER_BASE: f64 = 1000.0;

/// Renormalize orders in place.
///
/// Visible blocks are sorted by their current order (stable, so equal orders
/// keep pool position) and renumbered from 0. Hidden blocks are renumbered
/// from `1000 + visible_count` in pool position order. Idempotent.
pub fn normalize_orders(blocks: &mut [Block]) {
    let mut visible: Vec<usize> = (0..blocks.len()).filter(|&i| blocks[i].visible).collect();
    visible.sort_by(|&a, &b| blocks[a].order.total_cmp(&blocks[b].order));

    for (rank, &idx) in visible.iter().enumerate() {
        blocks[idx].order = rank as f64;
    }

    let base = HIDDEN_ORDER_BASE + visible.len() as f64;
    for (offset, block) in blocks.iter_mut().filter(|b| !b.visible).enumerate() {
        block.order = base + offset as f64;
    }
}

/// Pure form of [`normalize_orders`]: returns a normalized copy.
pub fn normalized(blocks: &[Block]) -> Vec<Block> {
    let mut out = blocks.to_vec();
    normalize_orders(&mut out);
    out
}

/// Order for the `nth` of `count` blocks inserted directly after `anchor`.
///
/// Normalized neighbours are one apart, so spreading the new blocks over the
/// open interval `(anchor, anchor + 1)` keeps them ahead of the next block
/// and in the requested sequence.
pub fn insertion_order(anchor: f64, nth: usize, count: usize) -> f64 {
    anchor + (nth + 1) as f64 / (count + 1) as f64
}

// ============================================================================
// Tests
// ============================================================================
