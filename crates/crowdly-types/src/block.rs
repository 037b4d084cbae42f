//! Block kinds and the block record.
//!
//! ## Design: pool slots, not allocations
//!
//! A `Block` is a slot in a fixed pool. "Creating" a block shows a hidden slot
//! of the right kind; "deleting" hides it again and clears its markup. Only
//! `order`, `visible`, and `html` ever change; `id` and `kind` are fixed when
//! the pool is built.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use strum::EnumString;

use crate::BlockId;

/// What a block *is*.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, Serialize, Deserialize, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(ascii_case_insensitive)]
pub enum BlockKind {
    /// Story title.
    Title,
    /// Chapter heading. Owns the paragraphs that follow it.
    Chapter,
    /// Body text.
    #[strum(serialize = "paragraph", serialize = "p")]
    Paragraph,
}

impl BlockKind {
    /// Every kind, in pool construction order.
    pub const ALL: [BlockKind; 3] = [BlockKind::Title, BlockKind::Chapter, BlockKind::Paragraph];

    /// Parse from string (case-insensitive, `p` accepted for paragraphs).
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        <Self as FromStr>::from_str(s).ok()
    }

    /// Convert to string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            BlockKind::Title => "title",
            BlockKind::Chapter => "chapter",
            BlockKind::Paragraph => "paragraph",
        }
    }

    /// Prefix used when deriving slot ids.
    pub fn slot_prefix(&self) -> &'static str {
        match self {
            BlockKind::Title => "title",
            BlockKind::Chapter => "chapter",
            BlockKind::Paragraph => "p",
        }
    }

    /// Titles and chapters head a section; paragraphs belong to one.
    pub fn is_heading(&self) -> bool {
        !matches!(self, BlockKind::Paragraph)
    }
}

impl std::fmt::Display for BlockKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One content slot.
///
/// This is also the persisted record: `{id, kind, order, visible, html}`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub id: BlockId,
    pub kind: BlockKind,
    /// Sort key among visible blocks. Hidden blocks sit at 1000 and above.
    pub order: f64,
    pub visible: bool,
    /// Rich-text content as serialized markup. Empty for hidden slots.
    pub html: String,
}

impl Block {
    /// A visible slot with initial content.
    pub fn shown(id: BlockId, kind: BlockKind, order: f64, html: impl Into<String>) -> Self {
        Self {
            id,
            kind,
            order,
            visible: true,
            html: html.into(),
        }
    }

    /// A hidden, empty slot.
    pub fn hidden(id: BlockId, kind: BlockKind, order: f64) -> Self {
        Self {
            id,
            kind,
            order,
            visible: false,
            html: String::new(),
        }
    }

    /// Content with markup removed, for terminal display and outlines.
    pub fn plain_text(&self) -> String {
        strip_markup(&self.html)
    }
}

/// Drop tags and decode the handful of entities a rich-text editor emits.
///
/// `<br>` and closing block tags become spaces so words on separate lines
/// don't run together. Whitespace is collapsed.
pub fn strip_markup(html: &str) -> String {
    let mut text = String::with_capacity(html.len());
    let mut in_tag = false;

    for c in html.chars() {
        match c {
            '<' => {
                in_tag = true;
                text.push(' ');
            }
            '>' if in_tag => in_tag = false,
            _ if in_tag => {}
            _ => text.push(c),
        }
    }

    let decoded = text
        .replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&");

    decoded.split_whitespace().collect::<Vec<_>>().join(" ")
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_parse_aliases() {
        assert_eq!(BlockKind::from_str("Title"), Some(BlockKind::Title));
        assert_eq!(BlockKind::from_str("CHAPTER"), Some(BlockKind::Chapter));
        assert_eq!(BlockKind::from_str("p"), Some(BlockKind::Paragraph));
        assert_eq!(BlockKind::from_str("paragraph"), Some(BlockKind::Paragraph));
        assert_eq!(BlockKind::from_str("image"), None);
    }

    #[test]
    fn test_kind_serde_lowercase() {
        let json = serde_json::to_string(&BlockKind::Paragraph).unwrap();
        assert_eq!(json, "\"paragraph\"");
        let kind: BlockKind = serde_json::from_str("\"chapter\"").unwrap();
        assert_eq!(kind, BlockKind::Chapter);
    }

    #[test]
    fn test_block_record_shape() {
        let block = Block::shown(BlockId::from("p-0"), BlockKind::Paragraph, 2.0, "<p>Hi</p>");
        let value = serde_json::to_value(&block).unwrap();
        assert_eq!(value["id"], "p-0");
        assert_eq!(value["kind"], "paragraph");
        assert_eq!(value["order"], 2.0);
        assert_eq!(value["visible"], true);
        assert_eq!(value["html"], "<p>Hi</p>");
    }

    #[test]
    fn test_block_accepts_integer_order() {
        let json = r#"{"id":"title-0","kind":"title","order":0,"visible":true,"html":"T"}"#;
        let block: Block = serde_json::from_str(json).unwrap();
        assert_eq!(block.order, 0.0);
    }

    #[test]
    fn test_strip_markup() {
        assert_eq!(strip_markup("<p>Once <b>upon</b> a&nbsp;time</p>"), "Once upon a time");
        assert_eq!(strip_markup("line one<br>line two"), "line one line two");
        assert_eq!(strip_markup("Tom &amp; Jerry &lt;3"), "Tom & Jerry <3");
        assert_eq!(strip_markup(""), "");
    }
}
