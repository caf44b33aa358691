//! Markdown rendering adapter for stockview
//!
//! Converts the markdown returned by the analysis service into a
//! [`RenderedDocument`]: an ordered tree of headings, paragraphs, lists, GFM
//! tables and code blocks made only of text nodes.
//!
//! Rendering is a pure function. It never fails, keeps block order, and drops
//! raw HTML so nothing from the service can reach a display as active content.
//!
//! # Example
//!
//! ```
//! use stockview_markdown::{Block, render};
//!
//! let doc = render("# AAPL\n\n| a | b |\n|---|---|\n| 1 | 2 |");
//! assert_eq!(doc.blocks[0].heading_text().as_deref(), Some("AAPL"));
//! assert!(matches!(doc.blocks[1], Block::Table(_)));
//! ```

pub mod document;
pub mod render;

pub use document::{
    Alignment, Block, HeadingLevel, HeadingTier, Inline, List, ListItem, RenderedDocument, Table,
    TableCell, inline_text,
};
pub use render::render;
