//! Structured document tree produced by the renderer
//!
//! Every node holds plain text only. There is no variant that can carry raw
//! HTML, so anything built from a [`RenderedDocument`] is inert by construction.

use serde::Serialize;

/// An ordered tree of block nodes rendered from one markdown string
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RenderedDocument {
    /// Top-level blocks in source order
    pub blocks: Vec<Block>,
}

impl RenderedDocument {
    /// Whether the document has no blocks at all
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// All tables at any nesting depth, in source order
    pub fn tables(&self) -> Vec<&Table> {
        let mut tables = Vec::new();
        collect_tables(&self.blocks, &mut tables);
        tables
    }

    /// Flattened text content, one block per line
    pub fn plain_text(&self) -> String {
        join_blocks(&self.blocks)
    }
}

fn collect_tables<'a>(blocks: &'a [Block], out: &mut Vec<&'a Table>) {
    for block in blocks {
        match block {
            Block::Table(table) => out.push(table),
            Block::Quote(inner) => collect_tables(inner, out),
            Block::List(list) => {
                for item in &list.items {
                    collect_tables(&item.blocks, out);
                }
            }
            _ => {}
        }
    }
}

fn join_blocks(blocks: &[Block]) -> String {
    blocks
        .iter()
        .map(Block::plain_text)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Block-level node
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Block {
    /// Heading with its level (1-6)
    Heading {
        level: HeadingLevel,
        content: Vec<Inline>,
    },
    /// Paragraph of inline content
    Paragraph(Vec<Inline>),
    /// Ordered or unordered list
    List(List),
    /// GFM pipe table
    Table(Table),
    /// Fenced or indented code, kept verbatim
    CodeBlock {
        language: Option<String>,
        code: String,
    },
    /// Block quote holding nested blocks
    Quote(Vec<Block>),
    /// Thematic break
    Rule,
}

impl Block {
    /// Text of a heading, `None` for every other block
    pub fn heading_text(&self) -> Option<String> {
        match self {
            Block::Heading { content, .. } => Some(inline_text(content)),
            _ => None,
        }
    }

    /// Flattened text content of this block
    pub fn plain_text(&self) -> String {
        match self {
            Block::Heading { content, .. } | Block::Paragraph(content) => inline_text(content),
            Block::List(list) => list
                .items
                .iter()
                .map(|item| join_blocks(&item.blocks))
                .collect::<Vec<_>>()
                .join("\n"),
            Block::Table(table) => std::iter::once(&table.header)
                .chain(table.rows.iter())
                .map(|row| {
                    row.iter()
                        .map(TableCell::text)
                        .collect::<Vec<_>>()
                        .join(" | ")
                })
                .collect::<Vec<_>>()
                .join("\n"),
            Block::CodeBlock { code, .. } => code.trim_end().to_string(),
            Block::Quote(blocks) => join_blocks(blocks),
            Block::Rule => "---".to_string(),
        }
    }
}

/// Heading level clamped to 1..=6
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct HeadingLevel(u8);

impl HeadingLevel {
    /// Create a level, clamping out-of-range values
    pub fn new(level: u8) -> Self {
        Self(level.clamp(1, 6))
    }

    /// Numeric level
    pub fn get(self) -> u8 {
        self.0
    }

    /// Style tier used by presentation layers
    pub fn tier(self) -> HeadingTier {
        match self.0 {
            1 => HeadingTier::Title,
            2 => HeadingTier::Section,
            3 => HeadingTier::Subsection,
            _ => HeadingTier::Minor,
        }
    }
}

/// Fixed style mapping for headings
///
/// Levels 1-3 each get a distinct tier; 4-6 share the lowest one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HeadingTier {
    Title,
    Section,
    Subsection,
    Minor,
}

/// A list and its items
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct List {
    /// First number for ordered lists, `None` for bullet lists
    pub start: Option<u64>,
    pub items: Vec<ListItem>,
}

impl List {
    pub fn is_ordered(&self) -> bool {
        self.start.is_some()
    }
}

/// One list item; may contain nested lists
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ListItem {
    /// Task-list state (`- [x]`), `None` for plain items
    pub checked: Option<bool>,
    pub blocks: Vec<Block>,
}

/// Column alignment from the table delimiter row
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Alignment {
    #[default]
    None,
    Left,
    Center,
    Right,
}

/// GFM table with one header row and any number of body rows
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Table {
    pub alignments: Vec<Alignment>,
    pub header: Vec<TableCell>,
    pub rows: Vec<Vec<TableCell>>,
}

impl Table {
    /// Number of columns, taken from the header row
    pub fn column_count(&self) -> usize {
        self.header.len()
    }

    /// Header cell texts
    pub fn header_texts(&self) -> Vec<String> {
        self.header.iter().map(TableCell::text).collect()
    }

    /// Body cell texts, row by row
    pub fn row_texts(&self) -> Vec<Vec<String>> {
        self.rows
            .iter()
            .map(|row| row.iter().map(TableCell::text).collect())
            .collect()
    }
}

/// One table cell
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TableCell {
    pub content: Vec<Inline>,
}

impl TableCell {
    /// Trimmed text of the cell
    pub fn text(&self) -> String {
        inline_text(&self.content).trim().to_string()
    }
}

/// Inline node
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Inline {
    Text(String),
    Code(String),
    Emphasis(Vec<Inline>),
    Strong(Vec<Inline>),
    Strikethrough(Vec<Inline>),
    /// Link text with its destination; `url` is `None` when the destination was unsafe
    Link {
        url: Option<String>,
        content: Vec<Inline>,
    },
    /// Images are never fetched, only their alt text is kept
    Image {
        url: Option<String>,
        alt: String,
    },
    SoftBreak,
    LineBreak,
}

impl Inline {
    /// Flattened text of this node
    pub fn plain_text(&self) -> String {
        let mut out = String::new();
        self.write_text(&mut out);
        out
    }

    fn write_text(&self, out: &mut String) {
        match self {
            Inline::Text(text) | Inline::Code(text) => out.push_str(text),
            Inline::Emphasis(children)
            | Inline::Strong(children)
            | Inline::Strikethrough(children)
            | Inline::Link {
                content: children, ..
            } => {
                for child in children {
                    child.write_text(out);
                }
            }
            Inline::Image { alt, .. } => out.push_str(alt),
            Inline::SoftBreak => out.push(' '),
            Inline::LineBreak => out.push('\n'),
        }
    }
}

/// Flattened text of a run of inline nodes
pub fn inline_text(inlines: &[Inline]) -> String {
    let mut out = String::new();
    for inline in inlines {
        inline.write_text(&mut out);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_heading_level_clamps() {
        assert_eq!(HeadingLevel::new(0).get(), 1);
        assert_eq!(HeadingLevel::new(9).get(), 6);
        assert_eq!(HeadingLevel::new(3).get(), 3);
    }

    #[test]
    fn test_heading_tiers() {
        assert_eq!(HeadingLevel::new(1).tier(), HeadingTier::Title);
        assert_eq!(HeadingLevel::new(2).tier(), HeadingTier::Section);
        assert_eq!(HeadingLevel::new(3).tier(), HeadingTier::Subsection);
        for level in 4..=6 {
            assert_eq!(HeadingLevel::new(level).tier(), HeadingTier::Minor);
        }
    }

    #[test]
    fn test_inline_text_flattens_nesting() {
        let inlines = vec![
            Inline::Text("Buy ".to_string()),
            Inline::Strong(vec![Inline::Emphasis(vec![Inline::Text(
                "now".to_string(),
            )])]),
            Inline::SoftBreak,
            Inline::Link {
                url: None,
                content: vec![Inline::Text("source".to_string())],
            },
        ];
        assert_eq!(inline_text(&inlines), "Buy now source");
    }

    #[test]
    fn test_table_cell_text_is_trimmed() {
        let cell = TableCell {
            content: vec![Inline::Text("  $182.50 ".to_string())],
        };
        assert_eq!(cell.text(), "$182.50");
    }

    #[test]
    fn test_document_serializes() {
        let doc = RenderedDocument {
            blocks: vec![Block::Heading {
                level: HeadingLevel::new(2),
                content: vec![Inline::Text("Summary".to_string())],
            }],
        };
        let json = serde_json::to_value(&doc).unwrap();
        assert_eq!(json["blocks"][0]["heading"]["level"], 2);
        assert_eq!(json["blocks"][0]["heading"]["content"][0]["text"], "Summary");
    }
}
