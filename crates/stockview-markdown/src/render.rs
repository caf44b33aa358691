//! Markdown to [`RenderedDocument`] conversion
//!
//! Parsing is delegated to pulldown-cmark with the GFM table, strikethrough and
//! task-list extensions enabled. The event stream is folded into a tree by
//! `DocumentBuilder`, which tolerates any event order: unclosed spans and
//! containers are closed at the end of input instead of failing.

use crate::document::{
    Alignment, Block, HeadingLevel, Inline, List, ListItem, RenderedDocument, Table, TableCell,
    inline_text,
};
use pulldown_cmark::{CodeBlockKind, Event, Options, Parser, Tag, TagEnd};
use std::mem;

/// Link schemes that survive rendering; anything else keeps only the link text
const SAFE_SCHEMES: &[&str] = &["http", "https", "mailto"];

/// Render markdown into a structured document
///
/// Total over all inputs. Raw HTML is dropped, never passed through.
pub fn render(markdown: &str) -> RenderedDocument {
    let mut builder = DocumentBuilder::default();
    for event in Parser::new_ext(markdown, parser_options()) {
        builder.event(event);
    }
    builder.finish()
}

fn parser_options() -> Options {
    Options::ENABLE_TABLES | Options::ENABLE_STRIKETHROUGH | Options::ENABLE_TASKLISTS
}

enum Container {
    Quote(Vec<Block>),
    List(List),
    Item(ListItem),
}

enum Leaf {
    Paragraph,
    Heading(HeadingLevel),
    Code {
        language: Option<String>,
        code: String,
    },
    Cell,
}

enum SpanKind {
    Emphasis,
    Strong,
    Strikethrough,
    Link(Option<String>),
    Image(Option<String>),
}

struct Span {
    kind: SpanKind,
    content: Vec<Inline>,
}

impl Span {
    fn into_inline(self) -> Inline {
        match self.kind {
            SpanKind::Emphasis => Inline::Emphasis(self.content),
            SpanKind::Strong => Inline::Strong(self.content),
            SpanKind::Strikethrough => Inline::Strikethrough(self.content),
            SpanKind::Link(url) => Inline::Link {
                url,
                content: self.content,
            },
            SpanKind::Image(url) => Inline::Image {
                url,
                alt: inline_text(&self.content),
            },
        }
    }
}

#[derive(Default)]
struct TableBuilder {
    alignments: Vec<Alignment>,
    header: Vec<TableCell>,
    rows: Vec<Vec<TableCell>>,
    row: Vec<TableCell>,
}

impl TableBuilder {
    fn build(mut self) -> Table {
        // A row left open by truncated input still counts as a body row.
        if !self.row.is_empty() {
            let row = mem::take(&mut self.row);
            if self.header.is_empty() {
                self.header = row;
            } else {
                self.rows.push(row);
            }
        }

        let width = self.header.len();
        for row in &mut self.rows {
            row.resize_with(width, TableCell::default);
        }
        self.alignments.resize(width, Alignment::None);

        Table {
            alignments: self.alignments,
            header: self.header,
            rows: self.rows,
        }
    }
}

/// Folds pulldown-cmark events into blocks
#[derive(Default)]
struct DocumentBuilder {
    root: Vec<Block>,
    containers: Vec<Container>,
    leaf: Option<Leaf>,
    inlines: Vec<Inline>,
    spans: Vec<Span>,
    table: Option<TableBuilder>,
}

impl DocumentBuilder {
    fn event(&mut self, event: Event<'_>) {
        match event {
            Event::Start(tag) => self.start_tag(tag),
            Event::End(tag) => self.end_tag(tag),
            Event::Text(text) => self.text(&text),
            Event::Code(code) => self.push_inline(Inline::Code(code.to_string())),
            Event::SoftBreak => self.push_inline(Inline::SoftBreak),
            Event::HardBreak => self.push_inline(Inline::LineBreak),
            Event::Rule => {
                self.finish_leaf();
                self.push_block(Block::Rule);
            }
            Event::TaskListMarker(checked) => self.task_marker(checked),
            Event::FootnoteReference(label) => {
                self.push_inline(Inline::Text(format!("[^{label}]")));
            }
            // Html, InlineHtml and anything else: dropped
            _ => {}
        }
    }

    fn start_tag(&mut self, tag: Tag<'_>) {
        match tag {
            Tag::Paragraph => self.open_leaf(Leaf::Paragraph),
            Tag::Heading { level, .. } => {
                self.open_leaf(Leaf::Heading(HeadingLevel::new(level as u8)));
            }
            Tag::CodeBlock(kind) => {
                let language = match kind {
                    CodeBlockKind::Fenced(info) => {
                        info.split_whitespace().next().map(str::to_string)
                    }
                    CodeBlockKind::Indented => None,
                };
                self.open_leaf(Leaf::Code {
                    language,
                    code: String::new(),
                });
            }
            Tag::HtmlBlock => self.finish_leaf(),
            Tag::BlockQuote(_) => self.open_container(Container::Quote(Vec::new())),
            Tag::List(start) => self.open_container(Container::List(List {
                start,
                items: Vec::new(),
            })),
            Tag::Item => self.open_container(Container::Item(ListItem::default())),
            Tag::Table(alignments) => {
                self.finish_leaf();
                self.table = Some(TableBuilder {
                    alignments: alignments.iter().map(convert_alignment).collect(),
                    ..TableBuilder::default()
                });
            }
            Tag::TableHead | Tag::TableRow => {
                self.finish_leaf();
                if let Some(table) = self.table.as_mut() {
                    table.row.clear();
                }
            }
            Tag::TableCell => self.open_leaf(Leaf::Cell),
            Tag::Emphasis => self.open_span(SpanKind::Emphasis),
            Tag::Strong => self.open_span(SpanKind::Strong),
            Tag::Strikethrough => self.open_span(SpanKind::Strikethrough),
            Tag::Link { dest_url, .. } => self.open_span(SpanKind::Link(sanitize_url(&dest_url))),
            Tag::Image { dest_url, .. } => {
                self.open_span(SpanKind::Image(sanitize_url(&dest_url)));
            }
            _ => {}
        }
    }

    fn end_tag(&mut self, tag: TagEnd) {
        match tag {
            TagEnd::Paragraph
            | TagEnd::Heading(_)
            | TagEnd::CodeBlock
            | TagEnd::TableCell
            | TagEnd::HtmlBlock => self.finish_leaf(),
            TagEnd::TableHead => {
                self.finish_leaf();
                if let Some(table) = self.table.as_mut() {
                    table.header = mem::take(&mut table.row);
                }
            }
            TagEnd::TableRow => {
                self.finish_leaf();
                if let Some(table) = self.table.as_mut() {
                    let row = mem::take(&mut table.row);
                    table.rows.push(row);
                }
            }
            TagEnd::Table => {
                self.finish_leaf();
                self.finish_table();
            }
            TagEnd::BlockQuote(_) | TagEnd::List(_) | TagEnd::Item => {
                self.finish_leaf();
                self.close_container();
            }
            TagEnd::Emphasis
            | TagEnd::Strong
            | TagEnd::Strikethrough
            | TagEnd::Link
            | TagEnd::Image => self.close_span(),
            _ => {}
        }
    }

    fn text(&mut self, text: &str) {
        if let Some(Leaf::Code { code, .. }) = self.leaf.as_mut() {
            code.push_str(text);
            return;
        }
        self.push_inline(Inline::Text(text.to_string()));
    }

    fn task_marker(&mut self, checked: bool) {
        let item = self.containers.iter_mut().rev().find_map(|c| match c {
            Container::Item(item) => Some(item),
            _ => None,
        });
        if let Some(item) = item {
            item.checked = Some(checked);
        }
    }

    fn open_leaf(&mut self, leaf: Leaf) {
        self.finish_leaf();
        self.leaf = Some(leaf);
    }

    fn open_container(&mut self, container: Container) {
        self.finish_leaf();
        self.containers.push(container);
    }

    fn open_span(&mut self, kind: SpanKind) {
        if self.leaf.is_none() {
            self.leaf = Some(Leaf::Paragraph);
        }
        self.spans.push(Span {
            kind,
            content: Vec::new(),
        });
    }

    fn close_span(&mut self) {
        if let Some(span) = self.spans.pop() {
            let inline = span.into_inline();
            push_merged(self.inline_target(), inline);
        }
    }

    fn inline_target(&mut self) -> &mut Vec<Inline> {
        match self.spans.last_mut() {
            Some(span) => &mut span.content,
            None => &mut self.inlines,
        }
    }

    fn push_inline(&mut self, inline: Inline) {
        // Tight list items carry text without a paragraph tag.
        if self.leaf.is_none() {
            self.leaf = Some(Leaf::Paragraph);
        }
        push_merged(self.inline_target(), inline);
    }

    fn take_inlines(&mut self) -> Vec<Inline> {
        while !self.spans.is_empty() {
            self.close_span();
        }
        mem::take(&mut self.inlines)
    }

    fn finish_leaf(&mut self) {
        let Some(leaf) = self.leaf.take() else {
            return;
        };
        let content = self.take_inlines();

        match leaf {
            Leaf::Paragraph => {
                if !content.is_empty() {
                    self.push_block(Block::Paragraph(content));
                }
            }
            Leaf::Heading(level) => self.push_block(Block::Heading { level, content }),
            Leaf::Code { language, code } => self.push_block(Block::CodeBlock { language, code }),
            Leaf::Cell => match self.table.as_mut() {
                Some(table) => table.row.push(TableCell { content }),
                None if !content.is_empty() => self.push_block(Block::Paragraph(content)),
                None => {}
            },
        }
    }

    fn finish_table(&mut self) {
        if let Some(table) = self.table.take() {
            self.push_block(Block::Table(table.build()));
        }
    }

    fn close_container(&mut self) {
        let Some(container) = self.containers.pop() else {
            return;
        };

        match container {
            Container::Quote(blocks) => self.push_block(Block::Quote(blocks)),
            Container::List(list) => self.push_block(Block::List(list)),
            Container::Item(item) => match self.containers.last_mut() {
                Some(Container::List(list)) => list.items.push(item),
                _ => self.push_block(Block::List(List {
                    start: None,
                    items: vec![item],
                })),
            },
        }
    }

    fn blocks_mut(&mut self) -> &mut Vec<Block> {
        match self.containers.last_mut() {
            Some(Container::Quote(blocks)) => blocks,
            Some(Container::Item(item)) => &mut item.blocks,
            Some(Container::List(list)) => {
                if list.items.is_empty() {
                    list.items.push(ListItem::default());
                }
                let last = list.items.len() - 1;
                &mut list.items[last].blocks
            }
            None => &mut self.root,
        }
    }

    fn push_block(&mut self, block: Block) {
        self.blocks_mut().push(block);
    }

    fn finish(mut self) -> RenderedDocument {
        self.finish_leaf();
        self.finish_table();
        while !self.containers.is_empty() {
            self.close_container();
        }
        RenderedDocument { blocks: self.root }
    }
}

/// Append an inline, merging adjacent text runs
fn push_merged(target: &mut Vec<Inline>, inline: Inline) {
    if let Inline::Text(text) = &inline {
        if let Some(Inline::Text(last)) = target.last_mut() {
            last.push_str(text);
            return;
        }
    }
    target.push(inline);
}

fn convert_alignment(alignment: &pulldown_cmark::Alignment) -> Alignment {
    match alignment {
        pulldown_cmark::Alignment::None => Alignment::None,
        pulldown_cmark::Alignment::Left => Alignment::Left,
        pulldown_cmark::Alignment::Center => Alignment::Center,
        pulldown_cmark::Alignment::Right => Alignment::Right,
    }
}

/// Keep a link destination only if it is relative or uses a safe scheme
fn sanitize_url(url: &str) -> Option<String> {
    let url = url.trim();
    if url.is_empty() {
        return None;
    }

    match url.split_once(':') {
        Some((scheme, _)) if looks_like_scheme(scheme) => SAFE_SCHEMES
            .iter()
            .any(|safe| scheme.eq_ignore_ascii_case(safe))
            .then(|| url.to_string()),
        _ => Some(url.to_string()),
    }
}

fn looks_like_scheme(candidate: &str) -> bool {
    let mut chars = candidate.chars();
    chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}
