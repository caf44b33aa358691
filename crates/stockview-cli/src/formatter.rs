//! Response formatting for the terminal
//!
//! [`TerminalFormatter`] lays a [`RenderedDocument`] out as plain text, with
//! tables drawn by comfy-table. [`JsonFormatter`] emits machine-readable
//! output for `--json`.

use chrono::Local;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{CellAlignment, Table as TextTable};
use serde_json::json;
use stockview_client::{AnalysisRequest, ChatTurn, RequestState};
use stockview_markdown::{Alignment, Block, HeadingTier, Inline, List, RenderedDocument, Table};

/// Shown before the first submit
pub const IDLE_PLACEHOLDER: &str = "Enter a stock symbol to see results.";

const RULE_WIDTH: usize = 40;

pub trait Formatter: Send + Sync {
    /// Full view of the controller state
    fn format_state(&self, state: &RequestState) -> String;
    fn format_document(&self, doc: &RenderedDocument) -> String;
    fn format_answer(&self, turn: &ChatTurn) -> String;
    fn format_error(&self, error: &str) -> String;
}

/// Create the formatter for the requested output
pub fn formatter_for(json: bool) -> Box<dyn Formatter> {
    if json {
        Box::new(JsonFormatter)
    } else {
        Box::new(TerminalFormatter)
    }
}

/// One-line progress text for an in-flight request
pub fn loading_line(request: &AnalysisRequest) -> String {
    format!("Fetching analysis for {}...", request.symbol)
}

pub struct TerminalFormatter;

impl Formatter for TerminalFormatter {
    fn format_state(&self, state: &RequestState) -> String {
        match state {
            RequestState::Idle => IDLE_PLACEHOLDER.to_string(),
            RequestState::Loading { request } => loading_line(request),
            RequestState::Success {
                request,
                markdown,
                received_at,
            } => {
                let doc = stockview_markdown::render(markdown);
                format!(
                    "{}\n\n{} · {} · Last updated: {}",
                    self.format_document(&doc),
                    request.symbol,
                    request.mode,
                    received_at.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S")
                )
            }
            RequestState::Failed { error, .. } => self.format_error(&error.to_string()),
        }
    }

    fn format_document(&self, doc: &RenderedDocument) -> String {
        render_blocks(&doc.blocks, "\n\n")
    }

    fn format_answer(&self, turn: &ChatTurn) -> String {
        self.format_document(&stockview_markdown::render(&turn.answer))
    }

    fn format_error(&self, error: &str) -> String {
        format!("❌ Error: {error}")
    }
}

pub struct JsonFormatter;

impl JsonFormatter {
    fn to_json(value: &serde_json::Value) -> String {
        serde_json::to_string_pretty(value).unwrap_or_else(|e| Self::error_json(&e.to_string()))
    }

    fn error_json(message: &str) -> String {
        json!({"error": message}).to_string()
    }
}

impl Formatter for JsonFormatter {
    fn format_state(&self, state: &RequestState) -> String {
        let request = state.request().map(|r| {
            json!({
                "seq": r.seq,
                "stock_symbol": r.symbol,
                "analysis_type": r.mode,
            })
        });
        let value = match state {
            RequestState::Idle => json!({"status": "idle"}),
            RequestState::Loading { .. } => json!({"status": "loading", "request": request}),
            RequestState::Success {
                markdown,
                received_at,
                ..
            } => json!({
                "status": "success",
                "request": request,
                "received_at": received_at,
                "markdown": markdown,
                "document": stockview_markdown::render(markdown),
            }),
            RequestState::Failed { error, .. } => json!({
                "status": "error",
                "request": request,
                "message": error.to_string(),
            }),
        };
        Self::to_json(&value)
    }

    fn format_document(&self, doc: &RenderedDocument) -> String {
        Self::to_json(&json!(doc))
    }

    fn format_answer(&self, turn: &ChatTurn) -> String {
        Self::to_json(&json!({
            "question": turn.question,
            "answer": turn.answer,
            "asked_at": turn.asked_at,
        }))
    }

    fn format_error(&self, error: &str) -> String {
        Self::to_json(&json!({"status": "error", "message": error}))
    }
}

fn render_blocks(blocks: &[Block], separator: &str) -> String {
    blocks
        .iter()
        .map(render_block)
        .collect::<Vec<_>>()
        .join(separator)
}

fn render_block(block: &Block) -> String {
    match block {
        Block::Heading { level, content } => {
            let text = render_inlines(content);
            let width = text.chars().count();
            match level.tier() {
                HeadingTier::Title => format!("{text}\n{}", "=".repeat(width)),
                HeadingTier::Section => format!("{text}\n{}", "-".repeat(width)),
                HeadingTier::Subsection => format!("▸ {text}"),
                HeadingTier::Minor => text,
            }
        }
        Block::Paragraph(content) => render_inlines(content),
        Block::List(list) => render_list(list),
        Block::Table(table) => render_table(table),
        Block::CodeBlock { code, .. } => code
            .trim_end_matches('\n')
            .lines()
            .map(|line| format!("    {line}"))
            .collect::<Vec<_>>()
            .join("\n"),
        Block::Quote(blocks) => prefix_lines(&render_blocks(blocks, "\n\n"), "│ "),
        Block::Rule => "─".repeat(RULE_WIDTH),
    }
}

fn render_list(list: &List) -> String {
    let mut lines = Vec::new();
    for (offset, item) in (0_u64..).zip(&list.items) {
        let marker = match list.start {
            Some(start) => format!("{}. ", start.saturating_add(offset)),
            None => "• ".to_string(),
        };
        let task = match item.checked {
            Some(true) => "[x] ",
            Some(false) => "[ ] ",
            None => "",
        };
        let indent = " ".repeat(marker.chars().count());

        let body = render_blocks(&item.blocks, "\n");
        let mut body_lines = body.lines();
        let first = body_lines.next().unwrap_or_default();
        lines.push(format!("{marker}{task}{first}"));
        for line in body_lines {
            if line.is_empty() {
                lines.push(String::new());
            } else {
                lines.push(format!("{indent}{line}"));
            }
        }
    }
    lines.join("\n")
}

fn render_table(table: &Table) -> String {
    let mut out = TextTable::new();
    out.load_preset(UTF8_FULL);
    out.set_header(table.header_texts());
    for row in table.row_texts() {
        out.add_row(row);
    }
    for (index, alignment) in table.alignments.iter().enumerate() {
        if let Some(column) = out.column_mut(index) {
            column.set_cell_alignment(cell_alignment(*alignment));
        }
    }
    out.to_string()
}

fn cell_alignment(alignment: Alignment) -> CellAlignment {
    match alignment {
        Alignment::None | Alignment::Left => CellAlignment::Left,
        Alignment::Center => CellAlignment::Center,
        Alignment::Right => CellAlignment::Right,
    }
}

fn render_inlines(inlines: &[Inline]) -> String {
    let mut out = String::new();
    for inline in inlines {
        write_inline(inline, &mut out);
    }
    out
}

fn write_inline(inline: &Inline, out: &mut String) {
    match inline {
        Inline::Text(text) => out.push_str(text),
        Inline::Code(code) => {
            out.push('`');
            out.push_str(code);
            out.push('`');
        }
        Inline::Emphasis(children) | Inline::Strong(children) => {
            for child in children {
                write_inline(child, out);
            }
        }
        Inline::Strikethrough(children) => {
            out.push('~');
            for child in children {
                write_inline(child, out);
            }
            out.push('~');
        }
        Inline::Link { url, content } => {
            let text = render_inlines(content);
            out.push_str(&text);
            if let Some(url) = url.as_deref().filter(|url| *url != text) {
                out.push_str(&format!(" <{url}>"));
            }
        }
        Inline::Image { alt, .. } => {
            if alt.is_empty() {
                out.push_str("[image]");
            } else {
                out.push_str(&format!("[image: {alt}]"));
            }
        }
        Inline::SoftBreak => out.push(' '),
        Inline::LineBreak => out.push('\n'),
    }
}

fn prefix_lines(text: &str, prefix: &str) -> String {
    text.lines()
        .map(|line| format!("{prefix}{line}").trim_end().to_string())
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use stockview_client::{AnalysisError, AnalysisMode};
    use stockview_markdown::render;

    fn request() -> AnalysisRequest {
        AnalysisRequest {
            seq: 1,
            symbol: "AAPL".to_string(),
            mode: AnalysisMode::CompleteAnalysis,
        }
    }

    #[test]
    fn test_heading_tiers() {
        let out = TerminalFormatter.format_document(&render("# Apple\n\n## Price\n\n### Outlook"));
        assert_eq!(out, "Apple\n=====\n\nPrice\n-----\n\n▸ Outlook");
    }

    #[test]
    fn test_lists() {
        let out = TerminalFormatter.format_document(&render("- one\n- two\n  - nested"));
        assert_eq!(out, "• one\n• two\n  • nested");

        let out = TerminalFormatter.format_document(&render("3. three\n4. four"));
        assert_eq!(out, "3. three\n4. four");

        let out = TerminalFormatter.format_document(&render("- [x] done\n- [ ] todo"));
        assert_eq!(out, "• [x] done\n• [ ] todo");
    }

    #[test]
    fn test_table_uses_cells() {
        let out = TerminalFormatter.format_document(&render("| a | b |\n|---|--:|\n| 1 | 2 |"));
        for cell in ["a", "b", "1", "2"] {
            assert!(out.contains(cell), "missing {cell} in\n{out}");
        }
        assert!(out.contains('│'));
    }

    #[test]
    fn test_inline_styles() {
        let doc = render("Price is **up** with `RSI` at ~~40~~ 55, see [news](https://example.com).");
        assert_eq!(
            TerminalFormatter.format_document(&doc),
            "Price is up with `RSI` at ~40~ 55, see news <https://example.com>."
        );
    }

    #[test]
    fn test_code_quote_and_rule() {
        let out = TerminalFormatter.format_document(&render("```\nlet x = 1;\n```\n\n> careful\n\n---"));
        assert_eq!(out, format!("    let x = 1;\n\n│ careful\n\n{}", "─".repeat(RULE_WIDTH)));
    }

    #[test]
    fn test_state_views() {
        let formatter = TerminalFormatter;
        assert_eq!(formatter.format_state(&RequestState::Idle), IDLE_PLACEHOLDER);
        assert_eq!(
            formatter.format_state(&RequestState::Loading { request: request() }),
            "Fetching analysis for AAPL..."
        );
        assert_eq!(
            formatter.format_state(&RequestState::Failed {
                request: None,
                error: AnalysisError::EmptySymbol
            }),
            "❌ Error: Please enter a stock symbol."
        );

        let out = formatter.format_state(&RequestState::Success {
            request: request(),
            markdown: "# Hi".to_string(),
            received_at: Utc::now(),
        });
        assert!(out.starts_with("Hi\n=="));
        assert!(out.contains("Last updated: "));
    }

    #[test]
    fn test_json_state() {
        let out = JsonFormatter.format_state(&RequestState::Success {
            request: request(),
            markdown: "# Hi".to_string(),
            received_at: Utc::now(),
        });
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value["status"], "success");
        assert_eq!(value["request"]["stock_symbol"], "AAPL");
        assert_eq!(value["request"]["analysis_type"], "Complete Analysis");
        assert_eq!(value["markdown"], "# Hi");
        assert!(value["document"]["blocks"].is_array());

        let out = JsonFormatter.format_state(&RequestState::Failed {
            request: Some(request()),
            error: AnalysisError::Transport("connection refused".to_string()),
        });
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value["status"], "error");
        assert_eq!(value["message"], "connection refused");
    }

    #[test]
    fn test_error_json_escapes_message() {
        let message = "expected `\"` at line 1\n\tcolumn 2 \\";
        let out = JsonFormatter::error_json(message);
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value["error"], message);
    }
}
