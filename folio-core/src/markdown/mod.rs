//! Restricted markdown: paragraphs, `-`/`*` bullet lists, `**bold**` and
//! `[text](http(s)://url)` links. Anything else is literal text.
//!
//! Rendering is pure and total; the block tree is derived at display time
//! and never stored.

mod html;
mod inline;

use regex::Regex;
use std::sync::LazyLock;

pub use html::{escape_html, render_html};
pub use inline::{Inline, parse_inline};

static LIST_ITEM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*[*-]\s+(.*)").expect("list item pattern is valid"));

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RenderBlock {
    Paragraph { text: String },
    List { items: Vec<String> },
}

impl RenderBlock {
    pub fn paragraph(text: impl Into<String>) -> Self {
        RenderBlock::Paragraph { text: text.into() }
    }

    pub fn list<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        RenderBlock::List {
            items: items.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Default)]
struct BlockBuilder {
    blocks: Vec<RenderBlock>,
    paragraph: Vec<String>,
    items: Vec<String>,
}

impl BlockBuilder {
    fn flush_paragraph(&mut self) {
        if self.paragraph.is_empty() {
            return;
        }
        let text = self.paragraph.join("\n").trim().to_string();
        self.paragraph.clear();
        if !text.is_empty() {
            self.blocks.push(RenderBlock::Paragraph { text });
        }
    }

    fn flush_list(&mut self) {
        if !self.items.is_empty() {
            let items = std::mem::take(&mut self.items);
            self.blocks.push(RenderBlock::List { items });
        }
    }

    fn line(&mut self, line: &str) {
        if let Some(caps) = LIST_ITEM.captures(line) {
            self.flush_paragraph();
            self.items.push(caps[1].trim().to_string());
        } else if line.trim().is_empty() {
            self.flush_paragraph();
            self.flush_list();
        } else {
            self.flush_list();
            self.paragraph.push(line.to_string());
        }
    }

    fn finish(mut self) -> Vec<RenderBlock> {
        self.flush_paragraph();
        self.flush_list();
        self.blocks
    }
}

/// Split text into paragraphs and bullet lists, preserving document order.
pub fn render(text: &str) -> Vec<RenderBlock> {
    let mut builder = BlockBuilder::default();
    for line in text.split('\n') {
        builder.line(line);
    }
    builder.finish()
}

/// Flatten markdown into plain text: links become "text (url)", list items
/// are prefixed with "- " and blocks are separated by a blank line.
pub fn plain_text(text: &str) -> String {
    render(text)
        .iter()
        .map(|block| match block {
            RenderBlock::Paragraph { text } => inline::flatten(&parse_inline(text)),
            RenderBlock::List { items } => items
                .iter()
                .map(|item| format!("- {}", inline::flatten(&parse_inline(item))))
                .collect::<Vec<_>>()
                .join("\n"),
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_input_renders_nothing() {
        assert!(render("").is_empty());
        assert!(render("\n  \n").is_empty());
    }

    #[test]
    fn test_plain_line_is_one_paragraph() {
        assert_eq!(render("plain"), vec![RenderBlock::paragraph("plain")]);
    }

    #[test]
    fn test_list_then_paragraph() {
        assert_eq!(
            render("- a\n- b\n\nc"),
            vec![RenderBlock::list(["a", "b"]), RenderBlock::paragraph("c")]
        );
    }

    #[test]
    fn test_paragraph_lines_are_joined() {
        assert_eq!(
            render("first line\nsecond line\n\nnext"),
            vec![
                RenderBlock::paragraph("first line\nsecond line"),
                RenderBlock::paragraph("next"),
            ]
        );
    }

    #[test]
    fn test_list_and_paragraph_flush_each_other() {
        assert_eq!(
            render("Intro\n* one\n  -   two  \nOutro"),
            vec![
                RenderBlock::paragraph("Intro"),
                RenderBlock::list(["one", "two"]),
                RenderBlock::paragraph("Outro"),
            ]
        );
    }

    #[test]
    fn test_bold_at_line_start_is_not_a_list() {
        assert_eq!(
            render("**Skills** below"),
            vec![RenderBlock::paragraph("**Skills** below")]
        );
    }

    #[test]
    fn test_plain_text_expands_links() {
        let text = "I built **Folio**.\n\n- [Resume](https://x.test/r)\n- Rust";
        assert_eq!(
            plain_text(text),
            "I built Folio.\n\n- Resume (https://x.test/r)\n- Rust"
        );
    }
}
