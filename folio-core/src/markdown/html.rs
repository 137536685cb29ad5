use super::inline::{Inline, parse_inline};
use super::{RenderBlock, render};

/// Render restricted markdown to an HTML fragment.
///
/// All text and attribute values are escaped. Links open in a new browsing
/// context and do not send a referrer.
pub fn render_html(text: &str) -> String {
    let mut out = String::new();
    for block in render(text) {
        match block {
            RenderBlock::Paragraph { text } => {
                out.push_str("<p>");
                push_inlines(&mut out, &parse_inline(&text));
                out.push_str("</p>");
            }
            RenderBlock::List { items } => {
                out.push_str("<ul>");
                for item in items {
                    out.push_str("<li>");
                    push_inlines(&mut out, &parse_inline(&item));
                    out.push_str("</li>");
                }
                out.push_str("</ul>");
            }
        }
    }
    out
}

fn push_inlines(out: &mut String, inlines: &[Inline]) {
    for inline in inlines {
        match inline {
            Inline::Text(text) => push_escaped(out, text),
            Inline::Bold(children) => {
                out.push_str("<strong>");
                push_inlines(out, children);
                out.push_str("</strong>");
            }
            Inline::Link { href, children } => {
                out.push_str("<a href=\"");
                push_escaped(out, href);
                out.push_str("\" target=\"_blank\" rel=\"noopener noreferrer\">");
                push_inlines(out, children);
                out.push_str("</a>");
            }
        }
    }
}

/// Escape text for use in HTML content or a quoted attribute.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    push_escaped(&mut out, text);
    out
}

fn push_escaped(out: &mut String, text: &str) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
}
