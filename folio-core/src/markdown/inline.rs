use regex::Regex;
use std::sync::LazyLock;

static LINK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\[([^\]]+)\]\((https?://[^\s)]+)\)").expect("link pattern is valid")
});
static BOLD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*\*(.+?)\*\*").expect("bold pattern is valid"));

/// Inline content of a paragraph or list item.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Inline {
    Text(String),
    Bold(Vec<Inline>),
    Link { href: String, children: Vec<Inline> },
}

impl Inline {
    pub fn text(text: impl Into<String>) -> Self {
        Inline::Text(text.into())
    }
}

/// Parse links first, then bold. Both recurse into the text before the
/// match, the inner text and the text after it.
pub fn parse_inline(text: &str) -> Vec<Inline> {
    let mut out = Vec::new();
    parse_into(text, &mut out);
    out
}

fn parse_into(text: &str, out: &mut Vec<Inline>) {
    if text.is_empty() {
        return;
    }

    if let Some(caps) = LINK.captures(text) {
        let whole = caps.get(0).map_or(0..0, |m| m.range());
        parse_into(&text[..whole.start], out);
        out.push(Inline::Link {
            href: caps[2].to_string(),
            children: parse_inline(&caps[1]),
        });
        parse_into(&text[whole.end..], out);
        return;
    }

    if let Some(caps) = BOLD.captures(text) {
        let whole = caps.get(0).map_or(0..0, |m| m.range());
        parse_into(&text[..whole.start], out);
        out.push(Inline::Bold(parse_inline(&caps[1])));
        parse_into(&text[whole.end..], out);
        return;
    }

    out.push(Inline::Text(text.to_string()));
}

pub(crate) fn flatten(inlines: &[Inline]) -> String {
    let mut out = String::new();
    for inline in inlines {
        match inline {
            Inline::Text(text) => out.push_str(text),
            Inline::Bold(children) => out.push_str(&flatten(children)),
            Inline::Link { href, children } => {
                out.push_str(&flatten(children));
                out.push_str(" (");
                out.push_str(href);
                out.push(')');
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bold_span() {
        assert_eq!(
            parse_inline("**bold**"),
            vec![Inline::Bold(vec![Inline::text("bold")])]
        );
    }

    #[test]
    fn test_link_span() {
        assert_eq!(
            parse_inline("[Resume](https://x.test/r)"),
            vec![Inline::Link {
                href: "https://x.test/r".into(),
                children: vec![Inline::text("Resume")],
            }]
        );
    }

    #[test]
    fn test_bold_inside_link_and_surrounding_text() {
        assert_eq!(
            parse_inline("See [my **CV**](http://x.test) or **ask**."),
            vec![
                Inline::text("See "),
                Inline::Link {
                    href: "http://x.test".into(),
                    children: vec![Inline::text("my "), Inline::Bold(vec![Inline::text("CV")])],
                },
                Inline::text(" or "),
                Inline::Bold(vec![Inline::text("ask")]),
                Inline::text("."),
            ]
        );
    }

    #[test]
    fn test_unmatched_markers_stay_literal() {
        assert_eq!(parse_inline("["), vec![Inline::text("[")]);
        assert_eq!(parse_inline("**"), vec![Inline::text("**")]);
        assert_eq!(
            parse_inline("[x](ftp://nope) **open"),
            vec![Inline::text("[x](ftp://nope) **open")]
        );
    }

    #[test]
    fn test_flatten_expands_links() {
        let inlines = parse_inline("**Hi**, see [site](https://a.test)");
        assert_eq!(flatten(&inlines), "Hi, see site (https://a.test)");
    }
}
