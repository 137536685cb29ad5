//! Transcript export.
//!
//! The PDF form gives each turn a bold label ("You:" or the assistant label)
//! followed by its text wrapped at 90 columns. Assistant markdown is
//! flattened first, so links read as "text (url)". Pages are A4 set in
//! Helvetica 11pt. The HTML form keeps assistant markdown as markup.

use crate::error::ExportError;
use crate::markdown;
use crate::message::{ChatMessage, Sender};
use askama::Template;
use chrono::NaiveDate;
use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, ObjectId, Stream, dictionary};

const PAGE_WIDTH: i64 = 595;
const PAGE_HEIGHT: i64 = 842;
const MARGIN: i64 = 50;
const FONT_SIZE: i64 = 11;
const TITLE_SIZE: i64 = 14;
const LEADING: i64 = 15;
pub const WRAP_COLUMNS: usize = 90;
/// Body lines per page, leaving room for the footer
const LINES_PER_PAGE: usize = ((PAGE_HEIGHT - 2 * MARGIN) / LEADING) as usize - 2;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LineStyle {
    Title,
    Label,
    Body,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Line {
    pub style: LineStyle,
    pub text: String,
}

impl Line {
    fn new(style: LineStyle, text: impl Into<String>) -> Self {
        Self {
            style,
            text: text.into(),
        }
    }

    fn blank() -> Self {
        Self::new(LineStyle::Body, "")
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ExportFormat {
    #[default]
    Pdf,
    Html,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Pdf => "pdf",
            ExportFormat::Html => "html",
        }
    }
}

/// `Ada_Lovelace_AI_Chat_2025-03-09.pdf`
pub fn export_file_name(owner: &str, date: NaiveDate, format: ExportFormat) -> String {
    let owner: String = owner
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == '_' || *c == '-')
        .collect();
    let owner = if owner.is_empty() { "Folio".to_string() } else { owner };
    format!(
        "{}_AI_Chat_{}.{}",
        owner,
        date.format("%Y-%m-%d"),
        format.extension()
    )
}

/// Lay out the turns as labeled, wrapped lines. The greeting must already be
/// excluded by the caller.
pub fn layout(title: &str, turns: &[ChatMessage], assistant_label: &str) -> Vec<Line> {
    let mut lines = vec![Line::new(LineStyle::Title, title), Line::blank()];

    for turn in turns {
        let (label, text) = match turn.sender() {
            Sender::User => ("You:".to_string(), turn.text().to_string()),
            Sender::Assistant => (
                format!("{assistant_label}:"),
                markdown::plain_text(turn.text()),
            ),
        };
        lines.push(Line::new(LineStyle::Label, label));
        for paragraph in text.split('\n') {
            if paragraph.trim().is_empty() {
                lines.push(Line::blank());
                continue;
            }
            lines.extend(
                textwrap::wrap(paragraph, WRAP_COLUMNS)
                    .into_iter()
                    .map(|l| Line::new(LineStyle::Body, l.into_owned())),
            );
        }
        lines.push(Line::blank());
    }

    lines
}

/// Split lines into pages, dropping blank lines at the top of a page.
pub fn paginate(lines: Vec<Line>) -> Vec<Vec<Line>> {
    let mut pages: Vec<Vec<Line>> = Vec::new();
    let mut current: Vec<Line> = Vec::new();

    for line in lines {
        if current.is_empty() && line.text.is_empty() {
            continue;
        }
        current.push(line);
        if current.len() == LINES_PER_PAGE {
            pages.push(std::mem::take(&mut current));
        }
    }
    if !current.is_empty() || pages.is_empty() {
        pages.push(current);
    }
    pages
}

/// Render the transcript to PDF bytes.
pub fn render_pdf(
    title: &str,
    turns: &[ChatMessage],
    assistant_label: &str,
) -> Result<Vec<u8>, ExportError> {
    if turns.is_empty() {
        return Err(ExportError::Empty);
    }

    let pages = paginate(layout(title, turns, assistant_label));
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let regular = doc.add_object(font("Helvetica"));
    let bold = doc.add_object(font("Helvetica-Bold"));
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => regular,
            "F2" => bold,
        },
    });

    let total = pages.len();
    let mut kids: Vec<Object> = Vec::with_capacity(total);
    for (index, lines) in pages.iter().enumerate() {
        let content = page_content(lines, index + 1, total);
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode()?));
        let page_id: ObjectId = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(page_id.into());
    }

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => total as i64,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), PAGE_WIDTH.into(), PAGE_HEIGHT.into()],
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes)
        .map_err(|e| ExportError::Pdf(e.into()))?;
    Ok(bytes)
}

struct HtmlTurn {
    class: &'static str,
    label: String,
    body: String,
}

#[derive(Template)]
#[template(path = "transcript.html")]
struct TranscriptPage<'a> {
    title: &'a str,
    turns: Vec<HtmlTurn>,
}

/// Render the transcript as a standalone HTML page. User text is escaped
/// verbatim; assistant text goes through the markdown renderer.
pub fn render_html_page(
    title: &str,
    turns: &[ChatMessage],
    assistant_label: &str,
) -> Result<String, ExportError> {
    if turns.is_empty() {
        return Err(ExportError::Empty);
    }
    let turns = turns
        .iter()
        .map(|turn| match turn.sender() {
            Sender::User => HtmlTurn {
                class: "user",
                label: "You".to_string(),
                body: format!("<p>{}</p>", markdown::escape_html(turn.text()).replace('\n', "<br>")),
            },
            Sender::Assistant => HtmlTurn {
                class: "assistant",
                label: assistant_label.to_string(),
                body: markdown::render_html(turn.text()),
            },
        })
        .collect();
    Ok(TranscriptPage { title, turns }.render()?)
}

fn font(base: &str) -> lopdf::Dictionary {
    dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => base,
        "Encoding" => "WinAnsiEncoding",
    }
}

fn page_content(lines: &[Line], page: usize, total: usize) -> Content {
    let mut operations = vec![
        Operation::new("BT", vec![]),
        Operation::new("TL", vec![LEADING.into()]),
        Operation::new("Td", vec![MARGIN.into(), (PAGE_HEIGHT - MARGIN - FONT_SIZE).into()]),
    ];

    let mut current: Option<LineStyle> = None;
    for line in lines {
        if current != Some(line.style) {
            let (font, size) = match line.style {
                LineStyle::Title => ("F2", TITLE_SIZE),
                LineStyle::Label => ("F2", FONT_SIZE),
                LineStyle::Body => ("F1", FONT_SIZE),
            };
            operations.push(Operation::new("Tf", vec![font.into(), size.into()]));
            current = Some(line.style);
        }
        operations.push(Operation::new(
            "Tj",
            vec![Object::string_literal(win_ansi(&line.text))],
        ));
        operations.push(Operation::new("T*", vec![]));
    }
    operations.push(Operation::new("ET", vec![]));

    // footer
    operations.extend([
        Operation::new("BT", vec![]),
        Operation::new("Tf", vec!["F1".into(), (FONT_SIZE - 2).into()]),
        Operation::new("Td", vec![(PAGE_WIDTH - MARGIN - 60).into(), (MARGIN / 2).into()]),
        Operation::new(
            "Tj",
            vec![Object::string_literal(format!("Page {page} of {total}"))],
        ),
        Operation::new("ET", vec![]),
    ]);

    Content { operations }
}

/// Map text onto the WinAnsi code page used by the standard fonts.
fn win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| match c {
            ' '..='~' => c as u8,
            '\u{a0}'..='\u{ff}' => c as u8,
            '\t' => b' ',
            '€' => 0x80,
            '…' => 0x85,
            '‘' => 0x91,
            '’' => 0x92,
            '“' => 0x93,
            '”' => 0x94,
            '•' => 0x95,
            '–' => 0x96,
            '—' => 0x97,
            _ => b'?',
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn turns() -> Vec<ChatMessage> {
        vec![
            ChatMessage::user("Where is your resume?"),
            ChatMessage::assistant("Here: [View my Resume](https://x.test/cv.pdf)\n\n- **Rust**\n- Go"),
        ]
    }

    #[test]
    fn test_file_name() {
        let date = NaiveDate::from_ymd_opt(2025, 3, 9).unwrap();
        assert_eq!(
            export_file_name("Ada Lovelace", date, ExportFormat::Pdf),
            "Ada_Lovelace_AI_Chat_2025-03-09.pdf"
        );
        assert_eq!(
            export_file_name("  ", date, ExportFormat::Html),
            "Folio_AI_Chat_2025-03-09.html"
        );
    }

    #[test]
    fn test_layout_labels_turns_and_expands_links() {
        let lines = layout("Chat", &turns(), "AI Career Assistant");
        let texts: Vec<&str> = lines.iter().map(|l| l.text.as_str()).collect();
        assert_eq!(
            texts,
            vec![
                "Chat",
                "",
                "You:",
                "Where is your resume?",
                "",
                "AI Career Assistant:",
                "Here: View my Resume (https://x.test/cv.pdf)",
                "",
                "- Rust",
                "- Go",
                "",
            ]
        );
        assert_eq!(lines[2].style, LineStyle::Label);
        assert_eq!(lines[3].style, LineStyle::Body);
    }

    #[test]
    fn test_long_text_wraps_at_ninety_columns() {
        let long = "word ".repeat(60);
        let lines = layout("Chat", &[ChatMessage::user(long)], "AI");
        let body: Vec<&Line> = lines.iter().filter(|l| l.style == LineStyle::Body && !l.text.is_empty()).collect();
        assert!(body.len() >= 3);
        assert!(body.iter().all(|l| l.text.chars().count() <= WRAP_COLUMNS));
    }

    #[test]
    fn test_pagination_skips_leading_blanks() {
        let lines: Vec<Line> = (0..LINES_PER_PAGE + 3)
            .map(|i| Line::new(LineStyle::Body, if i == LINES_PER_PAGE { String::new() } else { format!("line {i}") }))
            .collect();
        let pages = paginate(lines);
        assert_eq!(pages.len(), 2);
        assert_eq!(pages[1].len(), 2);
        assert_eq!(pages[1][0].text, format!("line {}", LINES_PER_PAGE + 1));
    }

    #[test]
    fn test_render_produces_loadable_multi_page_pdf() {
        let many: Vec<ChatMessage> = (0..40)
            .flat_map(|i| {
                [
                    ChatMessage::user(format!("Question {i}")),
                    ChatMessage::assistant(format!("Answer {i} with café and “quotes”")),
                ]
            })
            .collect();
        let bytes = render_pdf("Chat", &many, "AI Career Assistant").unwrap();
        assert!(bytes.starts_with(b"%PDF-1.5"));

        let doc = Document::load_mem(&bytes).unwrap();
        assert!(doc.get_pages().len() > 1);
    }

    #[test]
    fn test_nothing_to_export() {
        assert!(matches!(render_pdf("Chat", &[], "AI"), Err(ExportError::Empty)));
        assert!(matches!(render_html_page("Chat", &[], "AI"), Err(ExportError::Empty)));
    }

    #[test]
    fn test_html_page_escapes_user_text_and_renders_replies() {
        let mut turns = turns();
        turns.push(ChatMessage::user("**raw** <b>\nsecond line"));
        let page = render_html_page("Ada & co", &turns, "AI Career Assistant").unwrap();

        assert!(page.contains("<title>Ada &amp; co</title>"));
        assert!(page.contains(
            "<a href=\"https://x.test/cv.pdf\" target=\"_blank\" rel=\"noopener noreferrer\">View my Resume</a>"
        ));
        assert!(page.contains("<ul><li><strong>Rust</strong></li><li>Go</li></ul>"));
        assert!(page.contains("<p>**raw** &lt;b&gt;<br>second line</p>"));
        assert!(page.contains("<h2>AI Career Assistant</h2>"));
    }

    #[test]
    fn test_win_ansi_mapping() {
        assert_eq!(win_ansi("a é – ✓"), vec![b'a', b' ', 0xe9, b' ', 0x96, b' ', b'?']);
    }
}
