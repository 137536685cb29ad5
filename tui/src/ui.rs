use crate::app::App;
use folio_core::{ChatMessage, Inline, RenderBlock, Sender, parse_inline, render};
use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Margin},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Scrollbar, ScrollbarOrientation, ScrollbarState, Wrap},
};

/// Flatten inline markdown into styled spans. Links keep their target
/// visible since a terminal cannot follow them.
fn inline_spans(nodes: &[Inline], style: Style, out: &mut Vec<Span<'static>>) {
    for node in nodes {
        match node {
            Inline::Text(text) => out.push(Span::styled(text.clone(), style)),
            Inline::Bold(children) => inline_spans(children, style.add_modifier(Modifier::BOLD), out),
            Inline::Link { href, children } => {
                inline_spans(
                    children,
                    style.fg(Color::Blue).add_modifier(Modifier::UNDERLINED),
                    out,
                );
                out.push(Span::styled(
                    format!(" <{}>", href),
                    Style::default().fg(Color::DarkGray),
                ));
            }
        }
    }
}

fn styled_line(text: &str) -> Vec<Span<'static>> {
    let mut spans = Vec::new();
    inline_spans(&parse_inline(text), Style::default(), &mut spans);
    spans
}

fn markdown_lines(text: &str) -> Vec<Line<'static>> {
    let mut lines = Vec::new();
    for block in render(text) {
        match block {
            RenderBlock::Paragraph { text } => {
                lines.extend(text.lines().map(|line| Line::from(styled_line(line))));
            }
            RenderBlock::List { items } => {
                for item in items {
                    let mut spans = vec![Span::styled("  • ", Style::default().fg(Color::Cyan))];
                    spans.extend(styled_line(&item));
                    lines.push(Line::from(spans));
                }
            }
        }
        lines.push(Line::from(""));
    }
    lines
}

fn message_lines(message: &ChatMessage, assistant_label: &str, out: &mut Vec<Line<'static>>) {
    match message.sender() {
        Sender::User => {
            out.push(Line::from(Span::styled(
                "[You]",
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            )));
            out.extend(message.text().lines().map(|l| Line::from(l.to_string())));
            out.push(Line::from(""));
        }
        Sender::Assistant => {
            out.push(Line::from(Span::styled(
                format!("[{}]", assistant_label),
                Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
            )));
            out.extend(markdown_lines(message.text()));
        }
    }
}

/// Rows a line takes once wrapped to `width` columns
fn wrapped_height(line: &Line, width: usize) -> usize {
    if width == 0 {
        return 1;
    }
    line.width().max(1).div_ceil(width)
}

pub fn draw(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(1),    // Chat area
            Constraint::Length(3), // Input area
            Constraint::Length(1), // Status bar
        ])
        .split(f.area());

    let manager = &app.manager;
    let label = manager.profile().assistant_label.clone();
    let mut all_lines: Vec<Line> = Vec::new();

    for message in manager.messages() {
        message_lines(message, &label, &mut all_lines);
    }

    let prompts = manager.example_prompts();
    if !prompts.is_empty() {
        all_lines.push(Line::from(Span::styled(
            "Try one of these:",
            Style::default().fg(Color::Yellow),
        )));
        for (i, prompt) in prompts.iter().enumerate() {
            all_lines.push(Line::from(vec![
                Span::styled(format!("  /ask {} ", i + 1), Style::default().fg(Color::DarkGray)),
                Span::raw(prompt.clone()),
            ]));
        }
        all_lines.push(Line::from(""));
    }

    if manager.is_busy() {
        all_lines.push(Line::from(Span::styled(
            format!("[{}] {} typing...", label, app.thinking_indicator()),
            Style::default().fg(Color::Green).add_modifier(Modifier::ITALIC),
        )));
    }

    if let Some(error) = manager.error() {
        all_lines.push(Line::from(Span::styled(
            error.to_string(),
            Style::default().fg(Color::Red),
        )));
    }

    // scroll_offset=0 follows the bottom, higher values scroll up from it
    let inner_width = chunks[0].width.saturating_sub(2) as usize;
    let total_lines: usize = all_lines.iter().map(|l| wrapped_height(l, inner_width)).sum();
    let visible_height = chunks[0].height.saturating_sub(2) as usize;
    let max_scroll = total_lines.saturating_sub(visible_height);
    if app.scroll_offset > max_scroll {
        app.scroll_offset = max_scroll;
    }
    let effective_scroll = max_scroll.saturating_sub(app.scroll_offset);

    let title = format!("Chat with {}'s {}", manager.profile().owner_name, label);
    let chat = Paragraph::new(all_lines)
        .block(Block::default().borders(Borders::ALL).title(title))
        .wrap(Wrap { trim: false })
        .scroll((effective_scroll as u16, 0));
    f.render_widget(chat, chunks[0]);

    if total_lines > visible_height {
        let scrollbar = Scrollbar::new(ScrollbarOrientation::VerticalRight)
            .begin_symbol(Some("▲"))
            .end_symbol(Some("▼"));
        let mut scrollbar_state = ScrollbarState::new(max_scroll).position(effective_scroll);
        let scrollbar_area = chunks[0].inner(Margin { vertical: 1, horizontal: 0 });
        f.render_stateful_widget(scrollbar, scrollbar_area, &mut scrollbar_state);
    }

    let voice = manager.voice();
    let listening = voice.is_listening();
    let (input_text, input_title, input_style) = if listening && app.input.value().is_empty() {
        (
            voice.draft().to_string(),
            format!("{} Listening (Esc or F2 to finish)", app.thinking_indicator()),
            Style::default().fg(Color::Yellow),
        )
    } else {
        (
            app.input.value().to_string(),
            "Message (/help for commands)".to_string(),
            Style::default().fg(Color::White),
        )
    };
    let input_widget = Paragraph::new(input_text)
        .style(input_style)
        .block(Block::default().borders(Borders::ALL).title(input_title));
    f.render_widget(input_widget, chunks[1]);

    let voice_indicator = if listening {
        " | 🎤 Listening..."
    } else if manager.can_stop_speaking() {
        " | 🔊 Speaking (Esc to stop)"
    } else if voice.is_supported() {
        " | 🎙️ F2 to talk"
    } else {
        ""
    };
    let turns = manager.messages().len().saturating_sub(1);
    let status_text = if let Some(ref notice) = app.notice {
        format!(" {} | {}{} ", manager.model_name(), notice, voice_indicator)
    } else if manager.is_busy() {
        format!(
            " {} | {} Thinking...{} ",
            manager.model_name(),
            app.thinking_indicator(),
            voice_indicator
        )
    } else {
        format!(" {} | {} messages{} ", manager.model_name(), turns, voice_indicator)
    };
    let status_bar =
        Paragraph::new(status_text).style(Style::default().bg(Color::DarkGray).fg(Color::White));
    f.render_widget(status_bar, chunks[2]);

    f.set_cursor_position((
        chunks[1].x + app.input.visual_cursor() as u16 + 1,
        chunks[1].y + 1,
    ));
}
