use aether_core::chat::THINKING;
use aether_core::model::{Message, Role};
use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

use crate::tui::{
    app::{App, Focus, InputMode},
    widgets::text_input::TextInput,
};

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let chat = &app.workspace.chat;
    let [transcript_area, loading_area, input_area] = Layout::vertical([
        Constraint::Min(3),
        Constraint::Length(1),
        Constraint::Length(3),
    ])
    .areas(area);

    let title = app
        .workspace
        .session()
        .map(|s| format!(" {} ", s.title))
        .unwrap_or_else(|| " New chat ".to_string());
    let focused = app.focus == Focus::Chat && app.input_mode == InputMode::Normal;
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(if focused {
            Color::Cyan
        } else {
            Color::DarkGray
        }))
        .title(title);
    let inner = block.inner(transcript_area);

    let lines = transcript_lines(chat.messages());
    let total = wrapped_height(&lines, inner.width);
    let offset = total
        .saturating_sub(inner.height)
        .saturating_sub(app.chat_scroll);

    let transcript = if lines.is_empty() {
        Paragraph::new(Line::from(Span::styled(
            "Ask something about your selected files.",
            Style::default().fg(Color::DarkGray),
        )))
    } else {
        Paragraph::new(lines)
    };
    frame.render_widget(
        transcript
            .block(block)
            .wrap(Wrap { trim: false })
            .scroll((offset, 0)),
        transcript_area,
    );

    if chat.is_loading() {
        frame.render_widget(
            Line::from(Span::styled(
                format!(" {THINKING}"),
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            )),
            loading_area,
        );
    }

    frame.render_widget(
        TextInput {
            text: chat.input(),
            title: "Message",
            placeholder: "Ask something... (press i)",
            focused: app.input_mode == InputMode::Compose,
            masked: false,
        },
        input_area,
    );
}

fn transcript_lines(messages: &[Message]) -> Vec<Line<'_>> {
    let mut lines = Vec::new();
    for m in messages {
        let (label, color) = match m.role {
            Role::User => ("you", Color::Cyan),
            Role::Ai => ("ai", Color::Magenta),
        };
        lines.push(Line::from(Span::styled(
            label,
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        )));
        for text in m.text.lines() {
            lines.push(Line::from(text));
        }
        lines.push(Line::from(""));
    }
    lines
}

/// Rows the lines occupy once wrapped to `width`. Character counts stand in
/// for display width.
fn wrapped_height(lines: &[Line], width: u16) -> u16 {
    let width = usize::from(width.max(1));
    let rows: usize = lines
        .iter()
        .map(|l| {
            let chars: usize = l.spans.iter().map(|s| s.content.chars().count()).sum();
            chars.div_ceil(width).max(1)
        })
        .sum();
    u16::try_from(rows).unwrap_or(u16::MAX)
}
