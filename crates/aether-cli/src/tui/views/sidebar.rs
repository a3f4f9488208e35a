use std::time::Instant;

use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap},
    Frame,
};

use crate::tui::{
    app::{App, Focus, InputMode},
    widgets::text_input::TextInput,
};

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let uploading = app.input_mode == InputMode::UploadPath;
    let [list_area, upload_area, status_area] = Layout::vertical([
        Constraint::Min(3),
        Constraint::Length(if uploading { 3 } else { 0 }),
        Constraint::Length(2),
    ])
    .areas(area);

    render_list(frame, app, list_area);

    if uploading {
        frame.render_widget(
            TextInput {
                text: &app.upload_input,
                title: "Upload PDF (path)",
                placeholder: "",
                focused: true,
                masked: false,
            },
            upload_area,
        );
    }

    if let Some(text) = app.workspace.files.status_at(Instant::now()) {
        let status = Paragraph::new(Span::styled(text, Style::default().fg(Color::Yellow)))
            .wrap(Wrap { trim: true });
        frame.render_widget(status, status_area);
    }
}

fn render_list(frame: &mut Frame, app: &App, area: Rect) {
    let files = app.workspace.files.files();
    let focused = app.focus == Focus::Files && app.input_mode == InputMode::Normal;
    let selected_count = app.workspace.files.selected().len();

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(if focused {
            Color::Cyan
        } else {
            Color::DarkGray
        }))
        .title(format!(" Files ({selected_count}/{}) ", files.len()));

    if files.is_empty() {
        let empty = Paragraph::new(Line::from(Span::styled(
            "No files yet. Press u to upload a PDF.",
            Style::default().fg(Color::DarkGray),
        )))
        .wrap(Wrap { trim: true })
        .block(block);
        frame.render_widget(empty, area);
        return;
    }

    let items: Vec<ListItem> = files
        .iter()
        .map(|f| {
            let checked = app.workspace.files.is_selected(&f.filename);
            let mark = if checked {
                Span::styled("[x] ", Style::default().fg(Color::Green))
            } else {
                Span::styled("[ ] ", Style::default().fg(Color::DarkGray))
            };
            let mut spans = vec![mark, Span::raw(f.filename.clone())];
            if f.size > 0 {
                spans.push(Span::styled(
                    format!("  {}", f.size_label()),
                    Style::default().fg(Color::DarkGray),
                ));
            }
            ListItem::new(Line::from(spans))
        })
        .collect();

    let list = List::new(items).block(block).highlight_style(
        Style::default()
            .bg(Color::DarkGray)
            .add_modifier(Modifier::BOLD),
    );
    let mut state = ListState::default();
    if focused {
        state.select(Some(app.file_cursor));
    }
    frame.render_stateful_widget(list, area, &mut state);
}
