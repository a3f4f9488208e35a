use ratatui::{
    layout::{Constraint, Flex, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState},
    Frame,
};

use crate::tui::app::App;

/// Centered popup listing past sessions, with "New chat" on top.
pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let [popup] = Layout::horizontal([Constraint::Percentage(60)])
        .flex(Flex::Center)
        .areas(area);
    let [popup] = Layout::vertical([Constraint::Percentage(60)])
        .flex(Flex::Center)
        .areas(popup);

    let active = app.workspace.session().map(|s| s.id.as_str());

    let mut items = vec![ListItem::new(Line::from(Span::styled(
        "+ New chat",
        Style::default().fg(Color::Green),
    )))];
    for s in app.workspace.history.sessions() {
        let marker = if Some(s.id.as_str()) == active {
            Span::styled("● ", Style::default().fg(Color::Cyan))
        } else {
            Span::raw("  ")
        };
        let mut spans = vec![marker, Span::raw(s.title.clone())];
        if let Some(ref created) = s.created_at {
            spans.push(Span::styled(
                format!("  {created}"),
                Style::default().fg(Color::DarkGray),
            ));
        }
        items.push(ListItem::new(Line::from(spans)));
    }

    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Cyan))
                .title(" History "),
        )
        .highlight_style(
            Style::default()
                .bg(Color::DarkGray)
                .add_modifier(Modifier::BOLD),
        );
    let mut state = ListState::default();
    state.select(Some(app.history_cursor));

    frame.render_widget(Clear, popup);
    frame.render_stateful_widget(list, popup, &mut state);
}
