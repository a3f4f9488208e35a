use ratatui::{
    layout::{Constraint, Flex, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use crate::tui::{
    app::App,
    widgets::{help_bar::HelpBar, text_input::TextInput},
};

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let [body, help] = Layout::vertical([Constraint::Min(10), Constraint::Length(1)]).areas(area);

    let [center_y] = Layout::vertical([Constraint::Length(10)])
        .flex(Flex::Center)
        .areas(body);
    let [center] = Layout::horizontal([Constraint::Length(60)])
        .flex(Flex::Center)
        .areas(center_y);

    let [header, input, note] = Layout::vertical([
        Constraint::Length(4),
        Constraint::Length(3),
        Constraint::Length(2),
    ])
    .areas(center);

    let lines = vec![
        Line::from(Span::styled(
            app.workspace.brand().to_string(),
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(Span::styled(
            "Sign in with Google to chat with your PDFs.",
            Style::default().fg(Color::DarkGray),
        )),
    ];
    frame.render_widget(Paragraph::new(lines).centered(), header);

    frame.render_widget(
        TextInput {
            text: &app.credential_input,
            title: "ID token",
            placeholder: "paste a Google ID token",
            focused: !app.logging_in,
            masked: true,
        },
        input,
    );

    let status = if app.logging_in {
        Span::styled(
            "Logging in...",
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        )
    } else {
        Span::styled(
            "Tip: `aether login --token ...` works too.",
            Style::default().fg(Color::DarkGray),
        )
    };
    frame.render_widget(Paragraph::new(Line::from(status)).centered(), note);

    frame.render_widget(
        HelpBar {
            screen: &app.screen,
            input_mode: &app.input_mode,
            focus: &app.focus,
            history_open: false,
        },
        help,
    );
}
