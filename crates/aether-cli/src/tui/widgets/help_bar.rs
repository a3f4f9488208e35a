use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    text::{Line, Span},
    widgets::Widget,
};

use crate::tui::app::{Focus, InputMode, Screen};

/// Bottom help bar showing context-sensitive key bindings.
pub struct HelpBar<'a> {
    pub screen: &'a Screen,
    pub input_mode: &'a InputMode,
    pub focus: &'a Focus,
    pub history_open: bool,
}

impl Widget for HelpBar<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let style = Style::default().fg(Color::DarkGray);
        let key_style = Style::default().fg(Color::Cyan);

        let bindings: &[(&str, &str)] = match (self.screen, self.input_mode) {
            (Screen::Login, _) => &[("Enter", "log in"), ("Esc", "quit")],
            (Screen::Main, _) if self.history_open => &[
                ("j/k", "navigate"),
                ("Enter", "open"),
                ("Esc", "close"),
            ],
            (Screen::Main, InputMode::Compose) => &[("Enter", "send"), ("Esc", "stop typing")],
            (Screen::Main, InputMode::UploadPath) => &[("Enter", "upload"), ("Esc", "cancel")],
            (Screen::Main, InputMode::Normal) => match self.focus {
                Focus::Files => &[
                    ("j/k", "navigate"),
                    ("Space", "select"),
                    ("Tab", "chat"),
                    ("u", "upload"),
                    ("h", "history"),
                    ("n", "new chat"),
                    ("r", "refresh"),
                    ("L", "logout"),
                    ("q", "quit"),
                ],
                Focus::Chat => &[
                    ("i", "type"),
                    ("j/k", "scroll"),
                    ("Tab", "files"),
                    ("u", "upload"),
                    ("h", "history"),
                    ("n", "new chat"),
                    ("r", "refresh"),
                    ("L", "logout"),
                    ("q", "quit"),
                ],
            },
        };

        let mut spans: Vec<Span> = Vec::with_capacity(bindings.len() * 2);
        for (i, (key, label)) in bindings.iter().enumerate() {
            spans.push(Span::styled(*key, key_style));
            let sep = if i + 1 == bindings.len() { "" } else { "  " };
            spans.push(Span::styled(format!(" {label}{sep}"), style));
        }

        let line = Line::from(spans);
        buf.set_line(area.x, area.y, &line, area.width);
    }
}
