use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Widget},
};

/// Single-line input box with a focus highlight and a block cursor at the end.
pub struct TextInput<'a> {
    pub text: &'a str,
    pub title: &'a str,
    pub placeholder: &'a str,
    pub focused: bool,
    /// Render every character as a bullet.
    pub masked: bool,
}

impl Widget for TextInput<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let border_color = if self.focused {
            Color::Cyan
        } else {
            Color::DarkGray
        };

        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(border_color))
            .title(format!(" {} ", self.title));

        let inner = block.inner(area);
        block.render(area, buf);

        if inner.height == 0 || inner.width == 0 {
            return;
        }

        let prefix = Span::styled("❯ ", Style::default().fg(Color::Cyan));
        let shown: String = if self.masked {
            "•".repeat(self.text.chars().count())
        } else {
            self.text.to_string()
        };

        // Keep the tail visible when the text is wider than the box.
        let room = (inner.width as usize).saturating_sub(3);
        let count = shown.chars().count();
        let visible: String = if count > room {
            shown.chars().skip(count - room).collect()
        } else {
            shown
        };

        let mut spans = vec![prefix];
        if visible.is_empty() && !self.focused {
            spans.push(Span::styled(
                self.placeholder,
                Style::default().fg(Color::DarkGray),
            ));
        } else {
            spans.push(Span::raw(visible));
        }
        if self.focused {
            spans.push(Span::styled(
                " ",
                Style::default()
                    .fg(Color::Black)
                    .bg(Color::White)
                    .add_modifier(Modifier::BOLD),
            ));
        }

        let line = Line::from(spans);
        buf.set_line(inner.x, inner.y, &line, inner.width);
    }
}
