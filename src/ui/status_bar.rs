use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Widget;

pub struct StatusBar<'a> {
    pub hints: &'a [(String, &'static str)],
    pub message: Option<&'a str>,
    /// Short mode label such as `EDIT` or `3 SELECTED`.
    pub mode: Option<&'a str>,
}

impl<'a> Widget for StatusBar<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let mut spans = Vec::new();
        if let Some(mode) = self.mode {
            spans.push(Span::styled(
                format!(" {} ", mode),
                Style::default()
                    .fg(Color::Black)
                    .bg(Color::Green)
                    .add_modifier(Modifier::BOLD),
            ));
        }

        if let Some(msg) = self.message {
            spans.push(Span::styled(
                format!(" {} ", msg),
                Style::default().fg(Color::Yellow),
            ));
            Line::from(spans).render(area, buf);
            return;
        }

        spans.push(Span::raw(" "));

        for (i, (key, action)) in self.hints.iter().enumerate() {
            if i > 0 {
                spans.push(Span::styled("  ", Style::default().fg(Color::DarkGray)));
            }
            spans.push(Span::styled(
                format!("[{}]", key),
                Style::default().fg(Color::Cyan),
            ));
            spans.push(Span::styled(
                action.to_string(),
                Style::default()
                    .fg(Color::DarkGray)
                    .add_modifier(Modifier::DIM),
            ));
        }

        let line = Line::from(spans);
        line.render(area, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn content(buf: &Buffer, area: Rect) -> String {
        (0..area.width)
            .map(|x| {
                buf.cell((x, 0))
                    .unwrap()
                    .symbol()
                    .chars()
                    .next()
                    .unwrap_or(' ')
            })
            .collect()
    }

    #[test]
    fn status_bar_renders_hints() {
        let area = Rect::new(0, 0, 60, 1);
        let mut buf = Buffer::empty(area);

        let hints = vec![
            ("Ctrl+q".to_string(), "quit"),
            ("F1".to_string(), "help"),
        ];
        let bar = StatusBar {
            hints: &hints,
            message: None,
            mode: None,
        };
        bar.render(area, &mut buf);

        let content = content(&buf, area);
        assert!(content.contains("[Ctrl+q]"));
        assert!(content.contains("quit"));
        assert!(content.contains("[F1]"));
        assert!(content.contains("help"));
    }

    #[test]
    fn status_bar_message_replaces_hints() {
        let area = Rect::new(0, 0, 60, 1);
        let mut buf = Buffer::empty(area);

        let hints = vec![("Ctrl+q".to_string(), "quit")];
        let bar = StatusBar {
            hints: &hints,
            message: Some("Copied 2 blocks"),
            mode: None,
        };
        bar.render(area, &mut buf);

        let content = content(&buf, area);
        assert!(content.contains("Copied 2 blocks"));
        assert!(!content.contains("[Ctrl+q]"));
    }

    #[test]
    fn status_bar_shows_mode_label() {
        let area = Rect::new(0, 0, 60, 1);
        let mut buf = Buffer::empty(area);

        let bar = StatusBar {
            hints: &[],
            message: None,
            mode: Some("3 SELECTED"),
        };
        bar.render(area, &mut buf);

        assert!(content(&buf, area).contains("3 SELECTED"));
    }
}
