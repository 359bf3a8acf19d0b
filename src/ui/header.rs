use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Widget;

pub struct Header<'a> {
    pub title: &'a str,
    pub dirty: bool,
    /// Minutes on the running timer, when one is running for this document.
    pub timer_minutes: Option<i64>,
}

impl<'a> Widget for Header<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let app = Span::styled(
            " blockpad ",
            Style::default()
                .fg(Color::White)
                .bg(Color::DarkGray)
                .add_modifier(Modifier::BOLD),
        );

        let title = if self.title.is_empty() {
            "Untitled"
        } else {
            self.title
        };
        let doc = Span::styled(
            format!(" {}{} ", title, if self.dirty { " *" } else { "" }),
            Style::default().fg(Color::Cyan).bg(Color::DarkGray),
        );

        let timer_text = match self.timer_minutes {
            Some(m) => format!("⏱ {}h{:02}m ", m / 60, m % 60),
            None => String::new(),
        };

        let used = app
            .width()
            .saturating_add(doc.width())
            .saturating_add(timer_text.chars().count());
        let spacer_len = usize::from(area.width).saturating_sub(used);
        let bg = Style::default().bg(Color::DarkGray);
        let spacer = Span::styled(" ".repeat(spacer_len), bg);

        let timer = Span::styled(timer_text, Style::default().fg(Color::Yellow).bg(Color::DarkGray));

        let line = Line::from(vec![app, doc, spacer, timer]);
        line.render(area, buf);
    }
}
