pub mod header;
pub mod main_area;
pub mod status_bar;

use chrono::Utc;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block as WidgetBlock, BorderType, Borders, Clear};
use ratatui::Frame;

use crate::app::AppState;
use crate::error::ErrorPopup;
use crate::session::FocusMode;

use header::Header;
use main_area::MainArea;
use status_bar::StatusBar;

pub fn render(frame: &mut Frame, state: &AppState) {
    let chunks = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(1),
        Constraint::Length(1),
    ])
    .split(frame.area());

    let session = state.session.as_ref();
    let timer_minutes = match (session, state.timer.active_task()) {
        (Some(s), Some(task)) if task == s.doc_id() => Some(state.timer.elapsed_minutes(Utc::now())),
        _ => None,
    };
    let header = Header {
        title: session.map(|s| s.title()).unwrap_or(""),
        dirty: state.dirty,
        timer_minutes,
    };
    frame.render_widget(header, chunks[0]);

    let main = MainArea {
        session,
        local: state.local.as_ref(),
        loading: state.loading,
    };
    frame.render_widget(main, chunks[1]);

    if state.show_help {
        render_help_popup(frame, &state.help, chunks[1]);
    }

    if let Some(err) = &state.error_popup {
        render_error_popup(frame, err, chunks[1]);
    }

    let mode = mode_label(state);
    let status = StatusBar {
        hints: &state.hints,
        message: state.status_message.as_deref(),
        mode: mode.as_deref(),
    };
    frame.render_widget(status, chunks[2]);
}

fn mode_label(state: &AppState) -> Option<String> {
    let session = state.session.as_ref()?;
    session.focus()?;
    match session.mode() {
        FocusMode::Editing => Some("EDIT".into()),
        FocusMode::Selected => Some(format!("{} SELECTED", session.selection().len())),
    }
}

fn render_help_popup(frame: &mut Frame, hints: &[(String, &str)], area: Rect) {
    let line_count = hints.len();
    let popup_height = (line_count + 3).min(area.height as usize) as u16; // +2 borders +1 footer
    let popup_width = (area.width * 60 / 100).max(30).min(area.width);
    let x = area.x + (area.width.saturating_sub(popup_width)) / 2;
    let y = area.y + (area.height.saturating_sub(popup_height)) / 2;

    let popup_area = Rect::new(x, y, popup_width, popup_height);
    frame.render_widget(Clear, popup_area);

    let block = WidgetBlock::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(Color::Cyan))
        .title(" Help ");

    let inner = block.inner(popup_area);
    frame.render_widget(block, popup_area);

    for (i, (key_str, action_name)) in hints.iter().enumerate() {
        if i as u16 >= inner.height.saturating_sub(1) {
            break;
        }
        let key_span = Span::styled(
            format!("{:>16}", key_str),
            Style::default().fg(Color::Yellow),
        );
        let sep = Span::styled("  ", Style::default());
        let action_span = Span::styled(*action_name, Style::default().fg(Color::White));
        let line = Line::from(vec![key_span, sep, action_span]);
        let line_area = Rect::new(inner.x, inner.y + i as u16, inner.width, 1);
        frame.render_widget(line, line_area);
    }

    if inner.height > 0 {
        let footer_y = inner.y + inner.height - 1;
        let footer = Line::styled(
            "Press any key to close",
            Style::default().fg(Color::DarkGray),
        );
        let footer_area = Rect::new(inner.x, footer_y, inner.width, 1);
        frame.render_widget(footer, footer_area);
    }
}

fn render_error_popup(frame: &mut Frame, popup: &ErrorPopup, area: Rect) {
    let popup_width = (area.width * 50 / 100).max(30).min(area.width);
    let inner_width = popup_width.saturating_sub(2) as usize;

    let msg_lines = wrap_text(&popup.message, inner_width);
    // blank + message + blank + hint + blank + footer
    let content_height = 1 + msg_lines.len() + 1 + 1 + 1 + 1;
    let popup_height = (content_height + 2).min(area.height as usize) as u16;

    let x = area.x + (area.width.saturating_sub(popup_width)) / 2;
    let y = area.y + (area.height.saturating_sub(popup_height)) / 2;

    let popup_area = Rect::new(x, y, popup_width, popup_height);
    frame.render_widget(Clear, popup_area);

    let title = format!(" ! {} ", popup.title);
    let block = WidgetBlock::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(Color::Red))
        .title(title);

    let inner = block.inner(popup_area);
    frame.render_widget(block, popup_area);

    let mut row: u16 = 1;

    for line_text in &msg_lines {
        if row >= inner.height.saturating_sub(1) {
            break;
        }
        let line = Line::from(Span::styled(
            line_text.clone(),
            Style::default().fg(Color::White),
        ));
        frame.render_widget(line, Rect::new(inner.x, inner.y + row, inner.width, 1));
        row += 1;
    }

    row += 1;

    if row < inner.height.saturating_sub(1) {
        let hint = Line::from(Span::styled(
            popup.hint.clone(),
            Style::default().fg(Color::DarkGray),
        ));
        frame.render_widget(hint, Rect::new(inner.x, inner.y + row, inner.width, 1));
        row += 1;
    }

    row += 1;

    if row < inner.height {
        let footer = Line::styled(
            "Press any key to close",
            Style::default().fg(Color::DarkGray),
        );
        frame.render_widget(footer, Rect::new(inner.x, inner.y + row, inner.width, 1));
    }
}

fn wrap_text(text: &str, max_width: usize) -> Vec<String> {
    if max_width == 0 {
        return vec![text.to_string()];
    }
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        if current.is_empty() {
            current = word.to_string();
        } else if current.len() + 1 + word.len() <= max_width {
            current.push(' ');
            current.push_str(word);
        } else {
            lines.push(current);
            current = word.to_string();
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::AppState;
    use crate::block::Block;
    use crate::error::ErrorInfo;
    use crate::markdown::PrefixTable;
    use crate::session::EditorSession;
    use ratatui::backend::TestBackend;
    use ratatui::Terminal;

    fn screen(state: &AppState) -> String {
        let mut terminal = Terminal::new(TestBackend::new(60, 12)).unwrap();
        terminal.draw(|frame| render(frame, state)).unwrap();
        let buf = terminal.backend().buffer().clone();
        let area = buf.area;
        (0..area.height)
            .map(|y| {
                (0..area.width)
                    .map(|x| buf.cell((x, y)).unwrap().symbol().to_string())
                    .collect::<String>()
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn state_with_doc() -> AppState {
        let mut state = AppState::new(vec![("Ctrl+q".into(), "quit")], Vec::new());
        state.session = Some(EditorSession::new(
            "doc",
            "Inbox",
            vec![Block::paragraph("1", "hello")],
            PrefixTable::default(),
        ));
        state.loading = false;
        state
    }

    #[test]
    fn renders_header_document_and_hints() {
        let out = screen(&state_with_doc());
        assert!(out.contains("blockpad"));
        assert!(out.contains("Inbox"));
        assert!(out.contains("hello"));
        assert!(out.contains("[Ctrl+q]"));
    }

    #[test]
    fn selected_mode_is_labelled() {
        let mut state = state_with_doc();
        if let Some(s) = state.session.as_mut() {
            s.select_block("1");
        }
        assert!(screen(&state).contains("1 SELECTED"));
    }

    #[test]
    fn error_popup_overlays_document() {
        let mut state = state_with_doc();
        state.error_popup = Some(ErrorPopup::from_error_info(&ErrorInfo::Other(
            "disk on fire".into(),
        )));
        let out = screen(&state);
        assert!(out.contains("disk on fire"));
        assert!(out.contains("Press any key"));
    }

    #[test]
    fn wrap_text_breaks_on_words() {
        assert_eq!(wrap_text("one two three", 7), vec!["one two", "three"]);
        assert_eq!(wrap_text("", 5), vec![String::new()]);
    }
}
