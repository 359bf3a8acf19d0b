use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Widget;

use crate::app::surface::{caret_row_col, wrap_rows};
use crate::block::{Block, BlockType};
use crate::edit_buffer::LocalEdit;
use crate::ops::block_level;
use crate::session::{EditorSession, FocusMode, ItemId};

/// Columns reserved left of every item for the focus indicator.
pub const GUTTER: usize = 2;
const INDENT_WIDTH: usize = 2;

pub struct MainArea<'a> {
    pub session: Option<&'a EditorSession>,
    pub local: Option<&'a LocalEdit>,
    pub loading: bool,
}

/// Marker drawn before a block's content. Its width is part of the layout
/// the caret geometry is computed against.
pub fn marker(session: &EditorSession, block: &Block) -> String {
    match block.kind {
        BlockType::H1 => {
            if session.is_collapsed(&block.id) {
                "▸ ".into()
            } else {
                "▾ ".into()
            }
        }
        BlockType::Bullet => match block_level(block) % 3 {
            0 => "• ".into(),
            1 => "◦ ".into(),
            _ => "▪ ".into(),
        },
        BlockType::Numbered => format!("{}. ", session.numbered_index_of(&block.id)),
        BlockType::Todo => "[ ] ".into(),
        BlockType::TodoChecked => "[x] ".into(),
        BlockType::Quote => "│ ".into(),
        BlockType::PageEmbed => "↪ ".into(),
        BlockType::Paragraph
        | BlockType::H2
        | BlockType::H3
        | BlockType::Code
        | BlockType::Divider => String::new(),
    }
}

fn indent_of(block: &Block) -> usize {
    block_level(block) as usize * INDENT_WIDTH
}

/// Columns available for an item's text at the given terminal width.
pub fn item_width(session: &EditorSession, item: &ItemId, area_width: u16) -> usize {
    let area = area_width as usize;
    let used = match item {
        ItemId::Title(_) => GUTTER,
        ItemId::Block(id) => match session.block(id) {
            Some(block) => GUTTER + indent_of(block) + marker(session, block).chars().count(),
            None => GUTTER,
        },
    };
    area.saturating_sub(used).max(1)
}

fn block_style(kind: BlockType) -> Style {
    let base = Style::default().fg(Color::Gray);
    match kind {
        BlockType::H1 => base
            .fg(Color::White)
            .add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
        BlockType::H2 => base.fg(Color::White).add_modifier(Modifier::BOLD),
        BlockType::H3 => base.add_modifier(Modifier::BOLD),
        BlockType::TodoChecked => base.fg(Color::DarkGray).add_modifier(Modifier::CROSSED_OUT),
        BlockType::Quote => base.add_modifier(Modifier::ITALIC),
        BlockType::Code => base.fg(Color::Green),
        BlockType::PageEmbed => base.fg(Color::Cyan).add_modifier(Modifier::UNDERLINED),
        _ => base,
    }
}

/// One item's text laid out for rendering.
struct ItemView {
    text: String,
    marker: String,
    indent: usize,
    width: usize,
    style: Style,
    gutter: Span<'static>,
    caret: Option<usize>,
}

fn gutter(session: &EditorSession, item: &ItemId) -> Span<'static> {
    let selected = item
        .block_id()
        .is_some_and(|id| session.mode() == FocusMode::Selected && session.is_selected(id));
    if selected {
        Span::styled("▎ ", Style::default().fg(Color::Cyan).bg(Color::DarkGray))
    } else if session.is_editing(item) {
        Span::styled("› ", Style::default().fg(Color::Yellow))
    } else {
        Span::raw("  ")
    }
}

/// Pushes the item's rows and returns the index of the row to keep in view.
fn push_item(lines: &mut Vec<Line<'static>>, view: ItemView) -> usize {
    let first = lines.len();
    let rows = wrap_rows(&view.text, view.width);
    let chars: Vec<char> = view.text.chars().collect();
    let caret = view.caret.map(|offset| caret_row_col(&rows, offset));
    let marker_width = view.marker.chars().count();
    let marker_style = view.style.remove_modifier(Modifier::UNDERLINED | Modifier::CROSSED_OUT);

    for (r, row) in rows.iter().enumerate() {
        let mut spans = Vec::with_capacity(5);
        if r == 0 {
            spans.push(view.gutter.clone());
            spans.push(Span::raw(" ".repeat(view.indent)));
            spans.push(Span::styled(view.marker.clone(), marker_style));
        } else {
            spans.push(Span::raw(" ".repeat(GUTTER + view.indent + marker_width)));
        }

        let end = (row.start + row.len).min(chars.len());
        let row_chars = &chars[row.start.min(end)..end];
        match caret {
            Some((caret_row, col)) if caret_row == r => {
                let col = col.min(row_chars.len());
                let before: String = row_chars[..col].iter().collect();
                let cursor_char = row_chars.get(col).copied().unwrap_or(' ');
                let after: String = row_chars.get(col + 1..).unwrap_or(&[]).iter().collect();
                spans.push(Span::styled(before, view.style));
                spans.push(Span::styled(
                    cursor_char.to_string(),
                    Style::default().fg(Color::Black).bg(Color::White),
                ));
                if !after.is_empty() {
                    spans.push(Span::styled(after, view.style));
                }
            }
            _ => spans.push(Span::styled(row_chars.iter().collect::<String>(), view.style)),
        }
        lines.push(Line::from(spans));
    }

    match caret {
        Some((caret_row, _)) => first + caret_row,
        None => first,
    }
}

fn live<'a>(local: Option<&'a LocalEdit>, item: &ItemId) -> Option<&'a LocalEdit> {
    local.filter(|l| &l.item == item)
}

/// Every visual row of the document plus the row to scroll to.
fn build_lines(session: &EditorSession, local: Option<&LocalEdit>, width: u16) -> (Vec<Line<'static>>, usize) {
    let mut lines = Vec::new();
    let mut anchor = 0;
    let focus = session.focus();

    let title_item = ItemId::Title(session.doc_id().to_string());
    let title_edit = live(local, &title_item);
    let title_text = match title_edit {
        Some(edit) => edit.buffer.text(),
        None => session.title().to_string(),
    };
    let placeholder = title_text.is_empty() && title_edit.is_none();
    let row = push_item(
        &mut lines,
        ItemView {
            text: if placeholder { "Untitled".into() } else { title_text },
            marker: String::new(),
            indent: 0,
            width: item_width(session, &title_item, width),
            style: if placeholder {
                Style::default().fg(Color::DarkGray).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::White).add_modifier(Modifier::BOLD)
            },
            gutter: gutter(session, &title_item),
            caret: title_edit.map(|e| e.buffer.cursor),
        },
    );
    if focus == Some(&title_item) {
        anchor = row;
    }
    lines.push(Line::default());

    for block in session.visible_blocks() {
        let item = ItemId::Block(block.id.clone());
        let selected = session.mode() == FocusMode::Selected && session.is_selected(&block.id);
        let mut style = block_style(block.kind);
        if selected {
            style = style.bg(Color::DarkGray);
        }

        let row = if block.kind == BlockType::Divider {
            let indent = indent_of(block);
            let rule = "─".repeat((width as usize).saturating_sub(GUTTER + indent));
            let start = lines.len();
            lines.push(Line::from(vec![
                gutter(session, &item),
                Span::raw(" ".repeat(indent)),
                Span::styled(rule, style.fg(Color::DarkGray)),
            ]));
            start
        } else {
            let edit = live(local, &item);
            push_item(
                &mut lines,
                ItemView {
                    text: edit.map(|e| e.buffer.text()).unwrap_or_else(|| block.content.clone()),
                    marker: marker(session, block),
                    indent: indent_of(block),
                    width: item_width(session, &item, width),
                    style,
                    gutter: gutter(session, &item),
                    caret: edit.map(|e| e.buffer.cursor),
                },
            )
        };
        if focus == Some(&item) {
            anchor = row;
        }
    }

    (lines, anchor)
}

fn render_centered_message(msg: &str, area: Rect, buf: &mut Buffer) {
    if area.height > 0 {
        let line = Line::styled(msg, Style::default().fg(Color::DarkGray));
        let y = area.y + area.height / 2;
        let render_area = Rect::new(area.x, y, area.width, 1);
        line.render(render_area, buf);
    }
}

impl Widget for MainArea<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let Some(session) = self.session else {
            let msg = if self.loading {
                " Loading documents..."
            } else {
                " No document open"
            };
            render_centered_message(msg, area, buf);
            return;
        };

        let (lines, anchor) = build_lines(session, self.local, area.width);
        let height = area.height as usize;
        let scroll = (anchor + 1).saturating_sub(height);

        for (i, line) in lines.into_iter().skip(scroll).take(height).enumerate() {
            let row_area = Rect::new(area.x, area.y + i as u16, area.width, 1);
            line.render(row_area, buf);
        }
    }
}
