//! Caret geometry for the terminal: item text is hard-wrapped at the
//! content width, one terminal row per visual line.

use crate::caret::{CaretSurface, LineGeometry};
use crate::edit_buffer::LocalEdit;
use crate::session::ItemId;

/// A visual row: character offset of its first char and its length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Row {
    pub start: usize,
    pub len: usize,
}

/// Splits `text` into rows of at most `width` chars. A newline ends a row
/// and is not part of any row.
pub fn wrap_rows(text: &str, width: usize) -> Vec<Row> {
    let width = width.max(1);
    let mut rows = Vec::new();
    let mut start = 0;
    let mut len = 0;
    for (i, ch) in text.chars().enumerate() {
        if ch == '\n' {
            rows.push(Row { start, len });
            start = i + 1;
            len = 0;
            continue;
        }
        if len == width {
            rows.push(Row { start, len });
            start = i;
            len = 0;
        }
        len += 1;
    }
    rows.push(Row { start, len });
    rows
}

/// Row and column of a caret offset. An offset on a wrap boundary belongs
/// to the row it starts.
pub fn caret_row_col(rows: &[Row], offset: usize) -> (usize, usize) {
    let row = rows.iter().rposition(|r| r.start <= offset).unwrap_or(0);
    let start = rows.get(row).map(|r| r.start).unwrap_or(0);
    (row, offset.saturating_sub(start))
}

/// The live editor of the focused item, seen through its wrapped layout.
pub struct TerminalCaret<'a> {
    edit: &'a mut LocalEdit,
    width: usize,
}

impl<'a> TerminalCaret<'a> {
    pub fn new(edit: &'a mut LocalEdit, width: usize) -> Self {
        Self { edit, width }
    }

    fn rows(&self) -> Vec<Row> {
        wrap_rows(&self.edit.buffer.text(), self.width)
    }

    fn geometry(&self) -> LineGeometry {
        let rows = self.rows();
        let (row, _) = caret_row_col(&rows, self.edit.buffer.cursor);
        LineGeometry {
            caret_top: row as f32,
            caret_bottom: row as f32 + 1.0,
            block_top: 0.0,
            block_bottom: rows.len() as f32,
            line_height: 1.0,
        }
    }

    fn owns(&self, item: &ItemId) -> bool {
        &self.edit.item == item
    }

    /// Moves one visual row up or down inside the item, keeping the column
    /// where the target row is long enough.
    pub fn move_vertical(&mut self, up: bool) {
        let rows = self.rows();
        let (row, col) = caret_row_col(&rows, self.edit.buffer.cursor);
        let target = if up {
            match row.checked_sub(1) {
                Some(r) => r,
                None => return,
            }
        } else if row + 1 < rows.len() {
            row + 1
        } else {
            return;
        };
        let dest = rows[target];
        self.edit.buffer.set_cursor(dest.start + col.min(dest.len));
    }
}

impl CaretSurface for TerminalCaret<'_> {
    fn caret_offset(&self, item: &ItemId) -> usize {
        if self.owns(item) {
            self.edit.buffer.cursor
        } else {
            0
        }
    }

    fn caret_x(&self, item: &ItemId) -> f32 {
        if !self.owns(item) {
            return 0.0;
        }
        let rows = self.rows();
        caret_row_col(&rows, self.edit.buffer.cursor).1 as f32
    }

    fn caret_on_first_line(&self, item: &ItemId) -> bool {
        !self.owns(item) || self.geometry().is_first_line()
    }

    fn caret_on_last_line(&self, item: &ItemId) -> bool {
        !self.owns(item) || self.geometry().is_last_line()
    }

    fn content_len(&self, item: &ItemId) -> usize {
        if self.owns(item) {
            self.edit.buffer.len()
        } else {
            0
        }
    }

    fn place_caret_at_offset(&mut self, item: &ItemId, offset: usize) {
        if self.owns(item) {
            self.edit.buffer.set_cursor(offset);
        }
    }

    fn place_caret_at_point(&mut self, item: &ItemId, x: f32, from_top: bool) {
        if !self.owns(item) {
            return;
        }
        let rows = self.rows();
        let row = if from_top {
            rows.first()
        } else {
            rows.last()
        };
        if let Some(row) = row.copied() {
            let col = (x.max(0.0).round() as usize).min(row.len);
            self.edit.buffer.set_cursor(row.start + col);
        }
    }
}
