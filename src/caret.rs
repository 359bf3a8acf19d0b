//! The contract a rendering layer fulfils so the session never touches
//! layout: it reports whether the caret sits on the first or last visual
//! line of an item, and it can place the caret from an offset or a point.

use crate::session::ItemId;

/// Where the caret should land the next time an item is rendered.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CursorTarget {
    /// Character offset into the item's content.
    Offset(usize),
    /// Horizontal position on the first (`from_top`) or last visual line.
    Point { x: f32, from_top: bool },
    Start,
    End,
}

/// Vertical extents used to decide whether the caret is on an edge line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineGeometry {
    pub caret_top: f32,
    pub caret_bottom: f32,
    pub block_top: f32,
    pub block_bottom: f32,
    pub line_height: f32,
}

impl LineGeometry {
    pub fn is_first_line(&self) -> bool {
        self.caret_top - self.block_top < self.line_height
    }

    pub fn is_last_line(&self) -> bool {
        self.block_bottom - self.caret_bottom < self.line_height
    }
}

/// Caret facts handed to the session along with a key event.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CaretContext {
    pub offset: usize,
    pub x: f32,
    pub on_first_line: bool,
    pub on_last_line: bool,
}

impl CaretContext {
    /// Caret in content that fits on a single line.
    pub fn single_line(offset: usize) -> Self {
        Self {
            offset,
            x: offset as f32,
            on_first_line: true,
            on_last_line: true,
        }
    }
}

pub trait CaretSurface {
    fn caret_offset(&self, item: &ItemId) -> usize;
    fn caret_x(&self, item: &ItemId) -> f32;
    fn caret_on_first_line(&self, item: &ItemId) -> bool;
    fn caret_on_last_line(&self, item: &ItemId) -> bool;
    fn content_len(&self, item: &ItemId) -> usize;
    fn place_caret_at_offset(&mut self, item: &ItemId, offset: usize);
    fn place_caret_at_point(&mut self, item: &ItemId, x: f32, from_top: bool);
}

pub fn caret_context<S: CaretSurface + ?Sized>(surface: &S, item: &ItemId) -> CaretContext {
    CaretContext {
        offset: surface.caret_offset(item),
        x: surface.caret_x(item),
        on_first_line: surface.caret_on_first_line(item),
        on_last_line: surface.caret_on_last_line(item),
    }
}

pub fn apply_cursor_target<S: CaretSurface + ?Sized>(surface: &mut S, item: &ItemId, target: CursorTarget) {
    match target {
        CursorTarget::Offset(offset) => {
            let offset = offset.min(surface.content_len(item));
            surface.place_caret_at_offset(item, offset);
        }
        CursorTarget::Point { x, from_top } => surface.place_caret_at_point(item, x, from_top),
        CursorTarget::Start => surface.place_caret_at_offset(item, 0),
        CursorTarget::End => {
            let len = surface.content_len(item);
            surface.place_caret_at_offset(item, len);
        }
    }
}
