//! Routes editing keys and pastes through the session, and performs the
//! ordinary text editing the session leaves to the renderer.

use crossterm::event::KeyEvent;
use tracing::debug;

use crate::block::Block;
use crate::caret::{apply_cursor_target, caret_context, CaretContext, CursorTarget};
use crate::edit_buffer::{EditBuffer, LocalEdit};
use crate::history::EditKind;
use crate::keys::session_input;
use crate::session::{EditorSession, Effect, FocusMode, ItemId, Key, KeyInput, Reaction};
use crate::ui::main_area::item_width;

use super::state::{AppState, StoreRequest};
use super::surface::TerminalCaret;

fn item_text(session: &EditorSession, item: &ItemId) -> String {
    match item {
        ItemId::Title(_) => session.title().to_string(),
        ItemId::Block(id) => session.block(id).map(|b| b.content.clone()).unwrap_or_default(),
    }
}

fn focused_width(state: &AppState, item: &ItemId) -> usize {
    match &state.session {
        Some(session) => item_width(session, item, state.viewport_width),
        None => 1,
    }
}

/// Caret facts for the focused item, read from the live editor.
fn current_caret(state: &mut AppState) -> CaretContext {
    let Some(item) = state.local.as_ref().map(|l| l.item.clone()) else {
        return CaretContext::single_line(0);
    };
    let width = focused_width(state, &item);
    match state.local.as_mut() {
        Some(local) => caret_context(&TerminalCaret::new(local, width), &item),
        None => CaretContext::single_line(0),
    }
}

/// Brings the live editor in line with the session after anything changed:
/// follows focus, reloads stale text and applies a pending cursor request.
pub(super) fn sync_local(state: &mut AppState) {
    let editing = state
        .session
        .as_ref()
        .and_then(|s| s.focus().filter(|_| s.mode() == FocusMode::Editing).cloned());
    let Some(item) = editing else {
        state.local = None;
        return;
    };
    let width = focused_width(state, &item);
    let Some(session) = state.session.as_mut() else {
        return;
    };
    let text = item_text(session, &item);
    let generation = session.undo_generation();

    match state.local.as_mut() {
        Some(local) if local.item == item => {
            if !local.reconcile(generation, &text) && local.buffer.text() != text {
                let cursor = local.buffer.cursor;
                local.buffer = EditBuffer::new(&text);
                local.buffer.set_cursor(cursor);
            }
        }
        _ => state.local = Some(LocalEdit::new(item.clone(), &text, generation)),
    }

    if let (Some(target), Some(local)) = (session.take_cursor_request(&item), state.local.as_mut()) {
        apply_cursor_target(&mut TerminalCaret::new(local, width), &item, target);
    }
}

/// Applies a session reaction: history, dirty flag, clipboard and any store
/// work it asks for.
fn finish(state: &mut AppState, before: Vec<Block>, reaction: Reaction, kind: EditKind) -> Option<StoreRequest> {
    let mut request = None;
    for effect in reaction.effects {
        match effect {
            Effect::BlocksChanged => {
                state.history.record(&before, kind.clone());
                state.mark_dirty();
            }
            Effect::TitleChanged => state.mark_dirty(),
            Effect::CopyToClipboard(text) => {
                let count = text.lines().count();
                state.status_message = Some(format!("Copied {} block(s)", count));
                state.clipboard = Some(text);
            }
            Effect::CreateSibling { title } => {
                if let Some(of) = state.current_id() {
                    request = Some(StoreRequest::CreateSibling {
                        of: of.to_string(),
                        title,
                    });
                }
            }
        }
    }
    sync_local(state);
    request
}

/// Nothing focused: arrows and Enter pick an item the way a click would.
fn focus_from_idle(session: &mut EditorSession, input: KeyInput) {
    let first = session.visible_blocks().first().map(|b| b.id.clone());
    match (input.key, first) {
        (Key::Up, _) => {
            let title = ItemId::Title(session.doc_id().to_string());
            session.focus_editing(title, CursorTarget::End);
        }
        (Key::Down | Key::Enter, Some(id)) => {
            session.focus_editing(ItemId::Block(id), CursorTarget::Start);
        }
        _ => {}
    }
}

pub(super) fn handle_session_key(state: &mut AppState, key: &KeyEvent) -> Option<StoreRequest> {
    let input = session_input(key)?;
    state.status_message = None;

    let unfocused = state.session.as_ref()?.focus().is_none();
    if unfocused {
        if let Some(session) = state.session.as_mut() {
            focus_from_idle(session, input);
        }
        sync_local(state);
        return None;
    }

    if input == KeyInput::primary(Key::Char('v')) {
        let text = state.clipboard.clone()?;
        return handle_paste(state, &text);
    }

    let caret = current_caret(state);
    let session = state.session.as_mut()?;
    let before = session.blocks().to_vec();
    let reaction = session.handle_key(input, &caret);
    if reaction.intercepted {
        return finish(state, before, reaction, EditKind::Structure);
    }
    edit_locally(state, input)
}

/// Ordinary editing inside the focused item.
fn edit_locally(state: &mut AppState, input: KeyInput) -> Option<StoreRequest> {
    let item = state.local.as_ref()?.item.clone();
    let width = focused_width(state, &item);
    let local = state.local.as_mut()?;
    let m = input.modifiers;
    let before = local.buffer.text();

    match input.key {
        Key::Char(c) if !m.primary => local.buffer.insert_char(c),
        Key::Enter if m.shift && item.block_id().is_some() => local.buffer.insert_char('\n'),
        Key::Backspace => local.buffer.delete_back(),
        Key::Delete => local.buffer.delete_forward(),
        Key::Left if m.alt || m.primary => local.buffer.move_word_left(),
        Key::Right if m.alt || m.primary => local.buffer.move_word_right(),
        Key::Left => local.buffer.move_left(),
        Key::Right => local.buffer.move_right(),
        Key::Home => local.buffer.move_home(),
        Key::End => local.buffer.move_end(),
        Key::Up | Key::Down => TerminalCaret::new(local, width).move_vertical(input.key == Key::Up),
        _ => return None,
    }

    let text = local.buffer.text();
    if text == before {
        return None;
    }
    commit_text(state, &item, &text)
}

fn commit_text(state: &mut AppState, item: &ItemId, text: &str) -> Option<StoreRequest> {
    let session = state.session.as_mut()?;
    let before = session.blocks().to_vec();
    let reaction = session.input(item, text);

    let kind = match item.block_id() {
        Some(id) => {
            let was = before.iter().find(|b| b.id == id).map(|b| b.kind);
            let now = session.block(id).map(|b| b.kind);
            if was == now && before.len() == session.blocks().len() {
                EditKind::Typing {
                    block_id: id.to_string(),
                }
            } else {
                EditKind::Structure
            }
        }
        None => EditKind::Structure,
    };
    finish(state, before, reaction, kind)
}

/// Bracketed paste from the terminal, or the internal clipboard.
pub(super) fn handle_paste(state: &mut AppState, text: &str) -> Option<StoreRequest> {
    let has_focus = state.session.as_ref()?.focus().is_some();
    if !has_focus || text.is_empty() {
        return None;
    }
    let caret = current_caret(state);
    let session = state.session.as_mut()?;
    let before = session.blocks().to_vec();
    let reaction = session.paste(text, &caret);
    if reaction.intercepted {
        debug!(chars = text.chars().count(), "multi-line paste");
        return finish(state, before, reaction, EditKind::Structure);
    }

    let local = state.local.as_mut()?;
    let item = local.item.clone();
    let single_line: String = text.chars().filter(|c| *c != '\n').collect();
    local.buffer.insert_str(&single_line);
    let updated = local.buffer.text();
    commit_text(state, &item, &updated)
}
