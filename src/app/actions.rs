use chrono::Utc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::caret::CursorTarget;
use crate::history::History;
use crate::keys::preset::Action;
use crate::session::{EditorSession, ItemId};
use crate::store::{Document, DocumentStore};
use crate::time_tracking::TimeEntry;

use super::input::sync_local;
use super::state::{AppMessage, AppState, StoreRequest};
use super::tasks::{spawn_save, SharedStore};

const NEW_DOCUMENT_TITLE: &str = "Untitled";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum OpenAs {
    Existing,
    Fresh,
    /// Created by the `$` trigger; the timer moves to it.
    Task,
}

pub(super) fn handle_action(
    state: &mut AppState,
    action: &Action,
    store: &SharedStore,
    tx: &mpsc::UnboundedSender<AppMessage>,
) -> Option<StoreRequest> {
    match action {
        Action::Quit => {
            finalize(state, store.as_ref());
            state.should_quit = true;
            None
        }
        Action::Undo => {
            apply_undo(state);
            None
        }
        Action::Redo => {
            apply_redo(state);
            None
        }
        Action::Save => {
            if state.dirty {
                save_current(state, store, tx);
                state.status_message = Some("Saved".into());
            } else {
                state.status_message = Some("Nothing to save".into());
            }
            None
        }
        Action::Help => {
            state.show_help = true;
            None
        }
        Action::NewDocument => Some(StoreRequest::Create {
            title: NEW_DOCUMENT_TITLE.into(),
        }),
        Action::NextDocument => neighbour(state, true).map(StoreRequest::Load),
        Action::PrevDocument => neighbour(state, false).map(StoreRequest::Load),
        Action::ToggleTimer => {
            toggle_timer(state, store.as_ref());
            None
        }
    }
}

pub(super) fn apply_undo(state: &mut AppState) {
    let Some(session) = state.session.as_mut() else {
        return;
    };
    match state.history.undo(session.blocks()) {
        Some(snapshot) => {
            session.apply_history(snapshot.blocks, snapshot.generation);
            state.mark_dirty();
            sync_local(state);
        }
        None => state.status_message = Some("Nothing to undo".into()),
    }
}

pub(super) fn apply_redo(state: &mut AppState) {
    let Some(session) = state.session.as_mut() else {
        return;
    };
    match state.history.redo(session.blocks()) {
        Some(snapshot) => {
            session.apply_history(snapshot.blocks, snapshot.generation);
            state.mark_dirty();
            sync_local(state);
        }
        None => state.status_message = Some("Nothing to redo".into()),
    }
}

/// Writes the open document in the background if it has unsaved changes.
pub(super) fn save_current(state: &mut AppState, store: &SharedStore, tx: &mpsc::UnboundedSender<AppMessage>) {
    if !state.dirty {
        return;
    }
    let Some(doc) = state.snapshot() else {
        return;
    };
    if let Some(summary) = state.documents.iter_mut().find(|d| d.id == doc.id) {
        summary.title = doc.title.clone();
        summary.updated_at = doc.updated_at;
    }
    state.document = Some(doc.clone());
    state.dirty = false;
    state.idle_ticks = 0;
    spawn_save(store, doc, tx);
}

/// Last write before the process exits. Runs inline so nothing is lost
/// when the runtime shuts down.
fn finalize(state: &mut AppState, store: &dyn DocumentStore) {
    if let Some(entry) = state.timer.stop(Utc::now()) {
        record_entry(state, entry, store);
    }
    if !state.dirty {
        return;
    }
    if let Some(doc) = state.snapshot() {
        match store.save(&doc) {
            Ok(()) => {
                state.dirty = false;
                debug!(id = %doc.id, "saved on quit");
            }
            Err(e) => warn!(id = %doc.id, error = %e, "save on quit failed"),
        }
    }
}

/// The open document keeps its entries in memory until the next save;
/// any other task gets the entry appended in the store directly.
fn record_entry(state: &mut AppState, entry: TimeEntry, store: &dyn DocumentStore) {
    info!(task = %entry.task_id, minutes = entry.minutes, "time logged");
    match state.document.as_mut() {
        Some(doc) if doc.id == entry.task_id => {
            doc.time_entries.push(entry);
            state.mark_dirty();
        }
        _ => {
            if let Err(e) = store.append_time_entry(&entry) {
                warn!(task = %entry.task_id, error = %e, "time entry could not be stored");
            }
        }
    }
}

fn toggle_timer(state: &mut AppState, store: &dyn DocumentStore) {
    let Some(id) = state.current_id().map(str::to_string) else {
        return;
    };
    let now = Utc::now();
    if state.timer.active_task() == Some(id.as_str()) {
        match state.timer.stop(now) {
            Some(entry) => {
                state.status_message = Some(format!("Logged {} min", entry.minutes));
                record_entry(state, entry, store);
            }
            None => state.status_message = Some("Timer stopped (under a minute, not logged)".into()),
        }
    } else {
        if let Some(entry) = state.timer.switch_to(&id, now) {
            record_entry(state, entry, store);
        }
        state.status_message = Some("Timer started".into());
    }
}

fn neighbour(state: &mut AppState, forward: bool) -> Option<String> {
    let current = state.current_id()?;
    let len = state.documents.len();
    let idx = state.documents.iter().position(|d| d.id == current)?;
    if len < 2 {
        state.status_message = Some("No other documents".into());
        return None;
    }
    let next = if forward { (idx + 1) % len } else { (idx + len - 1) % len };
    state.documents.get(next).map(|d| d.id.clone())
}

/// Replaces the open document. The one being left is saved first and a
/// running timer follows the user to the new document.
pub(super) fn open_document(
    state: &mut AppState,
    doc: Document,
    open_as: OpenAs,
    store: &SharedStore,
    tx: &mpsc::UnboundedSender<AppMessage>,
) {
    let now = Utc::now();
    let timer_running = state.timer.active_task().is_some();
    if state.current_id() != Some(doc.id.as_str()) {
        if let Some(entry) = state.timer.stop(now) {
            record_entry(state, entry, store.as_ref());
        }
        save_current(state, store, tx);
    }

    let session = match open_as {
        OpenAs::Existing => {
            let mut session = EditorSession::new(&doc.id, &doc.title, doc.blocks.clone(), state.prefixes.clone());
            if let Some(first) = session.visible_blocks().first().map(|b| b.id.clone()) {
                session.focus_editing(ItemId::Block(first), CursorTarget::End);
            }
            session
        }
        OpenAs::Fresh | OpenAs::Task => EditorSession::seeded(&doc.id, &doc.title, state.prefixes.clone()),
    };
    info!(id = %doc.id, title = %doc.title, "document opened");

    if timer_running || open_as == OpenAs::Task {
        if let Some(entry) = state.timer.switch_to(&doc.id, now) {
            record_entry(state, entry, store.as_ref());
        }
    }
    if !state.documents.iter().any(|d| d.id == doc.id) {
        state.documents.push(doc.summary());
        state.documents.sort_by(|a, b| a.title.cmp(&b.title));
    }

    state.status_message = match open_as {
        OpenAs::Task => Some(format!("Created task: {}", doc.title)),
        _ => None,
    };
    state.session = Some(session);
    state.document = Some(doc);
    state.history = History::new();
    state.local = None;
    state.loading = false;
    state.dirty = false;
    if open_as != OpenAs::Existing {
        // the seeded paragraph is not in the store yet
        state.mark_dirty();
    }
    sync_local(state);
}
