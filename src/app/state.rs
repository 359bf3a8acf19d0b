use chrono::Utc;

use crate::edit_buffer::LocalEdit;
use crate::error::{ErrorInfo, ErrorPopup};
use crate::history::History;
use crate::markdown::PrefixTable;
use crate::session::EditorSession;
use crate::store::{Document, DocumentSummary};
use crate::time_tracking::TimeTracker;

pub enum AppMessage {
    Key(crossterm::event::KeyEvent),
    Paste(String),
    Resize,
    DocumentsListed(Vec<DocumentSummary>),
    DocumentLoaded(Document),
    /// A brand-new document from the new-document command.
    DocumentCreated(Document),
    /// A task created by the `$` trigger, next to the document it came from.
    SiblingCreated(Document),
    Saved(String),
    StoreError(ErrorInfo),
    Tick,
}

/// Store work the key handlers ask the loop to start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreRequest {
    CreateSibling { of: String, title: String },
    Create { title: String },
    Load(String),
}

pub struct AppState {
    pub session: Option<EditorSession>,
    /// Metadata of the open document; its `blocks` are refreshed from the
    /// session whenever a snapshot is taken.
    pub document: Option<Document>,
    pub local: Option<LocalEdit>,
    pub history: History,
    pub timer: TimeTracker,
    pub documents: Vec<DocumentSummary>,
    pub prefixes: PrefixTable,
    /// Text copied or cut from a selection; the terminal has no system
    /// clipboard we can read back.
    pub clipboard: Option<String>,
    pub viewport_width: u16,
    pub dirty: bool,
    pub idle_ticks: u32,
    pub loading: bool,
    pub status_message: Option<String>,
    pub hints: Vec<(String, &'static str)>,
    pub help: Vec<(String, &'static str)>,
    pub should_quit: bool,
    pub show_help: bool,
    pub error_popup: Option<ErrorPopup>,
}

impl AppState {
    pub fn new(hints: Vec<(String, &'static str)>, help: Vec<(String, &'static str)>) -> Self {
        Self {
            session: None,
            document: None,
            local: None,
            history: History::new(),
            timer: TimeTracker::new(),
            documents: Vec::new(),
            prefixes: PrefixTable::default(),
            clipboard: None,
            viewport_width: 80,
            dirty: false,
            idle_ticks: 0,
            loading: true,
            status_message: Some("Loading documents...".into()),
            hints,
            help,
            should_quit: false,
            show_help: false,
            error_popup: None,
        }
    }

    pub fn mark_dirty(&mut self) {
        self.dirty = true;
        self.idle_ticks = 0;
    }

    pub fn current_id(&self) -> Option<&str> {
        self.document.as_ref().map(|d| d.id.as_str())
    }

    /// The open document as it should be written to the store right now.
    pub fn snapshot(&self) -> Option<Document> {
        let session = self.session.as_ref()?;
        let mut doc = self.document.clone()?;
        doc.title = session.title().to_string();
        doc.blocks = session.blocks().to_vec();
        doc.updated_at = Utc::now();
        Some(doc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::Block;

    #[test]
    fn snapshot_takes_title_and_blocks_from_session() {
        let mut state = AppState::new(Vec::new(), Vec::new());
        let doc = Document::new("Old", None, Utc::now());
        state.session = Some(EditorSession::new(
            &doc.id,
            "New title",
            vec![Block::paragraph("1", "body")],
            PrefixTable::default(),
        ));
        state.document = Some(doc.clone());

        let snap = state.snapshot().unwrap();
        assert_eq!(snap.id, doc.id);
        assert_eq!(snap.title, "New title");
        assert_eq!(snap.blocks, vec![Block::paragraph("1", "body")]);
        assert!(snap.updated_at >= doc.updated_at);
    }

    #[test]
    fn snapshot_needs_an_open_document() {
        let state = AppState::new(Vec::new(), Vec::new());
        assert!(state.snapshot().is_none());
    }

    #[test]
    fn mark_dirty_resets_idle_ticks() {
        let mut state = AppState::new(Vec::new(), Vec::new());
        state.idle_ticks = 7;
        state.mark_dirty();
        assert!(state.dirty);
        assert_eq!(state.idle_ticks, 0);
    }
}
