mod actions;
mod input;
mod state;
pub mod surface;
mod tasks;
pub use state::*;

use actions::{handle_action, open_document, save_current, OpenAs};
use input::{handle_paste, handle_session_key};
use tasks::{dispatch, spawn_list, SharedStore};

use std::sync::Arc;
use std::time::Duration;

use crossterm::event::{Event, EventStream, KeyEventKind};
use futures::StreamExt;
use ratatui::DefaultTerminal;
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::config::AppConfig;
use crate::error::{ErrorPopup, Result};
use crate::keys::KeybindingMap;
use crate::store::JsonStore;

/// Keys the editor session owns, shown under the configurable bindings.
const SESSION_HELP: &[(&str, &str)] = &[
    ("Enter", "split block / open selection"),
    ("Shift+Enter", "line break"),
    ("Esc", "select block"),
    ("↑ ↓", "move between blocks"),
    ("Shift+↑ ↓", "extend selection"),
    ("Ctrl+Shift+↑ ↓", "move block"),
    ("Tab Shift+Tab", "indent / outdent"),
    ("Ctrl+Enter", "toggle todo / fold heading"),
    ("Ctrl+c x v", "copy / cut / paste"),
    ("Ctrl+a", "select all"),
    ("$ title Enter", "create task"),
];

fn handle_message(
    state: &mut AppState,
    msg: AppMessage,
    keybindings: &KeybindingMap,
    autosave_ticks: u32,
    store: &SharedStore,
    tx: &mpsc::UnboundedSender<AppMessage>,
) -> Option<StoreRequest> {
    match msg {
        AppMessage::Key(key) => {
            if state.error_popup.is_some() {
                state.error_popup = None;
                None
            } else if state.show_help {
                // Any key closes help
                state.show_help = false;
                None
            } else if let Some(action) = keybindings.resolve(&key) {
                handle_action(state, action, store, tx)
            } else {
                handle_session_key(state, &key)
            }
        }
        AppMessage::Paste(text) => {
            if state.error_popup.is_some() || state.show_help {
                return None;
            }
            handle_paste(state, &text)
        }
        AppMessage::Resize => None,
        AppMessage::DocumentsListed(mut docs) => {
            // The store lists most recently updated first.
            let recent = docs.first().map(|d| d.id.clone());
            docs.sort_by(|a, b| a.title.cmp(&b.title));
            state.documents = docs;
            if state.session.is_some() {
                return None;
            }
            match recent {
                Some(id) => Some(StoreRequest::Load(id)),
                None => {
                    info!("store is empty, creating a first document");
                    Some(StoreRequest::Create {
                        title: "Untitled".into(),
                    })
                }
            }
        }
        AppMessage::DocumentLoaded(doc) => {
            open_document(state, doc, OpenAs::Existing, store, tx);
            None
        }
        AppMessage::DocumentCreated(doc) => {
            open_document(state, doc, OpenAs::Fresh, store, tx);
            None
        }
        AppMessage::SiblingCreated(doc) => {
            open_document(state, doc, OpenAs::Task, store, tx);
            None
        }
        AppMessage::Saved(id) => {
            debug!(id = %id, "save confirmed");
            None
        }
        AppMessage::StoreError(err) => {
            state.loading = false;
            state.status_message = None;
            state.error_popup = Some(ErrorPopup::from_error_info(&err));
            None
        }
        AppMessage::Tick => {
            if state.dirty {
                state.idle_ticks += 1;
                if state.idle_ticks >= autosave_ticks {
                    save_current(state, store, tx);
                }
            }
            None
        }
    }
}

pub async fn run(config: &AppConfig, terminal: &mut DefaultTerminal) -> Result<()> {
    let keybindings =
        KeybindingMap::from_preset(&config.keybindings.preset, &config.keybindings.bindings)?;

    let mut help = keybindings.help();
    help.extend(SESSION_HELP.iter().map(|(key, label)| (key.to_string(), *label)));
    let mut state = AppState::new(keybindings.hints(), help);
    state.prefixes = config.prefix_table()?;
    state.viewport_width = config.editor.wrap_width;
    let autosave_ticks = config.autosave_ticks();

    let store_dir = config.store_dir();
    let store: SharedStore = Arc::new(JsonStore::open(&store_dir)?);
    info!(dir = %store_dir.display(), "document store opened");

    let (tx, mut rx) = mpsc::unbounded_channel::<AppMessage>();

    spawn_list(&store, &tx);

    // Spawn event reader task
    let event_tx = tx.clone();
    tokio::spawn(async move {
        let mut reader = EventStream::new();
        loop {
            let msg = match reader.next().await {
                Some(Ok(Event::Key(key))) if key.kind == KeyEventKind::Press => AppMessage::Key(key),
                Some(Ok(Event::Paste(text))) => AppMessage::Paste(text),
                Some(Ok(Event::Resize(_, _))) => AppMessage::Resize,
                Some(Err(_)) | None => break,
                _ => continue,
            };
            if event_tx.send(msg).is_err() {
                break;
            }
        }
    });

    // Spawn tick timer
    let tick_tx = tx.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_millis(250));
        loop {
            interval.tick().await;
            if tick_tx.send(AppMessage::Tick).is_err() {
                break;
            }
        }
    });

    // Main loop
    loop {
        state.viewport_width = terminal.size()?.width;
        terminal.draw(|frame| crate::ui::render(frame, &state))?;

        if let Some(msg) = rx.recv().await {
            if let Some(request) = handle_message(&mut state, msg, &keybindings, autosave_ticks, &store, &tx) {
                dispatch(request, &store, &tx);
            }
        }

        if state.should_quit {
            break;
        }
    }

    info!("blockpad exiting");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorInfo;
    use crate::store::{Document, DocumentStore};
    use chrono::Utc;
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
    use std::collections::HashMap;
    use tempfile::TempDir;

    struct Harness {
        _tmp: TempDir,
        store: SharedStore,
        tx: mpsc::UnboundedSender<AppMessage>,
        rx: mpsc::UnboundedReceiver<AppMessage>,
        keys: KeybindingMap,
        state: AppState,
    }

    impl Harness {
        fn new() -> Self {
            let tmp = TempDir::new().unwrap();
            let store: SharedStore = Arc::new(JsonStore::open(tmp.path()).unwrap());
            let (tx, rx) = mpsc::unbounded_channel();
            let keys = KeybindingMap::from_preset("standard", &HashMap::new()).unwrap();
            Self {
                _tmp: tmp,
                store,
                tx,
                rx,
                state: AppState::new(keys.hints(), keys.help()),
                keys,
            }
        }

        fn send(&mut self, msg: AppMessage) -> Option<StoreRequest> {
            handle_message(&mut self.state, msg, &self.keys, 4, &self.store, &self.tx)
        }

        fn key(&mut self, code: KeyCode, modifiers: KeyModifiers) -> Option<StoreRequest> {
            self.send(AppMessage::Key(KeyEvent::new(code, modifiers)))
        }

        fn type_str(&mut self, text: &str) {
            for c in text.chars() {
                self.key(KeyCode::Char(c), KeyModifiers::NONE);
            }
        }

        /// Runs a store request the way the loop does and feeds back the reply.
        async fn complete(&mut self, request: StoreRequest) {
            dispatch(request, &self.store, &self.tx);
            if let Some(msg) = self.rx.recv().await {
                self.send(msg);
            }
        }
    }

    #[tokio::test]
    async fn empty_store_bootstraps_a_document() {
        let mut h = Harness::new();
        let request = h.send(AppMessage::DocumentsListed(Vec::new()));
        assert_eq!(
            request,
            Some(StoreRequest::Create {
                title: "Untitled".into()
            })
        );
        h.complete(request.unwrap()).await;
        assert!(h.state.session.is_some());
        assert!(h.state.local.is_some());
    }

    #[tokio::test]
    async fn listing_opens_most_recent_document() {
        let mut h = Harness::new();
        let old = Document::new("Zebra", None, Utc::now() - chrono::Duration::days(1));
        let new = Document::new("Apple", None, Utc::now());
        h.store.save(&old).unwrap();
        h.store.save(&new).unwrap();

        let listed = h.store.list().unwrap();
        let request = h.send(AppMessage::DocumentsListed(listed));
        assert_eq!(request, Some(StoreRequest::Load(new.id.clone())));
        let titles: Vec<&str> = h.state.documents.iter().map(|d| d.title.as_str()).collect();
        assert_eq!(titles, vec!["Apple", "Zebra"]);
    }

    #[tokio::test]
    async fn task_trigger_creates_and_opens_sibling() {
        let mut h = Harness::new();
        let project = h.store.create("Project", None).unwrap();
        let task = h.store.create("Task", Some(project.id.clone())).unwrap();
        h.send(AppMessage::DocumentLoaded(task));

        h.key(KeyCode::End, KeyModifiers::NONE);
        h.type_str("$ Write tests");
        let request = h.key(KeyCode::Enter, KeyModifiers::NONE).unwrap();
        h.complete(request).await;

        let session = h.state.session.as_ref().unwrap();
        assert_eq!(session.title(), "Write tests");
        assert_eq!(h.state.document.as_ref().unwrap().parent.as_deref(), Some(project.id.as_str()));
        assert_eq!(h.state.timer.active_task(), Some(session.doc_id()));
    }

    #[tokio::test]
    async fn undo_key_reverts_typing() {
        let mut h = Harness::new();
        let doc = h.store.create("Doc", None).unwrap();
        h.send(AppMessage::DocumentLoaded(doc));

        h.type_str("hello");
        h.key(KeyCode::Char('z'), KeyModifiers::CONTROL);
        let session = h.state.session.as_ref().unwrap();
        assert_eq!(session.blocks()[0].content, "");
        assert_eq!(h.state.local.as_ref().unwrap().buffer.text(), "");
    }

    #[tokio::test]
    async fn autosave_after_idle_ticks() {
        let mut h = Harness::new();
        let doc = h.store.create("Doc", None).unwrap();
        let id = doc.id.clone();
        h.send(AppMessage::DocumentLoaded(doc));
        h.type_str("draft");

        for _ in 0..3 {
            h.send(AppMessage::Tick);
        }
        assert!(h.state.dirty);
        h.send(AppMessage::Tick);
        assert!(!h.state.dirty);

        match h.rx.recv().await {
            Some(AppMessage::Saved(saved)) => assert_eq!(saved, id),
            _ => panic!("expected Saved"),
        }
        assert_eq!(h.store.load(&id).unwrap().blocks[0].content, "draft");
    }

    #[tokio::test]
    async fn popups_swallow_the_next_key() {
        let mut h = Harness::new();
        h.send(AppMessage::StoreError(ErrorInfo::Other("boom".into())));
        assert!(h.state.error_popup.is_some());
        h.key(KeyCode::Char('x'), KeyModifiers::NONE);
        assert!(h.state.error_popup.is_none());

        h.key(KeyCode::F(1), KeyModifiers::NONE);
        assert!(h.state.show_help);
        h.key(KeyCode::Char('x'), KeyModifiers::NONE);
        assert!(!h.state.show_help);
    }

    #[tokio::test]
    async fn quit_saves_inline() {
        let mut h = Harness::new();
        let doc = h.store.create("Doc", None).unwrap();
        let id = doc.id.clone();
        h.send(AppMessage::DocumentLoaded(doc));
        h.type_str("last words");
        h.key(KeyCode::Char('q'), KeyModifiers::CONTROL);

        assert!(h.state.should_quit);
        assert_eq!(h.store.load(&id).unwrap().blocks[0].content, "last words");
    }
}
