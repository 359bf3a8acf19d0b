use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::error::ErrorInfo;
use crate::store::{Document, DocumentStore};

use super::state::{AppMessage, StoreRequest};

pub(super) type SharedStore = Arc<dyn DocumentStore>;

pub(super) fn dispatch(request: StoreRequest, store: &SharedStore, tx: &mpsc::UnboundedSender<AppMessage>) {
    match request {
        StoreRequest::CreateSibling { of, title } => spawn_create_sibling(store, of, title, tx),
        StoreRequest::Create { title } => spawn_create(store, title, tx),
        StoreRequest::Load(id) => spawn_load(store, id, tx),
    }
}

pub(super) fn spawn_list(store: &SharedStore, tx: &mpsc::UnboundedSender<AppMessage>) {
    let store = Arc::clone(store);
    let tx = tx.clone();
    tokio::task::spawn_blocking(move || match store.list() {
        Ok(docs) => {
            let _ = tx.send(AppMessage::DocumentsListed(docs));
        }
        Err(e) => {
            warn!(error = %e, "listing documents failed");
            let _ = tx.send(AppMessage::StoreError(ErrorInfo::load("document list", &e)));
        }
    });
}

pub(super) fn spawn_load(store: &SharedStore, id: String, tx: &mpsc::UnboundedSender<AppMessage>) {
    let store = Arc::clone(store);
    let tx = tx.clone();
    tokio::task::spawn_blocking(move || match store.load(&id) {
        Ok(doc) => {
            let _ = tx.send(AppMessage::DocumentLoaded(doc));
        }
        Err(e) => {
            warn!(id = %id, error = %e, "loading document failed");
            let _ = tx.send(AppMessage::StoreError(ErrorInfo::load(&id, &e)));
        }
    });
}

pub(super) fn spawn_save(store: &SharedStore, doc: Document, tx: &mpsc::UnboundedSender<AppMessage>) {
    let store = Arc::clone(store);
    let tx = tx.clone();
    tokio::task::spawn_blocking(move || match store.save(&doc) {
        Ok(()) => {
            let _ = tx.send(AppMessage::Saved(doc.id));
        }
        Err(e) => {
            warn!(id = %doc.id, error = %e, "saving document failed");
            let _ = tx.send(AppMessage::StoreError(ErrorInfo::write(&doc.title, &e)));
        }
    });
}

fn spawn_create(store: &SharedStore, title: String, tx: &mpsc::UnboundedSender<AppMessage>) {
    let store = Arc::clone(store);
    let tx = tx.clone();
    tokio::task::spawn_blocking(move || match store.create(&title, None) {
        Ok(doc) => {
            let _ = tx.send(AppMessage::DocumentCreated(doc));
        }
        Err(e) => {
            warn!(title = %title, error = %e, "creating document failed");
            let _ = tx.send(AppMessage::StoreError(ErrorInfo::write(&title, &e)));
        }
    });
}

fn spawn_create_sibling(
    store: &SharedStore,
    of: String,
    title: String,
    tx: &mpsc::UnboundedSender<AppMessage>,
) {
    let store = Arc::clone(store);
    let tx = tx.clone();
    tokio::task::spawn_blocking(move || {
        match store.create_sibling(&of, &title).and_then(|id| store.load(&id)) {
            Ok(doc) => {
                info!(from = %of, task = %doc.id, title = %title, "task created from trigger");
                let _ = tx.send(AppMessage::SiblingCreated(doc));
            }
            Err(e) => {
                warn!(from = %of, error = %e, "creating task failed");
                let _ = tx.send(AppMessage::StoreError(ErrorInfo::write(&title, &e)));
            }
        }
    });
}
