use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::block::{generate_id, Block};
use crate::error::{BlockpadError, Result};
use crate::time_tracking::TimeEntry;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    #[serde(default)]
    pub blocks: Vec<Block>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub time_entries: Vec<TimeEntry>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Document {
    /// A fresh document holding a single empty paragraph.
    pub fn new(title: &str, parent: Option<String>, now: DateTime<Utc>) -> Self {
        Self {
            id: generate_id(),
            title: title.to_string(),
            parent,
            blocks: vec![Block::paragraph(generate_id(), "")],
            time_entries: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn tracked_minutes(&self) -> i64 {
        self.time_entries.iter().map(|e| e.minutes).sum()
    }

    pub fn summary(&self) -> DocumentSummary {
        DocumentSummary {
            id: self.id.clone(),
            title: self.title.clone(),
            parent: self.parent.clone(),
            updated_at: self.updated_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DocumentSummary {
    pub id: String,
    pub title: String,
    pub parent: Option<String>,
    pub updated_at: DateTime<Utc>,
}

pub trait DocumentStore: Send + Sync {
    fn load(&self, id: &str) -> Result<Document>;
    fn save(&self, doc: &Document) -> Result<()>;
    /// Every stored document, most recently updated first.
    fn list(&self) -> Result<Vec<DocumentSummary>>;

    fn create(&self, title: &str, parent: Option<String>) -> Result<Document> {
        let doc = Document::new(title, parent, Utc::now());
        self.save(&doc)?;
        info!(id = %doc.id, title, "document created");
        Ok(doc)
    }

    /// Creates a document next to `of` (same parent) and returns its id.
    fn create_sibling(&self, of: &str, title: &str) -> Result<String> {
        let parent = self.load(of)?.parent;
        Ok(self.create(title, parent)?.id)
    }

    fn append_time_entry(&self, entry: &TimeEntry) -> Result<()> {
        let mut doc = self.load(&entry.task_id)?;
        doc.time_entries.push(entry.clone());
        doc.updated_at = Utc::now();
        self.save(&doc)
    }
}

/// One pretty-printed JSON file per document.
#[derive(Debug, Clone)]
pub struct JsonStore {
    dir: PathBuf,
}

impl JsonStore {
    pub fn open(dir: &Path) -> Result<Self> {
        fs::create_dir_all(dir)?;
        Ok(Self {
            dir: dir.to_path_buf(),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, id: &str) -> Result<PathBuf> {
        let valid = !id.is_empty()
            && id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(BlockpadError::NotFound(id.to_string()));
        }
        Ok(self.dir.join(format!("{}.json", id)))
    }
}

impl DocumentStore for JsonStore {
    fn load(&self, id: &str) -> Result<Document> {
        let path = self.path_for(id)?;
        if !path.exists() {
            return Err(BlockpadError::NotFound(id.to_string()));
        }
        let raw = fs::read_to_string(&path)?;
        let mut doc: Document = serde_json::from_str(&raw)?;
        if doc.blocks.is_empty() {
            doc.blocks.push(Block::paragraph(generate_id(), ""));
        }
        debug!(id, blocks = doc.blocks.len(), "document loaded");
        Ok(doc)
    }

    fn save(&self, doc: &Document) -> Result<()> {
        let path = self.path_for(&doc.id)?;
        let tmp = path.with_extension("json.tmp");
        let body = serde_json::to_string_pretty(doc)?;
        fs::write(&tmp, body)?;
        fs::rename(&tmp, &path)?;
        debug!(id = %doc.id, "document saved");
        Ok(())
    }

    fn list(&self) -> Result<Vec<DocumentSummary>> {
        let mut out = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let parsed = fs::read_to_string(&path)
                .map_err(BlockpadError::from)
                .and_then(|raw| serde_json::from_str::<Document>(&raw).map_err(BlockpadError::from));
            match parsed {
                Ok(doc) => out.push(doc.summary()),
                Err(e) => warn!(path = %path.display(), error = %e, "skipping unreadable document"),
            }
        }
        out.sort_by(|a, b| b.updated_at.cmp(&a.updated_at).then_with(|| a.title.cmp(&b.title)));
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::BlockType;
    use chrono::{Duration, TimeZone};
    use tempfile::TempDir;

    fn store() -> (TempDir, JsonStore) {
        let tmp = TempDir::new().unwrap();
        let store = JsonStore::open(&tmp.path().join("docs")).unwrap();
        (tmp, store)
    }

    #[test]
    fn save_then_load() {
        let (_tmp, store) = store();
        let mut doc = Document::new("Groceries", None, Utc::now());
        doc.blocks = vec![
            Block::new("b1", BlockType::H1, "List"),
            Block::new("b2", BlockType::Bullet, "eggs").with_level(1),
        ];
        store.save(&doc).unwrap();
        let loaded = store.load(&doc.id).unwrap();
        assert_eq!(loaded, doc);
    }

    #[test]
    fn json_uses_type_field_in_kebab_case() {
        let (_tmp, store) = store();
        let mut doc = Document::new("T", None, Utc::now());
        doc.blocks = vec![Block::new("b1", BlockType::TodoChecked, "done")];
        store.save(&doc).unwrap();
        let raw = fs::read_to_string(store.dir().join(format!("{}.json", doc.id))).unwrap();
        assert!(raw.contains(r#""type": "todo-checked""#));
    }

    #[test]
    fn missing_document_is_not_found() {
        let (_tmp, store) = store();
        let err = store.load("nope").unwrap_err();
        assert!(matches!(err, BlockpadError::NotFound(_)));
    }

    #[test]
    fn ids_cannot_escape_store_dir() {
        let (_tmp, store) = store();
        assert!(matches!(store.load("../etc/passwd"), Err(BlockpadError::NotFound(_))));
    }

    #[test]
    fn loading_empty_document_restores_one_block() {
        let (_tmp, store) = store();
        let mut doc = Document::new("Empty", None, Utc::now());
        doc.blocks.clear();
        store.save(&doc).unwrap();
        assert_eq!(store.load(&doc.id).unwrap().blocks.len(), 1);
    }

    #[test]
    fn list_orders_by_recent_update_and_skips_garbage() {
        let (_tmp, store) = store();
        let t = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        let old = Document::new("old", None, t);
        let new = Document::new("new", None, t + Duration::hours(1));
        store.save(&old).unwrap();
        store.save(&new).unwrap();
        fs::write(store.dir().join("broken.json"), "{").unwrap();
        fs::write(store.dir().join("notes.txt"), "ignored").unwrap();

        let titles: Vec<String> = store.list().unwrap().into_iter().map(|s| s.title).collect();
        assert_eq!(titles, vec!["new", "old"]);
    }

    #[test]
    fn create_sibling_shares_parent() {
        let (_tmp, store) = store();
        let project = store.create("Project", None).unwrap();
        let task = store.create("Task one", Some(project.id.clone())).unwrap();

        let sibling_id = store.create_sibling(&task.id, "Buy milk").unwrap();
        let sibling = store.load(&sibling_id).unwrap();
        assert_eq!(sibling.title, "Buy milk");
        assert_eq!(sibling.parent.as_deref(), Some(project.id.as_str()));
        assert_eq!(sibling.blocks.len(), 1);
        assert_eq!(sibling.blocks[0].kind, BlockType::Paragraph);
    }

    #[test]
    fn create_sibling_of_unknown_fails() {
        let (_tmp, store) = store();
        assert!(store.create_sibling("ghost", "x").is_err());
    }

    #[test]
    fn time_entries_accumulate() {
        let (_tmp, store) = store();
        let task = store.create("Task", None).unwrap();
        for minutes in [5, 20] {
            store
                .append_time_entry(&TimeEntry {
                    task_id: task.id.clone(),
                    started_at: Utc::now(),
                    minutes,
                })
                .unwrap();
        }
        assert_eq!(store.load(&task.id).unwrap().tracked_minutes(), 25);
    }
}
