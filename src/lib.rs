//! Block-structured document editing: block operations, markdown shortcuts,
//! keyboard focus and selection, clipboard, undo resync and task triggers.
//!
//! The engine is pure and synchronous. A front-end feeds it key events with
//! caret facts (`caret::CaretContext`) and renders whatever blocks and cursor
//! requests the `session::EditorSession` hands back.

pub mod block;
pub mod caret;
pub mod clipboard;
pub mod edit_buffer;
pub mod error;
pub mod history;
pub mod markdown;
pub mod ops;
pub mod session;
pub mod store;
pub mod time_tracking;
pub mod trigger;

// Convenience re-exports
pub use block::{Block, BlockType};
pub use error::{BlockpadError, Result};
pub use session::{EditorSession, Effect, FocusMode, ItemId, Reaction};
pub use store::{Document, DocumentStore, JsonStore};
