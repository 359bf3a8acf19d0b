//! Undo/redo over whole-document block snapshots.

use tracing::debug;

use crate::block::Block;

const MAX_ENTRIES: usize = 200;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditKind {
    /// Keystrokes into one block; consecutive ones share an entry.
    Typing { block_id: String },
    Structure,
}

#[derive(Debug, Clone)]
struct UndoEntry {
    blocks: Vec<Block>,
    kind: EditKind,
}

/// Blocks to install plus the generation the renderer must resync to.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub blocks: Vec<Block>,
    pub generation: u64,
}

#[derive(Debug, Default)]
pub struct History {
    undo_stack: Vec<UndoEntry>,
    redo_stack: Vec<UndoEntry>,
    generation: u64,
    sealed: bool,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Records `before`, the blocks as they were prior to a change.
    pub fn record(&mut self, before: &[Block], kind: EditKind) {
        let coalesce = !self.sealed
            && matches!(kind, EditKind::Typing { .. })
            && self.undo_stack.last().is_some_and(|e| e.kind == kind);
        self.redo_stack.clear();
        self.sealed = false;
        if coalesce {
            return;
        }
        self.undo_stack.push(UndoEntry {
            blocks: before.to_vec(),
            kind,
        });
        if self.undo_stack.len() > MAX_ENTRIES {
            self.undo_stack.remove(0);
        }
    }

    /// Ends the current typing run so the next keystroke starts a new entry.
    pub fn seal(&mut self) {
        self.sealed = true;
    }

    pub fn undo(&mut self, current: &[Block]) -> Option<Snapshot> {
        let entry = self.undo_stack.pop()?;
        self.redo_stack.push(UndoEntry {
            blocks: current.to_vec(),
            kind: entry.kind.clone(),
        });
        Some(self.advance(entry.blocks, "undo"))
    }

    pub fn redo(&mut self, current: &[Block]) -> Option<Snapshot> {
        let entry = self.redo_stack.pop()?;
        self.undo_stack.push(UndoEntry {
            blocks: current.to_vec(),
            kind: entry.kind.clone(),
        });
        Some(self.advance(entry.blocks, "redo"))
    }

    fn advance(&mut self, blocks: Vec<Block>, direction: &str) -> Snapshot {
        self.generation += 1;
        self.sealed = true;
        debug!(generation = self.generation, direction, "history moved");
        Snapshot {
            blocks,
            generation: self.generation,
        }
    }
}
