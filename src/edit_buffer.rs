use crate::session::ItemId;

#[derive(Debug, Clone, PartialEq)]
pub struct EditBuffer {
    pub chars: Vec<char>,
    pub cursor: usize,
}

impl EditBuffer {
    pub fn new(text: &str) -> Self {
        let chars: Vec<char> = text.chars().collect();
        let cursor = chars.len();
        Self { chars, cursor }
    }

    pub fn new_empty() -> Self {
        Self {
            chars: Vec::new(),
            cursor: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.chars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }

    pub fn set_cursor(&mut self, offset: usize) {
        self.cursor = offset.min(self.chars.len());
    }

    pub fn insert_char(&mut self, ch: char) {
        self.chars.insert(self.cursor, ch);
        self.cursor += 1;
    }

    /// Single-line paste lands here; multi-line text goes to the session.
    pub fn insert_str(&mut self, text: &str) {
        let new_chars: Vec<char> = text.chars().filter(|c| *c != '\r').collect();
        let n = new_chars.len();
        self.chars.splice(self.cursor..self.cursor, new_chars);
        self.cursor += n;
    }

    pub fn delete_back(&mut self) {
        if self.cursor > 0 {
            self.cursor -= 1;
            self.chars.remove(self.cursor);
        }
    }

    pub fn delete_forward(&mut self) {
        if self.cursor < self.chars.len() {
            self.chars.remove(self.cursor);
        }
    }

    pub fn move_left(&mut self) {
        if self.cursor > 0 {
            self.cursor -= 1;
        }
    }

    pub fn move_right(&mut self) {
        if self.cursor < self.chars.len() {
            self.cursor += 1;
        }
    }

    pub fn move_home(&mut self) {
        self.cursor = 0;
    }

    pub fn move_end(&mut self) {
        self.cursor = self.chars.len();
    }

    pub fn move_word_left(&mut self) {
        while self.cursor > 0 && self.chars[self.cursor - 1].is_whitespace() {
            self.cursor -= 1;
        }
        while self.cursor > 0 && !self.chars[self.cursor - 1].is_whitespace() {
            self.cursor -= 1;
        }
    }

    pub fn move_word_right(&mut self) {
        let len = self.chars.len();
        while self.cursor < len && !self.chars[self.cursor].is_whitespace() {
            self.cursor += 1;
        }
        while self.cursor < len && self.chars[self.cursor].is_whitespace() {
            self.cursor += 1;
        }
    }

    pub fn text(&self) -> String {
        self.chars.iter().collect()
    }

    pub fn replace_range(&mut self, start: usize, end: usize, replacement: &str) {
        let end = end.min(self.chars.len());
        let start = start.min(end);
        let new_chars: Vec<char> = replacement.chars().collect();
        let new_len = new_chars.len();
        self.chars.splice(start..end, new_chars);
        self.cursor = start + new_len;
    }
}

/// The renderer's in-progress text for the item being edited.
///
/// Undo and redo replace the session's blocks wholesale; any local text from
/// before that is stale and gets thrown away on the next reconcile.
#[derive(Debug, Clone, PartialEq)]
pub struct LocalEdit {
    pub item: ItemId,
    pub buffer: EditBuffer,
    seen_generation: u64,
}

impl LocalEdit {
    pub fn new(item: ItemId, text: &str, generation: u64) -> Self {
        Self {
            item,
            buffer: EditBuffer::new(text),
            seen_generation: generation,
        }
    }

    pub fn seen_generation(&self) -> u64 {
        self.seen_generation
    }

    pub fn is_stale(&self, generation: u64) -> bool {
        self.seen_generation != generation
    }

    /// Reloads `canonical` when the history generation moved, keeping the
    /// caret as close as the new text allows. Returns whether it reloaded.
    pub fn reconcile(&mut self, generation: u64, canonical: &str) -> bool {
        if !self.is_stale(generation) {
            return false;
        }
        let cursor = self.buffer.cursor;
        self.buffer = EditBuffer::new(canonical);
        self.buffer.set_cursor(cursor);
        self.seen_generation = generation;
        true
    }
}
