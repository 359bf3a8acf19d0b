//! The editor session: focus, selection and cursor state for one document,
//! threaded through every keyboard and input event.

mod input;
mod navigation;
mod selection;

pub use input::{Key, KeyInput, Modifiers};

use std::borrow::Cow;
use std::collections::HashSet;

use tracing::debug;

use crate::block::{generate_id, Block, BlockType};
use crate::caret::{CaretContext, CursorTarget};
use crate::markdown::PrefixTable;
use crate::ops::{self, filter_sections};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ItemId {
    Title(String),
    Block(String),
}

impl ItemId {
    pub fn block_id(&self) -> Option<&str> {
        match self {
            ItemId::Block(id) => Some(id),
            ItemId::Title(_) => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusMode {
    /// Caret is live and content is mutable.
    Editing,
    /// The whole item is selected; its content is read-only.
    Selected,
}

/// A one-shot caret placement, valid only for the focus transition that
/// produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct CursorRequest {
    pub item: ItemId,
    pub transition: u64,
    pub target: CursorTarget,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    BlocksChanged,
    TitleChanged,
    CopyToClipboard(String),
    CreateSibling { title: String },
}

/// What the session did with an event. When `intercepted` is false the
/// rendering layer performs the key's ordinary behaviour itself.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Reaction {
    pub intercepted: bool,
    pub effects: Vec<Effect>,
}

impl Reaction {
    pub fn ignored() -> Self {
        Self::default()
    }

    pub fn handled() -> Self {
        Self {
            intercepted: true,
            effects: Vec::new(),
        }
    }

    fn changed(changed: bool) -> Self {
        let mut r = Self::handled();
        if changed {
            r.effects.push(Effect::BlocksChanged);
        }
        r
    }

    fn with(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }

    pub fn blocks_changed(&self) -> bool {
        self.effects.contains(&Effect::BlocksChanged)
    }
}

pub(crate) fn owned(blocks: Cow<'_, [Block]>) -> Option<Vec<Block>> {
    match blocks {
        Cow::Owned(v) => Some(v),
        Cow::Borrowed(_) => None,
    }
}

#[derive(Debug, Clone)]
pub struct EditorSession {
    doc_id: String,
    title: String,
    blocks: Vec<Block>,
    prefixes: PrefixTable,
    focus: Option<ItemId>,
    mode: FocusMode,
    selection: HashSet<String>,
    selection_anchor: Option<String>,
    selection_focus: Option<String>,
    pending_cursor: Option<CursorRequest>,
    transition: u64,
    undo_generation: u64,
    collapsed: HashSet<String>,
    hidden: HashSet<String>,
}

impl EditorSession {
    pub fn new(doc_id: &str, title: &str, mut blocks: Vec<Block>, prefixes: PrefixTable) -> Self {
        if blocks.is_empty() {
            blocks.push(Block::paragraph(generate_id(), ""));
        }
        Self {
            doc_id: doc_id.to_string(),
            title: title.to_string(),
            blocks,
            prefixes,
            focus: None,
            mode: FocusMode::Editing,
            selection: HashSet::new(),
            selection_anchor: None,
            selection_focus: None,
            pending_cursor: None,
            transition: 0,
            undo_generation: 0,
            collapsed: HashSet::new(),
            hidden: HashSet::new(),
        }
    }

    /// Session for a freshly created document: one empty paragraph, focused.
    pub fn seeded(doc_id: &str, title: &str, prefixes: PrefixTable) -> Self {
        let mut session = Self::new(doc_id, title, Vec::new(), prefixes);
        let first = ItemId::Block(session.blocks[0].id.clone());
        session.set_focus(Some(first), FocusMode::Editing, Some(CursorTarget::Start));
        session
    }

    pub fn doc_id(&self) -> &str {
        &self.doc_id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn block(&self, id: &str) -> Option<&Block> {
        ops::find_block(&self.blocks, id)
    }

    pub fn prefixes(&self) -> &PrefixTable {
        &self.prefixes
    }

    pub fn focus(&self) -> Option<&ItemId> {
        self.focus.as_ref()
    }

    pub fn mode(&self) -> FocusMode {
        self.mode
    }

    pub fn is_editing(&self, item: &ItemId) -> bool {
        self.mode == FocusMode::Editing && self.focus.as_ref() == Some(item)
    }

    pub fn is_selected(&self, block_id: &str) -> bool {
        self.mode == FocusMode::Selected && self.selection.contains(block_id)
    }

    pub fn is_multi_selected(&self) -> bool {
        self.mode == FocusMode::Selected && self.selection.len() > 1
    }

    /// Selected block ids in document order.
    pub fn selection(&self) -> Vec<&str> {
        self.blocks
            .iter()
            .filter(|b| self.selection.contains(&b.id))
            .map(|b| b.id.as_str())
            .collect()
    }

    pub fn selection_focus(&self) -> Option<&str> {
        self.selection_focus.as_deref()
    }

    pub fn transition(&self) -> u64 {
        self.transition
    }

    pub fn undo_generation(&self) -> u64 {
        self.undo_generation
    }

    pub fn pending_cursor(&self) -> Option<&CursorRequest> {
        self.pending_cursor.as_ref()
    }

    pub fn is_collapsed(&self, id: &str) -> bool {
        self.collapsed.contains(id)
    }

    /// Blocks as rendered: hidden sections removed, collapsed bodies dropped.
    pub fn visible_blocks(&self) -> Vec<&Block> {
        let shown = filter_sections(&self.blocks, &self.hidden, false);
        filter_sections(shown, &self.collapsed, true)
    }

    /// The flattened navigation order: the title, then every visible block.
    pub fn items(&self) -> Vec<ItemId> {
        std::iter::once(ItemId::Title(self.doc_id.clone()))
            .chain(
                self.visible_blocks()
                    .into_iter()
                    .map(|b| ItemId::Block(b.id.clone())),
            )
            .collect()
    }

    pub fn numbered_index_of(&self, id: &str) -> usize {
        ops::position(&self.blocks, id)
            .map(|idx| ops::numbered_index(&self.blocks, idx))
            .unwrap_or(0)
    }

    // --- focus transitions ---

    /// Every focus change goes through here so that any older cursor request
    /// is invalidated by the new transition number.
    fn set_focus(&mut self, item: Option<ItemId>, mode: FocusMode, target: Option<CursorTarget>) {
        self.transition += 1;
        self.mode = mode;
        self.focus = item;
        self.pending_cursor = match (&self.focus, target) {
            (Some(item), Some(target)) => Some(CursorRequest {
                item: item.clone(),
                transition: self.transition,
                target,
            }),
            _ => None,
        };
        if mode == FocusMode::Editing || self.focus.is_none() {
            self.selection.clear();
            self.selection_anchor = None;
            self.selection_focus = None;
        }
        debug!(
            transition = self.transition,
            focus = ?self.focus,
            mode = ?self.mode,
            "focus transition"
        );
    }

    /// Cursor request that keeps the current focus (e.g. after autodetect).
    fn request_cursor(&mut self, target: CursorTarget) {
        if let Some(item) = &self.focus {
            self.pending_cursor = Some(CursorRequest {
                item: item.clone(),
                transition: self.transition,
                target,
            });
        }
    }

    /// Hands the pending cursor request to the renderer of `item`, once.
    /// Requests from an earlier transition are discarded, never applied.
    pub fn take_cursor_request(&mut self, item: &ItemId) -> Option<CursorTarget> {
        let request = self.pending_cursor.as_ref()?;
        if request.transition != self.transition {
            self.pending_cursor = None;
            return None;
        }
        if &request.item != item {
            return None;
        }
        self.pending_cursor.take().map(|r| r.target)
    }

    /// Click or programmatic focus into an item's editor.
    pub fn focus_editing(&mut self, item: ItemId, target: CursorTarget) {
        self.set_focus(Some(item), FocusMode::Editing, Some(target));
    }

    /// Whole-block selection of a single block.
    pub fn select_block(&mut self, id: &str) {
        if self.block(id).is_none() {
            return;
        }
        self.set_focus(Some(ItemId::Block(id.to_string())), FocusMode::Selected, None);
        self.selection = HashSet::from([id.to_string()]);
        self.selection_anchor = Some(id.to_string());
        self.selection_focus = Some(id.to_string());
    }

    pub fn blur(&mut self) {
        self.set_focus(None, FocusMode::Editing, None);
    }

    // --- content ---

    /// Commits text typed into an item. A paragraph whose text now starts
    /// with a markdown marker is converted in the same step.
    pub fn input(&mut self, item: &ItemId, text: &str) -> Reaction {
        let id = match item {
            ItemId::Title(_) => {
                if self.title == text {
                    return Reaction::handled();
                }
                self.title = text.to_string();
                return Reaction::handled().with(Effect::TitleChanged);
            }
            ItemId::Block(id) => id.as_str(),
        };
        let Some(block) = self.block(id).cloned() else {
            return Reaction::ignored();
        };

        if let Some(detected) = self.prefixes.autodetect(&block, text) {
            debug!(block = id, kind = %detected.kind, "markdown prefix converted block");
            let typed = ops::set_block_type(&self.blocks, id, detected.kind).into_owned();
            let next = ops::set_block_content(&typed, id, &detected.content).into_owned();
            self.blocks = next;

            if !detected.kind.caps().accepts_content {
                return self.continue_after_divider(id);
            }
            let end = detected.content.chars().count();
            if self.focus.as_ref() == Some(item) {
                self.request_cursor(CursorTarget::Offset(end));
            }
            return Reaction::changed(true);
        }

        let next = owned(ops::set_block_content(&self.blocks, id, text));
        Reaction::changed(self.commit(next))
    }

    fn continue_after_divider(&mut self, id: &str) -> Reaction {
        let result = ops::insert_block_after(&self.blocks, id, generate_id, None);
        let new_id = result.new_block_id;
        if let Some(next) = owned(result.blocks) {
            self.blocks = next;
        }
        if let Some(new_id) = new_id {
            self.set_focus(Some(ItemId::Block(new_id)), FocusMode::Editing, Some(CursorTarget::Start));
        }
        Reaction::changed(true)
    }

    fn commit(&mut self, next: Option<Vec<Block>>) -> bool {
        match next {
            Some(blocks) => {
                self.blocks = blocks;
                self.repair();
                true
            }
            None => false,
        }
    }

    /// Keeps selection and focus consistent with the current block list.
    fn repair(&mut self) {
        let present: HashSet<&str> = self.blocks.iter().map(|b| b.id.as_str()).collect();
        self.selection.retain(|id| present.contains(id.as_str()));
        self.collapsed.retain(|id| {
            ops::find_block(&self.blocks, id).is_some_and(|b| b.kind == BlockType::H1)
        });

        let Some(focused) = self.focus.as_ref().and_then(|f| f.block_id()).map(str::to_string) else {
            return;
        };
        if !present.contains(focused.as_str()) {
            self.blur();
            return;
        }
        // Edits may pull the focused block into a collapsed section.
        if let Some(section) = ops::section_of(&self.blocks, &focused) {
            if section != focused && self.collapsed.contains(section) {
                let section = section.to_string();
                self.collapsed.remove(&section);
            }
        }
    }

    // --- sections ---

    pub fn toggle_collapsed(&mut self, heading_id: &str) -> bool {
        if !self.block(heading_id).is_some_and(|b| b.kind == BlockType::H1) {
            return false;
        }
        if self.collapsed.remove(heading_id) {
            return true;
        }
        self.collapsed.insert(heading_id.to_string());

        let visible: HashSet<String> = self.visible_blocks().iter().map(|b| b.id.clone()).collect();
        self.selection.retain(|id| visible.contains(id));
        let focus_hidden = self
            .focus
            .as_ref()
            .and_then(|f| f.block_id())
            .is_some_and(|id| !visible.contains(id));
        if focus_hidden {
            self.select_block(heading_id);
        }
        true
    }

    pub fn set_hidden(&mut self, heading_ids: HashSet<String>) {
        self.hidden = heading_ids;
        let visible: HashSet<String> = self.visible_blocks().iter().map(|b| b.id.clone()).collect();
        self.selection.retain(|id| visible.contains(id));
        let focus_hidden = self
            .focus
            .as_ref()
            .and_then(|f| f.block_id())
            .is_some_and(|id| !visible.contains(id));
        if focus_hidden {
            self.blur();
        }
    }

    // --- undo / redo ---

    /// Installs a snapshot produced by the undo stack. The generation is
    /// authoritative: the renderer must drop whatever it had buffered.
    pub fn apply_history(&mut self, blocks: Vec<Block>, generation: u64) {
        self.blocks = if blocks.is_empty() {
            vec![Block::paragraph(generate_id(), "")]
        } else {
            blocks
        };
        self.undo_generation = generation;
        debug!(generation, "history snapshot applied");

        let focus = self.focus.clone();
        let mode = self.mode;
        let selection = std::mem::take(&mut self.selection);
        let anchor = self.selection_anchor.take();
        let selection_focus = self.selection_focus.take();

        let still_there = focus
            .as_ref()
            .map(|f| match f {
                ItemId::Title(_) => true,
                ItemId::Block(id) => self.block(id).is_some(),
            })
            .unwrap_or(false);

        if !still_there {
            self.blur();
            return;
        }
        self.set_focus(focus, mode, None);
        if mode == FocusMode::Selected {
            self.selection = selection;
            self.selection_anchor = anchor;
            self.selection_focus = selection_focus;
        }
        self.repair();
    }

    pub fn handle_key(&mut self, input: KeyInput, caret: &CaretContext) -> Reaction {
        let Some(item) = self.focus.clone() else {
            return Reaction::ignored();
        };
        let m = input.modifiers;
        // Reorder wins over extend when both modifiers are held.
        if m.primary && m.shift && matches!(input.key, Key::Up | Key::Down) {
            return self.move_focused_block(input.key == Key::Up);
        }
        match self.mode {
            FocusMode::Editing => self.handle_editing_key(item, input, caret),
            FocusMode::Selected => self.handle_selected_key(input),
        }
    }
}
