use tracing::{debug, info};

use super::{owned, EditorSession, Effect, FocusMode, ItemId, Key, KeyInput, Reaction};
use crate::block::{generate_id, BlockType};
use crate::caret::{CaretContext, CursorTarget};
use crate::ops::{self, SplitInfo};
use crate::trigger::parse_task_trigger;

impl EditorSession {
    pub(super) fn handle_editing_key(&mut self, item: ItemId, input: KeyInput, caret: &CaretContext) -> Reaction {
        let m = input.modifiers;
        if input.is_unindent() {
            return self.indent_focused(&item, false);
        }
        match (input.key, m.shift, m.primary) {
            (Key::Up, false, false) if caret.on_first_line => self.focus_adjacent(&item, true, caret.x),
            (Key::Down, false, false) if caret.on_last_line => self.focus_adjacent(&item, false, caret.x),
            (Key::Escape, _, _) => {
                match &item {
                    ItemId::Block(id) => {
                        let id = id.clone();
                        self.select_block(&id);
                    }
                    ItemId::Title(_) => self.blur(),
                }
                Reaction::handled()
            }
            (Key::Enter, false, false) => self.enter(&item, caret),
            (Key::Enter, false, true) => match item.block_id() {
                Some(id) => {
                    let next = owned(ops::toggle_todo(&self.blocks, id));
                    Reaction::changed(self.commit(next))
                }
                None => Reaction::ignored(),
            },
            (Key::Backspace, false, false) if caret.offset == 0 => self.backspace_at_start(&item),
            (Key::Delete, false, false) => self.delete_at_end(&item, caret),
            (Key::Tab, false, false) => self.indent_focused(&item, true),
            _ => Reaction::ignored(),
        }
    }

    /// Moves focus to the neighbouring navigable item, landing on its
    /// nearest visual line at the same horizontal position.
    fn focus_adjacent(&mut self, item: &ItemId, up: bool, x: f32) -> Reaction {
        let items = self.items();
        let Some(idx) = items.iter().position(|i| i == item) else {
            return Reaction::ignored();
        };
        let target = if up {
            idx.checked_sub(1).and_then(|i| items.get(i))
        } else {
            items.get(idx + 1)
        };
        let Some(target) = target.cloned() else {
            return Reaction::ignored();
        };

        let is_divider = target
            .block_id()
            .and_then(|id| self.block(id))
            .is_some_and(|b| !b.kind.caps().accepts_content);
        if is_divider {
            if let Some(id) = target.block_id().map(str::to_string) {
                self.select_block(&id);
            }
            return Reaction::handled();
        }

        self.set_focus(
            Some(target),
            FocusMode::Editing,
            Some(CursorTarget::Point { x, from_top: !up }),
        );
        Reaction::handled()
    }

    fn enter(&mut self, item: &ItemId, caret: &CaretContext) -> Reaction {
        let id = match item {
            ItemId::Title(_) => {
                let first = self.visible_blocks().first().map(|b| b.id.clone());
                if let Some(first) = first {
                    self.set_focus(Some(ItemId::Block(first)), FocusMode::Editing, Some(CursorTarget::Start));
                }
                return Reaction::handled();
            }
            ItemId::Block(id) => id.clone(),
        };
        let Some(block) = self.block(&id).cloned() else {
            return Reaction::ignored();
        };

        let is_last = self.blocks.last().is_some_and(|b| b.id == id);
        if is_last {
            if let Some(title) = parse_task_trigger(&block.content) {
                let title = title.to_string();
                info!(block = %id, title = %title, "task trigger");
                let next = owned(ops::clear_block(&self.blocks, &id));
                let changed = self.commit(next);
                self.request_cursor(CursorTarget::Start);
                return Reaction::changed(changed).with(Effect::CreateSibling { title });
            }
        }

        // A new block under a collapsed heading would vanish from view.
        if block.kind == BlockType::H1 {
            self.collapsed.remove(&id);
        }

        let split = SplitInfo::at(&block.content, caret.offset);
        let result = ops::insert_block_after(&self.blocks, &id, generate_id, Some(split));
        let new_block_id = result.new_block_id;
        let next = owned(result.blocks);
        let changed = self.commit(next);

        match new_block_id {
            Some(new_id) => {
                self.set_focus(Some(ItemId::Block(new_id)), FocusMode::Editing, Some(CursorTarget::Start));
            }
            // Empty list item left the list in place.
            None => self.request_cursor(CursorTarget::Start),
        }
        Reaction::changed(changed)
    }

    fn backspace_at_start(&mut self, item: &ItemId) -> Reaction {
        let Some(id) = item.block_id().map(str::to_string) else {
            return Reaction::ignored();
        };
        let Some(block) = self.block(&id).cloned() else {
            return Reaction::ignored();
        };

        if block.kind != BlockType::Paragraph {
            let next = owned(ops::set_block_type(&self.blocks, &id, BlockType::Paragraph));
            let changed = self.commit(next);
            self.request_cursor(CursorTarget::Start);
            return Reaction::changed(changed);
        }

        let is_first = self.blocks.first().is_some_and(|b| b.id == id);
        if is_first {
            return Reaction::ignored();
        }
        match ops::merge_block_with_previous(&self.blocks, &id) {
            Some(merged) => {
                self.commit(Some(merged.blocks));
                self.set_focus(
                    Some(ItemId::Block(merged.focus_block_id)),
                    FocusMode::Editing,
                    Some(CursorTarget::Offset(merged.cursor_offset)),
                );
                Reaction::changed(true)
            }
            None => Reaction::handled(),
        }
    }

    fn delete_at_end(&mut self, item: &ItemId, caret: &CaretContext) -> Reaction {
        let Some(id) = item.block_id() else {
            return Reaction::ignored();
        };
        let Some(idx) = ops::position(&self.blocks, id) else {
            return Reaction::ignored();
        };
        if caret.offset < self.blocks[idx].char_len() {
            return Reaction::ignored();
        }
        let Some(next_id) = self.blocks.get(idx + 1).map(|b| b.id.clone()) else {
            return Reaction::ignored();
        };
        // A folded body is pulled in only once it is on screen again.
        if self.collapsed.remove(id) {
            debug!(heading = id, "section expanded for delete");
        }
        if !self.visible_blocks().iter().any(|b| b.id == next_id) {
            return Reaction::handled();
        }
        match ops::merge_block_with_previous(&self.blocks, &next_id) {
            Some(merged) => {
                let offset = merged.cursor_offset;
                self.commit(Some(merged.blocks));
                self.request_cursor(CursorTarget::Offset(offset));
                Reaction::changed(true)
            }
            None => Reaction::handled(),
        }
    }

    fn indent_focused(&mut self, item: &ItemId, indent: bool) -> Reaction {
        let Some(id) = item.block_id() else {
            return Reaction::handled();
        };
        let next = if indent {
            owned(ops::indent_block(&self.blocks, id))
        } else {
            owned(ops::unindent_block(&self.blocks, id))
        };
        Reaction::changed(self.commit(next))
    }

    /// Reorders the focused block. A multi-selection collapses to its
    /// focused block first.
    pub(super) fn move_focused_block(&mut self, up: bool) -> Reaction {
        let Some(id) = self.focus.as_ref().and_then(|f| f.block_id()).map(str::to_string) else {
            return Reaction::ignored();
        };
        if self.is_multi_selected() {
            self.select_block(&id);
        }
        let next = if up {
            owned(ops::move_up(&self.blocks, &id))
        } else {
            owned(ops::move_down(&self.blocks, &id))
        };
        if next.is_none() {
            debug!(block = %id, up, "block already at boundary");
        }
        Reaction::changed(self.commit(next))
    }
}
