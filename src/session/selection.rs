use tracing::debug;

use super::{owned, EditorSession, Effect, FocusMode, ItemId, Key, KeyInput, Reaction};
use crate::block::{generate_id, Block, BlockType};
use crate::caret::{CaretContext, CursorTarget};
use crate::clipboard::{is_multiline, paste_at_caret, paste_over_selection, parse_blocks, serialize_selection};
use crate::ops;

impl EditorSession {
    pub(super) fn handle_selected_key(&mut self, input: KeyInput) -> Reaction {
        let m = input.modifiers;
        if input.is_unindent() {
            return self.indent_selection(false);
        }
        match (input.key, m.shift, m.primary) {
            (Key::Escape, _, _) => {
                self.blur();
                Reaction::handled()
            }
            (Key::Enter, false, false) => {
                if let (false, Some(id)) = (self.is_multi_selected(), self.selection_focus.clone()) {
                    // Dividers have no text to edit.
                    if self.block(&id).is_some_and(|b| b.kind.caps().accepts_content) {
                        self.set_focus(Some(ItemId::Block(id)), FocusMode::Editing, Some(CursorTarget::End));
                    }
                }
                Reaction::handled()
            }
            (Key::Enter, false, true) => self.toggle_focused_section(),
            (Key::Backspace | Key::Delete, _, _) => self.delete_selection(),
            (Key::Up, false, false) => self.step_selection(true),
            (Key::Down, false, false) => self.step_selection(false),
            (Key::Up, true, false) => self.extend_selection(true),
            (Key::Down, true, false) => self.extend_selection(false),
            (Key::Tab, false, false) => self.indent_selection(true),
            (Key::Char('c'), _, true) => match self.copy() {
                Some(text) => Reaction::handled().with(Effect::CopyToClipboard(text)),
                None => Reaction::handled(),
            },
            (Key::Char('x'), _, true) => self.cut(),
            (Key::Char('a'), _, true) => {
                self.select_all();
                Reaction::handled()
            }
            // Selected content is read-only; swallow typing.
            (Key::Char(_), _, _) => Reaction::handled(),
            _ => Reaction::ignored(),
        }
    }

    fn visible_ids(&self) -> Vec<String> {
        self.visible_blocks().iter().map(|b| b.id.clone()).collect()
    }

    fn step_selection(&mut self, up: bool) -> Reaction {
        let Some(current) = self.selection_focus.clone() else {
            return Reaction::handled();
        };
        let ids = self.visible_ids();
        let Some(idx) = ids.iter().position(|id| *id == current) else {
            return Reaction::handled();
        };
        let next = if up {
            idx.checked_sub(1).map(|i| ids[i].clone())
        } else {
            ids.get(idx + 1).cloned()
        };
        if let Some(next) = next {
            self.select_block(&next);
        }
        Reaction::handled()
    }

    /// Grows or shrinks the contiguous range between the anchor and a moving
    /// focus.
    fn extend_selection(&mut self, up: bool) -> Reaction {
        let Some(current) = self.selection_focus.clone() else {
            return Reaction::handled();
        };
        let anchor = self.selection_anchor.clone().unwrap_or_else(|| current.clone());
        let ids = self.visible_ids();
        let (Some(focus_idx), Some(anchor_idx)) = (
            ids.iter().position(|id| *id == current),
            ids.iter().position(|id| *id == anchor),
        ) else {
            return Reaction::handled();
        };
        let new_idx = if up {
            match focus_idx.checked_sub(1) {
                Some(i) => i,
                None => return Reaction::handled(),
            }
        } else if focus_idx + 1 < ids.len() {
            focus_idx + 1
        } else {
            return Reaction::handled();
        };

        let (lo, hi) = if new_idx < anchor_idx {
            (new_idx, anchor_idx)
        } else {
            (anchor_idx, new_idx)
        };
        let new_focus = ids[new_idx].clone();
        self.set_focus(Some(ItemId::Block(new_focus.clone())), FocusMode::Selected, None);
        self.selection = ids[lo..=hi].iter().cloned().collect();
        self.selection_anchor = Some(anchor);
        self.selection_focus = Some(new_focus);
        debug!(selected = self.selection.len(), "selection extended");
        Reaction::handled()
    }

    pub fn select_all(&mut self) {
        let ids = self.visible_ids();
        let (Some(first), Some(last)) = (ids.first().cloned(), ids.last().cloned()) else {
            return;
        };
        self.set_focus(Some(ItemId::Block(last.clone())), FocusMode::Selected, None);
        self.selection = ids.into_iter().collect();
        self.selection_anchor = Some(first);
        self.selection_focus = Some(last);
    }

    fn toggle_focused_section(&mut self) -> Reaction {
        let heading = self
            .selection_focus
            .clone()
            .filter(|id| self.block(id).is_some_and(|b| b.kind == BlockType::H1));
        if let Some(id) = heading {
            self.select_block(&id);
            self.toggle_collapsed(&id);
        }
        Reaction::handled()
    }

    fn indent_selection(&mut self, indent: bool) -> Reaction {
        let mut changed = false;
        let ids: Vec<String> = self.selection().into_iter().map(str::to_string).collect();
        for id in &ids {
            let next = if indent {
                owned(ops::indent_block(&self.blocks, id))
            } else {
                owned(ops::unindent_block(&self.blocks, id))
            };
            changed |= self.commit(next);
        }
        Reaction::changed(changed)
    }

    fn delete_selection(&mut self) -> Reaction {
        if self.selection.is_empty() {
            return Reaction::handled();
        }
        let single = match self.selection.len() {
            1 => self.selection.iter().next().cloned(),
            _ => None,
        };
        if let (Some(id), true) = (&single, self.blocks.len() <= 1) {
            // The sole remaining block is cleared instead.
            let id = id.clone();
            let next = owned(ops::clear_block(&self.blocks, &id));
            let changed = self.commit(next);
            self.select_block(&id);
            return Reaction::changed(changed);
        }

        let result = match &single {
            Some(id) => ops::delete_block(&self.blocks, id),
            None => ops::delete_blocks(&self.blocks, &self.selection),
        };
        let focus = result.focus_block_id;
        let next = owned(result.blocks);
        let changed = self.commit(next);
        match focus {
            Some(id) => self.select_block(&id),
            None => self.blur(),
        }
        Reaction::changed(changed)
    }

    /// Clipboard text for the current selection, in document order.
    pub fn copy(&self) -> Option<String> {
        if self.mode != FocusMode::Selected || self.selection.is_empty() {
            return None;
        }
        Some(serialize_selection(&self.blocks, &self.selection))
    }

    pub fn cut(&mut self) -> Reaction {
        let Some(text) = self.copy() else {
            return Reaction::handled();
        };
        self.delete_selection().with(Effect::CopyToClipboard(text))
    }

    /// Multi-line paste. While editing, the lines are exploded into blocks at
    /// the caret; while selected, they replace the selection. Single-line
    /// text in editing mode is left to the renderer.
    pub fn paste(&mut self, text: &str, caret: &CaretContext) -> Reaction {
        let Some(focus) = self.focus.clone() else {
            return Reaction::ignored();
        };
        match self.mode {
            FocusMode::Editing => {
                let ItemId::Block(id) = focus else {
                    return Reaction::ignored();
                };
                if !is_multiline(text) {
                    return Reaction::ignored();
                }
                let pasted = parse_blocks(text, &self.prefixes, generate_id);
                let Some(result) = paste_at_caret(&self.blocks, &id, caret.offset, pasted, generate_id) else {
                    return Reaction::handled();
                };
                self.land_paste(result.blocks, result.focus_block_id, result.cursor_offset)
            }
            FocusMode::Selected => {
                let pasted = parse_blocks(text, &self.prefixes, generate_id);
                let Some(result) = paste_over_selection(&self.blocks, &self.selection, pasted) else {
                    return Reaction::handled();
                };
                self.land_paste(result.blocks, result.focus_block_id, result.cursor_offset)
            }
        }
    }

    fn land_paste(&mut self, blocks: Vec<Block>, focus: String, offset: usize) -> Reaction {
        debug!(blocks = blocks.len(), "paste applied");
        self.commit(Some(blocks));
        self.set_focus(
            Some(ItemId::Block(focus)),
            FocusMode::Editing,
            Some(CursorTarget::Offset(offset)),
        );
        Reaction::changed(true)
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_helpers::*;
    use super::*;

    fn key(s: &mut EditorSession, input: KeyInput) -> Reaction {
        s.handle_key(input, &CaretContext::single_line(0))
    }

    fn four() -> EditorSession {
        session(vec![p("1", "a"), p("2", "b"), p("3", "c"), p("4", "d")])
    }

    #[test]
    fn enter_edits_single_selection_at_end() {
        let mut s = four();
        s.select_block("2");
        key(&mut s, KeyInput::plain(Key::Enter));
        assert!(s.is_editing(&block_item("2")));
        assert_eq!(s.take_cursor_request(&block_item("2")), Some(CursorTarget::End));
        assert!(s.selection().is_empty());
    }

    #[test]
    fn enter_keeps_a_divider_selected() {
        let mut s = session(vec![p("1", "a"), b("d", BlockType::Divider, ""), p("2", "b")]);
        s.select_block("d");
        key(&mut s, KeyInput::plain(Key::Enter));
        assert_eq!(s.mode(), FocusMode::Selected);
        assert_eq!(s.selection(), vec!["d"]);
        assert!(!s.is_editing(&block_item("d")));
    }

    #[test]
    fn enter_does_nothing_with_multi_selection() {
        let mut s = four();
        s.select_block("2");
        key(&mut s, KeyInput::shift(Key::Down));
        key(&mut s, KeyInput::plain(Key::Enter));
        assert_eq!(s.mode(), FocusMode::Selected);
        assert_eq!(s.selection(), vec!["2", "3"]);
    }

    #[test]
    fn escape_clears_selection() {
        let mut s = four();
        s.select_block("2");
        key(&mut s, KeyInput::plain(Key::Escape));
        assert_eq!(s.focus(), None);
        assert!(s.selection().is_empty());
    }

    #[test]
    fn shift_arrows_extend_and_shrink_around_anchor() {
        let mut s = four();
        s.select_block("2");
        key(&mut s, KeyInput::shift(Key::Down));
        key(&mut s, KeyInput::shift(Key::Down));
        assert_eq!(s.selection(), vec!["2", "3", "4"]);
        assert_eq!(s.selection_focus(), Some("4"));

        key(&mut s, KeyInput::shift(Key::Up));
        assert_eq!(s.selection(), vec!["2", "3"]);
        key(&mut s, KeyInput::shift(Key::Up));
        key(&mut s, KeyInput::shift(Key::Up));
        assert_eq!(s.selection(), vec!["1", "2"]);
        assert_eq!(s.selection_focus(), Some("1"));
    }

    #[test]
    fn plain_arrows_move_single_selection() {
        let mut s = four();
        s.select_block("2");
        key(&mut s, KeyInput::plain(Key::Down));
        assert_eq!(s.selection(), vec!["3"]);
        key(&mut s, KeyInput::plain(Key::Up));
        key(&mut s, KeyInput::plain(Key::Up));
        key(&mut s, KeyInput::plain(Key::Up));
        assert_eq!(s.selection(), vec!["1"]);
    }

    #[test]
    fn reorder_wins_over_extend() {
        let mut s = four();
        s.select_block("3");
        let r = key(&mut s, KeyInput::primary_shift(Key::Up));
        assert!(r.blocks_changed());
        assert_eq!(ids(&s), vec!["1", "3", "2", "4"]);
        assert_eq!(s.selection(), vec!["3"]);
    }

    #[test]
    fn reorder_collapses_multi_selection_to_focus() {
        let mut s = four();
        s.select_block("2");
        key(&mut s, KeyInput::shift(Key::Down));
        key(&mut s, KeyInput::primary_shift(Key::Down));
        assert_eq!(ids(&s), vec!["1", "2", "4", "3"]);
        assert_eq!(s.selection(), vec!["3"]);
    }

    #[test]
    fn backspace_deletes_single_selection() {
        let mut s = four();
        s.select_block("3");
        let r = key(&mut s, KeyInput::plain(Key::Backspace));
        assert!(r.blocks_changed());
        assert_eq!(ids(&s), vec!["1", "2", "4"]);
        assert_eq!(s.selection(), vec!["2"]);
    }

    #[test]
    fn delete_removes_whole_range() {
        let mut s = four();
        s.select_block("2");
        key(&mut s, KeyInput::shift(Key::Down));
        key(&mut s, KeyInput::plain(Key::Delete));
        assert_eq!(ids(&s), vec!["1", "4"]);
        assert_eq!(s.selection(), vec!["1"]);
    }

    #[test]
    fn deleting_sole_block_only_clears_it() {
        let mut s = session(vec![b("1", BlockType::H1, "Only")]);
        s.select_block("1");
        let r = key(&mut s, KeyInput::plain(Key::Backspace));
        assert!(r.blocks_changed());
        assert_eq!(s.blocks().len(), 1);
        assert_eq!(s.blocks()[0].kind, BlockType::Paragraph);
        assert_eq!(s.blocks()[0].content, "");
    }

    #[test]
    fn select_all_then_delete_keeps_one_block() {
        let mut s = four();
        s.select_block("1");
        key(&mut s, KeyInput::primary(Key::Char('a')));
        assert_eq!(s.selection().len(), 4);
        key(&mut s, KeyInput::plain(Key::Delete));
        assert_eq!(ids(&s), vec!["1"]);
        assert_eq!(contents(&s), vec![""]);
    }

    #[test]
    fn copy_serializes_in_document_order() {
        let mut s = session(vec![
            b("1", BlockType::H1, "Plan"),
            b("2", BlockType::Bullet, "eggs"),
            b("3", BlockType::Todo, "call"),
        ]);
        s.select_block("3");
        key(&mut s, KeyInput::shift(Key::Up));
        key(&mut s, KeyInput::shift(Key::Up));
        let r = key(&mut s, KeyInput::primary(Key::Char('c')));
        assert_eq!(
            r.effects,
            vec![Effect::CopyToClipboard("# Plan\n- eggs\n[] call".into())]
        );
        assert_eq!(s.blocks().len(), 3);
    }

    #[test]
    fn cut_copies_then_deletes() {
        let mut s = four();
        s.select_block("2");
        let r = key(&mut s, KeyInput::primary(Key::Char('x')));
        assert!(r.effects.contains(&Effect::CopyToClipboard("b".into())));
        assert!(r.blocks_changed());
        assert_eq!(ids(&s), vec!["1", "3", "4"]);
    }

    #[test]
    fn copy_requires_selected_mode() {
        let s = editing(vec![p("1", "a")], "1");
        assert_eq!(s.copy(), None);
    }

    #[test]
    fn typing_while_selected_is_swallowed() {
        let mut s = four();
        s.select_block("1");
        let r = key(&mut s, KeyInput::plain(Key::Char('z')));
        assert!(r.intercepted);
        assert!(r.effects.is_empty());
        assert_eq!(contents(&s), vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn tab_indents_every_selected_bullet() {
        let mut s = session(vec![
            b("1", BlockType::Bullet, "a"),
            b("2", BlockType::Bullet, "b"),
            b("3", BlockType::Bullet, "c"),
        ]);
        s.select_block("2");
        key(&mut s, KeyInput::shift(Key::Down));
        key(&mut s, KeyInput::plain(Key::Tab));
        let levels: Vec<Option<u32>> = s.blocks().iter().map(|b| b.level).collect();
        assert_eq!(levels, vec![None, Some(1), Some(1)]);
        key(&mut s, KeyInput::plain(Key::BackTab));
        let levels: Vec<Option<u32>> = s.blocks().iter().map(|b| b.level).collect();
        assert_eq!(levels, vec![None, None, None]);
    }

    #[test]
    fn primary_enter_collapses_selected_heading() {
        let mut s = session(vec![b("h", BlockType::H1, "Head"), p("1", "body")]);
        s.select_block("h");
        key(&mut s, KeyInput::primary(Key::Enter));
        assert!(s.is_collapsed("h"));
        key(&mut s, KeyInput::primary(Key::Enter));
        assert!(!s.is_collapsed("h"));
    }

    #[test]
    fn extend_skips_collapsed_body() {
        let mut s = session(vec![
            p("0", "intro"),
            b("h", BlockType::H1, "Head"),
            p("1", "body"),
            b("h2", BlockType::H1, "Next"),
        ]);
        s.toggle_collapsed("h");
        s.select_block("h");
        key(&mut s, KeyInput::shift(Key::Down));
        assert_eq!(s.selection(), vec!["h", "h2"]);
    }

    #[test]
    fn multiline_paste_explodes_at_caret() {
        let mut s = editing(vec![p("1", "HelloWorld")], "1");
        let r = s.paste("- x\n\n[x] done", &CaretContext::single_line(5));
        assert!(r.blocks_changed());
        assert_eq!(contents(&s), vec!["Hello", "x", "done", "World"]);
        assert_eq!(s.blocks()[1].kind, BlockType::Bullet);
        assert_eq!(s.blocks()[2].kind, BlockType::TodoChecked);
        let landing = s.blocks()[2].id.clone();
        assert!(s.is_editing(&block_item(&landing)));
        assert_eq!(s.take_cursor_request(&block_item(&landing)), Some(CursorTarget::Offset(4)));
    }

    #[test]
    fn single_line_paste_is_left_to_renderer() {
        let mut s = editing(vec![p("1", "Hello")], "1");
        let r = s.paste("plain", &CaretContext::single_line(5));
        assert!(!r.intercepted);
        assert_eq!(contents(&s), vec!["Hello"]);
    }

    #[test]
    fn paste_replaces_selection() {
        let mut s = four();
        s.select_block("2");
        key(&mut s, KeyInput::shift(Key::Down));
        let r = s.paste("# New", &CaretContext::single_line(0));
        assert!(r.blocks_changed());
        assert_eq!(contents(&s), vec!["a", "New", "d"]);
        assert_eq!(s.blocks()[1].kind, BlockType::H1);
        assert_eq!(s.mode(), FocusMode::Editing);
    }
}
