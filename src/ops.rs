//! Pure transformations over a document's block list.
//!
//! Every operation reads only its arguments. A no-op or refused operation
//! hands back `Cow::Borrowed(blocks)`, so callers can tell "nothing changed"
//! apart from a real edit without comparing contents.

use std::borrow::Cow;
use std::collections::HashSet;

use tracing::debug;

use crate::block::{Block, BlockType, MAX_INDENT_LEVEL};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitInfo {
    pub content_before: String,
    pub content_after: String,
}

impl SplitInfo {
    /// Split `content` at a character offset (clamped to the content length).
    pub fn at(content: &str, offset: usize) -> Self {
        let byte = byte_offset(content, offset);
        Self {
            content_before: content[..byte].to_string(),
            content_after: content[byte..].to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct InsertResult<'a> {
    pub blocks: Cow<'a, [Block]>,
    pub new_block_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DeleteResult<'a> {
    pub blocks: Cow<'a, [Block]>,
    pub focus_block_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MergeResult {
    pub blocks: Vec<Block>,
    pub focus_block_id: String,
    /// Character offset of the seam between the two merged contents.
    pub cursor_offset: usize,
}

pub fn position(blocks: &[Block], id: &str) -> Option<usize> {
    blocks.iter().position(|b| b.id == id)
}

pub fn find_block<'a>(blocks: &'a [Block], id: &str) -> Option<&'a Block> {
    blocks.iter().find(|b| b.id == id)
}

/// Byte index of the `offset`-th character, clamped to the end of `s`.
pub fn byte_offset(s: &str, offset: usize) -> usize {
    s.char_indices()
        .nth(offset)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

pub fn move_up<'a>(blocks: &'a [Block], id: &str) -> Cow<'a, [Block]> {
    match position(blocks, id) {
        Some(idx) if idx > 0 => {
            let mut out = blocks.to_vec();
            out.swap(idx - 1, idx);
            Cow::Owned(out)
        }
        _ => Cow::Borrowed(blocks),
    }
}

pub fn move_down<'a>(blocks: &'a [Block], id: &str) -> Cow<'a, [Block]> {
    match position(blocks, id) {
        Some(idx) if idx + 1 < blocks.len() => {
            let mut out = blocks.to_vec();
            out.swap(idx, idx + 1);
            Cow::Owned(out)
        }
        _ => Cow::Borrowed(blocks),
    }
}

/// 1-based number of a `numbered` block within its run of consecutive
/// numbered blocks. 0 for anything else.
pub fn numbered_index(blocks: &[Block], index: usize) -> usize {
    match blocks.get(index) {
        Some(b) if b.kind == BlockType::Numbered => blocks[..=index]
            .iter()
            .rev()
            .take_while(|b| b.kind == BlockType::Numbered)
            .count(),
        _ => 0,
    }
}

/// Drops the sections whose `h1` id is in `ids`. With `keep_heading` the
/// `h1` itself survives and only the body is dropped.
pub(crate) fn filter_sections<'a, I>(blocks: I, ids: &HashSet<String>, keep_heading: bool) -> Vec<&'a Block>
where
    I: IntoIterator<Item = &'a Block>,
{
    let mut out = Vec::new();
    let mut suppressed = false;
    for block in blocks {
        if block.kind == BlockType::H1 {
            suppressed = ids.contains(&block.id);
            if !suppressed || keep_heading {
                out.push(block);
            }
        } else if !suppressed {
            out.push(block);
        }
    }
    out
}

/// Blocks left after removing hidden sections entirely, headings included.
pub fn shown_blocks<'a>(blocks: &'a [Block], hidden_ids: &HashSet<String>) -> Vec<&'a Block> {
    filter_sections(blocks, hidden_ids, false)
}

/// Blocks left after collapsing sections: the `h1` stays, its body goes.
pub fn visible_blocks<'a>(blocks: &'a [Block], collapsed_ids: &HashSet<String>) -> Vec<&'a Block> {
    filter_sections(blocks, collapsed_ids, true)
}

/// Id of the `h1` whose section contains `id`, if any. A heading owns itself.
pub fn section_of<'a>(blocks: &'a [Block], id: &str) -> Option<&'a str> {
    let mut current: Option<&str> = None;
    for block in blocks {
        if block.kind == BlockType::H1 {
            current = Some(&block.id);
        }
        if block.id == id {
            return current;
        }
    }
    None
}

/// Enter-key semantics. See the crate docs for the priority order.
pub fn insert_block_after<'a>(
    blocks: &'a [Block],
    id: &str,
    new_id: impl FnOnce() -> String,
    split: Option<SplitInfo>,
) -> InsertResult<'a> {
    let Some(idx) = position(blocks, id) else {
        debug!(block = id, "insert after unknown block ignored");
        return InsertResult {
            blocks: Cow::Borrowed(blocks),
            new_block_id: None,
        };
    };

    let target = &blocks[idx];
    let caps = target.kind.caps();
    let empty = match &split {
        Some(s) => s.content_before.is_empty() && s.content_after.is_empty(),
        None => target.content.is_empty(),
    };

    let mut out = blocks.to_vec();

    // Enter on an empty list item leaves the list.
    if caps.is_list && empty {
        let block = &mut out[idx];
        block.kind = BlockType::Paragraph;
        block.level = None;
        block.content.clear();
        return InsertResult {
            blocks: Cow::Owned(out),
            new_block_id: None,
        };
    }

    let mut new_block = Block::new(new_id(), caps.continues_as, "");
    if caps.inherits_level_on_split {
        new_block.level = target.level;
    }
    if let Some(split) = split {
        if caps.accepts_content {
            out[idx].content = split.content_before;
        }
        new_block.content = split.content_after;
    }

    let new_block_id = new_block.id.clone();
    out.insert(idx + 1, new_block);
    InsertResult {
        blocks: Cow::Owned(out),
        new_block_id: Some(new_block_id),
    }
}

pub fn delete_block<'a>(blocks: &'a [Block], id: &str) -> DeleteResult<'a> {
    if blocks.len() <= 1 {
        debug!(block = id, "refusing to delete the last block");
        return DeleteResult {
            blocks: Cow::Borrowed(blocks),
            focus_block_id: None,
        };
    }
    let Some(idx) = position(blocks, id) else {
        return DeleteResult {
            blocks: Cow::Borrowed(blocks),
            focus_block_id: None,
        };
    };

    let mut out = blocks.to_vec();
    out.remove(idx);
    let focus_block_id = Some(out[idx.saturating_sub(1)].id.clone());
    DeleteResult {
        blocks: Cow::Owned(out),
        focus_block_id,
    }
}

/// Removes every block in `ids`. If that would empty the document, the first
/// selected block survives as an empty paragraph instead.
pub fn delete_blocks<'a>(blocks: &'a [Block], ids: &HashSet<String>) -> DeleteResult<'a> {
    let Some(first_idx) = blocks.iter().position(|b| ids.contains(&b.id)) else {
        return DeleteResult {
            blocks: Cow::Borrowed(blocks),
            focus_block_id: None,
        };
    };

    let remaining: Vec<Block> = blocks
        .iter()
        .filter(|b| !ids.contains(&b.id))
        .cloned()
        .collect();

    if remaining.is_empty() {
        let mut kept = blocks[first_idx].clone();
        clear_in_place(&mut kept);
        let focus_block_id = Some(kept.id.clone());
        return DeleteResult {
            blocks: Cow::Owned(vec![kept]),
            focus_block_id,
        };
    }

    // Every block before the first selected one survived, so its index is stable.
    let focus_block_id = Some(remaining[first_idx.saturating_sub(1)].id.clone());
    DeleteResult {
        blocks: Cow::Owned(remaining),
        focus_block_id,
    }
}

fn clear_in_place(block: &mut Block) {
    block.kind = BlockType::Paragraph;
    block.content.clear();
    block.level = None;
}

/// Resets a block to an empty paragraph.
pub fn clear_block<'a>(blocks: &'a [Block], id: &str) -> Cow<'a, [Block]> {
    match position(blocks, id) {
        Some(idx) => {
            let b = &blocks[idx];
            if b.kind == BlockType::Paragraph && b.content.is_empty() && b.level.is_none() {
                return Cow::Borrowed(blocks);
            }
            let mut out = blocks.to_vec();
            clear_in_place(&mut out[idx]);
            Cow::Owned(out)
        }
        None => Cow::Borrowed(blocks),
    }
}

pub fn merge_block_with_previous(blocks: &[Block], id: &str) -> Option<MergeResult> {
    let idx = position(blocks, id)?;
    if idx == 0 {
        return None;
    }
    let previous = &blocks[idx - 1];
    if !previous.kind.caps().accepts_content {
        debug!(block = id, previous = %previous.id, "cannot merge into a {}", previous.kind);
        return None;
    }

    let cursor_offset = previous.char_len();
    let mut out = blocks.to_vec();
    let current = out.remove(idx);
    let merged = &mut out[idx - 1];
    merged.content.push_str(&current.content);

    Some(MergeResult {
        focus_block_id: merged.id.clone(),
        blocks: out,
        cursor_offset,
    })
}

pub fn block_level(block: &Block) -> u32 {
    block.level.unwrap_or(0)
}

pub fn can_indent_block(blocks: &[Block], id: &str) -> bool {
    let Some(idx) = position(blocks, id) else {
        return false;
    };
    let block = &blocks[idx];
    if !block.kind.caps().can_indent {
        return false;
    }
    let level = block_level(block);
    if level >= MAX_INDENT_LEVEL {
        return false;
    }
    blocks[..idx]
        .iter()
        .rev()
        .find(|b| b.kind.caps().can_indent)
        .is_some_and(|prev| block_level(prev) >= level)
}

pub fn indent_block<'a>(blocks: &'a [Block], id: &str) -> Cow<'a, [Block]> {
    if !can_indent_block(blocks, id) {
        return Cow::Borrowed(blocks);
    }
    let mut out = blocks.to_vec();
    if let Some(idx) = position(&out, id) {
        let level = block_level(&out[idx]);
        out[idx].level = Some(level.saturating_add(1));
    }
    Cow::Owned(out)
}

pub fn unindent_block<'a>(blocks: &'a [Block], id: &str) -> Cow<'a, [Block]> {
    let Some(idx) = position(blocks, id) else {
        return Cow::Borrowed(blocks);
    };
    let level = block_level(&blocks[idx]);
    if level == 0 {
        return Cow::Borrowed(blocks);
    }
    let mut out = blocks.to_vec();
    out[idx].level = if level == 1 { None } else { Some(level - 1) };
    Cow::Owned(out)
}

/// Changes a block's type. Level survives only into list types; content is
/// dropped when the new type cannot hold any.
pub fn set_block_type<'a>(blocks: &'a [Block], id: &str, kind: BlockType) -> Cow<'a, [Block]> {
    match position(blocks, id) {
        Some(idx) if blocks[idx].kind != kind => {
            let mut out = blocks.to_vec();
            let block = &mut out[idx];
            block.kind = kind;
            if !kind.caps().is_list {
                block.level = None;
            }
            if !kind.caps().accepts_content {
                block.content.clear();
            }
            Cow::Owned(out)
        }
        _ => Cow::Borrowed(blocks),
    }
}

pub fn set_block_content<'a>(blocks: &'a [Block], id: &str, content: &str) -> Cow<'a, [Block]> {
    match position(blocks, id) {
        Some(idx) if blocks[idx].content != content && blocks[idx].kind.caps().accepts_content => {
            let mut out = blocks.to_vec();
            out[idx].content = content.to_string();
            Cow::Owned(out)
        }
        _ => Cow::Borrowed(blocks),
    }
}

pub fn toggle_todo<'a>(blocks: &'a [Block], id: &str) -> Cow<'a, [Block]> {
    let next = match find_block(blocks, id).map(|b| b.kind) {
        Some(BlockType::Todo) => BlockType::TodoChecked,
        Some(BlockType::TodoChecked) => BlockType::Todo,
        _ => return Cow::Borrowed(blocks),
    };
    set_block_type(blocks, id, next)
}

/// Replaces the blocks in `ids` with `replacement`, placed where the first
/// of them stood. Returns the borrowed input when nothing in `ids` exists.
pub fn replace_blocks<'a>(
    blocks: &'a [Block],
    ids: &HashSet<String>,
    replacement: Vec<Block>,
) -> Cow<'a, [Block]> {
    let Some(first_idx) = blocks.iter().position(|b| ids.contains(&b.id)) else {
        return Cow::Borrowed(blocks);
    };
    let mut out: Vec<Block> = Vec::with_capacity(blocks.len() + replacement.len());
    out.extend(blocks[..first_idx].iter().cloned());
    out.extend(replacement);
    out.extend(
        blocks[first_idx..]
            .iter()
            .filter(|b| !ids.contains(&b.id))
            .cloned(),
    );
    if out.is_empty() {
        return Cow::Borrowed(blocks);
    }
    Cow::Owned(out)
}
