//! Plain-text clipboard form: one block per line, each line carrying the
//! markdown prefix of its block type.

use std::borrow::Cow;
use std::collections::HashSet;

use crate::block::Block;
use crate::markdown::PrefixTable;
use crate::ops::{position, replace_blocks, SplitInfo};

/// The clipboard line for one block. Line breaks inside the content become
/// spaces so a block never spans more than one line.
pub fn block_to_line(block: &Block) -> String {
    let caps = block.kind.caps();
    let content = block.content.replace(|c: char| c == '\n' || c == '\r', " ");
    match caps.clipboard_prefix {
        Some(prefix) if !caps.accepts_content => prefix.to_string(),
        Some(prefix) => format!("{}{}", prefix, content),
        None => content,
    }
}

pub fn serialize_blocks<'a, I>(blocks: I) -> String
where
    I: IntoIterator<Item = &'a Block>,
{
    blocks
        .into_iter()
        .map(block_to_line)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Serializes the selected blocks in document order, whatever order the ids
/// were selected in.
pub fn serialize_selection(blocks: &[Block], selection: &HashSet<String>) -> String {
    serialize_blocks(blocks.iter().filter(|b| selection.contains(&b.id)))
}

pub fn is_multiline(text: &str) -> bool {
    text.lines().filter(|l| !l.trim().is_empty()).count() > 1
}

/// One block per non-blank line, each line autodetected on its own.
pub fn parse_blocks(text: &str, table: &PrefixTable, mut new_id: impl FnMut() -> String) -> Vec<Block> {
    text.lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| {
            let detected = table.parse_line(line);
            Block::new(new_id(), detected.kind, detected.content)
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct PasteResult {
    pub blocks: Vec<Block>,
    pub focus_block_id: String,
    pub cursor_offset: usize,
}

fn landing(pasted: &[Block]) -> Option<(String, usize)> {
    pasted.last().map(|b| (b.id.clone(), b.char_len()))
}

/// Inserts `pasted` at a caret inside block `id`.
///
/// The block is split at `offset`: the head stays in place, the pasted
/// blocks follow, and the tail lands in a trailing block. A block that was
/// empty on both sides of the caret is replaced outright.
pub fn paste_at_caret(
    blocks: &[Block],
    id: &str,
    offset: usize,
    pasted: Vec<Block>,
    mut new_id: impl FnMut() -> String,
) -> Option<PasteResult> {
    let idx = position(blocks, id)?;
    let (focus_block_id, cursor_offset) = landing(&pasted)?;
    let target = &blocks[idx];
    let split = SplitInfo::at(&target.content, offset);

    let mut pieces = Vec::with_capacity(pasted.len() + 2);
    if !split.content_before.is_empty() {
        let mut head = target.clone();
        head.content = split.content_before.clone();
        pieces.push(head);
    }
    pieces.extend(pasted);
    if !split.content_after.is_empty() {
        if split.content_before.is_empty() {
            let mut tail = target.clone();
            tail.content = split.content_after;
            pieces.push(tail);
        } else {
            pieces.push(Block::paragraph(new_id(), split.content_after));
        }
    }

    let mut out = Vec::with_capacity(blocks.len() + pieces.len());
    out.extend(blocks[..idx].iter().cloned());
    out.extend(pieces);
    out.extend(blocks[idx + 1..].iter().cloned());

    Some(PasteResult {
        blocks: out,
        focus_block_id,
        cursor_offset,
    })
}

/// Replaces the whole selection with `pasted`.
pub fn paste_over_selection(
    blocks: &[Block],
    selection: &HashSet<String>,
    pasted: Vec<Block>,
) -> Option<PasteResult> {
    let (focus_block_id, cursor_offset) = landing(&pasted)?;
    match replace_blocks(blocks, selection, pasted) {
        Cow::Borrowed(_) => None,
        Cow::Owned(out) => Some(PasteResult {
            blocks: out,
            focus_block_id,
            cursor_offset,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::BlockType;

    fn b(id: &str, kind: BlockType, content: &str) -> Block {
        Block::new(id, kind, content)
    }

    fn seq_ids() -> impl FnMut() -> String {
        let mut n = 0;
        move || {
            n += 1;
            format!("n{}", n)
        }
    }

    fn set(items: &[&str]) -> HashSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn multiline_content_copies_as_one_line() {
        let blocks = vec![
            b("1", BlockType::Paragraph, "line one\nline two"),
            b("2", BlockType::Bullet, "c"),
        ];
        let text = serialize_selection(&blocks, &set(&["1", "2"]));
        assert_eq!(text, "line one line two\n- c");

        let pasted = parse_blocks(&text, &PrefixTable::default(), seq_ids());
        let shape: Vec<(BlockType, &str)> = pasted.iter().map(|b| (b.kind, b.content.as_str())).collect();
        assert_eq!(
            shape,
            vec![
                (BlockType::Paragraph, "line one line two"),
                (BlockType::Bullet, "c")
            ]
        );
    }

    #[test]
    fn lines_carry_type_prefixes() {
        let blocks = vec![
            b("1", BlockType::Bullet, "milk"),
            b("2", BlockType::Todo, "call"),
            b("3", BlockType::TodoChecked, "paid"),
            b("4", BlockType::H1, "One"),
            b("5", BlockType::H2, "Two"),
            b("6", BlockType::H3, "Three"),
            b("7", BlockType::Quote, "wise"),
            b("8", BlockType::Paragraph, "plain"),
            b("9", BlockType::Numbered, "first"),
            b("10", BlockType::Code, "let x"),
        ];
        assert_eq!(
            serialize_blocks(&blocks),
            "- milk\n[] call\n[x] paid\n# One\n## Two\n### Three\n> wise\nplain\nfirst\nlet x"
        );
    }

    #[test]
    fn divider_serializes_as_marker() {
        assert_eq!(block_to_line(&b("d", BlockType::Divider, "")), "---");
    }

    #[test]
    fn selection_serializes_in_document_order() {
        let blocks = vec![
            b("1", BlockType::Paragraph, "a"),
            b("2", BlockType::Bullet, "b"),
            b("3", BlockType::Paragraph, "c"),
        ];
        assert_eq!(serialize_selection(&blocks, &set(&["3", "1"])), "a\nc");
    }

    #[test]
    fn parse_autodetects_each_line_and_skips_blanks() {
        let table = PrefixTable::default();
        let parsed = parse_blocks("# Plan\n\n- eggs\n[x] bread\nnotes\r\n", &table, seq_ids());
        let kinds: Vec<BlockType> = parsed.iter().map(|b| b.kind).collect();
        assert_eq!(
            kinds,
            vec![BlockType::H1, BlockType::Bullet, BlockType::TodoChecked, BlockType::Paragraph]
        );
        assert_eq!(parsed[1].content, "eggs");
        assert_eq!(parsed[3].content, "notes");
        assert_eq!(parsed[0].id, "n1");
    }

    #[test]
    fn copied_text_parses_back_to_same_types() {
        let table = PrefixTable::default();
        let blocks = vec![
            b("1", BlockType::H2, "Two"),
            b("2", BlockType::Todo, "task"),
            b("3", BlockType::Divider, ""),
        ];
        let parsed = parse_blocks(&serialize_blocks(&blocks), &table, seq_ids());
        let pairs: Vec<(BlockType, &str)> = parsed.iter().map(|b| (b.kind, b.content.as_str())).collect();
        assert_eq!(
            pairs,
            vec![(BlockType::H2, "Two"), (BlockType::Todo, "task"), (BlockType::Divider, "")]
        );
    }

    #[test]
    fn multiline_ignores_blank_lines() {
        assert!(is_multiline("a\nb"));
        assert!(!is_multiline("a\n\n"));
        assert!(!is_multiline("single"));
    }

    #[test]
    fn paste_at_caret_splits_target() {
        let blocks = vec![b("1", BlockType::Paragraph, "HelloWorld")];
        let pasted = vec![
            b("p1", BlockType::Bullet, "x"),
            b("p2", BlockType::Bullet, "yz"),
        ];
        let result = paste_at_caret(&blocks, "1", 5, pasted, seq_ids()).unwrap();
        let contents: Vec<&str> = result.blocks.iter().map(|b| b.content.as_str()).collect();
        assert_eq!(contents, vec!["Hello", "x", "yz", "World"]);
        assert_eq!(result.blocks[0].id, "1");
        assert_eq!(result.blocks[3].id, "n1");
        assert_eq!(result.focus_block_id, "p2");
        assert_eq!(result.cursor_offset, 2);
    }

    #[test]
    fn paste_at_start_keeps_target_as_tail() {
        let blocks = vec![b("1", BlockType::Quote, "tail")];
        let pasted = vec![b("p1", BlockType::Paragraph, "a"), b("p2", BlockType::Paragraph, "b")];
        let result = paste_at_caret(&blocks, "1", 0, pasted, seq_ids()).unwrap();
        let ids: Vec<&str> = result.blocks.iter().map(|b| b.id.as_str()).collect();
        assert_eq!(ids, vec!["p1", "p2", "1"]);
        assert_eq!(result.blocks[2].kind, BlockType::Quote);
    }

    #[test]
    fn paste_into_empty_block_replaces_it() {
        let blocks = vec![
            b("0", BlockType::Paragraph, "keep"),
            b("1", BlockType::Paragraph, ""),
        ];
        let pasted = vec![b("p1", BlockType::H1, "a"), b("p2", BlockType::Paragraph, "b")];
        let result = paste_at_caret(&blocks, "1", 0, pasted, seq_ids()).unwrap();
        let ids: Vec<&str> = result.blocks.iter().map(|b| b.id.as_str()).collect();
        assert_eq!(ids, vec!["0", "p1", "p2"]);
    }

    #[test]
    fn paste_with_nothing_parsed_is_none() {
        let blocks = vec![b("1", BlockType::Paragraph, "x")];
        assert!(paste_at_caret(&blocks, "1", 0, vec![], seq_ids()).is_none());
        assert!(paste_over_selection(&blocks, &set(&["1"]), vec![]).is_none());
    }

    #[test]
    fn paste_over_selection_replaces_all_selected() {
        let blocks = vec![
            b("1", BlockType::Paragraph, "a"),
            b("2", BlockType::Paragraph, "b"),
            b("3", BlockType::Paragraph, "c"),
            b("4", BlockType::Paragraph, "d"),
        ];
        let pasted = vec![b("p1", BlockType::Paragraph, "new")];
        let result = paste_over_selection(&blocks, &set(&["2", "3"]), pasted).unwrap();
        let ids: Vec<&str> = result.blocks.iter().map(|b| b.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "p1", "4"]);
        assert_eq!(result.focus_block_id, "p1");
        assert_eq!(result.cursor_offset, 3);
    }
}
