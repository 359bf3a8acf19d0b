use std::collections::BTreeMap;
use std::sync::LazyLock;

use crate::block::{Block, BlockType};
use crate::error::{BlockpadError, Result};

/// A literal marker typed at the start of a paragraph and the type it turns
/// the paragraph into. The marker is stored without its trailing space.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrefixRule {
    pub marker: String,
    pub kind: BlockType,
}

impl PrefixRule {
    pub fn new(marker: &str, kind: BlockType) -> Self {
        Self {
            marker: marker.trim_end().to_string(),
            kind,
        }
    }

    /// Content-bearing types need `marker + " "`; the others (divider) need
    /// the bare marker and nothing else.
    fn matches(&self, text: &str) -> bool {
        if self.kind.caps().accepts_content {
            text.strip_prefix(self.marker.as_str())
                .is_some_and(|rest| rest.starts_with(' '))
        } else {
            text == self.marker
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Detected {
    pub kind: BlockType,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PrefixTable {
    rules: Vec<PrefixRule>,
}

static DEFAULT_TABLE: LazyLock<PrefixTable> = LazyLock::new(PrefixTable::default);

impl Default for PrefixTable {
    fn default() -> Self {
        use BlockType::*;
        Self::new(vec![
            PrefixRule::new("#", H1),
            PrefixRule::new("##", H2),
            PrefixRule::new("###", H3),
            PrefixRule::new("-", Bullet),
            PrefixRule::new("*", Bullet),
            PrefixRule::new("1.", Numbered),
            PrefixRule::new("[]", Todo),
            PrefixRule::new("[ ]", Todo),
            PrefixRule::new("[x]", TodoChecked),
            PrefixRule::new(">", Quote),
            PrefixRule::new("```", Code),
            PrefixRule::new("---", Divider),
        ])
    }
}

impl PrefixTable {
    pub fn new(mut rules: Vec<PrefixRule>) -> Self {
        rules.retain(|r| !r.marker.is_empty());
        // Longest marker wins when two could match.
        rules.sort_by_key(|r| std::cmp::Reverse(r.marker.chars().count()));
        Self { rules }
    }

    /// Builds a table from `marker = "type"` pairs.
    pub fn from_config(entries: &BTreeMap<String, String>) -> Result<Self> {
        let mut rules = Vec::with_capacity(entries.len());
        for (marker, type_name) in entries {
            let kind: BlockType = type_name
                .parse()
                .map_err(|e: String| BlockpadError::Config(format!("markdown prefix '{}': {}", marker, e)))?;
            if marker.trim().is_empty() {
                return Err(BlockpadError::Config("markdown prefix cannot be empty".into()));
            }
            rules.push(PrefixRule::new(marker, kind));
        }
        Ok(Self::new(rules))
    }

    pub fn rules(&self) -> &[PrefixRule] {
        &self.rules
    }

    fn rule_for(&self, text: &str) -> Option<&PrefixRule> {
        self.rules.iter().find(|r| r.matches(text))
    }

    /// Type implied by the text's leading marker, `Paragraph` when none matches.
    pub fn detect(&self, text: &str) -> BlockType {
        self.rule_for(text)
            .map(|r| r.kind)
            .unwrap_or(BlockType::Paragraph)
    }

    /// Removes the marker for `kind` plus exactly one following space.
    pub fn strip_prefix(&self, text: &str, kind: BlockType) -> String {
        let rule = self
            .rules
            .iter()
            .find(|r| r.kind == kind && r.matches(text));
        match rule {
            Some(_) if !kind.caps().accepts_content => String::new(),
            Some(r) => text[r.marker.len() + 1..].to_string(),
            None => text.to_string(),
        }
    }

    /// Conversion to apply after `text` was typed into `block`. Only plain
    /// paragraphs convert, and only into a different type.
    pub fn autodetect(&self, block: &Block, text: &str) -> Option<Detected> {
        if block.kind != BlockType::Paragraph {
            return None;
        }
        let kind = self.detect(text);
        if kind == BlockType::Paragraph {
            return None;
        }
        Some(Detected {
            kind,
            content: self.strip_prefix(text, kind),
        })
    }

    /// Type and content for one line of pasted text.
    pub fn parse_line(&self, line: &str) -> Detected {
        let kind = self.detect(line);
        Detected {
            kind,
            content: self.strip_prefix(line, kind),
        }
    }
}

pub fn detect_block_type(text: &str) -> BlockType {
    DEFAULT_TABLE.detect(text)
}

pub fn strip_prefix(text: &str, kind: BlockType) -> String {
    DEFAULT_TABLE.strip_prefix(text, kind)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_headings_by_depth() {
        assert_eq!(detect_block_type("# Title"), BlockType::H1);
        assert_eq!(detect_block_type("## Title"), BlockType::H2);
        assert_eq!(detect_block_type("### Title"), BlockType::H3);
        assert_eq!(detect_block_type("#### Title"), BlockType::Paragraph);
    }

    #[test]
    fn detects_list_markers() {
        assert_eq!(detect_block_type("- item"), BlockType::Bullet);
        assert_eq!(detect_block_type("* item"), BlockType::Bullet);
        assert_eq!(detect_block_type("1. item"), BlockType::Numbered);
        assert_eq!(detect_block_type("[] task"), BlockType::Todo);
        assert_eq!(detect_block_type("[ ] task"), BlockType::Todo);
        assert_eq!(detect_block_type("[x] task"), BlockType::TodoChecked);
    }

    #[test]
    fn detects_quote_code_and_divider() {
        assert_eq!(detect_block_type("> said"), BlockType::Quote);
        assert_eq!(detect_block_type("``` "), BlockType::Code);
        assert_eq!(detect_block_type("---"), BlockType::Divider);
        assert_eq!(detect_block_type("--- more"), BlockType::Paragraph);
    }

    #[test]
    fn marker_without_space_is_not_a_trigger() {
        assert_eq!(detect_block_type("#hashtag"), BlockType::Paragraph);
        assert_eq!(detect_block_type("-dash"), BlockType::Paragraph);
        assert_eq!(detect_block_type("#"), BlockType::Paragraph);
        assert_eq!(detect_block_type("$ task"), BlockType::Paragraph);
    }

    #[test]
    fn marker_typed_alone_with_space_triggers() {
        assert_eq!(detect_block_type("# "), BlockType::H1);
        assert_eq!(strip_prefix("# ", BlockType::H1), "");
    }

    #[test]
    fn strip_removes_marker_and_one_space() {
        assert_eq!(strip_prefix("# Title", BlockType::H1), "Title");
        assert_eq!(strip_prefix("##  spaced", BlockType::H2), " spaced");
        assert_eq!(strip_prefix("[x] done", BlockType::TodoChecked), "done");
        assert_eq!(strip_prefix("---", BlockType::Divider), "");
    }

    #[test]
    fn strip_with_mismatched_type_is_identity() {
        assert_eq!(strip_prefix("# Title", BlockType::Bullet), "# Title");
    }

    #[test]
    fn autodetect_only_converts_paragraphs() {
        let table = PrefixTable::default();
        let para = Block::paragraph("1", "");
        let detected = table.autodetect(&para, "- milk").unwrap();
        assert_eq!(detected.kind, BlockType::Bullet);
        assert_eq!(detected.content, "milk");

        let bullet = Block::new("2", BlockType::Bullet, "");
        assert!(table.autodetect(&bullet, "# nested").is_none());
        assert!(table.autodetect(&para, "plain").is_none());
    }

    #[test]
    fn custom_table_from_config() {
        let mut entries = BTreeMap::new();
        entries.insert("!".to_string(), "quote".to_string());
        entries.insert("todo ".to_string(), "todo".to_string());
        let table = PrefixTable::from_config(&entries).unwrap();
        assert_eq!(table.detect("! loud"), BlockType::Quote);
        assert_eq!(table.detect("todo buy"), BlockType::Todo);
        assert_eq!(table.strip_prefix("todo buy", BlockType::Todo), "buy");
        assert_eq!(table.detect("# not here"), BlockType::Paragraph);
    }

    #[test]
    fn config_rejects_unknown_type() {
        let mut entries = BTreeMap::new();
        entries.insert("%".to_string(), "callout".to_string());
        let err = PrefixTable::from_config(&entries).unwrap_err();
        assert!(err.to_string().contains("callout"));
    }

    #[test]
    fn rules_sorted_longest_first() {
        let table = PrefixTable::default();
        let lens: Vec<usize> = table.rules().iter().map(|r| r.marker.chars().count()).collect();
        let mut sorted = lens.clone();
        sorted.sort_by(|a, b| b.cmp(a));
        assert_eq!(lens, sorted);
    }

    #[test]
    fn parse_line_handles_plain_text() {
        let table = PrefixTable::default();
        let detected = table.parse_line("just words");
        assert_eq!(detected.kind, BlockType::Paragraph);
        assert_eq!(detected.content, "just words");
    }
}
