use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Deepest indentation a bullet may reach.
pub const MAX_INDENT_LEVEL: u32 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BlockType {
    Paragraph,
    H1,
    H2,
    H3,
    Bullet,
    Numbered,
    Todo,
    TodoChecked,
    Quote,
    Code,
    Divider,
    PageEmbed,
}

/// What a block type is allowed to do. One row per type, see [`BlockType::caps`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    pub is_list: bool,
    pub can_indent: bool,
    pub inherits_level_on_split: bool,
    /// Type given to the block created when Enter is pressed inside this one.
    pub continues_as: BlockType,
    pub clipboard_prefix: Option<&'static str>,
    pub accepts_content: bool,
}

const fn caps(
    is_list: bool,
    can_indent: bool,
    continues_as: BlockType,
    clipboard_prefix: Option<&'static str>,
    accepts_content: bool,
) -> Capabilities {
    Capabilities {
        is_list,
        can_indent,
        inherits_level_on_split: is_list,
        continues_as,
        clipboard_prefix,
        accepts_content,
    }
}

impl BlockType {
    pub const ALL: [BlockType; 12] = [
        BlockType::Paragraph,
        BlockType::H1,
        BlockType::H2,
        BlockType::H3,
        BlockType::Bullet,
        BlockType::Numbered,
        BlockType::Todo,
        BlockType::TodoChecked,
        BlockType::Quote,
        BlockType::Code,
        BlockType::Divider,
        BlockType::PageEmbed,
    ];

    pub const fn caps(self) -> Capabilities {
        use BlockType::*;
        match self {
            Paragraph => caps(false, false, Paragraph, None, true),
            H1 => caps(false, false, Paragraph, Some("# "), true),
            H2 => caps(false, false, Paragraph, Some("## "), true),
            H3 => caps(false, false, Paragraph, Some("### "), true),
            Bullet => caps(true, true, Bullet, Some("- "), true),
            Numbered => caps(true, false, Numbered, None, true),
            Todo => caps(true, false, Todo, Some("[] "), true),
            TodoChecked => caps(true, false, Todo, Some("[x] "), true),
            Quote => caps(false, false, Paragraph, Some("> "), true),
            Code => caps(false, false, Paragraph, None, true),
            Divider => caps(false, false, Paragraph, Some("---"), false),
            PageEmbed => caps(false, false, Paragraph, None, true),
        }
    }

    pub fn is_list(self) -> bool {
        self.caps().is_list
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Paragraph => "paragraph",
            Self::H1 => "h1",
            Self::H2 => "h2",
            Self::H3 => "h3",
            Self::Bullet => "bullet",
            Self::Numbered => "numbered",
            Self::Todo => "todo",
            Self::TodoChecked => "todo-checked",
            Self::Quote => "quote",
            Self::Code => "code",
            Self::Divider => "divider",
            Self::PageEmbed => "page-embed",
        }
    }
}

impl fmt::Display for BlockType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BlockType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.to_lowercase();
        BlockType::ALL
            .into_iter()
            .find(|t| t.as_str() == lower)
            .ok_or_else(|| format!("unknown block type: {}", s))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: BlockType,
    #[serde(default)]
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<u32>,
}

impl Block {
    pub fn new(id: impl Into<String>, kind: BlockType, content: impl Into<String>) -> Self {
        let content = if kind.caps().accepts_content {
            content.into()
        } else {
            String::new()
        };
        Self {
            id: id.into(),
            kind,
            content,
            level: None,
        }
    }

    pub fn paragraph(id: impl Into<String>, content: impl Into<String>) -> Self {
        Self::new(id, BlockType::Paragraph, content)
    }

    pub fn with_level(mut self, level: u32) -> Self {
        self.level = Some(level);
        self
    }

    /// Content length in characters, the unit every caret offset is measured in.
    pub fn char_len(&self) -> usize {
        self.content.chars().count()
    }
}

pub fn generate_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_types_are_flagged() {
        let lists: Vec<BlockType> = BlockType::ALL
            .into_iter()
            .filter(|t| t.is_list())
            .collect();
        assert_eq!(
            lists,
            vec![
                BlockType::Bullet,
                BlockType::Numbered,
                BlockType::Todo,
                BlockType::TodoChecked
            ]
        );
    }

    #[test]
    fn only_bullets_indent() {
        for t in BlockType::ALL {
            assert_eq!(t.caps().can_indent, t == BlockType::Bullet, "{}", t);
        }
    }

    #[test]
    fn checked_todo_continues_as_todo() {
        assert_eq!(BlockType::TodoChecked.caps().continues_as, BlockType::Todo);
        assert_eq!(BlockType::H1.caps().continues_as, BlockType::Paragraph);
        assert_eq!(BlockType::Numbered.caps().continues_as, BlockType::Numbered);
    }

    #[test]
    fn type_names_round_trip_through_from_str() {
        for t in BlockType::ALL {
            assert_eq!(t.as_str().parse::<BlockType>().unwrap(), t);
        }
        assert!("heading".parse::<BlockType>().is_err());
    }

    #[test]
    fn serde_uses_kebab_case_and_type_key() {
        let block = Block::new("1", BlockType::TodoChecked, "done");
        let json = serde_json::to_value(&block).unwrap();
        assert_eq!(json["type"], "todo-checked");
        assert!(json.get("level").is_none());

        let parsed: Block =
            serde_json::from_str(r#"{"id":"2","type":"bullet","content":"x","level":2}"#).unwrap();
        assert_eq!(parsed.kind, BlockType::Bullet);
        assert_eq!(parsed.level, Some(2));
    }

    #[test]
    fn divider_never_holds_content() {
        let block = Block::new("d", BlockType::Divider, "ignored");
        assert_eq!(block.content, "");
    }

    #[test]
    fn generated_ids_are_unique() {
        assert_ne!(generate_id(), generate_id());
    }
}
