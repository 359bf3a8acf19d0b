use thiserror::Error;

#[derive(Debug, Error)]
pub enum BlockpadError {
    #[error("Config error: {0}")]
    Config(String),
    #[error("Document not found: {0}")]
    NotFound(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("TOML parse error: {0}")]
    TomlDe(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, BlockpadError>;

/// Structured error data for the message channel
#[derive(Debug, Clone, PartialEq)]
pub enum ErrorInfo {
    Load { document: String, message: String },
    Write { document: String, message: String },
    Other(String),
}

impl ErrorInfo {
    pub fn load(document: &str, e: &BlockpadError) -> Self {
        ErrorInfo::Load {
            document: document.to_string(),
            message: e.to_string(),
        }
    }

    pub fn write(document: &str, e: &BlockpadError) -> Self {
        ErrorInfo::Write {
            document: document.to_string(),
            message: e.to_string(),
        }
    }
}

/// Ready-to-render error popup data
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorPopup {
    pub title: String,
    pub message: String,
    pub hint: String,
}

impl ErrorPopup {
    pub fn from_error_info(info: &ErrorInfo) -> Self {
        match info {
            ErrorInfo::Load { document, message } => Self {
                title: "Load Failed".into(),
                message: truncate(&format!("{}: {}", document, message), 80),
                hint: "Check the store directory in config.toml".into(),
            },
            ErrorInfo::Write { document, message } => Self {
                title: "Write Failed".into(),
                message: truncate(&format!("{}: {}", document, message), 80),
                hint: "Your changes may not have been saved".into(),
            },
            ErrorInfo::Other(msg) => Self {
                title: "Error".into(),
                message: truncate(msg, 80),
                hint: "Press any key to dismiss".into(),
            },
        }
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max).collect();
        format!("{}...", truncated)
    }
}
