use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

use crate::error::{BlockpadError, Result};
use crate::keys::preset::get_preset;
use crate::markdown::PrefixTable;

const APP_DIR: &str = "blockpad";

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub editor: EditorConfig,
    /// `marker = "block-type"` pairs. Empty means the built-in table.
    #[serde(default)]
    pub markdown: BTreeMap<String, String>,
    #[serde(default)]
    pub keybindings: KeybindingsConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct StoreConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct EditorConfig {
    /// Width used for caret geometry before the terminal reports its size.
    #[serde(default = "default_wrap_width")]
    pub wrap_width: u16,
    #[serde(default = "default_autosave_ms")]
    pub autosave_ms: u64,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            wrap_width: default_wrap_width(),
            autosave_ms: default_autosave_ms(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct KeybindingsConfig {
    #[serde(default = "default_preset")]
    pub preset: String,
    #[serde(default)]
    pub bindings: HashMap<String, String>,
}

impl Default for KeybindingsConfig {
    fn default() -> Self {
        Self {
            preset: default_preset(),
            bindings: HashMap::new(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LoggingConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir: Option<PathBuf>,
    #[serde(default = "default_filter")]
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            dir: None,
            filter: default_filter(),
        }
    }
}

fn default_wrap_width() -> u16 {
    80
}

fn default_autosave_ms() -> u64 {
    1000
}

fn default_preset() -> String {
    "standard".into()
}

fn default_filter() -> String {
    "blockpad=info,warn".into()
}

impl AppConfig {
    pub fn load_from_path(config_path: &Path) -> Result<Self> {
        let config: AppConfig = Figment::new()
            .merge(Serialized::defaults(AppConfig::default()))
            .merge(Toml::file(config_path))
            .merge(Env::prefixed("BLOCKPAD_").split("__"))
            .extract()
            .map_err(|e| BlockpadError::Config(e.to_string()))?;

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.editor.wrap_width < 10 {
            return Err(BlockpadError::Config(
                "editor.wrap_width must be at least 10".into(),
            ));
        }
        if self.editor.autosave_ms == 0 {
            return Err(BlockpadError::Config(
                "editor.autosave_ms must be positive".into(),
            ));
        }
        if get_preset(&self.keybindings.preset).is_none() {
            return Err(BlockpadError::Config(format!(
                "keybindings.preset '{}' is not one of: standard, emacs",
                self.keybindings.preset
            )));
        }
        if self.logging.filter.trim().is_empty() {
            return Err(BlockpadError::Config("logging.filter cannot be empty".into()));
        }
        self.prefix_table()?;
        Ok(())
    }

    pub fn prefix_table(&self) -> Result<PrefixTable> {
        if self.markdown.is_empty() {
            return Ok(PrefixTable::default());
        }
        PrefixTable::from_config(&self.markdown)
    }

    /// Tick interval is 250ms; autosave waits this many idle ticks.
    pub fn autosave_ticks(&self) -> u32 {
        (self.editor.autosave_ms / 250).max(1) as u32
    }

    pub fn store_dir(&self) -> PathBuf {
        self.store
            .dir
            .clone()
            .unwrap_or_else(|| data_dir().join("documents"))
    }

    pub fn log_dir(&self) -> PathBuf {
        std::env::var("BLOCKPAD_LOG_DIR")
            .ok()
            .map(PathBuf::from)
            .or_else(|| self.logging.dir.clone())
            .unwrap_or_else(|| data_dir().join("logs"))
    }

    pub fn config_dir() -> Option<PathBuf> {
        std::env::var("XDG_CONFIG_HOME")
            .ok()
            .map(|xdg| PathBuf::from(xdg).join(APP_DIR))
            .or_else(|| {
                directories::BaseDirs::new()
                    .map(|dirs| dirs.home_dir().join(".config").join(APP_DIR))
            })
    }

    pub fn write_default(path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = r##"[store]
# dir = "~/.local/share/blockpad/documents"

[editor]
wrap_width = 80
autosave_ms = 1000

# Markdown shortcuts typed at the start of a paragraph.
# Leave the table out to use the built-in set.
# [markdown]
# "#" = "h1"
# "-" = "bullet"
# "[]" = "todo"

[keybindings]
preset = "standard"  # standard | emacs

# Override specific keys:
# [keybindings.bindings]
# quit = "Ctrl+w"
# toggle_timer = "F2"

[logging]
filter = "blockpad=info,warn"
# dir = "/tmp/blockpad"  # or set BLOCKPAD_LOG_DIR
"##;

        std::fs::write(path, content)?;
        Ok(())
    }
}

fn data_dir() -> PathBuf {
    directories::ProjectDirs::from("", "", APP_DIR)
        .map(|dirs| dirs.data_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from(".").join(APP_DIR))
}
