use std::collections::HashMap;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// Application-level commands. Editing keys (Enter, arrows, Tab, copy and
/// paste) belong to the editor session and are never bound here.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Action {
    Quit,
    Undo,
    Redo,
    Save,
    Help,
    NewDocument,
    NextDocument,
    PrevDocument,
    ToggleTimer,
}

impl Action {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "quit" => Some(Self::Quit),
            "undo" => Some(Self::Undo),
            "redo" => Some(Self::Redo),
            "save" => Some(Self::Save),
            "help" => Some(Self::Help),
            "new_document" => Some(Self::NewDocument),
            "next_document" => Some(Self::NextDocument),
            "prev_document" => Some(Self::PrevDocument),
            "toggle_timer" => Some(Self::ToggleTimer),
            _ => None,
        }
    }

    pub fn hint_text(&self) -> &'static str {
        match self {
            Self::Quit => "quit",
            Self::Undo => "undo",
            Self::Redo => "redo",
            Self::Save => "save",
            Self::Help => "help",
            Self::NewDocument => "new doc",
            Self::NextDocument => "next doc",
            Self::PrevDocument => "prev doc",
            Self::ToggleTimer => "timer",
        }
    }
}

fn key(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code, KeyModifiers::NONE)
}

fn ctrl(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code, KeyModifiers::CONTROL)
}

fn alt(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code, KeyModifiers::ALT)
}

fn ctrl_shift(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code, KeyModifiers::CONTROL | KeyModifiers::SHIFT)
}

pub fn standard_preset() -> HashMap<KeyEvent, Action> {
    let mut m = HashMap::new();
    m.insert(ctrl(KeyCode::Char('q')), Action::Quit);
    m.insert(ctrl(KeyCode::Char('z')), Action::Undo);
    m.insert(ctrl_shift(KeyCode::Char('z')), Action::Redo);
    m.insert(ctrl(KeyCode::Char('y')), Action::Redo);
    m.insert(ctrl(KeyCode::Char('s')), Action::Save);
    m.insert(key(KeyCode::F(1)), Action::Help);
    m.insert(ctrl(KeyCode::Char('n')), Action::NewDocument);
    m.insert(ctrl(KeyCode::PageDown), Action::NextDocument);
    m.insert(ctrl(KeyCode::PageUp), Action::PrevDocument);
    m.insert(ctrl(KeyCode::Char('t')), Action::ToggleTimer);
    m
}

pub fn emacs_preset() -> HashMap<KeyEvent, Action> {
    let mut m = HashMap::new();
    m.insert(ctrl(KeyCode::Char('q')), Action::Quit);
    m.insert(ctrl(KeyCode::Char('/')), Action::Undo);
    m.insert(ctrl(KeyCode::Char('_')), Action::Undo);
    m.insert(alt(KeyCode::Char('/')), Action::Redo);
    m.insert(ctrl(KeyCode::Char('s')), Action::Save);
    m.insert(ctrl(KeyCode::Char('h')), Action::Help);
    m.insert(alt(KeyCode::Char('n')), Action::NewDocument);
    m.insert(alt(KeyCode::Char('>')), Action::NextDocument);
    m.insert(alt(KeyCode::Char('<')), Action::PrevDocument);
    m.insert(alt(KeyCode::Char('t')), Action::ToggleTimer);
    m
}

pub fn get_preset(name: &str) -> Option<HashMap<KeyEvent, Action>> {
    match name.to_lowercase().as_str() {
        "standard" => Some(standard_preset()),
        "emacs" => Some(emacs_preset()),
        _ => None,
    }
}
