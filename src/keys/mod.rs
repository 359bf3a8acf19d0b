pub mod parser;
pub mod preset;

use std::collections::HashMap;

use crossterm::event::{KeyEvent, KeyModifiers};

use crate::error::{BlockpadError, Result};
use crate::session::KeyInput;
use parser::Chord;
use preset::{get_preset, Action};

pub struct KeybindingMap {
    bindings: HashMap<KeyEvent, Action>,
}

impl KeybindingMap {
    pub fn from_preset(name: &str, overrides: &HashMap<String, String>) -> Result<Self> {
        let mut bindings = get_preset(name)
            .ok_or_else(|| BlockpadError::Config(format!("Unknown keybinding preset: {}", name)))?;

        for (action_name, key_str) in overrides {
            let action = Action::from_str(action_name)
                .ok_or_else(|| BlockpadError::Config(format!("Unknown action: {}", action_name)))?;
            let chord: Chord = key_str.parse()?;

            bindings.retain(|_, v| v != &action);
            for key_event in chord.events() {
                bindings.insert(key_event, action.clone());
            }
        }

        Ok(Self { bindings })
    }

    pub fn resolve(&self, key: &KeyEvent) -> Option<&Action> {
        // Lookup ignores event kind and lock-key state.
        let plain = KeyEvent::new(key.code, key.modifiers);
        self.bindings.get(&plain).or_else(|| {
            // Cmd falls back to the Ctrl binding
            if !key.modifiers.contains(KeyModifiers::SUPER) {
                return None;
            }
            let mods = key.modifiers.difference(KeyModifiers::SUPER) | KeyModifiers::CONTROL;
            self.bindings.get(&KeyEvent::new(key.code, mods))
        })
    }

    pub fn hints(&self) -> Vec<(String, &'static str)> {
        let important = [
            Action::Quit,
            Action::Undo,
            Action::NextDocument,
            Action::ToggleTimer,
            Action::Help,
        ];

        let mut hints = Vec::new();
        for action in &important {
            if let Some((key_event, _)) = self.bindings.iter().find(|(_, a)| *a == action) {
                hints.push((format_key_event(key_event), action.hint_text()));
            }
        }
        hints
    }

    /// Every bound action, grouped by action name.
    pub fn help(&self) -> Vec<(String, &'static str)> {
        let mut entries: Vec<(String, &'static str)> = self
            .bindings
            .iter()
            .map(|(key, action)| (format_key_event(key), action.hint_text()))
            .collect();
        entries.sort_by(|a, b| a.1.cmp(b.1).then_with(|| a.0.cmp(&b.0)));
        entries
    }
}

fn format_key_event(key: &KeyEvent) -> String {
    Chord::from_event(key).map_or_else(|| "?".to_string(), |chord| chord.to_string())
}

/// Translates a terminal key event into the editor session's key type.
/// Ctrl and Cmd both count as the primary modifier.
pub fn session_input(event: &KeyEvent) -> Option<KeyInput> {
    Chord::from_event(event)?.to_input()
}
