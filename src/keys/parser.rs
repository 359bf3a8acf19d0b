//! Key chords as written in `config.toml` ("Ctrl+Shift+z", "Mod+s", "F1").
//!
//! A chord names keys in the editor's own vocabulary (`session::Key`) plus the
//! few extra keys only app-level bindings use. `Mod` (or `Primary`) stands for
//! the primary modifier and binds both Ctrl and Cmd.

use std::fmt;
use std::str::FromStr;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::error::{BlockpadError, Result};
use crate::session::{Key, KeyInput, Modifiers};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChordKey {
    Session(Key),
    PageUp,
    PageDown,
    Insert,
    F(u8),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Primary {
    #[default]
    None,
    Ctrl,
    Cmd,
    /// Matches Ctrl or Cmd.
    Either,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Chord {
    pub key: ChordKey,
    pub primary: Primary,
    pub shift: bool,
    pub alt: bool,
}

impl Chord {
    pub fn from_event(event: &KeyEvent) -> Option<Self> {
        let key = match event.code {
            KeyCode::Up => ChordKey::Session(Key::Up),
            KeyCode::Down => ChordKey::Session(Key::Down),
            KeyCode::Left => ChordKey::Session(Key::Left),
            KeyCode::Right => ChordKey::Session(Key::Right),
            KeyCode::Home => ChordKey::Session(Key::Home),
            KeyCode::End => ChordKey::Session(Key::End),
            KeyCode::Enter => ChordKey::Session(Key::Enter),
            KeyCode::Esc => ChordKey::Session(Key::Escape),
            KeyCode::Backspace => ChordKey::Session(Key::Backspace),
            KeyCode::Delete => ChordKey::Session(Key::Delete),
            KeyCode::Tab => ChordKey::Session(Key::Tab),
            KeyCode::BackTab => ChordKey::Session(Key::BackTab),
            KeyCode::Char(c) => ChordKey::Session(Key::Char(c)),
            KeyCode::PageUp => ChordKey::PageUp,
            KeyCode::PageDown => ChordKey::PageDown,
            KeyCode::Insert => ChordKey::Insert,
            KeyCode::F(n) => ChordKey::F(n),
            _ => return None,
        };
        let m = event.modifiers;
        let primary = match (m.contains(KeyModifiers::CONTROL), m.contains(KeyModifiers::SUPER)) {
            (true, true) => Primary::Either,
            (true, false) => Primary::Ctrl,
            (false, true) => Primary::Cmd,
            (false, false) => Primary::None,
        };
        Some(Self {
            key,
            primary,
            shift: m.contains(KeyModifiers::SHIFT),
            alt: m.contains(KeyModifiers::ALT),
        })
    }

    /// The terminal events this chord stands for. `Mod` chords yield one
    /// event per primary modifier.
    pub fn events(&self) -> Vec<KeyEvent> {
        let code = self.key_code();
        let mut base = KeyModifiers::NONE;
        if self.shift {
            base |= KeyModifiers::SHIFT;
        }
        if self.alt {
            base |= KeyModifiers::ALT;
        }
        let primaries: &[KeyModifiers] = match self.primary {
            Primary::None => &[KeyModifiers::NONE],
            Primary::Ctrl => &[KeyModifiers::CONTROL],
            Primary::Cmd => &[KeyModifiers::SUPER],
            Primary::Either => &[KeyModifiers::CONTROL, KeyModifiers::SUPER],
        };
        primaries.iter().map(|p| KeyEvent::new(code, base | *p)).collect()
    }

    /// The chord as the editor session sees it, if the session knows the key.
    pub fn to_input(&self) -> Option<KeyInput> {
        let ChordKey::Session(key) = self.key else {
            return None;
        };
        Some(KeyInput::new(
            key,
            Modifiers {
                shift: self.shift,
                primary: self.primary != Primary::None,
                alt: self.alt,
            },
        ))
    }

    fn key_code(&self) -> KeyCode {
        match self.key {
            ChordKey::Session(key) => match key {
                Key::Up => KeyCode::Up,
                Key::Down => KeyCode::Down,
                Key::Left => KeyCode::Left,
                Key::Right => KeyCode::Right,
                Key::Home => KeyCode::Home,
                Key::End => KeyCode::End,
                Key::Enter => KeyCode::Enter,
                Key::Escape => KeyCode::Esc,
                Key::Backspace => KeyCode::Backspace,
                Key::Delete => KeyCode::Delete,
                Key::Tab => KeyCode::Tab,
                Key::BackTab => KeyCode::BackTab,
                Key::Char(c) => KeyCode::Char(c),
            },
            ChordKey::PageUp => KeyCode::PageUp,
            ChordKey::PageDown => KeyCode::PageDown,
            ChordKey::Insert => KeyCode::Insert,
            ChordKey::F(n) => KeyCode::F(n),
        }
    }
}

fn parse_chord_key(name: &str) -> Result<ChordKey> {
    let key = match name.to_lowercase().as_str() {
        "enter" | "return" => Key::Enter,
        "esc" | "escape" => Key::Escape,
        "tab" => Key::Tab,
        "backtab" => Key::BackTab,
        "backspace" | "bs" => Key::Backspace,
        "delete" | "del" => Key::Delete,
        "home" => Key::Home,
        "end" => Key::End,
        "up" | "↑" => Key::Up,
        "down" | "↓" => Key::Down,
        "left" | "←" => Key::Left,
        "right" | "→" => Key::Right,
        "space" => Key::Char(' '),
        "insert" | "ins" => return Ok(ChordKey::Insert),
        "pageup" | "pgup" => return Ok(ChordKey::PageUp),
        "pagedown" | "pgdn" => return Ok(ChordKey::PageDown),
        lower => {
            let mut chars = lower.chars();
            match (chars.next(), chars.next()) {
                (Some(ch), None) => Key::Char(ch),
                (Some('f'), Some(_)) => return parse_function_key(&lower[1..]),
                _ => return Err(BlockpadError::Config(format!("Unknown key: {}", name))),
            }
        }
    };
    Ok(ChordKey::Session(key))
}

fn parse_function_key(digits: &str) -> Result<ChordKey> {
    match digits.parse::<u8>() {
        Ok(n @ 1..=12) => Ok(ChordKey::F(n)),
        Ok(n) => Err(BlockpadError::Config(format!("Function key out of range: F{}", n))),
        Err(_) => Err(BlockpadError::Config(format!("Invalid function key: F{}", digits))),
    }
}

impl FromStr for Chord {
    type Err = BlockpadError;

    fn from_str(input: &str) -> Result<Self> {
        let (modifiers, key_name) = match input.rsplit_once('+') {
            // "Ctrl++" binds the plus key itself
            Some((mods, "")) if mods.ends_with('+') => (&mods[..mods.len() - 1], "+"),
            Some((mods, key)) => (mods, key),
            None => ("", input),
        };
        let key_name = key_name.trim();
        if key_name.is_empty() {
            return Err(BlockpadError::Config(format!("No key code found in '{}'", input)));
        }

        let mut chord = Chord {
            key: parse_chord_key(key_name)?,
            primary: Primary::None,
            shift: false,
            alt: false,
        };
        for part in modifiers.split('+').map(str::trim).filter(|p| !p.is_empty()) {
            match part.to_lowercase().as_str() {
                "ctrl" | "control" => chord.primary = merge_primary(chord.primary, Primary::Ctrl),
                "cmd" | "super" => chord.primary = merge_primary(chord.primary, Primary::Cmd),
                "mod" | "primary" => chord.primary = Primary::Either,
                "shift" => chord.shift = true,
                "alt" | "option" => chord.alt = true,
                _ => {
                    return Err(BlockpadError::Config(format!(
                        "Unknown modifier '{}' in key '{}'",
                        part, input
                    )))
                }
            }
        }
        Ok(chord)
    }
}

fn merge_primary(current: Primary, next: Primary) -> Primary {
    match current {
        Primary::None => next,
        c if c == next => c,
        _ => Primary::Either,
    }
}

impl fmt::Display for Chord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.primary {
            Primary::None => {}
            Primary::Ctrl => f.write_str("Ctrl+")?,
            Primary::Cmd => f.write_str("Cmd+")?,
            Primary::Either => f.write_str("Mod+")?,
        }
        if self.alt {
            f.write_str("Alt+")?;
        }
        if self.shift {
            f.write_str("Shift+")?;
        }
        match self.key {
            ChordKey::Session(Key::Char(' ')) => f.write_str("Space"),
            ChordKey::Session(Key::Char(c)) => write!(f, "{}", c),
            ChordKey::Session(Key::Enter) => f.write_str("Enter"),
            ChordKey::Session(Key::Escape) => f.write_str("Esc"),
            ChordKey::Session(Key::Tab) => f.write_str("Tab"),
            ChordKey::Session(Key::BackTab) => f.write_str("BackTab"),
            ChordKey::Session(Key::Backspace) => f.write_str("Backspace"),
            ChordKey::Session(Key::Delete) => f.write_str("Delete"),
            ChordKey::Session(Key::Up) => f.write_str("↑"),
            ChordKey::Session(Key::Down) => f.write_str("↓"),
            ChordKey::Session(Key::Left) => f.write_str("←"),
            ChordKey::Session(Key::Right) => f.write_str("→"),
            ChordKey::Session(Key::Home) => f.write_str("Home"),
            ChordKey::Session(Key::End) => f.write_str("End"),
            ChordKey::PageUp => f.write_str("PageUp"),
            ChordKey::PageDown => f.write_str("PageDown"),
            ChordKey::Insert => f.write_str("Insert"),
            ChordKey::F(n) => write!(f, "F{}", n),
        }
    }
}
