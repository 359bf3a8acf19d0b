/// Keys the session reacts to. Front-ends translate their native events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Up,
    Down,
    Left,
    Right,
    Home,
    End,
    Enter,
    Escape,
    Backspace,
    Delete,
    Tab,
    BackTab,
    Char(char),
}

/// `primary` is Ctrl on Linux/Windows and Cmd on macOS.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Modifiers {
    pub shift: bool,
    pub primary: bool,
    pub alt: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyInput {
    pub key: Key,
    pub modifiers: Modifiers,
}

impl KeyInput {
    pub fn new(key: Key, modifiers: Modifiers) -> Self {
        Self { key, modifiers }
    }

    pub fn plain(key: Key) -> Self {
        Self::new(key, Modifiers::default())
    }

    pub fn shift(key: Key) -> Self {
        Self::new(
            key,
            Modifiers {
                shift: true,
                ..Modifiers::default()
            },
        )
    }

    pub fn primary(key: Key) -> Self {
        Self::new(
            key,
            Modifiers {
                primary: true,
                ..Modifiers::default()
            },
        )
    }

    pub fn primary_shift(key: Key) -> Self {
        Self::new(
            key,
            Modifiers {
                shift: true,
                primary: true,
                alt: false,
            },
        )
    }

    /// Shift+Tab arrives as `BackTab` from most terminals and as
    /// `Tab` with shift from others.
    pub(crate) fn is_unindent(&self) -> bool {
        self.key == Key::BackTab || (self.key == Key::Tab && self.modifiers.shift)
    }
}
