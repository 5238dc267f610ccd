/// Physical key or button as reported by the platform hook, before normalization
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawKey {
    Char(char),
    Up,
    Down,
    Left,
    Right,
    Escape,
    Enter,
    Tab,
    Space,
    Backspace,
    ShiftLeft,
    ShiftRight,
    ControlLeft,
    ControlRight,
    AltLeft,
    AltRight,
    MouseLeft,
    MouseRight,
    MouseMiddle,
    Unknown,
}

impl RawKey {
    /// Canonical key name used in held-key sets and keymap aliases.
    ///
    /// Unknown keys have no name and are dropped by the listener.
    pub fn canonical_name(self) -> Option<String> {
        let name = match self {
            RawKey::Char(c) if c.is_alphanumeric() || c.is_ascii_punctuation() => {
                return Some(c.to_lowercase().collect());
            }
            RawKey::Char(_) => return None,
            RawKey::Up => "up",
            RawKey::Down => "down",
            RawKey::Left => "left",
            RawKey::Right => "right",
            RawKey::Escape => "esc",
            RawKey::Enter => "enter",
            RawKey::Tab => "tab",
            RawKey::Space => "space",
            RawKey::Backspace => "backspace",
            RawKey::ShiftLeft => "left_shift",
            RawKey::ShiftRight => "right_shift",
            RawKey::ControlLeft => "left_ctrl",
            RawKey::ControlRight => "right_ctrl",
            RawKey::AltLeft => "left_alt",
            RawKey::AltRight => "right_alt",
            RawKey::MouseLeft => "mouse_left",
            RawKey::MouseRight => "mouse_right",
            RawKey::MouseMiddle => "mouse_middle",
            RawKey::Unknown => return None,
        };
        Some(name.to_string())
    }
}

/// Press or release of a raw key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyEvent {
    Press(RawKey),
    Release(RawKey),
}
