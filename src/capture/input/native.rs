//! Global keyboard and mouse-button hook via rdev
//!
//! `rdev::listen` never returns once installed, so stopping only deactivates the
//! handler; the hook thread lives until process exit.

use crate::capture::input::channel::{KeyEventHandler, KeySource};
use crate::capture::input::types::{KeyEvent, RawKey};
use crate::recorder::channel::{RecordingError, RecordingResult};
use rdev::{Button, EventType, Key};

pub struct RdevKeySource;

impl KeySource for RdevKeySource {
    fn listen(self: Box<Self>, handler: KeyEventHandler) -> RecordingResult<()> {
        tracing::info!("Installing global input hook");

        rdev::listen(move |event| {
            let Some(key_event) = translate(&event.event_type) else {
                return;
            };
            handler.handle(key_event);
        })
        .map_err(|e| RecordingError::PlatformError(format!("Input hook failed: {:?}", e)))
    }
}

fn translate(event_type: &EventType) -> Option<KeyEvent> {
    match event_type {
        EventType::KeyPress(key) => Some(KeyEvent::Press(raw_key(key))),
        EventType::KeyRelease(key) => Some(KeyEvent::Release(raw_key(key))),
        EventType::ButtonPress(button) => Some(KeyEvent::Press(raw_button(button))),
        EventType::ButtonRelease(button) => Some(KeyEvent::Release(raw_button(button))),
        _ => None,
    }
}

fn raw_button(button: &Button) -> RawKey {
    match button {
        Button::Left => RawKey::MouseLeft,
        Button::Right => RawKey::MouseRight,
        Button::Middle => RawKey::MouseMiddle,
        _ => RawKey::Unknown,
    }
}

fn raw_key(key: &Key) -> RawKey {
    match key {
        Key::UpArrow => RawKey::Up,
        Key::DownArrow => RawKey::Down,
        Key::LeftArrow => RawKey::Left,
        Key::RightArrow => RawKey::Right,
        Key::Escape => RawKey::Escape,
        Key::Return | Key::KpReturn => RawKey::Enter,
        Key::Tab => RawKey::Tab,
        Key::Space => RawKey::Space,
        Key::Backspace => RawKey::Backspace,
        Key::ShiftLeft => RawKey::ShiftLeft,
        Key::ShiftRight => RawKey::ShiftRight,
        Key::ControlLeft => RawKey::ControlLeft,
        Key::ControlRight => RawKey::ControlRight,
        Key::Alt => RawKey::AltLeft,
        Key::AltGr => RawKey::AltRight,
        Key::KeyA => RawKey::Char('a'),
        Key::KeyB => RawKey::Char('b'),
        Key::KeyC => RawKey::Char('c'),
        Key::KeyD => RawKey::Char('d'),
        Key::KeyE => RawKey::Char('e'),
        Key::KeyF => RawKey::Char('f'),
        Key::KeyG => RawKey::Char('g'),
        Key::KeyH => RawKey::Char('h'),
        Key::KeyI => RawKey::Char('i'),
        Key::KeyJ => RawKey::Char('j'),
        Key::KeyK => RawKey::Char('k'),
        Key::KeyL => RawKey::Char('l'),
        Key::KeyM => RawKey::Char('m'),
        Key::KeyN => RawKey::Char('n'),
        Key::KeyO => RawKey::Char('o'),
        Key::KeyP => RawKey::Char('p'),
        Key::KeyQ => RawKey::Char('q'),
        Key::KeyR => RawKey::Char('r'),
        Key::KeyS => RawKey::Char('s'),
        Key::KeyT => RawKey::Char('t'),
        Key::KeyU => RawKey::Char('u'),
        Key::KeyV => RawKey::Char('v'),
        Key::KeyW => RawKey::Char('w'),
        Key::KeyX => RawKey::Char('x'),
        Key::KeyY => RawKey::Char('y'),
        Key::KeyZ => RawKey::Char('z'),
        Key::Num0 | Key::Kp0 => RawKey::Char('0'),
        Key::Num1 | Key::Kp1 => RawKey::Char('1'),
        Key::Num2 | Key::Kp2 => RawKey::Char('2'),
        Key::Num3 | Key::Kp3 => RawKey::Char('3'),
        Key::Num4 | Key::Kp4 => RawKey::Char('4'),
        Key::Num5 | Key::Kp5 => RawKey::Char('5'),
        Key::Num6 | Key::Kp6 => RawKey::Char('6'),
        Key::Num7 | Key::Kp7 => RawKey::Char('7'),
        Key::Num8 | Key::Kp8 => RawKey::Char('8'),
        Key::Num9 | Key::Kp9 => RawKey::Char('9'),
        _ => RawKey::Unknown,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_translate_keys() {
        assert_eq!(
            translate(&EventType::KeyPress(Key::KeyW)),
            Some(KeyEvent::Press(RawKey::Char('w')))
        );
        assert_eq!(
            translate(&EventType::KeyRelease(Key::ShiftRight)),
            Some(KeyEvent::Release(RawKey::ShiftRight))
        );
        assert_eq!(
            translate(&EventType::ButtonPress(Button::Left)),
            Some(KeyEvent::Press(RawKey::MouseLeft))
        );
        assert_eq!(translate(&EventType::MouseMove { x: 1.0, y: 2.0 }), None);
        assert_eq!(raw_key(&Key::F5), RawKey::Unknown);
    }
}
