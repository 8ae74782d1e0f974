//! Host-independent NABU key codes.
//!
//! Printable keys send their ASCII code on press only. The cursor and
//! function keys send a make code on press and a break code (make + 0x10)
//! on release. Joysticks report through the same serial stream as a
//! two-byte sequence: a port selector followed by the switch state.

use bitflags::bitflags;

/// A key on the NABU keyboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NabuKey {
    /// ASCII or control code, already shifted by the host.
    Char(u8),
    Right,
    Left,
    Up,
    Down,
    /// `»` key.
    Forward,
    /// `«` key.
    Back,
    No,
    Yes,
    Sym,
    Pause,
    Tv,
}

impl NabuKey {
    /// Code sent when the key goes down.
    #[must_use]
    pub const fn make_code(self) -> u8 {
        match self {
            Self::Char(c) => c,
            Self::Right => 0xE0,
            Self::Left => 0xE1,
            Self::Up => 0xE2,
            Self::Down => 0xE3,
            Self::Forward => 0xE4,
            Self::Back => 0xE5,
            Self::No => 0xE6,
            Self::Yes => 0xE7,
            Self::Sym => 0xE8,
            Self::Pause => 0xE9,
            Self::Tv => 0xEA,
        }
    }

    /// Code sent when the key comes up. Character keys send nothing.
    #[must_use]
    pub const fn break_code(self) -> Option<u8> {
        match self {
            Self::Char(_) => None,
            other => Some(other.make_code() + 0x10),
        }
    }
}

/// Host modifier keys held while a character key was pressed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub caps_lock: bool,
}

/// Ctrl+2 sends NUL; the keyboard port reports 0xFF as 0x00.
const CTRL_2: u8 = 0xFF;

/// Apply shift, ctrl and caps lock to an unshifted US-layout key.
///
/// Returns `None` for non-ASCII input.
#[must_use]
pub fn translate_char(key: char, mods: Modifiers) -> Option<NabuKey> {
    if !key.is_ascii() {
        return None;
    }
    let mut k = key as u8;

    if mods.ctrl {
        k = match k {
            b'[' => 0x1B,
            b'\\' => 0x1C,
            b']' => 0x1D,
            b'-' => 0x1F,
            _ => k,
        };
    }

    if mods.shift {
        k = match k {
            b'`' => b'~',
            b'-' => b'_',
            b'=' => b'+',
            b'[' => b'{',
            b']' => b'}',
            b'\\' => b'|',
            b';' => b':',
            b'\'' => b'"',
            b',' => b'<',
            b'.' => b'>',
            b'/' => b'?',
            _ => k,
        };
    }

    if k.is_ascii_lowercase() {
        if mods.caps_lock {
            k ^= 0x20;
        }
        if mods.shift {
            k ^= 0x20;
        }
        if mods.ctrl {
            k &= 0x1F;
        }
    } else if k.is_ascii_digit() {
        if mods.ctrl {
            k = match k {
                b'2' => CTRL_2,
                b'6' => 0x1E,
                _ => k,
            };
        } else if mods.shift {
            k = b")!@#$%^&*("[usize::from(k - b'0')];
        }
    }

    Some(NabuKey::Char(k))
}

bitflags! {
    /// Joystick switches, active high.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Joystick: u8 {
        const LEFT = 0x01;
        const DOWN = 0x02;
        const RIGHT = 0x04;
        const UP = 0x08;
        const FIRE = 0x10;
    }
}

/// The two bytes the keyboard sends when joystick `port` (0 or 1)
/// changes state.
#[must_use]
pub fn joystick_report(port: u8, state: Joystick) -> [u8; 2] {
    [0x80 | (port & 0x01), 0xA0 | state.bits()]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shifted() -> Modifiers {
        Modifiers { shift: true, ..Modifiers::default() }
    }

    fn ctrl() -> Modifiers {
        Modifiers { ctrl: true, ..Modifiers::default() }
    }

    #[test]
    fn cursor_make_and_break() {
        assert_eq!(NabuKey::Right.make_code(), 0xE0);
        assert_eq!(NabuKey::Right.break_code(), Some(0xF0));
        assert_eq!(NabuKey::Down.make_code(), 0xE3);
        assert_eq!(NabuKey::Tv.break_code(), Some(0xFA));
        assert_eq!(NabuKey::Char(b'a').break_code(), None);
    }

    #[test]
    fn letters() {
        let plain = Modifiers::default();
        assert_eq!(translate_char('a', plain), Some(NabuKey::Char(b'a')));
        assert_eq!(translate_char('a', shifted()), Some(NabuKey::Char(b'A')));
        let caps = Modifiers { caps_lock: true, ..plain };
        assert_eq!(translate_char('q', caps), Some(NabuKey::Char(b'Q')));
        let both = Modifiers { caps_lock: true, shift: true, ctrl: false };
        assert_eq!(translate_char('q', both), Some(NabuKey::Char(b'q')));
        assert_eq!(translate_char('c', ctrl()), Some(NabuKey::Char(0x03)));
    }

    #[test]
    fn digits_and_punctuation() {
        assert_eq!(translate_char('1', shifted()), Some(NabuKey::Char(b'!')));
        assert_eq!(translate_char('0', shifted()), Some(NabuKey::Char(b')')));
        assert_eq!(translate_char('/', shifted()), Some(NabuKey::Char(b'?')));
        assert_eq!(translate_char('[', ctrl()), Some(NabuKey::Char(0x1B)));
        assert_eq!(translate_char('2', ctrl()), Some(NabuKey::Char(0xFF)));
        assert_eq!(translate_char('6', ctrl()), Some(NabuKey::Char(0x1E)));
    }

    #[test]
    fn non_ascii_is_dropped() {
        assert_eq!(translate_char('é', Modifiers::default()), None);
    }

    #[test]
    fn joystick_bytes() {
        assert_eq!(joystick_report(0, Joystick::empty()), [0x80, 0xA0]);
        assert_eq!(
            joystick_report(1, Joystick::UP | Joystick::FIRE),
            [0x81, 0xB8]
        );
    }
}
