//! Keyboard translation (component C7, keyboard half): maps logical key
//! events to the byte sequences a host application expects on stdin,
//! honoring cursor-keys/keypad-app mode and modifiers (spec.md §4.6).

bitflags! {
    pub struct KeyModifiers: u8 {
        const SHIFT = 1 << 0;
        const CTRL  = 1 << 1;
        const ALT   = 1 << 2;
        const META  = 1 << 3;
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum KeyCode {
    Char(char),
    Backspace,
    Enter,
    Tab,
    Escape,
    Up,
    Down,
    Left,
    Right,
    Home,
    End,
    PageUp,
    PageDown,
    Insert,
    Delete,
    Function(u8),
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct KeyEvent {
    pub key: KeyCode,
    pub modifiers: KeyModifiers,
}

/// Whether Alt behaves as a meta-escape prefix. On mac keyboards Alt is
/// normally reserved for composing accented characters, so the "send
/// ESC" behavior moves to the Meta (Cmd) modifier instead (spec.md §4.6
/// "Alt+letter (non-mac) or Meta+letter (mac): prefix ESC").
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum AltSendsEscape {
    Yes,
    No,
}

/// What a translated key should cause the engine to do. Most keys
/// produce bytes to write to the host; a few (Shift+Ctrl+arrow,
/// Shift+PageUp/PageDown) are handled internally as scrollback motion
/// instead (spec.md §4.6).
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum KeyAction {
    Bytes(Vec<u8>),
    ScrollLines(i64),
    ScrollPages(i64),
    /// Recognized but produces no bytes and no scroll (e.g. a bare
    /// modifier key, or Ctrl+<char> with no defined control code).
    None,
}

/// Translate one key press. `app_cursor_keys`/`app_keypad` mirror
/// `Modes::APP_CURSOR_KEYS`/`Modes::APP_KEYPAD` on the active [`Screen`](crate::screen::Screen).
pub fn encode_key(
    event: KeyEvent,
    app_cursor_keys: bool,
    alt_sends_escape: AltSendsEscape,
) -> KeyAction {
    let m = event.modifiers;
    let shift = m.contains(KeyModifiers::SHIFT);
    let ctrl = m.contains(KeyModifiers::CTRL);
    let alt = m.contains(KeyModifiers::ALT);
    let meta = m.contains(KeyModifiers::META);

    if shift && ctrl {
        match event.key {
            KeyCode::Up => return KeyAction::ScrollLines(-1),
            KeyCode::Down => return KeyAction::ScrollLines(1),
            _ => {}
        }
    }
    if shift {
        match event.key {
            KeyCode::PageUp => return KeyAction::ScrollPages(-1),
            KeyCode::PageDown => return KeyAction::ScrollPages(1),
            _ => {}
        }
    }

    let arrow = |letter: u8| -> Vec<u8> {
        if ctrl {
            vec![0x1b, b'[', b'1', b';', b'5', letter]
        } else if app_cursor_keys {
            vec![0x1b, b'O', letter]
        } else {
            vec![0x1b, b'[', letter]
        }
    };

    let mut bytes = match event.key {
        KeyCode::Char(c) if ctrl => ctrl_byte(c).map(|b| vec![b]),
        KeyCode::Char(c) => {
            let mut buf = [0u8; 4];
            Some(c.encode_utf8(&mut buf).as_bytes().to_vec())
        }
        KeyCode::Backspace => Some(if shift { vec![0x08] } else { vec![0x7f] }),
        KeyCode::Enter => Some(vec![b'\r']),
        KeyCode::Tab => Some(vec![b'\t']),
        KeyCode::Escape => Some(vec![0x1b]),
        KeyCode::Up => Some(arrow(b'A')),
        KeyCode::Down => Some(arrow(b'B')),
        KeyCode::Right => Some(arrow(b'C')),
        KeyCode::Left => Some(arrow(b'D')),
        KeyCode::Home => Some(b"\x1bOH".to_vec()),
        KeyCode::End => Some(b"\x1bOF".to_vec()),
        KeyCode::PageUp => Some(b"\x1b[5~".to_vec()),
        KeyCode::PageDown => Some(b"\x1b[6~".to_vec()),
        KeyCode::Insert => Some(b"\x1b[2~".to_vec()),
        KeyCode::Delete => Some(b"\x1b[3~".to_vec()),
        KeyCode::Function(n) => function_key_bytes(n),
    };

    if let Some(b) = &mut bytes {
        if matches!(event.key, KeyCode::Char(_)) && ((alt && alt_sends_escape == AltSendsEscape::Yes) || meta) {
            b.insert(0, 0x1b);
        }
    }

    match bytes {
        Some(b) => KeyAction::Bytes(b),
        None => KeyAction::None,
    }
}

/// Ctrl+<char> control codes per spec.md §4.6: letters map to `keycode -
/// 64`; `space` is NUL; `3`-`7` map to `0x1b`-`0x1f`; `]` is `0x1d`;
/// backslash/`8` is DEL.
fn ctrl_byte(c: char) -> Option<u8> {
    let upper = c.to_ascii_uppercase();
    match upper {
        'A'..='Z' => Some(upper as u8 - 64),
        ' ' => Some(0x00),
        '3'..='7' => Some(0x1b + (upper as u8 - b'3')),
        ']' => Some(0x1d),
        '\\' | '8' => Some(0x7f),
        _ => None,
    }
}

fn function_key_bytes(n: u8) -> Option<Vec<u8>> {
    let seq: &[u8] = match n {
        1 => b"\x1bOP",
        2 => b"\x1bOQ",
        3 => b"\x1bOR",
        4 => b"\x1bOS",
        5 => b"\x1b[15~",
        6 => b"\x1b[17~",
        7 => b"\x1b[18~",
        8 => b"\x1b[19~",
        9 => b"\x1b[20~",
        10 => b"\x1b[21~",
        11 => b"\x1b[23~",
        12 => b"\x1b[24~",
        _ => return None,
    };
    Some(seq.to_vec())
}

#[cfg(test)]
mod test {
    use super::*;

    fn key(k: KeyCode, m: KeyModifiers) -> KeyEvent {
        KeyEvent { key: k, modifiers: m }
    }

    #[test]
    fn backspace_plain_and_shifted() {
        assert_eq!(
            encode_key(key(KeyCode::Backspace, KeyModifiers::empty()), false, AltSendsEscape::No),
            KeyAction::Bytes(vec![0x7f])
        );
        assert_eq!(
            encode_key(key(KeyCode::Backspace, KeyModifiers::SHIFT), false, AltSendsEscape::No),
            KeyAction::Bytes(vec![0x08])
        );
    }

    #[test]
    fn arrow_honors_app_cursor_keys_and_ctrl() {
        assert_eq!(
            encode_key(key(KeyCode::Up, KeyModifiers::empty()), false, AltSendsEscape::No),
            KeyAction::Bytes(b"\x1b[A".to_vec())
        );
        assert_eq!(
            encode_key(key(KeyCode::Up, KeyModifiers::empty()), true, AltSendsEscape::No),
            KeyAction::Bytes(b"\x1bOA".to_vec())
        );
        assert_eq!(
            encode_key(key(KeyCode::Up, KeyModifiers::CTRL), false, AltSendsEscape::No),
            KeyAction::Bytes(b"\x1b[1;5A".to_vec())
        );
    }

    #[test]
    fn shift_ctrl_arrow_scrolls_instead_of_emitting() {
        assert_eq!(
            encode_key(key(KeyCode::Up, KeyModifiers::SHIFT | KeyModifiers::CTRL), false, AltSendsEscape::No),
            KeyAction::ScrollLines(-1)
        );
    }

    #[test]
    fn home_end_always_ss3_regardless_of_cursor_mode() {
        assert_eq!(
            encode_key(key(KeyCode::Home, KeyModifiers::empty()), true, AltSendsEscape::No),
            KeyAction::Bytes(b"\x1bOH".to_vec())
        );
        assert_eq!(
            encode_key(key(KeyCode::End, KeyModifiers::empty()), false, AltSendsEscape::No),
            KeyAction::Bytes(b"\x1bOF".to_vec())
        );
    }

    #[test]
    fn function_keys() {
        assert_eq!(encode_key(key(KeyCode::Function(1), KeyModifiers::empty()), false, AltSendsEscape::No), KeyAction::Bytes(b"\x1bOP".to_vec()));
        assert_eq!(encode_key(key(KeyCode::Function(12), KeyModifiers::empty()), false, AltSendsEscape::No), KeyAction::Bytes(b"\x1b[24~".to_vec()));
    }

    #[test]
    fn ctrl_letter_and_special_cases() {
        assert_eq!(encode_key(key(KeyCode::Char('a'), KeyModifiers::CTRL), false, AltSendsEscape::No), KeyAction::Bytes(vec![1]));
        assert_eq!(encode_key(key(KeyCode::Char(' '), KeyModifiers::CTRL), false, AltSendsEscape::No), KeyAction::Bytes(vec![0]));
        assert_eq!(encode_key(key(KeyCode::Char('5'), KeyModifiers::CTRL), false, AltSendsEscape::No), KeyAction::Bytes(vec![0x1d]));
        assert_eq!(encode_key(key(KeyCode::Char(']'), KeyModifiers::CTRL), false, AltSendsEscape::No), KeyAction::Bytes(vec![0x1d]));
        assert_eq!(encode_key(key(KeyCode::Char('\\'), KeyModifiers::CTRL), false, AltSendsEscape::No), KeyAction::Bytes(vec![0x7f]));
    }

    #[test]
    fn alt_prefixes_escape_when_enabled() {
        assert_eq!(
            encode_key(key(KeyCode::Char('a'), KeyModifiers::ALT), false, AltSendsEscape::Yes),
            KeyAction::Bytes(vec![0x1b, b'a'])
        );
        assert_eq!(
            encode_key(key(KeyCode::Char('a'), KeyModifiers::ALT), false, AltSendsEscape::No),
            KeyAction::Bytes(vec![b'a'])
        );
    }

    #[test]
    fn meta_always_prefixes_escape() {
        assert_eq!(
            encode_key(key(KeyCode::Char('a'), KeyModifiers::META), false, AltSendsEscape::No),
            KeyAction::Bytes(vec![0x1b, b'a'])
        );
    }

    #[test]
    fn page_up_down_plain_vs_shifted() {
        assert_eq!(encode_key(key(KeyCode::PageUp, KeyModifiers::empty()), false, AltSendsEscape::No), KeyAction::Bytes(b"\x1b[5~".to_vec()));
        assert_eq!(encode_key(key(KeyCode::PageDown, KeyModifiers::SHIFT), false, AltSendsEscape::No), KeyAction::ScrollPages(1));
    }
}
