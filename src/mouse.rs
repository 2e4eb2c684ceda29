//! Mouse event translation (component C7, mouse half): encodes
//! `(button, x, y)` into the byte sequence the active mouse-reporting
//! mode and encoding expect (spec.md §4.6).

use crate::input::KeyModifiers;
use crate::screen::{MouseEncoding, MouseReportMode};

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum MouseButton {
    Left,
    Middle,
    Right,
    WheelUp,
    WheelDown,
    None,
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum MouseEventKind {
    Press,
    Release,
    Move,
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct MouseEvent {
    pub kind: MouseEventKind,
    /// 1-based cell column/row, per spec.md §4.6 "Coordinates are
    /// 1-based cell positions".
    pub x: usize,
    pub y: usize,
    pub button: MouseButton,
    pub modifiers: KeyModifiers,
}

fn button_bits(button: MouseButton, kind: MouseEventKind) -> u8 {
    let base = match (button, kind) {
        (_, MouseEventKind::Release) => 3,
        (MouseButton::Left, _) => 0,
        (MouseButton::Middle, _) => 1,
        (MouseButton::Right, _) => 2,
        (MouseButton::WheelUp, _) => 64,
        (MouseButton::WheelDown, _) => 65,
        (MouseButton::None, _) => 3,
    };
    let motion = if kind == MouseEventKind::Move { 32 } else { 0 };
    base + motion
}

fn modifier_bits(modifiers: KeyModifiers) -> u8 {
    let mut bits = 0u8;
    if modifiers.contains(KeyModifiers::SHIFT) {
        bits |= 4;
    }
    if modifiers.contains(KeyModifiers::META) {
        bits |= 8;
    }
    if modifiers.contains(KeyModifiers::CTRL) {
        bits |= 16;
    }
    bits
}

/// Encode a mouse event under `mode`/`encoding`, or `None` if the current
/// reporting mode doesn't report this event at all (e.g. X10 never
/// reports releases; `Off` reports nothing). `button_held` is the button
/// currently pressed (`None` if none), used to gate `ButtonEvent` (?1002)
/// motion reports to drags only, unlike `AnyEvent` (?1003) which reports
/// every motion (spec.md §4.6).
pub fn encode_mouse(event: MouseEvent, mode: MouseReportMode, encoding: MouseEncoding, button_held: MouseButton) -> Option<Vec<u8>> {
    if mode == MouseReportMode::Off {
        return None;
    }
    if mode == MouseReportMode::X10 && event.kind == MouseEventKind::Release {
        return None;
    }
    if mode == MouseReportMode::VT200 && event.kind == MouseEventKind::Move {
        return None;
    }
    if mode == MouseReportMode::ButtonEvent && event.kind == MouseEventKind::Move && button_held == MouseButton::None {
        return None;
    }

    let buttons = button_bits(event.button, event.kind) | modifier_bits(event.modifiers);

    Some(match encoding {
        MouseEncoding::Sgr => {
            let final_byte = if event.kind == MouseEventKind::Release { 'm' } else { 'M' };
            format!("\x1b[<{};{};{}{}", buttons, event.x, event.y, final_byte).into_bytes()
        }
        MouseEncoding::Urxvt => format!("\x1b[{};{};{}M", buttons + 32, event.x, event.y).into_bytes(),
        MouseEncoding::Utf8 | MouseEncoding::Default => {
            let mut out = vec![0x1b, b'[', b'M'];
            for value in [buttons, event.x as u8, event.y as u8] {
                push_mouse_coord(&mut out, value, encoding);
            }
            out
        }
    })
}

/// Default encoding packs each value as a single byte (`32 + value`,
/// wrapping above 255); UTF-8 mouse mode instead emits the value as a
/// UTF-8 code point so coordinates beyond 223 stay representable
/// (spec.md §4.6).
fn push_mouse_coord(out: &mut Vec<u8>, value: u8, encoding: MouseEncoding) {
    let codepoint = 32u32 + value as u32;
    match encoding {
        MouseEncoding::Utf8 => {
            let ch = char::from_u32(codepoint).unwrap_or('\u{fffd}');
            let mut buf = [0u8; 4];
            out.extend_from_slice(ch.encode_utf8(&mut buf).as_bytes());
        }
        _ => out.push(codepoint as u8),
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn ev(kind: MouseEventKind, button: MouseButton, x: usize, y: usize) -> MouseEvent {
        MouseEvent { kind, x, y, button, modifiers: KeyModifiers::empty() }
    }

    #[test]
    fn off_mode_reports_nothing() {
        assert_eq!(
            encode_mouse(ev(MouseEventKind::Press, MouseButton::Left, 1, 1), MouseReportMode::Off, MouseEncoding::Default, MouseButton::None),
            None
        );
    }

    #[test]
    fn x10_never_reports_release() {
        assert_eq!(
            encode_mouse(ev(MouseEventKind::Release, MouseButton::Left, 1, 1), MouseReportMode::X10, MouseEncoding::Default, MouseButton::None),
            None
        );
    }

    #[test]
    fn default_encoding_press() {
        let bytes =
            encode_mouse(ev(MouseEventKind::Press, MouseButton::Left, 5, 3), MouseReportMode::VT200, MouseEncoding::Default, MouseButton::None)
                .unwrap();
        assert_eq!(bytes, vec![0x1b, b'[', b'M', 32, 32 + 5, 32 + 3]);
    }

    #[test]
    fn sgr_round_trips_press_and_release() {
        let press =
            encode_mouse(ev(MouseEventKind::Press, MouseButton::Left, 10, 20), MouseReportMode::VT200, MouseEncoding::Sgr, MouseButton::None)
                .unwrap();
        assert_eq!(press, b"\x1b[<0;10;20M".to_vec());
        let release =
            encode_mouse(ev(MouseEventKind::Release, MouseButton::Left, 10, 20), MouseReportMode::VT200, MouseEncoding::Sgr, MouseButton::Left)
                .unwrap();
        assert_eq!(release, b"\x1b[<3;10;20m".to_vec());
    }

    #[test]
    fn urxvt_encoding() {
        let bytes =
            encode_mouse(ev(MouseEventKind::Press, MouseButton::Middle, 2, 2), MouseReportMode::VT200, MouseEncoding::Urxvt, MouseButton::None)
                .unwrap();
        assert_eq!(bytes, b"\x1b[33;2;2M".to_vec());
    }

    #[test]
    fn wheel_and_modifiers() {
        let mut modifiers = KeyModifiers::empty();
        modifiers.insert(KeyModifiers::SHIFT);
        let event = MouseEvent {
            kind: MouseEventKind::Press,
            x: 1,
            y: 1,
            button: MouseButton::WheelUp,
            modifiers,
        };
        let bytes = encode_mouse(event, MouseReportMode::VT200, MouseEncoding::Sgr, MouseButton::None).unwrap();
        assert_eq!(bytes, b"\x1b[<68;1;1M".to_vec());
    }

    #[test]
    fn button_event_mode_ignores_motion_with_no_button_held() {
        let mv = MouseEvent { kind: MouseEventKind::Move, x: 1, y: 1, button: MouseButton::None, modifiers: KeyModifiers::empty() };
        assert_eq!(encode_mouse(mv, MouseReportMode::ButtonEvent, MouseEncoding::Sgr, MouseButton::None), None);
    }

    #[test]
    fn button_event_mode_reports_motion_while_dragging() {
        let mv = MouseEvent { kind: MouseEventKind::Move, x: 1, y: 1, button: MouseButton::Left, modifiers: KeyModifiers::empty() };
        let bytes = encode_mouse(mv, MouseReportMode::ButtonEvent, MouseEncoding::Sgr, MouseButton::Left).unwrap();
        assert_eq!(bytes, b"\x1b[<32;1;1M".to_vec());
    }

    #[test]
    fn any_event_mode_reports_motion_with_no_button_held() {
        let mv = MouseEvent { kind: MouseEventKind::Move, x: 1, y: 1, button: MouseButton::None, modifiers: KeyModifiers::empty() };
        let bytes = encode_mouse(mv, MouseReportMode::AnyEvent, MouseEncoding::Sgr, MouseButton::None).unwrap();
        assert_eq!(bytes, b"\x1b[<35;1;1M".to_vec());
    }
}
