//! Mouse reporting end-to-end through [`crate::Engine::mouse`], covering
//! mode/encoding gating spec.md §4.6 describes at the component level.

use super::TestTerm;
use crate::event::EventKind;
use crate::input::KeyModifiers;
use crate::mouse::{MouseButton, MouseEvent, MouseEventKind};
use crate::Event;
use k9::assert_equal as assert_eq;
use std::cell::RefCell;
use std::rc::Rc;

fn collect_data(term: &mut TestTerm) -> Rc<RefCell<Vec<Vec<u8>>>> {
    let log = Rc::new(RefCell::new(Vec::new()));
    let log2 = Rc::clone(&log);
    term.engine().subscribe(
        EventKind::Data,
        Box::new(move |ev| {
            if let Event::Data(bytes) = ev {
                log2.borrow_mut().push(bytes.clone());
            }
        }),
    );
    log
}

fn press(x: usize, y: usize) -> MouseEvent {
    MouseEvent { kind: MouseEventKind::Press, x, y, button: MouseButton::Left, modifiers: KeyModifiers::empty() }
}

fn release(x: usize, y: usize) -> MouseEvent {
    MouseEvent { kind: MouseEventKind::Release, x, y, button: MouseButton::Left, modifiers: KeyModifiers::empty() }
}

fn drag(x: usize, y: usize) -> MouseEvent {
    MouseEvent { kind: MouseEventKind::Move, x, y, button: MouseButton::Left, modifiers: KeyModifiers::empty() }
}

#[test]
fn mouse_reports_nothing_when_tracking_disabled() {
    let mut term = TestTerm::new(80, 24, 0);
    let log = collect_data(&mut term);
    term.engine().mouse(press(5, 5));
    assert!(log.borrow().is_empty());
}

#[test]
fn mouse_sgr_reports_once_enabled() {
    let mut term = TestTerm::new(80, 24, 0);
    term.write(b"\x1b[?1000h\x1b[?1006h");
    let log = collect_data(&mut term);
    term.engine().mouse(press(5, 5));
    assert_eq!(*log.borrow(), vec![b"\x1b[<0;5;5M".to_vec()]);
}

#[test]
fn button_event_mode_ignores_move_without_a_held_button() {
    let mut term = TestTerm::new(80, 24, 0);
    term.write(b"\x1b[?1002h\x1b[?1006h");
    let log = collect_data(&mut term);
    term.engine().mouse(drag(6, 6));
    assert!(log.borrow().is_empty());
}

#[test]
fn button_event_mode_reports_move_while_dragging() {
    let mut term = TestTerm::new(80, 24, 0);
    term.write(b"\x1b[?1002h\x1b[?1006h");
    let log = collect_data(&mut term);
    term.engine().mouse(press(5, 5));
    term.engine().mouse(drag(6, 6));
    term.engine().mouse(release(6, 6));
    let log = log.borrow();
    assert_eq!(log.len(), 3);
    assert_eq!(log[1], b"\x1b[<32;6;6M".to_vec());
}

#[test]
fn any_event_mode_reports_move_without_a_held_button() {
    let mut term = TestTerm::new(80, 24, 0);
    term.write(b"\x1b[?1003h\x1b[?1006h");
    let log = collect_data(&mut term);
    term.engine().mouse(drag(6, 6));
    assert_eq!(*log.borrow(), vec![b"\x1b[<35;6;6M".to_vec()]);
}
