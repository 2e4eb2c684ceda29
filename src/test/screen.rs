//! Alt-screen, scrollback, and reset invariants (spec.md §8 "Alt screen
//! round-trip" scenario, invariants 3-5).

use super::TestTerm;
use k9::assert_equal as assert_eq;

#[test]
fn alt_screen_round_trip() {
    let mut term = TestTerm::new(80, 24, 0);
    term.write(b"A\x1b[?1049h");
    term.write(b"B");
    term.write(b"\x1b[?1049l");
    assert_eq!(term.row_text(0).trim_end(), "A");
    assert_eq!(term.cursor().0, 1);
    assert!(!term.engine().screen().is_alt_screen());
}

#[test]
fn invariant_scrollback_bounded() {
    let mut term = TestTerm::new(5, 2, 10);
    for _ in 0..50 {
        term.print("xx\n");
    }
    assert!(term.engine().screen().scrollback_len() <= 12);
}

#[test]
fn invariant_reset_matches_fresh_state() {
    let fresh = TestTerm::new(10, 4, 10);
    let mut used = TestTerm::new(10, 4, 10);
    used.write(b"\x1b[31msome text\x1b[?1049h more");
    used.engine().reset();
    assert_eq!(used.row_text(0), fresh.row_text(0));
    assert_eq!(used.cursor(), fresh.cursor());
    assert!(!used.engine().screen().is_alt_screen());
}
