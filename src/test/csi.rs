//! CSI-driven scenarios: SGR color, and chunk/clamp boundary behaviors
//! (spec.md §8 "Color"/"SGR 256-color" scenarios, boundary behaviors).

use super::TestTerm;
use crate::cell::DEFAULT_COLOR;
use k9::assert_equal as assert_eq;

#[test]
fn color() {
    let mut term = TestTerm::new(80, 24, 10);
    term.print("\x1b[31mA\x1b[0mB");
    let row = term.engine().screen().visible_row(0);
    assert_eq!(row.get(0).unwrap().chr(), 'A');
    assert_eq!(row.get(0).unwrap().style().foreground(), 1);
    assert_eq!(row.get(1).unwrap().chr(), 'B');
    assert_eq!(row.get(1).unwrap().style().foreground(), DEFAULT_COLOR);
}

#[test]
fn sgr_256_color() {
    let mut term = TestTerm::new(80, 24, 10);
    term.print("\x1b[38;5;196mX");
    let row = term.engine().screen().visible_row(0);
    assert_eq!(row.get(0).unwrap().chr(), 'X');
    assert_eq!(row.get(0).unwrap().style().foreground(), 196);
}

#[test]
fn sgr_is_idempotent_under_trailing_reset() {
    let mut a = TestTerm::new(10, 1, 0);
    a.print("\x1b[31mX");
    let mut b = TestTerm::new(10, 1, 0);
    b.print("\x1b[31;0;31mX");
    assert_eq!(
        a.engine().screen().visible_row(0).get(0).unwrap().style().foreground(),
        b.engine().screen().visible_row(0).get(0).unwrap().style().foreground()
    );
}

#[test]
fn boundary_split_csi_across_two_writes() {
    let mut whole = TestTerm::new(80, 24, 0);
    whole.write(b"\x1b[31mA");

    let mut split = TestTerm::new(80, 24, 0);
    split.write(b"\x1b[3");
    split.write(b"1mA");

    assert_eq!(
        whole.engine().screen().visible_row(0).get(0).unwrap().style().foreground(),
        split.engine().screen().visible_row(0).get(0).unwrap().style().foreground()
    );
}

#[test]
fn boundary_ech_clamps_to_remaining_cells() {
    let mut term = TestTerm::new(10, 2, 0);
    term.write(b"abcdefghij\x1b[8G\x1b[5X");
    let row = term.engine().screen().visible_row(0);
    assert_eq!(row.get(7).unwrap().chr(), ' ');
    assert_eq!(row.get(8).unwrap().chr(), ' ');
    assert_eq!(row.get(9).unwrap().chr(), ' ');
}
