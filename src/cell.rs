//! The cell/attribute model (component C1): a packed `(glyph, style)` cell,
//! default/erase style helpers, and `CSI … m` (SGR) application.

use crate::color::ColorPalette;
use unicode_width::UnicodeWidthChar;

/// Sentinel stored in either the background or foreground 9-bit field of a
/// [`Style`] meaning "use the palette's default color for this field",
/// per spec.md §3 ("Index 256 = default background, 257 = default
/// foreground" — both fields use the same sentinel value internally; which
/// field it lives in is what distinguishes "default background" from
/// "default foreground").
pub const DEFAULT_COLOR: u16 = 256;

bitflags! {
    /// The 5 SGR boolean flags packed into [`Style`].
    pub struct StyleFlags: u8 {
        const BOLD      = 1 << 0;
        const UNDERLINE = 1 << 1;
        const BLINK     = 1 << 2;
        const INVERSE   = 1 << 3;
        const INVISIBLE = 1 << 4;
    }
}

/// A packed text style: 9-bit background index, 9-bit foreground index, 5
/// boolean flag bits, remainder reserved, per spec.md §3.
///
/// This type hides the bit packing behind getters/setters, per
/// DESIGN-NOTES in spec.md §9 ("strongly-typed implementations should
/// expose a `Style` value type ... and hide the packing").
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub struct Style(u32);

impl Style {
    const BG_SHIFT: u32 = 0;
    const FG_SHIFT: u32 = 9;
    const FLAGS_SHIFT: u32 = 18;
    const FIELD_MASK: u32 = 0x1ff; // 9 bits

    pub fn background(&self) -> u16 {
        ((self.0 >> Self::BG_SHIFT) & Self::FIELD_MASK) as u16
    }

    pub fn foreground(&self) -> u16 {
        ((self.0 >> Self::FG_SHIFT) & Self::FIELD_MASK) as u16
    }

    pub fn flags(&self) -> StyleFlags {
        StyleFlags::from_bits_truncate(((self.0 >> Self::FLAGS_SHIFT) & 0x1f) as u8)
    }

    pub fn with_background(mut self, idx: u16) -> Self {
        self.0 = (self.0 & !(Self::FIELD_MASK << Self::BG_SHIFT))
            | ((u32::from(idx) & Self::FIELD_MASK) << Self::BG_SHIFT);
        self
    }

    pub fn with_foreground(mut self, idx: u16) -> Self {
        self.0 = (self.0 & !(Self::FIELD_MASK << Self::FG_SHIFT))
            | ((u32::from(idx) & Self::FIELD_MASK) << Self::FG_SHIFT);
        self
    }

    pub fn with_flags(mut self, flags: StyleFlags) -> Self {
        self.0 = (self.0 & !(0x1f << Self::FLAGS_SHIFT)) | (u32::from(flags.bits()) << Self::FLAGS_SHIFT);
        self
    }

    pub fn set_flag(&mut self, flag: StyleFlags, value: bool) {
        let mut flags = self.flags();
        flags.set(flag, value);
        *self = self.with_flags(flags);
    }

    pub fn is_bold(&self) -> bool {
        self.flags().contains(StyleFlags::BOLD)
    }

    pub fn is_underline(&self) -> bool {
        self.flags().contains(StyleFlags::UNDERLINE)
    }

    pub fn is_blink(&self) -> bool {
        self.flags().contains(StyleFlags::BLINK)
    }

    pub fn is_inverse(&self) -> bool {
        self.flags().contains(StyleFlags::INVERSE)
    }

    pub fn is_invisible(&self) -> bool {
        self.flags().contains(StyleFlags::INVISIBLE)
    }
}

impl Default for Style {
    /// `default_style()`: default background, default foreground, no flags.
    fn default() -> Self {
        Style(0)
            .with_background(DEFAULT_COLOR)
            .with_foreground(DEFAULT_COLOR)
    }
}

/// `erase_style()`: default background, *current* foreground — erasing a
/// region paints with the background the cursor would currently write,
/// not a hardcoded default, so that e.g. `CSI 42m` (green background) then
/// `CSI K` erases with green.
pub fn erase_style(current: Style) -> Style {
    Style::default().with_foreground(current.foreground())
}

/// A single screen cell: a code point plus its style. Wide glyphs occupy
/// two adjacent cells; the first is `width() == 2`, the second is a space
/// with `is_wide_tail() == true` carrying the same style (spec.md §3).
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct Cell {
    ch: char,
    style: Style,
    wide_tail: bool,
}

impl Cell {
    pub fn new(ch: char, style: Style) -> Self {
        Cell {
            ch,
            style,
            wide_tail: false,
        }
    }

    /// A blank cell carrying `style`, used to pad rows and to paint erased
    /// regions (`blank_cell(style) -> cell` in spec.md §4.1).
    pub fn blank(style: Style) -> Self {
        Cell::new(' ', style)
    }

    fn wide_tail_of(style: Style) -> Self {
        Cell {
            ch: ' ',
            style,
            wide_tail: true,
        }
    }

    pub fn chr(&self) -> char {
        self.ch
    }

    pub fn style(&self) -> Style {
        self.style
    }

    pub fn set_style(&mut self, style: Style) {
        self.style = style;
    }

    pub fn is_wide_tail(&self) -> bool {
        self.wide_tail
    }

    /// 1 for a normal or combining glyph, 2 for the head of a wide glyph.
    /// The tail half of a wide glyph reports width 1 (it is itself a
    /// single cell; `is_wide_tail` is how callers recognize it belongs to
    /// the cell before it).
    pub fn width(&self) -> usize {
        if self.wide_tail {
            1
        } else {
            grapheme_width(self.ch)
        }
    }

    /// Produce the `[head, tail]` pair for inserting a wide glyph at a
    /// column, per spec.md §3 ("the second [cell] a space with the same
    /// attributes; both must move together").
    pub fn wide_pair(ch: char, style: Style) -> [Cell; 2] {
        [Cell::new(ch, style), Cell::wide_tail_of(style)]
    }
}

impl Default for Cell {
    fn default() -> Self {
        Cell::blank(Style::default())
    }
}

/// Width-2 test from spec.md §4.4: "a code point ≥ U+FF00 in the defined
/// fullwidth ranges counts as width 2". We defer to `unicode-width`'s table
/// (which implements the same East-Asian-Width derived rule xterm uses)
/// rather than hand-rolling the fullwidth range list.
pub fn grapheme_width(ch: char) -> usize {
    match ch.width() {
        Some(0) => 1, // zero-width/combining marks still occupy the cell they combine into
        Some(w) => w,
        None => 1, // control characters never reach here as printables
    }
}

/// `apply_sgr(params, current) -> new_style` (spec.md §4.1). `params` are
/// the already-integer-decoded SGR parameters (an omitted parameter must
/// already have been normalized to `0` by the caller, matching vtparse's
/// convention for CSI integer params).
pub fn apply_sgr(params: &[i64], current: Style, palette: &ColorPalette) -> Style {
    let mut style = current;
    let mut i = 0;
    if params.is_empty() {
        return Style::default();
    }
    while i < params.len() {
        match params[i] {
            0 => style = Style::default(),
            1 => style.set_flag(StyleFlags::BOLD, true),
            4 => style.set_flag(StyleFlags::UNDERLINE, true),
            5 => style.set_flag(StyleFlags::BLINK, true),
            7 => style.set_flag(StyleFlags::INVERSE, true),
            8 => style.set_flag(StyleFlags::INVISIBLE, true),
            22 => style.set_flag(StyleFlags::BOLD, false),
            24 => style.set_flag(StyleFlags::UNDERLINE, false),
            25 => style.set_flag(StyleFlags::BLINK, false),
            27 => style.set_flag(StyleFlags::INVERSE, false),
            28 => style.set_flag(StyleFlags::INVISIBLE, false),
            n @ 30..=37 => style = style.with_foreground((n - 30) as u16),
            38 => {
                if let Some((idx, consumed)) = extended_color(&params[i..], palette) {
                    style = style.with_foreground(idx);
                    i += consumed;
                }
            }
            39 => style = style.with_foreground(DEFAULT_COLOR),
            n @ 40..=47 => style = style.with_background((n - 40) as u16),
            48 => {
                if let Some((idx, consumed)) = extended_color(&params[i..], palette) {
                    style = style.with_background(idx);
                    i += consumed;
                }
            }
            49 => style = style.with_background(DEFAULT_COLOR),
            n @ 90..=97 => style = style.with_foreground((n - 90 + 8) as u16),
            n @ 100..=107 => style = style.with_background((n - 100 + 8) as u16),
            other => {
                log::trace!("apply_sgr: unsupported parameter {}", other);
            }
        }
        i += 1;
    }
    style
}

/// Parses the `5;n` or `2;r;g;b` tail of an extended `38`/`48` SGR
/// parameter. Returns the resolved palette index and the number of extra
/// parameter slots consumed (not counting the leading `38`/`48` itself).
fn extended_color(params: &[i64], palette: &ColorPalette) -> Option<(u16, usize)> {
    match params.get(1) {
        Some(5) => params.get(2).map(|&n| (n.clamp(0, 255) as u16, 2)),
        Some(2) => {
            let r = *params.get(2)? as u8;
            let g = *params.get(3)? as u8;
            let b = *params.get(4)? as u8;
            let idx = palette.nearest_index(crate::color::RgbColor::new(r, g, b));
            Some((u16::from(idx), 4))
        }
        _ => {
            log::trace!("apply_sgr: malformed extended color parameter");
            None
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn default_style_is_default_both() {
        let s = Style::default();
        assert_eq!(s.background(), DEFAULT_COLOR);
        assert_eq!(s.foreground(), DEFAULT_COLOR);
        assert!(s.flags().is_empty());
    }

    #[test]
    fn sgr_basic_color_and_reset() {
        let palette = ColorPalette::default();
        let s = apply_sgr(&[31], Style::default(), &palette);
        assert_eq!(s.foreground(), 1);
        let s = apply_sgr(&[0], s, &palette);
        assert_eq!(s, Style::default());
    }

    #[test]
    fn sgr_idempotent_under_trailing_reset() {
        let palette = ColorPalette::default();
        let s = apply_sgr(&[1, 4, 31, 42], Style::default(), &palette);
        let s2 = apply_sgr(&[0], s, &palette);
        assert_eq!(s2, Style::default());
    }

    #[test]
    fn sgr_256_color() {
        let palette = ColorPalette::default();
        let s = apply_sgr(&[38, 5, 196], Style::default(), &palette);
        assert_eq!(s.foreground(), 196);
    }

    #[test]
    fn sgr_truecolor_matches_nearest() {
        let palette = ColorPalette::default();
        let s = apply_sgr(&[38, 2, 255, 0, 0], Style::default(), &palette);
        assert_eq!(s.foreground(), u16::from(palette.nearest_index(crate::color::RgbColor::new(255, 0, 0))));
    }

    #[test]
    fn erase_style_keeps_foreground() {
        let palette = ColorPalette::default();
        let s = apply_sgr(&[31, 42], Style::default(), &palette);
        let erased = erase_style(s);
        assert_eq!(erased.foreground(), 1);
        assert_eq!(erased.background(), DEFAULT_COLOR);
    }

    #[test]
    fn wide_pair_shares_style() {
        let style = Style::default().with_foreground(2);
        let [head, tail] = Cell::wide_pair('中', style);
        assert_eq!(head.chr(), '中');
        assert_eq!(head.width(), 2);
        assert!(tail.is_wide_tail());
        assert_eq!(tail.style(), style);
    }
}
