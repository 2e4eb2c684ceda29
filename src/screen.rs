//! Screen buffer, scroll region, modes, and alternate-screen handling
//! (components C2 and C3).

use crate::cell::{erase_style, Cell};
use crate::charset::CharsetTable;
use crate::line::Line;
use crate::tabs::TabStops;
use crate::{Style, VisibleRowIndex};
use std::collections::VecDeque;

bitflags! {
    /// Boolean modes set/reset via `CSI h`/`CSI l` (spec.md §4.3's mode
    /// table, minus the ones that need non-boolean state: mouse
    /// reporting level/encoding and the 132-column saved-width, which are
    /// tracked alongside `Modes` rather than inside it).
    pub struct Modes: u16 {
        /// IRM (4): printable characters shift the row right.
        const INSERT          = 1 << 0;
        /// DECCKM (?1): arrow keys emit `ESC O _` rather than `ESC [ _`.
        const APP_CURSOR_KEYS = 1 << 1;
        /// DECOM (?6): cursor addressing is relative to the scroll region.
        const ORIGIN          = 1 << 2;
        /// DECAWM (?7): printables at the right margin wrap.
        const WRAPAROUND      = 1 << 3;
        /// DECTCEM (?25): renderer should draw the cursor.
        const CURSOR_VISIBLE  = 1 << 4;
        /// ?1004: emit `ESC [I` / `ESC [O` on focus in/out.
        const FOCUS_EVENTS    = 1 << 5;
        /// DECNKM (?66): numpad emits function-key sequences.
        const APP_KEYPAD      = 1 << 6;
        /// ?3: 132-column mode is active (geometry swap already applied).
        const COL_132         = 1 << 7;
    }
}

impl Default for Modes {
    fn default() -> Self {
        Modes::WRAPAROUND | Modes::CURSOR_VISIBLE
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum MouseReportMode {
    Off,
    X10,
    VT200,
    ButtonEvent,
    AnyEvent,
}

impl Default for MouseReportMode {
    fn default() -> Self {
        MouseReportMode::Off
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum MouseEncoding {
    Default,
    Utf8,
    Sgr,
    Urxvt,
}

impl Default for MouseEncoding {
    fn default() -> Self {
        MouseEncoding::Default
    }
}

/// `[refreshStart, refreshEnd]` dirty-range tracking with `+∞`/`-∞`
/// sentinels (spec.md §4.2).
#[derive(Debug, Clone, Copy)]
pub struct DirtyRange {
    start: i64,
    end: i64,
}

impl DirtyRange {
    fn empty() -> Self {
        DirtyRange {
            start: i64::MAX,
            end: i64::MIN,
        }
    }

    pub fn update(&mut self, y: VisibleRowIndex) {
        if y < self.start {
            self.start = y;
        }
        if y > self.end {
            self.end = y;
        }
    }

    pub fn update_range(&mut self, from: VisibleRowIndex, to: VisibleRowIndex) {
        self.update(from);
        self.update(to);
    }

    pub fn max_range(rows: usize) -> Self {
        DirtyRange {
            start: 0,
            end: rows as i64 - 1,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.start > self.end
    }

    pub fn take(&mut self) -> Option<(VisibleRowIndex, VisibleRowIndex)> {
        if self.is_empty() {
            None
        } else {
            let r = (self.start, self.end);
            *self = DirtyRange::empty();
            Some(r)
        }
    }
}

impl Default for DirtyRange {
    fn default() -> Self {
        DirtyRange::empty()
    }
}

/// Shallow alt-screen snapshot, per spec.md §3/§9: geometry, lines,
/// ybase/ydisp, cursor, scroll region, and tab stops are saved and
/// restored; SGR pen, charset banks, and GL/GR level are *not* part of
/// the snapshot because they live on `Screen` outside `lines`/`cursor`
/// and are simply left untouched by entering/leaving alt-screen.
struct AltSnapshot {
    rows: usize,
    cols: usize,
    lines: VecDeque<Line>,
    ybase: usize,
    ydisp: usize,
    cursor_x: usize,
    cursor_y: usize,
    scroll_top: usize,
    scroll_bottom: usize,
    tabs: TabStops,
}

pub struct Screen {
    pub cols: usize,
    pub rows: usize,
    scrollback_cap: usize,
    lines: VecDeque<Line>,

    pub ybase: usize,
    pub ydisp: usize,

    pub cursor_x: usize,
    pub cursor_y: usize,
    wrap_pending: bool,
    saved_cursor: Option<(usize, usize)>,

    pub scroll_top: usize,
    pub scroll_bottom: usize,
    saved_cols_for_132: Option<usize>,

    pub tabs: TabStops,
    pub modes: Modes,
    pub mouse_mode: MouseReportMode,
    pub mouse_encoding: MouseEncoding,
    /// Button currently held down, so Move events can be distinguished
    /// between `ButtonEvent` (?1002, reports drags only) and `AnyEvent`
    /// (?1003, reports every motion) mode.
    pub current_mouse_button: crate::mouse::MouseButton,

    pub charsets: [CharsetTable; 4],
    /// Which G-bank the next ESC designator targets is tracked by the
    /// parser, not here; this is the active GL/GR selection (LS0‑LS3,
    /// LS1R‑LS3R).
    pub glevel: usize,
    pub grlevel: usize,
    pub shift_out: bool,

    pub pen: Style,
    physical_scroll: bool,
    physical_scrollback: VecDeque<Line>,

    alt: Option<AltSnapshot>,
    dirty: DirtyRange,
}

impl Screen {
    pub fn new(cols: usize, rows: usize, scrollback_cap: usize, physical_scroll: bool) -> Self {
        let cols = cols.max(1);
        let rows = rows.max(1);
        let mut lines = VecDeque::with_capacity(rows + scrollback_cap);
        for _ in 0..rows {
            lines.push_back(Line::new(cols, Style::default()));
        }
        Screen {
            cols,
            rows,
            scrollback_cap,
            lines,
            ybase: 0,
            ydisp: 0,
            cursor_x: 0,
            cursor_y: 0,
            wrap_pending: false,
            saved_cursor: None,
            scroll_top: 0,
            scroll_bottom: rows - 1,
            saved_cols_for_132: None,
            tabs: TabStops::new(cols),
            modes: Modes::default(),
            mouse_mode: MouseReportMode::default(),
            mouse_encoding: MouseEncoding::default(),
            current_mouse_button: crate::mouse::MouseButton::None,
            charsets: [CharsetTable::default(); 4],
            glevel: 0,
            grlevel: 0,
            shift_out: false,
            pen: Style::default(),
            physical_scroll,
            physical_scrollback: VecDeque::new(),
            alt: None,
            dirty: DirtyRange::default(),
        }
    }

    pub fn is_alt_screen(&self) -> bool {
        self.alt.is_some()
    }

    pub fn dirty_mut(&mut self) -> &mut DirtyRange {
        &mut self.dirty
    }

    pub fn take_dirty(&mut self) -> Option<(VisibleRowIndex, VisibleRowIndex)> {
        self.dirty.take()
    }

    fn mark_row_dirty(&mut self, y: VisibleRowIndex) {
        self.dirty.update(y);
    }

    // ---- row access -----------------------------------------------------

    fn phys(&self, y: usize) -> usize {
        self.ybase + y
    }

    pub fn visible_row(&self, y: usize) -> &Line {
        let idx = self.ydisp + y;
        &self.lines[idx]
    }

    /// `get_row(y) -> &mut Row`: mutable access to a viewport row,
    /// growing the buffer with blank rows if necessary (spec.md §4.2).
    pub fn row_mut(&mut self, y: usize) -> &mut Line {
        let idx = self.phys(y);
        while idx >= self.lines.len() {
            self.lines.push_back(Line::new(self.cols, Style::default()));
        }
        &mut self.lines[idx]
    }

    pub fn scrollback_len(&self) -> usize {
        self.ybase
    }

    /// `truncate_scrollback(cap)`: shrink the scrollback cap, evicting
    /// from the front immediately if the current history exceeds it.
    pub fn truncate_scrollback(&mut self, cap: usize) {
        self.scrollback_cap = cap;
        while self.ybase > cap {
            self.lines.pop_front();
            self.ybase -= 1;
            self.ydisp = self.ydisp.saturating_sub(1);
        }
        while self.physical_scrollback.len() > cap {
            self.physical_scrollback.pop_front();
        }
    }

    // ---- cursor -----------------------------------------------------

    /// Clamp `(x, y)` to the viewport, or to the scroll region if origin
    /// mode is set (spec.md §4.4 "Cursor movement clamps").
    pub fn clamp_cursor(&mut self) {
        let (top, bottom) = if self.modes.contains(Modes::ORIGIN) {
            (self.scroll_top, self.scroll_bottom)
        } else {
            (0, self.rows - 1)
        };
        self.cursor_y = self.cursor_y.clamp(top, bottom);
        self.cursor_x = self.cursor_x.min(self.cols.saturating_sub(1));
    }

    pub fn set_wrap_pending(&mut self, pending: bool) {
        self.wrap_pending = pending;
    }

    pub fn wrap_pending(&self) -> bool {
        self.wrap_pending
    }

    /// DECSC/DECRC save position only (spec.md §4.3).
    pub fn save_cursor(&mut self) {
        self.saved_cursor = Some((self.cursor_x, self.cursor_y));
    }

    pub fn restore_cursor(&mut self) {
        if let Some((x, y)) = self.saved_cursor {
            self.cursor_x = x;
            self.cursor_y = y;
        } else {
            self.cursor_x = 0;
            self.cursor_y = 0;
        }
        self.wrap_pending = false;
    }

    // ---- printing -----------------------------------------------------

    /// Print one already-charset-translated glyph at the cursor, handling
    /// deferred wrap, insert mode, and wide glyphs (spec.md §4.4 Normal
    /// state).
    pub fn print(&mut self, ch: char) {
        if self.wrap_pending {
            self.wrap_pending = false;
            if self.modes.contains(Modes::WRAPAROUND) {
                self.newline_with_cr();
            } else {
                // Wraparound disabled: stay on the margin and overwrite.
                self.cursor_x = self.cols.saturating_sub(1);
            }
        }
        let width = crate::cell::grapheme_width(ch);
        let style = self.pen;
        if self.modes.contains(Modes::INSERT) {
            let x = self.cursor_x;
            let y = self.cursor_y;
            self.row_mut(y).insert_cells(x, width, style);
        }
        {
            let x = self.cursor_x;
            let y = self.cursor_y;
            self.row_mut(y).set(x, ch, style);
        }
        self.mark_row_dirty(self.cursor_y as VisibleRowIndex);
        self.cursor_x += width;
        if self.cursor_x >= self.cols {
            self.cursor_x = self.cols;
            self.wrap_pending = true;
        }
    }

    fn newline_with_cr(&mut self) {
        self.cursor_x = 0;
        self.line_feed();
    }

    /// NEL (`ESC E`): CR followed by IND.
    pub fn nel(&mut self) {
        self.newline_with_cr();
    }

    /// LF: move down one row, scrolling the region if already at the
    /// bottom margin.
    pub fn line_feed(&mut self) {
        if self.cursor_y == self.scroll_bottom {
            self.scroll_up();
        } else if self.cursor_y + 1 < self.rows {
            self.cursor_y += 1;
        }
    }

    /// RI (reverse index): move up one row, scrolling the region down if
    /// already at the top margin (spec.md §4.4).
    pub fn reverse_index(&mut self) {
        if self.cursor_y == self.scroll_top {
            self.scroll_down();
        } else if self.cursor_y > 0 {
            self.cursor_y -= 1;
        }
    }

    // ---- scrolling ------------------------------------------------------
    //
    // spec.md §4.2's algorithm, read as two cases rather than four
    // unconditional steps (seee DESIGN.md "Open Question: scroll-up
    // algorithm" for why): when the scroll region starts at row 0, a
    // natural scroll grows the backing buffer and advances `ybase`
    // (content becomes addressable scrollback, or — under
    // `physical_scroll` — is evicted to a side queue instead); when the
    // region is restricted to not start at row 0, scrolling can never
    // touch `ybase` (rows above the region must not move), so it always
    // degrades to a local splice that drops the top-of-region row
    // outright.

    pub fn scroll_up(&mut self) {
        let style = erase_style(self.pen);
        if self.scroll_top == 0 {
            let blank = Line::new(self.cols, style);
            if self.physical_scroll {
                let evicted = self.lines.pop_front().unwrap_or_else(|| blank.clone());
                self.physical_scrollback.push_back(evicted);
                while self.physical_scrollback.len() > self.scrollback_cap {
                    self.physical_scrollback.pop_front();
                }
                let insert_at = self.ybase + self.scroll_bottom;
                if insert_at < self.lines.len() {
                    self.lines.insert(insert_at, blank);
                } else {
                    self.lines.push_back(blank);
                }
            } else {
                self.lines.push_back(blank);
                self.ybase += 1;
                if self.ybase > self.scrollback_cap {
                    self.lines.pop_front();
                    self.ybase -= 1;
                }
            }
        } else {
            let blank = Line::new(self.cols, style);
            let top = self.ybase + self.scroll_top;
            let bottom = self.ybase + self.scroll_bottom;
            if top < self.lines.len() {
                self.lines.remove(top);
            }
            let insert_at = bottom.min(self.lines.len());
            self.lines.insert(insert_at, blank);
        }
        self.dirty
            .update_range(self.scroll_top as VisibleRowIndex, self.scroll_bottom as VisibleRowIndex);
    }

    /// Mirror of `scroll_up`: used by RI and explicit `CSI T` (SD).
    pub fn scroll_down(&mut self) {
        let style = erase_style(self.pen);
        let blank = Line::new(self.cols, style);
        let top = self.ybase + self.scroll_top;
        let bottom = self.ybase + self.scroll_bottom;
        if bottom < self.lines.len() {
            self.lines.remove(bottom);
        }
        let insert_at = top.min(self.lines.len());
        self.lines.insert(insert_at, blank);
        self.dirty
            .update_range(self.scroll_top as VisibleRowIndex, self.scroll_bottom as VisibleRowIndex);
    }

    /// `IL`: insert `n` blank lines at the cursor row, shifting the rest
    /// of the region down and dropping rows off the bottom margin.
    pub fn insert_lines(&mut self, n: usize) {
        if self.cursor_y < self.scroll_top || self.cursor_y > self.scroll_bottom {
            return;
        }
        for _ in 0..n {
            let style = erase_style(self.pen);
            let bottom = self.ybase + self.scroll_bottom;
            if bottom < self.lines.len() {
                self.lines.remove(bottom);
            }
            let at = (self.ybase + self.cursor_y).min(self.lines.len());
            self.lines.insert(at, Line::new(self.cols, style));
        }
        self.dirty
            .update_range(self.cursor_y as VisibleRowIndex, self.scroll_bottom as VisibleRowIndex);
    }

    /// `DL`: delete `n` lines at the cursor row, pulling rows up from
    /// below and padding the bottom margin with blanks.
    pub fn delete_lines(&mut self, n: usize) {
        if self.cursor_y < self.scroll_top || self.cursor_y > self.scroll_bottom {
            return;
        }
        for _ in 0..n {
            let style = erase_style(self.pen);
            let at = self.ybase + self.cursor_y;
            if at < self.lines.len() {
                self.lines.remove(at);
            }
            let bottom = (self.ybase + self.scroll_bottom).min(self.lines.len());
            self.lines.insert(bottom, Line::new(self.cols, style));
        }
        self.dirty
            .update_range(self.cursor_y as VisibleRowIndex, self.scroll_bottom as VisibleRowIndex);
    }

    // ---- erase ------------------------------------------------------

    /// `ED`: 0 = below (inclusive of cursor row), 1 = above (inclusive),
    /// 2 = all. `3` (scrollback erase) is a deliberate no-op per spec.md
    /// §4.4.
    pub fn erase_in_display(&mut self, mode: i64) {
        let style = erase_style(self.pen);
        match mode {
            0 => {
                let x = self.cursor_x;
                let y = self.cursor_y;
                let cols = self.cols;
                self.row_mut(y).erase_range(x..cols, style);
                for row in (y + 1)..self.rows {
                    self.row_mut(row).erase_range(0..cols, style);
                }
                self.dirty.update_range(y as VisibleRowIndex, (self.rows - 1) as VisibleRowIndex);
            }
            1 => {
                let x = self.cursor_x;
                let y = self.cursor_y;
                let cols = self.cols;
                for row in 0..y {
                    self.row_mut(row).erase_range(0..cols, style);
                }
                self.row_mut(y).erase_range(0..=x, style);
                self.dirty.update_range(0, y as VisibleRowIndex);
            }
            2 => {
                let cols = self.cols;
                for row in 0..self.rows {
                    self.row_mut(row).erase_range(0..cols, style);
                }
                self.dirty = DirtyRange::max_range(self.rows);
            }
            3 => {}
            _ => log::trace!("erase_in_display: unknown mode {}", mode),
        }
    }

    /// `EL`: mirrors `ED` for the current row only.
    pub fn erase_in_line(&mut self, mode: i64) {
        let style = erase_style(self.pen);
        let x = self.cursor_x;
        let y = self.cursor_y;
        let cols = self.cols;
        match mode {
            0 => self.row_mut(y).erase_range(x..cols, style),
            1 => self.row_mut(y).erase_range(0..=x, style),
            2 => self.row_mut(y).erase_range(0..cols, style),
            _ => log::trace!("erase_in_line: unknown mode {}", mode),
        }
        self.mark_row_dirty(y as VisibleRowIndex);
    }

    pub fn erase_chars(&mut self, n: usize) {
        let style = erase_style(self.pen);
        let x = self.cursor_x;
        let y = self.cursor_y;
        self.row_mut(y).erase_cells(x, n.max(1), style);
        self.mark_row_dirty(y as VisibleRowIndex);
    }

    pub fn insert_chars(&mut self, n: usize) {
        let style = erase_style(self.pen);
        let x = self.cursor_x;
        let y = self.cursor_y;
        self.row_mut(y).insert_cells(x, n.max(1), style);
        self.mark_row_dirty(y as VisibleRowIndex);
    }

    pub fn delete_chars(&mut self, n: usize) {
        let style = erase_style(self.pen);
        let x = self.cursor_x;
        let y = self.cursor_y;
        self.row_mut(y).delete_cells(x, n.max(1), style);
        self.mark_row_dirty(y as VisibleRowIndex);
    }

    /// DECALN (`ESC # 8`): fill the screen with `E`.
    pub fn fill_with_e(&mut self) {
        let cols = self.cols;
        for row in 0..self.rows {
            let line = self.row_mut(row);
            for x in 0..cols {
                line.set(x, 'E', Style::default());
            }
        }
        self.dirty = DirtyRange::max_range(self.rows);
    }

    // ---- resize -----------------------------------------------------

    /// Resize, clamping non-positive dimensions to 1 (spec.md §4.7
    /// `GeometryError`).
    pub fn resize(&mut self, cols: i64, rows: i64) {
        let cols = cols.max(1) as usize;
        let rows = rows.max(1) as usize;
        if cols != self.cols {
            for line in self.lines.iter_mut() {
                line.resize(cols, Style::default());
            }
            self.tabs.resize(cols);
            self.cols = cols;
        }
        if rows != self.rows {
            if rows > self.rows {
                let grow = rows - self.rows;
                for _ in 0..grow {
                    self.lines.push_back(Line::new(self.cols, Style::default()));
                }
            } else {
                let shrink = (self.rows - rows).min(self.ybase);
                self.ybase -= shrink;
                self.ydisp = self.ydisp.min(self.ybase);
            }
            self.rows = rows;
            self.scroll_top = 0;
            self.scroll_bottom = rows - 1;
        }
        self.cursor_x = self.cursor_x.min(self.cols.saturating_sub(1));
        self.cursor_y = self.cursor_y.min(self.rows.saturating_sub(1));
        self.dirty = DirtyRange::max_range(self.rows);
    }

    pub fn save_cols_for_132(&mut self) {
        if self.saved_cols_for_132.is_none() {
            self.saved_cols_for_132 = Some(self.cols);
        }
    }

    pub fn restore_cols_after_132(&mut self) -> Option<usize> {
        self.saved_cols_for_132.take()
    }

    // ---- scrollback / alt screen -----------------------------------

    pub fn scroll_view_to(&mut self, ydisp: usize) {
        self.ydisp = ydisp.min(self.ybase);
    }

    pub fn scroll_view_by(&mut self, delta: i64) {
        let new_ydisp = (self.ydisp as i64 + delta).clamp(0, self.ybase as i64) as usize;
        self.ydisp = new_ydisp;
    }

    pub fn is_at_bottom(&self) -> bool {
        self.ydisp == self.ybase
    }

    /// Enter alt-screen: one level of save only, re-entry while already
    /// saved is a no-op (spec.md §3).
    pub fn enter_alt_screen(&mut self, clear: bool) {
        if self.alt.is_some() {
            return;
        }
        let snapshot = AltSnapshot {
            rows: self.rows,
            cols: self.cols,
            lines: std::mem::replace(
                &mut self.lines,
                VecDeque::from(vec![Line::new(self.cols, Style::default()); self.rows]),
            ),
            ybase: self.ybase,
            ydisp: self.ydisp,
            cursor_x: self.cursor_x,
            cursor_y: self.cursor_y,
            scroll_top: self.scroll_top,
            scroll_bottom: self.scroll_bottom,
            tabs: self.tabs.clone(),
        };
        self.alt = Some(snapshot);
        self.ybase = 0;
        self.ydisp = 0;
        if clear {
            self.cursor_x = 0;
            self.cursor_y = 0;
            let style = Style::default();
            for row in 0..self.rows {
                self.row_mut(row).erase_range(0..self.cols, style);
            }
        }
        self.dirty = DirtyRange::max_range(self.rows);
    }

    /// Leave alt-screen, restoring the primary buffer bitwise.
    pub fn exit_alt_screen(&mut self) {
        let snapshot = match self.alt.take() {
            Some(s) => s,
            None => return,
        };
        self.lines = snapshot.lines;
        self.rows = snapshot.rows;
        self.cols = snapshot.cols;
        self.ybase = snapshot.ybase;
        self.ydisp = snapshot.ydisp;
        self.cursor_x = snapshot.cursor_x;
        self.cursor_y = snapshot.cursor_y;
        self.scroll_top = snapshot.scroll_top;
        self.scroll_bottom = snapshot.scroll_bottom;
        self.tabs = snapshot.tabs;
        self.dirty = DirtyRange::max_range(self.rows);
    }

    /// Restore all engine-owned fields except palette, cols, rows, and
    /// scrollback cap (spec.md §3 "Lifecycle").
    pub fn reset(&mut self) {
        let cols = self.cols;
        let rows = self.rows;
        let scrollback_cap = self.scrollback_cap;
        let physical_scroll = self.physical_scroll;
        *self = Screen::new(cols, rows, scrollback_cap, physical_scroll);
    }
}
