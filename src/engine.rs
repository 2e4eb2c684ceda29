//! Public controller (component C9): binds the parser (C5), write
//! scheduler (C6), input translators (C7), screen (C2/C3) and event bus
//! (C8) into the single object a collaborator holds (spec.md §6).

use crate::color::ColorPalette;
use crate::config::EngineOptions;
use crate::event::{Event, EventBus, EventKind, Subscriber};
use crate::input::{encode_key, AltSendsEscape, KeyAction, KeyEvent};
use crate::mouse::{encode_mouse, MouseEvent};
use crate::parser::EngineParser;
use crate::scheduler::{RefreshSignal, WriteScheduler};
use crate::screen::{Modes, Screen};
use anyhow::{ensure, Result};

/// Owns all engine state and exposes the byte-stream and input-event API
/// a collaborator drives. Rendering, I/O and clipboard access stay on the
/// collaborator's side of this boundary (spec.md §6 "The engine never
/// writes to I/O directly").
pub struct Engine {
    options: EngineOptions,
    screen: Screen,
    palette: ColorPalette,
    events: EventBus,
    parser: EngineParser,
    scheduler: WriteScheduler,
    alt_sends_escape: AltSendsEscape,
}

impl Engine {
    /// Construct a fresh engine. `options.cols`/`options.rows` being zero
    /// is a caller bug (not a stream-decoding hiccup like a later `resize`
    /// with a non-positive dimension) and is rejected rather than
    /// silently clamped: this is the one fallible entry point in the
    /// public API (spec.md §7 / SPEC_FULL A.2).
    pub fn new(options: EngineOptions) -> Result<Self> {
        ensure!(options.cols > 0, "cols must be positive, got {}", options.cols);
        ensure!(options.rows > 0, "rows must be positive, got {}", options.rows);
        log::debug!("constructing engine: {}x{}, scrollback={}", options.cols, options.rows, options.scrollback);
        let screen = Screen::new(options.cols, options.rows, options.scrollback, options.physical_scroll);
        let palette = ColorPalette::from_seed(options.palette);
        Ok(Engine {
            options,
            screen,
            palette,
            events: EventBus::default(),
            parser: EngineParser::new(),
            scheduler: WriteScheduler::new(),
            alt_sends_escape: AltSendsEscape::Yes,
        })
    }

    pub fn subscribe(&mut self, kind: EventKind, cb: Subscriber) {
        self.events.subscribe(kind, cb);
    }

    /// Reset to the state of a freshly constructed engine, keeping
    /// `palette`/geometry (spec.md §8 invariant 4).
    pub fn reset(&mut self) {
        log::debug!("resetting terminal state");
        let cols = self.screen.cols;
        let rows = self.screen.rows;
        self.screen = Screen::new(cols, rows, self.options.scrollback, self.options.physical_scroll);
        self.parser = EngineParser::new();
        self.scheduler = WriteScheduler::new();
    }

    /// Resize to `cols x rows`. Non-positive dimensions are clamped to 1
    /// (spec.md §7 "GeometryError... silently clamped").
    pub fn resize(&mut self, cols: i64, rows: i64) {
        log::debug!("resizing to {}x{}", cols, rows);
        self.screen.resize(cols.max(1), rows.max(1));
        self.options.cols = self.screen.cols;
        self.options.rows = self.screen.rows;
        if let Some((start, end)) = self.screen.take_dirty() {
            self.events.emit(Event::RowDirty(start..end + 1));
            self.events.emit(Event::Refresh(start, end));
        }
    }

    /// Queue host output for parsing and pump it immediately, up to the
    /// scheduler's yield budget (spec.md §4.5). Returns whether the
    /// collaborator should refresh now or wait for a later pump.
    pub fn write(&mut self, bytes: &[u8]) -> RefreshSignal {
        if self.events.is_destroyed() {
            return RefreshSignal::Immediate;
        }
        let converted;
        let bytes = if self.options.convert_eol {
            converted = convert_eol(bytes);
            &converted
        } else {
            bytes
        };
        self.scheduler.queue(bytes);
        self.pump()
    }

    /// Resume processing a queue left over from a prior `write` that hit
    /// its yield budget. Collaborators on a run-loop call this from their
    /// scheduled continuation; `write` already calls it once inline.
    pub fn pump(&mut self) -> RefreshSignal {
        if self.events.is_destroyed() {
            return RefreshSignal::Immediate;
        }
        self.pump_with(|scheduler, process| scheduler.pump(process))
    }

    /// Synchronously drain everything queued, ignoring the yield budget.
    pub fn flush(&mut self) {
        if self.events.is_destroyed() {
            return;
        }
        self.pump_with(|scheduler, process| {
            scheduler.flush(process);
            RefreshSignal::Immediate
        });
    }

    fn pump_with(&mut self, run: impl FnOnce(&mut WriteScheduler, &mut dyn FnMut(&[u8])) -> RefreshSignal) -> RefreshSignal {
        let term_family = self.options.term_family();
        let cookie = self.options.application_mode_cookie.clone();
        let parser = &mut self.parser;
        let screen = &mut self.screen;
        let palette = &self.palette;
        let events = &mut self.events;
        let mut process = move |chunk: &[u8]| {
            parser.feed(chunk, screen, palette, events, term_family, cookie.as_deref());
            if let Some((start, end)) = screen.take_dirty() {
                events.emit(Event::RowDirty(start..end + 1));
                events.emit(Event::Refresh(start, end));
            }
        };
        run(&mut self.scheduler, &mut process)
    }

    /// Translate and apply a logical key press. Emits `Event::Data` when
    /// bytes are produced, alongside `Event::KeyDown`; unrecognized keys
    /// emit `Event::UnknownKeyDown` instead (spec.md §6).
    pub fn key_down(&mut self, event: KeyEvent) {
        if self.events.is_destroyed() {
            return;
        }
        let app_cursor_keys = self.screen.modes.contains(Modes::APP_CURSOR_KEYS);
        match encode_key(event, app_cursor_keys, self.alt_sends_escape) {
            KeyAction::Bytes(bytes) => {
                self.events.emit(Event::Data(bytes));
                self.events.emit(Event::KeyDown);
                self.events.emit(Event::Key);
            }
            KeyAction::ScrollLines(delta) => self.scroll_view_by(delta),
            KeyAction::ScrollPages(delta) => {
                let rows = self.screen.rows as i64;
                self.scroll_view_by(delta * rows);
            }
            KeyAction::None => self.events.emit(Event::UnknownKeyDown),
        }
    }

    /// A printable character typed directly (as opposed to a logical key
    /// code); always produces bytes (spec.md §6 `key_press`).
    pub fn key_press(&mut self, ch: char, modifiers: crate::input::KeyModifiers) {
        if self.events.is_destroyed() {
            return;
        }
        let mut buf = [0u8; 4];
        let mut bytes = ch.encode_utf8(&mut buf).as_bytes().to_vec();
        if modifiers.contains(crate::input::KeyModifiers::META)
            || (modifiers.contains(crate::input::KeyModifiers::ALT) && self.alt_sends_escape == AltSendsEscape::Yes)
        {
            bytes.insert(0, 0x1b);
        }
        self.events.emit(Event::Data(bytes));
        self.events.emit(Event::KeyPress);
        self.events.emit(Event::Key);
    }

    /// Translate and apply a mouse event, honoring the active reporting
    /// mode/encoding (spec.md §6 `mouse`).
    pub fn mouse(&mut self, event: MouseEvent) {
        if self.events.is_destroyed() {
            return;
        }
        match event.kind {
            crate::mouse::MouseEventKind::Press => self.screen.current_mouse_button = event.button,
            crate::mouse::MouseEventKind::Release => self.screen.current_mouse_button = crate::mouse::MouseButton::None,
            crate::mouse::MouseEventKind::Move => {}
        }
        let button_held = self.screen.current_mouse_button;
        if let Some(bytes) = encode_mouse(event, self.screen.mouse_mode, self.screen.mouse_encoding, button_held) {
            self.events.emit(Event::Data(bytes));
        }
    }

    /// Focus in/out notification; emits `ESC [I` / `ESC [O` only when
    /// ?1004 focus-event reporting is enabled (spec.md §6 `focus`).
    pub fn focus(&mut self, focused: bool) {
        if self.events.is_destroyed() {
            return;
        }
        if !self.screen.modes.contains(Modes::FOCUS_EVENTS) {
            return;
        }
        let byte = if focused { b'I' } else { b'O' };
        self.events.emit(Event::Data(vec![0x1b, b'[', byte]));
    }

    fn scroll_view_by(&mut self, delta: i64) {
        self.screen.scroll_view_by(delta);
        self.events.emit(Event::ManualScroll {
            position: self.screen.ydisp,
            is_bottom: self.screen.is_at_bottom(),
        });
    }

    pub fn screen(&self) -> &Screen {
        &self.screen
    }

    /// Cursor position relative to the top-left of the visible viewport,
    /// the shape a renderer wants rather than `Screen`'s raw `usize` pair.
    pub fn cursor_position(&self) -> crate::CursorPosition {
        crate::CursorPosition { x: self.screen.cursor_x, y: self.screen.cursor_y as crate::VisibleRowIndex }
    }

    pub fn palette(&self) -> &ColorPalette {
        &self.palette
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    /// Tear down the engine: clears all subscribers and makes every
    /// further `write`/`feed_input`/`mouse`/`focus` call a no-op
    /// (spec.md §5).
    pub fn destroy(&mut self) {
        self.events.destroy();
    }
}

/// Rewrite a lone `\n` (not already preceded by `\r`) as `\r\n`, for hosts
/// that don't emit CR themselves (spec.md §6 `convert_eol`).
fn convert_eol(bytes: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(bytes.len());
    let mut prev = None;
    for &b in bytes {
        if b == b'\n' && prev != Some(b'\r') {
            out.push(b'\r');
        }
        out.push(b);
        prev = Some(b);
    }
    out
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::input::{KeyCode, KeyModifiers};
    use std::cell::RefCell;
    use std::rc::Rc;

    fn engine() -> Engine {
        Engine::new(EngineOptions { cols: 10, rows: 3, ..EngineOptions::default() }).unwrap()
    }

    #[test]
    fn write_renders_into_screen() {
        let mut e = engine();
        e.write(b"hi");
        assert_eq!(e.screen().visible_row(0).to_text(), "hi        ");
        let pos = e.cursor_position();
        assert_eq!((pos.x, pos.y), (2, 0));
    }

    #[test]
    fn write_emits_row_dirty_and_refresh_for_touched_rows() {
        let mut e = engine();
        let dirty = Rc::new(RefCell::new(Vec::new()));
        let dirty2 = Rc::clone(&dirty);
        e.subscribe(
            EventKind::Refresh,
            Box::new(move |ev| {
                if let Event::Refresh(start, end) = ev {
                    dirty2.borrow_mut().push((*start, *end));
                }
            }),
        );
        e.write(b"hi\r\nthere");
        assert_eq!(*dirty.borrow(), vec![(0, 1)]);
    }

    #[test]
    fn convert_eol_rewrites_lone_newline() {
        assert_eq!(convert_eol(b"a\nb"), b"a\r\nb");
        assert_eq!(convert_eol(b"a\r\nb"), b"a\r\nb");
    }

    #[test]
    fn key_down_emits_data_for_arrow() {
        let mut e = engine();
        let log = Rc::new(RefCell::new(Vec::new()));
        let log2 = Rc::clone(&log);
        e.subscribe(EventKind::Data, Box::new(move |ev| {
            if let Event::Data(bytes) = ev {
                log2.borrow_mut().push(bytes.clone());
            }
        }));
        e.key_down(KeyEvent { key: KeyCode::Up, modifiers: KeyModifiers::empty() });
        assert_eq!(*log.borrow(), vec![b"\x1b[A".to_vec()]);
    }

    #[test]
    fn shift_ctrl_arrow_scrolls_and_emits_manual_scroll_not_data() {
        let mut e = engine();
        e.write(b"\x1b[?1049h");
        let data_log = Rc::new(RefCell::new(0));
        let data_log2 = Rc::clone(&data_log);
        e.subscribe(EventKind::Data, Box::new(move |_| *data_log2.borrow_mut() += 1));
        let scroll_log = Rc::new(RefCell::new(Vec::new()));
        let scroll_log2 = Rc::clone(&scroll_log);
        e.subscribe(
            EventKind::ManualScroll,
            Box::new(move |ev| {
                if let Event::ManualScroll { position, is_bottom } = ev {
                    scroll_log2.borrow_mut().push((*position, *is_bottom));
                }
            }),
        );
        e.key_down(KeyEvent { key: KeyCode::Up, modifiers: KeyModifiers::SHIFT | KeyModifiers::CTRL });
        assert_eq!(*data_log.borrow(), 0);
        assert_eq!(scroll_log.borrow().len(), 1);
    }

    #[test]
    fn focus_emits_only_when_mode_enabled() {
        let mut e = engine();
        let log = Rc::new(RefCell::new(0));
        let log2 = Rc::clone(&log);
        e.subscribe(EventKind::Data, Box::new(move |_| *log2.borrow_mut() += 1));
        e.focus(true);
        assert_eq!(*log.borrow(), 0);
        e.write(b"\x1b[?1004h");
        e.focus(true);
        assert_eq!(*log.borrow(), 1);
    }

    #[test]
    fn destroy_silences_further_writes() {
        let mut e = engine();
        e.destroy();
        e.write(b"hello");
        assert_eq!(e.screen().visible_row(0).to_text().trim(), "");
    }

    #[test]
    fn new_rejects_zero_geometry() {
        let result = Engine::new(EngineOptions { cols: 0, rows: 24, ..EngineOptions::default() });
        assert!(result.is_err());
    }

    #[test]
    fn resize_clamps_nonpositive_dimensions() {
        let mut e = engine();
        e.resize(0, -5);
        assert_eq!(e.screen().cols, 1);
        assert_eq!(e.screen().rows, 1);
    }

    #[test]
    fn resize_emits_refresh_for_the_whole_screen() {
        let mut e = engine();
        let log = Rc::new(RefCell::new(0));
        let log2 = Rc::clone(&log);
        e.subscribe(EventKind::Refresh, Box::new(move |_| *log2.borrow_mut() += 1));
        e.resize(20, 6);
        assert_eq!(*log.borrow(), 1);
    }

    #[test]
    fn reset_preserves_geometry_but_clears_content() {
        let mut e = engine();
        e.write(b"hi");
        e.reset();
        assert_eq!(e.screen().cols, 10);
        assert_eq!(e.screen().rows, 3);
        assert_eq!(e.screen().visible_row(0).to_text().trim(), "");
    }
}
