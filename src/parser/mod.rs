//! Byte-stream parser (component C5): wraps `vtparse::VTParser`, dispatches
//! semantic actions into [`Screen`]/[`EventBus`], and hosts the
//! application-mode cookie pass-through channel.
//!
//! The application-mode payload (spec.md §4.4 "AppEnd") is arbitrary binary
//! data that must reach collaborators byte-for-byte, so it cannot be routed
//! through `vtparse` at all — an embedded `ESC` or control byte in the
//! payload would otherwise desync the state machine. [`EngineParser::feed`]
//! therefore intercepts bytes itself, the same way termwiz's parser steps
//! outside `vtparse` while `is_tmux_mode` is set: while collecting, raw
//! bytes are scanned for the terminating NUL directly and never touch the
//! state machine.

mod dcs;

use crate::cell::apply_sgr;
use crate::charset;
use crate::color::ColorPalette;
use crate::config::TermFamily;
use crate::event::{Event, EventBus};
use crate::screen::{Modes, MouseEncoding, MouseReportMode, Screen};
use dcs::DcsMode;
use vtparse::{CsiParam, VTActor, VTParser};

/// Where we are with respect to the application-mode cookie protocol.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
enum AppMode {
    /// Ordinary VT parsing.
    Normal,
    /// Saw `ESC &`; accumulating the `cookie;...` chunks up to the
    /// terminating BEL.
    CollectingStart,
    /// Cookie matched; bypassing `vtparse` and scanning raw bytes for NUL.
    Collecting,
}

pub struct EngineParser {
    vt: VTParser,
    app_mode: AppMode,
    app_start_buf: Vec<u8>,
    last_graphic: Option<char>,
    dcs_mode: DcsMode,
    dcs_buf: Vec<u8>,
}

impl Default for EngineParser {
    fn default() -> Self {
        EngineParser {
            vt: VTParser::new(),
            app_mode: AppMode::Normal,
            app_start_buf: Vec::new(),
            last_graphic: None,
            dcs_mode: DcsMode::default(),
            dcs_buf: Vec::new(),
        }
    }
}

impl EngineParser {
    pub fn new() -> Self {
        Self::default()
    }

    #[allow(clippy::too_many_arguments)]
    pub fn feed(
        &mut self,
        bytes: &[u8],
        screen: &mut Screen,
        palette: &ColorPalette,
        events: &mut EventBus,
        term_family: TermFamily,
        app_cookie: Option<&str>,
    ) {
        let mut i = 0;
        while i < bytes.len() {
            if self.app_mode == AppMode::Collecting {
                let start = i;
                while i < bytes.len() && bytes[i] != 0 {
                    i += 1;
                }
                if i > start {
                    events.emit(Event::ApplicationModeData(bytes[start..i].to_vec()));
                }
                if i < bytes.len() && bytes[i] == 0 {
                    events.emit(Event::ApplicationModeEnd);
                    self.app_mode = AppMode::Normal;
                    i += 1;
                }
                continue;
            }

            let byte = bytes[i];
            let mut performer = Performer {
                screen,
                palette,
                events,
                term_family,
                app_cookie,
                app_mode: &mut self.app_mode,
                app_start_buf: &mut self.app_start_buf,
                last_graphic: &mut self.last_graphic,
                dcs_mode: &mut self.dcs_mode,
                dcs_buf: &mut self.dcs_buf,
            };
            self.vt.parse_byte(byte, &mut performer);
            i += 1;
        }
    }
}

struct Performer<'a> {
    screen: &'a mut Screen,
    palette: &'a ColorPalette,
    events: &'a mut EventBus,
    term_family: TermFamily,
    app_cookie: Option<&'a str>,
    app_mode: &'a mut AppMode,
    app_start_buf: &'a mut Vec<u8>,
    last_graphic: &'a mut Option<char>,
    dcs_mode: &'a mut DcsMode,
    dcs_buf: &'a mut Vec<u8>,
}

impl<'a> Performer<'a> {
    fn active_charset(&self) -> charset::CharsetTable {
        self.screen.charsets[self.screen.glevel.min(3)]
    }

    fn send(&mut self, bytes: Vec<u8>) {
        self.events.emit(Event::Data(bytes));
    }

    fn finish_app_start(&mut self) {
        let raw = String::from_utf8_lossy(self.app_start_buf).to_string();
        self.app_start_buf.clear();
        let params: Vec<String> = raw.split(';').map(str::to_string).collect();
        let matches_cookie = match self.app_cookie {
            Some(cookie) => params.first().map(|p| p == cookie).unwrap_or(false),
            None => false,
        };
        if matches_cookie {
            self.events.emit(Event::ApplicationModeStart(params));
            *self.app_mode = AppMode::Collecting;
        } else {
            log::debug!("application-mode cookie mismatch: {:?}", params.first());
            *self.app_mode = AppMode::Normal;
        }
    }

    fn da1_reply(&self) -> &'static [u8] {
        match self.term_family {
            TermFamily::Linux => crate::DA1_LINUX,
            _ => crate::DA1_XTERM,
        }
    }

    fn da2_reply(&self) -> &'static [u8] {
        match self.term_family {
            TermFamily::Rxvt => b"\x1b[>85;95;0c",
            TermFamily::Screen => b"\x1b[>83;40003;0c",
            TermFamily::Xterm | TermFamily::Linux => b"\x1b[>0;276;0c",
        }
    }

    fn apply_dec_private_mode(&mut self, code: i64, set: bool) {
        match code {
            1 => set_mode(&mut self.screen.modes, Modes::APP_CURSOR_KEYS, set),
            3 => {
                if set {
                    self.screen.save_cols_for_132();
                    self.screen.resize(132, self.screen.rows as i64);
                } else if let Some(cols) = self.screen.restore_cols_after_132() {
                    self.screen.resize(cols as i64, self.screen.rows as i64);
                }
                set_mode(&mut self.screen.modes, Modes::COL_132, set);
            }
            6 => set_mode(&mut self.screen.modes, Modes::ORIGIN, set),
            7 => set_mode(&mut self.screen.modes, Modes::WRAPAROUND, set),
            9 => self.screen.mouse_mode = if set { MouseReportMode::X10 } else { MouseReportMode::Off },
            25 => set_mode(&mut self.screen.modes, Modes::CURSOR_VISIBLE, set),
            47 => {
                if set {
                    self.screen.enter_alt_screen(false);
                } else {
                    self.screen.exit_alt_screen();
                }
            }
            66 => set_mode(&mut self.screen.modes, Modes::APP_KEYPAD, set),
            1000 => self.screen.mouse_mode = if set { MouseReportMode::VT200 } else { MouseReportMode::Off },
            1002 => self.screen.mouse_mode = if set { MouseReportMode::ButtonEvent } else { MouseReportMode::Off },
            1003 => self.screen.mouse_mode = if set { MouseReportMode::AnyEvent } else { MouseReportMode::Off },
            1004 => set_mode(&mut self.screen.modes, Modes::FOCUS_EVENTS, set),
            1005 => self.screen.mouse_encoding = if set { MouseEncoding::Utf8 } else { MouseEncoding::Default },
            1006 => self.screen.mouse_encoding = if set { MouseEncoding::Sgr } else { MouseEncoding::Default },
            1015 => self.screen.mouse_encoding = if set { MouseEncoding::Urxvt } else { MouseEncoding::Default },
            1047 => {
                if set {
                    self.screen.enter_alt_screen(true);
                } else {
                    self.screen.exit_alt_screen();
                }
            }
            1049 => {
                if set {
                    self.screen.save_cursor();
                    self.screen.enter_alt_screen(true);
                } else {
                    self.screen.exit_alt_screen();
                    self.screen.restore_cursor();
                }
            }
            other => log::trace!("unrecognized DEC private mode {}", other),
        }
    }
}

fn set_mode(modes: &mut Modes, flag: Modes, value: bool) {
    if value {
        modes.insert(flag);
    } else {
        modes.remove(flag);
    }
}

fn csi_ints(params: &[CsiParam]) -> Vec<i64> {
    params.iter().filter_map(CsiParam::as_integer).collect()
}

fn csi_prefix(params: &[CsiParam]) -> Option<u8> {
    match params.first() {
        Some(CsiParam::P(c)) if matches!(*c, b'?' | b'>' | b'!' | b'=') => Some(*c),
        _ => None,
    }
}

/// A parameter that defaults (and clamps up) to 1 when omitted or zero,
/// per spec.md §4.4 "a CSI parameter < 1 where spec says default 1
/// becomes 1".
fn count_param(ints: &[i64], idx: usize) -> usize {
    ints.get(idx).copied().filter(|&v| v > 0).unwrap_or(1) as usize
}

fn mode_param(ints: &[i64], idx: usize, default: i64) -> i64 {
    ints.get(idx).copied().unwrap_or(default)
}

impl<'a> VTActor for Performer<'a> {
    fn print(&mut self, c: char) {
        match *self.app_mode {
            AppMode::CollectingStart => {
                let mut buf = [0u8; 4];
                self.app_start_buf.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
            }
            _ => {
                let table = self.active_charset();
                let translated = charset::translate(table, c);
                *self.last_graphic = Some(translated);
                self.screen.print(translated);
            }
        }
    }

    fn execute_c0_or_c1(&mut self, control: u8) {
        if *self.app_mode == AppMode::CollectingStart {
            if control == 0x07 {
                self.finish_app_start();
            }
            return;
        }
        match control {
            0x07 => self.events.emit(Event::Bell),
            0x08 => self.screen.cursor_x = self.screen.cursor_x.saturating_sub(1),
            0x09 => {
                let next = self.screen.tabs.next_stop(self.screen.cursor_x);
                self.screen.cursor_x = next;
            }
            0x0a | 0x0b | 0x0c => self.screen.line_feed(),
            0x0d => self.screen.cursor_x = 0,
            0x0e => self.screen.glevel = 1,
            0x0f => self.screen.glevel = 0,
            other => log::trace!("unhandled C0/C1 control 0x{:02x}", other),
        }
    }

    fn dcs_hook(&mut self, byte: u8, params: &[i64], intermediates: &[u8], ignored: bool) {
        self.dcs_buf.clear();
        *self.dcs_mode = if !ignored && dcs::is_rqss(intermediates, byte) {
            DcsMode::Rqss
        } else {
            let _ = params;
            DcsMode::Ignore
        };
    }

    fn dcs_put(&mut self, byte: u8) {
        if *self.dcs_mode == DcsMode::Rqss {
            self.dcs_buf.push(byte);
        }
    }

    fn dcs_unhook(&mut self) {
        if *self.dcs_mode == DcsMode::Rqss {
            let reply = dcs::decrqss_reply(self.dcs_buf, self.screen);
            self.send(reply);
        }
        *self.dcs_mode = DcsMode::Ignore;
        self.dcs_buf.clear();
    }

    fn esc_dispatch(&mut self, _params: &[i64], intermediates: &[u8], _ignored: bool, byte: u8) {
        if intermediates.is_empty() {
            match byte {
                b'&' => {
                    *self.app_mode = AppMode::CollectingStart;
                    self.app_start_buf.clear();
                }
                b'c' => self.screen.reset(),
                b'D' => self.screen.line_feed(),
                b'E' => self.screen.nel(),
                b'M' => self.screen.reverse_index(),
                b'7' => self.screen.save_cursor(),
                b'8' => self.screen.restore_cursor(),
                b'=' => self.screen.modes.insert(Modes::APP_KEYPAD),
                b'>' => self.screen.modes.remove(Modes::APP_KEYPAD),
                b'H' => {
                    let x = self.screen.cursor_x;
                    self.screen.tabs.set(x);
                }
                b'N' | b'O' => {} // single-shift: accepted, effect not implemented
                b'n' => self.screen.glevel = 2,
                b'o' => self.screen.glevel = 3,
                b'|' => self.screen.grlevel = 3,
                b'}' => self.screen.grlevel = 2,
                b'~' => self.screen.grlevel = 1,
                other => log::trace!("unrecognized ESC final 0x{:02x}", other),
            }
            return;
        }

        match intermediates[0] {
            b'(' | b')' | b'*' | b'+' | b'-' | b'.' | b'/' => {
                let bank = match intermediates[0] {
                    b'(' => 0,
                    b')' | b'-' => 1,
                    b'*' | b'.' => 2,
                    b'+' | b'/' => 3,
                    _ => unreachable!(),
                };
                // A `/` intermediate (whether the sole one, designating G3's
                // 96-character slot, or a second one riding a G0-G3 selector)
                // always means ISOLatin1 and discards the final byte
                // (spec.md §4.4 "'/' → ISOLatin (consumes next byte)").
                if intermediates[0] == b'/' || intermediates.get(1) == Some(&b'/') {
                    self.screen.charsets[bank] = charset::CharsetTable::IsoLatin1;
                } else if let Some(table) = charset::designator_to_table(byte) {
                    self.screen.charsets[bank] = table;
                }
            }
            b'#' => {
                if byte == b'8' {
                    self.screen.fill_with_e();
                }
            }
            b'%' => {} // set default/utf-8: accepted, no-op
            other => log::trace!("unrecognized ESC intermediate 0x{:02x}", other),
        }
    }

    fn csi_dispatch(&mut self, params: &[CsiParam], _parameters_truncated: bool, byte: u8) {
        let ints = csi_ints(params);
        let prefix = csi_prefix(params);

        match byte {
            b'A' => self.screen.cursor_y = self.screen.cursor_y.saturating_sub(count_param(&ints, 0)),
            b'B' | b'e' => self.screen.cursor_y += count_param(&ints, 0),
            b'C' | b'a' => self.screen.cursor_x += count_param(&ints, 0),
            b'D' => self.screen.cursor_x = self.screen.cursor_x.saturating_sub(count_param(&ints, 0)),
            b'E' => {
                self.screen.cursor_y += count_param(&ints, 0);
                self.screen.cursor_x = 0;
            }
            b'F' => {
                self.screen.cursor_y = self.screen.cursor_y.saturating_sub(count_param(&ints, 0));
                self.screen.cursor_x = 0;
            }
            b'G' | b'`' => self.screen.cursor_x = count_param(&ints, 0) - 1,
            b'd' => self.screen.cursor_y = count_param(&ints, 0) - 1,
            b'H' | b'f' => {
                let row = count_param(&ints, 0) - 1;
                let col = count_param(&ints, 1) - 1;
                let top = if self.screen.modes.contains(Modes::ORIGIN) {
                    self.screen.scroll_top
                } else {
                    0
                };
                self.screen.cursor_y = top + row;
                self.screen.cursor_x = col;
            }
            b'J' => self.screen.erase_in_display(mode_param(&ints, 0, 0)),
            b'K' => self.screen.erase_in_line(mode_param(&ints, 0, 0)),
            b'L' => self.screen.insert_lines(count_param(&ints, 0)),
            b'M' => self.screen.delete_lines(count_param(&ints, 0)),
            b'P' => self.screen.delete_chars(count_param(&ints, 0)),
            b'X' => self.screen.erase_chars(count_param(&ints, 0)),
            b'S' => {
                for _ in 0..count_param(&ints, 0) {
                    self.screen.scroll_up();
                }
            }
            b'T' => {
                for _ in 0..count_param(&ints, 0) {
                    self.screen.scroll_down();
                }
            }
            b'Z' => {
                let mut x = self.screen.cursor_x;
                for _ in 0..count_param(&ints, 0) {
                    x = self.screen.tabs.prev_stop(x);
                }
                self.screen.cursor_x = x;
            }
            b'@' => self.screen.insert_chars(count_param(&ints, 0)),
            b'I' => {
                let mut x = self.screen.cursor_x;
                for _ in 0..count_param(&ints, 0) {
                    x = self.screen.tabs.next_stop(x);
                }
                self.screen.cursor_x = x;
            }
            b'b' => {
                if let Some(ch) = *self.last_graphic {
                    for _ in 0..count_param(&ints, 0) {
                        self.screen.print(ch);
                    }
                }
            }
            b'c' => {
                let reply = if prefix == Some(b'>') {
                    self.da2_reply().to_vec()
                } else {
                    self.da1_reply().to_vec()
                };
                self.send(reply);
            }
            b'g' => match mode_param(&ints, 0, 0) {
                0 => {
                    let x = self.screen.cursor_x;
                    self.screen.tabs.clear(x);
                }
                3 => self.screen.tabs.clear_all(),
                other => log::trace!("TBC: unknown mode {}", other),
            },
            b'h' | b'l' => {
                let set = byte == b'h';
                if prefix == Some(b'?') {
                    for code in &ints {
                        self.apply_dec_private_mode(*code, set);
                    }
                } else {
                    for code in &ints {
                        if *code == 4 {
                            set_mode(&mut self.screen.modes, Modes::INSERT, set);
                        } else {
                            log::trace!("unrecognized ANSI mode {}", code);
                        }
                    }
                }
            }
            b'm' => {
                self.screen.pen = apply_sgr(&ints, self.screen.pen, self.palette);
            }
            b'n' => match ints.first() {
                Some(5) => self.send(b"\x1b[0n".to_vec()),
                Some(6) if prefix == Some(b'?') => {
                    let reply = format!(
                        "\x1b[?{};{}R",
                        self.screen.cursor_y + 1,
                        self.screen.cursor_x + 1
                    );
                    self.send(reply.into_bytes());
                }
                Some(6) => {
                    let reply = format!("\x1b[{};{}R", self.screen.cursor_y + 1, self.screen.cursor_x + 1);
                    self.send(reply.into_bytes());
                }
                other => log::trace!("unrecognized DSR request {:?}", other),
            },
            b'p' if prefix == Some(b'!') => {
                self.screen.pen = crate::Style::default();
                self.screen.modes = Modes::default();
                self.screen.scroll_top = 0;
                self.screen.scroll_bottom = self.screen.rows.saturating_sub(1);
            }
            b'r' => {
                let top = count_param(&ints, 0) - 1;
                let bottom = if ints.len() > 1 {
                    count_param(&ints, 1) - 1
                } else {
                    self.screen.rows.saturating_sub(1)
                };
                if top < bottom && bottom < self.screen.rows {
                    self.screen.scroll_top = top;
                    self.screen.scroll_bottom = bottom;
                }
                self.screen.cursor_x = 0;
                self.screen.cursor_y = if self.screen.modes.contains(Modes::ORIGIN) {
                    self.screen.scroll_top
                } else {
                    0
                };
            }
            b's' => self.screen.save_cursor(),
            b'u' => self.screen.restore_cursor(),
            other => log::trace!("unrecognized CSI final 0x{:02x}", other),
        }
        self.screen.clamp_cursor();
    }

    fn osc_dispatch(&mut self, params: &[&[u8]]) {
        let ps = params.first().and_then(|p| std::str::from_utf8(p).ok()).and_then(|s| s.parse::<i64>().ok());
        match ps {
            Some(0) | Some(1) | Some(2) => {
                if let Some(title) = params.get(1) {
                    self.events.emit(Event::Title(String::from_utf8_lossy(title).to_string()));
                }
            }
            other => log::trace!("unrecognized OSC Ps {:?}", other),
        }
    }

    fn apc_dispatch(&mut self, data: Vec<u8>) {
        log::trace!("ignoring APC data ({} bytes): out of scope", data.len());
    }
}
