//! Engine configuration (spec.md §6 "Configuration options").

use crate::color::{RgbColor, DEFAULT_ANSI};

#[cfg_attr(feature = "use_serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone)]
pub struct EngineOptions {
    pub cols: usize,
    pub rows: usize,
    /// Maximum scrollback rows retained. Default 1000.
    pub scrollback: usize,
    /// 16-color seed for the palette; indices 16..256 (cube + greyscale)
    /// are always derived, not user-seedable.
    pub palette: [RgbColor; 16],
    pub term_name: String,
    pub cursor_blink: bool,
    pub visual_bell: bool,
    pub pop_on_bell: bool,
    /// Rewrite a lone `\n` as `\r\n` on the way in, for hosts that don't
    /// emit CR themselves.
    pub convert_eol: bool,
    /// See spec.md §4.2: when true, a natural scroll evicts the oldest
    /// row to a bounded side queue instead of growing the addressable
    /// scrollback via `ybase`.
    pub physical_scroll: bool,
    /// Shared secret gating the application-mode (`ESC & …`) pass-through
    /// channel; `None` disables it entirely.
    pub application_mode_cookie: Option<String>,
    pub debug: bool,
}

impl Default for EngineOptions {
    fn default() -> Self {
        EngineOptions {
            cols: 80,
            rows: 24,
            scrollback: 1000,
            palette: DEFAULT_ANSI,
            term_name: "xterm".to_string(),
            cursor_blink: false,
            visual_bell: false,
            pop_on_bell: false,
            convert_eol: false,
            physical_scroll: false,
            application_mode_cookie: None,
            debug: false,
        }
    }
}

/// Which DA1/DA2 reply family `term_name` selects (spec.md §6 "Response
/// sequences emitted back").
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum TermFamily {
    Xterm,
    Rxvt,
    Screen,
    Linux,
}

impl EngineOptions {
    pub fn term_family(&self) -> TermFamily {
        match self.term_name.as_str() {
            "rxvt" => TermFamily::Rxvt,
            "screen" => TermFamily::Screen,
            "linux" => TermFamily::Linux,
            _ => TermFamily::Xterm,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn defaults_match_spec() {
        let opts = EngineOptions::default();
        assert_eq!(opts.scrollback, 1000);
        assert_eq!(opts.term_name, "xterm");
        assert_eq!(opts.term_family(), TermFamily::Xterm);
    }

    #[test]
    fn term_family_dispatch() {
        let mut opts = EngineOptions::default();
        opts.term_name = "linux".to_string();
        assert_eq!(opts.term_family(), TermFamily::Linux);
    }
}
