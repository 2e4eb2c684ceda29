//! The 256-entry color palette and nearest-color matching used by SGR.
//!
//! Style only ever stores a 9-bit palette index per spec; there is no
//! truecolor cell representation. `CSI 38;2;r;g;bm` and `CSI 48;2;r;g;bm`
//! therefore resolve their RGB triple to the nearest palette entry at parse
//! time (see [`ColorPalette::nearest_index`]).

/// These correspond to the classic ANSI color indices and are used for
/// convenience/readability in code that seeds a palette.
#[allow(dead_code)]
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
#[repr(u8)]
pub enum AnsiColor {
    Black = 0,
    Maroon,
    Green,
    Olive,
    Navy,
    Purple,
    Teal,
    Silver,
    Grey,
    Red,
    Lime,
    Yellow,
    Blue,
    Fuschia,
    Aqua,
    White,
}

#[cfg_attr(feature = "use_serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq, Hash)]
pub struct RgbColor {
    pub red: u8,
    pub green: u8,
    pub blue: u8,
}

impl RgbColor {
    pub const fn new(red: u8, green: u8, blue: u8) -> Self {
        Self { red, green, blue }
    }

    /// Weighted distance used by xterm-style nearest-color matching:
    /// `30²·Δr² + 59²·Δg² + 11²·Δb²`.
    fn weighted_distance(&self, other: &RgbColor) -> i64 {
        let dr = i64::from(self.red) - i64::from(other.red);
        let dg = i64::from(self.green) - i64::from(other.green);
        let db = i64::from(self.blue) - i64::from(other.blue);
        (30 * dr).pow(2) + (59 * dg).pow(2) + (11 * db).pow(2)
    }
}

pub const ANSI_COUNT: usize = 16;
pub const PALETTE_SIZE: usize = 256;

const RAMP6: [u8; 6] = [0x00, 0x5f, 0x87, 0xaf, 0xd7, 0xff];

/// The 256-color palette: 16 configurable "named" colors, a 6×6×6 color
/// cube, and a 24-step greyscale ramp.
#[derive(Debug, Clone)]
pub struct ColorPalette {
    colors: [RgbColor; PALETTE_SIZE],
    pub default_foreground: RgbColor,
    pub default_background: RgbColor,
    pub cursor: RgbColor,
}

/// The default 16-color xterm-ish seed; callers may override some or all
/// of these via [`EngineOptions::palette`](crate::config::EngineOptions::palette).
pub const DEFAULT_ANSI: [RgbColor; ANSI_COUNT] = [
    RgbColor::new(0x00, 0x00, 0x00), // Black
    RgbColor::new(0xcc, 0x55, 0x55), // Maroon
    RgbColor::new(0x55, 0xcc, 0x55), // Green
    RgbColor::new(0xcd, 0xcd, 0x55), // Olive
    RgbColor::new(0x54, 0x55, 0xcb), // Navy
    RgbColor::new(0xcc, 0x55, 0xcc), // Purple
    RgbColor::new(0x7a, 0xca, 0xca), // Teal
    RgbColor::new(0xcc, 0xcc, 0xcc), // Silver
    RgbColor::new(0x55, 0x55, 0x55), // Grey
    RgbColor::new(0xff, 0x55, 0x55), // Red
    RgbColor::new(0x55, 0xff, 0x55), // Lime
    RgbColor::new(0xff, 0xff, 0x55), // Yellow
    RgbColor::new(0x55, 0x55, 0xff), // Blue
    RgbColor::new(0xff, 0x55, 0xff), // Fuschia
    RgbColor::new(0x55, 0xff, 0xff), // Aqua
    RgbColor::new(0xff, 0xff, 0xff), // White
];

impl ColorPalette {
    /// Build a palette from a 16-color seed, filling in the 6×6×6 cube and
    /// the greyscale ramp the way xterm does.
    pub fn from_seed(seed: [RgbColor; ANSI_COUNT]) -> Self {
        let mut colors = [RgbColor::default(); PALETTE_SIZE];
        colors[0..ANSI_COUNT].copy_from_slice(&seed);

        for idx in 0..216 {
            let red = RAMP6[idx / 36 % 6];
            let green = RAMP6[idx / 6 % 6];
            let blue = RAMP6[idx % 6];
            colors[16 + idx] = RgbColor::new(red, green, blue);
        }

        for idx in 0..24 {
            let grey = 8 + (idx as u16 * 10) as u8;
            colors[232 + idx] = RgbColor::new(grey, grey, grey);
        }

        let default_foreground = colors[AnsiColor::Silver as usize];
        let default_background = colors[AnsiColor::Black as usize];
        let cursor = RgbColor::new(0x52, 0xad, 0x70);

        ColorPalette {
            colors,
            default_foreground,
            default_background,
            cursor,
        }
    }

    pub fn get(&self, index: u8) -> RgbColor {
        self.colors[index as usize]
    }

    pub fn set(&mut self, index: u8, color: RgbColor) {
        self.colors[index as usize] = color;
    }

    /// Find the palette index whose RGB value is closest to `target`,
    /// per the weighted distance in spec.md §4.1.
    pub fn nearest_index(&self, target: RgbColor) -> u8 {
        let mut best_idx = 0u8;
        let mut best_dist = i64::MAX;
        for (idx, candidate) in self.colors.iter().enumerate() {
            let dist = candidate.weighted_distance(&target);
            if dist < best_dist {
                best_dist = dist;
                best_idx = idx as u8;
            }
        }
        best_idx
    }
}

impl Default for ColorPalette {
    fn default() -> ColorPalette {
        ColorPalette::from_seed(DEFAULT_ANSI)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn nearest_index_exact_match() {
        let pal = ColorPalette::default();
        assert_eq!(pal.nearest_index(RgbColor::new(0xff, 0x55, 0x55)), 9);
    }

    #[test]
    fn nearest_index_closest_not_exact() {
        let pal = ColorPalette::default();
        // Pure red should land very close to index 9 (bright red) rather
        // than black or white.
        let idx = pal.nearest_index(RgbColor::new(0xfe, 0x50, 0x50));
        assert_eq!(idx, 9);
    }

    #[test]
    fn seed_overrides_first_sixteen_only() {
        let mut seed = DEFAULT_ANSI;
        seed[1] = RgbColor::new(1, 2, 3);
        let pal = ColorPalette::from_seed(seed);
        assert_eq!(pal.get(1), RgbColor::new(1, 2, 3));
        // cube/greyscale unaffected
        assert_eq!(pal.get(16), RgbColor::new(0, 0, 0));
    }
}
