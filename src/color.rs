//! `#RRGGBB` color strings used in the layout configuration

use std::fmt;

/// Opaque RGB color parsed from a hex string
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HexColor {
    rgb: [u8; 3],
}

impl HexColor {
    pub const fn from_rgb(r: u8, g: u8, b: u8) -> Self {
        Self { rgb: [r, g, b] }
    }

    /// Parse `#RRGGBB` or `RRGGBB` (case-insensitive)
    pub fn parse(input: &str) -> Option<Self> {
        let hex = input.trim();
        let hex = hex.strip_prefix('#').unwrap_or(hex);
        if hex.len() != 6 || !hex.is_ascii() {
            return None;
        }

        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
        Some(Self::from_rgb(channel(0)?, channel(2)?, channel(4)?))
    }

    pub fn rgb(&self) -> [u8; 3] {
        self.rgb
    }

    /// Lowercase hex digits without the leading `#` (cache file names)
    pub fn digits(&self) -> String {
        let [r, g, b] = self.rgb;
        format!("{r:02x}{g:02x}{b:02x}")
    }

    pub fn to_hex_string(&self) -> String {
        format!("#{}", self.digits())
    }
}

impl fmt::Display for HexColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex_string())
    }
}
