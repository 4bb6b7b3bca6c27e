//! RGB color values used by classification schemes.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{DispersionError, DispersionResult};

/// An opaque 8-bit RGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const WHITE: Rgb = Rgb::new(255, 255, 255);
    pub const BLACK: Rgb = Rgb::new(0, 0, 0);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Build a color from unchecked integer channels, rejecting values outside 0-255.
    pub fn from_channels(r: i64, g: i64, b: i64) -> DispersionResult<Self> {
        Ok(Self::new(channel(r, "red")?, channel(g, "green")?, channel(b, "blue")?))
    }

    /// Parse a `#RRGGBB` (or `RRGGBB`) hex string.
    pub fn from_hex(hex: &str) -> DispersionResult<Self> {
        let digits = hex.trim().trim_start_matches('#');
        if digits.len() != 6 || !digits.is_ascii() {
            return Err(DispersionError::config(format!(
                "invalid hex color '{}': expected #RRGGBB",
                hex
            )));
        }

        let parse = |range: std::ops::Range<usize>| {
            u8::from_str_radix(&digits[range], 16).map_err(|_| {
                DispersionError::config(format!("invalid hex color '{}'", hex))
            })
        };

        Ok(Self::new(parse(0..2)?, parse(2..4)?, parse(4..6)?))
    }

    /// RGBA tuple with the given alpha.
    pub fn with_alpha(self, a: u8) -> (u8, u8, u8, u8) {
        (self.r, self.g, self.b, a)
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

fn channel(value: i64, name: &str) -> DispersionResult<u8> {
    u8::try_from(value).map_err(|_| {
        DispersionError::config(format!(
            "{} channel value {} outside the range [0,255]",
            name, value
        ))
    })
}
