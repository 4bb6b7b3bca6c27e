//! Discrete color classification of dispersion values.
//!
//! A [`ColorScheme`] pairs N colors with N+1 ascending breakpoints. Bin `i`
//! covers `[levels[i], levels[i+1])`; values below the first breakpoint take
//! bin 0 and values at or above the last take the top bin.

use dispersion_common::{DispersionError, DispersionResult, Rgb};

/// Ordered colors, before breakpoints are attached.
#[derive(Debug, Clone, PartialEq)]
pub struct ColorMap {
    colors: Vec<Rgb>,
}

impl ColorMap {
    /// Build from parallel channel sequences of 0-255 integers.
    pub fn from_rgb(red: &[i64], green: &[i64], blue: &[i64]) -> DispersionResult<Self> {
        if red.len() != green.len() || green.len() != blue.len() {
            return Err(DispersionError::config(format!(
                "RGB channel lengths differ (red {}, green {}, blue {})",
                red.len(),
                green.len(),
                blue.len()
            )));
        }

        let colors = red
            .iter()
            .zip(green)
            .zip(blue)
            .map(|((&r, &g), &b)| Rgb::from_channels(r, g, b))
            .collect::<DispersionResult<Vec<_>>>()?;

        Self::from_colors(colors)
    }

    /// Build from `#RRGGBB` strings.
    pub fn from_hex<S: AsRef<str>>(hex_colors: &[S]) -> DispersionResult<Self> {
        let colors = hex_colors
            .iter()
            .map(|h| Rgb::from_hex(h.as_ref()))
            .collect::<DispersionResult<Vec<_>>>()?;

        Self::from_colors(colors)
    }

    pub fn from_colors(colors: Vec<Rgb>) -> DispersionResult<Self> {
        if colors.is_empty() {
            return Err(DispersionError::config("Color map has no colors"));
        }
        Ok(Self { colors })
    }

    pub fn colors(&self) -> &[Rgb] {
        &self.colors
    }

    /// Attach breakpoints; there must be exactly one more level than colors.
    pub fn with_levels(self, levels: &[f64]) -> DispersionResult<ColorScheme> {
        if levels.len() != self.colors.len() + 1 {
            return Err(DispersionError::config(format!(
                "{} levels given for {} colors; need exactly {}",
                levels.len(),
                self.colors.len(),
                self.colors.len() + 1
            )));
        }
        if levels.iter().any(|l| !l.is_finite()) {
            return Err(DispersionError::config("Levels must be finite numbers"));
        }
        if !levels.windows(2).all(|w| w[0] < w[1]) {
            return Err(DispersionError::config(format!(
                "Levels must be strictly increasing: {:?}",
                levels
            )));
        }

        Ok(ColorScheme {
            levels: levels.to_vec(),
            colors: self.colors,
            background: None,
            opacity: 1.0,
        })
    }
}

/// Breakpoints, colors and the presentation settings that go with them.
#[derive(Debug, Clone, PartialEq)]
pub struct ColorScheme {
    levels: Vec<f64>,
    colors: Vec<Rgb>,
    background: Option<Rgb>,
    opacity: f64,
}

/// The part of a scheme shown on a colorbar: bin 0 (the background bucket)
/// is left out.
#[derive(Debug, Clone, PartialEq)]
pub struct Legend {
    pub levels: Vec<f64>,
    pub colors: Vec<Rgb>,
}

impl Legend {
    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }
}

impl ColorScheme {
    pub fn with_background(mut self, background: Rgb) -> Self {
        self.background = Some(background);
        self
    }

    pub fn with_opacity(mut self, opacity: f64) -> DispersionResult<Self> {
        if !(0.0..=1.0).contains(&opacity) {
            return Err(DispersionError::config(format!(
                "Opacity {} outside [0, 1]",
                opacity
            )));
        }
        self.opacity = opacity;
        Ok(self)
    }

    pub fn levels(&self) -> &[f64] {
        &self.levels
    }

    /// Display colors, background included.
    pub fn colors(&self) -> &[Rgb] {
        &self.colors
    }

    pub fn background(&self) -> Option<Rgb> {
        self.background
    }

    pub fn opacity(&self) -> f64 {
        self.opacity
    }

    pub fn num_bins(&self) -> usize {
        self.colors.len()
    }

    /// Alpha byte for visible pixels in exported rasters.
    pub fn alpha(&self) -> u8 {
        (self.opacity * 255.0).round() as u8
    }

    /// Bin for a value, `None` for NaN.
    pub fn bin_index(&self, value: f32) -> Option<usize> {
        if value.is_nan() {
            return None;
        }
        let v = value as f64;
        // Number of breakpoints at or below v
        let at_or_below = self.levels.partition_point(|&level| level <= v);
        Some(at_or_below.saturating_sub(1).min(self.colors.len() - 1))
    }

    pub fn display_color(&self, value: f32) -> Option<Rgb> {
        self.bin_index(value).map(|bin| self.colors[bin])
    }

    /// Colors for legends and exported rasters: any color equal to the
    /// background is shown as white.
    pub fn export_colors(&self) -> Vec<Rgb> {
        self.colors
            .iter()
            .map(|&c| match self.background {
                Some(bg) if c == bg => Rgb::WHITE,
                _ => c,
            })
            .collect()
    }

    /// Bin 0 and any bin whose original color is the background.
    pub fn is_transparent_bin(&self, bin: usize) -> bool {
        bin == 0 || self.background == Some(self.colors[bin])
    }

    pub fn legend(&self) -> Legend {
        Legend {
            levels: self.levels[1..].to_vec(),
            colors: self.export_colors()[1..].to_vec(),
        }
    }
}
