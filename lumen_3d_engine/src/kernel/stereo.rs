/// Stereo modes and the color channel split of anaglyph passes

use std::fmt;
use std::str::FromStr;
use crate::error::Error;
use crate::graphics_device::ColorMask;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StereoMode {
    /// Single centered pass
    #[default]
    NoStereo,
    /// Left and right hardware back buffers
    Active,
    /// Side-by-side half-width viewports
    Passive,
    RedBlue,
    RedCyan,
    YellowBlue,
    GreenMagenta,
}

impl StereoMode {
    pub const ALL: [StereoMode; 7] = [
        StereoMode::NoStereo,
        StereoMode::Active,
        StereoMode::Passive,
        StereoMode::RedBlue,
        StereoMode::RedCyan,
        StereoMode::YellowBlue,
        StereoMode::GreenMagenta,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StereoMode::NoStereo => "nostereo",
            StereoMode::Active => "active",
            StereoMode::Passive => "passive",
            StereoMode::RedBlue => "redblue",
            StereoMode::RedCyan => "redcyan",
            StereoMode::YellowBlue => "yellowblue",
            StereoMode::GreenMagenta => "greenmagenta",
        }
    }

    pub fn is_anaglyph(&self) -> bool {
        self.anaglyph_masks().is_some()
    }

    /// Anaglyph modes other than red/blue keep some hue and desaturate
    /// instead of going to grayscale
    pub fn is_color_anaglyph(&self) -> bool {
        matches!(self, StereoMode::RedCyan | StereoMode::YellowBlue | StereoMode::GreenMagenta)
    }

    /// Left and right eye write masks of an anaglyph mode
    pub fn anaglyph_masks(&self) -> Option<(ColorMask, ColorMask)> {
        let (left, right) = match self {
            StereoMode::RedBlue => (ColorMask::RED, ColorMask::BLUE),
            StereoMode::RedCyan => (ColorMask::RED, ColorMask::GREEN | ColorMask::BLUE),
            StereoMode::YellowBlue => (ColorMask::RED | ColorMask::GREEN, ColorMask::BLUE),
            StereoMode::GreenMagenta => (ColorMask::GREEN, ColorMask::RED | ColorMask::BLUE),
            _ => return None,
        };
        Some((left | ColorMask::ALPHA, right | ColorMask::ALPHA))
    }
}

impl fmt::Display for StereoMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StereoMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        StereoMode::ALL
            .iter()
            .copied()
            .find(|mode| mode.as_str() == s)
            .ok_or_else(|| Error::InvalidConfiguration(format!("Unknown stereo mode '{}'", s)))
    }
}

/// Which eye a pass renders; the value is the sign of the camera offset
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Eye {
    Left,
    Center,
    Right,
}

impl Eye {
    pub fn sign(&self) -> f64 {
        match self {
            Eye::Left => -1.0,
            Eye::Center => 0.0,
            Eye::Right => 1.0,
        }
    }
}

#[cfg(test)]
#[path = "stereo_tests.rs"]
mod tests;
