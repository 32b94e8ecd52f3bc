/// RGBA colors and the anaglyph color filters

use bytemuck::{Pod, Zeroable};

/// Linear RGBA color, components in `[0, 1]`
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct Rgba {
    pub red: f32,
    pub green: f32,
    pub blue: f32,
    pub alpha: f32,
}

/// Saturation is multiplied by this before a color anaglyph pass
const ANAGLYPH_SATURATION: f32 = 0.5;

/// Display gamma used for the grayscale luminance estimate
const GAMMA: f32 = 2.5;

impl Rgba {
    pub const WHITE: Rgba = Rgba::rgb(1.0, 1.0, 1.0);
    pub const BLACK: Rgba = Rgba::rgb(0.0, 0.0, 0.0);

    pub const fn new(red: f32, green: f32, blue: f32, alpha: f32) -> Self {
        Self { red, green, blue, alpha }
    }

    /// Opaque color
    pub const fn rgb(red: f32, green: f32, blue: f32) -> Self {
        Self::new(red, green, blue, 1.0)
    }

    /// Opaque gray of the given intensity
    pub const fn gray(intensity: f32) -> Self {
        Self::rgb(intensity, intensity, intensity)
    }

    pub fn is_opaque(&self) -> bool {
        self.alpha == 1.0
    }

    pub fn with_alpha(self, alpha: f32) -> Self {
        Self { alpha, ..self }
    }

    /// Complementary color, alpha kept (used for text drawn over the background)
    pub fn inverse(&self) -> Self {
        Self::new(1.0 - self.red, 1.0 - self.green, 1.0 - self.blue, self.alpha)
    }

    pub fn to_array(&self) -> [f32; 4] {
        [self.red, self.green, self.blue, self.alpha]
    }

    /// Halve the saturation so both eyes of a color anaglyph see the object
    pub fn desaturate(&self) -> Self {
        let cmin = self.red.min(self.green).min(self.blue);
        let cmax = self.red.max(self.green).max(self.blue);
        let value = cmax;
        let delta = cmax - cmin;

        // Hue in sextants, [0, 6)
        let (mut hue, saturation) = if delta == 0.0 {
            (0.0, 0.0)
        } else if self.red == cmax {
            ((self.green - self.blue) / delta, delta / cmax)
        } else if self.green == cmax {
            (2.0 + (self.blue - self.red) / delta, delta / cmax)
        } else {
            (4.0 + (self.red - self.green) / delta, delta / cmax)
        };
        if hue < 0.0 {
            hue += 6.0;
        }

        let s = saturation * ANAGLYPH_SATURATION;
        if s == 0.0 {
            return Self::new(value, value, value, self.alpha);
        }

        let sector = hue.floor();
        let f = hue - sector;
        let p = value * (1.0 - s);
        let q = value * (1.0 - s * f);
        let t = value * (1.0 - s * (1.0 - f));
        let (r, g, b) = match sector as u32 {
            0 => (value, t, p),
            1 => (q, value, p),
            2 => (p, value, t),
            3 => (p, q, value),
            4 => (t, p, value),
            _ => (value, p, q),
        };
        Self::new(r, g, b, self.alpha)
    }

    /// Perceived brightness as a gray, for red/blue anaglyphs
    pub fn grayscale(&self) -> Self {
        let luminance = (0.299 * self.red.powf(GAMMA)
            + 0.587 * self.green.powf(GAMMA)
            + 0.114 * self.blue.powf(GAMMA))
        .powf(1.0 / GAMMA);
        Self::new(luminance, luminance, luminance, self.alpha)
    }
}

impl Default for Rgba {
    fn default() -> Self {
        Self::WHITE
    }
}

impl From<[f32; 4]> for Rgba {
    fn from(c: [f32; 4]) -> Self {
        Self::new(c[0], c[1], c[2], c[3])
    }
}

impl From<[f32; 3]> for Rgba {
    fn from(c: [f32; 3]) -> Self {
        Self::rgb(c[0], c[1], c[2])
    }
}

#[cfg(test)]
#[path = "rgba_tests.rs"]
mod tests;
