/// Light sources consumed by the lighting stage.
///
/// A light is either directional (at infinity, `position` is a unit
/// direction) or positional. Positional lights may be attenuated and turned
/// into spotlights. The display kernel uploads at most
/// [`MAX_LIGHTS`](crate::graphics_device::MAX_LIGHTS) of them per pass.

use bytemuck::{Pod, Zeroable};
use glam::DVec3;
use slotmap::new_key_type;
use crate::error::Result;
use crate::math::Rgba;

new_key_type! {
    /// Stable handle to a light owned by a display kernel
    pub struct LightKey;
}

/// Cutoff angle (degrees) that disables the spotlight cone
pub const NO_SPOT_CUTOFF: f64 = 180.0;

#[derive(Debug, Clone, PartialEq)]
pub struct Light {
    position: DVec3,
    local: bool,
    diffuse: Rgba,
    specular: Rgba,
    spot_direction: DVec3,
    spot_exponent: f64,
    spot_cutoff: f64,
    /// Constant, linear and quadratic attenuation
    attenuation: DVec3,
}

/// Light state laid out for upload to a light unit
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct LightParams {
    /// `w = 0` for directional lights
    pub position: [f32; 4],
    pub diffuse: [f32; 4],
    pub specular: [f32; 4],
    pub spot_direction: [f32; 3],
    /// Degrees; 180 disables the cone
    pub spot_cutoff: f32,
    pub attenuation: [f32; 3],
    pub spot_exponent: f32,
}

impl Light {
    /// Light at infinity shining along `-direction`
    ///
    /// # Errors
    ///
    /// `InvalidConfiguration` when `direction` has zero length.
    pub fn directional(direction: DVec3, color: Rgba) -> Result<Self> {
        let direction = direction
            .try_normalize()
            .ok_or_else(|| crate::engine_config_err!("lumen3d::Light", "A light direction cannot be zero."))?;
        Ok(Self::build(direction, false, color))
    }

    /// Light at a point in world coordinates
    pub fn positional(position: DVec3, color: Rgba) -> Self {
        Self::build(position, true, color)
    }

    fn build(position: DVec3, local: bool, color: Rgba) -> Self {
        Self {
            position,
            local,
            diffuse: color,
            specular: color,
            spot_direction: DVec3::NEG_Z,
            spot_exponent: 0.0,
            spot_cutoff: NO_SPOT_CUTOFF,
            attenuation: DVec3::new(1.0, 0.0, 0.0),
        }
    }

    pub fn position(&self) -> DVec3 {
        self.position
    }

    pub fn is_local(&self) -> bool {
        self.local
    }

    pub fn diffuse(&self) -> Rgba {
        self.diffuse
    }

    pub fn specular(&self) -> Rgba {
        self.specular
    }

    pub fn set_specular(&mut self, color: Rgba) {
        self.specular = color;
    }

    pub fn attenuation(&self) -> DVec3 {
        self.attenuation
    }

    pub fn spot_cutoff(&self) -> f64 {
        self.spot_cutoff
    }

    pub fn is_spot(&self) -> bool {
        self.spot_cutoff != NO_SPOT_CUTOFF
    }

    /// Set distance attenuation coefficients
    ///
    /// # Errors
    ///
    /// `InvalidConfiguration` for directional lights, or for negative coefficients.
    pub fn set_attenuation(&mut self, constant: f64, linear: f64, quadratic: f64) -> Result<()> {
        if !self.local {
            return Err(crate::engine_config_err!("lumen3d::Light", "Only local lights may be attenuated."));
        }
        if constant < 0.0 || linear < 0.0 || quadratic < 0.0 {
            return Err(crate::engine_config_err!(
                "lumen3d::Light",
                "Attenuation coefficients must not be negative ({}, {}, {}).",
                constant, linear, quadratic
            ));
        }
        self.attenuation = DVec3::new(constant, linear, quadratic);
        Ok(())
    }

    pub fn disable_attenuation(&mut self) {
        self.attenuation = DVec3::new(1.0, 0.0, 0.0);
    }

    /// Restrict a positional light to a cone around `direction`
    ///
    /// # Errors
    ///
    /// `InvalidConfiguration` for directional lights, a zero direction, or a
    /// cutoff outside `[0, 90]` degrees.
    pub fn set_spot(&mut self, direction: DVec3, exponent: f64, cutoff: f64) -> Result<()> {
        if !self.local {
            return Err(crate::engine_config_err!("lumen3d::Light", "Only local lights may be spotlights."));
        }
        let direction = direction
            .try_normalize()
            .ok_or_else(|| crate::engine_config_err!("lumen3d::Light", "A spot direction cannot be zero."))?;
        if !(0.0..=90.0).contains(&cutoff) {
            return Err(crate::engine_config_err!(
                "lumen3d::Light",
                "Spot cutoff must lie in [0, 90] degrees, got {}.",
                cutoff
            ));
        }
        self.spot_direction = direction;
        self.spot_exponent = exponent.clamp(0.0, 128.0);
        self.spot_cutoff = cutoff;
        Ok(())
    }

    pub fn disable_spot(&mut self) {
        self.spot_exponent = 0.0;
        self.spot_cutoff = NO_SPOT_CUTOFF;
    }

    /// Upload form, with positions scaled by `gcf`.
    ///
    /// Distance terms are rescaled so that the falloff measured in world
    /// units is unchanged by the correction factor.
    pub fn params(&self, gcf: f64) -> LightParams {
        let (position, w) = if self.local {
            (self.position * gcf, 1.0)
        } else {
            (self.position, 0.0)
        };
        let attenuation = DVec3::new(
            self.attenuation.x,
            self.attenuation.y / gcf,
            self.attenuation.z / (gcf * gcf),
        );
        LightParams {
            position: [position.x as f32, position.y as f32, position.z as f32, w],
            diffuse: self.diffuse.to_array(),
            specular: self.specular.to_array(),
            spot_direction: self.spot_direction.as_vec3().to_array(),
            spot_cutoff: self.spot_cutoff as f32,
            attenuation: attenuation.as_vec3().to_array(),
            spot_exponent: self.spot_exponent as f32,
        }
    }
}

#[cfg(test)]
#[path = "light_tests.rs"]
mod tests;
