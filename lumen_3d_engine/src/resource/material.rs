/// Surface description shared by renderables.
///
/// A Material is plain data: the textures to bind, an optional shader source
/// and a shininess. Texture decoding and shader compilation belong to the
/// graphics device; this layer only carries handles.

use std::sync::Arc;

/// Device-side texture handle
pub trait Texture: Send + Sync {
    /// Identifier the graphics device binds
    fn id(&self) -> u64;

    /// Whether any texel is partly transparent
    fn has_opacity(&self) -> bool {
        false
    }
}

pub struct Material {
    name: String,
    textures: Vec<Arc<dyn Texture>>,
    shader: Option<String>,
    shininess: f64,
}

impl Material {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            textures: Vec::new(),
            shader: None,
            shininess: 0.5,
        }
    }

    pub fn with_textures(mut self, textures: Vec<Arc<dyn Texture>>) -> Self {
        self.textures = textures;
        self
    }

    pub fn with_shader(mut self, source: impl Into<String>) -> Self {
        self.set_shader(source);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn textures(&self) -> &[Arc<dyn Texture>] {
        &self.textures
    }

    pub fn set_textures(&mut self, textures: Vec<Arc<dyn Texture>>) {
        self.textures = textures;
    }

    /// Replace the shader source; an empty string removes it
    pub fn set_shader(&mut self, source: impl Into<String>) {
        let source = source.into();
        self.shader = if source.is_empty() { None } else { Some(source) };
    }

    pub fn shader(&self) -> Option<&str> {
        self.shader.as_deref()
    }

    /// Clamped to `[0, 1]`
    pub fn set_shininess(&mut self, shininess: f64) {
        self.shininess = shininess.clamp(0.0, 1.0);
    }

    pub fn shininess(&self) -> f64 {
        self.shininess
    }

    /// True when one of the textures is partly transparent
    pub fn has_opacity(&self) -> bool {
        self.textures.iter().any(|t| t.has_opacity())
    }
}

impl std::fmt::Debug for Material {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Material")
            .field("name", &self.name)
            .field("textures", &self.textures.iter().map(|t| t.id()).collect::<Vec<_>>())
            .field("shader", &self.shader.is_some())
            .field("shininess", &self.shininess)
            .finish()
    }
}

#[cfg(test)]
#[path = "material_tests.rs"]
mod tests;
