//! Resource module
//!
//! Shared model tables and surface descriptions used by renderables.

mod model_cache;
mod material;

pub use model_cache::{ModelCache, ModelKey, Model};
pub use material::{Material, Texture};
