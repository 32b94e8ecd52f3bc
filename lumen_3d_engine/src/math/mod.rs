//! Math utilities: double-precision transforms and colors

mod transform;
mod rgba;

pub use transform::{Transform, GpuMatrix, Basis, orthonormal_basis, stable_length, PARALLEL_COSINE};
pub use rgba::Rgba;
