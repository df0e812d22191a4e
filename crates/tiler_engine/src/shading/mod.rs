//! Shading engine

pub mod flat;
pub mod smooth;

pub use flat::{flat_shade, ShadeInput, ShadeResult};
pub use smooth::SmoothShading;
