//! Math utilities and types
//!
//! Provides the fundamental vector and matrix aliases used by the display list,
//! the convex processor and the shading engine.

pub use nalgebra::{Matrix3, Matrix3x4, Vector3};

/// 3D vector type
pub type Vec3 = Vector3<f32>;

/// 3x3 matrix type (linear part of an affine transform)
pub type Mat3 = Matrix3<f32>;

/// 3x4 matrix type (row-major affine transform, translation in the last column)
pub type Mat3x4 = Matrix3x4<f32>;

/// 3D point type
pub type Point3 = nalgebra::Point3<f32>;

/// Linear RGB color. Channels are nominally in `[0, 1]`.
pub type Color = Vector3<f32>;

/// Math constants
pub mod constants {
    /// Pi constant
    pub const PI: f32 = std::f32::consts::PI;

    /// Pi / 2
    pub const HALF_PI: f32 = PI * 0.5;

    /// Degrees to radians conversion factor
    pub const DEG_TO_RAD: f32 = PI / 180.0;

    /// Square root of three, the length of a unit grey color vector
    pub const SQRT_3: f32 = 1.732_050_8;
}

/// Math utility functions
pub mod utils {
    use super::{constants, Color, Vec3};

    /// Convert degrees to radians
    pub fn deg_to_rad(degrees: f32) -> f32 {
        degrees * constants::DEG_TO_RAD
    }

    /// Clamp every channel of a color into `[0, 1]`
    pub fn saturate(color: Color) -> Color {
        color.map(|c| c.clamp(0.0, 1.0))
    }

    /// Component-wise absolute value
    pub fn abs(v: Vec3) -> Vec3 {
        v.map(f32::abs)
    }

    /// True when every component is finite
    pub fn is_finite(v: &Vec3) -> bool {
        v.iter().all(|c| c.is_finite())
    }

    /// Grey color of the given intensity
    pub fn grey(intensity: f32) -> Color {
        Color::new(intensity, intensity, intensity)
    }

    /// Schlick's approximation of `x^n` for `x` in `[0, 1]`.
    ///
    /// Matches the true power at both ends of the range and is monotonic in
    /// between, which is all a specular falloff needs.
    pub fn approx_pow(x: f32, n: f32) -> f32 {
        if x <= 0.0 {
            return 0.0;
        }
        if n <= 0.0 {
            return 1.0;
        }
        x / (n - n * x + x)
    }
}
