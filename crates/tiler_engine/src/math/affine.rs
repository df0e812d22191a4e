//! Affine transforms carried by transform nodes and the transform stack
//!
//! A [`Transform`] keeps its forward 3×4 matrix and the inverse side by side,
//! together with a classification of how the matrix scales. The convex
//! processor and the shading engine pick their normal-transform path from that
//! classification.

use approx::relative_eq;
use nalgebra::{Matrix4, Unit};

use crate::error::{Result, SceneError};
use crate::foundation::math::{Mat3, Mat3x4, Point3, Vec3};

const SCALE_TOLERANCE: f32 = 1e-5;

/// Linear map plus translation: `p' = linear * p + translation`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Affine {
    /// Rotation/scale/shear part
    pub linear: Mat3,
    /// Translation part
    pub translation: Vec3,
}

impl Affine {
    /// Identity map
    pub fn identity() -> Self {
        Self {
            linear: Mat3::identity(),
            translation: Vec3::zeros(),
        }
    }

    /// Build from a row-major 3×4 matrix
    pub fn from_matrix(matrix: &Mat3x4) -> Self {
        Self {
            linear: matrix.fixed_view::<3, 3>(0, 0).into_owned(),
            translation: matrix.column(3).into_owned(),
        }
    }

    /// The 3×4 matrix form
    pub fn to_matrix(&self) -> Mat3x4 {
        let mut matrix = Mat3x4::zeros();
        matrix.fixed_view_mut::<3, 3>(0, 0).copy_from(&self.linear);
        matrix.set_column(3, &self.translation);
        matrix
    }

    /// The 4×4 homogeneous form
    pub fn to_homogeneous(&self) -> Matrix4<f32> {
        let mut matrix = Matrix4::identity();
        matrix.fixed_view_mut::<3, 4>(0, 0).copy_from(&self.to_matrix());
        matrix
    }

    /// `self ∘ other`: apply `other` first, then `self`
    pub fn then_apply(&self, other: &Self) -> Self {
        Self {
            linear: self.linear * other.linear,
            translation: self.linear * other.translation + self.translation,
        }
    }

    /// Map a point
    pub fn transform_point(&self, point: &Point3) -> Point3 {
        Point3::from(self.linear * point.coords + self.translation)
    }

    /// Map a direction (no translation)
    pub fn transform_vector(&self, vector: &Vec3) -> Vec3 {
        self.linear * vector
    }
}

/// How a transform scales lengths
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScaleKind {
    /// Rigid: rotation, reflection and translation only
    None,
    /// Same scale factor on every axis
    Uniform,
    /// Anything else (non-uniform scale or shear)
    Arbitrary,
}

impl ScaleKind {
    /// Classification of a composition of two transforms
    pub fn combine(self, other: Self) -> Self {
        match (self, other) {
            (Self::Arbitrary, _) | (_, Self::Arbitrary) => Self::Arbitrary,
            (Self::Uniform, _) | (_, Self::Uniform) => Self::Uniform,
            (Self::None, Self::None) => Self::None,
        }
    }
}

/// Affine transform with its inverse and scale classification
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    forward: Affine,
    inverse: Affine,
    scale_kind: ScaleKind,
    /// Length scale of the forward map (exact for none/uniform)
    scale: f32,
    /// `1 / scale`, the factor restoring unit normals for uniform scales
    rescale: f32,
    /// Odd number of axis reflections
    reflected: bool,
}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}

impl Transform {
    /// Identity transform
    pub fn identity() -> Self {
        Self {
            forward: Affine::identity(),
            inverse: Affine::identity(),
            scale_kind: ScaleKind::None,
            scale: 1.0,
            rescale: 1.0,
            reflected: false,
        }
    }

    /// Build from a row-major 3×4 matrix, computing the inverse and the scale class
    pub fn from_matrix(matrix: &Mat3x4) -> Result<Self> {
        let forward = Affine::from_matrix(matrix);
        if !forward.linear.iter().chain(forward.translation.iter()).all(|v| v.is_finite()) {
            return Err(SceneError::SingularTransform);
        }
        let inverse_linear = forward.linear.try_inverse().ok_or(SceneError::SingularTransform)?;
        let inverse = Affine {
            linear: inverse_linear,
            translation: -(inverse_linear * forward.translation),
        };
        let (scale_kind, scale) = classify_linear(&forward.linear);
        Ok(Self {
            forward,
            inverse,
            scale_kind,
            scale,
            rescale: 1.0 / scale,
            reflected: forward.linear.determinant() < 0.0,
        })
    }

    /// Pure translation
    pub fn translation(offset: Vec3) -> Self {
        Self {
            forward: Affine {
                linear: Mat3::identity(),
                translation: offset,
            },
            inverse: Affine {
                linear: Mat3::identity(),
                translation: -offset,
            },
            ..Self::identity()
        }
    }

    /// Scale along the axes; zero factors are rejected
    pub fn scaling(factors: Vec3) -> Result<Self> {
        if factors.iter().any(|f| *f == 0.0 || !f.is_finite()) {
            return Err(SceneError::SingularTransform);
        }
        let magnitude = factors.x.abs();
        let uniform = relative_eq!(factors.y.abs(), magnitude, max_relative = SCALE_TOLERANCE)
            && relative_eq!(factors.z.abs(), magnitude, max_relative = SCALE_TOLERANCE);
        let (scale_kind, scale) = if !uniform {
            (ScaleKind::Arbitrary, factors.iter().map(|f| f.abs()).product::<f32>().cbrt())
        } else if relative_eq!(magnitude, 1.0, max_relative = SCALE_TOLERANCE) {
            (ScaleKind::None, 1.0)
        } else {
            (ScaleKind::Uniform, magnitude)
        };
        let negatives = factors.iter().filter(|f| **f < 0.0).count();
        Ok(Self {
            forward: Affine {
                linear: Mat3::from_diagonal(&factors),
                translation: Vec3::zeros(),
            },
            inverse: Affine {
                linear: Mat3::from_diagonal(&factors.map(|f| 1.0 / f)),
                translation: Vec3::zeros(),
            },
            scale_kind,
            scale,
            rescale: 1.0 / scale,
            reflected: negatives % 2 == 1,
        })
    }

    /// Rotation by `angle` radians about `axis`
    pub fn rotation(axis: Vec3, angle: f32) -> Result<Self> {
        let axis = Unit::try_new(axis, f32::EPSILON).ok_or(SceneError::SingularTransform)?;
        let rotation = nalgebra::Rotation3::from_axis_angle(&axis, angle);
        let linear = *rotation.matrix();
        Ok(Self {
            forward: Affine {
                linear,
                translation: Vec3::zeros(),
            },
            inverse: Affine {
                linear: linear.transpose(),
                translation: Vec3::zeros(),
            },
            ..Self::identity()
        })
    }

    /// `self × other`: the transform that applies `other` first, then `self`.
    ///
    /// The inverse composes in the opposite order so no matrix is inverted.
    pub fn compose(&self, other: &Self) -> Self {
        let mut scale_kind = self.scale_kind.combine(other.scale_kind);
        let mut scale = self.scale * other.scale;
        let mut rescale = self.rescale * other.rescale;
        if scale_kind == ScaleKind::Uniform && relative_eq!(scale, 1.0, max_relative = SCALE_TOLERANCE) {
            scale_kind = ScaleKind::None;
            scale = 1.0;
            rescale = 1.0;
        }
        Self {
            forward: self.forward.then_apply(&other.forward),
            inverse: other.inverse.then_apply(&self.inverse),
            scale_kind,
            scale,
            rescale,
            reflected: self.reflected != other.reflected,
        }
    }

    /// Inverse transform. A field swap, so inverting twice gives back `self` exactly.
    pub fn inverted(&self) -> Self {
        Self {
            forward: self.inverse,
            inverse: self.forward,
            scale_kind: self.scale_kind,
            scale: self.rescale,
            rescale: self.scale,
            reflected: self.reflected,
        }
    }

    /// Rigid part of the transform: axes re-orthonormalised, scale removed
    pub fn descaled(&self) -> Self {
        let linear = &self.forward.linear;
        let x = linear.column(0).normalize();
        let y = (linear.column(1) - x * x.dot(&linear.column(1))).normalize();
        let mut z = x.cross(&y);
        if self.reflected {
            z = -z;
        }
        let rigid = Mat3::from_columns(&[x, y, z]);
        if !rigid.iter().all(|v| v.is_finite()) {
            return Self::translation(self.forward.translation);
        }
        let inverse_linear = rigid.transpose();
        Self {
            forward: Affine {
                linear: rigid,
                translation: self.forward.translation,
            },
            inverse: Affine {
                linear: inverse_linear,
                translation: -(inverse_linear * self.forward.translation),
            },
            scale_kind: ScaleKind::None,
            scale: 1.0,
            rescale: 1.0,
            reflected: self.reflected,
        }
    }

    /// Forward map
    pub fn forward(&self) -> &Affine {
        &self.forward
    }

    /// Inverse map
    pub fn inverse(&self) -> &Affine {
        &self.inverse
    }

    /// Forward 3×4 matrix
    pub fn matrix(&self) -> Mat3x4 {
        self.forward.to_matrix()
    }

    /// Scale classification
    pub fn scale_kind(&self) -> ScaleKind {
        self.scale_kind
    }

    /// Length scale of the forward map
    pub fn scale(&self) -> f32 {
        self.scale
    }

    /// Factor that restores unit length to normals mapped by a uniform scale
    pub fn rescale(&self) -> f32 {
        self.rescale
    }

    /// True when the transform flips handedness
    pub fn is_reflected(&self) -> bool {
        self.reflected
    }

    /// Map a point
    pub fn transform_point(&self, point: &Point3) -> Point3 {
        self.forward.transform_point(point)
    }

    /// Map a direction
    pub fn transform_vector(&self, vector: &Vec3) -> Vec3 {
        self.forward.transform_vector(vector)
    }

    /// Map a surface normal. Not renormalised: for none/uniform scales the
    /// forward matrix is used, otherwise the inverse transpose.
    pub fn transform_normal(&self, normal: &Vec3) -> Vec3 {
        match self.scale_kind {
            ScaleKind::None | ScaleKind::Uniform => self.forward.linear * normal,
            ScaleKind::Arbitrary => self.inverse.linear.tr_mul(normal),
        }
    }
}

/// Scale class and length scale of a linear map from its Gram matrix
fn classify_linear(linear: &Mat3) -> (ScaleKind, f32) {
    let gram = linear.tr_mul(linear);
    let squared = gram.trace() / 3.0;
    let uniform = relative_eq!(
        gram,
        Mat3::from_diagonal_element(squared),
        epsilon = SCALE_TOLERANCE * squared,
        max_relative = SCALE_TOLERANCE * 10.0
    );
    if !uniform {
        return (ScaleKind::Arbitrary, linear.determinant().abs().cbrt());
    }
    let scale = squared.sqrt();
    if relative_eq!(scale, 1.0, max_relative = SCALE_TOLERANCE) {
        (ScaleKind::None, 1.0)
    } else {
        (ScaleKind::Uniform, scale)
    }
}
