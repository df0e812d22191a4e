//! Planes and bounding boxes of convex primitives

use crate::foundation::math::{utils, Point3, Vec3};

/// Half-space boundary of a convex: the solid lies where
/// `normal · (x - point) <= 0`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plane {
    /// Outward normal (need not be unit length)
    pub normal: Vec3,
    /// Representative point on the plane
    pub point: Point3,
    /// Index into the convex's material overrides
    pub material: Option<u16>,
}

impl Plane {
    /// Plane through `point` with outward `normal`
    pub fn new(normal: Vec3, point: Point3) -> Self {
        Self {
            normal,
            point,
            material: None,
        }
    }

    /// Use material override `index` for this plane
    pub fn with_material(mut self, index: u16) -> Self {
        self.material = Some(index);
        self
    }

    /// `normal · point`
    pub fn d(&self) -> f32 {
        self.normal.dot(&self.point.coords)
    }

    /// Signed distance of `point` in units of the normal's length
    pub fn signed_distance(&self, point: &Point3) -> f32 {
        self.normal.dot(&(point - self.point))
    }

    /// True when every value is finite and the normal is not zero
    pub fn is_valid(&self) -> bool {
        utils::is_finite(&self.normal)
            && utils::is_finite(&self.point.coords)
            && self.normal.norm_squared() > f32::EPSILON
    }
}

/// Axis-aligned box in center/half-extent form
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    /// Center of the box
    pub center: Point3,
    /// Half of the size along each axis
    pub half_extents: Vec3,
}

impl BoundingBox {
    /// Box centered at a point
    pub fn new(center: Point3, half_extents: Vec3) -> Self {
        Self {
            center,
            half_extents: utils::abs(half_extents),
        }
    }

    /// Box spanning two corners
    pub fn from_min_max(min: Point3, max: Point3) -> Self {
        Self::new(nalgebra::center(&min, &max), (max - min) * 0.5)
    }

    /// Minimum corner
    pub fn min(&self) -> Point3 {
        self.center - self.half_extents
    }

    /// Maximum corner
    pub fn max(&self) -> Point3 {
        self.center + self.half_extents
    }

    /// The eight corners
    pub fn corners(&self) -> [Point3; 8] {
        let (c, h) = (self.center, self.half_extents);
        std::array::from_fn(|i| {
            let sign = |bit: usize| if i & bit == 0 { -1.0 } else { 1.0 };
            Point3::new(c.x + sign(1) * h.x, c.y + sign(2) * h.y, c.z + sign(4) * h.z)
        })
    }
}

/// Facing of a plane relative to the eye
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Facing {
    /// The eye is on the outer side
    Front,
    /// The eye is on the inner side
    Back,
    /// The eye lies in the plane
    EdgeOn,
}

/// A plane after transformation, valid for one convex pass
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransformedPlane {
    /// Transformed normal; not renormalised
    pub normal: Vec3,
    /// Transformed representative point
    pub point: Point3,
    /// `normal · point`
    pub d: f32,
    /// Facing relative to the eye
    pub facing: Facing,
    /// Material override index, carried over
    pub material: Option<u16>,
}

impl TransformedPlane {
    /// Signed distance of `point`, scaled by the normal's length
    pub fn signed_distance(&self, point: &Point3) -> f32 {
        self.normal.dot(&point.coords) - self.d
    }
}
