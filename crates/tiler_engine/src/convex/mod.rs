//! Convex primitives
//!
//! A convex solid is the intersection of the inner half-spaces of its planes.
//! Traversal transforms the planes, classifies the solid against the view,
//! shades the visible faces and builds shadow volumes from its adjacency.

pub mod adjacency;
pub mod classify;
pub mod plane;
pub mod shadow;
pub mod transform;

pub use adjacency::{build_adjacency, Adjacency, Edge};
pub use classify::{camera_box, classify, Visibility};
pub use plane::{BoundingBox, Facing, Plane, TransformedPlane};
pub use shadow::{shadow_volume, LocalLight, LocalLightCache};
pub use transform::transform_planes;

use crate::error::Result;
use crate::foundation::math::{Point3, Vec3};
use crate::state::MaterialNode;

/// How a convex takes part in rendering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ConvexKind {
    /// Drawn and casting shadows
    #[default]
    Standard,
    /// Not drawn, but casting shadows
    Hidden,
    /// Emitted as a user-defined shadow volume
    ShadowVolume,
    /// Emitted as a light volume
    LightVolume,
}

/// Convex solid carried by a convex node
#[derive(Debug, Clone, PartialEq)]
pub struct Convex {
    /// Bounding planes with outward normals
    pub planes: Vec<Plane>,
    /// Local bounding box; `None` for unbounded primitives
    pub bbox: Option<BoundingBox>,
    /// Material overrides indexed by [`Plane::material`]
    pub materials: Vec<MaterialNode>,
    /// Rendering role
    pub kind: ConvexKind,
    /// Hull adjacency, when it could be built
    pub adjacency: Option<Adjacency>,
}

impl Convex {
    /// Unbounded standard convex from its planes
    pub fn new(planes: Vec<Plane>) -> Self {
        Self {
            planes,
            bbox: None,
            materials: Vec::new(),
            kind: ConvexKind::Standard,
            adjacency: None,
        }
    }

    /// Axis-aligned cube with a bounding box
    pub fn cube(center: Point3, half_size: f32) -> Self {
        let axes = [Vec3::x(), Vec3::y(), Vec3::z()];
        let planes = axes
            .iter()
            .flat_map(|axis| {
                [
                    Plane::new(*axis, center + axis * half_size),
                    Plane::new(-axis, center - axis * half_size),
                ]
            })
            .collect();
        Self::new(planes).with_bbox(BoundingBox::new(center, Vec3::repeat(half_size)))
    }

    /// Set the bounding box
    pub fn with_bbox(mut self, bbox: BoundingBox) -> Self {
        self.bbox = Some(bbox);
        self
    }

    /// Set the material overrides
    pub fn with_materials(mut self, materials: Vec<MaterialNode>) -> Self {
        self.materials = materials;
        self
    }

    /// Set the rendering role
    pub fn with_kind(mut self, kind: ConvexKind) -> Self {
        self.kind = kind;
        self
    }

    /// Build the adjacency if it is missing
    pub fn ensure_adjacency(&mut self, epsilon: f32) -> Result<&Adjacency> {
        let adjacency = match self.adjacency.take() {
            Some(adjacency) => adjacency,
            None => build_adjacency(&self.planes, epsilon)?,
        };
        Ok(self.adjacency.insert(adjacency))
    }

    /// True when `point` (in local space) is inside every plane
    pub fn contains_point(&self, point: &Point3, epsilon: f32) -> bool {
        self.planes.iter().all(|plane| plane.signed_distance(point) <= epsilon)
    }

    /// True when the convex is drawn as a surface
    pub fn is_drawn(&self) -> bool {
        self.kind != ConvexKind::Hidden
    }
}
