//! Camera, view frustum and tile regions
//!
//! Camera space looks down -Z with +Y up. The frustum is kept in camera space;
//! its planes have inward normals so that `distance_to_point >= 0` inside.

use serde::{Deserialize, Serialize};

use crate::config::ViewportConfig;
use crate::convex::BoundingBox;
use crate::foundation::math::{utils, Point3, Vec3};
use crate::math::Transform;

/// Viewpoint carried by a camera node
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraNode {
    /// Vertical field of view in radians
    pub fov_y: f32,
    /// Near clip distance
    pub near: f32,
    /// Far clip distance
    pub far: f32,
}

impl CameraNode {
    /// Camera with a vertical field of view in degrees
    pub fn new(fov_degrees: f32, near: f32, far: f32) -> Self {
        Self {
            fov_y: utils::deg_to_rad(fov_degrees),
            near,
            far,
        }
    }
}

impl Default for CameraNode {
    fn default() -> Self {
        Self::new(60.0, 0.1, 1000.0)
    }
}

/// Plane defined by normal and distance from origin
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClipPlane {
    /// Unit normal pointing into the frustum
    pub normal: Vec3,
    /// Distance from origin along the normal
    pub distance: f32,
}

impl ClipPlane {
    /// Plane from a normal (normalised here) and distance
    pub fn new(normal: Vec3, distance: f32) -> Self {
        let length = normal.norm();
        Self {
            normal: normal / length,
            distance: distance / length,
        }
    }

    /// Signed distance from plane to point
    pub fn distance_to_point(&self, point: &Point3) -> f32 {
        self.normal.dot(&point.coords) + self.distance
    }
}

/// Where a box lies relative to the frustum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BoxTest {
    /// Completely outside one plane
    Outside,
    /// Completely inside every plane
    Inside,
    /// Crossing at least one plane
    Straddling,
}

/// Camera-space view volume
#[derive(Debug, Clone, PartialEq)]
pub struct Frustum {
    /// Six planes (left, right, top, bottom, near, far)
    pub planes: [ClipPlane; 6],
    /// Near corners followed by far corners
    pub corners: [Point3; 8],
}

impl Frustum {
    /// Symmetric perspective frustum
    pub fn perspective(fov_y: f32, aspect: f32, near: f32, far: f32) -> Self {
        let ty = (fov_y * 0.5).tan();
        let tx = ty * aspect;
        let planes = [
            ClipPlane::new(Vec3::new(1.0, 0.0, -tx), 0.0),
            ClipPlane::new(Vec3::new(-1.0, 0.0, -tx), 0.0),
            ClipPlane::new(Vec3::new(0.0, -1.0, -ty), 0.0),
            ClipPlane::new(Vec3::new(0.0, 1.0, -ty), 0.0),
            ClipPlane::new(Vec3::new(0.0, 0.0, -1.0), -near),
            ClipPlane::new(Vec3::new(0.0, 0.0, 1.0), far),
        ];
        let corner = |depth: f32, i: usize| {
            let sx = if i & 1 == 0 { -1.0 } else { 1.0 };
            let sy = if i & 2 == 0 { -1.0 } else { 1.0 };
            Point3::new(sx * depth * tx, sy * depth * ty, -depth)
        };
        let corners = std::array::from_fn(|i| {
            if i < 4 {
                corner(near, i)
            } else {
                corner(far, i - 4)
            }
        });
        Self { planes, corners }
    }

    /// Test a camera-space box given as center and half extents
    pub fn test_box(&self, center: &Point3, half_extents: &Vec3) -> BoxTest {
        let mut result = BoxTest::Inside;
        for plane in &self.planes {
            let distance = plane.distance_to_point(center);
            let radius = utils::abs(plane.normal).dot(half_extents);
            if distance < -radius {
                return BoxTest::Outside;
            }
            if distance < radius {
                result = BoxTest::Straddling;
            }
        }
        result
    }
}

/// Inclusive range of screen tiles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TileRegion {
    /// First tile column
    pub x0: u32,
    /// First tile row
    pub y0: u32,
    /// Last tile column
    pub x1: u32,
    /// Last tile row
    pub y1: u32,
}

impl TileRegion {
    /// Every tile of the viewport
    pub fn full(viewport: &ViewportConfig) -> Self {
        let (columns, rows) = tile_counts(viewport);
        Self {
            x0: 0,
            y0: 0,
            x1: columns - 1,
            y1: rows - 1,
        }
    }

    /// Number of tiles covered
    pub fn tile_count(&self) -> u32 {
        (self.x1 - self.x0 + 1) * (self.y1 - self.y0 + 1)
    }
}

fn tile_counts(viewport: &ViewportConfig) -> (u32, u32) {
    let tile = viewport.tile_size.max(1);
    (
        viewport.width.div_ceil(tile).max(1),
        viewport.height.div_ceil(tile).max(1),
    )
}

/// Camera resolved for one traversal
#[derive(Debug, Clone, PartialEq)]
pub struct CameraView {
    /// World to camera
    pub world_to_camera: Transform,
    /// Eye position in world space
    pub eye: Point3,
    /// Camera-space frustum
    pub frustum: Frustum,
    /// Target screen
    pub viewport: ViewportConfig,
    near: f32,
    tan_x: f32,
    tan_y: f32,
}

impl CameraView {
    /// View of `camera` placed by `camera_to_world`; any scale is dropped
    pub fn new(camera: &CameraNode, camera_to_world: &Transform, viewport: &ViewportConfig) -> Self {
        let rigid = camera_to_world.descaled();
        let aspect = viewport.width as f32 / viewport.height.max(1) as f32;
        let tan_y = (camera.fov_y * 0.5).tan();
        Self {
            world_to_camera: rigid.inverted(),
            eye: rigid.transform_point(&Point3::origin()),
            frustum: Frustum::perspective(camera.fov_y, aspect, camera.near, camera.far),
            viewport: viewport.clone(),
            near: camera.near,
            tan_x: tan_y * aspect,
            tan_y,
        }
    }

    /// Pixels per world unit at unit distance
    pub fn focal_pixels(&self) -> f32 {
        self.viewport.height as f32 * 0.5 / self.tan_y
    }

    /// Pixel position of a camera-space point in front of the near plane
    pub fn project(&self, point: &Point3) -> Option<(f32, f32)> {
        let depth = -point.z;
        if depth < self.near {
            return None;
        }
        let ndc_x = point.x / (depth * self.tan_x);
        let ndc_y = point.y / (depth * self.tan_y);
        Some((
            (ndc_x + 1.0) * 0.5 * self.viewport.width as f32,
            (1.0 - ndc_y) * 0.5 * self.viewport.height as f32,
        ))
    }

    /// Tiles touched by a camera-space box; the full screen when the box
    /// crosses the near plane
    pub fn tile_region(&self, center: &Point3, half_extents: &Vec3) -> TileRegion {
        let (columns, rows) = tile_counts(&self.viewport);
        let mut min = (f32::MAX, f32::MAX);
        let mut max = (f32::MIN, f32::MIN);
        let corners = BoundingBox::new(*center, *half_extents).corners();
        for corner in &corners {
            let Some((x, y)) = self.project(corner) else {
                return TileRegion::full(&self.viewport);
            };
            min = (min.0.min(x), min.1.min(y));
            max = (max.0.max(x), max.1.max(y));
        }
        let tile = self.viewport.tile_size.max(1) as f32;
        let to_tile = |pixel: f32, count: u32| ((pixel / tile).floor().max(0.0) as u32).min(count - 1);
        TileRegion {
            x0: to_tile(min.0, columns),
            y0: to_tile(min.1, rows),
            x1: to_tile(max.0, columns),
            y1: to_tile(max.1, rows),
        }
    }
}
