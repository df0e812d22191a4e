//! Level-of-detail selection

use serde::{Deserialize, Serialize};

use crate::foundation::math::Point3;
use crate::math::Transform;
use crate::render::camera::CameraView;
use crate::scene::Name;

/// One detail level
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LodLevel {
    /// Smallest projected half-size, in pixels, at which the level is used
    pub min_pixels: f32,
    /// List drawn at this level
    pub list: Name,
}

/// Level-of-detail selector carried by a LOD node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LodNode {
    /// Local reference point the distance is measured from
    pub center: Point3,
    /// Object size in local units
    pub size: f32,
    /// Levels from finest (largest threshold) to coarsest
    pub levels: Vec<LodLevel>,
}

impl LodNode {
    /// Selector for an object of `size` around `center`
    pub fn new(center: Point3, size: f32) -> Self {
        Self {
            center,
            size,
            levels: Vec::new(),
        }
    }

    /// Append a coarser level
    pub fn with_level(mut self, min_pixels: f32, list: Name) -> Self {
        self.levels.push(LodLevel { min_pixels, list });
        self
    }

    /// Squared projected half-size in pixels
    pub fn half_pixels_squared(&self, to_camera: &Transform, view: &CameraView) -> f32 {
        let center = to_camera.transform_point(&self.center);
        let distance_squared = center.coords.norm_squared();
        let half = self.size * 0.5 * to_camera.scale() * view.focal_pixels();
        if distance_squared <= f32::EPSILON {
            return f32::INFINITY;
        }
        half * half / distance_squared
    }

    /// First level whose threshold the projected size reaches; `None` when the
    /// object is smaller than the coarsest level
    pub fn select(&self, to_camera: &Transform, view: &CameraView) -> Option<Name> {
        let size = self.half_pixels_squared(to_camera, view);
        self.levels
            .iter()
            .find(|level| size >= level.min_pixels * level.min_pixels)
            .map(|level| level.list)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ViewportConfig;
    use crate::foundation::math::Vec3;
    use crate::render::camera::CameraNode;

    fn view() -> CameraView {
        CameraView::new(
            &CameraNode::new(90.0, 0.1, 1000.0),
            &Transform::identity(),
            &ViewportConfig {
                width: 200,
                height: 200,
                tile_size: 20,
            },
        )
    }

    fn lod() -> LodNode {
        LodNode::new(Point3::origin(), 2.0)
            .with_level(50.0, Name::new(1))
            .with_level(10.0, Name::new(2))
            .with_level(2.0, Name::new(3))
    }

    #[test]
    fn test_levels_by_distance() {
        // Focal length is 100 px, so half-size in pixels is 100 / distance
        let at = |distance: f32| Transform::translation(Vec3::new(0.0, 0.0, -distance));
        assert_eq!(lod().select(&at(1.0), &view()), Some(Name::new(1)));
        assert_eq!(lod().select(&at(5.0), &view()), Some(Name::new(2)));
        assert_eq!(lod().select(&at(40.0), &view()), Some(Name::new(3)));
        assert_eq!(lod().select(&at(100.0), &view()), None);
    }

    #[test]
    fn test_scaled_object_looks_bigger() {
        let far = Transform::translation(Vec3::new(0.0, 0.0, -40.0));
        let scaled = far.compose(&Transform::scaling(Vec3::new(10.0, 10.0, 10.0)).unwrap());
        assert_eq!(lod().select(&scaled, &view()), Some(Name::new(2)));
    }
}
