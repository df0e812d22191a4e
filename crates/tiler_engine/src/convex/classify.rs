//! Visibility classification of convex primitives

use super::transform::transform_planes;
use super::Convex;
use crate::error::Result;
use crate::foundation::math::{Point3, Vec3};
use crate::math::Transform;
use crate::render::camera::{BoxTest, Frustum};

/// Outcome of testing a convex against the view volume
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Visibility {
    /// Nothing of the primitive can be seen
    pub offscreen: bool,
    /// The primitive may cross a frustum plane
    pub needs_clipping: bool,
    /// Camera-space box, when the primitive has one
    pub camera_box: Option<(Point3, Vec3)>,
}

/// Classify a convex whose object-to-camera transform is `to_camera`.
///
/// With a bounding box the camera-space box is tested against the frustum.
/// An unbounded primitive is offscreen only if one of its planes has every
/// frustum corner outside it, and always needs clipping.
pub fn classify(convex: &Convex, to_camera: &Transform, frustum: &Frustum) -> Result<Visibility> {
    if let Some(bbox) = &convex.bbox {
        let (center, half) = camera_box(&bbox.center, &bbox.half_extents, to_camera);
        let test = frustum.test_box(&center, &half);
        return Ok(Visibility {
            offscreen: test == BoxTest::Outside,
            needs_clipping: test == BoxTest::Straddling,
            camera_box: Some((center, half)),
        });
    }

    let planes = transform_planes(&convex.planes, to_camera, &Point3::origin())?;
    let offscreen = planes.iter().any(|plane| {
        frustum
            .corners
            .iter()
            .all(|corner| plane.signed_distance(corner) > 0.0)
    });
    Ok(Visibility {
        offscreen,
        needs_clipping: true,
        camera_box: None,
    })
}

/// Center and half extents of a transformed box: the center is mapped, each
/// new half extent sums the absolute-weighted contributions of the old axes
pub fn camera_box(center: &Point3, half_extents: &Vec3, transform: &Transform) -> (Point3, Vec3) {
    let linear = &transform.forward().linear;
    let mut half = Vec3::zeros();
    for row in 0..3 {
        for column in 0..3 {
            half[row] += linear[(row, column)].abs() * half_extents[column];
        }
    }
    (transform.transform_point(center), half)
}
