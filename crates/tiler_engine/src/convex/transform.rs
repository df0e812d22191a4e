//! Plane transformation
//!
//! Rigid and uniformly scaled transforms map normals with the same linear
//! part as points; the normals are fixed up at shading time with the cached
//! rescale factor. Any other transform maps normals with the inverse
//! transpose, done as a separate pass after the points.

use super::plane::{Facing, Plane, TransformedPlane};
use crate::error::{Result, SceneError};
use crate::foundation::math::{Point3, Vec3};
use crate::math::{ScaleKind, Transform};

/// Transform planes and tag their facing relative to `eye` (in the target space)
pub fn transform_planes(
    planes: &[Plane],
    transform: &Transform,
    eye: &Point3,
) -> Result<Vec<TransformedPlane>> {
    let mut out = Vec::new();
    out.try_reserve_exact(planes.len())
        .map_err(|_| SceneError::ResourceExhausted("transformed plane"))?;

    match transform.scale_kind() {
        ScaleKind::None | ScaleKind::Uniform => {
            let forward = transform.forward();
            out.extend(planes.iter().map(|plane| {
                let normal = forward.transform_vector(&plane.normal);
                let point = forward.transform_point(&plane.point);
                finish(normal, point, plane.material, eye)
            }));
        }
        ScaleKind::Arbitrary => {
            // Points first; normals read the untouched source in a second pass
            out.extend(planes.iter().map(|plane| TransformedPlane {
                normal: Vec3::zeros(),
                point: transform.transform_point(&plane.point),
                d: 0.0,
                facing: Facing::EdgeOn,
                material: plane.material,
            }));
            for (target, plane) in out.iter_mut().zip(planes) {
                let normal = transform.transform_normal(&plane.normal);
                *target = finish(normal, target.point, plane.material, eye);
            }
        }
    }
    Ok(out)
}

fn finish(normal: Vec3, point: Point3, material: Option<u16>, eye: &Point3) -> TransformedPlane {
    // One axis at a time, in a fixed order
    let mut d = normal.x * point.x;
    d += normal.y * point.y;
    d += normal.z * point.z;

    let eye_side = normal.dot(&eye.coords) - d;
    let facing = if eye_side > 0.0 {
        Facing::Front
    } else if eye_side < 0.0 {
        Facing::Back
    } else {
        Facing::EdgeOn
    };
    TransformedPlane {
        normal,
        point,
        d,
        facing,
        material,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn x_plane() -> Plane {
        Plane::new(Vec3::x(), Point3::new(1.0, 0.0, 0.0))
    }

    #[test]
    fn test_rigid_transform_keeps_unit_normals() {
        let transform = Transform::rotation(Vec3::z(), std::f32::consts::FRAC_PI_2)
            .unwrap()
            .compose(&Transform::translation(Vec3::new(0.0, 0.0, 3.0)));
        let planes = transform_planes(&[x_plane()], &transform, &Point3::new(0.0, 10.0, 0.0)).unwrap();
        assert_relative_eq!(planes[0].normal, Vec3::y(), epsilon = 1e-6);
        assert_relative_eq!(planes[0].point, Point3::new(0.0, 1.0, 3.0), epsilon = 1e-6);
        assert_relative_eq!(planes[0].d, 1.0, epsilon = 1e-6);
        assert_eq!(planes[0].facing, Facing::Front);
    }

    #[test]
    fn test_uniform_scale_leaves_normal_scaled() {
        let transform = Transform::scaling(Vec3::new(2.0, 2.0, 2.0)).unwrap();
        let planes = transform_planes(&[x_plane()], &transform, &Point3::origin()).unwrap();
        assert_relative_eq!(planes[0].normal, Vec3::new(2.0, 0.0, 0.0));
        assert_relative_eq!(planes[0].normal * transform.rescale(), Vec3::x());
        assert_eq!(planes[0].facing, Facing::Back);
    }

    #[test]
    fn test_arbitrary_scale_uses_inverse_transpose() {
        let transform = Transform::scaling(Vec3::new(4.0, 1.0, 1.0)).unwrap();
        let diagonal = Plane::new(Vec3::new(1.0, 1.0, 0.0), Point3::new(1.0, 0.0, 0.0));
        let planes = transform_planes(&[diagonal], &transform, &Point3::origin()).unwrap();
        let plane = &planes[0];
        assert_relative_eq!(plane.point, Point3::new(4.0, 0.0, 0.0));
        assert_relative_eq!(plane.normal, Vec3::new(0.25, 1.0, 0.0));

        // Points on the source plane stay on the transformed plane
        let on_plane = transform.transform_point(&Point3::new(0.0, 1.0, 5.0));
        assert_relative_eq!(plane.signed_distance(&on_plane), 0.0, epsilon = 1e-6);
    }
}
