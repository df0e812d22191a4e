//! Shadow volumes from silhouette edges
//!
//! The volume of a convex lit by one light is bounded by the faces turned
//! towards the light and by one side plane through each silhouette edge and
//! the light. A shadow-limit plane, when present, closes the far end.

use super::adjacency::Adjacency;
use super::plane::Plane;
use crate::error::{Result, SceneError};
use crate::foundation::math::{Point3, Vec3};
use crate::lighting::{LightEntry, LightKind};
use crate::math::Transform;

/// A light expressed in a convex's local space
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LocalLight {
    /// Direction of travel of a parallel light
    Directional(Vec3),
    /// Position of a point light
    Positional(Point3),
}

impl LocalLight {
    /// Map a world-space light into the space of `object_to_world`
    pub fn from_world(entry: &LightEntry, object_to_world: &Transform) -> Self {
        let inverse = object_to_world.inverse();
        match entry.kind {
            LightKind::Point => Self::Positional(inverse.transform_point(&entry.position)),
            LightKind::Parallel | LightKind::Ambient => {
                Self::Directional(inverse.transform_vector(&entry.direction))
            }
        }
    }

    /// True when `plane` faces the light
    pub fn lights(&self, plane: &Plane) -> bool {
        match self {
            Self::Directional(direction) => plane.normal.dot(direction) < 0.0,
            Self::Positional(position) => plane.signed_distance(position) > 0.0,
        }
    }
}

/// Local-space lights of one convex, keyed by the state they came from
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LocalLightCache {
    stamp: Option<(u64, u64)>,
    lights: Vec<(u8, LocalLight)>,
}

impl LocalLightCache {
    /// Shadow-casting lights as `(slot, light)` in local space, recomputed
    /// only when `stamp` differs from the one they were built for
    pub fn get_or_update<'a>(
        &mut self,
        stamp: (u64, u64),
        lights: impl Iterator<Item = &'a LightEntry>,
        object_to_world: &Transform,
    ) -> &[(u8, LocalLight)] {
        if self.stamp != Some(stamp) {
            self.lights.clear();
            self.lights.extend(
                lights
                    .filter(|entry| entry.shadow_slot != 0)
                    .map(|entry| (entry.shadow_slot, LocalLight::from_world(entry, object_to_world))),
            );
            self.stamp = Some(stamp);
        }
        &self.lights
    }

    /// Forget the cached lights
    pub fn invalidate(&mut self) {
        self.stamp = None;
    }
}

/// Planes bounding the shadow of a convex, in its local space
pub fn shadow_volume(
    planes: &[Plane],
    adjacency: &Adjacency,
    light: &LocalLight,
    limit: Option<&Plane>,
) -> Result<Vec<Plane>> {
    let lit: Vec<bool> = planes.iter().map(|plane| light.lights(plane)).collect();
    let centroid = adjacency.centroid();

    let mut volume = Vec::new();
    volume
        .try_reserve(planes.len() + adjacency.edges.len() + 1)
        .map_err(|_| SceneError::ResourceExhausted("shadow volume plane"))?;

    volume.extend(planes.iter().zip(&lit).filter(|(_, lit)| **lit).map(|(plane, _)| *plane));
    if volume.is_empty() {
        // The light is inside the convex
        return Ok(volume);
    }

    for edge in adjacency.edges.iter().filter(|edge| lit[edge.faces[0]] != lit[edge.faces[1]]) {
        let v0 = adjacency.vertices[edge.vertices[0]];
        let v1 = adjacency.vertices[edge.vertices[1]];
        let along = match light {
            LocalLight::Directional(direction) => *direction,
            LocalLight::Positional(position) => v0 - position,
        };
        let mut normal = (v1 - v0).cross(&along);
        if normal.norm_squared() <= f32::EPSILON * (v1 - v0).norm_squared() {
            continue;
        }
        if normal.dot(&(centroid - v0)) > 0.0 {
            normal = -normal;
        }
        volume.push(Plane::new(normal, v0));
    }

    if let Some(limit) = limit {
        volume.push(*limit);
    }
    Ok(volume)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convex::adjacency::build_adjacency;
    use crate::convex::Convex;
    use crate::foundation::math::utils;
    use crate::lighting::LightNode;
    use crate::scene::Name;

    fn inside(volume: &[Plane], point: Point3) -> bool {
        volume.iter().all(|plane| plane.signed_distance(&point) <= 1e-4)
    }

    #[test]
    fn test_parallel_light_from_above() {
        let cube = Convex::cube(Point3::origin(), 1.0);
        let adjacency = build_adjacency(&cube.planes, 1e-4).unwrap();
        let light = LocalLight::Directional(-Vec3::y());
        let volume = shadow_volume(&cube.planes, &adjacency, &light, None).unwrap();

        // Top cap plus four side planes
        assert_eq!(volume.len(), 5);
        assert!(inside(&volume, Point3::new(0.0, -10.0, 0.0)));
        assert!(inside(&volume, Point3::origin()));
        assert!(!inside(&volume, Point3::new(0.0, 5.0, 0.0)));
        assert!(!inside(&volume, Point3::new(3.0, -10.0, 0.0)));
    }

    #[test]
    fn test_point_light_volume_widens() {
        let cube = Convex::cube(Point3::origin(), 1.0);
        let adjacency = build_adjacency(&cube.planes, 1e-4).unwrap();
        let light = LocalLight::Positional(Point3::new(0.0, 5.0, 0.0));
        let limit = Plane::new(-Vec3::y(), Point3::new(0.0, -10.0, 0.0));
        let volume = shadow_volume(&cube.planes, &adjacency, &light, Some(&limit)).unwrap();

        assert!(inside(&volume, Point3::new(1.5, -4.0, 0.0)));
        assert!(!inside(&volume, Point3::new(0.0, -11.0, 0.0)));
    }

    #[test]
    fn test_light_inside_casts_nothing() {
        let cube = Convex::cube(Point3::origin(), 1.0);
        let adjacency = build_adjacency(&cube.planes, 1e-4).unwrap();
        let light = LocalLight::Positional(Point3::origin());
        assert!(shadow_volume(&cube.planes, &adjacency, &light, None).unwrap().is_empty());
    }

    #[test]
    fn test_local_light_and_cache() {
        let node = LightNode::point(Point3::new(0.0, 4.0, 0.0), utils::grey(1.0));
        let mut entry = LightEntry::new(Name::new(1), &node, Vec3::zeros(), node.position);
        entry.shadow_slot = 2;
        let placed = Transform::translation(Vec3::new(0.0, 1.0, 0.0));

        let mut cache = LocalLightCache::default();
        let lights = cache.get_or_update((1, 1), std::iter::once(&entry), &placed);
        assert_eq!(lights, &[(2, LocalLight::Positional(Point3::new(0.0, 3.0, 0.0)))]);

        // Same stamp: the cached value is kept even for other input
        let lights = cache.get_or_update((1, 1), std::iter::empty(), &placed);
        assert_eq!(lights.len(), 1);
        cache.invalidate();
        assert!(cache.get_or_update((1, 1), std::iter::empty(), &placed).is_empty());
    }
}
