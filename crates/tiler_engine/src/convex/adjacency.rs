//! Vertex and edge adjacency of convex hulls
//!
//! Vertices come from plane triples whose intersection point lies inside
//! every plane; points closer than the tolerance are merged. An edge joins
//! two planes that share exactly two vertices.

use super::plane::Plane;
use crate::error::{Result, SceneError};
use crate::foundation::math::{Mat3, Point3, Vec3};

/// Edge between two faces of a hull
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Edge {
    /// Indices of the two planes meeting at the edge
    pub faces: [usize; 2],
    /// Indices of the two end vertices
    pub vertices: [usize; 2],
}

/// Vertices and edges of a closed convex hull
#[derive(Debug, Clone, PartialEq)]
pub struct Adjacency {
    /// Hull vertices
    pub vertices: Vec<Point3>,
    /// Hull edges
    pub edges: Vec<Edge>,
    /// Vertex indices touching each plane
    pub face_vertices: Vec<Vec<usize>>,
}

impl Adjacency {
    /// Average of the hull vertices
    pub fn centroid(&self) -> Point3 {
        let sum: Vec3 = self.vertices.iter().map(|v| v.coords).sum();
        Point3::from(sum / self.vertices.len().max(1) as f32)
    }
}

fn degenerate(reason: impl Into<String>) -> SceneError {
    SceneError::DegenerateConvex(reason.into())
}

fn exhausted<E>(_: E) -> SceneError {
    SceneError::ResourceExhausted("convex adjacency")
}

/// Build the adjacency of a closed convex.
///
/// Fewer than four planes, non-finite values, a plane touching the hull in
/// fewer than three vertices, a plane pair sharing more than two vertices, or
/// a hull that is not closed is rejected as [`SceneError::DegenerateConvex`].
pub fn build_adjacency(planes: &[Plane], epsilon: f32) -> Result<Adjacency> {
    if planes.len() < 4 {
        return Err(degenerate(format!("{} planes cannot bound a volume", planes.len())));
    }
    if let Some(index) = planes.iter().position(|plane| !plane.is_valid()) {
        return Err(degenerate(format!("plane {index} is not finite")));
    }

    let units: Vec<(Vec3, f32)> = planes
        .iter()
        .map(|plane| {
            let length = plane.normal.norm();
            (plane.normal / length, plane.d() / length)
        })
        .collect();
    let inside = |point: &Point3| {
        let tolerance = epsilon * (1.0 + point.coords.norm());
        units.iter().all(|(n, d)| n.dot(&point.coords) - d <= tolerance)
    };

    let mut vertices: Vec<Point3> = Vec::new();
    let count = units.len();
    for i in 0..count {
        for j in i + 1..count {
            for k in j + 1..count {
                let rows = Mat3::from_rows(&[
                    units[i].0.transpose(),
                    units[j].0.transpose(),
                    units[k].0.transpose(),
                ]);
                if rows.determinant().abs() < 1e-6 {
                    continue;
                }
                let Some(inverse) = rows.try_inverse() else {
                    continue;
                };
                let point = Point3::from(inverse * Vec3::new(units[i].1, units[j].1, units[k].1));
                if !inside(&point) {
                    continue;
                }
                let merge = epsilon * (1.0 + point.coords.norm());
                if vertices.iter().all(|v| (v - point).norm() > merge) {
                    vertices.try_reserve(1).map_err(exhausted)?;
                    vertices.push(point);
                }
            }
        }
    }

    let mut face_vertices: Vec<Vec<usize>> = Vec::new();
    face_vertices.try_reserve_exact(count).map_err(exhausted)?;
    for (index, (n, d)) in units.iter().enumerate() {
        let touching: Vec<usize> = vertices
            .iter()
            .enumerate()
            .filter(|(_, v)| (n.dot(&v.coords) - d).abs() <= epsilon * (1.0 + v.coords.norm()))
            .map(|(vertex, _)| vertex)
            .collect();
        if touching.len() < 3 {
            return Err(degenerate(format!(
                "plane {index} touches the hull in {} vertices",
                touching.len()
            )));
        }
        face_vertices.push(touching);
    }

    let mut edges = Vec::new();
    for a in 0..count {
        for b in a + 1..count {
            let shared: Vec<usize> = face_vertices[a]
                .iter()
                .copied()
                .filter(|v| face_vertices[b].contains(v))
                .collect();
            match shared.len() {
                0 | 1 => {}
                2 => {
                    edges.try_reserve(1).map_err(exhausted)?;
                    edges.push(Edge {
                        faces: [a, b],
                        vertices: [shared[0], shared[1]],
                    });
                }
                n => return Err(degenerate(format!("planes {a} and {b} share {n} vertices"))),
            }
        }
    }

    // Euler characteristic of a closed polyhedron
    let euler = vertices.len() as i64 - edges.len() as i64 + count as i64;
    if euler != 2 {
        return Err(degenerate(format!("hull is not closed (V - E + F = {euler})")));
    }

    Ok(Adjacency {
        vertices,
        edges,
        face_vertices,
    })
}
