// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Boolean operations by whole-triangle classification
//!
//! Triangles are never split: each one is kept or discarded depending on
//! whether its centroid lies inside the other operand. Results are exact for
//! operands whose surfaces do not cross and approximate along intersection
//! curves otherwise.

use super::{BooleanKernel, BooleanOp};
use crate::error::EngineResult;
use crate::geometry::{Mesh, Triangle, Vertex};
use nalgebra::{Point3, Vector3};

/// Skewed directions so rays rarely graze edges of axis-aligned meshes
const RAY_DIRECTIONS: [[f64; 3]; 3] = [
    [1.0, 0.213_7, 0.131_2],
    [-0.312_7, 1.0, 0.247_1],
    [0.178_9, -0.289_3, 1.0],
];

/// Ray/triangle tolerance
const EPSILON: f64 = 1e-12;

/// Centroid ray-casting kernel
#[derive(Debug, Clone, Copy, Default)]
pub struct RaycastKernel;

impl RaycastKernel {
    pub const NAME: &'static str = "raycast";

    pub fn new() -> Self {
        Self
    }
}

impl BooleanKernel for RaycastKernel {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn compute(&self, a: &Mesh, b: &Mesh, op: BooleanOp) -> EngineResult<Mesh> {
        let mut result = Mesh::new();

        match op {
            BooleanOp::Union => {
                keep_triangles(&mut result, a, b, Side::Outside, false);
                keep_triangles(&mut result, b, a, Side::Outside, false);
            }
            BooleanOp::Intersection => {
                keep_triangles(&mut result, a, b, Side::Inside, false);
                keep_triangles(&mut result, b, a, Side::Inside, false);
            }
            BooleanOp::Difference => {
                keep_triangles(&mut result, a, b, Side::Outside, false);
                keep_triangles(&mut result, b, a, Side::Inside, true);
            }
            BooleanOp::SymmetricDifference => {
                keep_triangles(&mut result, a, b, Side::Outside, false);
                keep_triangles(&mut result, b, a, Side::Inside, true);
                keep_triangles(&mut result, b, a, Side::Outside, false);
                keep_triangles(&mut result, a, b, Side::Inside, true);
            }
        }

        Ok(result)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    Inside,
    Outside,
}

/// Copy the triangles of `source` whose centroid is on `side` of `other`
fn keep_triangles(result: &mut Mesh, source: &Mesh, other: &Mesh, side: Side, flip: bool) {
    let bbox = other.bounding_box();
    // No ray needs casting when the operands cannot touch
    let overlapping = !other.triangles.is_empty() && bbox.intersects(&source.bounding_box());

    for tri in &source.triangles {
        let [p0, p1, p2] = tri.indices.map(|i| source.vertices[i].position);
        let center = Point3::from((p0.coords + p1.coords + p2.coords) / 3.0);

        let inside = overlapping
            && bbox.contains_point(&center)
            && is_point_inside_mesh(&center, other);

        if inside != (side == Side::Inside) {
            continue;
        }

        // Swap to invert winding
        let (p1, p2) = if flip { (p2, p1) } else { (p1, p2) };
        let i0 = result.add_vertex(Vertex::new(p0));
        let i1 = result.add_vertex(Vertex::new(p1));
        let i2 = result.add_vertex(Vertex::new(p2));
        result.add_triangle(Triangle::new([i0, i1, i2]));
    }
}

/// Majority vote of ray parity tests along three directions
fn is_point_inside_mesh(point: &Point3<f64>, mesh: &Mesh) -> bool {
    let votes = RAY_DIRECTIONS
        .iter()
        .filter(|dir| {
            let direction = Vector3::from(**dir);
            let hits = mesh
                .triangles
                .iter()
                .filter(|tri| {
                    let [v0, v1, v2] = tri.indices.map(|i| mesh.vertices[i].position);
                    ray_intersects_triangle(point, &direction, &v0, &v1, &v2)
                })
                .count();
            // Odd number of intersections = inside
            hits % 2 == 1
        })
        .count();

    votes >= 2
}

/// Test if a ray intersects a triangle using the Moeller-Trumbore algorithm
fn ray_intersects_triangle(
    origin: &Point3<f64>,
    direction: &Vector3<f64>,
    v0: &Point3<f64>,
    v1: &Point3<f64>,
    v2: &Point3<f64>,
) -> bool {
    let edge1 = v1 - v0;
    let edge2 = v2 - v0;
    let h = direction.cross(&edge2);
    let a = edge1.dot(&h);

    if a.abs() < EPSILON {
        return false; // Ray parallel to triangle
    }

    let f = 1.0 / a;
    let s = origin - v0;
    let u = f * s.dot(&h);

    if !(0.0..=1.0).contains(&u) {
        return false;
    }

    let q = s.cross(&edge1);
    let v = f * direction.dot(&q);

    if v < 0.0 || u + v > 1.0 {
        return false;
    }

    let t = f * edge2.dot(&q);
    t > EPSILON // Only count forward intersections
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Primitive;
    use approx::assert_relative_eq;

    fn cube(size: f64, offset: f64) -> Mesh {
        Primitive::cube(Vector3::new(size, size, size), false)
            .to_mesh()
            .translated(Vector3::new(offset, offset, offset))
    }

    #[test]
    fn test_point_inside_cube() {
        let mesh = cube(2.0, 0.0);
        assert!(is_point_inside_mesh(&Point3::new(1.0, 1.0, 1.0), &mesh));
        assert!(is_point_inside_mesh(&Point3::new(0.1, 1.9, 0.5), &mesh));
        assert!(!is_point_inside_mesh(&Point3::new(3.0, 1.0, 1.0), &mesh));
        assert!(!is_point_inside_mesh(&Point3::new(-0.5, -0.5, -0.5), &mesh));
    }

    #[test]
    fn test_point_inside_sphere() {
        let mesh = Primitive::sphere(5.0, 16).to_mesh();
        assert!(is_point_inside_mesh(&Point3::origin(), &mesh));
        assert!(!is_point_inside_mesh(&Point3::new(6.0, 0.0, 0.0), &mesh));
    }

    #[test]
    fn test_nested_cube_difference() {
        // Inner cube fully inside the outer one: result is a hollow shell
        let outer = cube(4.0, 0.0);
        let inner = cube(2.0, 1.0);

        let result = RaycastKernel::new()
            .compute(&outer, &inner, BooleanOp::Difference)
            .unwrap();

        assert_eq!(result.triangle_count(), 24);
        assert_relative_eq!(result.signed_volume(), 64.0 - 8.0, epsilon = 1e-9);
    }

    #[test]
    fn test_nested_cube_union_and_intersection() {
        let outer = cube(4.0, 0.0);
        let inner = cube(2.0, 1.0);
        let kernel = RaycastKernel::new();

        let union = kernel.compute(&outer, &inner, BooleanOp::Union).unwrap();
        assert_relative_eq!(union.signed_volume(), 64.0, epsilon = 1e-9);

        let intersection = kernel
            .compute(&outer, &inner, BooleanOp::Intersection)
            .unwrap();
        assert_relative_eq!(intersection.signed_volume(), 8.0, epsilon = 1e-9);
    }

    #[test]
    fn test_disjoint_symmetric_difference_keeps_both() {
        let a = cube(1.0, 0.0);
        let b = cube(1.0, 5.0);

        let result = RaycastKernel::new()
            .compute(&a, &b, BooleanOp::SymmetricDifference)
            .unwrap();

        assert_eq!(result.triangle_count(), 24);
        assert_relative_eq!(result.signed_volume(), 2.0, epsilon = 1e-9);
    }

    #[test]
    fn test_empty_operands() {
        let a = cube(1.0, 0.0);
        let kernel = RaycastKernel::new();

        let difference = kernel
            .compute(&a, &Mesh::new(), BooleanOp::Difference)
            .unwrap();
        assert_eq!(difference.triangle_count(), 12);

        let intersection = kernel
            .compute(&Mesh::new(), &a, BooleanOp::Intersection)
            .unwrap();
        assert!(intersection.is_empty());
    }

    #[test]
    fn test_disjoint_operands_keep_or_drop_everything() {
        let a = cube(1.0, 0.0);
        let b = cube(1.0, 1.5);
        assert!(!a.bounding_box().intersects(&b.bounding_box()));
        let kernel = RaycastKernel::new();

        let union = kernel.compute(&a, &b, BooleanOp::Union).unwrap();
        assert_eq!(union.triangle_count(), 24);

        let difference = kernel.compute(&a, &b, BooleanOp::Difference).unwrap();
        assert_eq!(difference.triangle_count(), 12);
        assert_relative_eq!(difference.signed_volume(), 1.0, epsilon = 1e-9);

        let intersection = kernel.compute(&a, &b, BooleanOp::Intersection).unwrap();
        assert!(intersection.is_empty());
    }
}
