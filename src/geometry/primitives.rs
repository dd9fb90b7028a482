// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Geometric primitives generator
//!
//! The generators deliberately produce "raw" meshes in the style of kernel
//! output: the cube gives every face its own vertices and the sphere repeats
//! its seam and pole vertices, so both exercise the cleanup passes.

use super::{Mesh, Triangle, Vertex};
use nalgebra::{Point3, Vector3};
use std::f64::consts::PI;

/// Geometric primitives
#[derive(Debug, Clone, PartialEq)]
pub enum Primitive {
    Cube { size: Vector3<f64>, center: bool },
    Sphere { r: f64, fn_: u32 },
    Cylinder { h: f64, r: f64, fn_: u32 },
}

impl Primitive {
    pub fn cube(size: Vector3<f64>, center: bool) -> Self {
        Self::Cube { size, center }
    }

    pub fn sphere(r: f64, fn_: u32) -> Self {
        let segments = if fn_ > 0 { fn_ } else { 32 };
        Self::Sphere { r, fn_: segments }
    }

    pub fn cylinder(h: f64, r: f64, fn_: u32) -> Self {
        let segments = if fn_ > 0 { fn_ } else { 32 };
        Self::Cylinder {
            h,
            r,
            fn_: segments,
        }
    }

    pub fn to_mesh(&self) -> Mesh {
        match self {
            Self::Cube { size, center } => generate_cube_mesh(*size, *center),
            Self::Sphere { r, fn_ } => generate_sphere_mesh(*r, *fn_),
            Self::Cylinder { h, r, fn_ } => generate_cylinder_mesh(*h, *r, *fn_),
        }
    }
}

fn generate_cube_mesh(size: Vector3<f64>, center: bool) -> Mesh {
    let mut mesh = Mesh::with_capacity(36, 12);

    let min = if center {
        Point3::from(-size / 2.0)
    } else {
        Point3::origin()
    };
    let max = min + size;

    // 8 corners of the cube
    let positions = [
        Point3::new(min.x, min.y, min.z),
        Point3::new(max.x, min.y, min.z),
        Point3::new(max.x, max.y, min.z),
        Point3::new(min.x, max.y, min.z),
        Point3::new(min.x, min.y, max.z),
        Point3::new(max.x, min.y, max.z),
        Point3::new(max.x, max.y, max.z),
        Point3::new(min.x, max.y, max.z),
    ];

    // Two triangles per side, outward winding
    let faces = [
        [4, 5, 6],
        [4, 6, 7],
        [1, 0, 3],
        [1, 3, 2],
        [5, 1, 2],
        [5, 2, 6],
        [0, 4, 7],
        [0, 7, 3],
        [7, 6, 2],
        [7, 2, 3],
        [0, 1, 5],
        [0, 5, 4],
    ];

    for indices in faces {
        let v0 = mesh.add_vertex(Vertex::new(positions[indices[0]]));
        let v1 = mesh.add_vertex(Vertex::new(positions[indices[1]]));
        let v2 = mesh.add_vertex(Vertex::new(positions[indices[2]]));
        mesh.add_triangle(Triangle::new([v0, v1, v2]));
    }

    mesh
}

fn generate_sphere_mesh(radius: f64, segments: u32) -> Mesh {
    let stacks = segments as usize;
    let slices = segments as usize;
    let mut mesh = Mesh::with_capacity((stacks + 1) * (slices + 1), stacks * slices * 2);

    for i in 0..=stacks {
        let phi = PI * i as f64 / stacks as f64;
        let y = radius * phi.cos();
        let r = radius * phi.sin();

        for j in 0..=slices {
            let theta = 2.0 * PI * j as f64 / slices as f64;
            mesh.add_vertex(Vertex::from_coords(r * theta.cos(), y, r * theta.sin()));
        }
    }

    // Pole rows collapse onto a single point, so their triangles degenerate
    for i in 0..stacks {
        for j in 0..slices {
            let first = i * (slices + 1) + j;
            let second = first + slices + 1;

            mesh.add_triangle(Triangle::new([first, first + 1, second]));
            mesh.add_triangle(Triangle::new([second, first + 1, second + 1]));
        }
    }

    mesh
}

fn generate_cylinder_mesh(height: f64, radius: f64, segments: u32) -> Mesh {
    let segments = segments as usize;
    let mut mesh = Mesh::with_capacity(2 + segments * 2, segments * 4);

    let bottom_center_idx = mesh.add_vertex(Vertex::from_coords(0.0, 0.0, 0.0));
    let top_center_idx = mesh.add_vertex(Vertex::from_coords(0.0, 0.0, height));

    let mut bottom_indices = Vec::with_capacity(segments);
    let mut top_indices = Vec::with_capacity(segments);

    for i in 0..segments {
        let angle = 2.0 * PI * i as f64 / segments as f64;
        let (x, y) = (radius * angle.cos(), radius * angle.sin());
        bottom_indices.push(mesh.add_vertex(Vertex::from_coords(x, y, 0.0)));
        top_indices.push(mesh.add_vertex(Vertex::from_coords(x, y, height)));
    }

    for i in 0..segments {
        let next = (i + 1) % segments;
        let bi = bottom_indices[i];
        let ti = top_indices[i];
        let bn = bottom_indices[next];
        let tn = top_indices[next];

        mesh.add_triangle(Triangle::new([bottom_center_idx, bn, bi]));
        mesh.add_triangle(Triangle::new([top_center_idx, ti, tn]));
        mesh.add_triangle(Triangle::new([bi, bn, ti]));
        mesh.add_triangle(Triangle::new([ti, bn, tn]));
    }

    mesh
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::mesh_utils::{is_closed, is_manifold};
    use approx::assert_relative_eq;

    #[test]
    fn test_cube_generation() {
        let mesh = generate_cube_mesh(Vector3::new(10.0, 10.0, 10.0), false);
        assert_eq!(mesh.vertex_count(), 36);
        assert_eq!(mesh.triangle_count(), 12);
        assert!(is_manifold(&mesh));
        assert_relative_eq!(mesh.signed_volume(), 1000.0, epsilon = 1e-9);
    }

    #[test]
    fn test_centered_cube_bounds() {
        let mesh = generate_cube_mesh(Vector3::new(2.0, 4.0, 6.0), true);
        let bbox = mesh.bounding_box();
        assert_eq!(bbox.min, Point3::new(-1.0, -2.0, -3.0));
        assert_eq!(bbox.max, Point3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn test_cylinder_is_closed_and_outward() {
        let mesh = generate_cylinder_mesh(10.0, 5.0, 32);
        assert!(is_manifold(&mesh), "Cylinder mesh should be manifold");
        assert!(is_closed(&mesh), "Cylinder mesh should be closed");
        assert_eq!(mesh.vertex_count(), 2 + 32 * 2);
        assert!(mesh.signed_volume() > 0.0);
    }

    #[test]
    fn test_sphere_has_outward_winding() {
        let mesh = generate_sphere_mesh(5.0, 16);
        assert!(mesh.signed_volume() > 0.0);
        assert_eq!(mesh.vertex_count(), 17 * 17);
    }
}
