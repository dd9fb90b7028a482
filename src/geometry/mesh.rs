// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Mesh representation and utilities

use super::BoundingBox;
use crate::error::{EngineError, EngineResult};
use nalgebra::{Matrix4, Point3, Vector3};
use serde::{Deserialize, Serialize};

/// Mesh vertex; identified only by its position in the vertex sequence
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vertex {
    pub position: Point3<f64>,
}

impl Vertex {
    pub fn new(position: Point3<f64>) -> Self {
        Self { position }
    }

    pub fn from_coords(x: f64, y: f64, z: f64) -> Self {
        Self::new(Point3::new(x, y, z))
    }

    pub fn transform(&mut self, matrix: &Matrix4<f64>) {
        self.position = matrix.transform_point(&self.position);
    }

    pub fn distance(&self, other: &Vertex) -> f64 {
        (self.position - other.position).norm()
    }

    pub fn is_finite(&self) -> bool {
        self.position.iter().all(|c| c.is_finite())
    }
}

/// Triangle defined by three vertex indices, counter-clockwise seen from outside
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Triangle {
    pub indices: [usize; 3],
}

impl Triangle {
    pub fn new(indices: [usize; 3]) -> Self {
        Self { indices }
    }

    /// True if two or more indices coincide
    pub fn is_degenerate(&self) -> bool {
        let [i0, i1, i2] = self.indices;
        i0 == i1 || i1 == i2 || i0 == i2
    }

    /// Reverse the winding
    pub fn flipped(&self) -> Self {
        let [i0, i1, i2] = self.indices;
        Self::new([i0, i2, i1])
    }

    /// Map every index through `map`
    pub fn remapped(&self, map: &[usize]) -> Self {
        Self::new([
            map[self.indices[0]],
            map[self.indices[1]],
            map[self.indices[2]],
        ])
    }
}

/// Triangular mesh
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mesh {
    pub vertices: Vec<Vertex>,
    pub triangles: Vec<Triangle>,
}

impl Mesh {
    pub fn new() -> Self {
        Self {
            vertices: Vec::new(),
            triangles: Vec::new(),
        }
    }

    pub fn with_capacity(vertex_count: usize, triangle_count: usize) -> Self {
        Self {
            vertices: Vec::with_capacity(vertex_count),
            triangles: Vec::with_capacity(triangle_count),
        }
    }

    /// Build a mesh from plain coordinate and index tuples
    pub fn from_raw(vertices: Vec<[f64; 3]>, faces: Vec<[usize; 3]>) -> Self {
        Self {
            vertices: vertices
                .into_iter()
                .map(|[x, y, z]| Vertex::from_coords(x, y, z))
                .collect(),
            triangles: faces.into_iter().map(Triangle::new).collect(),
        }
    }

    /// Add a vertex and return its index
    pub fn add_vertex(&mut self, vertex: Vertex) -> usize {
        let index = self.vertices.len();
        self.vertices.push(vertex);
        index
    }

    /// Add a triangle
    pub fn add_triangle(&mut self, triangle: Triangle) {
        self.triangles.push(triangle);
    }

    /// Transform all vertices by a matrix
    pub fn transform(&mut self, matrix: &Matrix4<f64>) {
        for vertex in &mut self.vertices {
            vertex.transform(matrix);
        }
    }

    /// Translated copy
    pub fn translated(&self, offset: Vector3<f64>) -> Mesh {
        let mut mesh = self.clone();
        mesh.transform(&Matrix4::new_translation(&offset));
        mesh
    }

    /// Compute bounding box
    pub fn bounding_box(&self) -> BoundingBox {
        BoundingBox::from_vertices(&self.vertices)
    }

    /// Get vertex count
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Get triangle count
    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }

    /// Check that every face index is in range and every coordinate is finite
    pub fn validate(&self) -> EngineResult<()> {
        if let Some(index) = self.vertices.iter().position(|v| !v.is_finite()) {
            return Err(EngineError::geometry(format!(
                "vertex {} has a non-finite coordinate",
                index
            )));
        }

        let vertex_count = self.vertices.len();
        for (face_index, triangle) in self.triangles.iter().enumerate() {
            if let Some(&bad) = triangle.indices.iter().find(|&&i| i >= vertex_count) {
                return Err(EngineError::geometry(format!(
                    "face {} references vertex {} but the mesh has {} vertices",
                    face_index, bad, vertex_count
                )));
            }
        }

        Ok(())
    }

    /// True if every face index is in range
    pub fn has_valid_indices(&self) -> bool {
        let n = self.vertices.len();
        self.triangles
            .iter()
            .all(|t| t.indices.iter().all(|&i| i < n))
    }

    /// Merge with another mesh (concatenation, no CSG)
    pub fn merge(&mut self, other: &Mesh) {
        let offset = self.vertices.len();
        self.vertices.extend_from_slice(&other.vertices);

        for triangle in &other.triangles {
            self.triangles.push(Triangle::new([
                triangle.indices[0] + offset,
                triangle.indices[1] + offset,
                triangle.indices[2] + offset,
            ]));
        }
    }

    /// Copy with every triangle's winding reversed
    pub fn flipped(&self) -> Mesh {
        Mesh {
            vertices: self.vertices.clone(),
            triangles: self.triangles.iter().map(Triangle::flipped).collect(),
        }
    }

    /// Euclidean length of the edge between two vertices
    pub fn edge_length(&self, a: usize, b: usize) -> f64 {
        self.vertices[a].distance(&self.vertices[b])
    }

    /// Unnormalized face normal (length is twice the triangle area)
    pub fn triangle_normal(&self, triangle: &Triangle) -> Vector3<f64> {
        let v0 = &self.vertices[triangle.indices[0]].position;
        let v1 = &self.vertices[triangle.indices[1]].position;
        let v2 = &self.vertices[triangle.indices[2]].position;
        (v1 - v0).cross(&(v2 - v0))
    }

    pub fn triangle_area(&self, triangle: &Triangle) -> f64 {
        self.triangle_normal(triangle).norm() * 0.5
    }

    /// Signed enclosed volume (positive for outward winding)
    pub fn signed_volume(&self) -> f64 {
        self.triangles
            .iter()
            .map(|t| {
                let v0 = self.vertices[t.indices[0]].position.coords;
                let v1 = self.vertices[t.indices[1]].position.coords;
                let v2 = self.vertices[t.indices[2]].position.coords;
                v0.dot(&v1.cross(&v2)) / 6.0
            })
            .sum()
    }

    /// Vertex coordinates as plain tuples
    pub fn raw_vertices(&self) -> Vec<[f64; 3]> {
        self.vertices
            .iter()
            .map(|v| [v.position.x, v.position.y, v.position.z])
            .collect()
    }

    /// Face indices as plain tuples
    pub fn raw_faces(&self) -> Vec<[usize; 3]> {
        self.triangles.iter().map(|t| t.indices).collect()
    }
}

impl Default for Mesh {
    fn default() -> Self {
        Self::new()
    }
}
