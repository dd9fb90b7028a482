// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Mesh connectivity and validation utilities

use super::{Mesh, Triangle};
use ahash::{AHashMap, AHashSet};

/// Undirected edge key for connectivity checking
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Edge {
    pub v0: usize,
    pub v1: usize,
}

impl Edge {
    pub fn new(v0: usize, v1: usize) -> Self {
        // Always store edges with smaller index first for consistent hashing
        if v0 < v1 {
            Self { v0, v1 }
        } else {
            Self { v0: v1, v1: v0 }
        }
    }

    /// The three undirected edges of a triangle
    pub fn of_triangle(triangle: &Triangle) -> [Edge; 3] {
        let [i0, i1, i2] = triangle.indices;
        [Edge::new(i0, i1), Edge::new(i1, i2), Edge::new(i2, i0)]
    }

    pub fn as_array(&self) -> [usize; 2] {
        [self.v0, self.v1]
    }
}

/// Build edge count map for a mesh
pub fn build_edge_counts(mesh: &Mesh) -> AHashMap<Edge, u32> {
    let mut edge_counts: AHashMap<Edge, u32> = AHashMap::with_capacity(mesh.triangles.len() * 2);

    for triangle in &mesh.triangles {
        for edge in Edge::of_triangle(triangle) {
            *edge_counts.entry(edge).or_insert(0) += 1;
        }
    }

    edge_counts
}

/// Distinct undirected edges of a mesh, sorted
pub fn unique_edges(mesh: &Mesh) -> Vec<Edge> {
    let mut edges: Vec<Edge> = build_edge_counts(mesh).into_keys().collect();
    edges.sort_unstable();
    edges
}

/// Check if mesh is manifold (each edge shared by at most 2 triangles)
pub fn is_manifold(mesh: &Mesh) -> bool {
    build_edge_counts(mesh).values().all(|&count| count <= 2)
}

/// Check if mesh is closed (each edge shared by exactly 2 triangles)
pub fn is_closed(mesh: &Mesh) -> bool {
    build_edge_counts(mesh).values().all(|&count| count == 2)
}

/// Find all boundary edges (edges shared by exactly 1 triangle)
pub fn find_boundary_edges(mesh: &Mesh) -> AHashSet<Edge> {
    build_edge_counts(mesh)
        .into_iter()
        .filter(|(_, count)| *count == 1)
        .map(|(edge, _)| edge)
        .collect()
}

/// Indices of vertices not referenced by any face
pub fn unreferenced_vertices(mesh: &Mesh) -> Vec<usize> {
    let mut used = vec![false; mesh.vertices.len()];
    for triangle in &mesh.triangles {
        for &index in &triangle.indices {
            if let Some(slot) = used.get_mut(index) {
                *slot = true;
            }
        }
    }
    used.iter()
        .enumerate()
        .filter(|(_, used)| !**used)
        .map(|(i, _)| i)
        .collect()
}

/// Smallest distance between any two distinct vertices, `None` with fewer than two
pub fn min_vertex_distance(mesh: &Mesh) -> Option<f64> {
    let n = mesh.vertices.len();
    let mut best: Option<f64> = None;
    for i in 0..n {
        for j in (i + 1)..n {
            let d = mesh.vertices[i].distance(&mesh.vertices[j]);
            best = Some(best.map_or(d, |b| b.min(d)));
        }
    }
    best
}

/// Mesh validation report
#[derive(Debug, Clone, PartialEq)]
pub struct MeshValidation {
    pub is_manifold: bool,
    pub is_closed: bool,
    pub has_valid_indices: bool,
    pub edge_count: usize,
    pub boundary_edge_count: usize,
    pub non_manifold_edge_count: usize,
    pub degenerate_face_count: usize,
    pub unreferenced_vertex_count: usize,
}

pub fn validate_mesh(mesh: &Mesh) -> MeshValidation {
    let has_valid_indices = mesh.has_valid_indices();
    let edge_counts = build_edge_counts(mesh);

    let boundary_edges = edge_counts.values().filter(|&&count| count == 1).count();
    let non_manifold_edges = edge_counts.values().filter(|&&count| count > 2).count();

    MeshValidation {
        is_manifold: non_manifold_edges == 0,
        is_closed: edge_counts.values().all(|&count| count == 2),
        has_valid_indices,
        edge_count: edge_counts.len(),
        boundary_edge_count: boundary_edges,
        non_manifold_edge_count: non_manifold_edges,
        degenerate_face_count: mesh.triangles.iter().filter(|t| t.is_degenerate()).count(),
        unreferenced_vertex_count: unreferenced_vertices(mesh).len(),
    }
}
