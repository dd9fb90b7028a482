// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Isolated vertex removal

use crate::geometry::{Mesh, Triangle, Vertex};
use tracing::debug;

/// Outcome of an isolated vertex removal pass
#[derive(Debug, Clone, PartialEq)]
pub struct IsolatedOutcome {
    pub mesh: Mesh,
    /// Number of vertices removed
    pub removed: usize,
    /// New index of every input vertex, `None` if it was removed
    pub index_map: Vec<Option<usize>>,
}

impl IsolatedOutcome {
    /// Translate an input-space vertex index to the compacted mesh
    pub fn remap(&self, old_index: usize) -> Option<usize> {
        self.index_map.get(old_index).copied().flatten()
    }
}

/// Drops vertices referenced by no face and compacts the rest
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IsolatedVertexRemoval;

impl IsolatedVertexRemoval {
    pub fn new() -> Self {
        Self
    }

    pub fn run(&self, mesh: Mesh) -> IsolatedOutcome {
        let Mesh {
            vertices,
            triangles,
        } = mesh;

        // Find which vertices are used
        let mut used_vertices = vec![false; vertices.len()];
        for triangle in &triangles {
            for &index in &triangle.indices {
                if let Some(used) = used_vertices.get_mut(index) {
                    *used = true;
                }
            }
        }

        // Build remapping: old_index -> new_index, preserving relative order
        let mut index_map: Vec<Option<usize>> = vec![None; vertices.len()];
        let mut new_vertices: Vec<Vertex> = Vec::with_capacity(vertices.len());
        for (old_index, vertex) in vertices.iter().enumerate() {
            if used_vertices[old_index] {
                index_map[old_index] = Some(new_vertices.len());
                new_vertices.push(*vertex);
            }
        }

        let new_triangles: Vec<Triangle> = triangles
            .iter()
            .map(|t| {
                // Every referenced vertex was kept above
                Triangle::new(t.indices.map(|i| index_map.get(i).copied().flatten().unwrap_or(i)))
            })
            .collect();

        let removed = vertices.len() - new_vertices.len();
        debug!(removed, "Isolated vertex removal finished");

        IsolatedOutcome {
            mesh: Mesh {
                vertices: new_vertices,
                triangles: new_triangles,
            },
            removed,
            index_map,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::mesh_utils::unreferenced_vertices;

    #[test]
    fn test_single_isolated_vertex() {
        let mesh = Mesh::from_raw(
            vec![
                [0.0, 0.0, 0.0],
                [9.0, 9.0, 9.0],
                [1.0, 0.0, 0.0],
                [0.0, 1.0, 0.0],
                [1.0, 1.0, 0.0],
            ],
            vec![[0, 2, 3], [2, 4, 3]],
        );

        let outcome = IsolatedVertexRemoval::new().run(mesh);

        assert_eq!(outcome.removed, 1);
        assert_eq!(outcome.mesh.vertex_count(), 4);
        // Indices above the removed vertex shift down by one; index 0 stays
        assert_eq!(outcome.mesh.raw_faces(), vec![[0, 1, 2], [1, 3, 2]]);
        assert_eq!(outcome.remap(1), None);
        assert_eq!(outcome.remap(4), Some(3));
        assert!(unreferenced_vertices(&outcome.mesh).is_empty());
    }

    #[test]
    fn test_no_faces_removes_everything() {
        let mesh = Mesh::from_raw(vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0]], vec![]);
        let outcome = IsolatedVertexRemoval::new().run(mesh);
        assert_eq!(outcome.removed, 2);
        assert!(outcome.mesh.vertices.is_empty());
    }

    #[test]
    fn test_fully_referenced_mesh_unchanged() {
        let mesh = Mesh::from_raw(
            vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
            vec![[2, 0, 1]],
        );
        let outcome = IsolatedVertexRemoval::new().run(mesh.clone());
        assert_eq!(outcome.removed, 0);
        assert_eq!(outcome.mesh, mesh);
    }

    #[test]
    fn test_empty_mesh() {
        let outcome = IsolatedVertexRemoval::new().run(Mesh::new());
        assert_eq!(outcome.removed, 0);
        assert!(outcome.index_map.is_empty());
    }
}
