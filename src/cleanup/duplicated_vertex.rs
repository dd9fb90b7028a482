// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Duplicated vertex removal
//!
//! Vertices closer than `epsilon` are merged. Proximity is made transitive:
//! if `a` is near `b` and `b` is near `c`, all three end up in one class even
//! when `a` and `c` are farther apart than `epsilon`. Each class is
//! represented by its first-encountered (lowest index) member, whose position
//! is kept unchanged, so the output is reproducible and every pair of
//! surviving vertices is at least `epsilon` apart.

use crate::geometry::{Mesh, Triangle, Vertex};
use ahash::AHashMap;
use nalgebra::Point3;
use tracing::debug;

/// Grid cell coordinate
type Cell = (i64, i64, i64);

/// Outcome of a duplicated vertex removal pass
#[derive(Debug, Clone, PartialEq)]
pub struct DedupOutcome {
    pub mesh: Mesh,
    /// Number of vertices merged into another vertex
    pub merged: usize,
    /// Number of faces dropped because merging made them degenerate
    pub faces_dropped: usize,
}

/// Merges near-coincident vertices using a uniform spatial hash
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DuplicatedVertexRemoval {
    epsilon: f64,
}

impl DuplicatedVertexRemoval {
    pub fn new(epsilon: f64) -> Self {
        Self { epsilon }
    }

    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    /// Merge vertex classes and drop faces that collapse
    pub fn run(&self, mesh: Mesh) -> DedupOutcome {
        let Mesh {
            vertices,
            triangles,
        } = mesh;

        let representative = self.find_representatives(&vertices);

        // Representatives always precede the members mapped onto them
        let mut index_map = vec![0usize; vertices.len()];
        let mut new_vertices: Vec<Vertex> = Vec::with_capacity(vertices.len());
        for (old_index, &root) in representative.iter().enumerate() {
            if root == old_index {
                index_map[old_index] = new_vertices.len();
                new_vertices.push(vertices[old_index]);
            } else {
                index_map[old_index] = index_map[root];
            }
        }

        let face_count = triangles.len();
        let new_triangles: Vec<Triangle> = triangles
            .iter()
            .map(|t| t.remapped(&index_map))
            .filter(|t| !t.is_degenerate())
            .collect();

        let merged = vertices.len() - new_vertices.len();
        let faces_dropped = face_count - new_triangles.len();

        debug!(
            merged,
            faces_dropped,
            epsilon = self.epsilon,
            "Duplicated vertex removal finished"
        );

        DedupOutcome {
            mesh: Mesh {
                vertices: new_vertices,
                triangles: new_triangles,
            },
            merged,
            faces_dropped,
        }
    }

    /// Class representative (lowest member index) for every vertex
    fn find_representatives(&self, vertices: &[Vertex]) -> Vec<usize> {
        let mut sets = DisjointSet::new(vertices.len());

        if !(self.epsilon.is_finite() && self.epsilon > 0.0) || vertices.len() < 2 {
            return sets.roots();
        }

        let mut grid: AHashMap<Cell, Vec<usize>> = AHashMap::with_capacity(vertices.len());
        for (index, vertex) in vertices.iter().enumerate() {
            grid.entry(pos_to_cell(&vertex.position, self.epsilon))
                .or_default()
                .push(index);
        }

        for (index, vertex) in vertices.iter().enumerate() {
            let (cx, cy, cz) = pos_to_cell(&vertex.position, self.epsilon);

            // Cell size equals epsilon, so every neighbour within epsilon is
            // in the 3x3x3 block around the vertex's own cell
            for dx in -1..=1 {
                for dy in -1..=1 {
                    for dz in -1..=1 {
                        let neighbor_cell = (cx + dx, cy + dy, cz + dz);
                        let Some(candidates) = grid.get(&neighbor_cell) else {
                            continue;
                        };

                        for &other in candidates {
                            if other <= index {
                                continue;
                            }
                            if vertex.distance(&vertices[other]) < self.epsilon {
                                sets.union(index, other);
                            }
                        }
                    }
                }
            }
        }

        sets.roots()
    }
}

/// Convert position to spatial hash cell
fn pos_to_cell(pos: &Point3<f64>, cell_size: f64) -> Cell {
    (
        (pos.x / cell_size).floor() as i64,
        (pos.y / cell_size).floor() as i64,
        (pos.z / cell_size).floor() as i64,
    )
}

/// Union-find whose root is always the smallest member
struct DisjointSet {
    parent: Vec<usize>,
}

impl DisjointSet {
    fn new(size: usize) -> Self {
        Self {
            parent: (0..size).collect(),
        }
    }

    fn find(&mut self, mut x: usize) -> usize {
        let mut root = x;
        while self.parent[root] != root {
            root = self.parent[root];
        }
        while self.parent[x] != root {
            let next = self.parent[x];
            self.parent[x] = root;
            x = next;
        }
        root
    }

    fn union(&mut self, a: usize, b: usize) {
        let ra = self.find(a);
        let rb = self.find(b);
        if ra < rb {
            self.parent[rb] = ra;
        } else if rb < ra {
            self.parent[ra] = rb;
        }
    }

    fn roots(&mut self) -> Vec<usize> {
        (0..self.parent.len()).map(|i| self.find(i)).collect()
    }
}
