// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Short edge removal
//!
//! Edges shorter than `epsilon` are collapsed, shortest first. A collapse
//! keeps one endpoint in place and re-points the other endpoint's faces at
//! it; faces that contained both endpoints disappear. The survivor is the
//! endpoint whose choice inverts no incident face and bends incident face
//! normals the least, so no new positions are ever introduced.
//!
//! A collapse is refused when it would invert or flatten a face, pinch the
//! surface (link condition), or leave an edge shared by more than two faces.
//! Refused edges are reported back instead of being forced.
//!
//! Collapsed-away vertices stay in the vertex sequence unreferenced; isolated
//! vertex removal compacts them afterwards.

use crate::geometry::mesh_utils::{unique_edges, Edge};
use crate::geometry::{Mesh, Triangle, Vertex};
use ahash::AHashSet;
use nalgebra::Vector3;
use tracing::{debug, warn};

/// Outcome of a short edge removal pass
#[derive(Debug, Clone, PartialEq)]
pub struct ShortEdgeOutcome {
    pub mesh: Mesh,
    /// Number of edges collapsed
    pub collapsed: usize,
    /// Short edges that could not be collapsed without damaging the surface
    ///
    /// Indices refer to the input vertex array, which this pass never
    /// compacts. [`CleanupReport`](super::CleanupReport) remaps them to the
    /// compacted output.
    pub unresolved_edges: Vec<[usize; 2]>,
    /// Collapse sweeps performed
    pub passes: usize,
    /// Faces removed, either by collapses or because they were already degenerate
    pub faces_removed: usize,
}

/// Collapses edges shorter than a tolerance
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShortEdgeRemoval {
    epsilon: f64,
    max_passes: Option<usize>,
}

impl ShortEdgeRemoval {
    pub fn new(epsilon: f64) -> Self {
        Self {
            epsilon,
            max_passes: None,
        }
    }

    /// Override the sweep bound; defaults to the input's distinct edge count
    pub fn with_max_passes(mut self, max_passes: Option<usize>) -> Self {
        self.max_passes = max_passes;
        self
    }

    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    pub fn run(&self, mesh: Mesh) -> ShortEdgeOutcome {
        let face_count = mesh.triangles.len();

        if !(self.epsilon.is_finite() && self.epsilon > 0.0) || mesh.triangles.is_empty() {
            return ShortEdgeOutcome {
                mesh,
                collapsed: 0,
                unresolved_edges: Vec::new(),
                passes: 0,
                faces_removed: 0,
            };
        }

        let bound = self
            .max_passes
            .unwrap_or_else(|| unique_edges(&mesh).len())
            .max(1);

        let mut state = CollapseState::new(mesh);
        let mut collapsed = 0;
        let mut passes = 0;

        while passes < bound {
            let candidates = state.short_edges(self.epsilon);
            if candidates.is_empty() {
                break;
            }
            passes += 1;

            let mut collapsed_this_pass = 0;
            for edge in candidates {
                if state.try_collapse(edge.v0, edge.v1, self.epsilon) {
                    collapsed_this_pass += 1;
                }
            }

            debug!(pass = passes, collapsed = collapsed_this_pass, "Short edge sweep");
            collapsed += collapsed_this_pass;

            if collapsed_this_pass == 0 {
                break;
            }
        }

        let unresolved_edges: Vec<[usize; 2]> = state
            .short_edges(self.epsilon)
            .into_iter()
            .map(|edge| edge.as_array())
            .collect();

        if !unresolved_edges.is_empty() {
            warn!(
                count = unresolved_edges.len(),
                epsilon = self.epsilon,
                "Short edges left in place; collapsing them would damage the surface"
            );
        }

        let mesh = state.into_mesh();
        let faces_removed = face_count - mesh.triangles.len();

        debug!(collapsed, passes, faces_removed, "Short edge removal finished");

        ShortEdgeOutcome {
            mesh,
            collapsed,
            unresolved_edges,
            passes,
            faces_removed,
        }
    }
}

/// Working copy of the mesh with face slots and vertex-to-face incidence
struct CollapseState {
    vertices: Vec<Vertex>,
    faces: Vec<Option<[usize; 3]>>,
    incident: Vec<Vec<usize>>,
}

/// Collapse direction: `removed` is re-pointed at `kept`
#[derive(Debug, Clone, Copy)]
struct Collapse {
    kept: usize,
    removed: usize,
}

impl CollapseState {
    fn new(mesh: Mesh) -> Self {
        let Mesh {
            vertices,
            triangles,
        } = mesh;

        let faces: Vec<Option<[usize; 3]>> = triangles
            .iter()
            .map(|t| (!t.is_degenerate()).then_some(t.indices))
            .collect();

        let mut incident = vec![Vec::new(); vertices.len()];
        for (face_index, face) in faces.iter().enumerate() {
            if let Some(indices) = face {
                for &v in indices {
                    incident[v].push(face_index);
                }
            }
        }

        Self {
            vertices,
            faces,
            incident,
        }
    }

    fn into_mesh(self) -> Mesh {
        Mesh {
            vertices: self.vertices,
            triangles: self.faces.into_iter().flatten().map(Triangle::new).collect(),
        }
    }

    fn length(&self, a: usize, b: usize) -> f64 {
        self.vertices[a].distance(&self.vertices[b])
    }

    /// Live faces around a vertex
    fn faces_around(&self, v: usize) -> impl Iterator<Item = (usize, [usize; 3])> + '_ {
        self.incident[v]
            .iter()
            .filter_map(move |&f| self.faces[f].filter(|face| face.contains(&v)).map(|face| (f, face)))
    }

    fn neighbors(&self, v: usize) -> AHashSet<usize> {
        self.faces_around(v)
            .flat_map(|(_, face)| face)
            .filter(|&u| u != v)
            .collect()
    }

    /// Distinct live edges shorter than epsilon, shortest first
    fn short_edges(&self, epsilon: f64) -> Vec<Edge> {
        let mut seen: AHashSet<Edge> = AHashSet::new();
        let mut edges: Vec<(f64, Edge)> = Vec::new();

        for face in self.faces.iter().flatten() {
            for i in 0..3 {
                let edge = Edge::new(face[i], face[(i + 1) % 3]);
                if !seen.insert(edge) {
                    continue;
                }
                let length = self.length(edge.v0, edge.v1);
                if length < epsilon {
                    edges.push((length, edge));
                }
            }
        }

        edges.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
        edges.into_iter().map(|(_, edge)| edge).collect()
    }

    fn try_collapse(&mut self, a: usize, b: usize, epsilon: f64) -> bool {
        // The edge may have vanished or grown since the sweep started
        let shared: Vec<[usize; 3]> = self
            .faces_around(a)
            .filter(|(_, face)| face.contains(&b))
            .map(|(_, face)| face)
            .collect();
        if shared.is_empty() || self.length(a, b) >= epsilon {
            return false;
        }

        if !self.satisfies_link_condition(a, b, &shared) {
            return false;
        }

        let options = [
            Collapse { kept: a, removed: b },
            Collapse { kept: b, removed: a },
        ];

        let best = options
            .iter()
            .filter_map(|&c| self.distortion(c).map(|d| (d, c)))
            .filter(|(_, c)| self.keeps_edges_manifold(*c))
            .min_by(|x, y| x.0.total_cmp(&y.0));

        match best {
            Some((_, collapse)) => {
                self.apply(collapse);
                true
            }
            None => false,
        }
    }

    /// Common neighbours of the endpoints must be exactly the apexes of the
    /// faces on the edge, otherwise the collapse pinches the surface
    fn satisfies_link_condition(&self, a: usize, b: usize, shared: &[[usize; 3]]) -> bool {
        let apexes: AHashSet<usize> = shared
            .iter()
            .flat_map(|face| face.iter().copied())
            .filter(|&v| v != a && v != b)
            .collect();

        let na = self.neighbors(a);
        let nb = self.neighbors(b);
        let common: AHashSet<usize> = na
            .intersection(&nb)
            .copied()
            .filter(|&v| v != a && v != b)
            .collect();

        common == apexes
    }

    /// Worst normal deviation `1 - cos` over the faces that move, or `None`
    /// if any of them would invert or flatten
    fn distortion(&self, collapse: Collapse) -> Option<f64> {
        let mut worst: f64 = 0.0;

        for (_, face) in self.faces_around(collapse.removed) {
            if face.contains(&collapse.kept) {
                continue;
            }

            let before = self.normal(face);
            let moved = face.map(|v| if v == collapse.removed { collapse.kept } else { v });
            let after = self.normal(moved);

            let before_len = before.norm();
            if before_len == 0.0 {
                // Already flat; it cannot get worse
                continue;
            }

            let after_len = after.norm();
            if after_len == 0.0 {
                return None;
            }

            let cos = before.dot(&after) / (before_len * after_len);
            if cos <= 0.0 {
                return None;
            }
            worst = worst.max(1.0 - cos);
        }

        Some(worst)
    }

    /// No re-pointed face may duplicate a face at the survivor, and no edge
    /// at the survivor may end up with more than two faces
    fn keeps_edges_manifold(&self, collapse: Collapse) -> bool {
        let Collapse { kept, removed } = collapse;

        let moved: Vec<[usize; 3]> = self
            .faces_around(removed)
            .filter(|(_, face)| !face.contains(&kept))
            .map(|(_, face)| face.map(|v| if v == removed { kept } else { v }))
            .collect();

        let staying: Vec<[usize; 3]> = self
            .faces_around(kept)
            .filter(|(_, face)| !face.contains(&removed))
            .map(|(_, face)| face)
            .collect();

        let same_face = |x: &[usize; 3], y: &[usize; 3]| {
            let mut x = *x;
            let mut y = *y;
            x.sort_unstable();
            y.sort_unstable();
            x == y
        };
        if moved
            .iter()
            .any(|m| staying.iter().any(|s| same_face(m, s)))
        {
            return false;
        }

        let spokes: AHashSet<usize> = moved
            .iter()
            .flat_map(|face| face.iter().copied())
            .filter(|&v| v != kept)
            .collect();

        spokes.into_iter().all(|other| {
            let count = moved
                .iter()
                .chain(staying.iter())
                .filter(|face| face.contains(&other))
                .count();
            count <= 2
        })
    }

    fn normal(&self, face: [usize; 3]) -> Vector3<f64> {
        let p0 = &self.vertices[face[0]].position;
        let p1 = &self.vertices[face[1]].position;
        let p2 = &self.vertices[face[2]].position;
        (p1 - p0).cross(&(p2 - p0))
    }

    fn apply(&mut self, collapse: Collapse) {
        let Collapse { kept, removed } = collapse;
        let around: Vec<usize> = std::mem::take(&mut self.incident[removed]);

        for face_index in around {
            let Some(face) = self.faces[face_index] else {
                continue;
            };
            if !face.contains(&removed) {
                continue;
            }

            if face.contains(&kept) {
                self.faces[face_index] = None;
            } else {
                self.faces[face_index] =
                    Some(face.map(|v| if v == removed { kept } else { v }));
                self.incident[kept].push(face_index);
            }
        }
    }
}
