// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Post-operation mesh repair
//!
//! Boolean kernels return meshes with duplicated vertices, sliver edges and
//! orphaned vertices. [`CleanupPipeline`] runs three passes over such a mesh
//! in a fixed order:
//!
//! 1. [`DuplicatedVertexRemoval`] welds vertices closer than the merge tolerance.
//! 2. [`ShortEdgeRemoval`] collapses edges shorter than the edge tolerance.
//! 3. [`IsolatedVertexRemoval`] drops vertices no face references.
//!
//! Each pass consumes the mesh produced by the previous one. Running the
//! pipeline on its own output changes nothing.

mod duplicated_vertex;
mod isolated_vertex;
mod short_edge;

pub use duplicated_vertex::{DedupOutcome, DuplicatedVertexRemoval};
pub use isolated_vertex::{IsolatedOutcome, IsolatedVertexRemoval};
pub use short_edge::{ShortEdgeOutcome, ShortEdgeRemoval};

use crate::config::CleanupConfig;
use crate::geometry::Mesh;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Counts collected while cleaning one mesh
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleanupReport {
    pub vertices_before: usize,
    pub faces_before: usize,
    /// Vertices welded into an earlier vertex
    pub vertices_merged: usize,
    /// Faces dropped because they became degenerate
    pub degenerate_faces_dropped: usize,
    pub edges_collapsed: usize,
    pub collapse_passes: usize,
    /// Short edges no valid collapse could remove, in output indices
    pub unresolved_edges: Vec<[usize; 2]>,
    pub isolated_vertices_removed: usize,
    pub vertices_after: usize,
    pub faces_after: usize,
}

impl CleanupReport {
    /// Whether the pipeline modified the mesh at all
    pub fn changed_mesh(&self) -> bool {
        self.vertices_merged > 0
            || self.degenerate_faces_dropped > 0
            || self.edges_collapsed > 0
            || self.isolated_vertices_removed > 0
    }
}

/// Dedup, short-edge and isolated-vertex passes run back to back
#[derive(Debug, Clone, PartialEq)]
pub struct CleanupPipeline {
    dedup: DuplicatedVertexRemoval,
    short_edge: ShortEdgeRemoval,
    isolated: IsolatedVertexRemoval,
}

impl Default for CleanupPipeline {
    fn default() -> Self {
        Self::new(&CleanupConfig::default())
    }
}

impl CleanupPipeline {
    pub fn new(config: &CleanupConfig) -> Self {
        Self {
            dedup: DuplicatedVertexRemoval::new(config.vertex_merge_tolerance),
            short_edge: ShortEdgeRemoval::new(config.short_edge_tolerance)
                .with_max_passes(config.max_collapse_passes),
            isolated: IsolatedVertexRemoval::new(),
        }
    }

    /// Run all three passes over `mesh`
    pub fn run(&self, mesh: Mesh) -> (Mesh, CleanupReport) {
        let mut report = CleanupReport {
            vertices_before: mesh.vertex_count(),
            faces_before: mesh.triangle_count(),
            ..Default::default()
        };

        let dedup = self.dedup.run(mesh);
        report.vertices_merged = dedup.merged;
        report.degenerate_faces_dropped = dedup.faces_dropped;

        let collapsed = self.short_edge.run(dedup.mesh);
        report.edges_collapsed = collapsed.collapsed;
        report.collapse_passes = collapsed.passes;
        report.degenerate_faces_dropped += collapsed.faces_removed;

        let isolated = self.isolated.run(collapsed.mesh);
        report.isolated_vertices_removed = isolated.removed;

        // Unresolved edges are reported against the compacted mesh
        report.unresolved_edges = collapsed
            .unresolved_edges
            .iter()
            .filter_map(|&[a, b]| Some([isolated.remap(a)?, isolated.remap(b)?]))
            .collect();

        let mesh = isolated.mesh;
        report.vertices_after = mesh.vertex_count();
        report.faces_after = mesh.triangle_count();

        info!(
            vertices_before = report.vertices_before,
            vertices_after = report.vertices_after,
            faces_before = report.faces_before,
            faces_after = report.faces_after,
            merged = report.vertices_merged,
            collapsed = report.edges_collapsed,
            isolated = report.isolated_vertices_removed,
            unresolved = report.unresolved_edges.len(),
            "Mesh cleanup complete"
        );

        (mesh, report)
    }
}
