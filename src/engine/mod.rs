// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Boolean engines
//!
//! A [`BooleanEngine`] owns two operand meshes and an operation, hands them
//! to a [`BooleanKernel`] and cleans whatever the kernel returns. Engines are
//! built by name through [`create`] or an [`EngineRegistry`].

#[cfg(feature = "bsp")]
mod bsp;
#[cfg(feature = "raycast")]
mod raycast;
mod registry;

#[cfg(feature = "bsp")]
pub use bsp::BspKernel;
#[cfg(feature = "raycast")]
pub use raycast::RaycastKernel;
pub use registry::{available_engines, create, EngineRegistry, KernelConstructor};

use crate::cleanup::{CleanupPipeline, CleanupReport};
use crate::config::EngineConfig;
use crate::error::{EngineError, EngineResult};
use crate::geometry::Mesh;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BooleanOp {
    Union,
    Intersection,
    Difference,
    SymmetricDifference,
}

impl BooleanOp {
    pub const ALL: [BooleanOp; 4] = [
        BooleanOp::Union,
        BooleanOp::Intersection,
        BooleanOp::Difference,
        BooleanOp::SymmetricDifference,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BooleanOp::Union => "union",
            BooleanOp::Intersection => "intersection",
            BooleanOp::Difference => "difference",
            BooleanOp::SymmetricDifference => "symmetric_difference",
        }
    }
}

impl fmt::Display for BooleanOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BooleanOp {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "union" => Ok(BooleanOp::Union),
            "intersection" => Ok(BooleanOp::Intersection),
            "difference" => Ok(BooleanOp::Difference),
            "symmetric_difference" | "xor" => Ok(BooleanOp::SymmetricDifference),
            other => Err(EngineError::Config(format!(
                "unknown boolean operation: {other}"
            ))),
        }
    }
}

/// A boolean computation backend
///
/// Kernels may return raw output: duplicated vertices, near-zero edges and
/// unreferenced vertices are all acceptable, the engine cleans them up.
pub trait BooleanKernel: Send + Sync {
    /// Registry name of the kernel
    fn name(&self) -> &str;

    fn compute(&self, a: &Mesh, b: &Mesh, op: BooleanOp) -> EngineResult<Mesh>;
}

/// Runs a kernel on two operands and cleans its output
pub struct BooleanEngine {
    kernel: Box<dyn BooleanKernel>,
    mesh_a: Mesh,
    mesh_b: Mesh,
    operation: BooleanOp,
    config: EngineConfig,
    result: Option<Mesh>,
    report: Option<CleanupReport>,
}

impl fmt::Debug for BooleanEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BooleanEngine")
            .field("kernel", &self.kernel.name())
            .field("operation", &self.operation)
            .field("mesh_a", &self.mesh_a.triangle_count())
            .field("mesh_b", &self.mesh_b.triangle_count())
            .field("has_result", &self.result.is_some())
            .finish()
    }
}

impl BooleanEngine {
    pub fn new(kernel: Box<dyn BooleanKernel>) -> Self {
        Self {
            kernel,
            mesh_a: Mesh::new(),
            mesh_b: Mesh::new(),
            operation: BooleanOp::Union,
            config: EngineConfig::default(),
            result: None,
            report: None,
        }
    }

    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self.invalidate();
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn kernel_name(&self) -> &str {
        self.kernel.name()
    }

    pub fn set_mesh_a(&mut self, mesh: Mesh) {
        self.mesh_a = mesh;
        self.invalidate();
    }

    pub fn set_mesh_b(&mut self, mesh: Mesh) {
        self.mesh_b = mesh;
        self.invalidate();
    }

    pub fn set_operation(&mut self, op: BooleanOp) {
        self.operation = op;
        self.invalidate();
    }

    pub fn operation(&self) -> BooleanOp {
        self.operation
    }

    pub fn mesh_a(&self) -> &Mesh {
        &self.mesh_a
    }

    pub fn mesh_b(&self) -> &Mesh {
        &self.mesh_b
    }

    /// Run the configured operation and clean the kernel output
    ///
    /// On failure the previous result is discarded and no cleanup runs.
    pub fn run(&mut self) -> EngineResult<&Mesh> {
        self.invalidate();

        self.mesh_a
            .validate()
            .map_err(|err| EngineError::geometry(format!("operand A: {err}")))?;
        self.mesh_b
            .validate()
            .map_err(|err| EngineError::geometry(format!("operand B: {err}")))?;

        debug!(
            kernel = self.kernel.name(),
            op = %self.operation,
            a_faces = self.mesh_a.triangle_count(),
            b_faces = self.mesh_b.triangle_count(),
            "Running boolean kernel"
        );

        let raw = self
            .kernel
            .compute(&self.mesh_a, &self.mesh_b, self.operation)
            .inspect_err(|err| warn!(kernel = self.kernel.name(), %err, "Boolean kernel failed"))?;

        raw.validate().map_err(|err| {
            EngineError::geometry(format!("kernel {} returned an invalid mesh: {err}", self.kernel.name()))
        })?;

        let (cleaned, report) = self.clean_up(raw);
        self.report = Some(report);
        Ok(self.result.insert(cleaned))
    }

    /// Dedup, then short edges, then isolated vertices
    fn clean_up(&self, mesh: Mesh) -> (Mesh, CleanupReport) {
        CleanupPipeline::new(&self.config.cleanup).run(mesh)
    }

    pub fn compute_union(&mut self) -> EngineResult<&Mesh> {
        self.set_operation(BooleanOp::Union);
        self.run()
    }

    pub fn compute_intersection(&mut self) -> EngineResult<&Mesh> {
        self.set_operation(BooleanOp::Intersection);
        self.run()
    }

    pub fn compute_difference(&mut self) -> EngineResult<&Mesh> {
        self.set_operation(BooleanOp::Difference);
        self.run()
    }

    pub fn compute_symmetric_difference(&mut self) -> EngineResult<&Mesh> {
        self.set_operation(BooleanOp::SymmetricDifference);
        self.run()
    }

    /// Cleaned mesh of the last successful run
    pub fn result(&self) -> EngineResult<&Mesh> {
        self.result.as_ref().ok_or(EngineError::NoResult)
    }

    pub fn vertices(&self) -> EngineResult<Vec<[f64; 3]>> {
        self.result().map(Mesh::raw_vertices)
    }

    pub fn faces(&self) -> EngineResult<Vec<[usize; 3]>> {
        self.result().map(Mesh::raw_faces)
    }

    pub fn report(&self) -> EngineResult<&CleanupReport> {
        self.report.as_ref().ok_or(EngineError::NoResult)
    }

    /// Take ownership of the cleaned mesh
    pub fn into_result(self) -> EngineResult<Mesh> {
        self.result.ok_or(EngineError::NoResult)
    }

    fn invalidate(&mut self) {
        self.result = None;
        self.report = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Primitive;
    use nalgebra::Vector3;

    /// Concatenates both operands regardless of the operation
    struct ConcatKernel;

    impl BooleanKernel for ConcatKernel {
        fn name(&self) -> &str {
            "concat"
        }

        fn compute(&self, a: &Mesh, b: &Mesh, _op: BooleanOp) -> EngineResult<Mesh> {
            let mut mesh = a.clone();
            mesh.merge(b);
            Ok(mesh)
        }
    }

    struct FailingKernel;

    impl BooleanKernel for FailingKernel {
        fn name(&self) -> &str {
            "failing"
        }

        fn compute(&self, _a: &Mesh, _b: &Mesh, _op: BooleanOp) -> EngineResult<Mesh> {
            Err(EngineError::geometry("tree too deep"))
        }
    }

    fn cube() -> Mesh {
        Primitive::cube(Vector3::new(1.0, 1.0, 1.0), false).to_mesh()
    }

    #[test]
    fn test_parse_operation() {
        assert_eq!("union".parse::<BooleanOp>().unwrap(), BooleanOp::Union);
        assert_eq!("XOR".parse::<BooleanOp>().unwrap(), BooleanOp::SymmetricDifference);
        assert_eq!(
            "symmetric_difference".parse::<BooleanOp>().unwrap(),
            BooleanOp::SymmetricDifference
        );
        assert!("merge".parse::<BooleanOp>().is_err());

        for op in BooleanOp::ALL {
            assert_eq!(op.to_string().parse::<BooleanOp>().unwrap(), op);
        }
    }

    #[test]
    fn test_accessors_before_run() {
        let engine = BooleanEngine::new(Box::new(ConcatKernel));
        assert_eq!(engine.result().unwrap_err(), EngineError::NoResult);
        assert_eq!(engine.vertices().unwrap_err(), EngineError::NoResult);
        assert_eq!(engine.faces().unwrap_err(), EngineError::NoResult);
        assert_eq!(engine.report().unwrap_err(), EngineError::NoResult);
    }

    #[test]
    fn test_run_cleans_kernel_output() {
        let mut engine = BooleanEngine::new(Box::new(ConcatKernel));
        engine.set_mesh_a(cube());
        engine.set_mesh_b(Mesh::new());

        let result = engine.compute_union().unwrap();
        assert_eq!(result.vertex_count(), 8);
        assert_eq!(result.triangle_count(), 12);

        let report = engine.report().unwrap();
        assert_eq!(report.vertices_merged, 28);
        assert_eq!(engine.vertices().unwrap().len(), 8);
        assert_eq!(engine.faces().unwrap().len(), 12);
    }

    #[test]
    fn test_setting_input_invalidates_result() {
        let mut engine = BooleanEngine::new(Box::new(ConcatKernel));
        engine.set_mesh_a(cube());
        engine.run().unwrap();
        assert!(engine.result().is_ok());

        engine.set_operation(BooleanOp::Difference);
        assert_eq!(engine.result().unwrap_err(), EngineError::NoResult);
    }

    #[test]
    fn test_kernel_failure_leaves_no_result() {
        let mut engine = BooleanEngine::new(Box::new(FailingKernel));
        engine.set_mesh_a(cube());
        let err = engine.run().unwrap_err();
        assert!(matches!(err, EngineError::GeometryComputation(_)));
        assert_eq!(engine.result().unwrap_err(), EngineError::NoResult);
        assert_eq!(engine.report().unwrap_err(), EngineError::NoResult);
    }

    #[test]
    fn test_malformed_input_rejected() {
        let mut engine = BooleanEngine::new(Box::new(ConcatKernel));
        engine.set_mesh_a(Mesh::from_raw(vec![[0.0, 0.0, 0.0]], vec![[0, 1, 2]]));

        let err = engine.run().unwrap_err();
        assert!(matches!(err, EngineError::GeometryComputation(ref msg) if msg.contains("operand A")));
        assert!(engine.result().is_err());
    }

    #[test]
    fn test_config_tolerances_reach_cleanup() {
        let mut config = EngineConfig::default();
        config.cleanup.vertex_merge_tolerance = 0.0;

        let mut engine = BooleanEngine::new(Box::new(ConcatKernel)).with_config(config);
        engine.set_mesh_a(cube());
        let result = engine.run().unwrap();

        // Nothing merges with a zero tolerance
        assert_eq!(result.vertex_count(), 36);
        assert_eq!(engine.kernel_name(), "concat");
    }
}
