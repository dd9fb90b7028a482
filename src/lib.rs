// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! meshbool
//!
//! Boolean operations on triangle meshes behind interchangeable kernels,
//! followed by a repair pipeline that welds duplicate vertices, collapses
//! short edges and drops orphaned vertices.
//!
//! ```no_run
//! use meshbool::{create, BooleanOp, Primitive};
//! use nalgebra::Vector3;
//!
//! let mut engine = create("bsp")?;
//! engine.set_mesh_a(Primitive::cube(Vector3::new(2.0, 2.0, 2.0), true).to_mesh());
//! engine.set_mesh_b(Primitive::sphere(1.2, 16).to_mesh());
//! engine.set_operation(BooleanOp::Difference);
//! let mesh = engine.run()?;
//! println!("{} triangles", mesh.triangle_count());
//! # Ok::<(), meshbool::EngineError>(())
//! ```

pub mod cleanup;
pub mod config;
pub mod engine;
pub mod error;
pub mod geometry;

pub use cleanup::{CleanupPipeline, CleanupReport};
pub use config::{CleanupConfig, EngineConfig};
pub use engine::{available_engines, create, BooleanEngine, BooleanKernel, BooleanOp, EngineRegistry};
pub use error::{EngineError, EngineResult};
pub use geometry::{BoundingBox, Mesh, Primitive, Triangle, Vertex};

/// Run one boolean operation with a built-in engine and default settings
pub fn boolean(engine: &str, a: Mesh, b: Mesh, op: BooleanOp) -> EngineResult<Mesh> {
    let mut engine = create(engine)?;
    engine.set_mesh_a(a);
    engine.set_mesh_b(b);
    engine.set_operation(op);
    engine.run()?;
    engine.into_result()
}
