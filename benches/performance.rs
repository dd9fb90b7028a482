// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Performance benchmarks

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use meshbool::cleanup::{
    CleanupPipeline, DuplicatedVertexRemoval, IsolatedVertexRemoval, ShortEdgeRemoval,
};
use meshbool::{available_engines, create, BooleanOp, CleanupConfig, Mesh, Primitive};
use nalgebra::Vector3;

fn sphere(segments: u32) -> Mesh {
    Primitive::sphere(10.0, segments).to_mesh()
}

fn bench_cleanup_passes(c: &mut Criterion) {
    let mut group = c.benchmark_group("cleanup");

    for segments in [16u32, 32, 64] {
        let raw = sphere(segments);
        let welded = DuplicatedVertexRemoval::new(1e-6).run(raw.clone()).mesh;

        group.bench_with_input(BenchmarkId::new("dedup", segments), &raw, |b, mesh| {
            b.iter(|| DuplicatedVertexRemoval::new(1e-6).run(black_box(mesh.clone())))
        });

        group.bench_with_input(BenchmarkId::new("short_edge", segments), &welded, |b, mesh| {
            b.iter(|| ShortEdgeRemoval::new(0.5).run(black_box(mesh.clone())))
        });

        group.bench_with_input(BenchmarkId::new("isolated", segments), &raw, |b, mesh| {
            b.iter(|| IsolatedVertexRemoval::new().run(black_box(mesh.clone())))
        });

        group.bench_with_input(BenchmarkId::new("pipeline", segments), &raw, |b, mesh| {
            let pipeline = CleanupPipeline::new(&CleanupConfig::default());
            b.iter(|| pipeline.run(black_box(mesh.clone())))
        });
    }

    group.finish();
}

fn bench_engines(c: &mut Criterion) {
    let mut group = c.benchmark_group("engines");

    let cube = Primitive::cube(Vector3::new(16.0, 16.0, 16.0), true).to_mesh();
    let ball = sphere(12);

    for name in available_engines() {
        for op in [BooleanOp::Union, BooleanOp::Difference] {
            group.bench_function(BenchmarkId::new(name.as_str(), op), |b| {
                b.iter(|| {
                    let mut engine = create(&name).unwrap();
                    engine.set_mesh_a(black_box(cube.clone()));
                    engine.set_mesh_b(black_box(ball.clone()));
                    engine.set_operation(op);
                    engine.run().unwrap().triangle_count()
                })
            });
        }
    }

    group.finish();
}

criterion_group!(benches, bench_cleanup_passes, bench_engines);
criterion_main!(benches);
