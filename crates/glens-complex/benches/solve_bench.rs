//! Criterion microbenches for the solve pipeline and its hot paths.
//!
//! - adjacency: single neighbour query on a cold oracle.
//! - solve: full resolution of the subdivided-tetrahedron fixture.
//! - scene: emission with the wire frame enabled.
//!
//! Results live under `target/criterion`.

use criterion::{criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion};
use glens_complex::adjacency::{AdjacencyOracle, OracleCfg};
use glens_complex::complex::Complex;
use glens_complex::geom::GeomCfg;
use glens_complex::scene::{emit, SceneCfg};
use glens_complex::solver::{solve, SolveCfg};
use nalgebra::Vector3;
use rand::rngs::StdRng;
use rand::SeedableRng;

/// Tetrahedron subdivided around its centroid; the centroid's apparent
/// position is displaced so no face degenerates to a window.
fn fixture() -> Complex {
    let a = Vector3::new(0.0, 0.0, 0.0);
    let b = Vector3::new(1.0, 0.0, 0.0);
    let c = Vector3::new(0.5, 1.0, 0.0);
    let d = Vector3::new(0.5, 0.35, 0.9);
    let e = (a + b + c + d) / 4.0;
    let physical = vec![a, b, c, d, e];
    let mut em = physical.clone();
    em[4] += Vector3::new(0.05, 0.02, 0.03);
    let faces = vec![
        vec![0, 2, 1],
        vec![0, 1, 3],
        vec![0, 3, 2],
        vec![1, 2, 3],
        vec![0, 1, 4],
        vec![0, 2, 4],
        vec![0, 3, 4],
        vec![1, 2, 4],
        vec![1, 3, 4],
        vec![2, 3, 4],
    ];
    Complex::new(physical, em, faces, GeomCfg::default()).unwrap()
}

fn bench_solve(c: &mut Criterion) {
    let mut group = c.benchmark_group("solve");
    let complex = fixture();

    group.bench_function(BenchmarkId::new("adjacency_query", "cold"), |b| {
        b.iter_batched(
            || AdjacencyOracle::new(&complex, OracleCfg::default(), StdRng::seed_from_u64(1)),
            |mut oracle| {
                let _ = oracle
                    .find_neighbour(4, complex.face_normal(4))
                    .unwrap();
            },
            BatchSize::SmallInput,
        )
    });

    group.bench_function(BenchmarkId::new("solve_full", "tetra10"), |b| {
        b.iter(|| {
            let _ = solve(&complex, SolveCfg::default()).unwrap();
        })
    });

    group.bench_function(BenchmarkId::new("emit_scene", "framed"), |b| {
        b.iter_batched(
            || solve(&complex, SolveCfg::default()).unwrap(),
            |solution| {
                let cfg = SceneCfg::new(0.9).with_frame(0.01, 0u8);
                let _ = emit(&complex, &solution, &cfg).unwrap();
            },
            BatchSize::SmallInput,
        )
    });

    group.finish();
}

criterion_group!(benches, bench_solve);
criterion_main!(benches);
