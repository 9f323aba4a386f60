/*
 * Flock Simulation Benchmark
 *
 * This file contains benchmarks for the flock simulation to identify performance bottlenecks.
 * It measures neighbor queries against both proximity databases and the
 * overall update loop with each of them.
 */

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use glam::Vec3;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::time::Duration;

use boid_flock::{Flock, FlockParams, IndexKind, ProximityDatabase};

const SIZES: [usize; 4] = [100, 500, 1000, 2000];

fn databases() -> [(&'static str, ProximityDatabase<usize>); 2] {
    let grid = ProximityDatabase::from_kind(&IndexKind::default()).expect("default grid is valid");
    [("brute_force", ProximityDatabase::brute_force()), ("locality_grid", grid)]
}

// Benchmark neighbor queries against both databases
fn bench_proximity_queries(c: &mut Criterion) {
    let mut group = c.benchmark_group("proximity_queries");

    for (name, database) in databases() {
        for n in SIZES {
            let mut rng = StdRng::seed_from_u64(42);
            let positions: Vec<Vec3> = (0..n)
                .map(|_| Vec3::new(rng.gen_range(-16.0..16.0), 0.0, rng.gen_range(-13.0..13.0)))
                .collect();
            let tokens: Vec<_> = positions
                .iter()
                .enumerate()
                .map(|(id, &p)| {
                    let mut token = database.allocate_token(id);
                    token.update_for_new_position(p);
                    token
                })
                .collect();

            group.bench_with_input(BenchmarkId::new(name, n), &positions, |b, positions| {
                let mut results = Vec::new();
                b.iter(|| {
                    for &p in positions {
                        results.clear();
                        database.find_neighbors(p, 1.0, &mut results);
                        black_box(results.len());
                    }
                });
            });

            drop(tokens);
        }
    }

    group.finish();
}

// Benchmark the overall update loop
fn bench_update_loop(c: &mut Criterion) {
    let mut group = c.benchmark_group("update_loop");

    for (name, index) in [("brute_force", IndexKind::BruteForce), ("locality_grid", IndexKind::default())] {
        for n in SIZES {
            group.bench_with_input(BenchmarkId::new(name, n), &n, |b, &n| {
                let mut flock = Flock::open(FlockParams {
                    index,
                    seed: Some(7),
                    ..FlockParams::default()
                })
                .expect("valid flock");
                for _ in 0..n {
                    flock.add_boid();
                }

                b.iter(|| {
                    flock.update(black_box(1.0 / 60.0));
                });
            });
        }
    }

    group.finish();
}

// Configure the benchmarks
criterion_group! {
    name = benches;
    config = Criterion::default()
        .sample_size(10)
        .measurement_time(Duration::from_secs(5))
        .warm_up_time(Duration::from_secs(1));
    targets = bench_proximity_queries, bench_update_loop
}
criterion_main!(benches);
