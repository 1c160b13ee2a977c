// Copyright 2025 John Brosnihan
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//! Benchmarks for the collision pipeline
//!
//! These benchmarks measure:
//! - Broad-phase detection over all pairs
//! - Resolution of a freshly detected field
//! - A full simulation step including the bounds refresh

use anomaloid_engine::collision::{detect_collisions, resolve_collisions};
use anomaloid_engine::config::{SimulationConfig, SpawnConfig};
use anomaloid_engine::ecs::World;
use anomaloid_engine::random::SeededRandom;
use anomaloid_engine::spawner::Spawner;
use anomaloid_engine::Simulation;
use criterion::{black_box, criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion, Throughput};

fn populated_world(count: usize) -> World {
    let spawner = Spawner::new(SpawnConfig::default()).unwrap();
    let mut world = World::new();
    let mut rng = SeededRandom::from_seed(count as u64);
    spawner.spawn_many(&mut world, &mut rng, count).unwrap();
    world
}

/// Benchmark: one detection pass over N bodies
fn bench_detection(c: &mut Criterion) {
    let mut group = c.benchmark_group("detection");

    for count in [10, 40, 100, 400].iter() {
        let pairs = count * (count - 1) / 2;
        group.throughput(Throughput::Elements(pairs as u64));
        group.bench_with_input(BenchmarkId::from_parameter(count), count, |b, &count| {
            b.iter_batched(
                || populated_world(count),
                |mut world| black_box(detect_collisions(&mut world).unwrap()),
                BatchSize::SmallInput,
            );
        });
    }

    group.finish();
}

/// Benchmark: resolving the pairs a detection pass recorded
fn bench_resolution(c: &mut Criterion) {
    let mut group = c.benchmark_group("resolution");

    for count in [10, 40, 100, 400].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(count), count, |b, &count| {
            b.iter_batched(
                || {
                    let mut world = populated_world(count);
                    detect_collisions(&mut world).unwrap();
                    world
                },
                |mut world| black_box(resolve_collisions(&mut world).unwrap()),
                BatchSize::SmallInput,
            );
        });
    }

    group.finish();
}

/// Benchmark: populate plus one full step
fn bench_simulation_step(c: &mut Criterion) {
    let mut group = c.benchmark_group("simulation_step");

    for count in [40, 200].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(count), count, |b, &count| {
            b.iter_batched(
                || {
                    let config = SimulationConfig::default().with_count(count).with_seed(3);
                    let mut sim = Simulation::new(config).unwrap();
                    sim.populate().unwrap();
                    sim
                },
                |mut sim| black_box(sim.step().unwrap()),
                BatchSize::SmallInput,
            );
        });
    }

    group.finish();
}

criterion_group!(benches, bench_detection, bench_resolution, bench_simulation_step);
criterion_main!(benches);
