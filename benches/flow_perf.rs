//! Benchmark: path search, assembly and water propagation.
//!
//! Every benchmark seeds its own `StdRng` so runs are comparable.

use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use rand::rngs::StdRng;
use rand::SeedableRng;
use reflow::assemble::LevelAssembler;
use reflow::flow;
use reflow::{Cell, Direction, Grid, Openings, PathBuilder, Piece};

fn level(width: usize, height: usize, empty: usize, seed: u64) -> Grid {
    let mut rng = StdRng::seed_from_u64(seed);
    let blank = Grid::new(width, height);
    let path = PathBuilder::new(width, height, blank.start(), blank.end())
        .build_path(&mut rng)
        .expect("path");
    LevelAssembler::new(width, height)
        .assemble(&path, empty, &mut rng)
        .expect("assemble")
}

/// Default-sized level, the case the game hits every check interval.
fn bench_propagate_6x6(c: &mut Criterion) {
    let grid = level(6, 6, 5, 7);
    c.bench_function("propagate_6x6", |b| {
        b.iter_batched(
            || grid.clone(),
            |mut grid| {
                black_box(flow::propagate(&mut grid));
            },
            BatchSize::SmallInput,
        );
    });
}

/// Every cell a cross: water reaches the whole grid.
fn bench_propagate_full_cross_128(c: &mut Criterion) {
    let mut grid = Grid::new(128, 128);
    let cross: Openings = Direction::ALL.into_iter().collect();
    let cells: Vec<Cell> = grid.cells().collect();
    for cell in cells {
        grid.place(Piece::new(cell, cross));
    }
    c.bench_function("propagate_full_cross_128x128", |b| {
        b.iter_batched(
            || grid.clone(),
            |mut grid| {
                black_box(flow::propagate(&mut grid));
            },
            BatchSize::SmallInput,
        );
    });
}

fn bench_connects_64(c: &mut Criterion) {
    let grid = level(64, 64, 100, 11);
    c.bench_function("connects_64x64", |b| {
        b.iter(|| black_box(flow::connects(black_box(&grid))));
    });
}

fn bench_build_path(c: &mut Criterion) {
    let mut group = c.benchmark_group("build_path");
    for size in [6usize, 16, 40] {
        let blank = Grid::new(size, size);
        let builder = PathBuilder::new(size, size, blank.start(), blank.end());
        group.bench_function(format!("{size}x{size}"), |b| {
            let mut rng = StdRng::seed_from_u64(3);
            b.iter(|| black_box(builder.build_path(&mut rng)));
        });
    }
    group.finish();
}

fn bench_generate_level(c: &mut Criterion) {
    c.bench_function("generate_level_6x6", |b| {
        let mut seed = 0u64;
        b.iter(|| {
            seed += 1;
            black_box(level(6, 6, 5, seed));
        });
    });
}

criterion_group!(
    benches,
    bench_propagate_6x6,
    bench_propagate_full_cross_128,
    bench_connects_64,
    bench_build_path,
    bench_generate_level,
);
criterion_main!(benches);
