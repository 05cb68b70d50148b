//! Benchmarks for hex geometry and map generation.

#![allow(missing_docs)]

use std::hint::black_box;

use criterion::{Criterion, criterion_group, criterion_main};
use hexconquest::mapgen::generate_layout;
use hexconquest::{Coord, MapKind, MatchConfig};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

fn bench_distance(c: &mut Criterion) {
    let coords: Vec<Coord> = (0..64)
        .flat_map(|x| (0..64).map(move |y| Coord::new(x, y)))
        .collect();
    let origin = Coord::new(31, 31);

    c.bench_function("distance_64x64", |b| {
        b.iter(|| {
            let total: u32 = coords.iter().map(|&p| black_box(origin).distance(p)).sum();
            black_box(total)
        });
    });
}

fn bench_line(c: &mut Criterion) {
    c.bench_function("line_to_corner_to_corner", |b| {
        b.iter(|| black_box(Coord::new(0, 0)).line_to(black_box(Coord::new(99, 99))));
    });
}

fn bench_layout(c: &mut Criterion) {
    let mut group = c.benchmark_group("generate_layout");
    for (name, map) in [("full", MapKind::Full), ("circles", MapKind::Circles)] {
        let config = MatchConfig {
            width: 100,
            height: 100,
            map,
            ..MatchConfig::default()
        };
        group.bench_function(name, |b| {
            b.iter(|| {
                let mut rng = ChaCha8Rng::seed_from_u64(7);
                black_box(generate_layout(black_box(&config), &mut rng))
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_distance, bench_line, bench_layout);
criterion_main!(benches);
