//! Dungeon generation and autoplay throughput.
//!
//! ```bash
//! cargo bench --bench generation
//! ```

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use delve::{AutoplayPolicy, Bestiary, DungeonGenerator, GameState, GenerationConfig, Generator, PlayerClass};

fn bench_generation(c: &mut Criterion) {
    let generator = DungeonGenerator::new();
    let mut group = c.benchmark_group("generate_graph");
    for levels in [10u32, 20, 40] {
        let config = GenerationConfig::with_shape("bench", levels, 3, 0.3);
        group.bench_with_input(BenchmarkId::from_parameter(levels), &config, |b, config| {
            b.iter(|| {
                let mut rng = config.create_rng();
                black_box(generator.generate(config, &mut rng).unwrap())
            })
        });
    }
    group.finish();
}

fn bench_autoplay(c: &mut Criterion) {
    let runtime = tokio::runtime::Runtime::new().unwrap();
    let provider = Bestiary::new();
    c.bench_function("autoplay_run_10_levels", |b| {
        b.iter(|| {
            let mut state =
                GameState::new(GenerationConfig::for_testing("bench"), "Bot", PlayerClass::Fighter).unwrap();
            let report = runtime
                .block_on(AutoplayPolicy::new().run(&mut state, &provider, 5_000))
                .unwrap();
            black_box(report)
        })
    });
}

criterion_group!(benches, bench_generation, bench_autoplay);
criterion_main!(benches);
