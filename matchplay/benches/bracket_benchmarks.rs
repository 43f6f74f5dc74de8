use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use matchplay::bracket::{BracketBuilder, seeding_order};
use std::hint::black_box;

const SIZES: [u32; 3] = [8, 16, 32];

/// Benchmark seed-spacing order for large first rounds
fn bench_seeding_order(c: &mut Criterion) {
    let mut group = c.benchmark_group("seeding_order");

    for n in [4usize, 16, 256, 4096].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(n), n, |b, &n| {
            b.iter(|| seeding_order(black_box(n)));
        });
    }

    group.finish();
}

/// Benchmark building full brackets with a fixed seeding
fn bench_build_full(c: &mut Criterion) {
    let mut group = c.benchmark_group("build_full_bracket");

    for size in SIZES.iter() {
        let builder = BracketBuilder::new(*size).unwrap();
        let users: Vec<i64> = (1..=*size as i64).collect();
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{}_slots", size)),
            &users,
            |b, users| {
                b.iter(|| builder.build_seeded(black_box(users)));
            },
        );
    }

    group.finish();
}

/// Benchmark sparse brackets, where most of the work is settling byes and dead paths
fn bench_build_sparse(c: &mut Criterion) {
    let mut group = c.benchmark_group("build_sparse_bracket");

    for size in SIZES.iter() {
        let builder = BracketBuilder::new(*size).unwrap();
        let users: Vec<i64> = (1..=(*size as i64 / 4) + 1).collect();
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{}_of_{}", users.len(), size)),
            &users,
            |b, users| {
                b.iter(|| builder.build_seeded(black_box(users)));
            },
        );
    }

    group.finish();
}

/// Benchmark the shuffled build used when closing check-in
fn bench_build_shuffled(c: &mut Criterion) {
    let builder = BracketBuilder::new(32).unwrap();
    let users: Vec<i64> = (1..=27).collect();
    let mut rng = rand::rng();

    c.bench_function("build_shuffled_27_of_32", |b| {
        b.iter(|| builder.build(black_box(&users), &mut rng));
    });
}

criterion_group!(seeding, bench_seeding_order);

criterion_group!(
    construction,
    bench_build_full,
    bench_build_sparse,
    bench_build_shuffled,
);

criterion_main!(seeding, construction);
