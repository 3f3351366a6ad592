use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use hadronstore::idset::IdSet;

fn bench_insert(c: &mut Criterion) {
    let mut group = c.benchmark_group("idset/insert");
    for &n in &[64usize, 1024, 10_000, 100_000] {
        group.bench_with_input(BenchmarkId::new("dense", n), &n, |b, &n| {
            b.iter(|| {
                let mut set = IdSet::new();
                for id in 0..n as u32 {
                    black_box(set.insert(id));
                }
                set
            });
        });
        group.bench_with_input(BenchmarkId::new("sparse", n), &n, |b, &n| {
            b.iter(|| {
                let mut set = IdSet::new();
                for i in 0..n as u32 {
                    black_box(set.insert(i.wrapping_mul(2_654_435_761)));
                }
                set
            });
        });
    }
    group.finish();
}

fn bench_set_ops(c: &mut Criterion) {
    let mut a = IdSet::new();
    let mut b = IdSet::new();
    for id in 0..50_000u32 {
        a.insert(id * 2);
        b.insert(id * 2 + 1);
    }

    let mut group = c.benchmark_group("idset/ops");
    group.bench_function("union", |bencher| {
        bencher.iter(|| black_box(a.union(&b)));
    });
    group.bench_function("intersect", |bencher| {
        bencher.iter(|| black_box(a.intersect(&b)));
    });
    group.bench_function("fetch_range", |bencher| {
        bencher.iter(|| black_box(a.fetch(1000, 500)));
    });
    group.finish();
}

criterion_group!(benches, bench_insert, bench_set_ops);
criterion_main!(benches);
