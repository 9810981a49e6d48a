use criterion::{black_box, criterion_group, criterion_main, Criterion};
use ipcon_cidr::summarize;

fn bench_summarize(c: &mut Criterion) {
    c.bench_function("summarize_aligned_24", |b| {
        b.iter(|| summarize(black_box(0xC0A80000), black_box(0xC0A800FF)))
    });

    c.bench_function("summarize_worst_case", |b| {
        b.iter(|| summarize(black_box(1), black_box(u32::MAX - 1)))
    });

    c.bench_function("summarize_full_space", |b| {
        b.iter(|| summarize(black_box(0), black_box(u32::MAX)))
    });
}

criterion_group!(benches, bench_summarize);
criterion_main!(benches);
