use chunk_rope::Rope;
use criterion::{BatchSize, BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use std::hint::black_box;

const SIZES: [usize; 3] = [1_000, 10_000, 100_000];

fn sample_text(size: usize) -> String {
    "lorem ipsum dolor sit amet ".chars().cycle().take(size).collect()
}

fn bench_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("build");

    for size in SIZES {
        let text = sample_text(size);
        group.throughput(Throughput::Bytes(size as u64));

        for capacity in [16, 128, 1024] {
            group.bench_with_input(
                BenchmarkId::new(format!("chunk_rope/{capacity}"), size),
                &text,
                |b, text| b.iter(|| Rope::from_str_with_capacity(black_box(text), capacity)),
            );
        }

        group.bench_with_input(BenchmarkId::new("ropey", size), &text, |b, text| {
            b.iter(|| ropey::Rope::from_str(black_box(text)))
        });
    }
    group.finish();
}

fn bench_insert(c: &mut Criterion) {
    let mut group = c.benchmark_group("insert");
    let insert_text = "INSERTED";

    for size in SIZES {
        let text = sample_text(size);
        group.throughput(Throughput::Elements(1));

        for (label, at) in [("front", 0), ("middle", size / 2), ("end", size)] {
            group.bench_with_input(
                BenchmarkId::new(format!("chunk_rope_{label}"), size),
                &at,
                |b, &at| {
                    b.iter_batched(
                        || Rope::from(text.as_str()),
                        |rope| {
                            rope.insert_str(black_box(at), black_box(insert_text))
                                .unwrap();
                            rope
                        },
                        BatchSize::SmallInput,
                    )
                },
            );

            group.bench_with_input(
                BenchmarkId::new(format!("ropey_{label}"), size),
                &at,
                |b, &at| {
                    b.iter_batched(
                        || ropey::Rope::from_str(&text),
                        |mut rope| {
                            rope.insert(black_box(at), black_box(insert_text));
                            rope
                        },
                        BatchSize::SmallInput,
                    )
                },
            );
        }
    }
    group.finish();
}

fn bench_remove(c: &mut Criterion) {
    let mut group = c.benchmark_group("remove");

    for size in SIZES {
        let text = sample_text(size);
        let span = size / 2 - size / 20..size / 2 + size / 20;
        group.throughput(Throughput::Elements(span.len() as u64));

        group.bench_with_input(BenchmarkId::new("chunk_rope", size), &span, |b, span| {
            b.iter_batched(
                || Rope::from(text.as_str()),
                |rope| {
                    rope.remove_range(black_box(span.clone())).unwrap();
                    rope
                },
                BatchSize::SmallInput,
            )
        });

        group.bench_with_input(BenchmarkId::new("ropey", size), &span, |b, span| {
            b.iter_batched(
                || ropey::Rope::from_str(&text),
                |mut rope| {
                    rope.remove(black_box(span.clone()));
                    rope
                },
                BatchSize::SmallInput,
            )
        });
    }
    group.finish();
}

fn bench_search(c: &mut Criterion) {
    let mut group = c.benchmark_group("search");

    for size in SIZES {
        let mut text = sample_text(size);
        text.push_str("needle");
        let rope = Rope::from(text.as_str());
        group.throughput(Throughput::Bytes(text.len() as u64));

        group.bench_function(BenchmarkId::new("substring_index", size), |b| {
            b.iter(|| rope.substring_index_str(black_box("needle")))
        });
        group.bench_function(BenchmarkId::new("hash", size), |b| b.iter(|| rope.hash()));
        group.bench_function(BenchmarkId::new("string_find", size), |b| {
            b.iter(|| text.find(black_box("needle")))
        });
    }
    group.finish();
}

fn bench_combine(c: &mut Criterion) {
    let mut group = c.benchmark_group("combine");

    for size in SIZES {
        let text = sample_text(size);
        group.throughput(Throughput::Bytes(size as u64));

        group.bench_function(BenchmarkId::new("append_copy", size), |b| {
            let donor = Rope::from(text.as_str());
            b.iter_batched(
                || Rope::from("head"),
                |rope| {
                    rope.append(&donor);
                    rope
                },
                BatchSize::SmallInput,
            )
        });

        group.bench_function(BenchmarkId::new("append_destructive", size), |b| {
            b.iter_batched(
                || (Rope::from("head"), Rope::from(text.as_str())),
                |(rope, donor)| {
                    rope.append_destructive(donor).unwrap();
                    rope
                },
                BatchSize::SmallInput,
            )
        });

        group.bench_function(BenchmarkId::new("replace_all", size), |b| {
            b.iter_batched(
                || Rope::from(text.as_str()),
                |rope| rope.replace_all_str(black_box("ipsum"), black_box("IPSUM!")),
                BatchSize::SmallInput,
            )
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_build,
    bench_insert,
    bench_remove,
    bench_search,
    bench_combine
);
criterion_main!(benches);
