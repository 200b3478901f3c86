//! Aggregation benchmarks
//!
//! Measures `compute_aggregate` across review set sizes seen in practice,
//! from a handful of reviews up to a very popular subject.
//!
//! Run with: `cargo bench --bench aggregate_benchmarks`

#![allow(missing_docs)] // Benchmarks don't need extensive docs
#![allow(clippy::expect_used)] // Benchmarks can use expect for setup

use chrono::{TimeZone, Utc};
use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use grade_core::aggregate::{average_grade, compute_aggregate, star_bucket};
use grade_core::review::{Review, ReviewId, ReviewType};

#[allow(clippy::cast_precision_loss)]
fn reviews(count: usize) -> Vec<Review> {
    let modified_at = Utc
        .with_ymd_and_hms(2025, 1, 1, 0, 0, 0)
        .single()
        .expect("valid timestamp");

    (0..count)
        .map(|i| Review {
            id: ReviewId::new(),
            comment: format!("review {i}"),
            grade: (i % 11) as f32 * 0.5,
            reviewer_id: format!("guest-{i}"),
            subject_id: "acc-1".to_string(),
            reviewer_name: String::new(),
            modified_at,
            review_type: ReviewType::Accommodation,
        })
        .collect()
}

/// Benchmark the full aggregate (mean + histogram)
fn benchmark_compute_aggregate(c: &mut Criterion) {
    let mut group = c.benchmark_group("compute_aggregate");

    for size in [10_usize, 1_000, 100_000] {
        let input = reviews(size);
        group.throughput(Throughput::Elements(size as u64));

        group.bench_with_input(BenchmarkId::new("summary", size), &input, |b, input| {
            b.iter(|| black_box(compute_aggregate(black_box(input))));
        });

        group.bench_with_input(BenchmarkId::new("average_only", size), &input, |b, input| {
            b.iter(|| black_box(average_grade(black_box(input))));
        });
    }

    group.finish();
}

/// Benchmark single-grade bucketing
fn benchmark_star_bucket(c: &mut Criterion) {
    c.bench_function("star_bucket", |b| {
        b.iter(|| black_box(star_bucket(black_box(3.7))));
    });
}

criterion_group!(benches, benchmark_compute_aggregate, benchmark_star_bucket);
criterion_main!(benches);
