//! Benchmarks for activity bucketing
//!
//! Run with: cargo bench

use chrono::{Duration, TimeZone, Utc};
use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use marginalia::activity::bucketing::bucket;
use marginalia::query::parse_query;
use marginalia::storage::{Annotation, Document};

fn create_test_annotations(count: usize) -> Vec<Annotation> {
    let now = Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap();
    (0..count)
        .map(|i| {
            let doc_id = format!("d{}", i % 50);
            let document = Document::new(
                doc_id.as_str(),
                format!("https://example{}.com/page/{}", i % 7, i % 50),
            )
            .with_title(format!("Page {}", i % 50));
            Annotation::new(
                format!("a{}", i),
                format!("acct:user{}@example.com", i % 13),
                "abc123",
                doc_id,
            )
            .tag(format!("tag{}", i % 5))
            .at(now - Duration::hours(i as i64 * 3))
            .document(document)
        })
        .collect()
}

fn bench_bucket(c: &mut Criterion) {
    let mut group = c.benchmark_group("bucket");
    let now = Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap();

    for size in [20, 200, 2000] {
        let annotations = create_test_annotations(size);

        group.throughput(Throughput::Elements(size as u64));

        group.bench_function(format!("bucket_{}", size), |b| {
            b.iter(|| bucket(black_box(annotations.clone()), now))
        });
    }

    group.finish();
}

fn bench_parse(c: &mut Criterion) {
    c.bench_function("parse_query", |b| {
        b.iter(|| {
            parse_query(black_box(
                r#"group:abc123 user:jane tag:"machine learning" uri:https://example.com/a free text"#,
            ))
            .unwrap()
        })
    });
}

criterion_group!(benches, bench_bucket, bench_parse);
criterion_main!(benches);
