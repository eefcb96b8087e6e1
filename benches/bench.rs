//! Criterion benchmarks for the bibdex merge algebra and query parsing.

use std::hint::black_box;

use criterion::{Criterion, Throughput, criterion_group, criterion_main};

use bibdex::analysis::FieldAnalyzer;
use bibdex::query::setops::{difference, intersect, near_join, phrase_join, union};
use bibdex::query::{AliasTables, QueryParser};
use bibdex::schema::FieldSchema;
use bibdex::storage::Postings;

/// Every `step`-th identifier below `limit`.
fn strided(step: u32, limit: u32) -> Vec<u32> {
    (0..limit).step_by(step as usize).collect()
}

/// Positional postings with a few positions per document.
fn positional(step: u32, limit: u32, offset: u16) -> Postings {
    let uids = strided(step, limit);
    let positions = uids
        .iter()
        .map(|uid| {
            let base = (uid % 50) as u16;
            vec![base + offset, base + offset + 40, base + offset + 90]
        })
        .collect();
    Postings::with_positions(uids, positions)
}

fn bench_set_operations(c: &mut Criterion) {
    let a = strided(2, 1_000_000);
    let b = strided(3, 1_000_000);

    let mut group = c.benchmark_group("setops");
    group.throughput(Throughput::Elements((a.len() + b.len()) as u64));
    group.bench_function("intersect", |bench| {
        bench.iter(|| intersect(black_box(&a), black_box(&b)))
    });
    group.bench_function("union", |bench| bench.iter(|| union(black_box(&a), black_box(&b))));
    group.bench_function("difference", |bench| {
        bench.iter(|| difference(black_box(&a), black_box(&b)))
    });
    group.finish();
}

fn bench_positional_joins(c: &mut Criterion) {
    let start = positional(2, 200_000, 0);
    let next = positional(3, 200_000, 1);

    let mut group = c.benchmark_group("positional");
    group.throughput(Throughput::Elements((start.len() + next.len()) as u64));
    group.bench_function("phrase_join", |bench| {
        bench.iter(|| phrase_join(black_box(&start), black_box(&next), 1))
    });
    group.bench_function("near_join", |bench| {
        bench.iter(|| near_join(black_box(&start), 0, black_box(&next), 5))
    });
    group.finish();
}

fn bench_query_parsing(c: &mut Criterion) {
    let schema = FieldSchema::bibliographic();
    let analyzer = FieldAnalyzer::default();
    let aliases = AliasTables::new();
    let parser = QueryParser::new(&schema, &analyzer, &aliases);

    c.bench_function("parse_query", |bench| {
        bench.iter(|| {
            parser.parse(black_box(
                "(\"tn3 transposition\" | resolvase ~5 site) & 1980:1990[YEAR] ! smith j[AUTH]",
            ))
        })
    });
}

criterion_group!(
    benches,
    bench_set_operations,
    bench_positional_joins,
    bench_query_parsing
);
criterion_main!(benches);
