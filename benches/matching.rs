//! Performance benchmarks for docsearch
//!
//! Run with: cargo bench

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use docsearch::index::decode::{decode_shard, escape_search_id, variable_name};
use docsearch::index::{Occurrence, SearchEntry, Shard};
use docsearch::query::{aggregate, match_entries};
use docsearch::utils::normalize;

const WORDS: &[&str] = &[
    "allocation", "allocator", "buffer", "budget", "callbacks", "defragmentation", "device",
    "heap", "image", "mapping", "memory", "pool", "statistics", "type", "usage", "virtual",
];

const CATEGORIES: &[&str] = &["page", "function", "struct", "enum value", "typedef"];

/// Deterministic "me"-bucket shard with `n` entries
fn synthetic_entries(n: usize) -> Vec<SearchEntry> {
    (0..n)
        .map(|i| {
            let key = format!(
                "memory {} {} {}",
                WORDS[i % WORDS.len()],
                WORDS[(i / WORDS.len()) % WORDS.len()],
                i
            );
            let occurrences = (0..1 + i % 3)
                .map(|j| {
                    Occurrence::new(format!("page_{}.html#{}", i, j), key.clone())
                        .with_category(CATEGORIES[(i + j) % CATEGORIES.len()])
                })
                .collect();
            SearchEntry::new(key, occurrences)
        })
        .collect()
}

fn synthetic_payload(entries: &[SearchEntry]) -> String {
    let rows: Vec<String> = entries
        .iter()
        .enumerate()
        .map(|(i, e)| {
            let occ: Vec<String> = e
                .occurrences
                .iter()
                .map(|o| {
                    format!(
                        "['{}','{}','{}']",
                        o.url,
                        o.label,
                        o.category.as_deref().unwrap_or("")
                    )
                })
                .collect();
            format!("['{}_{}',[{}]]", escape_search_id(&e.key), i, occ.join(","))
        })
        .collect();
    format!("var {}=\n[\n{}\n];\n", variable_name("me"), rows.join(",\n"))
}

fn bench_normalize(c: &mut Criterion) {
    c.bench_function("normalize", |b| {
        b.iter(|| normalize(black_box("  Memory   MAPPING  persistently ")))
    });
}

fn bench_matching(c: &mut Criterion) {
    let mut group = c.benchmark_group("match_entries");

    for size in [1_000, 10_000] {
        let entries = synthetic_entries(size);
        for query in ["mem", "mem map", "memory pool statistics"] {
            let tokens = normalize(query).tokens;
            group.bench_with_input(
                BenchmarkId::new(query, size),
                &tokens,
                |b, tokens| b.iter(|| match_entries(black_box(&entries), tokens)),
            );
        }
    }

    group.finish();
}

fn bench_aggregate(c: &mut Criterion) {
    let entries = synthetic_entries(10_000);
    let tokens = normalize("mem").tokens;
    let matches = match_entries(&entries, &tokens);

    c.bench_function("aggregate_10k", |b| {
        b.iter(|| aggregate(black_box(&matches), 15, 50))
    });
}

fn bench_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode_shard");

    for size in [100, 2_000] {
        let payload = synthetic_payload(&synthetic_entries(size));
        group.bench_with_input(BenchmarkId::from_parameter(size), &payload, |b, payload| {
            b.iter(|| {
                let shard: Shard = decode_shard("me", black_box(payload)).expect("valid payload");
                shard
            })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_normalize, bench_matching, bench_aggregate, bench_decode);
criterion_main!(benches);
