//! Criterion benchmarks for the Quarry search engine.
//!
//! Covers text analysis, indexing, query execution, fuzzy and wildcard
//! expansion, facets and suggestions.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use quarry::analysis::AnalyzerRegistry;
use quarry::facet::FacetSpec;
use quarry::prelude::*;

const WORDS: &[&str] = &[
    "search",
    "engine",
    "full",
    "text",
    "index",
    "query",
    "document",
    "field",
    "term",
    "phrase",
    "boolean",
    "relevance",
    "score",
    "analysis",
    "tokenization",
    "stemming",
    "normalization",
    "ranking",
    "filtering",
    "retrieval",
    "posting",
    "dictionary",
    "fuzzy",
    "wildcard",
];

const CATEGORIES: &[&str] = &["books", "music", "garden", "tools", "toys"];

/// Generate test documents for benchmarking.
fn generate_test_documents(count: usize) -> Vec<Document> {
    (0..count)
        .map(|i| {
            let doc_length = 20 + (i % 60);
            let body: Vec<&str> = (0..doc_length)
                .map(|j| WORDS[(i * 7 + j * 13) % WORDS.len()])
                .collect();
            Document::builder()
                .id(format!("doc-{i}"))
                .text("body", body.join(" "))
                .keyword("category", CATEGORIES[i % CATEGORIES.len()])
                .number("price", (i % 500) as f64)
                .build()
                .expect("valid benchmark document")
        })
        .collect()
}

fn build_index(count: usize) -> Index {
    let config = IndexConfig::new()
        .with_field(FieldEntry::text("body"))
        .with_field(FieldEntry::keyword("category"))
        .with_field(FieldEntry::number("price"));
    let index = Index::new("bench", config).expect("index");
    index
        .add_bulk(generate_test_documents(count))
        .expect("bulk add");
    index
}

/// Benchmark text analysis.
fn bench_text_analysis(c: &mut Criterion) {
    let mut group = c.benchmark_group("text_analysis");
    let registry = AnalyzerRegistry::with_presets().expect("presets");
    let text = "The quick brown foxes were running over the lazy dogs in Zürich, \
                jumping between search engines and inverted indexes"
        .repeat(10);

    for name in ["standard", "english", "simple"] {
        let analyzer = registry.get(name).expect("preset");
        group.bench_with_input(BenchmarkId::new("analyze", name), &text, |b, text| {
            b.iter(|| black_box(analyzer.tokens(black_box(text))))
        });
    }
    group.finish();
}

/// Benchmark indexing throughput.
fn bench_indexing(c: &mut Criterion) {
    let mut group = c.benchmark_group("indexing");
    group.sample_size(20);

    for count in [100, 1000] {
        group.throughput(Throughput::Elements(count as u64));
        group.bench_with_input(BenchmarkId::new("add_bulk", count), &count, |b, &count| {
            b.iter_with_setup(
                || generate_test_documents(count),
                |docs| {
                    let config = IndexConfig::new();
                    let index = Index::new("bench", config).expect("index");
                    black_box(index.add_bulk(docs).expect("bulk add"))
                },
            )
        });
    }

    group.bench_function("add_single", |b| {
        let index = build_index(1000);
        let mut docs = generate_test_documents(100).into_iter().cycle();
        b.iter(|| {
            if let Some(doc) = docs.next() {
                index.add(doc).expect("add");
            }
        })
    });
    group.finish();
}

/// Benchmark query execution.
fn bench_queries(c: &mut Criterion) {
    let mut group = c.benchmark_group("query");
    let index = build_index(5000);
    let options = SearchOptions::new();

    let queries = [
        ("term", "body:search"),
        ("boolean", "body:search AND body:engine -category:toys"),
        ("phrase", "body:\"full text\""),
        ("sloppy_phrase", "body:\"search ranking\"~3"),
        ("range", "price:[100 TO 200]"),
        ("prefix", "body:post*"),
        ("wildcard", "body:*ing"),
        ("fuzzy", "body:serch~2"),
    ];
    for (name, query) in queries {
        let parsed = index.parse_query(query).expect("query parses");
        group.bench_function(name, |b| {
            b.iter(|| black_box(index.search(black_box(&parsed), &options).expect("search")))
        });
    }

    group.bench_function("parse", |b| {
        b.iter(|| {
            black_box(
                index
                    .parse_query(black_box("(body:search OR body:index) AND price:[10 TO *] -body:fuzz~1"))
                    .expect("query parses"),
            )
        })
    });
    group.finish();
}

/// Benchmark facet aggregation.
fn bench_facets(c: &mut Criterion) {
    let mut group = c.benchmark_group("facets");
    let index = build_index(5000);
    let spec = FacetSpec::new()
        .terms("categories", "category", 10)
        .histogram("prices", "price", 50.0)
        .stats("price_stats", "price")
        .cardinality("distinct_prices", "price");
    let options = SearchOptions::new().with_limit(0).with_facets(spec);

    for (name, query) in [("all", "*:*"), ("filtered", "body:search")] {
        let parsed = index.parse_query(query).expect("query parses");
        group.bench_function(name, |b| {
            b.iter(|| black_box(index.search(&parsed, &options).expect("search")))
        });
    }
    group.finish();
}

/// Benchmark suggestions and spelling correction.
fn bench_suggestions(c: &mut Criterion) {
    let mut group = c.benchmark_group("suggestions");
    let index = build_index(2000);

    // Distinct prefixes defeat the result cache.
    let prefixes: Vec<String> = WORDS.iter().map(|w| w[..3].to_string()).collect();
    let fuzzy = SuggestConfig::default().with_max_edits(1);
    group.bench_function("fuzzy_prefix", |b| {
        let mut next = prefixes.iter().cycle();
        b.iter(|| {
            if let Some(prefix) = next.next() {
                let prefix = format!("{prefix}x");
                black_box(index.suggest(&prefix, &fuzzy).expect("suggest"));
            }
        })
    });

    let config = DidYouMeanConfig::default();
    group.bench_function("did_you_mean", |b| {
        let mut n = 0usize;
        b.iter(|| {
            n += 1;
            let phrase = format!("serch engin rankng {n}");
            black_box(index.did_you_mean(&phrase, &config).expect("did you mean"))
        })
    });
    group.finish();
}

criterion_group!(
    benches,
    bench_text_analysis,
    bench_indexing,
    bench_queries,
    bench_facets,
    bench_suggestions
);
criterion_main!(benches);
