//! Criterion benchmarks for the search engine
//!
//! These benchmarks measure:
//! - Index construction over growing catalogs
//! - Indexed versus linear retrieval for the same query
//! - Cached lookups

use adaptive_search::config::{EngineConfigBuilder, IndexSettings};
use adaptive_search::models::Item;
use adaptive_search::search::{Query, SearchEngine, TextIndex};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use tokio::runtime::Runtime;
use tokio_util::sync::CancellationToken;

const NOUNS: &[&str] = &["Camera", "Lens", "Tripod", "Flash", "Strap", "Filter", "Bag", "Monitor"];
const ADJECTIVES: &[&str] = &["Compact", "Pro", "Travel", "Studio", "Wireless", "Carbon"];

fn catalog(size: usize) -> Vec<Item> {
    (0..size)
        .map(|i| {
            let noun = NOUNS[i % NOUNS.len()];
            let adjective = ADJECTIVES[i % ADJECTIVES.len()];
            Item::new(i.to_string(), format!("{} {} {}", adjective, noun, i))
                .with_description(format!("{} {} for everyday photography", adjective, noun))
                .with_category(noun)
                .with_price((i % 1000) as f64)
                .with_stock(i % 3 != 0)
        })
        .collect()
}

fn fields() -> Vec<String> {
    ["name", "description", "category"]
        .iter()
        .map(|f| f.to_string())
        .collect()
}

/// Benchmark a full index build
fn bench_index_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("index_build");
    for size in [1_000, 10_000] {
        let items = catalog(size);
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &items, |b, items| {
            b.iter(|| {
                let mut index = TextIndex::new(&IndexSettings::default());
                index.build(black_box(items), &fields());
                index
            });
        });
    }
    group.finish();
}

/// Benchmark indexed and linear retrieval of the same query
fn bench_retrieval(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let items = catalog(10_000);
    let query = Query::new("wireless flash").with_stock(true);

    let base = || EngineConfigBuilder::new().enable_cache(false).enable_analytics(false);
    let indexed = SearchEngine::new(base().build()).unwrap();
    let linear = SearchEngine::new(base().enable_index(false).build()).unwrap();
    rt.block_on(indexed.initialize_index(&items, None)).unwrap();

    let mut group = c.benchmark_group("retrieval");
    group.bench_function("indexed", |b| {
        b.to_async(&rt).iter(|| async {
            indexed
                .search(black_box(&items), &query, &CancellationToken::new())
                .await
                .unwrap()
        });
    });
    group.bench_function("linear", |b| {
        b.to_async(&rt).iter(|| async {
            linear
                .search(black_box(&items), &query, &CancellationToken::new())
                .await
                .unwrap()
        });
    });
    group.finish();
}

/// Benchmark repeated queries served from the cache
fn bench_cached_lookup(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let items = catalog(10_000);
    let query = Query::new("studio lens");
    let engine = SearchEngine::new(EngineConfigBuilder::new().build()).unwrap();
    rt.block_on(engine.search(&items, &query, &CancellationToken::new()))
        .unwrap();

    c.bench_function("cached_lookup", |b| {
        b.to_async(&rt).iter(|| async {
            engine
                .search(black_box(&items), &query, &CancellationToken::new())
                .await
                .unwrap()
        });
    });
}

criterion_group!(benches, bench_index_build, bench_retrieval, bench_cached_lookup);

criterion_main!(benches);
