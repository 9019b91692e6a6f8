//! Result cache behavior, directly and through the engine

mod common;

use adaptive_search::cache::{CacheKey, ResultCache};
use adaptive_search::config::{EngineConfigBuilder, SearchSettings};
use adaptive_search::search::{Query, Source};
use common::*;
use std::time::Duration;

fn key(text: &str) -> CacheKey {
    CacheKey::generate(&Query::new(text), &SearchSettings::default()).unwrap()
}

#[tokio::test(start_paused = true)]
async fn test_entry_lives_until_ttl() {
    let mut cache = ResultCache::new(10, Duration::from_secs(60)).unwrap();
    cache.set(key("lens"), vec![1, 2, 3]);

    tokio::time::advance(Duration::from_secs(59)).await;
    assert_eq!(cache.get(&key("lens")), Some(vec![1, 2, 3]));

    tokio::time::advance(Duration::from_secs(2)).await;
    assert_eq!(cache.get(&key("lens")), None);
    assert!(cache.is_empty());
    assert_eq!(cache.stats().expirations, 1);
}

#[tokio::test(start_paused = true)]
async fn test_entry_expiry_matches_ttl() {
    let mut cache = ResultCache::new(10, Duration::from_secs(30)).unwrap();
    cache.set(key("flash"), "cached");

    let entry = cache.peek_entry(&key("flash")).unwrap();
    assert_eq!(entry.expires_at - entry.created_at, Duration::from_secs(30));
}

#[tokio::test(start_paused = true)]
async fn test_full_cache_evicts_least_recently_accessed() {
    let mut cache = ResultCache::new(3, Duration::from_secs(300)).unwrap();
    cache.set(key("a"), 1);
    cache.set(key("b"), 2);
    cache.set(key("c"), 3);

    tokio::time::advance(Duration::from_secs(1)).await;
    assert_eq!(cache.get(&key("a")), Some(1));
    cache.set(key("d"), 4);

    assert_eq!(cache.len(), 3);
    assert_eq!(cache.get(&key("b")), None);
    assert_eq!(cache.get(&key("a")), Some(1));
    assert_eq!(cache.get(&key("c")), Some(3));
    assert_eq!(cache.stats().evictions, 1);
}

#[tokio::test(start_paused = true)]
async fn test_engine_cache_entries_expire() {
    let engine = engine_with(EngineConfigBuilder::new().cache_ttl(Duration::from_secs(5)));
    let items = catalog();
    let query = Query::new("camera");

    search(&engine, &items, &query).await;
    assert!(search(&engine, &items, &query).await.cache_hit);

    tokio::time::advance(Duration::from_secs(6)).await;
    let response = search(&engine, &items, &query).await;
    assert!(!response.cache_hit);
    assert_eq!(response.source, Source::Linear);

    let stats = engine.performance_stats().await.cache;
    assert_eq!(stats.expirations, 1);
    assert_eq!(stats.hit_count, 1);
    assert_eq!(stats.miss_count, 2);
}

#[tokio::test]
async fn test_engine_cache_is_bounded() {
    let engine = engine_with(EngineConfigBuilder::new().cache_max_size(2));
    let items = catalog();

    search(&engine, &items, &Query::new("camera")).await;
    search(&engine, &items, &Query::new("lens")).await;
    assert!(search(&engine, &items, &Query::new("camera")).await.cache_hit);
    search(&engine, &items, &Query::new("tripod")).await;

    assert!(search(&engine, &items, &Query::new("camera")).await.cache_hit);
    assert!(!search(&engine, &items, &Query::new("lens")).await.cache_hit);

    let stats = engine.performance_stats().await.cache;
    assert_eq!(stats.size, 2);
    assert_eq!(stats.max_size, 2);
    assert_eq!(stats.evictions, 2);
}

#[tokio::test]
async fn test_equivalent_queries_share_cached_results() {
    let engine = engine();
    let items = catalog();

    search(&engine, &items, &Query::new("Prime  Lens").with_category(" Lenses ")).await;
    let response = search(&engine, &items, &Query::new("prime lens").with_category("lenses")).await;

    assert!(response.cache_hit);
    assert_eq!(response.output.ids(), vec!["3"]);
}

#[tokio::test]
async fn test_hit_rate() {
    let engine = engine();
    let items = catalog();
    let query = Query::new("tripod");

    for _ in 0..4 {
        search(&engine, &items, &query).await;
    }

    let stats = engine.performance_stats().await.cache;
    assert_eq!(stats.hit_count, 3);
    assert_eq!(stats.miss_count, 1);
    assert!((stats.hit_rate - 0.75).abs() < 1e-9);
}
