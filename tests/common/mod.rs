//! Common test utilities for search engine testing
//!
//! Catalog fixtures and helpers shared by the integration tests.

#![allow(dead_code)]

use adaptive_search::config::{EngineConfig, EngineConfigBuilder};
use adaptive_search::models::Item;
use adaptive_search::search::{Query, SearchEngine, SearchResponse};
use tokio_util::sync::CancellationToken;

/// Engine with default settings
pub fn engine() -> SearchEngine {
    SearchEngine::new(EngineConfig::default()).unwrap()
}

/// Engine built from a customized builder
pub fn engine_with(builder: EngineConfigBuilder) -> SearchEngine {
    SearchEngine::new(builder.build()).unwrap()
}

/// Run a search that is never cancelled
pub async fn search(engine: &SearchEngine, items: &[Item], query: &Query) -> SearchResponse {
    engine
        .search(items, query, &CancellationToken::new())
        .await
        .unwrap()
        .expect("search was not cancelled")
}

/// A small photography catalog
pub fn catalog() -> Vec<Item> {
    vec![
        Item::new("1", "Mirrorless Camera")
            .with_description("Full frame body with 45MP sensor")
            .with_category("Cameras")
            .with_manufacturer("Acme Optics")
            .with_model("AX-1")
            .with_price(1999.0)
            .with_tags(vec!["mirrorless", "full-frame"])
            .with_stock(true),
        Item::new("2", "Compact Camera")
            .with_description("Pocket camera with zoom lens")
            .with_category("Cameras")
            .with_manufacturer("Zenith")
            .with_price(150.0)
            .with_tags(vec!["compact", "zoom"])
            .with_stock(false),
        Item::new("3", "Prime Lens")
            .with_description("50mm f/1.8 lens")
            .with_category("Lenses")
            .with_manufacturer("Acme Optics")
            .with_price(250.0)
            .with_tags(vec!["prime"])
            .with_stock(true),
        Item::new("4", "Travel Tripod")
            .with_description("Carbon tripod for cameras and spotting scopes")
            .with_category("Accessories")
            .with_manufacturer("Stablex")
            .with_price(50.0)
            .with_tags(vec!["travel"])
            .with_stock(true),
    ]
}

/// `count` generated items; every tenth one is a camera
pub fn large_catalog(count: usize) -> Vec<Item> {
    (0..count)
        .map(|i| {
            let kind = if i % 10 == 0 { "Camera" } else { "Accessory" };
            Item::new(i.to_string(), format!("{} model {}", kind, i))
                .with_description(format!("Catalog entry number {}", i))
                .with_category(if i % 10 == 0 { "Cameras" } else { "Accessories" })
                .with_price((i % 500) as f64)
                .with_stock(i % 2 == 0)
        })
        .collect()
}

/// Identifiers of a response's results, sorted
pub fn sorted_ids(response: &SearchResponse) -> Vec<String> {
    let mut ids: Vec<String> = response.results().iter().map(|hit| hit.item.id.clone()).collect();
    ids.sort();
    ids
}
