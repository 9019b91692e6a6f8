//! Adaptive in-memory search engine.
//!
//! [`search::SearchEngine`] serves text-plus-filter queries over item
//! collections owned by the caller. Each call is answered from a bounded
//! result cache, an inverted index or a chunked linear scan, whichever fits
//! the collection size and query shape, and every search is folded into query
//! analytics.

pub mod analytics;
pub mod cache;
pub mod config;
pub mod error;
pub mod models;
pub mod search;

pub use config::{EngineConfig, EngineConfigBuilder, EngineOptions};
pub use error::{AppError, Result};
pub use models::Item;
pub use search::{FilterSet, PriceRange, Query, SearchEngine, SearchResponse, Source};
