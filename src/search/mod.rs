//! Adaptive search over caller-owned item collections
//!
//! A search runs through one of three paths, reported as the response's
//! [`Source`]:
//!
//! ```text
//! ┌─────────────────────────────────────────────────┐
//! │           SearchEngine::search                   │
//! ├─────────────────────────────────────────────────┤
//! │  validate filters → cache key → cache lookup     │
//! └─────────────────────────────────────────────────┘
//!            │ miss
//!            ▼
//! ┌────────────────────────┐   ┌────────────────────┐
//! │  TextIndex (postings)  │ / │  Linear scan       │
//! │  large / complex query │   │  small, fallback,  │
//! │                        │   │  case-sensitive    │
//! └────────────────────────┘   └────────────────────┘
//!            │
//!            ▼
//! ┌─────────────────────────────────────────────────┐
//! │  filters → ranking → truncation                  │
//! │  → cache store → analytics record                │
//! └─────────────────────────────────────────────────┘
//! ```
//!
//! Both retrieval paths share the tokenizer and term classifier, so for the
//! same snapshot and query they select the same items. Index failures are
//! absorbed by falling back to the linear scan for that call.
//!
//! # Example
//!
//! ```no_run
//! use adaptive_search::config::EngineConfig;
//! use adaptive_search::models::Item;
//! use adaptive_search::search::{Query, SearchEngine};
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let engine = SearchEngine::new(EngineConfig::default())?;
//!     let items = vec![Item::new("1", "Camera"), Item::new("2", "Lens")];
//!
//!     let query = Query::new("camera").with_price_range(Some(100.0), Some(200.0));
//!     if let Some(response) = engine.search(&items, &query, &CancellationToken::new()).await? {
//!         println!("{} hits from {}", response.total_matches(), response.source);
//!     }
//!
//!     Ok(())
//! }
//! ```

mod engine;
mod error;
mod filters;
mod fuzzy;
mod index;
mod linear;
mod query;
mod results;
mod tokenizer;

pub use engine::{PerformanceStats, SearchEngine, REPORT_TOP_N};
pub use error::{SearchError, SearchResult};
pub use filters::{apply_filters, finalize, matches_filters};
pub use fuzzy::{is_near_miss, levenshtein_within, max_distance, MIN_FUZZY_TERM_CHARS};
pub use index::{IndexSearchOutput, IndexStats, TextIndex};
pub use linear::{scan, ScanOptions, SCAN_CHUNK_SIZE};
pub use query::{FilterSet, PriceRange, Query};
pub use results::{ScoredItem, SearchOutput, SearchResponse, Source, TermMatch};
pub use tokenizer::{
    classify, query_terms, tokenize, weigh_field, MatchKind, EXACT_FIELD_WEIGHT,
    FIELD_PREFIX_WEIGHT, WORD_BOUNDARY_WEIGHT,
};
