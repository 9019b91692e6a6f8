//! Query analytics
//!
//! Every completed search is recorded into a bounded ring buffer and folded
//! into running aggregates:
//!
//! - **Latency**: running average, fastest/slowest, slow-search counter
//! - **Provenance**: cache hit/miss and index usage counters
//! - **Patterns**: hour-of-day and day-of-week histograms, per-category
//!   counters, result-count buckets
//! - **Popularity**: per normalized query text, with running averages of
//!   result count and latency
//!
//! Reports are assembled from those aggregates without rescanning history.
//! Analytics is best effort: nothing here can fail a search.
//!
//! # Example
//!
//! ```
//! use adaptive_search::analytics::{QueryAnalytics, SearchRecordInput};
//! use adaptive_search::config::AnalyticsSettings;
//! use adaptive_search::search::FilterSet;
//!
//! let mut analytics = QueryAnalytics::new(&AnalyticsSettings::default()).unwrap();
//! analytics.record_search(SearchRecordInput {
//!     query: "camera".to_string(),
//!     filters: FilterSet::default(),
//!     result_count: 3,
//!     elapsed_ms: 1.5,
//!     cache_hit: false,
//!     index_used: true,
//! });
//!
//! let report = analytics.performance_report(10);
//! assert_eq!(report.overview.total_searches, 1);
//! ```

mod engine;
mod error;
mod metrics;

pub use engine::QueryAnalytics;
pub use error::{AnalyticsError, AnalyticsResult};
pub use metrics::{
    OverviewMetrics, PatternMetrics, PerformanceMetrics, PerformanceReport, PopularQuery,
    ResultDistribution, SearchRecord, SearchRecordInput,
};
