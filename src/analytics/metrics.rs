//! Search records and report structures

use crate::search::FilterSet;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Outcome of one search, as reported by the engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchRecordInput {
    pub query: String,
    pub filters: FilterSet,
    pub result_count: usize,
    pub elapsed_ms: f64,
    pub cache_hit: bool,
    pub index_used: bool,
}

/// An immutable history entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchRecord {
    /// Record ID
    pub id: Uuid,

    /// When the search completed
    pub timestamp: DateTime<Utc>,

    /// Query text as submitted
    pub query: String,

    /// Filters as submitted
    pub filters: FilterSet,

    /// Number of matches
    pub result_count: usize,

    /// Wall time in milliseconds
    pub elapsed_ms: f64,

    /// Served from the result cache
    pub cache_hit: bool,

    /// Retrieved through the inverted index
    pub index_used: bool,
}

impl SearchRecord {
    pub(crate) fn new(input: SearchRecordInput, timestamp: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp,
            query: input.query,
            filters: input.filters,
            result_count: input.result_count,
            elapsed_ms: input.elapsed_ms,
            cache_hit: input.cache_hit,
            index_used: input.index_used,
        }
    }
}

/// Volume and hit rates
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OverviewMetrics {
    pub total_searches: u64,
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub cache_hit_rate: f64,
    pub index_searches: u64,
    pub index_usage_rate: f64,

    /// Records currently held in the history buffer
    pub history_size: usize,

    /// Distinct queries currently tracked for popularity
    pub tracked_queries: usize,
}

/// Latency figures
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    pub avg_search_time_ms: f64,
    pub fastest_search_ms: Option<f64>,
    pub slowest_search_ms: Option<f64>,
    pub slow_searches: u64,
    pub slow_search_rate: f64,
    pub slow_search_threshold_ms: u64,
}

/// How many results searches returned
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultDistribution {
    /// No results
    pub zero: u64,

    /// 1 to 10 results
    pub few: u64,

    /// More than 10 results
    pub many: u64,
}

impl ResultDistribution {
    pub(crate) fn record(&mut self, result_count: usize) {
        match result_count {
            0 => self.zero += 1,
            1..=10 => self.few += 1,
            _ => self.many += 1,
        }
    }
}

/// When and what people search for
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PatternMetrics {
    /// Searches per hour of day (UTC), index 0 = midnight
    pub hourly: Vec<u64>,

    /// Searches per weekday, index 0 = Monday
    pub daily: Vec<u64>,

    pub peak_hour: Option<u32>,
    pub busiest_day: Option<String>,

    /// Searches per category filter ("all" when unfiltered)
    pub categories: BTreeMap<String, u64>,

    pub result_distribution: ResultDistribution,
}

/// A frequently searched query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PopularQuery {
    /// Normalized query text
    pub query: String,

    pub count: u64,
    pub avg_results: f64,
    pub avg_search_time_ms: f64,
    pub last_searched: DateTime<Utc>,
}

/// Snapshot of everything analytics knows
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceReport {
    pub generated_at: DateTime<Utc>,
    pub enabled: bool,
    pub overview: OverviewMetrics,
    pub performance: PerformanceMetrics,
    pub patterns: PatternMetrics,
    pub popular_queries: Vec<PopularQuery>,

    /// Most recent first
    pub recent_searches: Vec<SearchRecord>,

    pub recommendations: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_result_distribution_buckets() {
        let mut distribution = ResultDistribution::default();
        for count in [0, 1, 10, 11, 500] {
            distribution.record(count);
        }

        assert_eq!(distribution.zero, 1);
        assert_eq!(distribution.few, 2);
        assert_eq!(distribution.many, 2);
    }
}
