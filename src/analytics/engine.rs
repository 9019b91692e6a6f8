//! Incrementally maintained search analytics

use crate::analytics::error::AnalyticsResult;
use crate::analytics::metrics::*;
use crate::cache::normalize_query_text;
use crate::config::AnalyticsSettings;
use chrono::{DateTime, Datelike, Timelike, Utc};
use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};
use tracing::debug;
use validator::Validate;

/// Recommendations need at least this many searches to be meaningful
const MIN_SAMPLES_FOR_RECOMMENDATIONS: u64 = 10;

/// Category bucket for searches without a category filter
const ALL_CATEGORIES: &str = "all";

#[derive(Debug, Clone)]
struct PopularEntry {
    count: u64,
    avg_results: f64,
    avg_elapsed_ms: f64,
    last_searched: DateTime<Utc>,
}

impl PopularEntry {
    fn rank(&self, query: &str) -> PopularityRank {
        (self.count, self.last_searched, query.to_string())
    }
}

/// Eviction order of tracked queries: fewest searches first, then oldest
type PopularityRank = (u64, DateTime<Utc>, String);

/// Bounded search history plus running aggregates.
///
/// Every aggregate is updated as records arrive; reports never rescan the
/// history.
pub struct QueryAnalytics {
    settings: AnalyticsSettings,
    enabled: bool,
    history: VecDeque<SearchRecord>,

    total_searches: u64,
    avg_elapsed_ms: f64,
    fastest_ms: Option<f64>,
    slowest_ms: Option<f64>,
    slow_searches: u64,
    cache_hits: u64,
    cache_misses: u64,
    index_searches: u64,

    hourly: [u64; 24],
    daily: [u64; 7],
    categories: BTreeMap<String, u64>,
    result_distribution: ResultDistribution,
    popular: HashMap<String, PopularEntry>,
    popularity_order: BTreeSet<PopularityRank>,
}

impl QueryAnalytics {
    pub fn new(settings: &AnalyticsSettings) -> AnalyticsResult<Self> {
        settings.validate()?;
        Ok(Self {
            settings: settings.clone(),
            enabled: settings.enabled,
            history: VecDeque::with_capacity(settings.max_history_size.min(1024)),
            total_searches: 0,
            avg_elapsed_ms: 0.0,
            fastest_ms: None,
            slowest_ms: None,
            slow_searches: 0,
            cache_hits: 0,
            cache_misses: 0,
            index_searches: 0,
            hourly: [0; 24],
            daily: [0; 7],
            categories: BTreeMap::new(),
            result_distribution: ResultDistribution::default(),
            popular: HashMap::new(),
            popularity_order: BTreeSet::new(),
        })
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Record a search completed now. Returns `false` while disabled.
    pub fn record_search(&mut self, input: SearchRecordInput) -> bool {
        self.record_search_at(input, Utc::now())
    }

    /// Record a search with an explicit completion time
    pub fn record_search_at(&mut self, input: SearchRecordInput, timestamp: DateTime<Utc>) -> bool {
        if !self.enabled {
            return false;
        }

        let record = SearchRecord::new(input, timestamp);
        self.update_aggregates(&record);

        if self.history.len() >= self.settings.max_history_size {
            self.history.pop_front();
        }
        self.history.push_back(record);
        true
    }

    fn update_aggregates(&mut self, record: &SearchRecord) {
        self.total_searches += 1;
        self.avg_elapsed_ms += (record.elapsed_ms - self.avg_elapsed_ms) / self.total_searches as f64;
        self.fastest_ms = Some(self.fastest_ms.map_or(record.elapsed_ms, |f| f.min(record.elapsed_ms)));
        self.slowest_ms = Some(self.slowest_ms.map_or(record.elapsed_ms, |s| s.max(record.elapsed_ms)));

        if record.elapsed_ms > self.settings.slow_search_threshold_ms as f64 {
            self.slow_searches += 1;
            debug!(query = %record.query, elapsed_ms = record.elapsed_ms, "Slow search");
        }

        if record.cache_hit {
            self.cache_hits += 1;
        } else {
            self.cache_misses += 1;
        }
        if record.index_used {
            self.index_searches += 1;
        }

        self.hourly[record.timestamp.hour() as usize] += 1;
        self.daily[record.timestamp.weekday().num_days_from_monday() as usize] += 1;

        let category = record
            .filters
            .canonical()
            .category
            .unwrap_or_else(|| ALL_CATEGORIES.to_string());
        *self.categories.entry(category).or_insert(0) += 1;

        self.result_distribution.record(record.result_count);
        self.track_popularity(record);
    }

    fn track_popularity(&mut self, record: &SearchRecord) {
        let key = normalize_query_text(&record.query, false);
        if key.is_empty() {
            return;
        }

        if !self.popular.contains_key(&key) && self.popular.len() >= self.settings.max_tracked_queries {
            self.evict_least_popular();
        }

        let entry = self.popular.entry(key.clone()).or_insert(PopularEntry {
            count: 0,
            avg_results: 0.0,
            avg_elapsed_ms: 0.0,
            last_searched: record.timestamp,
        });
        if entry.count > 0 {
            self.popularity_order.remove(&entry.rank(&key));
        }
        entry.count += 1;
        let n = entry.count as f64;
        entry.avg_results += (record.result_count as f64 - entry.avg_results) / n;
        entry.avg_elapsed_ms += (record.elapsed_ms - entry.avg_elapsed_ms) / n;
        entry.last_searched = entry.last_searched.max(record.timestamp);
        self.popularity_order.insert(entry.rank(&key));
    }

    /// Drop the least searched query; ties go to the one searched longest ago
    fn evict_least_popular(&mut self) {
        if let Some((_, _, victim)) = self.popularity_order.pop_first() {
            self.popular.remove(&victim);
        }
    }

    /// Build a report from the maintained aggregates.
    ///
    /// `top_n` bounds both the popular and the recent query lists.
    pub fn performance_report(&self, top_n: usize) -> PerformanceReport {
        let total = self.total_searches;
        let rate = |count: u64| {
            if total == 0 {
                0.0
            } else {
                count as f64 / total as f64
            }
        };

        let overview = OverviewMetrics {
            total_searches: total,
            cache_hits: self.cache_hits,
            cache_misses: self.cache_misses,
            cache_hit_rate: rate(self.cache_hits),
            index_searches: self.index_searches,
            index_usage_rate: rate(self.index_searches),
            history_size: self.history.len(),
            tracked_queries: self.popular.len(),
        };

        let performance = PerformanceMetrics {
            avg_search_time_ms: self.avg_elapsed_ms,
            fastest_search_ms: self.fastest_ms,
            slowest_search_ms: self.slowest_ms,
            slow_searches: self.slow_searches,
            slow_search_rate: rate(self.slow_searches),
            slow_search_threshold_ms: self.settings.slow_search_threshold_ms,
        };

        let patterns = PatternMetrics {
            hourly: self.hourly.to_vec(),
            daily: self.daily.to_vec(),
            peak_hour: busiest(&self.hourly).map(|hour| hour as u32),
            busiest_day: busiest(&self.daily).map(|day| weekday_name(day).to_string()),
            categories: self.categories.clone(),
            result_distribution: self.result_distribution,
        };

        let recommendations = self.recommendations(&overview, &performance);

        PerformanceReport {
            generated_at: Utc::now(),
            enabled: self.enabled,
            overview,
            performance,
            patterns,
            popular_queries: self.popular_queries(top_n),
            recent_searches: self.history.iter().rev().take(top_n).cloned().collect(),
            recommendations,
        }
    }

    /// Most searched queries, highest count first
    pub fn popular_queries(&self, top_n: usize) -> Vec<PopularQuery> {
        let mut queries: Vec<PopularQuery> = self
            .popular
            .iter()
            .map(|(query, entry)| PopularQuery {
                query: query.clone(),
                count: entry.count,
                avg_results: entry.avg_results,
                avg_search_time_ms: entry.avg_elapsed_ms,
                last_searched: entry.last_searched,
            })
            .collect();

        queries.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.query.cmp(&b.query)));
        queries.truncate(top_n);
        queries
    }

    fn recommendations(&self, overview: &OverviewMetrics, performance: &PerformanceMetrics) -> Vec<String> {
        let mut recommendations = Vec::new();
        if overview.total_searches < MIN_SAMPLES_FOR_RECOMMENDATIONS {
            return recommendations;
        }

        if overview.cache_hit_rate < 0.2 {
            recommendations.push(format!(
                "Cache hit rate is {:.0}%; consider a longer cache TTL or a larger cache",
                overview.cache_hit_rate * 100.0
            ));
        }

        if performance.slow_search_rate > 0.1 && overview.index_usage_rate < 0.5 {
            recommendations.push(format!(
                "{} searches exceeded {}ms while mostly scanning linearly; enable the index or lower min_items_for_index",
                performance.slow_searches, performance.slow_search_threshold_ms
            ));
        }

        let zero_rate = self.result_distribution.zero as f64 / overview.total_searches as f64;
        if zero_rate > 0.3 {
            recommendations.push(format!(
                "{:.0}% of searches returned no results; consider enabling fuzzy matching or searching more fields",
                zero_rate * 100.0
            ));
        }

        if performance.avg_search_time_ms > performance.slow_search_threshold_ms as f64 {
            recommendations.push(format!(
                "Average search time {:.1}ms exceeds the {}ms slow threshold",
                performance.avg_search_time_ms, performance.slow_search_threshold_ms
            ));
        }

        recommendations
    }

    /// Drop history and every aggregate
    pub fn clear(&mut self) {
        self.history.clear();
        self.total_searches = 0;
        self.avg_elapsed_ms = 0.0;
        self.fastest_ms = None;
        self.slowest_ms = None;
        self.slow_searches = 0;
        self.cache_hits = 0;
        self.cache_misses = 0;
        self.index_searches = 0;
        self.hourly = [0; 24];
        self.daily = [0; 7];
        self.categories.clear();
        self.result_distribution = ResultDistribution::default();
        self.popular.clear();
        self.popularity_order.clear();
    }

    /// Enable or disable recording; disabling clears all state
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        if !enabled {
            self.clear();
        }
    }

    /// Apply new limits, shrinking the history and popularity table if needed.
    ///
    /// A new slow threshold only affects searches recorded afterwards.
    pub fn reconfigure(&mut self, settings: &AnalyticsSettings) -> AnalyticsResult<()> {
        settings.validate()?;
        self.settings = settings.clone();

        while self.history.len() > self.settings.max_history_size {
            self.history.pop_front();
        }
        while self.popular.len() > self.settings.max_tracked_queries {
            self.evict_least_popular();
        }
        Ok(())
    }
}

fn busiest(counts: &[u64]) -> Option<usize> {
    counts
        .iter()
        .enumerate()
        .filter(|(_, count)| **count > 0)
        .max_by(|(ia, a), (ib, b)| a.cmp(b).then_with(|| ib.cmp(ia)))
        .map(|(index, _)| index)
}

fn weekday_name(days_from_monday: usize) -> &'static str {
    const NAMES: [&str; 7] = [
        "Monday",
        "Tuesday",
        "Wednesday",
        "Thursday",
        "Friday",
        "Saturday",
        "Sunday",
    ];
    NAMES[days_from_monday % 7]
}
