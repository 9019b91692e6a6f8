//! Search orchestrator: cache, index or linear retrieval, filters, analytics

use crate::analytics::{PerformanceReport, QueryAnalytics, SearchRecordInput};
use crate::cache::{CacheKey, CacheStats, KeyParts, ResultCache};
use crate::config::{CacheSettings, EngineConfig, EngineOptions};
use crate::models::Item;
use crate::search::error::{SearchError, SearchResult};
use crate::search::filters;
use crate::search::index::{IndexStats, TextIndex};
use crate::search::linear::{self, ScanOptions};
use crate::search::query::Query;
use crate::search::results::{ScoredItem, SearchOutput, SearchResponse, Source};
use crate::search::tokenizer;
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};
use validator::Validate;

/// Number of popular and recent queries included in performance stats
pub const REPORT_TOP_N: usize = 10;

/// Combined statistics of the engine's collaborators
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PerformanceStats {
    pub cache: CacheStats,
    pub index: IndexStats,
    pub analytics: PerformanceReport,
}

/// Adaptive search engine.
///
/// Owns a result cache, an inverted index and a query analytics store. Item
/// collections stay with the caller and are passed to every search as a
/// snapshot.
pub struct SearchEngine {
    config: RwLock<EngineConfig>,
    cache: Mutex<ResultCache<SearchOutput>>,
    index: tokio::sync::RwLock<TextIndex>,
    build_guard: tokio::sync::Mutex<()>,
    analytics: Mutex<QueryAnalytics>,
}

impl SearchEngine {
    /// Create an engine from a validated configuration
    pub fn new(config: EngineConfig) -> SearchResult<Self> {
        config.validate()?;

        let mut cache = ResultCache::new(config.cache.max_size, config.cache.ttl())
            .map_err(|e| SearchError::InvalidConfiguration(e.to_string()))?;
        cache.set_enabled(config.cache.enabled);

        let mut analytics = QueryAnalytics::new(&config.analytics)
            .map_err(|e| SearchError::InvalidConfiguration(e.to_string()))?;
        analytics.set_enabled(config.analytics.enabled);

        let index = TextIndex::new(&config.index);

        Ok(Self {
            config: RwLock::new(config),
            cache: Mutex::new(cache),
            index: tokio::sync::RwLock::new(index),
            build_guard: tokio::sync::Mutex::new(()),
            analytics: Mutex::new(analytics),
        })
    }

    /// Snapshot of the current configuration
    pub fn config(&self) -> EngineConfig {
        self.config.read().clone()
    }

    /// Build the index over `items`.
    ///
    /// When `fields` is given it replaces the configured search fields, so that
    /// the index and the linear scan keep searching the same fields.
    pub async fn initialize_index(&self, items: &[Item], fields: Option<Vec<String>>) -> SearchResult<IndexStats> {
        if let Some(fields) = fields {
            self.adopt_fields(fields)?;
        }
        let config = self.config();

        let _guard = self.build_guard.lock().await;
        let fresh = TextIndex::build_detached(
            config.index.clone(),
            items.to_vec(),
            config.search.search_fields.clone(),
        )
        .await?;
        let stats = fresh.stats();
        *self.index.write().await = fresh;

        info!(
            items = stats.total_items,
            words = stats.total_words,
            "Search index initialized"
        );
        Ok(stats)
    }

    /// Run a query against a snapshot of the caller's collection.
    ///
    /// Returns `Ok(None)` when `cancel` fires before the search completes; in
    /// that case neither the cache nor analytics are touched. Invalid filters
    /// are rejected before any retrieval.
    #[instrument(skip(self, items, query, cancel), fields(query = %query.text, items = items.len()))]
    pub async fn search(
        &self,
        items: &[Item],
        query: &Query,
        cancel: &CancellationToken,
    ) -> SearchResult<Option<SearchResponse>> {
        let started = Instant::now();
        query.filters.validate()?;

        if cancel.is_cancelled() {
            debug!("Search cancelled before start");
            return Ok(None);
        }

        let config = self.config();

        let key = if config.cache.enabled {
            match CacheKey::generate(query, &config.search) {
                Ok(key) => Some(key),
                Err(e) => {
                    warn!(error = %e, "Cache key generation failed, bypassing cache");
                    None
                }
            }
        } else {
            None
        };

        if let Some(key) = &key {
            let cached = self.cache.lock().get(key);
            if let Some(output) = cached {
                let response = SearchResponse::new(output, started.elapsed(), Source::Cache);
                debug!(results = response.results().len(), "Served from cache");
                self.record(query, &response);
                return Ok(Some(response));
            }
        }

        let terms = tokenizer::query_terms(&query.text, config.search.case_sensitive);
        let Some((hits, source)) = self.retrieve(items, query, &terms, &config, cancel).await else {
            debug!("Search cancelled during retrieval");
            return Ok(None);
        };

        let output = filters::finalize(
            hits,
            &query.filters,
            config.search.enable_ranking,
            config.search.max_results,
        );

        if cancel.is_cancelled() {
            debug!("Search cancelled after retrieval");
            return Ok(None);
        }

        if let Some(key) = key {
            self.store(key, &output, &config.cache);
        }

        let response = SearchResponse::new(output, started.elapsed(), source);
        debug!(
            source = %response.source,
            total = response.total_matches(),
            elapsed_ms = response.search_time_ms,
            "Search completed"
        );
        self.record(query, &response);
        Ok(Some(response))
    }

    /// Pick a retrieval strategy and produce raw hits in collection order
    async fn retrieve(
        &self,
        items: &[Item],
        query: &Query,
        terms: &[String],
        config: &EngineConfig,
        cancel: &CancellationToken,
    ) -> Option<(Vec<ScoredItem>, Source)> {
        if self.index_eligible(config, items.len(), terms.len()) {
            if let Err(e) = self.ensure_index(items, config).await {
                warn!(error = %e, "Index rebuild failed");
            }
        }

        if cancel.is_cancelled() {
            return None;
        }

        if self.index_ready(items, config).await
            && (!terms.is_empty()
                || items.len() >= config.index.min_items_for_index
                || query.filters.active_count() > 1)
        {
            tokio::task::yield_now().await;
            match self.indexed_search(items, terms, config).await {
                Ok(hits) => return Some((hits, Source::Index)),
                Err(e) => warn!(error = %e, "Indexed search failed, falling back to linear scan"),
            }
        }

        let options = ScanOptions {
            fields: &config.search.search_fields,
            case_sensitive: config.search.case_sensitive,
            fuzzy: config.search.enable_fuzzy,
            priorities: &config.index.priority_fields,
        };
        linear::scan(items, terms, &options, cancel)
            .await
            .map(|hits| (hits, Source::Linear))
    }

    /// Whether this call is worth building the index for.
    ///
    /// The index is case-folded, so case-sensitive configurations never use it.
    fn index_eligible(&self, config: &EngineConfig, item_count: usize, term_count: usize) -> bool {
        config.index.enabled
            && !config.search.case_sensitive
            && (item_count >= config.index.min_items_for_index
                || term_count >= config.index.complex_query_terms)
    }

    async fn index_ready(&self, items: &[Item], config: &EngineConfig) -> bool {
        if !config.index.enabled || config.search.case_sensitive {
            return false;
        }
        let index = self.index.read().await;
        !index.is_stale(config.index.staleness(), items.len())
            && index.fields() == config.search.search_fields.as_slice()
    }

    /// Rebuild the index from `items` if it is missing or stale
    async fn ensure_index(&self, items: &[Item], config: &EngineConfig) -> SearchResult<()> {
        if self.index_ready(items, config).await {
            return Ok(());
        }

        let _guard = self.build_guard.lock().await;
        // A concurrent search may have rebuilt it while we waited
        if self.index_ready(items, config).await {
            return Ok(());
        }

        debug!(items = items.len(), "Rebuilding search index");
        let fresh = TextIndex::build_detached(
            config.index.clone(),
            items.to_vec(),
            config.search.search_fields.clone(),
        )
        .await?;
        *self.index.write().await = fresh;
        Ok(())
    }

    /// Index retrieval, resolved against the caller's snapshot.
    ///
    /// Hits for ids missing from the snapshot are dropped; the snapshot's copy
    /// of each item is returned. A repeated id resolves to its last occurrence,
    /// matching what the index holds for it.
    async fn indexed_search(
        &self,
        items: &[Item],
        terms: &[String],
        config: &EngineConfig,
    ) -> SearchResult<Vec<ScoredItem>> {
        let latest = linear::latest_positions(items);
        let live = items
            .iter()
            .enumerate()
            .filter(|(position, item)| latest.get(item.id.as_str()) == Some(position))
            .map(|(_, item)| item);

        let index = self.index.read().await;

        if terms.is_empty() {
            if !index.is_built() {
                return Err(SearchError::IndexUnready);
            }
            return Ok(live
                .filter(|item| index.contains(&item.id))
                .map(|item| ScoredItem::unscored(item.clone()))
                .collect());
        }

        let hits = index.search_terms(terms, config.search.enable_fuzzy)?;
        drop(index);

        let mut by_id: HashMap<String, ScoredItem> = hits
            .into_iter()
            .map(|hit| (hit.item.id.clone(), hit))
            .collect();

        let mut resolved = Vec::with_capacity(by_id.len());
        for item in live {
            if let Some(mut hit) = by_id.remove(&item.id) {
                hit.item = item.clone();
                resolved.push(hit);
            }
        }
        Ok(resolved)
    }

    fn store(&self, key: CacheKey, output: &SearchOutput, settings: &CacheSettings) {
        let mut cache = self.cache.lock();
        if !output.is_empty() {
            cache.set(key, output.clone());
        } else if settings.cache_empty_results {
            cache.set_with_ttl(key, output.clone(), settings.empty_result_ttl());
        } else {
            debug!("Empty result not cached");
        }
    }

    fn record(&self, query: &Query, response: &SearchResponse) {
        self.analytics.lock().record_search(SearchRecordInput {
            query: query.text.clone(),
            filters: query.filters.clone(),
            result_count: response.total_matches(),
            elapsed_ms: response.search_time_ms,
            cache_hit: response.cache_hit,
            index_used: response.index_used,
        });
    }

    /// Re-index one item and drop every cached result
    pub async fn update_item(&self, item: &Item) {
        let fields = self.config.read().search.search_fields.clone();
        {
            let mut index = self.index.write().await;
            if index.is_built() {
                index.update_item(item, &fields);
            }
        }
        let dropped = self.invalidate_cache_where(|_| true);
        debug!(item_id = %item.id, dropped, "Item updated");
    }

    /// Remove one item from the index and drop every cached result
    pub async fn remove_item(&self, item_id: &str) -> bool {
        let removed = self.index.write().await.remove_item(item_id);
        let dropped = self.invalidate_cache_where(|_| true);
        debug!(item_id, removed, dropped, "Item removed");
        removed
    }

    /// Drop cached results whose key components satisfy `predicate`
    pub fn invalidate_cache_where<F>(&self, predicate: F) -> usize
    where
        F: Fn(&KeyParts) -> bool,
    {
        self.cache.lock().invalidate_by_pattern(predicate)
    }

    pub async fn performance_stats(&self) -> PerformanceStats {
        let index = self.index.read().await.stats();
        PerformanceStats {
            cache: self.cache.lock().stats(),
            index,
            analytics: self.analytics.lock().performance_report(REPORT_TOP_N),
        }
    }

    /// Clear cache, index and analytics; rebuild the index when `items` is given
    pub async fn reset(&self, items: Option<&[Item]>, fields: Option<Vec<String>>) -> SearchResult<()> {
        self.cache.lock().clear();
        self.analytics.lock().clear();
        self.index.write().await.clear();
        info!("Search engine reset");

        match items {
            Some(items) => self.initialize_index(items, fields).await.map(|_| ()),
            None => match fields {
                Some(fields) => self.adopt_fields(fields),
                None => Ok(()),
            },
        }
    }

    /// Apply a partial configuration update.
    ///
    /// Changing the search fields clears the index, changing any search
    /// setting clears the cache, and disabling a collaborator clears it.
    pub async fn configure(&self, options: EngineOptions) -> SearchResult<()> {
        let mut next = self.config();
        let changes = next.apply(&options);
        next.validate()?;
        *self.config.write() = next.clone();

        {
            let mut cache = self.cache.lock();
            if changes.cache {
                cache
                    .reconfigure(next.cache.max_size, next.cache.ttl())
                    .map_err(|e| SearchError::InvalidConfiguration(e.to_string()))?;
                cache.set_enabled(next.cache.enabled);
            }
            if changes.search {
                cache.invalidate_by_pattern(|_| true);
            }
        }

        if changes.fields || (changes.index && !next.index.enabled) {
            self.index.write().await.clear();
        }

        if changes.analytics {
            let mut analytics = self.analytics.lock();
            analytics
                .reconfigure(&next.analytics)
                .map_err(|e| SearchError::InvalidConfiguration(e.to_string()))?;
            analytics.set_enabled(next.analytics.enabled);
        }

        info!(?changes, "Search engine reconfigured");
        Ok(())
    }

    fn adopt_fields(&self, fields: Vec<String>) -> SearchResult<()> {
        if fields.is_empty() {
            return Err(SearchError::InvalidConfiguration(
                "search fields must not be empty".to_string(),
            ));
        }
        let changed = {
            let mut config = self.config.write();
            let changed = config.search.search_fields != fields;
            config.search.search_fields = fields;
            changed
        };
        if changed {
            self.cache.lock().invalidate_by_pattern(|_| true);
        }
        Ok(())
    }
}
