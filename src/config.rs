use crate::error::AppError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;
use validator::Validate;

/// Environment variable prefix for configuration overrides
pub const ENV_PREFIX: &str = "ADAPTIVE_SEARCH";

/// Main engine configuration
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct EngineConfig {
    /// Query execution settings
    #[validate(nested)]
    pub search: SearchSettings,

    /// Inverted index settings
    #[validate(nested)]
    pub index: IndexSettings,

    /// Result cache settings
    #[validate(nested)]
    pub cache: CacheSettings,

    /// Query analytics settings
    #[validate(nested)]
    pub analytics: AnalyticsSettings,
}

impl EngineConfig {
    /// Load configuration from the built-in defaults, an optional file and the
    /// environment (prefix `ADAPTIVE_SEARCH`, separator `__`).
    pub fn load(path: Option<&Path>) -> Result<Self, AppError> {
        let mut builder = config::Config::builder().add_source(config::File::from_str(
            include_str!("../config/default.toml"),
            config::FileFormat::Toml,
        ));

        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(true));
        }

        let config: EngineConfig = builder
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    /// Apply a partial update, returning which concerns changed
    pub fn apply(&mut self, options: &EngineOptions) -> ConfigChanges {
        let before = self.clone();

        if let Some(enabled) = options.enable_cache {
            self.cache.enabled = enabled;
        }
        if let Some(enabled) = options.enable_index {
            self.index.enabled = enabled;
        }
        if let Some(enabled) = options.enable_analytics {
            self.analytics.enabled = enabled;
        }
        if let Some(max) = options.max_results {
            self.search.max_results = max;
        }
        if let Some(fields) = &options.search_fields {
            self.search.search_fields = fields.clone();
        }
        if let Some(case_sensitive) = options.case_sensitive {
            self.search.case_sensitive = case_sensitive;
        }
        if let Some(ranking) = options.enable_ranking {
            self.search.enable_ranking = ranking;
        }
        if let Some(fuzzy) = options.enable_fuzzy {
            self.search.enable_fuzzy = fuzzy;
        }
        if let Some(ttl) = options.cache_ttl_secs {
            self.cache.ttl_secs = ttl;
        }
        if let Some(size) = options.cache_max_size {
            self.cache.max_size = size;
        }
        if let Some(threshold) = options.slow_search_threshold_ms {
            self.analytics.slow_search_threshold_ms = threshold;
        }
        if let Some(size) = options.max_history_size {
            self.analytics.max_history_size = size;
        }

        ConfigChanges {
            search: before.search != self.search,
            fields: before.search.search_fields != self.search.search_fields,
            index: before.index != self.index,
            cache: before.cache != self.cache,
            analytics: before.analytics != self.analytics,
        }
    }
}

/// Which sections an [`EngineConfig::apply`] call modified
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConfigChanges {
    pub search: bool,
    pub fields: bool,
    pub index: bool,
    pub cache: bool,
    pub analytics: bool,
}

/// Query execution settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct SearchSettings {
    /// Maximum results returned per search
    #[validate(range(min = 1))]
    pub max_results: usize,

    /// Item fields searched by text queries
    #[validate(length(min = 1))]
    pub search_fields: Vec<String>,

    /// Match text case-sensitively (always served by linear scan)
    pub case_sensitive: bool,

    /// Sort results by descending score
    pub enable_ranking: bool,

    /// Allow near-miss terms to match
    pub enable_fuzzy: bool,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            max_results: 50,
            search_fields: ["name", "description", "category", "manufacturer", "model", "tags"]
                .iter()
                .map(|f| f.to_string())
                .collect(),
            case_sensitive: false,
            enable_ranking: true,
            enable_fuzzy: true,
        }
    }
}

/// Inverted index settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct IndexSettings {
    /// Use the inverted index at all
    pub enabled: bool,

    /// Collections at least this large are considered "large"
    #[validate(range(min = 1))]
    pub min_items_for_index: usize,

    /// Queries with at least this many terms are considered complex
    #[validate(range(min = 1))]
    pub complex_query_terms: usize,

    /// Rebuild an index older than this (seconds)
    pub staleness_secs: u64,

    /// Weight multipliers for higher-priority fields
    pub priority_fields: HashMap<String, f64>,
}

impl IndexSettings {
    pub fn staleness(&self) -> Duration {
        Duration::from_secs(self.staleness_secs)
    }

    /// Weight multiplier for a field (1.0 unless configured)
    pub fn priority(&self, field: &str) -> f64 {
        self.priority_fields.get(field).copied().unwrap_or(1.0)
    }
}

impl Default for IndexSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            min_items_for_index: 100,
            complex_query_terms: 3,
            staleness_secs: 300,
            priority_fields: HashMap::from([("name".to_string(), 2.0)]),
        }
    }
}

/// Result cache settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct CacheSettings {
    /// Serve and store results through the cache
    pub enabled: bool,

    /// Entry time-to-live (seconds)
    pub ttl_secs: u64,

    /// Maximum number of entries
    #[validate(range(min = 1))]
    pub max_size: usize,

    /// Store searches that matched nothing
    pub cache_empty_results: bool,

    /// Time-to-live for empty results when they are cached (seconds)
    pub empty_result_ttl_secs: u64,
}

impl CacheSettings {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }

    pub fn empty_result_ttl(&self) -> Duration {
        Duration::from_secs(self.empty_result_ttl_secs)
    }
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            ttl_secs: 300,
            max_size: 100,
            cache_empty_results: false,
            empty_result_ttl_secs: 10,
        }
    }
}

/// Query analytics settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct AnalyticsSettings {
    /// Record searches
    pub enabled: bool,

    /// Searches slower than this are counted as slow (milliseconds)
    pub slow_search_threshold_ms: u64,

    /// Capacity of the search history ring buffer
    #[validate(range(min = 1))]
    pub max_history_size: usize,

    /// Capacity of the popular query table
    #[validate(range(min = 1))]
    pub max_tracked_queries: usize,
}

impl AnalyticsSettings {
    pub fn slow_search_threshold(&self) -> Duration {
        Duration::from_millis(self.slow_search_threshold_ms)
    }
}

impl Default for AnalyticsSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            slow_search_threshold_ms: 500,
            max_history_size: 1000,
            max_tracked_queries: 500,
        }
    }
}

/// Partial configuration update accepted by `SearchEngine::configure`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineOptions {
    pub enable_cache: Option<bool>,
    pub enable_index: Option<bool>,
    pub enable_analytics: Option<bool>,
    pub max_results: Option<usize>,
    pub search_fields: Option<Vec<String>>,
    pub case_sensitive: Option<bool>,
    pub enable_ranking: Option<bool>,
    pub enable_fuzzy: Option<bool>,
    pub cache_ttl_secs: Option<u64>,
    pub cache_max_size: Option<usize>,
    pub slow_search_threshold_ms: Option<u64>,
    pub max_history_size: Option<usize>,
}

/// Builder for EngineConfig
pub struct EngineConfigBuilder {
    config: EngineConfig,
}

impl EngineConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: EngineConfig::default(),
        }
    }

    pub fn max_results(mut self, max: usize) -> Self {
        self.config.search.max_results = max;
        self
    }

    pub fn search_fields(mut self, fields: Vec<impl Into<String>>) -> Self {
        self.config.search.search_fields = fields.into_iter().map(|f| f.into()).collect();
        self
    }

    pub fn case_sensitive(mut self, enabled: bool) -> Self {
        self.config.search.case_sensitive = enabled;
        self
    }

    pub fn enable_ranking(mut self, enabled: bool) -> Self {
        self.config.search.enable_ranking = enabled;
        self
    }

    pub fn enable_fuzzy(mut self, enabled: bool) -> Self {
        self.config.search.enable_fuzzy = enabled;
        self
    }

    pub fn enable_index(mut self, enabled: bool) -> Self {
        self.config.index.enabled = enabled;
        self
    }

    pub fn min_items_for_index(mut self, min: usize) -> Self {
        self.config.index.min_items_for_index = min;
        self
    }

    pub fn index_staleness(mut self, staleness: Duration) -> Self {
        self.config.index.staleness_secs = staleness.as_secs();
        self
    }

    pub fn field_priority(mut self, field: impl Into<String>, multiplier: f64) -> Self {
        self.config.index.priority_fields.insert(field.into(), multiplier);
        self
    }

    pub fn enable_cache(mut self, enabled: bool) -> Self {
        self.config.cache.enabled = enabled;
        self
    }

    pub fn cache_ttl(mut self, ttl: Duration) -> Self {
        self.config.cache.ttl_secs = ttl.as_secs();
        self
    }

    pub fn cache_max_size(mut self, size: usize) -> Self {
        self.config.cache.max_size = size;
        self
    }

    pub fn cache_empty_results(mut self, enabled: bool) -> Self {
        self.config.cache.cache_empty_results = enabled;
        self
    }

    pub fn enable_analytics(mut self, enabled: bool) -> Self {
        self.config.analytics.enabled = enabled;
        self
    }

    pub fn slow_search_threshold(mut self, threshold: Duration) -> Self {
        self.config.analytics.slow_search_threshold_ms = threshold.as_millis() as u64;
        self
    }

    pub fn max_history_size(mut self, size: usize) -> Self {
        self.config.analytics.max_history_size = size;
        self
    }

    pub fn build(self) -> EngineConfig {
        self.config
    }
}

impl Default for EngineConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_builtin_defaults_match_default_impl() {
        let loaded = EngineConfig::load(None).unwrap();
        assert_eq!(loaded, EngineConfig::default());
    }

    #[test]
    fn test_load_file_overrides() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "[search]\nmax_results = 5\n\n[cache]\nenabled = false").unwrap();

        let config = EngineConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.search.max_results, 5);
        assert!(!config.cache.enabled);
        assert_eq!(config.analytics.max_history_size, 1000);
    }

    #[test]
    fn test_validation_rejects_zero_sizes() {
        let config = EngineConfigBuilder::new().max_results(0).build();
        assert!(config.validate().is_err());

        let config = EngineConfigBuilder::new().cache_max_size(0).build();
        assert!(config.validate().is_err());

        let config = EngineConfigBuilder::new()
            .search_fields(Vec::<String>::new())
            .build();
        assert!(config.validate().is_err());

        assert!(EngineConfig::default().validate().is_ok());
    }

    #[test]
    fn test_apply_reports_changes() {
        let mut config = EngineConfig::default();

        let changes = config.apply(&EngineOptions {
            search_fields: Some(vec!["name".to_string()]),
            ..Default::default()
        });
        assert!(changes.fields);
        assert!(changes.search);
        assert!(!changes.cache);

        let changes = config.apply(&EngineOptions {
            enable_cache: Some(false),
            ..Default::default()
        });
        assert!(changes.cache);
        assert!(!changes.fields);
        assert!(!config.cache.enabled);

        let changes = config.apply(&EngineOptions::default());
        assert_eq!(changes, ConfigChanges::default());
    }

    #[test]
    fn test_priority_defaults() {
        let index = IndexSettings::default();
        assert_eq!(index.priority("name"), 2.0);
        assert_eq!(index.priority("description"), 1.0);
    }
}
