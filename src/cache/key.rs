//! Deterministic cache key generation

use crate::cache::error::CacheResult;
use crate::config::SearchSettings;
use crate::search::{FilterSet, Query};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::hash::{Hash, Hasher};

/// Trim, collapse internal whitespace and, unless matching is case-sensitive,
/// case-fold query text.
pub fn normalize_query_text(text: &str, case_sensitive: bool) -> String {
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if case_sensitive {
        collapsed
    } else {
        collapsed.to_lowercase()
    }
}

/// Decoded components of a cache key.
///
/// Serialized with a fixed field order and no maps, so the JSON encoding is
/// canonical.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyParts {
    pub text: String,
    pub filters: CanonicalFilters,
    pub fields: Vec<String>,
    pub case_sensitive: bool,
    pub enable_ranking: bool,
    pub enable_fuzzy: bool,
    pub max_results: usize,
}

/// Canonical filters with the price bounds stored as bit patterns so the
/// parts can be compared and hashed exactly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanonicalFilters {
    pub category: Option<String>,
    pub price_min: Option<u64>,
    pub price_max: Option<u64>,
    pub manufacturer: Option<String>,
    pub in_stock: Option<bool>,
    pub tags: Vec<String>,
}

impl From<&FilterSet> for CanonicalFilters {
    fn from(filters: &FilterSet) -> Self {
        let canonical = filters.canonical();
        // -0.0 and 0.0 select the same items
        let bits = |v: f64| (v + 0.0).to_bits();
        Self {
            category: canonical.category,
            price_min: canonical.price.and_then(|p| p.min).map(bits),
            price_max: canonical.price.and_then(|p| p.max).map(bits),
            manufacturer: canonical.manufacturer,
            in_stock: canonical.in_stock,
            tags: canonical.tags,
        }
    }
}

impl CanonicalFilters {
    pub fn price_min(&self) -> Option<f64> {
        self.price_min.map(f64::from_bits)
    }

    pub fn price_max(&self) -> Option<f64> {
        self.price_max.map(f64::from_bits)
    }
}

/// Fingerprint of a query's semantic identity
#[derive(Debug, Clone)]
pub struct CacheKey {
    fingerprint: String,
    parts: KeyParts,
}

impl CacheKey {
    /// Derive the key for `query` under `settings`.
    ///
    /// Logically identical queries (differing only in whitespace, case when
    /// case-insensitive, filter string padding/case, tag order or field order)
    /// produce the same key.
    pub fn generate(query: &Query, settings: &SearchSettings) -> CacheResult<Self> {
        let mut fields = settings.search_fields.clone();
        fields.sort();
        fields.dedup();

        let parts = KeyParts {
            text: normalize_query_text(&query.text, settings.case_sensitive),
            filters: CanonicalFilters::from(&query.filters),
            fields,
            case_sensitive: settings.case_sensitive,
            enable_ranking: settings.enable_ranking,
            enable_fuzzy: settings.enable_fuzzy,
            max_results: settings.max_results,
        };

        let encoded = serde_json::to_vec(&parts)?;
        let fingerprint = format!("{:x}", Sha256::digest(&encoded));

        Ok(Self { fingerprint, parts })
    }

    /// Hex SHA-256 of the canonical encoding
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    /// The components this key was derived from
    pub fn parts(&self) -> &KeyParts {
        &self.parts
    }
}

impl PartialEq for CacheKey {
    fn eq(&self, other: &Self) -> bool {
        self.fingerprint == other.fingerprint
    }
}

impl Eq for CacheKey {}

impl Hash for CacheKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.fingerprint.hash(state);
    }
}
