//! Search output types

use crate::models::Item;
use crate::search::tokenizer::MatchKind;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use strum::Display;

/// Where a response came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Source {
    Cache,
    Index,
    Linear,
}

/// A single matched term within a field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TermMatch {
    pub field: String,
    pub term: String,
    pub kind: MatchKind,
}

/// A matching item with its relevance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredItem {
    pub item: Item,
    pub score: f64,
    pub matches: Vec<TermMatch>,
}

impl ScoredItem {
    /// An item selected without a text query
    pub fn unscored(item: Item) -> Self {
        Self {
            item,
            score: 0.0,
            matches: Vec::new(),
        }
    }

    /// Record a match, keeping one entry per (field, term) at its strongest kind
    pub(crate) fn add_match(&mut self, field: &str, term: &str, kind: MatchKind, weight: f64) {
        self.score += weight * kind.multiplier();
        match self
            .matches
            .iter_mut()
            .find(|m| m.field == field && m.term == term)
        {
            Some(existing) => existing.kind = existing.kind.min(kind),
            None => self.matches.push(TermMatch {
                field: field.to_string(),
                term: term.to_string(),
                kind,
            }),
        }
    }
}

/// Filtered, ranked and truncated result set. This is what the cache stores.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchOutput {
    /// At most `max_results` hits
    pub results: Vec<ScoredItem>,

    /// Number of hits before truncation
    pub total_matches: usize,

    /// Descriptions of the filters that were active
    pub applied_filters: Vec<String>,

    /// Whether `results` was cut to `max_results`
    pub truncated: bool,
}

impl SearchOutput {
    pub fn empty(applied_filters: Vec<String>) -> Self {
        Self {
            results: Vec::new(),
            total_matches: 0,
            applied_filters,
            truncated: false,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.total_matches == 0
    }

    /// Identifiers of the returned items, in result order
    pub fn ids(&self) -> Vec<&str> {
        self.results.iter().map(|hit| hit.item.id.as_str()).collect()
    }
}

/// A search output plus provenance metadata for one call
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResponse {
    #[serde(flatten)]
    pub output: SearchOutput,

    /// Wall time of this call in milliseconds
    pub search_time_ms: f64,

    /// Served from the result cache
    pub cache_hit: bool,

    /// Retrieved through the inverted index
    pub index_used: bool,

    /// Provenance
    pub source: Source,
}

impl SearchResponse {
    pub(crate) fn new(output: SearchOutput, elapsed: Duration, source: Source) -> Self {
        Self {
            output,
            search_time_ms: elapsed.as_secs_f64() * 1000.0,
            cache_hit: source == Source::Cache,
            index_used: source == Source::Index,
            source,
        }
    }

    pub fn results(&self) -> &[ScoredItem] {
        &self.output.results
    }

    pub fn total_matches(&self) -> usize {
        self.output.total_matches
    }

    pub fn truncated(&self) -> bool {
        self.output.truncated
    }
}
