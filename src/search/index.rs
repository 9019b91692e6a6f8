//! In-memory inverted index over designated item fields

use crate::config::IndexSettings;
use crate::models::Item;
use crate::search::error::{SearchError, SearchResult};
use crate::search::results::ScoredItem;
use crate::search::tokenizer::{self, MatchKind};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::ops::Bound;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info};

/// Index statistics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexStats {
    /// Whether a build has completed since the last clear
    pub is_built: bool,

    /// Number of indexed items
    pub total_items: usize,

    /// Number of distinct words
    pub total_words: usize,

    /// Number of (word, item, field) postings
    pub total_postings: usize,

    /// Duration of the last full build in milliseconds
    pub build_time_ms: f64,

    /// Approximate heap footprint in bytes
    pub memory_usage_bytes: usize,

    /// Fields the index was built over
    pub fields: Vec<String>,

    /// Completion time of the last full build
    pub built_at: Option<DateTime<Utc>>,
}

/// Index hits plus the index state they were computed against
#[derive(Debug, Clone)]
pub struct IndexSearchOutput {
    pub results: Vec<ScoredItem>,
    pub stats: IndexStats,
}

/// One (item, field) occurrence of a word. Repeated occurrences within the
/// same field are folded into `weight`.
#[derive(Debug, Clone)]
struct Posting {
    item_id: Arc<str>,
    field: Arc<str>,
    weight: f64,
}

/// Inverted index: word → postings
pub struct TextIndex {
    priorities: HashMap<String, f64>,
    fields: Vec<String>,
    postings: BTreeMap<String, Vec<Posting>>,
    item_words: HashMap<Arc<str>, HashSet<String>>,
    documents: HashMap<Arc<str>, Item>,
    built: bool,
    build_time: Duration,
    built_at: Option<DateTime<Utc>>,
    built_instant: Option<Instant>,
    source_len: usize,
}

impl TextIndex {
    pub fn new(settings: &IndexSettings) -> Self {
        Self {
            priorities: settings.priority_fields.clone(),
            fields: Vec::new(),
            postings: BTreeMap::new(),
            item_words: HashMap::new(),
            documents: HashMap::new(),
            built: false,
            build_time: Duration::ZERO,
            built_at: None,
            built_instant: None,
            source_len: 0,
        }
    }

    /// Build a fresh index on the blocking pool so the caller's task is free
    /// to make progress meanwhile.
    pub async fn build_detached(
        settings: IndexSettings,
        items: Vec<Item>,
        fields: Vec<String>,
    ) -> SearchResult<TextIndex> {
        let mut index = tokio::task::spawn_blocking(move || {
            let mut index = TextIndex::new(&settings);
            index.build(&items, &fields);
            index
        })
        .await
        .map_err(|e| SearchError::IndexBuildFailed(e.to_string()))?;

        index.built_instant = Some(Instant::now());
        Ok(index)
    }

    /// Full rebuild over `items`, indexing `fields`.
    ///
    /// Malformed items are skipped. Later duplicates of an id replace earlier
    /// ones.
    pub fn build(&mut self, items: &[Item], fields: &[String]) {
        let started = std::time::Instant::now();
        self.clear();
        self.fields = fields.to_vec();

        let mut skipped = 0usize;
        for item in items {
            self.remove_postings(&item.id);
            if !self.insert_item(item, fields) {
                skipped += 1;
            }
        }

        self.source_len = items.len();
        self.built = true;
        self.build_time = started.elapsed();
        self.built_at = Some(Utc::now());
        self.built_instant = Some(Instant::now());

        info!(
            items = self.documents.len(),
            words = self.postings.len(),
            skipped,
            elapsed_ms = self.build_time.as_secs_f64() * 1000.0,
            "Search index built"
        );
    }

    pub fn is_built(&self) -> bool {
        self.built
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    pub fn contains(&self, item_id: &str) -> bool {
        self.documents.contains_key(item_id)
    }

    /// Whether the index should be rebuilt before serving a snapshot of
    /// `snapshot_len` items
    pub fn is_stale(&self, max_age: Duration, snapshot_len: usize) -> bool {
        match self.built_instant {
            Some(built) if self.built => {
                built.elapsed() > max_age || self.source_len != snapshot_len
            }
            _ => true,
        }
    }

    pub fn stats(&self) -> IndexStats {
        IndexStats {
            is_built: self.built,
            total_items: self.documents.len(),
            total_words: self.postings.len(),
            total_postings: self.postings.values().map(Vec::len).sum(),
            build_time_ms: self.build_time.as_secs_f64() * 1000.0,
            memory_usage_bytes: self.estimate_memory(),
            fields: self.fields.clone(),
            built_at: self.built_at,
        }
    }

    /// Search free text.
    ///
    /// Empty or whitespace-only text yields no results. Results are returned
    /// by descending score for convenience; callers own the final ranking.
    pub fn search(&self, text: &str, fuzzy: bool) -> SearchResult<IndexSearchOutput> {
        let terms = tokenizer::query_terms(text, false);
        let results = self.search_terms(&terms, fuzzy)?;
        Ok(IndexSearchOutput {
            results,
            stats: self.stats(),
        })
    }

    /// Score every item matching at least one of `terms` (already tokenized).
    ///
    /// Fuzzy matching applies only to terms without an exact posting.
    pub fn search_terms(&self, terms: &[String], fuzzy: bool) -> SearchResult<Vec<ScoredItem>> {
        if !self.built {
            return Err(SearchError::IndexUnready);
        }

        let mut hits: HashMap<Arc<str>, ScoredItem> = HashMap::new();
        for term in terms {
            let allow_fuzzy = fuzzy && !self.postings.contains_key(term.as_str());
            for (word, kind) in self.candidate_words(term, allow_fuzzy) {
                for posting in &self.postings[word] {
                    let item = self.documents.get(&posting.item_id).ok_or_else(|| {
                        SearchError::SearchFailed(format!(
                            "posting for '{}' references unknown item {}",
                            word, posting.item_id
                        ))
                    })?;
                    hits.entry(posting.item_id.clone())
                        .or_insert_with(|| ScoredItem::unscored(item.clone()))
                        .add_match(&posting.field, term, kind, posting.weight);
                }
            }
        }

        let mut results: Vec<ScoredItem> = hits.into_values().filter(|hit| hit.score > 0.0).collect();
        results.sort_by(|a, b| {
            b.score
                .total_cmp(&a.score)
                .then_with(|| a.item.id.cmp(&b.item.id))
        });
        Ok(results)
    }

    /// Words matching `term`, with how they match.
    ///
    /// Exact and prefix matches form one contiguous range of the sorted
    /// vocabulary; substring and fuzzy matches need a vocabulary scan.
    fn candidate_words<'a>(&'a self, term: &str, allow_fuzzy: bool) -> Vec<(&'a str, MatchKind)> {
        let mut words = Vec::new();

        for word in self
            .postings
            .range::<str, _>((Bound::Included(term), Bound::Unbounded))
            .map(|(word, _)| word)
            .take_while(|word| word.starts_with(term))
        {
            let kind = if word == term {
                MatchKind::Exact
            } else {
                MatchKind::Prefix
            };
            words.push((word.as_str(), kind));
        }

        for word in self.postings.keys().filter(|word| !word.starts_with(term)) {
            if let Some(kind) = tokenizer::classify(term, word, allow_fuzzy) {
                words.push((word.as_str(), kind));
            }
        }

        words
    }

    /// Replace the postings of one item without a full rebuild
    pub fn update_item(&mut self, item: &Item, fields: &[String]) {
        let known = self.remove_postings(&item.id);
        if !known {
            self.source_len += 1;
        }
        self.insert_item(item, fields);
        debug!(item_id = %item.id, known, "Index entry updated");
    }

    /// Remove every posting of an item; returns whether it was indexed
    pub fn remove_item(&mut self, item_id: &str) -> bool {
        let removed = self.remove_postings(item_id);
        if removed {
            self.source_len = self.source_len.saturating_sub(1);
        }
        removed
    }

    /// Discard all postings and mark the index unbuilt
    pub fn clear(&mut self) {
        self.postings.clear();
        self.item_words.clear();
        self.documents.clear();
        self.fields.clear();
        self.built = false;
        self.built_at = None;
        self.built_instant = None;
        self.source_len = 0;
    }

    /// Drop an item's stored copy but leave its postings dangling
    #[cfg(test)]
    pub(crate) fn forget_document(&mut self, item_id: &str) {
        self.documents.remove(item_id);
    }

    fn insert_item(&mut self, item: &Item, fields: &[String]) -> bool {
        if let Err(e) = item.check() {
            debug!(error = %e, "Skipping malformed item");
            return false;
        }

        let id: Arc<str> = Arc::from(item.id.as_str());
        let mut words = HashSet::new();

        for field in fields {
            let Some(text) = item.field_text(field) else {
                continue;
            };
            let field_name: Arc<str> = Arc::from(field.as_str());
            let priority = self.priorities.get(field).copied().unwrap_or(1.0);

            for (word, weight) in tokenizer::weigh_field(&text, false, priority) {
                self.postings.entry(word.clone()).or_default().push(Posting {
                    item_id: id.clone(),
                    field: field_name.clone(),
                    weight,
                });
                words.insert(word);
            }
        }

        self.item_words.insert(id.clone(), words);
        self.documents.insert(id, item.clone());
        true
    }

    fn remove_postings(&mut self, item_id: &str) -> bool {
        let Some(words) = self.item_words.remove(item_id) else {
            return false;
        };

        for word in words {
            if let Some(list) = self.postings.get_mut(&word) {
                list.retain(|posting| &*posting.item_id != item_id);
                if list.is_empty() {
                    self.postings.remove(&word);
                }
            }
        }
        self.documents.remove(item_id);
        true
    }

    fn estimate_memory(&self) -> usize {
        let postings: usize = self
            .postings
            .iter()
            .map(|(word, list)| {
                word.len()
                    + std::mem::size_of::<Vec<Posting>>()
                    + list.len() * std::mem::size_of::<Posting>()
            })
            .sum();
        let reverse: usize = self
            .item_words
            .values()
            .map(|words| words.iter().map(String::len).sum::<usize>())
            .sum();
        let documents = self.documents.len() * std::mem::size_of::<Item>();

        postings + reverse + documents
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields() -> Vec<String> {
        vec!["name".to_string(), "description".to_string()]
    }

    fn catalog() -> Vec<Item> {
        vec![
            Item::new("1", "Camera").with_description("Full frame mirrorless camera body"),
            Item::new("2", "Lens").with_description("Standard prime lens for cameras"),
            Item::new("3", "Camera Strap").with_description("Leather strap"),
        ]
    }

    fn built_index(items: &[Item]) -> TextIndex {
        let mut index = TextIndex::new(&IndexSettings::default());
        index.build(items, &fields());
        index
    }

    fn ids(results: &[ScoredItem]) -> Vec<&str> {
        let mut ids: Vec<&str> = results.iter().map(|r| r.item.id.as_str()).collect();
        ids.sort();
        ids
    }

    #[test]
    fn test_search_before_build_is_unready() {
        let index = TextIndex::new(&IndexSettings::default());
        assert!(matches!(
            index.search("camera", false),
            Err(SearchError::IndexUnready)
        ));
    }

    #[test]
    fn test_exact_and_prefix_lookup() {
        let index = built_index(&catalog());

        let output = index.search("camera", false).unwrap();
        // "cameras" in item 2 is a prefix match
        assert_eq!(ids(&output.results), vec!["1", "2", "3"]);
        assert!(output.stats.is_built);

        let top = &output.results[0];
        assert_eq!(top.item.id, "1");
        assert!(top.matches.iter().any(|m| m.field == "name" && m.kind == MatchKind::Exact));
    }

    #[test]
    fn test_name_field_outweighs_description() {
        let items = vec![
            Item::new("a", "Tripod"),
            Item::new("b", "Stand").with_description("Tripod"),
        ];
        let index = built_index(&items);
        let results = index.search("tripod", false).unwrap().results;

        assert_eq!(results[0].item.id, "a");
        assert!(results[0].score > results[1].score);
    }

    #[test]
    fn test_fuzzy_only_for_terms_without_exact_postings() {
        let index = built_index(&catalog());

        assert!(index.search("camra", false).unwrap().results.is_empty());

        let fuzzy = index.search("camra", true).unwrap().results;
        assert!(ids(&fuzzy).contains(&"1"));
        assert!(fuzzy[0]
            .matches
            .iter()
            .all(|m| m.kind == MatchKind::Fuzzy || m.kind == MatchKind::Substring));
    }

    #[test]
    fn test_empty_query_returns_nothing() {
        let index = built_index(&catalog());
        assert!(index.search("   ", true).unwrap().results.is_empty());
        assert!(index.search("", true).unwrap().results.is_empty());
    }

    #[test]
    fn test_duplicate_words_fold_into_one_posting() {
        let items = vec![Item::new("1", "Camera camera CAMERA")];
        let index = built_index(&items);
        let stats = index.stats();

        assert_eq!(stats.total_words, 1);
        assert_eq!(stats.total_postings, 1);
    }

    #[test]
    fn test_rebuild_is_idempotent() {
        let items = catalog();
        let mut index = built_index(&items);
        let first = index.stats();
        index.build(&items, &fields());
        let second = index.stats();

        assert_eq!(first.total_words, second.total_words);
        assert_eq!(first.total_items, second.total_items);
        assert_eq!(first.total_postings, second.total_postings);
    }

    #[test]
    fn test_update_item_replaces_postings() {
        let mut index = built_index(&catalog());
        let words_before = index.stats().total_words;

        index.update_item(&Item::new("3", "Neck Strap").with_description("Leather strap"), &fields());

        let results = index.search("camera", false).unwrap().results;
        assert!(!ids(&results).contains(&"3"));
        assert_eq!(ids(&index.search("neck", false).unwrap().results), vec!["3"]);
        assert_eq!(index.stats().total_items, 3);
        // "neck" is new; "camera" survives through item 1
        assert_eq!(index.stats().total_words, words_before + 1);
    }

    #[test]
    fn test_remove_item_prunes_empty_postings() {
        let mut index = built_index(&catalog());

        assert!(index.remove_item("3"));
        assert!(!index.remove_item("3"));
        assert!(index.search("leather", false).unwrap().results.is_empty());
        assert!(index.search("strap", false).unwrap().results.is_empty());
        assert_eq!(index.stats().total_items, 2);
    }

    #[test]
    fn test_malformed_and_empty_items() {
        let items = vec![
            Item::new("", "Ghost camera"),
            Item::new("x", ""),
            Item::new("y", "Camera"),
        ];
        let index = built_index(&items);

        assert_eq!(index.stats().total_items, 2);
        assert_eq!(ids(&index.search("camera", false).unwrap().results), vec!["y"]);
    }

    #[test]
    fn test_duplicate_id_keeps_last_occurrence() {
        let items = vec![Item::new("1", "Camera"), Item::new("1", "Lens")];
        let index = built_index(&items);

        assert_eq!(index.stats().total_items, 1);
        assert!(index.search("camera", false).unwrap().results.is_empty());

        let results = index.search("lens", false).unwrap().results;
        assert_eq!(ids(&results), vec!["1"]);
        assert_eq!(results[0].item.name, "Lens");
    }

    #[test]
    fn test_dangling_posting_is_an_error() {
        let mut index = built_index(&catalog());
        index.forget_document("2");

        assert!(matches!(
            index.search("lens", false),
            Err(SearchError::SearchFailed(_))
        ));
    }

    #[test]
    fn test_clear_resets_state() {
        let mut index = built_index(&catalog());
        index.clear();

        let stats = index.stats();
        assert!(!stats.is_built);
        assert_eq!(stats.total_words, 0);
        assert!(index.is_stale(Duration::from_secs(300), 0));
    }

    #[tokio::test(start_paused = true)]
    async fn test_staleness() {
        let items = catalog();
        let mut index = built_index(&items);
        let max_age = Duration::from_secs(300);

        assert!(!index.is_stale(max_age, items.len()));
        assert!(index.is_stale(max_age, items.len() + 1));

        index.update_item(&Item::new("4", "Flash"), &fields());
        assert!(!index.is_stale(max_age, items.len() + 1));

        tokio::time::advance(Duration::from_secs(301)).await;
        assert!(index.is_stale(max_age, items.len() + 1));
    }

    #[tokio::test]
    async fn test_build_detached() {
        let index = TextIndex::build_detached(IndexSettings::default(), catalog(), fields())
            .await
            .unwrap();

        let stats = index.stats();
        assert!(stats.is_built);
        assert_eq!(stats.total_items, 3);
        assert!(stats.memory_usage_bytes > 0);
        assert_eq!(stats.fields, fields());
    }
}
