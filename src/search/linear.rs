//! Chunked linear scan over a caller's item snapshot

use crate::models::Item;
use crate::search::results::ScoredItem;
use crate::search::tokenizer::{self, MatchKind};
use std::collections::{BTreeMap, HashMap, HashSet};
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Items examined between suspension points
pub const SCAN_CHUNK_SIZE: usize = 512;

/// Matching options for a scan
#[derive(Debug, Clone, Copy)]
pub struct ScanOptions<'a> {
    pub fields: &'a [String],
    pub case_sensitive: bool,
    pub fuzzy: bool,
    pub priorities: &'a HashMap<String, f64>,
}

impl ScanOptions<'_> {
    fn priority(&self, field: &str) -> f64 {
        self.priorities.get(field).copied().unwrap_or(1.0)
    }
}

/// A fuzzy match held back until the scan knows whether its term matched
/// exactly anywhere in the collection.
struct PendingFuzzy {
    position: usize,
    field: String,
    term: String,
    weight: f64,
}

/// Position of the last occurrence of every id in `items`.
///
/// When a snapshot repeats an id, only the last occurrence is searchable.
/// The index keeps the last posting set it saw for an id, and the scan skips
/// earlier occurrences so both paths select the same items.
pub(crate) fn latest_positions(items: &[Item]) -> HashMap<&str, usize> {
    items
        .iter()
        .enumerate()
        .map(|(position, item)| (item.id.as_str(), position))
        .collect()
}

/// Score every item against `terms`, yielding to the runtime between chunks.
///
/// Hits come back in collection order. With no terms every well-formed item is
/// a candidate with score 0. An item whose id reappears later in the snapshot
/// is skipped. Returns `None` when `cancel` fires mid-scan.
pub async fn scan(
    items: &[Item],
    terms: &[String],
    options: &ScanOptions<'_>,
    cancel: &CancellationToken,
) -> Option<Vec<ScoredItem>> {
    let mut hits: BTreeMap<usize, ScoredItem> = BTreeMap::new();
    let mut pending: Vec<PendingFuzzy> = Vec::new();
    let mut exact_terms: HashSet<&str> = HashSet::new();
    let latest = latest_positions(items);

    for (chunk_index, chunk) in items.chunks(SCAN_CHUNK_SIZE).enumerate() {
        if cancel.is_cancelled() {
            debug!(scanned = chunk_index * SCAN_CHUNK_SIZE, "Linear scan cancelled");
            return None;
        }

        for (offset, item) in chunk.iter().enumerate() {
            let position = chunk_index * SCAN_CHUNK_SIZE + offset;
            if latest.get(item.id.as_str()) != Some(&position) {
                debug!(item_id = %item.id, "Skipping shadowed duplicate id");
                continue;
            }
            if let Err(e) = item.check() {
                debug!(error = %e, "Skipping malformed item");
                continue;
            }

            if terms.is_empty() {
                hits.insert(position, ScoredItem::unscored(item.clone()));
                continue;
            }

            for field in options.fields {
                let Some(text) = item.field_text(field) else {
                    continue;
                };
                let priority = options.priority(field);

                for (word, weight) in tokenizer::weigh_field(&text, options.case_sensitive, priority) {
                    for term in terms {
                        match tokenizer::classify(term, &word, options.fuzzy) {
                            Some(MatchKind::Fuzzy) => pending.push(PendingFuzzy {
                                position,
                                field: field.clone(),
                                term: term.clone(),
                                weight,
                            }),
                            Some(kind) => {
                                if kind == MatchKind::Exact {
                                    exact_terms.insert(term.as_str());
                                }
                                hits.entry(position)
                                    .or_insert_with(|| ScoredItem::unscored(item.clone()))
                                    .add_match(field, term, kind, weight);
                            }
                            None => {}
                        }
                    }
                }
            }
        }

        tokio::task::yield_now().await;
    }

    if cancel.is_cancelled() {
        return None;
    }

    for fuzzy in pending {
        if exact_terms.contains(fuzzy.term.as_str()) {
            continue;
        }
        hits.entry(fuzzy.position)
            .or_insert_with(|| ScoredItem::unscored(items[fuzzy.position].clone()))
            .add_match(&fuzzy.field, &fuzzy.term, MatchKind::Fuzzy, fuzzy.weight);
    }

    let results: Vec<ScoredItem> = if terms.is_empty() {
        hits.into_values().collect()
    } else {
        hits.into_values().filter(|hit| hit.score > 0.0).collect()
    };
    Some(results)
}
