use crate::models::Item;
use crate::search::query::FilterSet;
use crate::search::results::{ScoredItem, SearchOutput};

/// Apply the active filters in fixed order: category, price, manufacturer,
/// stock, tags.
///
/// Returns the surviving hits and the descriptions of the active filters.
pub fn apply_filters(hits: Vec<ScoredItem>, filters: &FilterSet) -> (Vec<ScoredItem>, Vec<String>) {
    let filters = filters.canonical();
    let mut hits = hits;

    if let Some(category) = &filters.category {
        hits.retain(|hit| {
            hit.item
                .category
                .as_deref()
                .is_some_and(|c| c.trim().to_lowercase() == *category)
        });
    }

    if let Some(range) = &filters.price {
        hits.retain(|hit| hit.item.price.is_some_and(|price| range.contains(price)));
    }

    if let Some(manufacturer) = &filters.manufacturer {
        hits.retain(|hit| {
            hit.item
                .manufacturer
                .as_deref()
                .is_some_and(|m| m.to_lowercase().contains(manufacturer.as_str()))
        });
    }

    if let Some(in_stock) = filters.in_stock {
        hits.retain(|hit| hit.item.in_stock == in_stock);
    }

    if !filters.tags.is_empty() {
        hits.retain(|hit| hit.item.has_all_tags(&filters.tags));
    }

    (hits, filters.describe())
}

/// Whether a single item passes every active filter
pub fn matches_filters(item: &Item, filters: &FilterSet) -> bool {
    let (kept, _) = apply_filters(vec![ScoredItem::unscored(item.clone())], filters);
    !kept.is_empty()
}

/// Filter, optionally rank, and truncate raw hits.
///
/// `hits` must arrive in collection order. Ranking is a stable sort on
/// descending score, so equal scores keep collection order.
pub fn finalize(
    hits: Vec<ScoredItem>,
    filters: &FilterSet,
    enable_ranking: bool,
    max_results: usize,
) -> SearchOutput {
    let (mut hits, applied_filters) = apply_filters(hits, filters);

    if enable_ranking {
        hits.sort_by(|a, b| b.score.total_cmp(&a.score));
    }

    let total_matches = hits.len();
    let truncated = total_matches > max_results;
    hits.truncate(max_results);

    SearchOutput {
        results: hits,
        total_matches,
        applied_filters,
        truncated,
    }
}
