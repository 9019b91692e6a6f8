//! Search query and filter definitions

use crate::search::error::{SearchError, SearchResult};
use serde::{Deserialize, Serialize};

/// Inclusive price bounds; either side may be open
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PriceRange {
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl PriceRange {
    pub fn new(min: Option<f64>, max: Option<f64>) -> Self {
        Self { min, max }
    }

    /// Closed range `[min, max]`
    pub fn between(min: f64, max: f64) -> Self {
        Self::new(Some(min), Some(max))
    }

    pub fn contains(&self, price: f64) -> bool {
        self.min.map_or(true, |min| price >= min) && self.max.map_or(true, |max| price <= max)
    }

    fn is_open(&self) -> bool {
        self.min.is_none() && self.max.is_none()
    }

    fn describe(&self) -> String {
        match (self.min, self.max) {
            (Some(min), Some(max)) => format!("price: {}-{}", min, max),
            (Some(min), None) => format!("price: >= {}", min),
            (None, Some(max)) => format!("price: <= {}", max),
            (None, None) => "price: any".to_string(),
        }
    }
}

/// Structured predicates applied after text retrieval.
///
/// String predicates match case-insensitively. An empty `tags` list and
/// `None` fields are inactive.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterSet {
    /// Category equality
    pub category: Option<String>,

    /// Inclusive price range
    pub price: Option<PriceRange>,

    /// Manufacturer substring
    pub manufacturer: Option<String>,

    /// Stock flag equality
    pub in_stock: Option<bool>,

    /// Tags that must all be present
    #[serde(default)]
    pub tags: Vec<String>,
}

impl FilterSet {
    /// Reject filters that cannot be evaluated
    pub fn validate(&self) -> SearchResult<()> {
        if let Some(range) = &self.price {
            for bound in [range.min, range.max].into_iter().flatten() {
                if !bound.is_finite() {
                    return Err(SearchError::InvalidFilter(format!(
                        "price bound must be finite, got {}",
                        bound
                    )));
                }
                if bound < 0.0 {
                    return Err(SearchError::InvalidFilter(format!(
                        "price bound must not be negative, got {}",
                        bound
                    )));
                }
            }
            if let (Some(min), Some(max)) = (range.min, range.max) {
                if min > max {
                    return Err(SearchError::InvalidFilter(format!(
                        "price range is inverted: {} > {}",
                        min, max
                    )));
                }
            }
        }
        Ok(())
    }

    /// Canonical form: trimmed, case-folded, blank predicates dropped, tags
    /// sorted and de-duplicated.
    ///
    /// Two filter sets that select the same items have equal canonical forms.
    pub fn canonical(&self) -> FilterSet {
        let clean = |value: &Option<String>| {
            value
                .as_deref()
                .map(|v| v.trim().to_lowercase())
                .filter(|v| !v.is_empty())
        };

        let mut tags: Vec<String> = self
            .tags
            .iter()
            .map(|t| t.trim().to_lowercase())
            .filter(|t| !t.is_empty())
            .collect();
        tags.sort();
        tags.dedup();

        FilterSet {
            category: clean(&self.category),
            price: self.price.filter(|range| !range.is_open()),
            manufacturer: clean(&self.manufacturer),
            in_stock: self.in_stock,
            tags,
        }
    }

    /// Number of active predicates
    pub fn active_count(&self) -> usize {
        let canonical = self.canonical();
        [
            canonical.category.is_some(),
            canonical.price.is_some(),
            canonical.manufacturer.is_some(),
            canonical.in_stock.is_some(),
            !canonical.tags.is_empty(),
        ]
        .into_iter()
        .filter(|active| *active)
        .count()
    }

    pub fn is_empty(&self) -> bool {
        self.active_count() == 0
    }

    /// Human readable descriptions of the active predicates, in application order
    pub fn describe(&self) -> Vec<String> {
        let canonical = self.canonical();
        let mut applied = Vec::new();

        if let Some(category) = &canonical.category {
            applied.push(format!("category: {}", category));
        }
        if let Some(range) = &canonical.price {
            applied.push(range.describe());
        }
        if let Some(manufacturer) = &canonical.manufacturer {
            applied.push(format!("manufacturer: {}", manufacturer));
        }
        if let Some(in_stock) = canonical.in_stock {
            applied.push(if in_stock { "in stock" } else { "out of stock" }.to_string());
        }
        if !canonical.tags.is_empty() {
            applied.push(format!("tags: {}", canonical.tags.join(", ")));
        }

        applied
    }
}

/// Free text plus structured filters
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Query {
    /// Free text; split into terms on whitespace and punctuation
    pub text: String,

    /// Filters to apply
    #[serde(default)]
    pub filters: FilterSet,
}

impl Query {
    /// Create a new text query without filters
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            filters: FilterSet::default(),
        }
    }

    /// Set filters
    pub fn with_filters(mut self, filters: FilterSet) -> Self {
        self.filters = filters;
        self
    }

    /// Filter by category
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.filters.category = Some(category.into());
        self
    }

    /// Filter by inclusive price range
    pub fn with_price_range(mut self, min: Option<f64>, max: Option<f64>) -> Self {
        self.filters.price = Some(PriceRange::new(min, max));
        self
    }

    /// Filter by manufacturer substring
    pub fn with_manufacturer(mut self, manufacturer: impl Into<String>) -> Self {
        self.filters.manufacturer = Some(manufacturer.into());
        self
    }

    /// Filter by stock flag
    pub fn with_stock(mut self, in_stock: bool) -> Self {
        self.filters.in_stock = Some(in_stock);
        self
    }

    /// Require tags
    pub fn with_tags(mut self, tags: Vec<impl Into<String>>) -> Self {
        self.filters.tags = tags.into_iter().map(|t| t.into()).collect();
        self
    }
}
