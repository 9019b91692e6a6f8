//! Tokenization, field weighting and term matching.
//!
//! The index and the linear scan both go through this module, which keeps the
//! two retrieval strategies in agreement on what matches and how much it
//! weighs.

use crate::search::fuzzy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use strum::Display;

/// Word equals the whole (normalized) field value
pub const EXACT_FIELD_WEIGHT: f64 = 10.0;

/// Word opens the field value
pub const FIELD_PREFIX_WEIGHT: f64 = 5.0;

/// Any other word occurrence
pub const WORD_BOUNDARY_WEIGHT: f64 = 3.0;

/// How a query term relates to an indexed word
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum MatchKind {
    Exact,
    Prefix,
    Substring,
    Fuzzy,
}

impl MatchKind {
    /// Fraction of the posting weight credited for this kind of match
    pub fn multiplier(self) -> f64 {
        match self {
            MatchKind::Exact => 1.0,
            MatchKind::Prefix => 0.6,
            MatchKind::Substring => 0.3,
            MatchKind::Fuzzy => 0.2,
        }
    }
}

/// Split text into words on whitespace and punctuation.
///
/// Words are lower-cased unless `case_sensitive` is set.
pub fn tokenize(text: &str, case_sensitive: bool) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|word| !word.is_empty())
        .map(|word| {
            if case_sensitive {
                word.to_string()
            } else {
                word.to_lowercase()
            }
        })
        .collect()
}

/// Distinct query terms in first-occurrence order
pub fn query_terms(text: &str, case_sensitive: bool) -> Vec<String> {
    let mut terms = tokenize(text, case_sensitive);
    let mut seen = std::collections::HashSet::new();
    terms.retain(|term| seen.insert(term.clone()));
    terms
}

/// Per-word weights for one field value, in first-occurrence order.
///
/// The first word scores [`EXACT_FIELD_WEIGHT`] when it is the entire value
/// and [`FIELD_PREFIX_WEIGHT`] otherwise; every later occurrence adds
/// [`WORD_BOUNDARY_WEIGHT`]. Repeated words accumulate into one entry. The
/// result is scaled by `priority`.
pub fn weigh_field(text: &str, case_sensitive: bool, priority: f64) -> Vec<(String, f64)> {
    let words = tokenize(text, case_sensitive);
    let single = words.len() == 1;

    let mut order: Vec<String> = Vec::new();
    let mut weights: HashMap<String, f64> = HashMap::new();

    for (position, word) in words.into_iter().enumerate() {
        let base = match position {
            0 if single => EXACT_FIELD_WEIGHT,
            0 => FIELD_PREFIX_WEIGHT,
            _ => WORD_BOUNDARY_WEIGHT,
        };
        match weights.get_mut(&word) {
            Some(weight) => *weight += base,
            None => {
                weights.insert(word.clone(), base);
                order.push(word);
            }
        }
    }

    order
        .into_iter()
        .map(|word| {
            let weight = weights[&word] * priority;
            (word, weight)
        })
        .collect()
}

/// Classify how `term` matches `word`.
///
/// Fuzzy matches are only considered when `allow_fuzzy` is set and the word
/// matches in no other way.
pub fn classify(term: &str, word: &str, allow_fuzzy: bool) -> Option<MatchKind> {
    if word == term {
        Some(MatchKind::Exact)
    } else if word.starts_with(term) {
        Some(MatchKind::Prefix)
    } else if word.contains(term) {
        Some(MatchKind::Substring)
    } else if allow_fuzzy && fuzzy::is_near_miss(term, word) {
        Some(MatchKind::Fuzzy)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_splits_on_punctuation() {
        assert_eq!(
            tokenize("Canon EOS-R5, 45MP!", false),
            vec!["canon", "eos", "r5", "45mp"]
        );
        assert_eq!(tokenize("Canon EOS", true), vec!["Canon", "EOS"]);
        assert!(tokenize("  ,;  ", false).is_empty());
    }

    #[test]
    fn test_query_terms_dedup() {
        assert_eq!(
            query_terms("lens LENS zoom lens", false),
            vec!["lens", "zoom"]
        );
    }

    #[test]
    fn test_weigh_field_positions() {
        assert_eq!(
            weigh_field("Camera", false, 1.0),
            vec![("camera".to_string(), EXACT_FIELD_WEIGHT)]
        );

        let weights = weigh_field("Camera strap for camera", false, 2.0);
        assert_eq!(weights[0].0, "camera");
        assert_eq!(
            weights[0].1,
            (FIELD_PREFIX_WEIGHT + WORD_BOUNDARY_WEIGHT) * 2.0
        );
        assert_eq!(weights[1], ("strap".to_string(), WORD_BOUNDARY_WEIGHT * 2.0));
        assert_eq!(weights.len(), 3);
    }

    #[test]
    fn test_classify_precedence() {
        assert_eq!(classify("lens", "lens", true), Some(MatchKind::Exact));
        assert_eq!(classify("lens", "lenses", true), Some(MatchKind::Prefix));
        assert_eq!(classify("ens", "lenses", true), Some(MatchKind::Substring));
        assert_eq!(classify("lems", "lens", true), Some(MatchKind::Fuzzy));
        assert_eq!(classify("lems", "lens", false), None);
        assert_eq!(classify("flash", "lens", true), None);
    }

    #[test]
    fn test_match_kind_ordering_of_multipliers() {
        assert!(MatchKind::Exact.multiplier() > MatchKind::Prefix.multiplier());
        assert!(MatchKind::Prefix.multiplier() > MatchKind::Substring.multiplier());
        assert!(MatchKind::Substring.multiplier() > MatchKind::Fuzzy.multiplier());
        assert_eq!(MatchKind::Substring.to_string(), "substring");
    }
}
