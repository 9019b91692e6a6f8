//! Bounded edit distance for near-miss terms.
//!
//! `|len(a) - len(b)|` is a lower bound on edit distance, so pairs whose
//! lengths differ by more than the budget are rejected before any DP work.

/// Terms shorter than this never fuzzy match
pub const MIN_FUZZY_TERM_CHARS: usize = 3;

/// Maximum edit distance tolerated for a query term
pub fn max_distance(term: &str) -> usize {
    match term.chars().count() {
        n if n < MIN_FUZZY_TERM_CHARS => 0,
        3..=5 => 1,
        _ => 2,
    }
}

/// Are these strings within `max` edits of each other?
///
/// Character based (Unicode aware). Abandons the DP as soon as a whole row
/// exceeds `max`.
pub fn levenshtein_within(a: &str, b: &str, max: usize) -> bool {
    let a_len = a.chars().count();
    let b_len = b.chars().count();

    if a_len.abs_diff(b_len) > max {
        return false;
    }

    let b_chars: Vec<char> = b.chars().collect();
    let mut row: Vec<usize> = (0..=b_len).collect();

    for (i, ac) in a.chars().enumerate() {
        let mut prev = row[0];
        row[0] = i + 1;
        let mut min_row = row[0];

        for (j, bc) in b_chars.iter().enumerate() {
            let above = row[j + 1];
            let cost = usize::from(ac != *bc);
            row[j + 1] = (above + 1).min(row[j] + 1).min(prev + cost);
            prev = above;
            min_row = min_row.min(row[j + 1]);
        }

        if min_row > max {
            return false;
        }
    }

    row[b_len] <= max
}

/// Whether `word` is a near miss for `term` under [`max_distance`]
pub fn is_near_miss(term: &str, word: &str) -> bool {
    let max = max_distance(term);
    max > 0 && levenshtein_within(term, word, max)
}
