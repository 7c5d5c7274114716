//! Combining per-keyword postings into a candidate set
//!
//! This module provides:
//! - merge_partial_and_full: promote words whose fragments all agree
//! - intersect_keyword_results: AND across keywords, short keywords weakened
//!
//! Sets are ordered (`BTreeSet`) so the candidate order is deterministic:
//! ascending object id.

use crate::tokenizer::{split_full_tokens, split_partial_keywords, strip_terminator};
use kwindex_core::ObjectId;
use std::collections::{BTreeMap, BTreeSet};
use tracing::trace;

/// A set of object ids
pub type IdSet = BTreeSet<ObjectId>;

/// Keyword -> ids posted for it
pub type KeywordResults = BTreeMap<String, IdSet>;

/// Keywords of at most this many characters only narrow results, never empty them
pub const SHORT_KEYWORD_MAX_CHARS: usize = 2;

/// Whether `keyword` gets the weakened short-keyword treatment
///
/// Single-character keys count as short too, not only two-character ones.
#[inline]
pub fn is_short_keyword(keyword: &str) -> bool {
    keyword.chars().count() <= SHORT_KEYWORD_MAX_CHARS
}

// ============================================================================
// Merge
// ============================================================================

/// Merge full-keyword and partial-keyword hits into per-word results
///
/// 1. Every full hit is seeded under its unterminated word.
/// 2. Every distinct word of `search_string` whose partial keywords are *all*
///    present in `results_by_partial_kw` gets the intersection of their ids
///    unioned into its entry (creating it if needed).
///
/// Words whose fragments are not all covered contribute nothing.
pub fn merge_partial_and_full(
    search_string: &str,
    results_by_full_kw: &KeywordResults,
    results_by_partial_kw: &KeywordResults,
) -> KeywordResults {
    let mut merged: KeywordResults = results_by_full_kw
        .iter()
        .map(|(kw, ids)| (strip_terminator(kw).to_string(), ids.clone()))
        .collect();

    let words: BTreeSet<String> = split_full_tokens(search_string).into_iter().collect();
    for word in words {
        let fragments = split_partial_keywords(&word);

        let mut fragment_sets = Vec::with_capacity(fragments.len());
        for fragment in &fragments {
            match results_by_partial_kw.get(fragment) {
                Some(ids) => fragment_sets.push(ids),
                None => break,
            }
        }
        if fragment_sets.is_empty() || fragment_sets.len() != fragments.len() {
            continue;
        }

        let common = intersect_all(&fragment_sets);
        trace!(word = %word, fragments = fragments.len(), common = common.len(), "promoted word");
        merged.entry(word).or_default().extend(common);
    }

    merged
}

fn intersect_all(sets: &[&IdSet]) -> IdSet {
    let mut iter = sets.iter();
    let mut result = match iter.next() {
        Some(first) => (*first).clone(),
        None => return IdSet::new(),
    };
    for set in iter {
        result.retain(|id| set.contains(id));
    }
    result
}

// ============================================================================
// Intersection
// ============================================================================

/// Intersect ids across all keywords
///
/// Normal keywords narrow unconditionally. Short keywords (see
/// [`is_short_keyword`]) narrow only when the narrowed set stays non-empty.
/// If every keyword is short, the first one seeds the set.
///
/// Empty input yields an empty set.
pub fn intersect_keyword_results(results: &KeywordResults) -> IdSet {
    let (short, normal): (Vec<_>, Vec<_>) =
        results.iter().partition(|(kw, _)| is_short_keyword(kw));

    let mut normal = normal.into_iter();
    let mut short = short.into_iter();

    let mut current = match normal.next().or_else(|| short.next()) {
        Some((_, ids)) => ids.clone(),
        None => return IdSet::new(),
    };

    for (_, ids) in normal {
        current.retain(|id| ids.contains(id));
    }

    for (kw, ids) in short {
        let narrowed: IdSet = current.intersection(ids).copied().collect();
        if narrowed.is_empty() {
            trace!(keyword = %kw, "short keyword would empty the result, ignored");
        } else {
            current = narrowed;
        }
    }

    current
}

// ============================================================================
// Tests
// ============================================================================
