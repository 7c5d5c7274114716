//! Keyword tokenizer
//!
//! Produces the two token views used by the index:
//! - full keywords: whole words terminated with `$`, for exact matches
//! - partial keywords: 3-character windows of each word, for fuzzy matches
//!
//! The same normalization (lowercase, split on non-alphanumeric) is used when
//! chunks are built and when queries are answered.

use std::collections::BTreeSet;

/// Suffix marking a full-word keyword
pub const FULL_KEYWORD_TERMINATOR: char = '$';

/// Window width of partial keywords, in characters
pub const PARTIAL_KEYWORD_WIDTH: usize = 3;

/// Split text into whole words, in order, duplicates kept
///
/// - Lowercase
/// - Split on non-alphanumeric characters
/// - Drop empty pieces
///
/// # Example
///
/// ```
/// use kwindex_search::tokenizer::split_full_tokens;
///
/// let words = split_full_tokens("Pump-Station, pump 2");
/// assert_eq!(words, vec!["pump", "station", "pump", "2"]);
/// ```
pub fn split_full_tokens(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

/// Full-word keywords of `text`, each terminated with `$`
///
/// # Example
///
/// ```
/// use kwindex_search::tokenizer::split_full_keywords;
///
/// let kws: Vec<_> = split_full_keywords("big apple").into_iter().collect();
/// assert_eq!(kws, vec!["apple$", "big$"]);
/// ```
pub fn split_full_keywords(text: &str) -> BTreeSet<String> {
    split_full_tokens(text)
        .into_iter()
        .map(|mut word| {
            word.push(FULL_KEYWORD_TERMINATOR);
            word
        })
        .collect()
}

/// Partial keywords of `text`
///
/// Words shorter than three characters are kept whole; longer words
/// contribute every 3-character window.
///
/// # Example
///
/// ```
/// use kwindex_search::tokenizer::split_partial_keywords;
///
/// let kws: Vec<_> = split_partial_keywords("apple").into_iter().collect();
/// assert_eq!(kws, vec!["app", "ple", "ppl"]);
/// ```
pub fn split_partial_keywords(text: &str) -> BTreeSet<String> {
    let mut tokens = BTreeSet::new();
    for word in split_full_tokens(text) {
        add_word_fragments(&word, &mut tokens);
    }
    tokens
}

fn add_word_fragments(word: &str, tokens: &mut BTreeSet<String>) {
    let chars: Vec<char> = word.chars().collect();
    if chars.len() < PARTIAL_KEYWORD_WIDTH {
        tokens.insert(word.to_string());
        return;
    }
    for window in chars.windows(PARTIAL_KEYWORD_WIDTH) {
        tokens.insert(window.iter().collect());
    }
}

/// Whether `token` is a full-word keyword
#[inline]
pub fn is_full_keyword(token: &str) -> bool {
    token.ends_with(FULL_KEYWORD_TERMINATOR)
}

/// Strip the full-word terminator, if present
#[inline]
pub fn strip_terminator(token: &str) -> &str {
    token
        .strip_suffix(FULL_KEYWORD_TERMINATOR)
        .unwrap_or(token)
}
