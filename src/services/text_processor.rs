// Text Processing Service
// Whitespace normalization, tokenization and word statistics for Nepali text

use std::collections::HashMap;

/// Devanagari danda, the Nepali full stop
pub const TERMINATOR: char = '।';

/// Collapse every whitespace run to a single space and trim both ends
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Whitespace-delimited tokens, punctuation kept attached
pub fn tokenize(text: &str) -> Vec<&str> {
    text.split_whitespace().collect()
}

pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Remove trailing terminators (and the whitespace around them)
pub fn strip_terminators(text: &str) -> &str {
    text.trim_end().trim_end_matches(TERMINATOR).trim()
}

/// Normalize whitespace and end the text with exactly one terminator
pub fn ensure_terminated(text: &str) -> String {
    let normalized = normalize_whitespace(text);
    let mut out = strip_terminators(&normalized).to_string();
    out.push(TERMINATOR);
    out
}

/// ASCII or Devanagari (०-९) decimal digit
pub fn is_decimal_digit(c: char) -> bool {
    c.is_ascii_digit() || ('\u{0966}'..='\u{096F}').contains(&c)
}

pub fn has_digits(token: &str) -> bool {
    token.chars().any(is_decimal_digit)
}

/// First `max_chars` Unicode scalars of `text`; never splits a UTF-8 sequence
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => &text[..byte_idx],
        None => text,
    }
}

/// Join sentence contents with single spaces
pub fn join_sentences<S: AsRef<str>>(parts: &[S]) -> String {
    let joined = parts
        .iter()
        .map(|p| p.as_ref().trim())
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    normalize_whitespace(&joined)
}

/// Token occurrence counts across a whole document.
/// Tokens match exactly: case, punctuation and attached terminators all count.
#[derive(Debug, Clone, Default)]
pub struct WordFrequencyTable {
    counts: HashMap<String, usize>,
}

impl WordFrequencyTable {
    pub fn from_tokens<S: AsRef<str>>(tokens: &[S]) -> Self {
        let mut counts: HashMap<String, usize> = HashMap::new();
        for t in tokens {
            *counts.entry(t.as_ref().to_string()).or_insert(0) += 1;
        }
        Self { counts }
    }

    pub fn from_text(text: &str) -> Self {
        Self::from_tokens(&tokenize(text))
    }

    pub fn count(&self, token: &str) -> usize {
        self.counts.get(token).copied().unwrap_or(0)
    }

    /// Token occurs fewer than `threshold` times in the document
    pub fn is_rare(&self, token: &str, threshold: usize) -> bool {
        self.count(token) < threshold
    }
}
