// Sentence Segmenter
// Splits Nepali text on the danda while keeping the delimiter attached

use regex::Regex;
use std::sync::OnceLock;
use tracing::debug;

use crate::models::Sentence;
use crate::services::text_processor::{normalize_whitespace, TERMINATOR};

fn terminator_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(&format!("({})", regex::escape(&TERMINATOR.to_string()))).unwrap())
}

/// Split `text` on `re`, keeping every match as its own token.
///
/// The result always alternates content and delimiter and has odd length:
/// `[content, delim, content, ..., content]`. The last content may be empty.
fn split_keep_delimiter<'t>(text: &'t str, re: &Regex) -> Vec<&'t str> {
    let mut tokens = Vec::new();
    let mut cursor = 0usize;
    for m in re.find_iter(text) {
        tokens.push(&text[cursor..m.start()]);
        tokens.push(m.as_str());
        cursor = m.end();
    }
    tokens.push(&text[cursor..]);
    tokens
}

/// Segment raw text into terminator-ended sentences in source order.
///
/// - whitespace runs collapse to one space first
/// - each content + terminator pair is trimmed only at its outer ends
/// - a fragment with only a terminator and no content is dropped
/// - a trailing unterminated fragment gets a terminator appended
pub fn segment_sentences(text: &str) -> Vec<Sentence> {
    let normalized = normalize_whitespace(text);
    if normalized.is_empty() {
        return Vec::new();
    }

    let tokens = split_keep_delimiter(&normalized, terminator_regex());
    let mut sentences: Vec<Sentence> = Vec::new();

    let mut pairs = tokens.chunks_exact(2);
    for pair in &mut pairs {
        if pair[0].trim().is_empty() {
            continue;
        }
        // Space before the danda is kept so the sentence stays a substring of the text
        let sentence_text = format!("{}{}", pair[0], pair[1]);
        sentences.push(Sentence::new(sentence_text.trim(), sentences.len()));
    }

    if let [remainder] = pairs.remainder() {
        let content = remainder.trim();
        if !content.is_empty() {
            let sentence_text = format!("{}{}", content, TERMINATOR);
            sentences.push(Sentence::new(sentence_text, sentences.len()));
        }
    }

    debug!(
        sentences = sentences.len(),
        chars = normalized.chars().count(),
        "[segmenter] segmented"
    );
    sentences
}
