// Length Adjuster
// Keeps summaries inside a target word window, with a coverage-spreading fallback

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::models::{ScoredSentence, Summary, SummaryMethod};
use crate::services::sentence_segmenter::segment_sentences;
use crate::services::text_processor::{
    ensure_terminated, join_sentences, normalize_whitespace, truncate_chars, word_count,
    WordFrequencyTable,
};

use super::scorer::score_sentences;
use super::selector::{rank, top_k_in_order};
use super::SummaryOptions;

/// Inclusive word-count window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Window {
    pub min: usize,
    pub max: usize,
}

impl Window {
    /// Bounds are swapped when given inverted
    pub fn new(min: usize, max: usize) -> Self {
        if min > max {
            Self { min: max, max: min }
        } else {
            Self { min, max }
        }
    }

    pub fn contains(&self, words: usize) -> bool {
        self.min <= words && words <= self.max
    }
}

impl Default for Window {
    fn default() -> Self {
        Self { min: 60, max: 80 }
    }
}

/// Four evenly spread positions: total * {1,2,3,4} / 5
pub fn spread_indices(total: usize) -> [usize; 4] {
    [total / 5, 2 * total / 5, 3 * total / 5, 4 * total / 5]
}

fn count_words<K>(parts: &[(K, String)]) -> usize {
    parts.iter().map(|(_, p)| word_count(p)).sum()
}

/// Grow or shrink a keyed sentence list toward `window`.
///
/// Under the minimum, `candidates` whose key is not yet present are appended in
/// the order given until the minimum is met; appending stops at the first
/// candidate that would push the count past the maximum. The list is then
/// re-sorted by key. Over the maximum, entries are dropped from the end one
/// at a time, never below a single entry.
pub fn fit_to_window<K, I>(mut selected: Vec<(K, String)>, candidates: I, window: Window) -> Vec<(K, String)>
where
    K: Ord + Copy,
    I: IntoIterator<Item = (K, String)>,
{
    let mut words = count_words(&selected);

    if words < window.min {
        for (key, text) in candidates {
            if words >= window.min {
                break;
            }
            if selected.iter().any(|(k, _)| *k == key) {
                continue;
            }
            let added = word_count(&text);
            if words + added > window.max {
                break;
            }
            selected.push((key, text));
            words += added;
        }
        selected.sort_by_key(|(k, _)| *k);
    }

    while words > window.max && selected.len() > 1 {
        selected.pop();
        words = count_words(&selected);
    }

    debug!(
        words,
        sentences = selected.len(),
        min = window.min,
        max = window.max,
        "[length_adjuster] fitted"
    );
    selected
}

/// Render sentence contents as a terminated summary
pub(crate) fn finalize<S: AsRef<str>>(parts: &[S], method: SummaryMethod, window: Window) -> Summary {
    let text = ensure_terminated(&join_sentences(parts));
    let words = word_count(&text);
    Summary {
        text,
        word_count: words,
        sentence_count: parts.len(),
        method,
        within_window: window.contains(words),
    }
}

/// Last resort when no sentence can be segmented: cut the raw text to
/// `window.max` characters.
pub fn truncate_fallback(text: &str, window: Window) -> Summary {
    let normalized = normalize_whitespace(text);
    let cut = truncate_chars(&normalized, window.max);
    let text = ensure_terminated(cut);
    let words = word_count(&text);
    Summary {
        text,
        word_count: words,
        sentence_count: 1,
        method: SummaryMethod::Truncated,
        within_window: window.contains(words),
    }
}

/// Re-select from the whole document: top-k sentences, widened with evenly
/// spread sentences when short, trimmed from the end when long.
pub fn extractive_fallback(text: &str, options: &SummaryOptions) -> Summary {
    let window = options.window();
    let sentences = segment_sentences(text);
    if sentences.is_empty() {
        info!("[length_adjuster] no sentences found, truncating raw text");
        return truncate_fallback(text, window);
    }

    let table = WordFrequencyTable::from_text(text);
    let scored = score_sentences(&sentences, &table, options.rarity_threshold);
    let selected: Vec<(usize, String)> = top_k_in_order(&scored, options.num_sentences)
        .into_iter()
        .map(|s| (s.original_index, s.content().to_string()))
        .collect();

    let total = sentences.len();
    let spread = spread_indices(total)
        .into_iter()
        .filter(|&i| i < total)
        .map(|i| (i, sentences[i].content().to_string()));

    let fitted = fit_to_window(selected, spread, window);
    let parts: Vec<String> = fitted.into_iter().map(|(_, p)| p).collect();
    finalize(&parts, SummaryMethod::Fallback, window)
}

/// Keep `candidate` when it already sits inside the window; otherwise
/// recompute with the fallback selector.
pub fn adjust_to_target_length(candidate: Summary, text: &str, options: &SummaryOptions) -> Summary {
    let window = options.window();
    if window.contains(candidate.word_count) {
        return candidate;
    }
    info!(
        words = candidate.word_count,
        min = window.min,
        max = window.max,
        "[length_adjuster] outside window, using fallback selection"
    );
    extractive_fallback(text, options)
}

/// Fit hosted-model output into `window`.
///
/// Generated sentences keep their order and come first. When they fall short
/// of the minimum, the best-ranked `scored` source sentences not already in the
/// output are appended after them, in source order. Over-long output loses
/// trailing sentences. Returns `None` when `generated` has no sentence.
pub fn window_generated(generated: &str, scored: &[ScoredSentence], window: Window) -> Option<Summary> {
    let sentences = segment_sentences(generated);
    if sentences.is_empty() {
        return None;
    }
    let generated_text = normalize_whitespace(generated);

    let selected: Vec<((u8, usize), String)> = sentences
        .iter()
        .map(|s| ((0u8, s.index), s.content().to_string()))
        .collect();
    let extras = rank(scored)
        .into_iter()
        .filter(|s| !generated_text.contains(s.content()))
        .map(|s| ((1u8, s.original_index), s.content().to_string()));

    let fitted = fit_to_window(selected, extras, window);
    let parts: Vec<String> = fitted.into_iter().map(|(_, p)| p).collect();
    Some(finalize(&parts, SummaryMethod::Provider, window))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(n: usize, tag: &str) -> String {
        (0..n).map(|i| format!("{}{}", tag, i)).collect::<Vec<_>>().join(" ")
    }

    #[test]
    fn test_window_swaps_inverted_bounds() {
        let w = Window::new(80, 60);
        assert_eq!(w, Window { min: 60, max: 80 });
        assert!(w.contains(60));
        assert!(w.contains(80));
        assert!(!w.contains(81));
    }

    #[test]
    fn test_spread_indices() {
        assert_eq!(spread_indices(12), [2, 4, 7, 9]);
        assert_eq!(spread_indices(3), [0, 1, 1, 2]);
    }

    #[test]
    fn test_fit_extends_until_minimum() {
        let selected = vec![(0usize, words(10, "a")), (5, words(10, "b"))];
        let candidates = vec![(2usize, words(10, "c")), (3, words(10, "d")), (4, words(10, "e"))];
        let fitted = fit_to_window(selected, candidates, Window::new(30, 50));
        let keys: Vec<usize> = fitted.iter().map(|(k, _)| *k).collect();
        assert_eq!(keys, vec![0, 2, 5]);
        assert_eq!(count_words(&fitted), 30);
    }

    #[test]
    fn test_fit_skips_used_and_stops_before_exceeding_max() {
        let selected = vec![(0usize, words(10, "a"))];
        let candidates = vec![(0usize, words(10, "dup")), (1, words(15, "b")), (2, words(40, "c")), (3, words(5, "d"))];
        let fitted = fit_to_window(selected, candidates, Window::new(50, 60));
        let keys: Vec<usize> = fitted.iter().map(|(k, _)| *k).collect();
        assert_eq!(keys, vec![0, 1]);
        assert_eq!(count_words(&fitted), 25);
    }

    #[test]
    fn test_fit_trims_from_end_but_keeps_one() {
        let selected = vec![(0usize, words(30, "a")), (1, words(30, "b")), (2, words(30, "c"))];
        let fitted = fit_to_window(selected, Vec::new(), Window::new(10, 65));
        assert_eq!(fitted.len(), 2);

        let single = vec![(0usize, words(200, "x"))];
        let fitted = fit_to_window(single, Vec::new(), Window::new(10, 20));
        assert_eq!(fitted.len(), 1);
        assert_eq!(count_words(&fitted), 200);
    }

    #[test]
    fn test_truncate_fallback() {
        let summary = truncate_fallback("  ।।। ", Window::default());
        assert_eq!(summary.text, "।");
        assert_eq!(summary.method, SummaryMethod::Truncated);

        let long = "क".repeat(200);
        let summary = truncate_fallback(&long, Window::new(60, 80));
        assert_eq!(summary.text.chars().count(), 81);
        assert!(summary.text.ends_with('।'));
    }

    #[test]
    fn test_adjust_keeps_in_window_candidate() {
        let options = SummaryOptions::default().with_window(2, 10);
        let candidate = finalize(&["यो सारांश हो"], SummaryMethod::Extractive, options.window());
        let adjusted = adjust_to_target_length(candidate.clone(), "पूरै फरक पाठ।", &options);
        assert_eq!(adjusted, candidate);
    }

    #[test]
    fn test_fallback_grows_short_selection() {
        // 12 sentences of 6 words each; top-5 yields 30 words, below the 40 minimum
        let text = (0..12)
            .map(|i| format!("{}।", words(6, &format!("s{}w", i))))
            .collect::<Vec<_>>()
            .join(" ");
        let options = SummaryOptions::default().with_window(40, 60);
        let summary = extractive_fallback(&text, &options);
        assert_eq!(summary.method, SummaryMethod::Fallback);
        assert!(summary.word_count >= 40);
        assert!(summary.word_count <= 60);
        assert!(summary.within_window);
        assert!(summary.text.ends_with('।'));
        assert_eq!(summary.text.matches('।').count(), 1);
    }

    #[test]
    fn test_fallback_trims_long_selection() {
        let text = (0..8)
            .map(|i| format!("{}।", words(30, &format!("s{}w", i))))
            .collect::<Vec<_>>()
            .join(" ");
        let options = SummaryOptions::default();
        let summary = extractive_fallback(&text, &options);
        assert_eq!(summary.sentence_count, 2);
        assert_eq!(summary.word_count, 60);
    }

    fn scored_source(text: &str) -> Vec<ScoredSentence> {
        let sentences = segment_sentences(text);
        let table = WordFrequencyTable::from_text(text);
        score_sentences(&sentences, &table, 3)
    }

    #[test]
    fn test_generated_too_long_drops_trailing_sentences() {
        let generated = format!("{}। {}। {}।", words(30, "a"), words(30, "b"), words(30, "c"));
        let summary = window_generated(&generated, &[], Window::new(10, 65)).unwrap();
        assert_eq!(summary.method, SummaryMethod::Provider);
        assert_eq!(summary.sentence_count, 2);
        assert_eq!(summary.word_count, 60);
        assert!(summary.text.starts_with("a0 "));
        assert!(!summary.text.contains("c0"));

        let single = format!("{}।", words(200, "x"));
        let summary = window_generated(&single, &[], Window::new(10, 20)).unwrap();
        assert_eq!(summary.sentence_count, 1);
        assert_eq!(summary.word_count, 200);
        assert!(!summary.within_window);
    }

    #[test]
    fn test_generated_short_output_gains_source_sentences_after_it() {
        // Source sentences 0..6, each 10 words; sentence 3 carries a digit and ranks high
        let source = (0..6)
            .map(|i| {
                if i == 3 {
                    format!("{} २०८०।", words(9, &format!("s{}w", i)))
                } else {
                    format!("{}।", words(10, &format!("s{}w", i)))
                }
            })
            .collect::<Vec<_>>()
            .join(" ");
        let scored = scored_source(&source);

        // Generated output repeats source sentence 0 and adds one of its own
        let generated = format!("{}। {}।", words(10, "g"), words(10, "s0w"));
        let summary = window_generated(&generated, &scored, Window::new(40, 45)).unwrap();

        assert_eq!(summary.word_count, 40);
        assert_eq!(summary.sentence_count, 4);
        assert!(summary.within_window);
        // Generated sentences lead, in their own order
        assert!(summary.text.starts_with(&format!("{} {}", words(10, "g"), words(10, "s0w"))));
        // Sentence 0 is already in the output and is not repeated
        assert_eq!(summary.text.matches("s0w0 ").count(), 1);

        // The two best-ranked unused source sentences follow, in source order
        let ranked: Vec<usize> = rank(&scored)
            .into_iter()
            .filter(|s| s.original_index != 0)
            .take(2)
            .map(|s| s.original_index)
            .collect();
        assert!(ranked.contains(&3));
        let mut expected = ranked.clone();
        expected.sort_unstable();
        let positions: Vec<usize> = expected
            .iter()
            .map(|i| summary.text.find(&format!("s{}w0 ", i)).unwrap())
            .collect();
        assert!(positions[0] < positions[1]);
        assert!(positions[0] > summary.text.find("s0w0 ").unwrap());
    }

    #[test]
    fn test_generated_output_ends_with_single_terminator() {
        let generated = "पहिलो वाक्य यहाँ छ । दोस्रो वाक्य पनि छ।। तेस्रो वाक्य बिना विराम";
        let summary = window_generated(generated, &[], Window::new(1, 50)).unwrap();
        assert_eq!(summary.sentence_count, 3);
        assert!(summary.text.ends_with("विराम।"));
        assert_eq!(summary.text.matches('।').count(), 1);

        assert!(window_generated("  ।। ", &[], Window::default()).is_none());
    }
}
