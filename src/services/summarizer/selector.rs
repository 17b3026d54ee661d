// Primary Selector
// Top-k by score, then back to narrative order

use crate::models::{ScoredSentence, Sentence};
use crate::services::text_processor::WordFrequencyTable;

use super::scorer::score_sentences;

/// Sort by score descending. Ties keep their source order.
pub fn rank(scored: &[ScoredSentence]) -> Vec<&ScoredSentence> {
    let mut ranked: Vec<&ScoredSentence> = scored.iter().collect();
    ranked.sort_by(|a, b| b.score.total_cmp(&a.score));
    ranked
}

/// Best `k` sentences, returned in ascending `original_index` order.
pub fn top_k_in_order(scored: &[ScoredSentence], k: usize) -> Vec<&ScoredSentence> {
    let mut top: Vec<&ScoredSentence> = rank(scored).into_iter().take(k).collect();
    top.sort_by_key(|s| s.original_index);
    top
}

/// Outcome of the primary selection pass
#[derive(Debug, Clone)]
pub struct Selection {
    /// Sentence contents without terminators, narrative order
    pub parts: Vec<String>,
    /// Source indices of `parts`
    pub indices: Vec<usize>,
    /// False when the document was short enough to keep whole
    pub scored: bool,
}

/// Pick up to `k` sentences.
///
/// Documents with at most `k` sentences are returned whole without scoring.
pub fn select_sentences(
    sentences: &[Sentence],
    table: &WordFrequencyTable,
    k: usize,
    rarity_threshold: usize,
) -> Selection {
    if sentences.len() <= k {
        return Selection {
            parts: sentences.iter().map(|s| s.content().to_string()).collect(),
            indices: sentences.iter().map(|s| s.index).collect(),
            scored: false,
        };
    }

    let scored = score_sentences(sentences, table, rarity_threshold);
    let top = top_k_in_order(&scored, k);
    Selection {
        parts: top.iter().map(|s| s.content().to_string()).collect(),
        indices: top.iter().map(|s| s.original_index).collect(),
        scored: true,
    }
}
