// Sentence Scorer
// Position, length and lexical-detail signals combined into one relevance score

use std::collections::HashSet;

use crate::models::{ScoreBreakdown, ScoredSentence, Sentence};
use crate::services::text_processor::{has_digits, tokenize, WordFrequencyTable};

pub const POSITION_WEIGHT: f64 = 0.35;
pub const LENGTH_WEIGHT: f64 = 0.25;
pub const DETAIL_WEIGHT: f64 = 0.40;

/// Word-count band considered ideal density
const IDEAL_MIN_WORDS: usize = 8;
const IDEAL_MAX_WORDS: usize = 18;

const DIGIT_BONUS: f64 = 1.5;

/// Lead and closing sentences (first two, last two) score 1.0.
/// Interior sentences decay linearly with position.
pub fn position_score(index: usize, total: usize) -> f64 {
    if index < 2 || index + 2 >= total {
        return 1.0;
    }
    0.8 - 0.6 * (index as f64 / total as f64)
}

pub fn length_score(word_count: usize) -> f64 {
    if word_count < IDEAL_MIN_WORDS {
        0.5
    } else if word_count > IDEAL_MAX_WORDS {
        0.6
    } else {
        1.0
    }
}

/// Lexical diversity times document rarity, boosted when a token carries a digit.
pub fn detail_score(tokens: &[&str], table: &WordFrequencyTable, rarity_threshold: usize) -> f64 {
    let unique: HashSet<&str> = tokens.iter().copied().collect();
    let unique_count = unique.len().max(1) as f64;

    let rare = unique
        .iter()
        .filter(|w| table.is_rare(w, rarity_threshold))
        .count() as f64;
    let rarity = rare / unique_count;

    let diversity = unique.len() as f64 / tokens.len().max(1) as f64;
    let bonus = if tokens.iter().any(|t| has_digits(t)) {
        DIGIT_BONUS
    } else {
        1.0
    };

    bonus * diversity * rarity
}

pub fn score_breakdown(
    sentence: &Sentence,
    total: usize,
    table: &WordFrequencyTable,
    rarity_threshold: usize,
) -> ScoreBreakdown {
    let tokens = tokenize(&sentence.text);
    ScoreBreakdown {
        position: position_score(sentence.index, total),
        length: length_score(tokens.len()),
        detail: detail_score(&tokens, table, rarity_threshold),
    }
}

pub fn combine(breakdown: &ScoreBreakdown) -> f64 {
    POSITION_WEIGHT * breakdown.position
        + LENGTH_WEIGHT * breakdown.length
        + DETAIL_WEIGHT * breakdown.detail
}

/// Score every sentence against the document-wide frequency table.
/// Output order matches input order; `original_index` carries the sentence index.
pub fn score_sentences(
    sentences: &[Sentence],
    table: &WordFrequencyTable,
    rarity_threshold: usize,
) -> Vec<ScoredSentence> {
    let total = sentences.len();
    sentences
        .iter()
        .map(|s| {
            let breakdown = score_breakdown(s, total, table, rarity_threshold);
            ScoredSentence {
                sentence: s.clone(),
                score: combine(&breakdown),
                original_index: s.index,
                breakdown,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_score_edges_and_decay() {
        assert_eq!(position_score(0, 10), 1.0);
        assert_eq!(position_score(1, 10), 1.0);
        assert_eq!(position_score(8, 10), 1.0);
        assert_eq!(position_score(9, 10), 1.0);
        assert!((position_score(2, 10) - 0.68).abs() < 1e-9);
        assert!((position_score(7, 10) - 0.38).abs() < 1e-9);
        assert!(position_score(3, 10) > position_score(6, 10));
    }

    #[test]
    fn test_position_score_short_documents() {
        for i in 0..4 {
            assert_eq!(position_score(i, 4), 1.0);
        }
        assert!(position_score(2, 5) < 1.0);
    }

    #[test]
    fn test_length_score_bands() {
        assert_eq!(length_score(7), 0.5);
        assert_eq!(length_score(8), 1.0);
        assert_eq!(length_score(18), 1.0);
        assert_eq!(length_score(19), 0.6);
        assert_eq!(length_score(0), 0.5);
    }

    #[test]
    fn test_detail_score_digit_bonus() {
        let table = WordFrequencyTable::from_text("क ख ग घ ङ च छ ज");
        let plain = ["क", "ख", "ग", "घ"];
        let with_digit = ["क", "ख", "ग", "१२"];
        let a = detail_score(&plain, &table, 3);
        let b = detail_score(&with_digit, &table, 3);
        assert!((a - 1.0).abs() < 1e-9);
        assert!((b - 1.5).abs() < 1e-9);
        assert!(b > a);
    }

    #[test]
    fn test_detail_score_rarity_and_repetition() {
        // "क" occurs 3 times in the document and is not rare
        let table = WordFrequencyTable::from_text("क क क ख ग");
        let tokens = ["क", "ख", "क", "ग"];
        // unique = {क, ख, ग}; rarity = 2/3; diversity = 3/4
        let expected = (3.0 / 4.0) * (2.0 / 3.0);
        assert!((detail_score(&tokens, &table, 3) - expected).abs() < 1e-9);
        assert_eq!(detail_score(&[], &table, 3), 0.0);
    }

    #[test]
    fn test_score_sentences_preserves_indices() {
        let sentences = vec![
            Sentence::new("पहिलो छोटो वाक्य।", 0),
            Sentence::new("दोस्रो छोटो वाक्य।", 1),
            Sentence::new("तेस्रो वाक्यमा २५ प्रतिशत वृद्धि भयो।", 2),
        ];
        let table = WordFrequencyTable::from_text(
            &sentences.iter().map(|s| s.text.as_str()).collect::<Vec<_>>().join(" "),
        );
        let scored = score_sentences(&sentences, &table, 3);
        assert_eq!(scored.len(), 3);
        for (i, s) in scored.iter().enumerate() {
            assert_eq!(s.original_index, i);
            assert!((s.score - combine(&s.breakdown)).abs() < 1e-12);
        }
        assert!(scored[2].breakdown.detail > scored[0].breakdown.detail);
    }
}
