// Nepsum Data Models
// Documents, sentences, scores and summary results

use serde::{Deserialize, Serialize};

use crate::services::text_processor::{self, TERMINATOR};

// ============ Document ============

/// Raw input article. Lives for a single summarization call.
#[derive(Debug, Clone)]
pub struct Document<'a> {
    pub raw_text: &'a str,
    tokens: Vec<&'a str>,
}

impl<'a> Document<'a> {
    pub fn new(raw_text: &'a str) -> Self {
        Self {
            raw_text,
            tokens: text_processor::tokenize(raw_text),
        }
    }

    /// Whitespace-delimited tokens of the whole document
    pub fn tokens(&self) -> &[&'a str] {
        &self.tokens
    }

    pub fn word_count(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_blank(&self) -> bool {
        self.tokens.is_empty()
    }
}

// ============ Sentence ============

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sentence {
    /// Sentence text including its trailing terminator
    pub text: String,
    /// Position in the segmented sequence; the ordering key for output
    pub index: usize,
    pub word_count: usize,
}

impl Sentence {
    pub fn new(text: impl Into<String>, index: usize) -> Self {
        let text = text.into();
        let word_count = text_processor::word_count(&text);
        Self { text, index, word_count }
    }

    /// Text with trailing terminators removed
    pub fn content(&self) -> &str {
        text_processor::strip_terminators(&self.text)
    }

    pub fn is_terminated(&self) -> bool {
        self.text.ends_with(TERMINATOR)
    }
}

// ============ Scoring ============

/// Weighted components behind a sentence score
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreBreakdown {
    pub position: f64,
    pub length: f64,
    pub detail: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoredSentence {
    pub sentence: Sentence,
    pub score: f64,
    pub original_index: usize,
    pub breakdown: ScoreBreakdown,
}

impl ScoredSentence {
    pub fn content(&self) -> &str {
        self.sentence.content()
    }
}

// ============ Summary ============

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SummaryMethod {
    /// Document had no more sentences than requested; all were kept
    AllSentences,
    /// Top-scored sentences in narrative order
    Extractive,
    /// Coverage-spreading re-selection after a window miss
    Fallback,
    /// No sentences could be segmented; raw text was cut
    Truncated,
    /// Hosted model output, windowed locally
    Provider,
}

impl SummaryMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AllSentences => "all_sentences",
            Self::Extractive => "extractive",
            Self::Fallback => "fallback",
            Self::Truncated => "truncated",
            Self::Provider => "provider",
        }
    }
}

impl std::fmt::Display for SummaryMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub text: String,
    pub word_count: usize,
    pub sentence_count: usize,
    pub method: SummaryMethod,
    pub within_window: bool,
}

// ============ Request / Report ============

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryRequest {
    pub text: String,
    #[serde(default)]
    pub target_min: Option<usize>,
    #[serde(default)]
    pub target_max: Option<usize>,
    #[serde(default)]
    pub num_sentences: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryReport {
    pub source: String,
    pub input_words: usize,
    pub input_sentences: usize,
    pub target_min: usize,
    pub target_max: usize,
    pub summary: Summary,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider_error: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub scores: Vec<ScoredSentence>,
}
