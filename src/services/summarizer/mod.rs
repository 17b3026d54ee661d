// Summarizer
// Extractive summarization pipeline:
// - scorer: position / length / detail scoring
// - selector: top-k selection in narrative order
// - length_adjuster: word-window check and coverage-spreading fallback

pub mod length_adjuster;
pub mod scorer;
pub mod selector;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::models::{Document, ScoredSentence, Summary, SummaryMethod, SummaryRequest};
use crate::services::providers::{GenerationParams, ProviderClient, ProviderError, RetryPolicy};
use crate::services::sentence_segmenter::segment_sentences;
use crate::services::text_processor::{join_sentences, WordFrequencyTable};

pub use length_adjuster::{
    adjust_to_target_length, extractive_fallback, fit_to_window, spread_indices, truncate_fallback,
    window_generated, Window,
};
pub use scorer::{detail_score, length_score, position_score, score_sentences};
pub use selector::{rank, select_sentences, top_k_in_order, Selection};

#[derive(Error, Debug)]
pub enum SummarizeError {
    #[error("nothing to summarize: input is empty")]
    EmptyInput,
    #[error("summarization provider failed: {0}")]
    Provider(#[from] ProviderError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryOptions {
    pub target_min: usize,
    pub target_max: usize,
    pub num_sentences: usize,
    /// Tokens seen fewer times than this in the document count as rare
    pub rarity_threshold: usize,
}

impl Default for SummaryOptions {
    fn default() -> Self {
        Self {
            target_min: 60,
            target_max: 80,
            num_sentences: 5,
            rarity_threshold: 3,
        }
    }
}

impl SummaryOptions {
    /// 20-100 word window
    pub fn wide() -> Self {
        Self::default().with_window(20, 100)
    }

    /// 30-50 word window
    pub fn compact() -> Self {
        Self::default().with_window(30, 50)
    }

    pub fn with_window(mut self, target_min: usize, target_max: usize) -> Self {
        self.target_min = target_min;
        self.target_max = target_max;
        self
    }

    pub fn with_num_sentences(mut self, n: usize) -> Self {
        self.num_sentences = n;
        self
    }

    /// Clamp counts to at least one and order the window bounds
    pub fn validated(self) -> Self {
        let window = Window::new(self.target_min, self.target_max);
        Self {
            target_min: window.min,
            target_max: window.max,
            num_sentences: self.num_sentences.max(1),
            rarity_threshold: self.rarity_threshold.max(1),
        }
    }

    pub fn window(&self) -> Window {
        Window::new(self.target_min, self.target_max)
    }
}

#[derive(Debug, Clone, Default)]
pub struct Summarizer {
    options: SummaryOptions,
}

impl Summarizer {
    pub fn new(options: SummaryOptions) -> Self {
        Self {
            options: options.validated(),
        }
    }

    pub fn options(&self) -> &SummaryOptions {
        &self.options
    }

    /// Score every sentence of `text`, in source order
    pub fn score(&self, text: &str) -> Vec<ScoredSentence> {
        let sentences = segment_sentences(text);
        let table = WordFrequencyTable::from_text(text);
        score_sentences(&sentences, &table, self.options.rarity_threshold)
    }

    /// Extractive summary with selection details.
    ///
    /// Never fails: inputs with no segmentable sentence fall through to raw-text
    /// truncation, and over-long single sentences are returned as they are.
    pub fn summarize_detailed(&self, text: &str) -> Summary {
        let options = &self.options;
        let window = options.window();
        let document = Document::new(text);
        let sentences = segment_sentences(document.raw_text);

        if sentences.is_empty() {
            warn!("[summarizer] no sentences extracted, using fallback");
            return extractive_fallback(document.raw_text, options);
        }

        let table = WordFrequencyTable::from_tokens(document.tokens());
        let selection = select_sentences(&sentences, &table, options.num_sentences, options.rarity_threshold);
        debug!(indices = ?selection.indices, scored = selection.scored, "[summarizer] selected");
        let method = if selection.scored {
            SummaryMethod::Extractive
        } else {
            SummaryMethod::AllSentences
        };

        if join_sentences(&selection.parts).is_empty() {
            warn!("[summarizer] extraction empty, using fallback");
            return extractive_fallback(document.raw_text, options);
        }

        let candidate = length_adjuster::finalize(&selection.parts, method, window);
        let summary = adjust_to_target_length(candidate, document.raw_text, options);

        info!(
            input_words = document.word_count(),
            input_sentences = sentences.len(),
            words = summary.word_count,
            sentences = summary.sentence_count,
            method = %summary.method,
            within_window = summary.within_window,
            "[summarizer] summary ready"
        );
        summary
    }

    pub fn summarize(&self, text: &str) -> String {
        self.summarize_detailed(text).text
    }

    /// Summarize with a hosted model, then fit its output into the word window.
    ///
    /// Over-long output loses trailing sentences; short output is topped up
    /// with the best-scored source sentences it does not already contain.
    pub async fn summarize_with_provider(
        &self,
        client: &ProviderClient,
        text: &str,
        policy: &RetryPolicy,
    ) -> Result<Summary, SummarizeError> {
        if Document::new(text).is_blank() {
            return Err(SummarizeError::EmptyInput);
        }

        let window = self.options.window();
        let params = GenerationParams::for_window(window);
        let generated = client.generate_with_retry(text, &params, policy).await?;

        let scored = self.score(text);
        let summary = window_generated(&generated.content, &scored, window)
            .ok_or(ProviderError::MissingContent)?;

        info!(
            latency_ms = generated.latency_ms,
            generated_words = crate::services::text_processor::word_count(&generated.content),
            words = summary.word_count,
            within_window = summary.within_window,
            "[summarizer] provider summary ready"
        );
        Ok(summary)
    }
}

/// Extractive summary of `text` within `[target_min, target_max]` words (best effort).
pub fn summarize(text: &str, target_min: usize, target_max: usize) -> String {
    Summarizer::new(SummaryOptions::default().with_window(target_min, target_max)).summarize(text)
}

/// Request-level entry point: rejects empty input before summarizing.
pub fn summarize_request(request: &SummaryRequest) -> Result<Summary, SummarizeError> {
    if request.text.trim().is_empty() {
        return Err(SummarizeError::EmptyInput);
    }
    let defaults = SummaryOptions::default();
    let options = defaults
        .with_window(
            request.target_min.unwrap_or(defaults.target_min),
            request.target_max.unwrap_or(defaults.target_max),
        )
        .with_num_sentences(request.num_sentences.unwrap_or(defaults.num_sentences));
    Ok(Summarizer::new(options).summarize_detailed(&request.text))
}
