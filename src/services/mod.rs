// Nepsum Core Services

pub mod text_processor;
pub mod sentence_segmenter;
pub mod summarizer;
pub mod providers;
pub mod config_store;

pub use text_processor::*;
pub use sentence_segmenter::*;
pub use config_store::*;
pub use providers::*;

pub use summarizer::{
    adjust_to_target_length,
    extractive_fallback,
    fit_to_window,
    summarize,
    summarize_request,
    truncate_fallback,
    SummarizeError,
    Summarizer,
    SummaryOptions,
    Window,
};
