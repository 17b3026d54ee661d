// Summarization Provider Service
// Calls a hosted seq2seq summarization model over HTTP

use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::env;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{info, warn};

use crate::services::summarizer::Window;

pub const DEFAULT_MODEL: &str = "csebuetnlp/mT5_multilingual_XLSum";
const INFERENCE_BASE_URL: &str = "https://api-inference.huggingface.co/models";
const REQUEST_TIMEOUT_SECS: u64 = 80;

/// Model tokens budgeted per output word for Devanagari text
const TOKENS_PER_WORD: usize = 2;

#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },
    #[error("Model is loading (estimated {estimated_secs:.0}s)")]
    ModelLoading { estimated_secs: f64 },
    #[error("Missing content in response")]
    MissingContent,
    #[error("JSON parse error: {0}")]
    Json(String),
    #[error("Provider unavailable after {attempts} attempts: {last}")]
    Unavailable { attempts: usize, last: String },
}

impl ProviderError {
    /// Transient failures worth another attempt
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Http(_) | Self::ModelLoading { .. } => true,
            Self::Api { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

/// Generation length bounds, in model tokens
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationParams {
    pub min_length: usize,
    pub max_length: usize,
}

impl GenerationParams {
    pub fn for_window(window: Window) -> Self {
        Self {
            min_length: window.min * TOKENS_PER_WORD,
            max_length: window.max * TOKENS_PER_WORD,
        }
    }
}

/// Fixed attempt count with linearly growing delay (`base_delay * attempt`)
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: usize,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(2),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: usize, base_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
        }
    }

    pub fn delay_for(&self, attempt: usize) -> Duration {
        self.base_delay * attempt as u32
    }
}

#[derive(Debug, Clone, Serialize)]
struct InferenceRequest<'a> {
    inputs: &'a str,
    parameters: InferenceParameters,
    options: InferenceOptions,
}

#[derive(Debug, Clone, Serialize)]
struct InferenceParameters {
    min_length: usize,
    max_length: usize,
    do_sample: bool,
}

#[derive(Debug, Clone, Serialize)]
struct InferenceOptions {
    wait_for_model: bool,
}

#[derive(Debug, Clone, Deserialize)]
struct InferenceOutput {
    summary_text: Option<String>,
    generated_text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct LoadingResponse {
    estimated_time: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationResult {
    pub content: String,
    pub latency_ms: i64,
    pub attempts: usize,
}

pub fn model_url(model: &str) -> String {
    format!("{}/{}", INFERENCE_BASE_URL, model)
}

pub struct ProviderClient {
    client: Client,
    endpoint: String,
    api_key: Option<String>,
}

impl ProviderClient {
    pub fn with_endpoint(endpoint: &str, api_key: Option<String>) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            endpoint: endpoint.to_string(),
            api_key,
        })
    }

    pub fn with_proxy(endpoint: &str, api_key: Option<String>, proxy_url: &str) -> Result<Self, ProviderError> {
        let proxy = reqwest::Proxy::all(proxy_url)?;
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .proxy(proxy)
            .build()?;

        Ok(Self {
            client,
            endpoint: endpoint.to_string(),
            api_key,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// One request, no retries
    pub async fn generate(&self, text: &str, params: &GenerationParams) -> Result<GenerationResult, ProviderError> {
        let request = InferenceRequest {
            inputs: text,
            parameters: InferenceParameters {
                min_length: params.min_length,
                max_length: params.max_length,
                do_sample: false,
            },
            options: InferenceOptions { wait_for_model: false },
        };

        let start = Instant::now();

        let mut builder = self
            .client
            .post(&self.endpoint)
            .header("Content-Type", "application/json")
            .json(&request);
        if let Some(key) = &self.api_key {
            builder = builder.header("Authorization", format!("Bearer {}", key));
        }
        let response = builder.send().await?;

        let latency_ms = start.elapsed().as_millis() as i64;
        let status = response.status();

        if status == StatusCode::SERVICE_UNAVAILABLE {
            let body = response.text().await.unwrap_or_default();
            let estimated_secs = serde_json::from_str::<LoadingResponse>(&body)
                .ok()
                .and_then(|r| r.estimated_time)
                .unwrap_or(0.0);
            return Err(ProviderError::ModelLoading { estimated_secs });
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        // Response format: [{"summary_text": "..."}]
        let data: Vec<InferenceOutput> = response
            .json()
            .await
            .map_err(|e| ProviderError::Json(e.to_string()))?;

        let content = parse_generated(data)?;

        Ok(GenerationResult {
            content,
            latency_ms,
            attempts: 1,
        })
    }

    /// `generate` under `policy`: retryable errors are retried after
    /// `base_delay * attempt`; others return immediately.
    pub async fn generate_with_retry(
        &self,
        text: &str,
        params: &GenerationParams,
        policy: &RetryPolicy,
    ) -> Result<GenerationResult, ProviderError> {
        let mut last_err: Option<ProviderError> = None;

        for attempt in 1..=policy.max_attempts {
            match self.generate(text, params).await {
                Ok(mut result) => {
                    info!(
                        endpoint = %self.endpoint,
                        attempt,
                        latency_ms = result.latency_ms,
                        "[provider] generation ok"
                    );
                    result.attempts = attempt;
                    return Ok(result);
                }
                Err(e) if e.is_retryable() => {
                    warn!(endpoint = %self.endpoint, attempt, "[provider] transient error: {}", e);
                    last_err = Some(e);
                }
                Err(e) => {
                    warn!(endpoint = %self.endpoint, attempt, "[provider] error: {}", e);
                    return Err(e);
                }
            }

            if attempt < policy.max_attempts {
                tokio::time::sleep(policy.delay_for(attempt)).await;
            }
        }

        Err(ProviderError::Unavailable {
            attempts: policy.max_attempts,
            last: last_err
                .map(|e| e.to_string())
                .unwrap_or_else(|| "unknown error".to_string()),
        })
    }
}

fn parse_generated(data: Vec<InferenceOutput>) -> Result<String, ProviderError> {
    data.into_iter()
        .next()
        .and_then(|o| o.summary_text.or(o.generated_text))
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .ok_or(ProviderError::MissingContent)
}

/// Bearer token from the environment
pub fn get_api_key() -> Option<String> {
    for key in ["NEPSUM_HF_TOKEN", "HF_API_TOKEN"] {
        if let Ok(val) = env::var(key) {
            let v = val.trim();
            if !v.is_empty() {
                return Some(v.to_string());
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generation_params_scale_window() {
        let params = GenerationParams::for_window(Window::new(60, 80));
        assert_eq!(params.min_length, 120);
        assert_eq!(params.max_length, 160);
    }

    #[test]
    fn test_retry_delay_is_linear() {
        let policy = RetryPolicy::new(3, Duration::from_millis(500));
        assert_eq!(policy.delay_for(1), Duration::from_millis(500));
        assert_eq!(policy.delay_for(2), Duration::from_millis(1000));
        assert_eq!(policy.delay_for(3), Duration::from_millis(1500));
        assert_eq!(RetryPolicy::new(0, Duration::ZERO).max_attempts, 1);
    }

    #[test]
    fn test_retryable_classification() {
        assert!(ProviderError::ModelLoading { estimated_secs: 20.0 }.is_retryable());
        assert!(ProviderError::Api { status: 503, message: String::new() }.is_retryable());
        assert!(ProviderError::Api { status: 429, message: String::new() }.is_retryable());
        assert!(!ProviderError::Api { status: 401, message: String::new() }.is_retryable());
        assert!(!ProviderError::MissingContent.is_retryable());
    }

    #[test]
    fn test_parse_generated() {
        let data: Vec<InferenceOutput> =
            serde_json::from_str(r#"[{"summary_text": "  सरकारले नयाँ बजेट ल्यायो। "}]"#).unwrap();
        assert_eq!(parse_generated(data).unwrap(), "सरकारले नयाँ बजेट ल्यायो।");

        let data: Vec<InferenceOutput> = serde_json::from_str(r#"[{"generated_text": "पाठ"}]"#).unwrap();
        assert_eq!(parse_generated(data).unwrap(), "पाठ");

        let empty: Vec<InferenceOutput> = serde_json::from_str(r#"[{"summary_text": "  "}]"#).unwrap();
        assert!(matches!(parse_generated(empty), Err(ProviderError::MissingContent)));
        assert!(matches!(parse_generated(Vec::new()), Err(ProviderError::MissingContent)));
    }

    #[test]
    fn test_model_url() {
        assert!(model_url(DEFAULT_MODEL).ends_with("/csebuetnlp/mT5_multilingual_XLSum"));
    }

    #[tokio::test]
    async fn test_retry_exhaustion_reports_unavailable() {
        // Nothing listens on the discard port; every attempt fails at connect
        let client = ProviderClient::with_endpoint("http://127.0.0.1:9/summarize", None).unwrap();
        let policy = RetryPolicy::new(2, Duration::from_millis(10));
        let params = GenerationParams::for_window(Window::default());
        let result = client.generate_with_retry("पाठ", &params, &policy).await;
        match result {
            Err(ProviderError::Unavailable { attempts, .. }) => assert_eq!(attempts, 2),
            other => panic!("expected Unavailable, got {:?}", other.map(|r| r.content)),
        }
    }
}
