use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;
use tracing::{debug, warn};

use mm_core::{
    RetryPolicy, SummarizationError, Summarizer, SummaryInput, SummaryMode, SummaryResult,
};

use crate::prompts;

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Cap on a single generateContent call. A hung endpoint becomes a
/// transient, retryable failure instead of stalling the run.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Inputs beyond this many characters are cut before the request goes out.
/// Keeps one oversized paste from blowing the model's context window.
const MAX_INPUT_CHARS: usize = 200_000;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    contents: Vec<Content>,
    system_instruction: Content,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    top_p: f32,
    top_k: u32,
    max_output_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<Content>,
    finish_reason: Option<String>,
}

/// Summarizer backed by the Gemini generateContent API. Caps concurrent
/// requests and retries transient failures with backoff.
pub struct GeminiSummarizer {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
    retry: RetryPolicy,
    semaphore: Arc<Semaphore>,
}

impl fmt::Debug for GeminiSummarizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeminiSummarizer")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("api_key", &"***")
            .finish()
    }
}

impl GeminiSummarizer {
    pub fn new(api_key: String, model: String, worker_cap: usize) -> mm_core::Result<Self> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            client,
            api_key,
            model,
            base_url: DEFAULT_BASE_URL.to_string(),
            retry: RetryPolicy::default(),
            semaphore: Arc::new(Semaphore::new(worker_cap.max(1))),
        })
    }

    async fn generate_once(&self, body: &GenerateRequest) -> SummaryResult {
        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.base_url, self.model, self.api_key
        );

        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(classify_transport_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(classify_status(status));
        }

        let parsed: GenerateResponse = response
            .json()
            .await
            .map_err(|e| SummarizationError::InvalidResponse(e.to_string()))?;
        extract_text(parsed)
    }
}

/// Timeouts and connection failures are transient so the retry policy
/// picks them up; anything else on the transport is malformed traffic.
fn classify_transport_error(e: reqwest::Error) -> SummarizationError {
    if e.is_timeout() || e.is_connect() {
        SummarizationError::ServiceUnavailable
    } else {
        SummarizationError::InvalidResponse(e.to_string())
    }
}

fn classify_status(status: StatusCode) -> SummarizationError {
    match status.as_u16() {
        429 => SummarizationError::RateLimited,
        401 | 403 => SummarizationError::AuthFailed,
        code if code >= 500 => SummarizationError::ServiceUnavailable,
        code => SummarizationError::InvalidResponse(format!("unexpected status {code}")),
    }
}

fn extract_text(response: GenerateResponse) -> SummaryResult {
    let candidate = response
        .candidates
        .into_iter()
        .next()
        .ok_or_else(|| SummarizationError::InvalidResponse("no candidates returned".into()))?;

    if candidate.finish_reason.as_deref() == Some("SAFETY") {
        return Err(SummarizationError::InvalidResponse(
            "response blocked by safety filters".into(),
        ));
    }

    let text = candidate
        .content
        .and_then(|c| c.parts.into_iter().next())
        .map(|p| p.text)
        .unwrap_or_default();
    let text = text.trim().to_string();
    if text.is_empty() {
        return Err(SummarizationError::InvalidResponse(
            "candidate contained no text".into(),
        ));
    }
    Ok(text)
}

/// Cut `text` to the input cap on a char boundary, flagging the cut.
fn truncate_input(text: &str) -> String {
    if text.chars().count() <= MAX_INPUT_CHARS {
        return text.to_string();
    }
    warn!("input exceeds {} chars, truncating", MAX_INPUT_CHARS);
    let mut cut: String = text.chars().take(MAX_INPUT_CHARS).collect();
    cut.push_str("\n\n[content truncated]");
    cut
}

#[async_trait]
impl Summarizer for GeminiSummarizer {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn summarize(
        &self,
        text: &str,
        mode: SummaryMode,
        source_url: Option<&str>,
    ) -> SummaryResult {
        if text.trim().is_empty() {
            return Err(SummarizationError::EmptyInput);
        }

        let profile = prompts::generation_profile(mode);
        let body = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: prompts::render_user_prompt(mode, &truncate_input(text), source_url),
                }],
            }],
            system_instruction: Content {
                parts: vec![Part {
                    text: prompts::system_instruction(mode).to_string(),
                }],
            },
            generation_config: GenerationConfig {
                temperature: profile.temperature,
                top_p: profile.top_p,
                top_k: profile.top_k,
                max_output_tokens: profile.max_output_tokens,
            },
        };

        let _permit = self
            .semaphore
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| SummarizationError::ServiceUnavailable)?;

        debug!("summarizing {} chars in {:?} mode", text.len(), mode);
        self.retry
            .run(|| self.generate_once(&body), SummarizationError::is_transient)
            .await
    }

    async fn batch_summarize(&self, items: &[SummaryInput], mode: SummaryMode) -> Vec<SummaryResult> {
        // Per-request permits already bound concurrency, so the buffer here
        // only needs to keep order stable.
        stream::iter(items.to_vec())
            .map(|item| async move {
                self.summarize(&item.text, mode, item.source_url.as_deref())
                    .await
            })
            .buffered(items.len().max(1))
            .collect()
            .await
    }
}
