//! LLM Client: streaming interface to an Ollama-compatible backend.

use std::time::{Duration, Instant};

use futures::StreamExt;
use reqwest::Client;
use tracing::{debug, warn};

use crate::error::LlmError;
use crate::stream::StreamAggregator;
use crate::types::{GenerateBody, GenerateOptions, LlmRequest, LlmResponse};

/// Provider backend for LLM inference.
#[derive(Debug, Clone)]
pub enum LlmProvider {
    /// Ollama (or anything speaking its `/api/generate` protocol).
    Ollama {
        /// Server root, e.g. `http://localhost:11434`.
        base_url: String,
    },
    /// No LLM available; all calls return [`LlmError::Unavailable`].
    None,
}

/// The LLM client. Cheap to clone; clones share the connection pool.
#[derive(Debug, Clone)]
pub struct LlmClient {
    provider: LlmProvider,
    http: Client,
    model: String,
}

impl LlmClient {
    /// Create a new LLM client.
    #[must_use]
    pub fn new(provider: LlmProvider, model: impl Into<String>) -> Self {
        Self {
            provider,
            http: Client::new(),
            model: model.into(),
        }
    }

    /// Shorthand for an Ollama-backed client.
    #[must_use]
    pub fn ollama(base_url: impl Into<String>, model: impl Into<String>) -> Self {
        Self::new(
            LlmProvider::Ollama {
                base_url: base_url.into(),
            },
            model,
        )
    }

    /// Create a client with no LLM backend (all calls fail).
    #[must_use]
    pub fn none() -> Self {
        Self::new(LlmProvider::None, String::new())
    }

    /// Model name sent with every request.
    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Check if the LLM client has a backend configured.
    #[must_use]
    pub fn is_available(&self) -> bool {
        !matches!(self.provider, LlmProvider::None)
    }

    /// Generate a reply, consuming the streamed body as it arrives.
    ///
    /// Dropping the returned future aborts the in-flight request.
    ///
    /// # Errors
    ///
    /// Returns [`LlmError`] if the backend is unreachable, answers with a
    /// non-success status, breaks off mid-stream, or exceeds
    /// `request.timeout_ms`. Malformed frames are skipped, not errors.
    pub async fn generate(&self, request: &LlmRequest) -> Result<LlmResponse, LlmError> {
        match &self.provider {
            LlmProvider::None => Err(LlmError::Unavailable("No LLM provider configured".into())),
            LlmProvider::Ollama { base_url } => self.generate_ollama(base_url, request).await,
        }
    }

    /// Generate using Ollama's streaming API.
    async fn generate_ollama(
        &self,
        base_url: &str,
        request: &LlmRequest,
    ) -> Result<LlmResponse, LlmError> {
        if self.model.trim().is_empty() {
            return Err(LlmError::ConfigError("model name is empty".into()));
        }

        let url = format!("{}/api/generate", base_url.trim_end_matches('/'));
        let body = GenerateBody {
            model: &self.model,
            prompt: &request.prompt,
            stream: true,
            options: GenerateOptions {
                temperature: request.temperature,
            },
        };

        debug!(
            url = %url,
            model = %self.model,
            prompt_chars = request.prompt.len(),
            "Sending generate request"
        );

        let start = Instant::now();
        let timeout_ms = request.timeout_ms;
        let resp = self
            .http
            .post(&url)
            .json(&body)
            .timeout(Duration::from_millis(timeout_ms))
            .send()
            .await
            .map_err(|e| {
                warn!("Ollama request failed: {e}");
                LlmError::from_transport(e, timeout_ms)
            })?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), "Ollama returned error: {text}");
            return Err(LlmError::Status {
                status: status.as_u16(),
                body: text,
            });
        }

        let mut aggregator = StreamAggregator::new();
        let mut chunks = resp.bytes_stream();
        while let Some(chunk) = chunks.next().await {
            let chunk = chunk.map_err(|e| {
                warn!("Ollama stream broke off: {e}");
                LlmError::from_transport(e, timeout_ms)
            })?;
            aggregator.push_chunk(&chunk);
        }
        let (text, stats) = aggregator.finish();

        let latency_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);
        debug!(
            latency_ms,
            frames = stats.frames,
            skipped = stats.skipped,
            saw_done = stats.saw_done,
            reply_chars = text.len(),
            "Generate stream finished"
        );
        if stats.skipped > 0 {
            warn!(skipped = stats.skipped, "Skipped malformed frames in reply stream");
        }

        Ok(LlmResponse {
            text,
            latency_ms,
            model: self.model.clone(),
            stats,
        })
    }
}
