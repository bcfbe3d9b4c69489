//! Core types for generation requests, stream frames and responses.

use serde::{Deserialize, Serialize};

/// Default hard timeout for one generation call.
pub const DEFAULT_TIMEOUT_MS: u64 = 120_000;

/// A request to the LLM.
#[derive(Debug, Clone)]
pub struct LlmRequest {
    /// Fully assembled prompt text.
    pub prompt: String,
    /// Temperature (0.0 = deterministic, 1.0 = creative).
    pub temperature: f32,
    /// Request timeout in milliseconds, covering the streamed body too.
    pub timeout_ms: u64,
}

impl LlmRequest {
    /// Create a request with the default temperature and timeout.
    #[must_use]
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            temperature: 0.8,
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }

    /// Set the temperature.
    #[must_use]
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Set the timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }
}

/// JSON body posted to `/api/generate`.
#[derive(Debug, Clone, Serialize)]
pub struct GenerateBody<'a> {
    /// Model name.
    pub model: &'a str,
    /// Prompt text.
    pub prompt: &'a str,
    /// Always `true`: replies arrive as newline-delimited frames.
    pub stream: bool,
    /// Sampling options.
    pub options: GenerateOptions,
}

/// Sampling options of a generate call.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct GenerateOptions {
    /// Sampling temperature.
    pub temperature: f32,
}

/// One newline-delimited frame of a streamed reply.
///
/// Only these two fields are honoured; anything else in the frame is ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct GenerateFrame {
    /// Text fragment to append, if any.
    #[serde(default)]
    pub response: Option<String>,
    /// Set on the final frame.
    #[serde(default)]
    pub done: Option<bool>,
}

/// Bookkeeping gathered while folding a stream.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StreamStats {
    /// Non-blank lines that parsed as frames.
    pub frames: usize,
    /// Non-blank lines that failed to parse and were skipped.
    pub skipped: usize,
    /// Whether a frame with `done: true` was seen.
    pub saw_done: bool,
}

/// A response from the LLM.
#[derive(Debug, Clone)]
pub struct LlmResponse {
    /// The generated text, trimmed.
    pub text: String,
    /// Latency in milliseconds, until the end of the stream.
    pub latency_ms: u64,
    /// Which model was used.
    pub model: String,
    /// Stream bookkeeping.
    pub stats: StreamStats,
}
