//! # nunu-llm: Generation backend layer for Nunu
//!
//! Talks to a locally hosted Ollama-compatible server:
//!   - **client**: `POST {base_url}/api/generate`, streamed reply
//!   - **stream**: tolerant newline-delimited JSON fold
//!   - **prompt**: persona + emotion + memory → prompt text
//!
//! Transport failures (refused connection, non-success status, timeout)
//! are hard errors. A malformed frame inside an otherwise healthy stream is
//! skipped and the reply is assembled from whatever parsed.
//!
//! ```text
//! {"response":"Hel"}     → "Hel"
//! garbage                → (skipped)
//! {"response":"lo"}      → "Hello"
//! {"done":true}          → "Hello"
//! ```

pub mod client;
pub mod error;
pub mod prompt;
pub mod stream;
pub mod types;

pub use client::{LlmClient, LlmProvider};
pub use error::LlmError;
pub use stream::StreamAggregator;
pub use types::{LlmRequest, LlmResponse, StreamStats};
