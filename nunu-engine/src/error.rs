//! Engine error type.

use nunu_core::NunuError;
use nunu_llm::LlmError;
use thiserror::Error;

/// Why an engine operation failed.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The generation backend failed; no memory was changed for the turn.
    #[error(transparent)]
    Llm(#[from] LlmError),

    /// The memory file could not be written.
    #[error(transparent)]
    Memory(#[from] NunuError),
}

/// Convenience Result type alias.
pub type Result<T> = std::result::Result<T, EngineError>;
