//! A single remembered line of conversation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::Role;

/// One immutable memory entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryEntry {
    /// Who produced the text.
    pub role: Role,
    /// The remembered text, verbatim.
    pub text: String,
    /// When the entry was recorded (UTC, RFC 3339 on disk).
    pub when: DateTime<Utc>,
}

impl MemoryEntry {
    /// Create an entry stamped with the current UTC time.
    #[must_use]
    pub fn now(role: Role, text: impl Into<String>) -> Self {
        Self::at(role, text, Utc::now())
    }

    /// Create an entry with an explicit timestamp.
    #[must_use]
    pub fn at(role: Role, text: impl Into<String>, when: DateTime<Utc>) -> Self {
        Self {
            role,
            text: text.into(),
            when,
        }
    }

    /// Render as a prompt line body (`role: text`).
    #[must_use]
    pub fn as_prompt_line(&self) -> String {
        format!("{}: {}", self.role, self.text)
    }

    /// Case-insensitive substring match against the entry text.
    #[must_use]
    pub fn mentions(&self, needle_lowercase: &str) -> bool {
        self.text.to_lowercase().contains(needle_lowercase)
    }
}
