//! Configuration for Nunu.
//!
//! Maps directly to `nunu.toml`. Every field has a default, so an empty file
//! (or no file at all) yields a working local setup against Ollama.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{NunuError, Result};
use crate::memory::DEFAULT_CAPACITY;

/// Top-level configuration, loadable from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NunuConfig {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,
    /// Generation backend settings.
    #[serde(default)]
    pub llm: LlmConfig,
    /// Voice and mood of the assistant.
    #[serde(default)]
    pub persona: PersonaConfig,
    /// Conversational memory settings.
    #[serde(default)]
    pub memory: MemoryConfig,
    /// Songcraft output settings.
    #[serde(default)]
    pub composer: ComposerConfig,
}

impl NunuConfig {
    /// Load configuration from a TOML string.
    ///
    /// # Errors
    /// Returns `NunuError::Config` if the TOML is invalid or fails validation.
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        let config: Self = toml::from_str(toml_str).map_err(|e| NunuError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Check value ranges that serde cannot express.
    ///
    /// # Errors
    /// Returns `NunuError::Config` naming the first offending field.
    pub fn validate(&self) -> Result<()> {
        if self.llm.model.trim().is_empty() {
            return Err(NunuError::Config("llm.model must not be empty".into()));
        }
        if self.llm.base_url.trim().is_empty() {
            return Err(NunuError::Config("llm.base_url must not be empty".into()));
        }
        if !self.llm.temperature.is_finite() || !(0.0..=2.0).contains(&self.llm.temperature) {
            return Err(NunuError::Config(format!(
                "llm.temperature must be within 0.0..=2.0, got {}",
                self.llm.temperature
            )));
        }
        if self.llm.request_timeout_ms == 0 {
            return Err(NunuError::Config("llm.request_timeout_ms must be positive".into()));
        }
        if self.memory.max_entries_per_user == 0 {
            return Err(NunuError::Config(
                "memory.max_entries_per_user must be positive".into(),
            ));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Sub-configs
// ---------------------------------------------------------------------------

/// General process settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Log level: trace, debug, info, warn, error.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

/// Generation backend configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Base URL of the Ollama-compatible server.
    #[serde(default = "default_ollama_url")]
    pub base_url: String,
    /// Model name passed through to the backend.
    #[serde(default = "default_model")]
    pub model: String,
    /// Sampling temperature.
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    /// Hard timeout for one generation call, body included.
    #[serde(default = "default_timeout_ms")]
    pub request_timeout_ms: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: default_ollama_url(),
            model: default_model(),
            temperature: default_temperature(),
            request_timeout_ms: default_timeout_ms(),
        }
    }
}

/// Persona text and affective defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersonaConfig {
    /// Descriptive text prepended to every prompt.
    #[serde(default = "default_persona")]
    pub text: String,
    /// Emotion the assistant starts in.
    #[serde(default = "default_emotion")]
    pub initial_emotion: String,
    /// Length constraint appended to the system line.
    #[serde(default = "default_style")]
    pub style: String,
    /// Flavour constraint appended after `style`.
    #[serde(default = "default_tone")]
    pub tone: String,
}

impl Default for PersonaConfig {
    fn default() -> Self {
        Self {
            text: default_persona(),
            initial_emotion: default_emotion(),
            style: default_style(),
            tone: default_tone(),
        }
    }
}

/// Conversational memory configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryConfig {
    /// Where the memory file lives.
    #[serde(default = "default_memory_path")]
    pub path: PathBuf,
    /// Entries kept per user before the oldest are evicted.
    #[serde(default = "default_capacity")]
    pub max_entries_per_user: usize,
    /// How many recent entries are replayed into each prompt.
    #[serde(default = "default_context_window")]
    pub context_window: usize,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            path: default_memory_path(),
            max_entries_per_user: default_capacity(),
            context_window: default_context_window(),
        }
    }
}

/// Songcraft output configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComposerConfig {
    /// Directory MIDI sketches are written to.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    /// Mood used when the caller gives none.
    #[serde(default = "default_mood")]
    pub default_mood: String,
}

impl Default for ComposerConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            default_mood: default_mood(),
        }
    }
}

// ---------------------------------------------------------------------------
// Serde default helpers
// ---------------------------------------------------------------------------

fn default_log_level() -> String { "info".to_string() }
fn default_ollama_url() -> String { "http://localhost:11434".to_string() }
fn default_model() -> String { "nunu-8b".to_string() }
fn default_temperature() -> f32 { 0.8 }
fn default_timeout_ms() -> u64 { 120_000 }
fn default_persona() -> String {
    "Nunubu \u{201c}Nunu\u{201d} Nubu \u{2014} The Soul Weeper. Speak like a mischievous, \
     void-touched Lalafell bard from FFXIV. Use occasional WAH!. Serious line: \
     \u{201c}Every note is a tether\u{2026} every soul, a string.\u{201d}"
        .to_string()
}
fn default_emotion() -> String { "serene".to_string() }
fn default_style() -> String { "Keep responses under 1\u{2013}3 short paragraphs.".to_string() }
fn default_tone() -> String { "FFXIV tone.".to_string() }
fn default_memory_path() -> PathBuf { PathBuf::from("memory.json") }
fn default_capacity() -> usize { DEFAULT_CAPACITY }
fn default_context_window() -> usize { 6 }
fn default_output_dir() -> PathBuf { PathBuf::from(".") }
fn default_mood() -> String { "neutral".to_string() }
