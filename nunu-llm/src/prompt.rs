//! Prompt assembly for chat turns.
//!
//! A chat prompt is plain text, one line per speaker:
//!
//! ```text
//! system: <persona>
//! Current emotion: <emotion>.
//! <style> <tone>
//! note: likes lavender tea
//! user: hi nunu
//! assistant: WAH! hello!
//! user: <input>
//! ```
//!
//! The system block is the only multi-line part; every other line is
//! `role: text` exactly as remembered.

use std::fmt::{self, Write as _};

/// Combine persona, the current emotion and the style constraints into the
/// system block.
#[must_use]
pub fn system_prompt(persona: &str, emotion: &str, style: &str, tone: &str) -> String {
    let constraint = [style.trim(), tone.trim()]
        .into_iter()
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    format!("{persona}\nCurrent emotion: {emotion}.\n{constraint}")
}

/// Line-by-line builder for a chat prompt.
#[derive(Debug, Clone)]
pub struct PromptBuilder {
    out: String,
}

impl PromptBuilder {
    /// Start a prompt with its `system:` block.
    #[must_use]
    pub fn new(system: &str) -> Self {
        let mut builder = Self { out: String::new() };
        builder.line("system", system);
        builder
    }

    /// Append one remembered turn.
    #[must_use]
    pub fn turn(mut self, role: impl fmt::Display, text: &str) -> Self {
        self.line(role, text);
        self
    }

    /// Append several remembered turns in order.
    #[must_use]
    pub fn turns<I, R, T>(mut self, turns: I) -> Self
    where
        I: IntoIterator<Item = (R, T)>,
        R: fmt::Display,
        T: AsRef<str>,
    {
        for (role, text) in turns {
            self.line(role, text.as_ref());
        }
        self
    }

    /// Close with the new user input and return the prompt text.
    #[must_use]
    pub fn finish(mut self, input: &str) -> String {
        self.line("user", input);
        self.out
    }

    fn line(&mut self, role: impl fmt::Display, text: &str) {
        // Writing into a String cannot fail.
        let _ = writeln!(self.out, "{role}: {text}");
    }
}
