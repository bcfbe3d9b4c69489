//! Newline-delimited JSON stream aggregation.
//!
//! A streamed `/api/generate` reply is a sequence of JSON frames, one per
//! line, each optionally carrying a `response` fragment. Assembling the reply
//! is a fold over lines: every line either contributes a fragment or nothing.
//! A line that does not parse contributes nothing and the fold carries on.
//!
//! Bytes arrive in arbitrary chunks, so [`StreamAggregator::push_chunk`]
//! keeps the unterminated tail of each chunk until its newline shows up.

use tracing::trace;

use crate::types::{GenerateFrame, StreamStats};

/// Parse one line into a frame. Blank or malformed lines yield `None`.
#[must_use]
pub fn parse_frame(line: &str) -> Option<GenerateFrame> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    serde_json::from_str(line).ok()
}

/// Incremental reply assembler.
#[derive(Debug, Default, Clone)]
pub struct StreamAggregator {
    text: String,
    pending: Vec<u8>,
    stats: StreamStats,
}

impl StreamAggregator {
    /// Start an empty aggregation.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one complete line.
    pub fn push_line(&mut self, line: &str) {
        if line.trim().is_empty() {
            return;
        }
        match parse_frame(line) {
            Some(frame) => {
                self.stats.frames += 1;
                if let Some(fragment) = frame.response {
                    self.text.push_str(&fragment);
                }
                if frame.done == Some(true) {
                    self.stats.saw_done = true;
                }
            }
            None => {
                self.stats.skipped += 1;
                trace!(line = %line, "Skipping malformed stream frame");
            }
        }
    }

    /// Feed raw body bytes, folding every line they complete.
    pub fn push_chunk(&mut self, chunk: &[u8]) {
        self.pending.extend_from_slice(chunk);
        while let Some(newline) = self.pending.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.pending.drain(..=newline).collect();
            self.push_line(&String::from_utf8_lossy(&line[..newline]));
        }
    }

    /// Text assembled so far, untrimmed.
    #[must_use]
    pub fn partial(&self) -> &str {
        &self.text
    }

    /// Flush any unterminated last line and return the trimmed reply.
    #[must_use]
    pub fn finish(mut self) -> (String, StreamStats) {
        if !self.pending.is_empty() {
            let tail = std::mem::take(&mut self.pending);
            self.push_line(&String::from_utf8_lossy(&tail));
        }
        (self.text.trim().to_string(), self.stats)
    }
}

/// Fold a sequence of lines into a trimmed reply.
#[must_use]
pub fn aggregate_lines<I, S>(lines: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut aggregator = StreamAggregator::new();
    for line in lines {
        aggregator.push_line(line.as_ref());
    }
    aggregator.finish().0
}
