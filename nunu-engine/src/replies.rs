//! Canned user-facing lines in Nunu's voice.

use std::path::Path;

/// Generic failure line for any turn that errored.
pub const FAILURE: &str = "Void-gremlin chewed a wire. Try again!";

/// Acknowledgement for `remember`.
pub const REMEMBERED: &str = "A silver thread tied to your soul\u{2014}remembered.";

/// Reply to `forget`.
#[must_use]
pub fn forgotten(count: usize) -> String {
    if count > 0 {
        format!("Snipped {count} tangled thread(s).")
    } else {
        "Nothing there but dust and moonlight.".to_string()
    }
}

/// Reply to `affinity`, two decimals.
#[must_use]
pub fn affinity(score: f64) -> String {
    format!("Affinity shimmer: **{score:.2}**")
}

/// Reply to `emotion`.
#[must_use]
pub fn emotion(now: &str) -> String {
    format!("Nunu feels **{now}**.")
}

/// Reply to `compose_song`.
#[must_use]
pub fn song(path: Option<&Path>) -> String {
    match path {
        Some(path) => format!("Saved a tiny melody to `{}`", path.display()),
        None => "My strings tangled\u{2014}songcraft failed. WAH!".to_string(),
    }
}
