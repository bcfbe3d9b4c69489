//! Affective state: the current emotion label and the affinity heuristic.
//!
//! Emotion is a single free-form lowercase label shared by every caller.
//! Affinity is not stored anywhere; it is recomputed on every call from the
//! number of remembered entries plus a fresh random jitter, so two calls in a
//! row rarely agree.

use parking_lot::RwLock;
use rand::Rng;

/// Affinity gained per remembered entry.
pub const AFFINITY_PER_ENTRY: f64 = 0.2;
/// Upper bound (exclusive) of the random jitter.
pub const AFFINITY_JITTER: f64 = 0.2;
/// Affinity ceiling.
pub const AFFINITY_MAX: f64 = 10.0;

/// Process-wide emotion label with replace-on-write.
#[derive(Debug)]
pub struct Emotion {
    current: RwLock<String>,
}

impl Emotion {
    /// Start in `initial` (lowercased; blank falls back to `serene`).
    #[must_use]
    pub fn new(initial: &str) -> Self {
        let initial = normalize(initial).unwrap_or_else(|| "serene".to_string());
        Self {
            current: RwLock::new(initial),
        }
    }

    /// Current label.
    #[must_use]
    pub fn get(&self) -> String {
        self.current.read().clone()
    }

    /// Replace the label if `set` is non-blank, then return the current one.
    ///
    /// Any non-blank text is accepted; there is no fixed vocabulary.
    pub fn update(&self, set: Option<&str>) -> String {
        match set.and_then(normalize) {
            Some(next) => {
                let mut current = self.current.write();
                current.clone_from(&next);
                next
            }
            None => self.get(),
        }
    }
}

fn normalize(label: &str) -> Option<String> {
    let trimmed = label.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_lowercase())
}

/// Affinity for `count` remembered entries plus `jitter`, clamped to
/// `[0, AFFINITY_MAX]`.
#[must_use]
pub fn affinity_score(count: usize, jitter: f64) -> f64 {
    let count = f64::from(u32::try_from(count).unwrap_or(u32::MAX));
    (count * AFFINITY_PER_ENTRY + jitter).clamp(0.0, AFFINITY_MAX)
}

/// Affinity with a jitter drawn from the thread-local generator.
#[must_use]
pub fn affinity(count: usize) -> f64 {
    let jitter = rand::thread_rng().gen_range(0.0..AFFINITY_JITTER);
    affinity_score(count, jitter)
}
