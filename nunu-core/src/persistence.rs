//! JSON file persistence for the [`MemoryStore`].
//!
//! The whole store is written as one pretty-printed JSON object keyed by the
//! decimal user id:
//!
//! ```json
//! {
//!   "142860002374215276": [
//!     { "role": "user", "text": "hi nunu", "when": "2025-10-14T08:48:02.123456789Z" }
//!   ]
//! }
//! ```
//!
//! Every save overwrites the file in full. There is no journal, so a crash
//! mid-write can leave a truncated file; [`MemoryStore::load_or_default`]
//! then starts from an empty store.

use std::collections::{BTreeMap, HashMap};
use std::io::ErrorKind;
use std::path::Path;
use std::time::Instant;

use tracing::{debug, info, warn};

use crate::error::{NunuError, Result};
use crate::memory::{MemoryEntry, MemoryStore, DEFAULT_CAPACITY};
use crate::types::UserId;

/// On-disk shape: sorted keys keep the file diff-friendly.
type MemoryFile = BTreeMap<String, Vec<MemoryEntry>>;

impl MemoryStore {
    /// Read a store from `path`.
    ///
    /// Keys that are not decimal 64-bit ids are skipped with a warning.
    ///
    /// # Errors
    ///
    /// Returns [`NunuError::Io`] if the file cannot be read (including when it
    /// does not exist) and [`NunuError::Serialization`] if it is not a valid
    /// memory file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::load_with_capacity(path, DEFAULT_CAPACITY)
    }

    /// Like [`MemoryStore::load`], trimming each log to `capacity`.
    ///
    /// # Errors
    ///
    /// See [`MemoryStore::load`].
    pub fn load_with_capacity<P: AsRef<Path>>(path: P, capacity: usize) -> Result<Self> {
        let path = path.as_ref();
        let start = Instant::now();

        let raw = std::fs::read(path)?;
        let file: MemoryFile = serde_json::from_slice(&raw)?;

        let mut logs = HashMap::with_capacity(file.len());
        for (key, entries) in file {
            match key.parse::<UserId>() {
                Ok(user) => {
                    logs.insert(user, entries);
                }
                Err(_) => warn!(key = %key, "Skipping memory log with invalid user id"),
            }
        }

        let store = Self::from_logs(logs, capacity);
        info!(
            path = %path.display(),
            users = store.logs().len(),
            entries = store.total_entries(),
            elapsed_us = start.elapsed().as_micros(),
            "Memory store loaded"
        );
        Ok(store)
    }

    /// Load `path`, falling back to an empty store on any failure.
    ///
    /// A missing file is the normal first-run case and logs at `debug`;
    /// unreadable or corrupt files log a warning. Nothing is propagated.
    #[must_use]
    pub fn load_or_default<P: AsRef<Path>>(path: P, capacity: usize) -> Self {
        let path = path.as_ref();
        match Self::load_with_capacity(path, capacity) {
            Ok(store) => store,
            Err(NunuError::Io(err)) if err.kind() == ErrorKind::NotFound => {
                debug!(path = %path.display(), "No memory file yet, starting empty");
                Self::with_capacity(capacity)
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "Memory file unreadable, starting with an empty store"
                );
                Self::with_capacity(capacity)
            }
        }
    }

    /// Serialize the full store to `path`, creating parent directories.
    ///
    /// # Errors
    ///
    /// Returns [`NunuError::Io`] if the directory or file cannot be written,
    /// or [`NunuError::Serialization`] if encoding fails.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let start = Instant::now();

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let file: BTreeMap<String, &Vec<MemoryEntry>> = self
            .logs()
            .iter()
            .map(|(user, entries)| (user.key(), entries))
            .collect();
        let json = serde_json::to_vec_pretty(&file)?;
        std::fs::write(path, &json)?;

        debug!(
            path = %path.display(),
            users = file.len(),
            bytes = json.len(),
            elapsed_us = start.elapsed().as_micros(),
            "Saved memory store"
        );
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
