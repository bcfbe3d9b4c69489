//! Per-user conversational memory and the [`MemoryStore`] aggregate.
//!
//! Every user gets an ordered, chronological log of [`MemoryEntry`]s.
//! The log is bounded: once it grows past the store capacity the oldest
//! entries are evicted from the front, so the most recent
//! [`DEFAULT_CAPACITY`] entries always survive.
//!
//! Persistence lives in [`crate::persistence`].

pub mod entry;

pub use entry::MemoryEntry;

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::types::{Role, UserId};

/// Entries kept per user unless configured otherwise.
pub const DEFAULT_CAPACITY: usize = 200;

/// In-memory mapping of user → chronological memory log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryStore {
    users: HashMap<UserId, Vec<MemoryEntry>>,
    capacity: usize,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    /// Create an empty store with the default capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Create an empty store keeping at most `capacity` entries per user.
    ///
    /// A capacity of zero is treated as one.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            users: HashMap::new(),
            capacity: capacity.max(1),
        }
    }

    /// Build a store from already-ordered per-user logs, trimming each to
    /// `capacity`.
    #[must_use]
    pub fn from_logs(logs: HashMap<UserId, Vec<MemoryEntry>>, capacity: usize) -> Self {
        let mut store = Self {
            users: logs,
            capacity: capacity.max(1),
        };
        store.enforce_capacity();
        store
    }

    /// Per-user entry limit.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Change the per-user limit, evicting the oldest entries where needed.
    pub fn set_capacity(&mut self, capacity: usize) {
        self.capacity = capacity.max(1);
        self.enforce_capacity();
    }

    /// Append an entry stamped with the current UTC time.
    pub fn append(&mut self, user: UserId, role: Role, text: impl Into<String>) {
        self.push(user, MemoryEntry::now(role, text));
    }

    /// Append an entry with an explicit timestamp.
    pub fn append_at(
        &mut self,
        user: UserId,
        role: Role,
        text: impl Into<String>,
        when: DateTime<Utc>,
    ) {
        self.push(user, MemoryEntry::at(role, text, when));
    }

    fn push(&mut self, user: UserId, entry: MemoryEntry) {
        let log = self.users.entry(user).or_default();
        log.push(entry);
        trim_front(log, self.capacity);
    }

    /// The most recent `take` entries for `user`, oldest first.
    ///
    /// Unknown users yield an empty list.
    #[must_use]
    pub fn last(&self, user: UserId, take: usize) -> Vec<MemoryEntry> {
        self.users.get(&user).map_or_else(Vec::new, |log| {
            let start = log.len().saturating_sub(take);
            log[start..].to_vec()
        })
    }

    /// Number of entries stored for `user` (0 if unknown).
    #[must_use]
    pub fn count(&self, user: UserId) -> usize {
        self.users.get(&user).map_or(0, Vec::len)
    }

    /// Erase memories for `user`.
    ///
    /// A blank or absent filter wipes the whole history. Otherwise every entry
    /// whose text contains `filter` (ignoring case) is removed and the order of
    /// the survivors is kept. Returns how many entries were removed.
    pub fn forget(&mut self, user: UserId, filter: Option<&str>) -> usize {
        let Some(log) = self.users.get_mut(&user) else {
            return 0;
        };

        match filter.filter(|f| !f.trim().is_empty()) {
            None => {
                let removed = log.len();
                log.clear();
                removed
            }
            Some(needle) => {
                let needle = needle.to_lowercase();
                let before = log.len();
                log.retain(|entry| !entry.mentions(&needle));
                before - log.len()
            }
        }
    }

    /// Full chronological log for `user`, if any.
    #[must_use]
    pub fn history(&self, user: UserId) -> Option<&[MemoryEntry]> {
        self.users.get(&user).map(Vec::as_slice)
    }

    /// All users that have a log (possibly empty after a full forget).
    pub fn users(&self) -> impl Iterator<Item = UserId> + '_ {
        self.users.keys().copied()
    }

    /// Total entries across every user.
    #[must_use]
    pub fn total_entries(&self) -> usize {
        self.users.values().map(Vec::len).sum()
    }

    /// Whether no user has any entry.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.total_entries() == 0
    }

    pub(crate) fn logs(&self) -> &HashMap<UserId, Vec<MemoryEntry>> {
        &self.users
    }

    fn enforce_capacity(&mut self) {
        let capacity = self.capacity;
        for log in self.users.values_mut() {
            trim_front(log, capacity);
        }
    }
}

/// Drop the oldest entries so that at most `capacity` remain.
fn trim_front(log: &mut Vec<MemoryEntry>, capacity: usize) {
    if log.len() > capacity {
        let excess = log.len() - capacity;
        log.drain(..excess);
    }
}
