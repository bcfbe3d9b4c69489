//! The orchestration engine: one context object behind every chat-facing
//! operation.
//!
//! ```text
//! chat(user, input)
//!   ├─ lock store → last(user, context_window) → unlock
//!   ├─ persona + emotion + history + input → prompt
//!   ├─ LlmClient::generate (await; the only suspension point)
//!   └─ lock store → append user, append assistant → save → unlock
//! ```
//!
//! All store mutations and the save that follows them happen under one
//! mutex, so concurrent callers never lose each other's entries or
//! interleave writes to the memory file. The lock is never held across an
//! `.await`. If a `chat` future is dropped while the backend is still
//! streaming, the request is aborted and nothing is committed.

use std::path::PathBuf;

use chrono::Utc;
use nunu_core::composer;
use nunu_core::memory::MemoryStore;
use nunu_core::types::{Role, UserId};
use nunu_core::NunuConfig;
use nunu_llm::prompt::{system_prompt, PromptBuilder};
use nunu_llm::{LlmClient, LlmRequest};
use parking_lot::Mutex;
use tracing::{debug, error, info, warn};

use crate::affect::{self, Emotion};
use crate::error::Result;

/// Memory-aware chat orchestration for one assistant persona.
#[derive(Debug)]
pub struct Engine {
    config: NunuConfig,
    llm: LlmClient,
    store: Mutex<MemoryStore>,
    emotion: Emotion,
}

impl Engine {
    /// Assemble an engine from its parts.
    ///
    /// The store is re-bounded to `config.memory.max_entries_per_user`.
    #[must_use]
    pub fn new(config: NunuConfig, llm: LlmClient, mut store: MemoryStore) -> Self {
        store.set_capacity(config.memory.max_entries_per_user);
        let emotion = Emotion::new(&config.persona.initial_emotion);
        Self {
            config,
            llm,
            store: Mutex::new(store),
            emotion,
        }
    }

    /// Build an engine talking to the configured Ollama server, with the
    /// memory file loaded (or an empty store if it is missing or corrupt).
    #[must_use]
    pub fn from_config(config: NunuConfig) -> Self {
        let store =
            MemoryStore::load_or_default(&config.memory.path, config.memory.max_entries_per_user);
        let llm = LlmClient::ollama(config.llm.base_url.clone(), config.llm.model.clone());
        info!(
            model = %config.llm.model,
            base_url = %config.llm.base_url,
            memory = %config.memory.path.display(),
            users = store.users().count(),
            "Nunu engine ready"
        );
        Self::new(config, llm, store)
    }

    /// Active configuration.
    #[must_use]
    pub fn config(&self) -> &NunuConfig {
        &self.config
    }

    /// The prompt `chat` would send for `input` right now.
    #[must_use]
    pub fn build_prompt(&self, user: UserId, input: &str) -> String {
        let context = self.store.lock().last(user, self.config.memory.context_window);
        let persona = &self.config.persona;
        let system = system_prompt(&persona.text, &self.emotion.get(), &persona.style, &persona.tone);
        PromptBuilder::new(&system)
            .turns(context.iter().map(|entry| (entry.role, entry.text.as_str())))
            .finish(input)
    }

    /// Answer `input` in persona, remembering both sides of the turn.
    ///
    /// # Errors
    ///
    /// Returns [`crate::EngineError::Llm`] if the backend fails (memory is left
    /// untouched) or [`crate::EngineError::Memory`] if the reply was produced
    /// but the memory file could not be written.
    pub async fn chat(&self, user: UserId, input: &str) -> Result<String> {
        let prompt = self.build_prompt(user, input);
        let request = LlmRequest::new(prompt)
            .with_temperature(self.config.llm.temperature)
            .with_timeout(self.config.llm.request_timeout_ms);

        let response = self.llm.generate(&request).await.inspect_err(|e| {
            warn!(user = %user, error = %e, "Chat turn failed, memory unchanged");
        })?;

        debug!(
            user = %user,
            latency_ms = response.latency_ms,
            reply_chars = response.text.len(),
            "Chat turn answered"
        );

        let mut store = self.store.lock();
        store.append(user, Role::User, input);
        store.append(user, Role::Assistant, response.text.clone());
        self.persist(&store)?;
        Ok(response.text)
    }

    /// Store a note about `user`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::EngineError::Memory`] if the memory file could not be
    /// written; the note stays in memory and is saved with the next change.
    pub fn remember(&self, user: UserId, note: &str) -> Result<()> {
        let mut store = self.store.lock();
        store.append(user, Role::Note, note);
        self.persist(&store)
    }

    /// Erase `user`'s memories: all of them, or those mentioning `filter`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::EngineError::Memory`] if the memory file could not be
    /// written.
    pub fn forget(&self, user: UserId, filter: Option<&str>) -> Result<usize> {
        let mut store = self.store.lock();
        let removed = store.forget(user, filter);
        self.persist(&store)?;
        info!(user = %user, removed, filtered = filter.is_some(), "Forgot memories");
        Ok(removed)
    }

    /// Fresh, non-reproducible affinity toward `user` in `[0, 10]`.
    #[must_use]
    pub fn affinity(&self, user: UserId) -> f64 {
        affect::affinity(self.memory_count(user))
    }

    /// Set the emotion if `set` is non-blank; return the current one.
    pub fn emotion(&self, set: Option<&str>) -> String {
        let now = self.emotion.update(set);
        if set.is_some_and(|s| !s.trim().is_empty()) {
            info!(emotion = %now, "Emotion changed");
        }
        now
    }

    /// Write a MIDI sketch of `text` and return its path.
    ///
    /// `mood` defaults to the configured mood. Returns `None` if the file
    /// could not be written.
    #[must_use]
    pub fn compose_song(&self, text: &str, mood: Option<&str>) -> Option<PathBuf> {
        let mood = mood
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .unwrap_or(&self.config.composer.default_mood);
        let name = format!("nunu_{}.mid", Utc::now().timestamp());
        let path = match std::path::absolute(self.config.composer.output_dir.join(name)) {
            Ok(path) => path,
            Err(e) => {
                error!(error = %e, "Could not resolve songcraft output path");
                return None;
            }
        };

        match composer::write_midi(&path, text, mood) {
            Ok(()) => {
                info!(path = %path.display(), mood, "Composed a tiny melody");
                Some(path)
            }
            Err(e) => {
                error!(path = %path.display(), error = %e, "Songcraft failed");
                None
            }
        }
    }

    /// Entries remembered for `user`.
    #[must_use]
    pub fn memory_count(&self, user: UserId) -> usize {
        self.store.lock().count(user)
    }

    /// Users with at least one stored entry or an emptied history.
    #[must_use]
    pub fn user_count(&self) -> usize {
        self.store.lock().users().count()
    }

    /// Most recent `take` entries for `user`, oldest first.
    #[must_use]
    pub fn recent(&self, user: UserId, take: usize) -> Vec<nunu_core::MemoryEntry> {
        self.store.lock().last(user, take)
    }

    fn persist(&self, store: &MemoryStore) -> Result<()> {
        store.save(&self.config.memory.path).map_err(|e| {
            error!(path = %self.config.memory.path.display(), error = %e, "Failed to save memory");
            e.into()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine_in(dir: &tempfile::TempDir) -> Engine {
        let mut config = NunuConfig::default();
        config.memory.path = dir.path().join("memory.json");
        config.composer.output_dir = dir.path().join("songs");
        config.persona.text = "You are Nunu.".to_string();
        Engine::new(config, LlmClient::none(), MemoryStore::new())
    }

    #[test]
    fn prompt_layout_with_history() {
        let dir = tempfile::tempdir().expect("tempdir");
        let engine = engine_in(&dir);
        let user = UserId(5);
        engine.remember(user, "likes lavender tea").expect("remember");

        let prompt = engine.build_prompt(user, "what do I like?");
        assert_eq!(
            prompt,
            "system: You are Nunu.\n\
             Current emotion: serene.\n\
             Keep responses under 1\u{2013}3 short paragraphs. FFXIV tone.\n\
             note: likes lavender tea\n\
             user: what do I like?\n"
        );
    }

    #[test]
    fn prompt_includes_only_the_context_window() {
        let dir = tempfile::tempdir().expect("tempdir");
        let engine = engine_in(&dir);
        let user = UserId(5);
        for i in 0..10 {
            engine.remember(user, &format!("fact {i}")).expect("remember");
        }
        let prompt = engine.build_prompt(user, "hi");
        assert!(!prompt.contains("fact 3\n"));
        for i in 4..10 {
            assert!(prompt.contains(&format!("note: fact {i}\n")));
        }
    }

    #[test]
    fn prompt_reflects_the_current_emotion() {
        let dir = tempfile::tempdir().expect("tempdir");
        let engine = engine_in(&dir);
        engine.emotion(Some("Fierce"));
        assert!(engine.build_prompt(UserId(1), "hi").contains("Current emotion: fierce."));
    }

    #[test]
    fn remember_and_forget_persist() {
        let dir = tempfile::tempdir().expect("tempdir");
        let engine = engine_in(&dir);
        let user = UserId(9);
        engine.remember(user, "Moogle plush").expect("remember");
        engine.remember(user, "hates mornings").expect("remember");

        let on_disk = MemoryStore::load(&engine.config().memory.path).expect("load");
        assert_eq!(on_disk.count(user), 2);

        assert_eq!(engine.forget(user, Some("moogle")).expect("forget"), 1);
        let on_disk = MemoryStore::load(&engine.config().memory.path).expect("load");
        assert_eq!(on_disk.count(user), 1);
        assert_eq!(on_disk.last(user, 1)[0].text, "hates mornings");
    }

    #[test]
    fn user_count_tracks_known_users() {
        let dir = tempfile::tempdir().expect("tempdir");
        let engine = engine_in(&dir);
        assert_eq!(engine.user_count(), 0);
        engine.remember(UserId(1), "a").expect("remember");
        engine.remember(UserId(2), "b").expect("remember");
        engine.remember(UserId(1), "c").expect("remember");
        assert_eq!(engine.user_count(), 2);
    }

    #[test]
    fn emotion_set_then_read() {
        let dir = tempfile::tempdir().expect("tempdir");
        let engine = engine_in(&dir);
        assert_eq!(engine.emotion(None), "serene");
        assert_eq!(engine.emotion(Some("Happy")), "happy");
        assert_eq!(engine.emotion(None), "happy");
    }

    #[test]
    fn affinity_tracks_memory_count() {
        let dir = tempfile::tempdir().expect("tempdir");
        let engine = engine_in(&dir);
        let user = UserId(3);
        assert!(engine.affinity(user) < 0.2);
        for i in 0..5 {
            engine.remember(user, &format!("{i}")).expect("remember");
        }
        let score = engine.affinity(user);
        assert!((1.0..1.2).contains(&score), "{score}");
    }

    #[test]
    fn compose_song_writes_midi_under_output_dir() {
        let dir = tempfile::tempdir().expect("tempdir");
        let engine = engine_in(&dir);
        let path = engine.compose_song("Every note is a tether", None).expect("path");
        assert!(path.is_absolute());
        assert!(path.starts_with(dir.path().join("songs")));
        let name = path.file_name().and_then(|n| n.to_str()).expect("name");
        assert!(name.starts_with("nunu_") && name.ends_with(".mid"));

        let bytes = std::fs::read(&path).expect("read");
        assert_eq!(bytes, composer::encode("Every note is a tether", "neutral"));
    }

    #[test]
    fn compose_song_uses_given_mood() {
        let dir = tempfile::tempdir().expect("tempdir");
        let engine = engine_in(&dir);
        let path = engine.compose_song("la", Some("void")).expect("path");
        assert_eq!(std::fs::read(&path).expect("read"), composer::encode("la", "void"));
    }

    #[test]
    fn compose_song_failure_is_none() {
        let dir = tempfile::tempdir().expect("tempdir");
        let blocker = dir.path().join("not-a-dir");
        std::fs::write(&blocker, b"file in the way").expect("write");

        let mut config = NunuConfig::default();
        config.memory.path = dir.path().join("memory.json");
        config.composer.output_dir = blocker;
        let engine = Engine::new(config, LlmClient::none(), MemoryStore::new());
        assert!(engine.compose_song("la", None).is_none());
    }

    #[tokio::test]
    async fn chat_failure_leaves_memory_unchanged() {
        let dir = tempfile::tempdir().expect("tempdir");
        let engine = engine_in(&dir);
        let user = UserId(11);
        engine.remember(user, "before").expect("remember");

        let err = engine.chat(user, "hello?").await.expect_err("no backend");
        assert!(matches!(err, crate::EngineError::Llm(_)));
        assert_eq!(engine.memory_count(user), 1);
        let on_disk = MemoryStore::load(&engine.config().memory.path).expect("load");
        assert_eq!(on_disk.count(user), 1);
    }

    #[test]
    fn unwritable_memory_path_surfaces_but_keeps_state() {
        let dir = tempfile::tempdir().expect("tempdir");
        let blocker = dir.path().join("file");
        std::fs::write(&blocker, b"x").expect("write");

        let mut config = NunuConfig::default();
        config.memory.path = blocker.join("memory.json");
        let engine = Engine::new(config, LlmClient::none(), MemoryStore::new());

        assert!(matches!(
            engine.remember(UserId(1), "note"),
            Err(crate::EngineError::Memory(_))
        ));
        assert_eq!(engine.memory_count(UserId(1)), 1);
    }
}
