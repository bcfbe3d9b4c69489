//! # nunu-engine
//!
//! Orchestration for Nunu: ties the memory store, the generation client,
//! the affect state and the MIDI composer into one [`Engine`], plus the
//! console front end the `nunu` binary drives.
//!
//! ```text
//! ┌───────────────┐   Command    ┌───────────────────────────┐
//! │ console::parse ├────────────►│          Engine            │
//! └───────────────┘              │  ┌──────────┐ ┌─────────┐  │
//!                                │  │MemoryStore│ │ Emotion │  │
//!                                │  └──────────┘ └─────────┘  │
//!                                │  ┌──────────┐ ┌─────────┐  │
//!                                │  │LlmClient │ │composer │  │
//!                                │  └──────────┘ └─────────┘  │
//!                                └───────────────────────────┘
//! ```

#![deny(clippy::unwrap_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod affect;
pub mod console;
pub mod engine;
pub mod error;
pub mod replies;

pub use console::Command;
pub use engine::Engine;
pub use error::{EngineError, Result};
