//! # Nunu Core Library
//!
//! The parts of Little Nunu that do not talk to the network:
//!
//! - **Memory**: a bounded, chronological log per user with
//!   case-insensitive selective erasure ([`MemoryStore`]).
//! - **Persistence**: the whole store as one JSON file, rewritten after
//!   every change.
//! - **Composer**: a seeded, deterministic text → MIDI sketch encoder.
//! - **Config**: `nunu.toml` with defaults for every field.

#![deny(clippy::unwrap_used)]
#![deny(missing_docs)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod composer;
pub mod config;
pub mod error;
pub mod memory;
pub mod persistence;
pub mod types;

pub use config::NunuConfig;
pub use error::NunuError;
pub use memory::{MemoryEntry, MemoryStore};
pub use types::*;
