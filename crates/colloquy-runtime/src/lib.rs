//! # colloquy-runtime
//!
//! Context store, pipeline agents, and the multi-session orchestrator.
//!
//! - **Context store**: session arena with creation-on-miss, per-entry
//!   single-writer locks, lazy advisory expiry
//! - **Memory agent**: the only writer of session context; bounded history
//! - **Matching agent**: ordered first-match rule table, entity extraction
//! - **Conversational agent**: bounded prompt → failover client → response
//!   with suggestions; absorbs provider exhaustion into the degraded shape
//! - **Orchestrator**: sequences the stages per message under one overall
//!   deadline, aggregates metrics, exposes `status()`
//!
//! ## Crate Position
//!
//! Aggregation layer. Depends on: colloquy-core, colloquy-llm,
//! colloquy-settings.

#![deny(unsafe_code)]

pub mod agents;
pub mod errors;
pub mod orchestrator;
pub mod store;

pub use agents::{ConversationalAgent, MatchingAgent, MemoryAgent, MemoryStats};
pub use errors::RuntimeError;
pub use orchestrator::{Orchestrator, StatusSnapshot};
pub use store::{ContextStore, SessionEntry};
