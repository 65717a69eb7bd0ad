//! # colloquy-llm
//!
//! Generation provider trait, HTTP backends, and the failover client.
//!
//! - **Provider trait**: [`provider::Provider`] — `generate(prompt,
//!   max_tokens) -> text` with errors pre-classified into transient and
//!   permanent classes
//! - **Backends**: [`gemini::GeminiProvider`] and [`openai::OpenAiProvider`],
//!   thin non-streaming reqwest clients
//! - **Failover**: [`failover::FailoverClient`] — per-request state machine
//!   with per-attempt timeout, a single transiency-gated primary retry,
//!   and best-effort cancellation
//!
//! ## Crate Position
//!
//! Depends on: colloquy-core. Depended on by: colloquy-runtime.

#![deny(unsafe_code)]

pub mod error_parsing;
pub mod failover;
pub mod gemini;
pub mod openai;
pub mod provider;

pub use failover::{FailoverClient, FailoverConfig, FailoverError, FailoverOutcome};
pub use gemini::{GeminiConfig, GeminiProvider};
pub use openai::{OpenAiConfig, OpenAiProvider};
pub use provider::{Provider, ProviderError, ProviderResult};
