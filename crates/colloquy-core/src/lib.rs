//! # colloquy-core
//!
//! Foundation types and metrics primitives for the Colloquy pipeline.
//!
//! This crate provides the shared vocabulary that all other Colloquy crates
//! depend on:
//!
//! - **Turns**: [`turn::Turn`] with [`turn::Role`] and optional metadata
//! - **Context**: [`context::SessionContext`] — bounded history plus derived
//!   attributes (sentiment, intent, confidence)
//! - **Sessions**: [`session::Session`] with lazy, advisory idle expiry
//! - **Results**: [`result::MatchResult`], [`result::GenerationResult`],
//!   [`result::ChatResult`] and the degraded-response shape
//! - **Metrics**: [`metrics::AgentMetrics`] and [`metrics::SystemMetrics`] —
//!   injectable, per-counter atomic, snapshot-friendly
//!
//! ## Crate Position
//!
//! Foundation crate. Depended on by all other colloquy crates.

#![deny(unsafe_code)]

pub mod context;
pub mod metrics;
pub mod result;
pub mod session;
pub mod turn;
