//! Memory agent — the only writer of session context.
//!
//! Wraps the [`ContextStore`] with the pipeline-facing operations (load,
//! record an exchange, overwrite derived attributes) and owns the agent's
//! metrics. Store operations are computation-only and never fail.

use std::sync::Arc;
use std::time::Instant;

use tracing::instrument;

use colloquy_core::context::{Sentiment, SessionContext};
use colloquy_core::metrics::AgentMetrics;
use colloquy_core::result::GenerationResult;
use colloquy_core::session::Session;
use colloquy_core::turn::{Turn, TurnMetadata};

use crate::store::ContextStore;

/// Turn-count statistics for one session.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MemoryStats {
    /// Turns currently held.
    pub turn_count: usize,
    /// Session identity, if the session exists.
    pub session: Option<Session>,
}

/// Memory agent over the shared context store.
pub struct MemoryAgent {
    store: Arc<ContextStore>,
    metrics: Arc<AgentMetrics>,
}

impl MemoryAgent {
    /// Create the agent over `store` with fresh metrics.
    #[must_use]
    pub fn new(store: Arc<ContextStore>) -> Self {
        Self {
            store,
            metrics: Arc::new(AgentMetrics::new()),
        }
    }

    /// This agent's metrics handle.
    #[must_use]
    pub fn metrics(&self) -> &Arc<AgentMetrics> {
        &self.metrics
    }

    /// Load (or lazily create) the context for a session.
    #[instrument(skip(self), fields(session_id))]
    pub fn load_context(&self, session_id: &str, user_id: &str) -> SessionContext {
        let started = Instant::now();
        let context = self.store.load(session_id, user_id);
        self.metrics.record_success(started.elapsed());
        context
    }

    /// Persist one completed exchange: the user turn, then the assistant
    /// turn carrying response time and suggestions.
    #[instrument(skip_all, fields(session_id))]
    pub fn record_exchange(
        &self,
        session_id: &str,
        user_message: &str,
        generation: &GenerationResult,
        response_time_ms: u64,
    ) {
        let started = Instant::now();
        self.store.record_turn(session_id, Turn::user(user_message));
        self.store.record_turn(
            session_id,
            Turn::assistant(
                generation.text.clone(),
                Some(TurnMetadata {
                    response_time_ms: Some(response_time_ms),
                    suggestions: generation.suggestions.clone(),
                }),
            ),
        );
        self.metrics.record_success(started.elapsed());
    }

    /// Overwrite the derived context attributes.
    pub fn update_derived(
        &self,
        session_id: &str,
        sentiment: Sentiment,
        intent: &str,
        confidence: f32,
    ) {
        self.store
            .update_derived(session_id, sentiment, intent, confidence);
    }

    /// Turn-count statistics for a session.
    #[must_use]
    pub fn stats(&self, session_id: &str) -> MemoryStats {
        MemoryStats {
            turn_count: self.store.turn_count(session_id),
            session: self.store.session_info(session_id),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
