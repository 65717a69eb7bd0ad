//! Orchestrator — multi-session pipeline coordinator.
//!
//! `handle` sequences memory-load → matching → generation → memory-persist
//! for one message, under a single overall deadline. Requests for different
//! sessions run fully in parallel; requests for the *same* session are not
//! serialized by the core — the store's per-entry locks make individual
//! mutations atomic, but callers that care about same-session ordering
//! SHOULD serialize delivery themselves.
//!
//! Errors never escape this boundary: deadline expiry and provider
//! exhaustion both surface as the uniform degraded [`ChatResult`], tagged
//! with a machine-readable reason.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use metrics::{counter, histogram};
use serde::{Deserialize, Serialize};
use tokio::time::Instant;
use tracing::{info, instrument, warn};

use colloquy_core::metrics::{
    AgentMetricsSnapshot, SystemMetrics, SystemMetricsSnapshot, PIPELINE_DEGRADED_TOTAL,
    PIPELINE_REQUESTS_TOTAL, PIPELINE_REQUEST_DURATION_SECONDS,
};
use colloquy_core::result::{ChatMetadata, ChatResult, DegradedReason, DerivedContext};
use colloquy_core::session::Session;
use colloquy_llm::{
    FailoverClient, FailoverConfig, GeminiConfig, GeminiProvider, OpenAiConfig, OpenAiProvider,
    Provider,
};
use colloquy_settings::{ColloquySettings, ProviderKind, ProviderSettings};

use crate::agents::{ConversationalAgent, MatchingAgent, MemoryAgent, MemoryStats};
use crate::errors::RuntimeError;
use crate::store::ContextStore;

/// Read-only view of system and per-agent health.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusSnapshot {
    /// Aggregate pipeline counters.
    pub system: SystemMetricsSnapshot,
    /// Per-agent counters, keyed by agent name.
    pub agents: BTreeMap<String, AgentMetricsSnapshot>,
}

/// Multi-session pipeline coordinator.
pub struct Orchestrator {
    store: Arc<ContextStore>,
    memory: MemoryAgent,
    matching: MatchingAgent,
    conversational: ConversationalAgent,
    system: Arc<SystemMetrics>,
    request_timeout: Duration,
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("request_timeout", &self.request_timeout)
            .finish_non_exhaustive()
    }
}

impl Orchestrator {
    /// Build the full pipeline from settings.
    ///
    /// Validates first: missing provider credentials or nonsensical bounds
    /// refuse to initialize (the fatal configuration class).
    pub fn from_settings(settings: &ColloquySettings) -> Result<Self, RuntimeError> {
        settings.validate()?;
        let client = FailoverClient::new(
            build_provider(&settings.providers.primary),
            build_provider(&settings.providers.secondary),
            FailoverConfig {
                call_timeout: Duration::from_millis(settings.providers.call_timeout_ms),
                max_tokens: settings.providers.max_tokens,
                ..FailoverConfig::default()
            },
        );
        Self::with_client(client, settings)
    }

    /// Build the pipeline around an already-constructed failover client.
    ///
    /// Used by tests to inject mock providers; skips credential checks
    /// since the client owns its backends.
    pub fn with_client(
        client: FailoverClient,
        settings: &ColloquySettings,
    ) -> Result<Self, RuntimeError> {
        let store = Arc::new(ContextStore::new(
            settings.pipeline.max_turns,
            Duration::from_secs(settings.pipeline.session_idle_secs),
        ));
        let orchestrator = Self {
            memory: MemoryAgent::new(Arc::clone(&store)),
            matching: MatchingAgent::from_settings(&settings.matching)?,
            conversational: ConversationalAgent::new(client, &settings.conversation),
            store,
            system: Arc::new(SystemMetrics::new()),
            request_timeout: Duration::from_millis(settings.pipeline.request_timeout_ms),
        };
        info!(
            request_timeout_ms = settings.pipeline.request_timeout_ms,
            max_turns = settings.pipeline.max_turns,
            "orchestrator initialized"
        );
        Ok(orchestrator)
    }

    /// Process one user message end to end.
    ///
    /// Blank identifiers are replaced with generated ones (echoed back in
    /// the result metadata). Always returns a `ChatResult`; on deadline
    /// expiry the remaining stages are aborted, partial results discarded,
    /// and the uniform degraded shape returned with `reason = timeout`.
    #[instrument(skip(self, message), fields(session_id, user_id))]
    pub async fn handle(&self, session_id: &str, user_id: &str, message: &str) -> ChatResult {
        let started = Instant::now();
        self.system.record_request();
        counter!(PIPELINE_REQUESTS_TOTAL).increment(1);

        let session_id = if session_id.is_empty() {
            Session::generate_id()
        } else {
            session_id.to_string()
        };
        let user_id = if user_id.is_empty() {
            Session::generate_user_id()
        } else {
            user_id.to_string()
        };

        let result = match tokio::time::timeout(
            self.request_timeout,
            self.run_pipeline(&session_id, &user_id, message, started),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => {
                let elapsed_ms = started.elapsed().as_millis() as u64;
                let err = RuntimeError::PipelineTimeout { elapsed_ms };
                warn!(error = %err, session_id, "returning degraded response");
                counter!(PIPELINE_DEGRADED_TOTAL, "reason" => DegradedReason::Timeout.as_str())
                    .increment(1);
                ChatResult::degraded(DegradedReason::Timeout, elapsed_ms, session_id, user_id)
            }
        };

        histogram!(PIPELINE_REQUEST_DURATION_SECONDS).record(started.elapsed().as_secs_f64());
        result
    }

    /// The pipeline proper: 4 stages, no deadline of its own.
    async fn run_pipeline(
        &self,
        session_id: &str,
        user_id: &str,
        message: &str,
        started: Instant,
    ) -> ChatResult {
        let context = self.memory.load_context(session_id, user_id);
        let match_result = self.matching.analyze(message, &context);
        let generation = self
            .conversational
            .respond(message, &context, &match_result)
            .await;

        if !generation.success {
            let elapsed_ms = started.elapsed().as_millis() as u64;
            counter!(
                PIPELINE_DEGRADED_TOTAL,
                "reason" => DegradedReason::ProviderExhausted.as_str()
            )
            .increment(1);
            return ChatResult::degraded(
                DegradedReason::ProviderExhausted,
                elapsed_ms,
                session_id,
                user_id,
            );
        }

        let sentiment = self.conversational.sentiment_of(message);
        self.memory.update_derived(
            session_id,
            sentiment,
            &match_result.intent,
            match_result.confidence,
        );
        self.memory.record_exchange(
            session_id,
            message,
            &generation,
            started.elapsed().as_millis() as u64,
        );

        let elapsed = started.elapsed();
        self.system.record_success(elapsed);

        ChatResult {
            response: generation.text,
            success: true,
            context: DerivedContext {
                sentiment,
                intent: match_result.intent,
                confidence: match_result.confidence,
            },
            suggestions: generation.suggestions,
            metadata: ChatMetadata {
                session_id: session_id.to_string(),
                user_id: user_id.to_string(),
                provider_used: generation.provider.map(|p| p.as_str().to_string()),
                response_time_ms: elapsed.as_millis() as u64,
                reason: None,
            },
        }
    }

    /// Read-only snapshot of system and per-agent health.
    ///
    /// Safe to call concurrently with active request handling; calling it
    /// twice with no intervening `handle` returns identical snapshots.
    #[must_use]
    pub fn status(&self) -> StatusSnapshot {
        let mut agents = BTreeMap::new();
        let _ = agents.insert("memory".to_string(), self.memory.metrics().snapshot());
        let _ = agents.insert("matching".to_string(), self.matching.metrics().snapshot());
        let _ = agents.insert(
            "conversational".to_string(),
            self.conversational.metrics().snapshot(),
        );
        StatusSnapshot {
            system: self.system.snapshot(self.store.session_count()),
            agents,
        }
    }

    /// Identity snapshot for one session, if it exists.
    #[must_use]
    pub fn session_info(&self, session_id: &str) -> Option<Session> {
        self.store.session_info(session_id)
    }

    /// Turn-count statistics for one session.
    #[must_use]
    pub fn memory_stats(&self, session_id: &str) -> MemoryStats {
        self.memory.stats(session_id)
    }

    /// The shared context store.
    #[must_use]
    pub fn store(&self) -> &Arc<ContextStore> {
        &self.store
    }
}

/// Construct the configured backend for one provider slot.
fn build_provider(settings: &ProviderSettings) -> Arc<dyn Provider> {
    let api_key = settings.api_key.clone().unwrap_or_default();
    match settings.kind {
        ProviderKind::Gemini => Arc::new(GeminiProvider::new(GeminiConfig {
            model: settings.model.clone(),
            api_key,
            base_url: settings.base_url.clone(),
        })),
        ProviderKind::OpenAi => Arc::new(OpenAiProvider::new(OpenAiConfig {
            model: settings.model.clone(),
            api_key,
            base_url: settings.base_url.clone(),
        })),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
