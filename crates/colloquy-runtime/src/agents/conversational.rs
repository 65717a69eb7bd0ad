//! Conversational agent — prompt building, generation, suggestions.
//!
//! Builds a bounded prompt (recent turns + match summary + the message),
//! delegates text generation to the failover client, and dresses the
//! completion with per-intent suggestions and a locally derived sentiment.
//! When both backends are exhausted it returns the canned degraded result —
//! a defined fallback path, not an error.

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::sync::Arc;

use metrics::counter;
use tracing::{instrument, warn};

use colloquy_core::context::{Sentiment, SessionContext};
use colloquy_core::metrics::AgentMetrics;
use colloquy_core::result::{GenerationResult, MatchResult};
use colloquy_core::turn::Role;
use colloquy_llm::{FailoverClient, FailoverError};
use colloquy_settings::ConversationSettings;

/// Fixed preamble for every generation prompt.
const PROMPT_PREAMBLE: &str =
    "You are a helpful conversational assistant. Reply to the user naturally and concisely.";

/// Conversational agent over the failover client.
pub struct ConversationalAgent {
    client: FailoverClient,
    prompt_turns: usize,
    max_suggestions: usize,
    suggestions: BTreeMap<String, Vec<String>>,
    positive_words: Vec<String>,
    negative_words: Vec<String>,
    metrics: Arc<AgentMetrics>,
}

impl ConversationalAgent {
    /// Create the agent from settings and an already-built client.
    #[must_use]
    pub fn new(client: FailoverClient, settings: &ConversationSettings) -> Self {
        Self {
            client,
            prompt_turns: settings.prompt_turns,
            max_suggestions: settings.max_suggestions,
            suggestions: settings.suggestions.clone(),
            positive_words: settings.sentiment.positive.clone(),
            negative_words: settings.sentiment.negative.clone(),
            metrics: Arc::new(AgentMetrics::new()),
        }
    }

    /// This agent's metrics handle.
    #[must_use]
    pub fn metrics(&self) -> &Arc<AgentMetrics> {
        &self.metrics
    }

    /// Generate a response for the message.
    ///
    /// Provider exhaustion is absorbed here: the returned result carries
    /// the canned apology with `success = false` rather than an error.
    #[instrument(skip_all, fields(intent = %match_result.intent))]
    pub async fn respond(
        &self,
        message: &str,
        context: &SessionContext,
        match_result: &MatchResult,
    ) -> GenerationResult {
        let prompt = self.build_prompt(message, context, match_result);

        match self.client.generate(&prompt).await {
            Ok(outcome) => {
                self.metrics.record_success(outcome.latency);
                GenerationResult {
                    text: outcome.text,
                    suggestions: self.suggestions_for(&match_result.intent),
                    provider: Some(outcome.provider),
                    latency: outcome.latency,
                    success: true,
                }
            }
            Err(FailoverError::Exhausted {
                primary,
                secondary,
                elapsed,
            }) => {
                warn!(%primary, %secondary, "generation exhausted, returning degraded response");
                counter!("pipeline_generation_exhausted_total").increment(1);
                self.metrics.record_failure();
                GenerationResult::degraded(elapsed)
            }
            Err(FailoverError::Cancelled) => {
                // Deadline expiry upstream; the orchestrator discards this
                // result, so shape it like any other degraded outcome.
                self.metrics.record_failure();
                GenerationResult::degraded(std::time::Duration::ZERO)
            }
        }
    }

    /// Derive sentiment from the message via the configured lexicons.
    #[must_use]
    pub fn sentiment_of(&self, message: &str) -> Sentiment {
        let lowered = message.to_lowercase();
        if self.positive_words.iter().any(|w| lowered.contains(w)) {
            Sentiment::Positive
        } else if self.negative_words.iter().any(|w| lowered.contains(w)) {
            Sentiment::Negative
        } else {
            Sentiment::Neutral
        }
    }

    /// Compose the bounded prompt: preamble, last N turns, match summary,
    /// then the message itself.
    fn build_prompt(
        &self,
        message: &str,
        context: &SessionContext,
        match_result: &MatchResult,
    ) -> String {
        let mut prompt = String::from(PROMPT_PREAMBLE);

        let recent = context.recent_turns(self.prompt_turns);
        if !recent.is_empty() {
            prompt.push_str("\n\nRecent conversation:");
            for turn in recent {
                let speaker = match turn.role {
                    Role::User => "User",
                    Role::Assistant => "Assistant",
                };
                let _ = write!(prompt, "\n{speaker}: {}", turn.text);
            }
        }

        let _ = write!(
            prompt,
            "\n\nDetected intent: {} (confidence {:.2})",
            match_result.intent, match_result.confidence
        );
        if !match_result.entities.is_empty() {
            prompt.push_str("\nEntities:");
            for entity in &match_result.entities {
                let _ = write!(prompt, " {}={}", entity.kind, entity.value);
            }
        }

        let _ = write!(prompt, "\n\nUser message: {message}");
        prompt
    }

    /// Up to K suggestions for the intent, falling back to the `general`
    /// table entry.
    fn suggestions_for(&self, intent: &str) -> Vec<String> {
        let mut items = self
            .suggestions
            .get(intent)
            .or_else(|| self.suggestions.get("general"))
            .cloned()
            .unwrap_or_default();
        items.truncate(self.max_suggestions);
        items
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
