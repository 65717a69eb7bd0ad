//! Per-request result types.
//!
//! [`MatchResult`] and [`GenerationResult`] are ephemeral — produced fresh
//! for each request and never persisted. [`ChatResult`] is the shape handed
//! back to the transport, including the uniform degraded fallback built by
//! [`ChatResult::degraded`].

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::context::Sentiment;

/// Canned reply used for every degraded response, regardless of how far the
/// pipeline progressed.
pub const DEGRADED_RESPONSE: &str =
    "I apologize, but I couldn't process your request right now. Please try again in a moment.";

// ─────────────────────────────────────────────────────────────────────────────
// Matching
// ─────────────────────────────────────────────────────────────────────────────

/// An entity extracted from a message, as a key–value pair.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entity {
    /// Entity class (e.g. `email`, `number`).
    pub kind: String,
    /// Matched text.
    pub value: String,
}

impl Entity {
    /// Create an entity.
    #[must_use]
    pub fn new(kind: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            value: value.into(),
        }
    }
}

/// Output of the matching agent for one message.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchResult {
    /// Winning intent label.
    pub intent: String,
    /// Entities found in the message, possibly empty.
    pub entities: Vec<Entity>,
    /// Match confidence in `[0.0, 1.0]`.
    pub confidence: f32,
}

impl MatchResult {
    /// The fallback result for input no rule matched.
    #[must_use]
    pub fn general(default_confidence: f32) -> Self {
        Self {
            intent: "general".to_string(),
            entities: Vec::new(),
            confidence: default_confidence.clamp(0.0, 1.0),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Generation
// ─────────────────────────────────────────────────────────────────────────────

/// Which backend served a generation request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderRole {
    /// First-choice backend.
    Primary,
    /// Failover backend.
    Secondary,
}

impl ProviderRole {
    /// Stable string form, used in result metadata and metrics labels.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Primary => "primary",
            Self::Secondary => "secondary",
        }
    }
}

/// Output of the conversational agent for one message.
#[derive(Clone, Debug, PartialEq)]
pub struct GenerationResult {
    /// Response text (canned apology when `success` is false).
    pub text: String,
    /// Up to K suggestion strings, possibly empty.
    pub suggestions: Vec<String>,
    /// Backend that produced the text; `None` when degraded.
    pub provider: Option<ProviderRole>,
    /// Elapsed generation time. On exhaustion this is the sum of all
    /// attempts, kept for observability only.
    pub latency: Duration,
    /// Whether generation completed normally.
    pub success: bool,
}

impl GenerationResult {
    /// The degraded fallback produced when both providers are exhausted.
    #[must_use]
    pub fn degraded(latency: Duration) -> Self {
        Self {
            text: DEGRADED_RESPONSE.to_string(),
            suggestions: Vec::new(),
            provider: None,
            latency,
            success: false,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Chat result
// ─────────────────────────────────────────────────────────────────────────────

/// Why a request returned the degraded shape.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DegradedReason {
    /// The overall per-request deadline expired.
    Timeout,
    /// Both generation backends failed.
    ProviderExhausted,
}

impl DegradedReason {
    /// Stable string form (`timeout` / `provider_exhausted`).
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Timeout => "timeout",
            Self::ProviderExhausted => "provider_exhausted",
        }
    }
}

/// Derived context attributes echoed back to the caller.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DerivedContext {
    /// Sentiment label.
    pub sentiment: Sentiment,
    /// Intent label.
    pub intent: String,
    /// Confidence score in `[0.0, 1.0]`.
    pub confidence: f32,
}

/// Request metadata attached to every [`ChatResult`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMetadata {
    /// Session the exchange belongs to (generated when the caller sent none).
    pub session_id: String,
    /// Owning user (generated when the caller sent none).
    pub user_id: String,
    /// Backend that served the request; `None` when degraded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider_used: Option<String>,
    /// End-to-end response time in milliseconds.
    pub response_time_ms: u64,
    /// Degradation reason, present only on degraded responses.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<DegradedReason>,
}

/// Final result of one `handle()` call.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatResult {
    /// Response text.
    pub response: String,
    /// Whether the pipeline completed normally.
    pub success: bool,
    /// Derived context attributes.
    pub context: DerivedContext,
    /// Suggestions, possibly empty.
    pub suggestions: Vec<String>,
    /// Request metadata.
    pub metadata: ChatMetadata,
}

impl ChatResult {
    /// Build the uniform degraded response.
    ///
    /// Identical regardless of how far the pipeline progressed — partial
    /// results are discarded, only the `reason` distinguishes a deadline
    /// expiry from provider exhaustion.
    #[must_use]
    pub fn degraded(
        reason: DegradedReason,
        response_time_ms: u64,
        session_id: impl Into<String>,
        user_id: impl Into<String>,
    ) -> Self {
        Self {
            response: DEGRADED_RESPONSE.to_string(),
            success: false,
            context: DerivedContext {
                sentiment: Sentiment::Neutral,
                intent: "general".to_string(),
                confidence: 0.0,
            },
            suggestions: Vec::new(),
            metadata: ChatMetadata {
                session_id: session_id.into(),
                user_id: user_id.into(),
                provider_used: None,
                response_time_ms,
                reason: Some(reason),
            },
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn general_match_result_clamps_confidence() {
        let result = MatchResult::general(0.3);
        assert_eq!(result.intent, "general");
        assert!(result.entities.is_empty());
        assert!((result.confidence - 0.3).abs() < f32::EPSILON);

        let clamped = MatchResult::general(1.4);
        assert!((clamped.confidence - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn provider_role_strings() {
        assert_eq!(ProviderRole::Primary.as_str(), "primary");
        assert_eq!(ProviderRole::Secondary.as_str(), "secondary");
    }

    #[test]
    fn degraded_generation_has_no_provider() {
        let result = GenerationResult::degraded(Duration::from_millis(350));
        assert!(!result.success);
        assert!(result.provider.is_none());
        assert!(result.suggestions.is_empty());
        assert_eq!(result.text, DEGRADED_RESPONSE);
    }

    #[test]
    fn degraded_reason_serializes_machine_readable() {
        assert_eq!(
            serde_json::to_value(DegradedReason::Timeout).unwrap(),
            "timeout"
        );
        assert_eq!(
            serde_json::to_value(DegradedReason::ProviderExhausted).unwrap(),
            "provider_exhausted"
        );
    }

    #[test]
    fn degraded_chat_result_is_uniform() {
        let timeout = ChatResult::degraded(DegradedReason::Timeout, 30_000, "s1", "u1");
        let exhausted = ChatResult::degraded(DegradedReason::ProviderExhausted, 900, "s1", "u1");

        assert_eq!(timeout.response, exhausted.response);
        assert_eq!(timeout.context, exhausted.context);
        assert!(!timeout.success);
        assert!(timeout.suggestions.is_empty());
        assert_eq!(timeout.metadata.reason, Some(DegradedReason::Timeout));
        assert_eq!(
            exhausted.metadata.reason,
            Some(DegradedReason::ProviderExhausted)
        );
        assert!(timeout.metadata.provider_used.is_none());
    }

    #[test]
    fn chat_result_serde_shape() {
        let result = ChatResult {
            response: "hello".into(),
            success: true,
            context: DerivedContext {
                sentiment: Sentiment::Positive,
                intent: "greeting".into(),
                confidence: 0.8,
            },
            suggestions: vec!["Hi there".into()],
            metadata: ChatMetadata {
                session_id: "s1".into(),
                user_id: "u1".into(),
                provider_used: Some("primary".into()),
                response_time_ms: 240,
                reason: None,
            },
        };
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["context"]["sentiment"], "positive");
        assert_eq!(json["metadata"]["providerUsed"], "primary");
        assert_eq!(json["metadata"]["sessionId"], "s1");
        assert!(json["metadata"].get("reason").is_none());
    }
}
