//! Conversation turn types.
//!
//! A [`Turn`] is immutable once created and owned by exactly one session
//! context. Assistant turns may carry [`TurnMetadata`] (response time, the
//! suggestions shown alongside the reply).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Who produced a turn.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// The end user.
    User,
    /// The pipeline's reply.
    Assistant,
}

/// Optional per-turn metadata, recorded on assistant turns.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TurnMetadata {
    /// End-to-end response time for the exchange, in milliseconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_time_ms: Option<u64>,
    /// Suggestions offered with the reply.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub suggestions: Vec<String>,
}

/// A single conversation turn.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Turn {
    /// Speaker role.
    pub role: Role,
    /// Message text.
    pub text: String,
    /// Creation time.
    pub timestamp: DateTime<Utc>,
    /// Assistant-side metadata, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<TurnMetadata>,
}

impl Turn {
    /// Create a user turn.
    #[must_use]
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            text: text.into(),
            timestamp: Utc::now(),
            metadata: None,
        }
    }

    /// Create an assistant turn with optional metadata.
    #[must_use]
    pub fn assistant(text: impl Into<String>, metadata: Option<TurnMetadata>) -> Self {
        Self {
            role: Role::Assistant,
            text: text.into(),
            timestamp: Utc::now(),
            metadata,
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
    fn user_turn_has_no_metadata() {
        let turn = Turn::user("hello");
        assert_eq!(turn.role, Role::User);
        assert_eq!(turn.text, "hello");
        assert!(turn.metadata.is_none());
    }

    #[test]
    fn assistant_turn_carries_metadata() {
        let meta = TurnMetadata {
            response_time_ms: Some(120),
            suggestions: vec!["What can you do?".into()],
        };
        let turn = Turn::assistant("hi there", Some(meta.clone()));
        assert_eq!(turn.role, Role::Assistant);
        assert_eq!(turn.metadata, Some(meta));
    }

    #[test]
    fn turn_serde_roundtrip() {
        let turn = Turn::assistant(
            "reply",
            Some(TurnMetadata {
                response_time_ms: Some(42),
                suggestions: vec![],
            }),
        );
        let json = serde_json::to_string(&turn).unwrap();
        let back: Turn = serde_json::from_str(&json).unwrap();
        assert_eq!(turn, back);
    }

    #[test]
    fn role_serializes_snake_case() {
        assert_eq!(serde_json::to_value(Role::User).unwrap(), "user");
        assert_eq!(serde_json::to_value(Role::Assistant).unwrap(), "assistant");
    }

    #[test]
    fn metadata_skips_empty_fields() {
        let turn = Turn::assistant("reply", Some(TurnMetadata::default()));
        let json = serde_json::to_value(&turn).unwrap();
        assert!(json["metadata"].get("responseTimeMs").is_none());
        assert!(json["metadata"].get("suggestions").is_none());
    }
}
