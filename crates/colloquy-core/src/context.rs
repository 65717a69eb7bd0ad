//! Per-session conversation context.
//!
//! [`SessionContext`] holds the bounded turn history plus the three derived
//! attributes (sentiment, intent, confidence). It exists from the moment a
//! session exists and is mutated only through the memory agent.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::turn::Turn;

/// Sentiment label derived from the latest user message.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sentiment {
    /// Positive tone.
    Positive,
    /// Negative tone.
    Negative,
    /// Neither, or not enough signal.
    #[default]
    Neutral,
}

impl Sentiment {
    /// Stable string form, used in logs and result payloads.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Positive => "positive",
            Self::Negative => "negative",
            Self::Neutral => "neutral",
        }
    }
}

/// Evolving state for one session: bounded history + derived attributes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionContext {
    /// Ordered turn history, oldest first. Bounded by the store's
    /// configured maximum; oldest turns are dropped first.
    pub turns: VecDeque<Turn>,
    /// Current sentiment label.
    pub sentiment: Sentiment,
    /// Current intent label.
    pub intent: String,
    /// Current confidence score in `[0.0, 1.0]`.
    pub confidence: f32,
}

impl Default for SessionContext {
    fn default() -> Self {
        Self {
            turns: VecDeque::new(),
            sentiment: Sentiment::Neutral,
            intent: "general".to_string(),
            confidence: 0.0,
        }
    }
}

impl SessionContext {
    /// Append a turn, evicting the oldest once `max_turns` is exceeded.
    pub fn push_turn(&mut self, turn: Turn, max_turns: usize) {
        self.turns.push_back(turn);
        while self.turns.len() > max_turns {
            let _ = self.turns.pop_front();
        }
    }

    /// Overwrite the derived attributes. Last write wins, no merge.
    pub fn set_derived(&mut self, sentiment: Sentiment, intent: impl Into<String>, confidence: f32) {
        self.sentiment = sentiment;
        self.intent = intent.into();
        self.confidence = confidence.clamp(0.0, 1.0);
    }

    /// The most recent `n` turns, oldest first.
    #[must_use]
    pub fn recent_turns(&self, n: usize) -> Vec<&Turn> {
        let skip = self.turns.len().saturating_sub(n);
        self.turns.iter().skip(skip).collect()
    }

    /// Number of turns currently held.
    #[must_use]
    pub fn turn_count(&self) -> usize {
        self.turns.len()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
