//! Matching agent — rule-based intent classification and entity extraction.
//!
//! `analyze` is a pure function of its inputs: no mutation, no failure.
//! Intent selection walks an ordered rule table and the first rule with any
//! matching pattern wins — rule order is the tie-break policy. Confidence
//! is the matched fraction of the winning rule's patterns scaled above the
//! unmatched default, plus a small boost when the session was already on
//! the same intent. Unmatched input falls back to the `general` intent with
//! the configured low confidence and an empty entity set.

use std::sync::Arc;
use std::time::Instant;

use regex::Regex;
use tracing::instrument;

use colloquy_core::context::SessionContext;
use colloquy_core::metrics::AgentMetrics;
use colloquy_core::result::{Entity, MatchResult};
use colloquy_settings::MatchingSettings;

use crate::errors::RuntimeError;

/// Confidence boost applied when the session context already carries the
/// winning intent.
const REPEAT_INTENT_BOOST: f32 = 0.1;

/// Entity extraction rules: independent of intent classification, each
/// class may contribute any number of entities per message.
const ENTITY_PATTERNS: [(&str, &str); 6] = [
    ("email", r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b"),
    ("phone", r"\b\d{3}[-.]?\d{3}[-.]?\d{4}\b"),
    ("url", r"https?://[^\s]+"),
    ("date", r"\b\d{1,2}[/-]\d{1,2}[/-]\d{2,4}\b"),
    ("time", r"\b\d{1,2}:\d{2}\s*(?:am|pm)?\b"),
    ("number", r"\b\d+\b"),
];

/// One compiled intent rule.
#[derive(Debug)]
struct IntentRule {
    intent: String,
    patterns: Vec<Regex>,
}

/// Matching agent over a compiled, immutable rule table.
#[derive(Debug)]
pub struct MatchingAgent {
    rules: Vec<IntentRule>,
    entity_rules: Vec<(&'static str, Regex)>,
    default_confidence: f32,
    metrics: Arc<AgentMetrics>,
}

impl MatchingAgent {
    /// Compile the rule table from settings.
    ///
    /// A pattern that fails to compile is a fatal configuration error.
    pub fn from_settings(settings: &MatchingSettings) -> Result<Self, RuntimeError> {
        let mut rules = Vec::with_capacity(settings.rules.len());
        for rule in &settings.rules {
            let mut patterns = Vec::with_capacity(rule.patterns.len());
            for pattern in &rule.patterns {
                patterns.push(Regex::new(pattern).map_err(|e| RuntimeError::InvalidPattern {
                    intent: rule.intent.clone(),
                    source: Box::new(e),
                })?);
            }
            rules.push(IntentRule {
                intent: rule.intent.clone(),
                patterns,
            });
        }

        let mut entity_rules = Vec::with_capacity(ENTITY_PATTERNS.len());
        for (kind, pattern) in ENTITY_PATTERNS {
            entity_rules.push((
                kind,
                Regex::new(pattern).map_err(|e| RuntimeError::InvalidPattern {
                    intent: kind.to_string(),
                    source: Box::new(e),
                })?,
            ));
        }

        Ok(Self {
            rules,
            entity_rules,
            default_confidence: settings.default_confidence,
            metrics: Arc::new(AgentMetrics::new()),
        })
    }

    /// This agent's metrics handle.
    #[must_use]
    pub fn metrics(&self) -> &Arc<AgentMetrics> {
        &self.metrics
    }

    /// Classify a message against the session context.
    #[instrument(skip_all, fields(message_len = message.len()))]
    pub fn analyze(&self, message: &str, context: &SessionContext) -> MatchResult {
        let started = Instant::now();
        let lowered = message.to_lowercase();

        let result = self
            .rules
            .iter()
            .find_map(|rule| {
                let matched = rule
                    .patterns
                    .iter()
                    .filter(|p| p.is_match(&lowered))
                    .count();
                (matched > 0).then(|| self.build_match(rule, matched, message, context))
            })
            .unwrap_or_else(|| MatchResult::general(self.default_confidence));

        self.metrics.record_success(started.elapsed());
        result
    }

    /// Assemble the result for the winning rule.
    fn build_match(
        &self,
        rule: &IntentRule,
        matched: usize,
        message: &str,
        context: &SessionContext,
    ) -> MatchResult {
        let fraction = matched as f32 / rule.patterns.len() as f32;
        let mut confidence =
            self.default_confidence + (1.0 - self.default_confidence) * fraction;
        if context.intent == rule.intent && context.turn_count() > 0 {
            confidence += REPEAT_INTENT_BOOST;
        }
        MatchResult {
            intent: rule.intent.clone(),
            entities: self.extract_entities(message),
            confidence: confidence.clamp(0.0, 1.0),
        }
    }

    /// Run every entity rule over the raw message.
    fn extract_entities(&self, message: &str) -> Vec<Entity> {
        self.entity_rules
            .iter()
            .flat_map(|(kind, pattern)| {
                pattern
                    .find_iter(message)
                    .map(move |m| Entity::new(*kind, m.as_str()))
            })
            .collect()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use colloquy_core::turn::Turn;
    use colloquy_settings::IntentRuleSettings;

    fn agent() -> MatchingAgent {
        MatchingAgent::from_settings(&MatchingSettings::default()).unwrap()
    }

    fn empty_context() -> SessionContext {
        SessionContext::default()
    }

    // ── Intent classification ───────────────────────────────────────────

    #[test]
    fn greeting_is_detected() {
        let result = agent().analyze("Hello there", &empty_context());
        assert_eq!(result.intent, "greeting");
        assert!(result.confidence > 0.3);
        assert!(result.confidence <= 1.0);
    }

    #[test]
    fn question_mark_triggers_question() {
        let result = agent().analyze("is it working?", &empty_context());
        assert_eq!(result.intent, "question");
    }

    #[test]
    fn first_matching_rule_wins() {
        // Matches both greeting ("hello") and question ("what") patterns;
        // greeting sits earlier in the table.
        let result = agent().analyze("hello, what is this", &empty_context());
        assert_eq!(result.intent, "greeting");
    }

    #[test]
    fn unmatched_input_falls_back_to_general() {
        let result = agent().analyze("zzz qqq", &empty_context());
        assert_eq!(result.intent, "general");
        assert!((result.confidence - 0.3).abs() < f32::EPSILON);
        assert!(result.entities.is_empty());
    }

    #[test]
    fn malformed_input_never_panics() {
        let agent = agent();
        for input in ["", "   ", "\u{1F600}\u{1F600}", "\0", &"x".repeat(100_000)] {
            let result = agent.analyze(input, &empty_context());
            assert!((0.0..=1.0).contains(&result.confidence));
        }
    }

    #[test]
    fn sentiment_bearing_message_classifies_within_bounds() {
        // "great" sits in the compliment pattern set.
        let result = agent().analyze("I feel great today", &empty_context());
        assert_eq!(result.intent, "compliment");
        assert!((0.0..=1.0).contains(&result.confidence));
    }

    // ── Confidence ──────────────────────────────────────────────────────

    #[test]
    fn confidence_scales_with_matched_fraction() {
        let agent = agent();
        // One of two greeting patterns.
        let partial = agent.analyze("hello", &empty_context());
        // Both greeting patterns ("hey" + "how are you").
        let full = agent.analyze("hey, how are you", &empty_context());
        assert!(full.confidence > partial.confidence);
        assert!((full.confidence - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn repeated_intent_boosts_confidence() {
        let agent = agent();
        let fresh = agent.analyze("hello", &empty_context());

        let mut context = empty_context();
        context.push_turn(Turn::user("hi"), 10);
        context.set_derived(colloquy_core::context::Sentiment::Neutral, "greeting", 0.6);
        let repeated = agent.analyze("hello", &context);

        assert!(repeated.confidence > fresh.confidence);
    }

    #[test]
    fn analyze_does_not_mutate_context() {
        let agent = agent();
        let context = empty_context();
        let before = context.clone();
        let _ = agent.analyze("hello", &context);
        assert_eq!(context, before);
    }

    // ── Entities ────────────────────────────────────────────────────────

    #[test]
    fn extracts_email_entity() {
        let result = agent().analyze(
            "please email me at bob@example.com",
            &empty_context(),
        );
        assert!(result
            .entities
            .iter()
            .any(|e| e.kind == "email" && e.value == "bob@example.com"));
    }

    #[test]
    fn extracts_multiple_entity_classes() {
        let result = agent().analyze(
            "please call 555-123-4567 tomorrow at 10:30 am",
            &empty_context(),
        );
        let kinds: Vec<_> = result.entities.iter().map(|e| e.kind.as_str()).collect();
        assert!(kinds.contains(&"phone"));
        assert!(kinds.contains(&"time"));
    }

    #[test]
    fn extracts_plain_numbers() {
        let result = agent().analyze("can you show me 42 examples", &empty_context());
        assert!(result
            .entities
            .iter()
            .any(|e| e.kind == "number" && e.value == "42"));
    }

    // ── Configuration ───────────────────────────────────────────────────

    #[test]
    fn custom_rule_table_replaces_defaults() {
        let settings = MatchingSettings {
            default_confidence: 0.2,
            rules: vec![IntentRuleSettings {
                intent: "order".to_string(),
                patterns: vec![r"\border\b".to_string()],
            }],
        };
        let agent = MatchingAgent::from_settings(&settings).unwrap();

        assert_eq!(
            agent.analyze("I want to order a pizza", &empty_context()).intent,
            "order"
        );
        assert_eq!(agent.analyze("hello", &empty_context()).intent, "general");
    }

    #[test]
    fn invalid_pattern_is_a_startup_error() {
        let settings = MatchingSettings {
            default_confidence: 0.3,
            rules: vec![IntentRuleSettings {
                intent: "broken".to_string(),
                patterns: vec!["(unclosed".to_string()],
            }],
        };
        let err = MatchingAgent::from_settings(&settings).unwrap_err();
        assert!(matches!(err, RuntimeError::InvalidPattern { .. }));
    }
}
