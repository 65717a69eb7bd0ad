//! Settings type definitions with compiled defaults.
//!
//! The defaults carry the full built-in intent rule table, suggestion
//! tables, and sentiment lexicons, so a file-less deployment only needs the
//! two provider API keys from the environment.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::errors::{Result, SettingsError};

// ─────────────────────────────────────────────────────────────────────────────
// Providers
// ─────────────────────────────────────────────────────────────────────────────

/// Which backend implementation a provider slot uses.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    /// Google Generative Language (`generateContent`).
    Gemini,
    /// OpenAI Chat Completions.
    OpenAi,
}

/// One generation backend.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderSettings {
    /// Backend implementation.
    pub kind: ProviderKind,
    /// Model identifier sent to the backend.
    pub model: String,
    /// API key. Required; validated at startup.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Base URL override (tests point this at a local mock server).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

/// The provider pair plus shared call policy.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProvidersSettings {
    /// First-choice backend.
    pub primary: ProviderSettings,
    /// Failover backend.
    pub secondary: ProviderSettings,
    /// Per-attempt timeout in milliseconds.
    #[serde(default = "default_call_timeout_ms")]
    pub call_timeout_ms: u64,
    /// Maximum tokens requested per generation.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

fn default_call_timeout_ms() -> u64 {
    10_000
}
fn default_max_tokens() -> u32 {
    256
}

impl Default for ProvidersSettings {
    fn default() -> Self {
        Self {
            primary: ProviderSettings {
                kind: ProviderKind::Gemini,
                model: "gemini-2.5-flash".to_string(),
                api_key: None,
                base_url: None,
            },
            secondary: ProviderSettings {
                kind: ProviderKind::OpenAi,
                model: "gpt-4o-mini".to_string(),
                api_key: None,
                base_url: None,
            },
            call_timeout_ms: default_call_timeout_ms(),
            max_tokens: default_max_tokens(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Pipeline
// ─────────────────────────────────────────────────────────────────────────────

/// Orchestrator-level policy.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineSettings {
    /// Overall per-request deadline in milliseconds.
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
    /// Maximum turns kept per session context; oldest evicted first.
    #[serde(default = "default_max_turns")]
    pub max_turns: usize,
    /// Idle seconds after which a session is considered expired
    /// (advisory, checked lazily on access).
    #[serde(default = "default_session_idle_secs")]
    pub session_idle_secs: u64,
}

fn default_request_timeout_ms() -> u64 {
    30_000
}
fn default_max_turns() -> usize {
    50
}
fn default_session_idle_secs() -> u64 {
    3600
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            request_timeout_ms: default_request_timeout_ms(),
            max_turns: default_max_turns(),
            session_idle_secs: default_session_idle_secs(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Matching
// ─────────────────────────────────────────────────────────────────────────────

/// One intent rule: a label and the patterns that vote for it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntentRuleSettings {
    /// Intent label this rule produces.
    pub intent: String,
    /// Regex patterns; any match selects the rule, the matched fraction
    /// drives confidence.
    pub patterns: Vec<String>,
}

/// Matching agent configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchingSettings {
    /// Confidence assigned when no rule matches.
    #[serde(default = "default_confidence")]
    pub default_confidence: f32,
    /// Ordered rule table; first matching rule wins.
    #[serde(default = "default_intent_rules")]
    pub rules: Vec<IntentRuleSettings>,
}

fn default_confidence() -> f32 {
    0.3
}

fn default_intent_rules() -> Vec<IntentRuleSettings> {
    let table: [(&str, &[&str]); 6] = [
        (
            "greeting",
            &[
                r"\b(hello|hi|hey|good morning|good afternoon|good evening)\b",
                r"\b(how are you|how's it going|what's up)\b",
            ],
        ),
        (
            "question",
            &[r"\b(what|how|why|when|where|who|which)\b", r"\?\s*$"],
        ),
        (
            "request",
            &[
                r"\b(please|can you|could you|would you|help me)\b",
                r"\b(show me|tell me|explain|describe)\b",
            ],
        ),
        (
            "complaint",
            &[
                r"\b(problem|issue|error|bug|broken|not working)\b",
                r"\b(frustrated|annoyed|upset)\b",
            ],
        ),
        (
            "compliment",
            &[
                r"\b(thank you|thanks|great|awesome|excellent|amazing)\b",
                r"\b(good job|well done|perfect|love it)\b",
            ],
        ),
        (
            "goodbye",
            &[r"\b(bye|goodbye|see you|farewell|take care)\b"],
        ),
    ];
    table
        .into_iter()
        .map(|(intent, patterns)| IntentRuleSettings {
            intent: intent.to_string(),
            patterns: patterns.iter().map(ToString::to_string).collect(),
        })
        .collect()
}

impl Default for MatchingSettings {
    fn default() -> Self {
        Self {
            default_confidence: default_confidence(),
            rules: default_intent_rules(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Conversation
// ─────────────────────────────────────────────────────────────────────────────

/// Word lists for local sentiment derivation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SentimentLexicon {
    /// Words that signal positive tone.
    #[serde(default = "default_positive_words")]
    pub positive: Vec<String>,
    /// Words that signal negative tone.
    #[serde(default = "default_negative_words")]
    pub negative: Vec<String>,
}

fn default_positive_words() -> Vec<String> {
    [
        "good",
        "great",
        "excellent",
        "amazing",
        "wonderful",
        "fantastic",
        "love",
        "like",
        "happy",
        "pleased",
        "awesome",
        "brilliant",
        "perfect",
    ]
    .iter()
    .map(ToString::to_string)
    .collect()
}

fn default_negative_words() -> Vec<String> {
    [
        "bad",
        "terrible",
        "awful",
        "hate",
        "dislike",
        "angry",
        "frustrated",
        "sad",
        "disappointed",
        "horrible",
        "worst",
        "annoying",
    ]
    .iter()
    .map(ToString::to_string)
    .collect()
}

impl Default for SentimentLexicon {
    fn default() -> Self {
        Self {
            positive: default_positive_words(),
            negative: default_negative_words(),
        }
    }
}

/// Conversational agent configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationSettings {
    /// How many recent turns go into the prompt.
    #[serde(default = "default_prompt_turns")]
    pub prompt_turns: usize,
    /// Maximum suggestions returned per response.
    #[serde(default = "default_max_suggestions")]
    pub max_suggestions: usize,
    /// Per-intent suggestion table, loaded once, immutable thereafter.
    /// The `general` key doubles as the fallback for unlisted intents.
    #[serde(default = "default_suggestions")]
    pub suggestions: BTreeMap<String, Vec<String>>,
    /// Sentiment word lists.
    #[serde(default)]
    pub sentiment: SentimentLexicon,
}

fn default_prompt_turns() -> usize {
    5
}
fn default_max_suggestions() -> usize {
    3
}

fn default_suggestions() -> BTreeMap<String, Vec<String>> {
    let table: [(&str, &[&str]); 7] = [
        (
            "greeting",
            &["Hello, how are you?", "What can you help me with?"],
        ),
        (
            "question",
            &["What can you do?", "How does this work?", "Tell me more"],
        ),
        (
            "request",
            &[
                "Show me the system status",
                "Help me get started",
                "What else can you do?",
            ],
        ),
        (
            "complaint",
            &[
                "Report the problem",
                "Try rephrasing your request",
                "Contact support",
            ],
        ),
        ("compliment", &["What else can you do?", "Show me more"]),
        ("goodbye", &["See you later", "Come back anytime"]),
        (
            "general",
            &[
                "What can you do?",
                "How does this work?",
                "Show me the system status",
            ],
        ),
    ];
    table
        .into_iter()
        .map(|(intent, items)| {
            (
                intent.to_string(),
                items.iter().map(ToString::to_string).collect(),
            )
        })
        .collect()
}

impl Default for ConversationSettings {
    fn default() -> Self {
        Self {
            prompt_turns: default_prompt_turns(),
            max_suggestions: default_max_suggestions(),
            suggestions: default_suggestions(),
            sentiment: SentimentLexicon::default(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Root
// ─────────────────────────────────────────────────────────────────────────────

/// Root settings object, injectable into the orchestrator.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColloquySettings {
    /// Generation backends and call policy.
    #[serde(default)]
    pub providers: ProvidersSettings,
    /// Orchestrator-level policy.
    #[serde(default)]
    pub pipeline: PipelineSettings,
    /// Matching agent configuration.
    #[serde(default)]
    pub matching: MatchingSettings,
    /// Conversational agent configuration.
    #[serde(default)]
    pub conversation: ConversationSettings,
}

impl ColloquySettings {
    /// Validate startup invariants.
    ///
    /// Violations are fatal configuration errors: the pipeline refuses to
    /// initialize rather than degrade silently.
    pub fn validate(&self) -> Result<()> {
        if self
            .providers
            .primary
            .api_key
            .as_deref()
            .is_none_or(str::is_empty)
        {
            return Err(SettingsError::Invalid(
                "primary provider has no API key".to_string(),
            ));
        }
        if self
            .providers
            .secondary
            .api_key
            .as_deref()
            .is_none_or(str::is_empty)
        {
            return Err(SettingsError::Invalid(
                "secondary provider has no API key".to_string(),
            ));
        }
        if self.providers.call_timeout_ms == 0 {
            return Err(SettingsError::Invalid(
                "callTimeoutMs must be positive".to_string(),
            ));
        }
        if self.pipeline.request_timeout_ms == 0 {
            return Err(SettingsError::Invalid(
                "requestTimeoutMs must be positive".to_string(),
            ));
        }
        if self.pipeline.max_turns == 0 {
            return Err(SettingsError::Invalid(
                "maxTurns must be positive".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.matching.default_confidence) {
            return Err(SettingsError::Invalid(
                "defaultConfidence must be in [0, 1]".to_string(),
            ));
        }
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
