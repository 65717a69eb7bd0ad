//! # Provider Trait
//!
//! Core abstraction for generation backends. Every backend (Gemini, `OpenAI`)
//! implements [`Provider`] to expose a unified `generate` call.
//!
//! Backend-specific failures are mapped into [`ProviderError`] before the
//! failover state machine sees them; [`ProviderError::is_transient`] is the
//! default classification into the transient/permanent failure classes.

use async_trait::async_trait;

/// Result type alias for provider operations.
pub type ProviderResult<T> = Result<T, ProviderError>;

/// Errors that can occur during a generation call.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The per-attempt timeout elapsed. Scoped to this request only —
    /// no cross-request state is kept.
    #[error("call timed out after {elapsed_ms}ms")]
    Timeout {
        /// Time spent before giving up, in milliseconds.
        elapsed_ms: u64,
    },

    /// Authentication failed (invalid or rejected key).
    #[error("auth error: {message}")]
    Auth {
        /// Error description.
        message: String,
    },

    /// Rate limited by the backend.
    #[error("rate limited: retry after {retry_after_ms}ms")]
    RateLimited {
        /// Suggested retry delay in milliseconds (0 when not advertised).
        retry_after_ms: u64,
        /// Error description.
        message: String,
    },

    /// Backend returned an API error.
    #[error("API error ({status}): {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Error description.
        message: String,
        /// Whether this error is in the transient class.
        retryable: bool,
    },

    /// The backend answered but produced no text.
    #[error("backend returned an empty completion")]
    Empty,

    /// The call was cancelled (deadline expiry upstream).
    #[error("call cancelled")]
    Cancelled,
}

impl ProviderError {
    /// Whether this failure is in the transient class.
    ///
    /// Transient failures permit the single primary retry; both classes
    /// trigger failover to the secondary.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Http(e) => {
                e.is_timeout()
                    || e.is_connect()
                    || e.status()
                        .is_some_and(|s| s == reqwest::StatusCode::TOO_MANY_REQUESTS || s.is_server_error())
            }
            Self::Timeout { .. } | Self::RateLimited { .. } => true,
            Self::Api { retryable, .. } => *retryable,
            Self::Json(_) | Self::Auth { .. } | Self::Empty | Self::Cancelled => false,
        }
    }

    /// Error category string for metrics labels.
    #[must_use]
    pub fn category(&self) -> &'static str {
        match self {
            Self::Http(_) => "network",
            Self::Json(_) => "parse",
            Self::Timeout { .. } => "timeout",
            Self::Auth { .. } => "auth",
            Self::RateLimited { .. } => "rate_limit",
            Self::Api { .. } => "api",
            Self::Empty => "empty",
            Self::Cancelled => "cancelled",
        }
    }
}

/// Core generation backend trait.
///
/// Implementors must be `Send + Sync` for use across concurrent pipelines.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Backend identifier (e.g. `"gemini"`, `"openai"`).
    fn name(&self) -> &str;

    /// Current model ID.
    fn model(&self) -> &str;

    /// Generate a completion for `prompt`, bounded by `max_tokens`.
    async fn generate(&self, prompt: &str, max_tokens: u32) -> ProviderResult<String>;
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
