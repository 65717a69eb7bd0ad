//! # Failover Client
//!
//! Explicit per-request state machine over the primary/secondary backends:
//!
//! ```text
//! TryPrimary ──success──────────────────────────▶ Done
//! TryPrimary ──transient failure──▶ RetryPrimary
//! TryPrimary ──permanent failure─────────────────▶ TrySecondary
//! RetryPrimary ──success────────────────────────▶ Done
//! RetryPrimary ──failure─────────────────────────▶ TrySecondary
//! TrySecondary ──success────────────────────────▶ Done
//! TrySecondary ──failure────────────────────────▶ Exhausted
//! ```
//!
//! Nothing carries over between requests — a timeout counts as a failure
//! for that provider on this request only, never as a circuit breaker.
//! Exactly one primary retry is permitted, gated by a configuration-provided
//! transiency predicate. Every attempt is bounded by the per-call timeout
//! and cancellable; cancellation is best-effort (the in-flight HTTP future
//! is dropped, the backend may still complete in the background).

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use metrics::{counter, histogram};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument, warn};

use colloquy_core::metrics::{
    PROVIDER_ERRORS_TOTAL, PROVIDER_FAILOVERS_TOTAL, PROVIDER_REQUESTS_TOTAL,
    PROVIDER_REQUEST_DURATION_SECONDS, PROVIDER_RETRIES_TOTAL,
};
use colloquy_core::result::ProviderRole;

use crate::provider::{Provider, ProviderError};

/// Predicate deciding whether a primary failure permits the single retry.
pub type TransientPredicate = Arc<dyn Fn(&ProviderError) -> bool + Send + Sync>;

/// Failover policy for one client.
#[derive(Clone)]
pub struct FailoverConfig {
    /// Per-attempt timeout.
    pub call_timeout: Duration,
    /// Token bound passed to every generation call.
    pub max_tokens: u32,
    /// Transiency classification for the primary-retry gate.
    pub retry_transient: TransientPredicate,
}

impl Default for FailoverConfig {
    fn default() -> Self {
        Self {
            call_timeout: Duration::from_secs(10),
            max_tokens: 256,
            retry_transient: Arc::new(ProviderError::is_transient),
        }
    }
}

impl fmt::Debug for FailoverConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FailoverConfig")
            .field("call_timeout", &self.call_timeout)
            .field("max_tokens", &self.max_tokens)
            .finish_non_exhaustive()
    }
}

/// Successful generation outcome.
#[derive(Clone, Debug)]
pub struct FailoverOutcome {
    /// Completion text.
    pub text: String,
    /// Which backend produced it.
    pub provider: ProviderRole,
    /// Elapsed time of the successful attempt only.
    pub latency: Duration,
    /// Attempts made, including the successful one.
    pub attempts: u32,
}

/// Failure after the state machine ran out of options.
#[derive(Debug, thiserror::Error)]
pub enum FailoverError {
    /// Both backends failed. Carries each backend's final error and the
    /// total elapsed time across all attempts (observability only — not
    /// counted in success-latency averages).
    #[error("both providers exhausted after {}ms (primary: {primary}; secondary: {secondary})", elapsed.as_millis())]
    Exhausted {
        /// The primary's final error.
        primary: ProviderError,
        /// The secondary's error.
        secondary: ProviderError,
        /// Total elapsed time across all attempts.
        elapsed: Duration,
    },

    /// The request was cancelled before a backend answered.
    #[error("generation cancelled")]
    Cancelled,
}

/// Per-request machine states. Terminal outcomes (`Done`, `Exhausted`) are
/// the return values of [`FailoverClient::generate_with_cancel`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum AttemptState {
    TryPrimary,
    RetryPrimary,
    TrySecondary,
}

/// Dual-backend generation client with automatic failover.
pub struct FailoverClient {
    primary: Arc<dyn Provider>,
    secondary: Arc<dyn Provider>,
    config: FailoverConfig,
}

impl FailoverClient {
    /// Create a client over the given backend pair.
    #[must_use]
    pub fn new(
        primary: Arc<dyn Provider>,
        secondary: Arc<dyn Provider>,
        config: FailoverConfig,
    ) -> Self {
        Self {
            primary,
            secondary,
            config,
        }
    }

    /// The configured policy.
    #[must_use]
    pub fn config(&self) -> &FailoverConfig {
        &self.config
    }

    /// Generate a completion without external cancellation.
    pub async fn generate(&self, prompt: &str) -> Result<FailoverOutcome, FailoverError> {
        self.generate_with_cancel(prompt, &CancellationToken::new())
            .await
    }

    /// Generate a completion, aborting early if `cancel` fires.
    #[instrument(skip_all, fields(prompt_len = prompt.len()))]
    pub async fn generate_with_cancel(
        &self,
        prompt: &str,
        cancel: &CancellationToken,
    ) -> Result<FailoverOutcome, FailoverError> {
        let started = Instant::now();
        let mut state = AttemptState::TryPrimary;
        let mut attempts = 0u32;
        let mut primary_error: Option<ProviderError> = None;

        loop {
            let (provider, role) = match state {
                AttemptState::TryPrimary | AttemptState::RetryPrimary => {
                    (&self.primary, ProviderRole::Primary)
                }
                AttemptState::TrySecondary => (&self.secondary, ProviderRole::Secondary),
            };

            attempts += 1;
            let attempt_started = Instant::now();
            match self.attempt(provider.as_ref(), prompt, cancel).await {
                Ok(text) => {
                    // Done.
                    return Ok(FailoverOutcome {
                        text,
                        provider: role,
                        latency: attempt_started.elapsed(),
                        attempts,
                    });
                }
                Err(ProviderError::Cancelled) => return Err(FailoverError::Cancelled),
                Err(err) => {
                    counter!(
                        PROVIDER_ERRORS_TOTAL,
                        "provider" => provider.name().to_string(),
                        "category" => err.category()
                    )
                    .increment(1);

                    state = match state {
                        AttemptState::TryPrimary if (self.config.retry_transient)(&err) => {
                            debug!(error = %err, "transient primary failure, retrying once");
                            counter!(PROVIDER_RETRIES_TOTAL).increment(1);
                            primary_error = Some(err);
                            AttemptState::RetryPrimary
                        }
                        AttemptState::TryPrimary | AttemptState::RetryPrimary => {
                            warn!(error = %err, "primary failed, failing over to secondary");
                            counter!(PROVIDER_FAILOVERS_TOTAL).increment(1);
                            primary_error = Some(err);
                            AttemptState::TrySecondary
                        }
                        AttemptState::TrySecondary => {
                            // Exhausted.
                            warn!(error = %err, "secondary failed, both providers exhausted");
                            return Err(FailoverError::Exhausted {
                                primary: primary_error
                                    .take()
                                    .unwrap_or(ProviderError::Empty),
                                secondary: err,
                                elapsed: started.elapsed(),
                            });
                        }
                    };
                }
            }
        }
    }

    /// Run one bounded, cancellable attempt against `provider`.
    async fn attempt(
        &self,
        provider: &dyn Provider,
        prompt: &str,
        cancel: &CancellationToken,
    ) -> Result<String, ProviderError> {
        counter!(PROVIDER_REQUESTS_TOTAL, "provider" => provider.name().to_string()).increment(1);
        let started = Instant::now();

        let result = tokio::select! {
            res = tokio::time::timeout(
                self.config.call_timeout,
                provider.generate(prompt, self.config.max_tokens),
            ) => match res {
                Ok(inner) => inner,
                Err(_) => Err(ProviderError::Timeout {
                    elapsed_ms: self.config.call_timeout.as_millis() as u64,
                }),
            },
            () = cancel.cancelled() => Err(ProviderError::Cancelled),
        };

        histogram!(
            PROVIDER_REQUEST_DURATION_SECONDS,
            "provider" => provider.name().to_string()
        )
        .record(started.elapsed().as_secs_f64());

        result
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
