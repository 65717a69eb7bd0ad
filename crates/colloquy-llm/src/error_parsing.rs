//! Shared HTTP error classification for the generation backends.
//!
//! Both backends speak JSON APIs whose error bodies carry an
//! `error.message` field; the status code decides the transient/permanent
//! class before the failover state machine sees the error.

use crate::provider::ProviderError;

/// Parse a `Retry-After` header value given in integer seconds.
///
/// Returns the delay in milliseconds, or `None` if the value is not a
/// plain number of seconds.
#[must_use]
pub fn parse_retry_after(value: &str) -> Option<u64> {
    value.trim().parse::<u64>().ok().map(|secs| secs * 1000)
}

/// Extract a human-readable message from an API error body.
///
/// Falls back to a truncated copy of the raw body when it is not the
/// expected `{"error": {"message": ...}}` shape.
#[must_use]
pub fn error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            v.get("error")?
                .get("message")?
                .as_str()
                .map(ToString::to_string)
        })
        .unwrap_or_else(|| body.chars().take(200).collect())
}

/// Map an unsuccessful HTTP response into a [`ProviderError`].
///
/// - 401 / 403 → [`ProviderError::Auth`] (permanent)
/// - 429 → [`ProviderError::RateLimited`] (transient)
/// - 5xx → [`ProviderError::Api`] with `retryable = true`
/// - other 4xx → [`ProviderError::Api`] with `retryable = false`
#[must_use]
pub fn error_from_response(status: u16, retry_after_ms: Option<u64>, body: &str) -> ProviderError {
    let message = error_message(body);
    match status {
        401 | 403 => ProviderError::Auth { message },
        429 => ProviderError::RateLimited {
            retry_after_ms: retry_after_ms.unwrap_or(0),
            message,
        },
        s if s >= 500 => ProviderError::Api {
            status,
            message,
            retryable: true,
        },
        _ => ProviderError::Api {
            status,
            message,
            retryable: false,
        },
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn retry_after_seconds() {
        assert_eq!(parse_retry_after("30"), Some(30_000));
        assert_eq!(parse_retry_after(" 5 "), Some(5000));
        assert_eq!(parse_retry_after("not-a-number"), None);
        assert_eq!(parse_retry_after(""), None);
    }

    #[test]
    fn message_from_error_body() {
        let body = r#"{"error": {"message": "quota exceeded", "code": 429}}"#;
        assert_eq!(error_message(body), "quota exceeded");
    }

    #[test]
    fn message_falls_back_to_raw_body() {
        assert_eq!(error_message("plain text failure"), "plain text failure");
    }

    #[test]
    fn auth_statuses_are_permanent() {
        assert_matches!(
            error_from_response(401, None, "{}"),
            ProviderError::Auth { .. }
        );
        assert_matches!(
            error_from_response(403, None, "{}"),
            ProviderError::Auth { .. }
        );
    }

    #[test]
    fn rate_limit_carries_retry_after() {
        let err = error_from_response(429, Some(2000), "{}");
        assert_matches!(err, ProviderError::RateLimited { retry_after_ms: 2000, .. });
        assert!(err.is_transient());
    }

    #[test]
    fn server_errors_are_transient() {
        let err = error_from_response(503, None, "{}");
        assert_matches!(err, ProviderError::Api { retryable: true, .. });
    }

    #[test]
    fn client_errors_are_permanent() {
        let err = error_from_response(400, None, "{}");
        assert_matches!(err, ProviderError::Api { retryable: false, .. });
        assert!(!err.is_transient());
    }
}
