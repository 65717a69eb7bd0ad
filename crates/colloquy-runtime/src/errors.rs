//! Runtime error types.
//!
//! None of these cross the orchestrator boundary: `handle()` converts every
//! internal failure into a degraded `ChatResult` with a machine-readable
//! reason. Construction-time variants are the fatal configuration class —
//! the pipeline refuses to initialize on them.

use thiserror::Error;

/// Errors raised inside the runtime crate.
#[derive(Debug, Error)]
pub enum RuntimeError {
    /// Settings failed validation at startup.
    #[error("invalid settings: {0}")]
    Settings(#[from] colloquy_settings::SettingsError),

    /// An intent rule pattern did not compile at startup.
    #[error("invalid pattern for intent '{intent}': {source}")]
    InvalidPattern {
        /// Intent whose rule failed.
        intent: String,
        /// Compile error.
        #[source]
        source: Box<regex::Error>,
    },

    /// The overall per-request deadline expired.
    #[error("pipeline deadline exceeded after {elapsed_ms}ms")]
    PipelineTimeout {
        /// Elapsed time when the deadline fired, in milliseconds.
        elapsed_ms: u64,
    },
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn settings_error_converts() {
        let err: RuntimeError =
            colloquy_settings::SettingsError::Invalid("no key".to_string()).into();
        assert!(err.to_string().contains("no key"));
    }

    #[test]
    fn invalid_pattern_names_the_intent() {
        let source = Box::new(regex::Regex::new("(unclosed").unwrap_err());
        let err = RuntimeError::InvalidPattern {
            intent: "greeting".to_string(),
            source,
        };
        assert!(err.to_string().contains("greeting"));
    }

    #[test]
    fn timeout_reports_elapsed() {
        let err = RuntimeError::PipelineTimeout { elapsed_ms: 30_000 };
        assert_eq!(
            err.to_string(),
            "pipeline deadline exceeded after 30000ms"
        );
    }
}
