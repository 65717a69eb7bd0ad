//! Settings loading with deep merge and environment variable overrides.
//!
//! Loading flow:
//! 1. Start with compiled [`ColloquySettings::default()`]
//! 2. If the settings file exists, deep-merge user values over defaults
//! 3. Apply `COLLOQUY_*` environment overrides (highest priority)
//!
//! Deep merge rules:
//! - Objects are merged recursively (source overrides target per-key)
//! - Arrays and primitives are replaced entirely by source
//! - Null values in source are skipped (preserving target)

use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::debug;

use crate::errors::Result;
use crate::types::ColloquySettings;

/// Resolve the path to the settings file (`~/.colloquy/settings.json`).
pub fn settings_path() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
    PathBuf::from(home).join(".colloquy").join("settings.json")
}

/// Load settings from the default path with env overrides applied.
pub fn load_settings() -> Result<ColloquySettings> {
    load_settings_from_path(&settings_path())
}

/// Load settings from a specific path with env overrides applied.
///
/// If the file does not exist, returns defaults (plus env overrides). If
/// the file contains invalid JSON, returns an error.
pub fn load_settings_from_path(path: &Path) -> Result<ColloquySettings> {
    let defaults = serde_json::to_value(ColloquySettings::default())?;

    let merged = if path.exists() {
        debug!(?path, "loading settings from file");
        let content = std::fs::read_to_string(path)?;
        let user: Value = serde_json::from_str(&content)?;
        deep_merge(defaults, user)
    } else {
        debug!(?path, "settings file not found, using defaults");
        defaults
    };

    let mut settings: ColloquySettings = serde_json::from_value(merged)?;
    apply_env_overrides(&mut settings);
    Ok(settings)
}

/// Recursive deep merge of two JSON values.
///
/// - Objects are merged recursively (source overrides target per-key)
/// - Arrays and primitives are replaced entirely by source
/// - Null values in source are skipped (preserving target)
pub fn deep_merge(target: Value, source: Value) -> Value {
    match (target, source) {
        (Value::Object(mut target_map), Value::Object(source_map)) => {
            for (key, source_val) in source_map {
                if source_val.is_null() {
                    continue;
                }
                let merged = if let Some(target_val) = target_map.remove(&key) {
                    deep_merge(target_val, source_val)
                } else {
                    source_val
                };
                let _ = target_map.insert(key, merged);
            }
            Value::Object(target_map)
        }
        (_, source) => source,
    }
}

/// Apply environment variable overrides to loaded settings.
///
/// Invalid values are ignored with a warning (fall back to file/default).
/// The API keys are the overrides every deployment needs; the rest exist
/// for operational tuning without a settings file.
pub fn apply_env_overrides(settings: &mut ColloquySettings) {
    if let Some(v) = read_env_string("COLLOQUY_PRIMARY_API_KEY") {
        settings.providers.primary.api_key = Some(v);
    }
    if let Some(v) = read_env_string("COLLOQUY_SECONDARY_API_KEY") {
        settings.providers.secondary.api_key = Some(v);
    }
    if let Some(v) = read_env_string("COLLOQUY_PRIMARY_MODEL") {
        settings.providers.primary.model = v;
    }
    if let Some(v) = read_env_string("COLLOQUY_SECONDARY_MODEL") {
        settings.providers.secondary.model = v;
    }
    if let Some(v) = read_env_u64("COLLOQUY_CALL_TIMEOUT_MS", 1, 600_000) {
        settings.providers.call_timeout_ms = v;
    }
    if let Some(v) = read_env_u64("COLLOQUY_REQUEST_TIMEOUT_MS", 1, 600_000) {
        settings.pipeline.request_timeout_ms = v;
    }
    if let Some(v) = read_env_usize("COLLOQUY_MAX_TURNS", 1, 10_000) {
        settings.pipeline.max_turns = v;
    }
    if let Some(v) = read_env_u64("COLLOQUY_SESSION_IDLE_SECS", 1, 2_592_000) {
        settings.pipeline.session_idle_secs = v;
    }
}

// ── Pure parsing functions (testable without env vars) ──────────────────────

/// Parse a string as a `u64` within a range.
pub fn parse_u64_range(val: &str, min: u64, max: u64) -> Option<u64> {
    let n: u64 = val.parse().ok()?;
    (n >= min && n <= max).then_some(n)
}

/// Parse a string as a `usize` within a range.
pub fn parse_usize_range(val: &str, min: usize, max: usize) -> Option<usize> {
    let n: usize = val.parse().ok()?;
    (n >= min && n <= max).then_some(n)
}

// ── Env var readers (thin wrappers) ─────────────────────────────────────────

fn read_env_string(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

fn read_env_u64(name: &str, min: u64, max: u64) -> Option<u64> {
    let val = std::env::var(name).ok()?;
    let result = parse_u64_range(&val, min, max);
    if result.is_none() {
        tracing::warn!(key = name, value = %val, "invalid u64 env var, ignoring");
    }
    result
}

fn read_env_usize(name: &str, min: usize, max: usize) -> Option<usize> {
    let val = std::env::var(name).ok()?;
    let result = parse_usize_range(&val, min, max);
    if result.is_none() {
        tracing::warn!(key = name, value = %val, "invalid usize env var, ignoring");
    }
    result
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::SettingsError;

    // ── deep_merge ──────────────────────────────────────────────────

    #[test]
    fn merge_simple_override() {
        let target = serde_json::json!({"a": 1, "b": 2});
        let source = serde_json::json!({"a": 10});
        let merged = deep_merge(target, source);
        assert_eq!(merged["a"], 10);
        assert_eq!(merged["b"], 2);
    }

    #[test]
    fn merge_nested_override() {
        let target = serde_json::json!({
            "pipeline": {"maxTurns": 50, "requestTimeoutMs": 30_000}
        });
        let source = serde_json::json!({
            "pipeline": {"maxTurns": 10}
        });
        let merged = deep_merge(target, source);
        assert_eq!(merged["pipeline"]["maxTurns"], 10);
        assert_eq!(merged["pipeline"]["requestTimeoutMs"], 30_000);
    }

    #[test]
    fn merge_array_replace_not_merge() {
        let target = serde_json::json!({"items": [1, 2, 3]});
        let source = serde_json::json!({"items": [4]});
        let merged = deep_merge(target, source);
        assert_eq!(merged["items"], serde_json::json!([4]));
    }

    #[test]
    fn merge_null_preserves_target() {
        let target = serde_json::json!({"a": 1});
        let source = serde_json::json!({"a": null});
        let merged = deep_merge(target, source);
        assert_eq!(merged["a"], 1);
    }

    #[test]
    fn merge_new_keys_added() {
        let target = serde_json::json!({"a": 1});
        let source = serde_json::json!({"b": 2});
        let merged = deep_merge(target, source);
        assert_eq!(merged["a"], 1);
        assert_eq!(merged["b"], 2);
    }

    // ── load_settings_from_path ─────────────────────────────────────

    #[test]
    fn load_missing_file_returns_defaults() {
        let settings = load_settings_from_path(Path::new("/nonexistent/settings.json")).unwrap();
        assert_eq!(settings.pipeline.max_turns, 50);
    }

    #[test]
    fn load_partial_json_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(
            &path,
            r#"{"pipeline": {"maxTurns": 12}, "providers": {"callTimeoutMs": 2000}}"#,
        )
        .unwrap();

        let settings = load_settings_from_path(&path).unwrap();
        assert_eq!(settings.pipeline.max_turns, 12);
        assert_eq!(settings.providers.call_timeout_ms, 2000);
        // Untouched values keep their defaults
        assert_eq!(settings.pipeline.request_timeout_ms, 30_000);
        assert_eq!(settings.matching.rules.len(), 6);
    }

    #[test]
    fn load_replaces_rule_table_wholesale() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(
            &path,
            r#"{"matching": {"rules": [{"intent": "order", "patterns": ["\\border\\b"]}]}}"#,
        )
        .unwrap();

        let settings = load_settings_from_path(&path).unwrap();
        assert_eq!(settings.matching.rules.len(), 1);
        assert_eq!(settings.matching.rules[0].intent, "order");
    }

    #[test]
    fn load_invalid_json_returns_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, "not valid json").unwrap();

        let result = load_settings_from_path(&path);
        assert!(matches!(result.unwrap_err(), SettingsError::Json(_)));
    }

    // ── parse helpers ───────────────────────────────────────────────

    #[test]
    fn parse_u64_valid_and_bounds() {
        assert_eq!(parse_u64_range("30000", 1, 600_000), Some(30_000));
        assert_eq!(parse_u64_range("0", 1, 600_000), None);
        assert_eq!(parse_u64_range("700000", 1, 600_000), None);
        assert_eq!(parse_u64_range("abc", 1, 600_000), None);
    }

    #[test]
    fn parse_usize_valid_and_bounds() {
        assert_eq!(parse_usize_range("50", 1, 10_000), Some(50));
        assert_eq!(parse_usize_range("0", 1, 10_000), None);
        assert_eq!(parse_usize_range("20000", 1, 10_000), None);
    }
}
