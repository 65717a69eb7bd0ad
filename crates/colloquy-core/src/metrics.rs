//! Injectable metrics primitives.
//!
//! [`AgentMetrics`] and [`SystemMetrics`] are explicitly owned, shareable
//! objects — never hidden process singletons — so tests can inject a fresh
//! instance per run. Every field is an independent atomic counter; no lock
//! coarser than a single counter is ever taken, and snapshots are plain
//! reads safe under arbitrary concurrent updates.
//!
//! The string constants name the metrics emitted through the [`metrics`]
//! facade crate by the llm and runtime layers, kept in one place to avoid
//! typos across crates.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use serde::{Deserialize, Serialize};

// ─────────────────────────────────────────────────────────────────────────────
// Facade metric names
// ─────────────────────────────────────────────────────────────────────────────

/// Pipeline requests total (counter).
pub const PIPELINE_REQUESTS_TOTAL: &str = "pipeline_requests_total";
/// Degraded pipeline responses total (counter, labels: reason).
pub const PIPELINE_DEGRADED_TOTAL: &str = "pipeline_degraded_total";
/// End-to-end pipeline duration seconds (histogram).
pub const PIPELINE_REQUEST_DURATION_SECONDS: &str = "pipeline_request_duration_seconds";
/// Active sessions (gauge).
pub const SESSIONS_ACTIVE: &str = "sessions_active";
/// Agent requests total (counter, labels: agent).
pub const AGENT_REQUESTS_TOTAL: &str = "agent_requests_total";
/// Agent failures total (counter, labels: agent).
pub const AGENT_FAILURES_TOTAL: &str = "agent_failures_total";
/// Provider attempts total (counter, labels: provider).
pub const PROVIDER_REQUESTS_TOTAL: &str = "provider_requests_total";
/// Provider errors total (counter, labels: provider, category).
pub const PROVIDER_ERRORS_TOTAL: &str = "provider_errors_total";
/// Primary-retry attempts total (counter).
pub const PROVIDER_RETRIES_TOTAL: &str = "provider_retries_total";
/// Failovers to the secondary backend total (counter).
pub const PROVIDER_FAILOVERS_TOTAL: &str = "provider_failovers_total";
/// Provider attempt duration seconds (histogram, labels: provider).
pub const PROVIDER_REQUEST_DURATION_SECONDS: &str = "provider_request_duration_seconds";

// ─────────────────────────────────────────────────────────────────────────────
// Agent metrics
// ─────────────────────────────────────────────────────────────────────────────

/// Per-agent counters, one process-wide instance per agent.
///
/// The latency average covers successful requests only; failures bump the
/// failure counter without feeding the average.
#[derive(Debug, Default)]
pub struct AgentMetrics {
    requests: AtomicU64,
    failures: AtomicU64,
    latency_total_us: AtomicU64,
    latency_samples: AtomicU64,
}

impl AgentMetrics {
    /// Create a fresh, zeroed instance.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a successful request and its latency.
    pub fn record_success(&self, latency: Duration) {
        let _ = self.requests.fetch_add(1, Ordering::Relaxed);
        let _ = self
            .latency_total_us
            .fetch_add(latency.as_micros() as u64, Ordering::Relaxed);
        let _ = self.latency_samples.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a failed request.
    pub fn record_failure(&self) {
        let _ = self.requests.fetch_add(1, Ordering::Relaxed);
        let _ = self.failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Requests processed so far.
    #[must_use]
    pub fn requests(&self) -> u64 {
        self.requests.load(Ordering::Relaxed)
    }

    /// Failures recorded so far.
    #[must_use]
    pub fn failures(&self) -> u64 {
        self.failures.load(Ordering::Relaxed)
    }

    /// Read-only snapshot.
    #[must_use]
    pub fn snapshot(&self) -> AgentMetricsSnapshot {
        let samples = self.latency_samples.load(Ordering::Relaxed);
        let total_us = self.latency_total_us.load(Ordering::Relaxed);
        AgentMetricsSnapshot {
            requests: self.requests.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
            average_latency_ms: if samples == 0 {
                0.0
            } else {
                total_us as f64 / samples as f64 / 1000.0
            },
        }
    }
}

/// Point-in-time view of an agent's counters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentMetricsSnapshot {
    /// Requests processed.
    pub requests: u64,
    /// Failures recorded.
    pub failures: u64,
    /// Running average latency over successful requests, in milliseconds.
    pub average_latency_ms: f64,
}

// ─────────────────────────────────────────────────────────────────────────────
// System metrics
// ─────────────────────────────────────────────────────────────────────────────

/// Aggregate counters for the whole pipeline.
///
/// Initialized at startup, updated on every completed request, never reset.
/// The active-session count lives in the context store and is read at
/// snapshot time rather than duplicated here.
#[derive(Debug, Default)]
pub struct SystemMetrics {
    total_requests: AtomicU64,
    successful_requests: AtomicU64,
    response_total_us: AtomicU64,
}

impl SystemMetrics {
    /// Create a fresh, zeroed instance.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Count an inbound request before the pipeline runs.
    pub fn record_request(&self) {
        let _ = self.total_requests.fetch_add(1, Ordering::Relaxed);
    }

    /// Count a successful completion and its end-to-end time.
    pub fn record_success(&self, elapsed: Duration) {
        let _ = self.successful_requests.fetch_add(1, Ordering::Relaxed);
        let _ = self
            .response_total_us
            .fetch_add(elapsed.as_micros() as u64, Ordering::Relaxed);
    }

    /// Total requests seen.
    #[must_use]
    pub fn total_requests(&self) -> u64 {
        self.total_requests.load(Ordering::Relaxed)
    }

    /// Successful requests seen.
    #[must_use]
    pub fn successful_requests(&self) -> u64 {
        self.successful_requests.load(Ordering::Relaxed)
    }

    /// Read-only snapshot; `active_sessions` is supplied by the caller.
    #[must_use]
    pub fn snapshot(&self, active_sessions: usize) -> SystemMetricsSnapshot {
        let successes = self.successful_requests.load(Ordering::Relaxed);
        let total_us = self.response_total_us.load(Ordering::Relaxed);
        SystemMetricsSnapshot {
            total_requests: self.total_requests.load(Ordering::Relaxed),
            successful_requests: successes,
            active_sessions,
            average_response_time_ms: if successes == 0 {
                0.0
            } else {
                total_us as f64 / successes as f64 / 1000.0
            },
        }
    }
}

/// Point-in-time view of the system counters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemMetricsSnapshot {
    /// Requests received.
    pub total_requests: u64,
    /// Requests that completed normally.
    pub successful_requests: u64,
    /// Sessions currently held in the store.
    pub active_sessions: usize,
    /// Running average end-to-end time over successful requests, in ms.
    pub average_response_time_ms: f64,
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn agent_metrics_running_average() {
        let metrics = AgentMetrics::new();
        metrics.record_success(Duration::from_millis(10));
        metrics.record_success(Duration::from_millis(30));

        let snap = metrics.snapshot();
        assert_eq!(snap.requests, 2);
        assert_eq!(snap.failures, 0);
        assert!((snap.average_latency_ms - 20.0).abs() < 0.01);
    }

    #[test]
    fn agent_failures_do_not_feed_average() {
        let metrics = AgentMetrics::new();
        metrics.record_success(Duration::from_millis(10));
        metrics.record_failure();

        let snap = metrics.snapshot();
        assert_eq!(snap.requests, 2);
        assert_eq!(snap.failures, 1);
        assert!((snap.average_latency_ms - 10.0).abs() < 0.01);
    }

    #[test]
    fn empty_metrics_average_is_zero() {
        assert!(AgentMetrics::new().snapshot().average_latency_ms.abs() < f64::EPSILON);
        assert!(
            SystemMetrics::new()
                .snapshot(0)
                .average_response_time_ms
                .abs()
                < f64::EPSILON
        );
    }

    #[test]
    fn system_metrics_counts_and_average() {
        let metrics = SystemMetrics::new();
        metrics.record_request();
        metrics.record_request();
        metrics.record_success(Duration::from_millis(100));

        let snap = metrics.snapshot(7);
        assert_eq!(snap.total_requests, 2);
        assert_eq!(snap.successful_requests, 1);
        assert_eq!(snap.active_sessions, 7);
        assert!((snap.average_response_time_ms - 100.0).abs() < 0.01);
    }

    #[test]
    fn counters_survive_concurrent_updates() {
        let metrics = Arc::new(SystemMetrics::new());
        let mut handles = Vec::new();
        for _ in 0..8 {
            let m = Arc::clone(&metrics);
            handles.push(std::thread::spawn(move || {
                for _ in 0..1000 {
                    m.record_request();
                    m.record_success(Duration::from_micros(500));
                }
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(metrics.total_requests(), 8000);
        assert_eq!(metrics.successful_requests(), 8000);
    }

    #[test]
    fn snapshot_is_idempotent_without_updates() {
        let metrics = AgentMetrics::new();
        metrics.record_success(Duration::from_millis(5));
        assert_eq!(metrics.snapshot(), metrics.snapshot());
    }
}
