//! Session identity and lifecycle.
//!
//! A [`Session`] is the logical conversation between one user and the
//! system. Expiry is advisory and lazy: nothing sweeps idle sessions, the
//! store checks [`Session::is_expired`] on access.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A logical conversation, identified by an opaque key.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    /// Opaque unique identifier.
    pub id: String,
    /// Owning user identifier.
    pub user_id: String,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last time this session saw activity.
    pub last_activity: DateTime<Utc>,
}

impl Session {
    /// Create a session with the given identifiers.
    #[must_use]
    pub fn new(id: impl Into<String>, user_id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            user_id: user_id.into(),
            created_at: now,
            last_activity: now,
        }
    }

    /// Generate a fresh opaque session identifier.
    #[must_use]
    pub fn generate_id() -> String {
        uuid::Uuid::now_v7().to_string()
    }

    /// Generate a fresh opaque user identifier.
    #[must_use]
    pub fn generate_user_id() -> String {
        format!("user_{}", &uuid::Uuid::now_v7().simple().to_string()[..8])
    }

    /// Record activity now.
    pub fn touch(&mut self) {
        self.last_activity = Utc::now();
    }

    /// Whether the session has been idle longer than `idle_timeout`.
    #[must_use]
    pub fn is_expired(&self, idle_timeout: Duration) -> bool {
        let idle = Utc::now().signed_duration_since(self.last_activity);
        idle.to_std().is_ok_and(|d| d > idle_timeout)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
