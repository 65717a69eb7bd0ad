//! In-memory context store.
//!
//! An arena keyed by session identifier with explicit creation-on-miss:
//! looking up an unknown session creates its entry (session + context)
//! rather than failing. Each entry is mutated under its own lock — one
//! writer at a time per session, unrelated sessions never contend.
//!
//! Expiry is lazy and advisory: an entry found idle past the configured
//! timeout is reset in place on next access, so `load` keeps its
//! never-fails contract. Nothing sweeps the map; an external collaborator
//! may do so through `remove`.

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use metrics::gauge;
use parking_lot::Mutex;
use tracing::debug;

use colloquy_core::context::{Sentiment, SessionContext};
use colloquy_core::metrics::SESSIONS_ACTIVE;
use colloquy_core::session::Session;
use colloquy_core::turn::Turn;

/// One session's state: identity plus conversation context.
///
/// The context exists from the moment the session exists — created
/// together, never absent.
#[derive(Clone, Debug)]
pub struct SessionEntry {
    /// Session identity and activity timestamps.
    pub session: Session,
    /// Conversation history and derived attributes.
    pub context: SessionContext,
}

impl SessionEntry {
    fn new(session_id: &str, user_id: &str) -> Self {
        Self {
            session: Session::new(session_id, user_id),
            context: SessionContext::default(),
        }
    }
}

/// Arena of per-session state.
pub struct ContextStore {
    entries: DashMap<String, Arc<Mutex<SessionEntry>>>,
    max_turns: usize,
    idle_timeout: Duration,
}

impl ContextStore {
    /// Create a store with the given history bound and idle timeout.
    #[must_use]
    pub fn new(max_turns: usize, idle_timeout: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            max_turns,
            idle_timeout,
        }
    }

    /// Fetch or create the entry for `session_id`.
    fn entry(&self, session_id: &str, user_id: &str) -> Arc<Mutex<SessionEntry>> {
        if let Some(existing) = self.entries.get(session_id) {
            return Arc::clone(&existing);
        }
        let created = Arc::clone(
            &self
                .entries
                .entry(session_id.to_string())
                .or_insert_with(|| {
                    debug!(session_id, user_id, "creating session entry");
                    Arc::new(Mutex::new(SessionEntry::new(session_id, user_id)))
                }),
        );
        gauge!(SESSIONS_ACTIVE).set(self.entries.len() as f64);
        created
    }

    /// Load the context for a session, creating it if absent.
    ///
    /// Refreshes the activity timestamp; an entry idle past the timeout is
    /// reset in place first (lazy expiry). Never fails.
    pub fn load(&self, session_id: &str, user_id: &str) -> SessionContext {
        let entry = self.entry(session_id, user_id);
        let mut guard = entry.lock();
        if guard.session.is_expired(self.idle_timeout) {
            debug!(session_id, "session expired, resetting in place");
            *guard = SessionEntry::new(session_id, user_id);
        }
        guard.session.touch();
        guard.context.clone()
    }

    /// Append a turn, evicting the oldest beyond the history bound.
    pub fn record_turn(&self, session_id: &str, turn: Turn) {
        let entry = self.entry(session_id, "unknown");
        let mut guard = entry.lock();
        guard.context.push_turn(turn, self.max_turns);
        guard.session.touch();
    }

    /// Overwrite the derived attributes. Last write wins, no merge.
    pub fn update_derived(
        &self,
        session_id: &str,
        sentiment: Sentiment,
        intent: &str,
        confidence: f32,
    ) {
        let entry = self.entry(session_id, "unknown");
        let mut guard = entry.lock();
        guard.context.set_derived(sentiment, intent, confidence);
        guard.session.touch();
    }

    /// Number of sessions currently held.
    #[must_use]
    pub fn session_count(&self) -> usize {
        self.entries.len()
    }

    /// Snapshot of a session's identity, if present.
    #[must_use]
    pub fn session_info(&self, session_id: &str) -> Option<Session> {
        self.entries
            .get(session_id)
            .map(|entry| entry.lock().session.clone())
    }

    /// Turns currently held for a session (0 if absent).
    #[must_use]
    pub fn turn_count(&self, session_id: &str) -> usize {
        self.entries
            .get(session_id)
            .map_or(0, |entry| entry.lock().context.turn_count())
    }

    /// Remove a session outright. For external sweepers; the core only
    /// expires lazily.
    pub fn remove(&self, session_id: &str) -> bool {
        let removed = self.entries.remove(session_id).is_some();
        if removed {
            gauge!(SESSIONS_ACTIVE).set(self.entries.len() as f64);
        }
        removed
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
