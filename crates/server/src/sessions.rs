//! In-memory registry of per-session trigger histories.
//!
//! Each session owns one `TriggerHistory` behind its own mutex, so trigger
//! requests from the same session run one after another while different
//! sessions proceed independently. Nothing is persisted. Sessions idle for
//! longer than the configured TTL are dropped on the next registry access,
//! unless a request still holds them.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use napex_core::TriggerHistory;
use tokio::sync::{Mutex, RwLock};
use tracing::debug;

use crate::metrics::SESSIONS_ACTIVE;

/// Request and response header carrying the session id.
pub const SESSION_HEADER: &str = "x-session-id";

const MAX_SESSION_ID_LEN: usize = 128;

/// History of one session, locked for the duration of a request.
pub type SessionHistory = Arc<Mutex<TriggerHistory>>;

struct SessionEntry {
    history: SessionHistory,
    last_used: Instant,
}

pub struct SessionRegistry {
    sessions: RwLock<HashMap<String, SessionEntry>>,
    ttl: Duration,
}

impl SessionRegistry {
    pub fn new(ttl: Duration) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    /// History for a session, created empty on first use.
    pub async fn get_or_create(&self, session_id: &str) -> SessionHistory {
        let mut sessions = self.sessions.write().await;
        let now = Instant::now();
        self.purge(&mut sessions, now);

        let entry = sessions.entry(session_id.to_string()).or_insert_with(|| {
            debug!("Created session {}", session_id);
            SessionEntry {
                history: Arc::new(Mutex::new(TriggerHistory::new())),
                last_used: now,
            }
        });
        entry.last_used = now;
        let history = Arc::clone(&entry.history);

        SESSIONS_ACTIVE.set(sessions.len() as i64);
        history
    }

    /// History for a session, if it exists and has not expired.
    pub async fn get(&self, session_id: &str) -> Option<SessionHistory> {
        let mut sessions = self.sessions.write().await;
        let now = Instant::now();
        self.purge(&mut sessions, now);
        SESSIONS_ACTIVE.set(sessions.len() as i64);

        sessions.get_mut(session_id).map(|entry| {
            entry.last_used = now;
            Arc::clone(&entry.history)
        })
    }

    /// Drop idle sessions now. Returns how many were removed.
    pub async fn purge_expired(&self) -> usize {
        let mut sessions = self.sessions.write().await;
        let removed = self.purge(&mut sessions, Instant::now());
        SESSIONS_ACTIVE.set(sessions.len() as i64);
        removed
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }

    /// Sessions referenced outside the registry are in use and kept.
    fn purge(&self, sessions: &mut HashMap<String, SessionEntry>, now: Instant) -> usize {
        let before = sessions.len();
        sessions.retain(|id, entry| {
            let keep = now.duration_since(entry.last_used) < self.ttl
                || Arc::strong_count(&entry.history) > 1;
            if !keep {
                debug!("Expired session {}", id);
            }
            keep
        });
        before - sessions.len()
    }
}

/// Fresh session id for callers that did not send one.
pub fn new_session_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Session ids are 1 to 128 characters of `[A-Za-z0-9_-]`.
pub fn is_valid_session_id(id: &str) -> bool {
    !id.is_empty()
        && id.len() <= MAX_SESSION_ID_LEN
        && id
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
}
