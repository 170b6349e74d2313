//! Per-task session records.
//!
//! The coordinator opens one session per task and mirrors every state
//! transition and stage handoff into it. All mutation goes through
//! [`SessionManager`], which applies each update under a single write lock so
//! readers only ever see whole updates.

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;
use utoipa::ToSchema;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SessionEvent {
    pub timestamp: DateTime<Utc>,
    pub event: String,
    #[schema(value_type = Object)]
    pub data: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub session_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub state: HashMap<String, Value>,
    pub context: HashMap<String, Value>,
    pub history: Vec<SessionEvent>,
}

impl Session {
    pub fn new(session_id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            session_id: session_id.into(),
            created_at: now,
            updated_at: now,
            state: HashMap::new(),
            context: HashMap::new(),
            history: Vec::new(),
        }
    }

    /// Set a state key and record the change in history.
    pub fn update_state(&mut self, key: &str, value: Value) {
        self.state.insert(key.to_string(), value.clone());
        self.push_event("state_update", serde_json::json!({ "key": key, "value": value }));
    }

    pub fn get_state(&self, key: &str) -> Option<&Value> {
        self.state.get(key)
    }

    pub fn set_context(&mut self, key: &str, value: Value) {
        self.context.insert(key.to_string(), value);
        self.updated_at = Utc::now();
    }

    pub fn get_context(&self, key: &str) -> Option<&Value> {
        self.context.get(key)
    }

    pub fn add_to_history(&mut self, event: &str, data: Value) {
        self.push_event(event, data);
    }

    /// The most recent `limit` events, oldest first.
    pub fn recent_history(&self, limit: usize) -> &[SessionEvent] {
        let start = self.history.len().saturating_sub(limit);
        &self.history[start..]
    }

    pub fn session_info(&self) -> SessionInfo {
        SessionInfo {
            session_id: self.session_id.clone(),
            created_at: self.created_at,
            updated_at: self.updated_at,
            state_keys: sorted_keys(&self.state),
            context_keys: sorted_keys(&self.context),
            history_length: self.history.len(),
            duration_seconds: (self.updated_at - self.created_at).num_milliseconds() as f64
                / 1000.0,
        }
    }

    fn push_event(&mut self, event: &str, data: Value) {
        let now = Utc::now();
        self.history.push(SessionEvent {
            timestamp: now,
            event: event.to_string(),
            data,
        });
        self.updated_at = now;
    }

    fn age(&self) -> Duration {
        (Utc::now() - self.updated_at).to_std().unwrap_or_default()
    }
}

fn sorted_keys(map: &HashMap<String, Value>) -> Vec<String> {
    let mut keys: Vec<String> = map.keys().cloned().collect();
    keys.sort();
    keys
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SessionInfo {
    pub session_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub state_keys: Vec<String>,
    pub context_keys: Vec<String>,
    pub history_length: usize,
    pub duration_seconds: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct SessionStats {
    pub total_sessions: usize,
    pub active_sessions: Vec<SessionInfo>,
    pub oldest_session: Option<DateTime<Utc>>,
    pub newest_session: Option<DateTime<Utc>>,
}

#[derive(Default)]
pub struct SessionManager {
    sessions: RwLock<HashMap<String, Session>>,
}

impl SessionManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a session. An existing session with the same id is replaced.
    pub fn create_session(&self, session_id: &str) -> Session {
        let session = Session::new(session_id);
        self.sessions
            .write()
            .insert(session_id.to_string(), session.clone());
        tracing::debug!(session_id, "Created session");
        session
    }

    /// Snapshot of a session.
    pub fn get_session(&self, session_id: &str) -> Option<Session> {
        self.sessions.read().get(session_id).cloned()
    }

    /// Apply `f` to a session under the write lock. Returns `None` when the
    /// session does not exist.
    pub fn with_session<R>(&self, session_id: &str, f: impl FnOnce(&mut Session) -> R) -> Option<R> {
        self.sessions.write().get_mut(session_id).map(f)
    }

    pub fn update_state(&self, session_id: &str, key: &str, value: Value) -> bool {
        self.with_session(session_id, |s| s.update_state(key, value))
            .is_some()
    }

    pub fn add_to_history(&self, session_id: &str, event: &str, data: Value) -> bool {
        self.with_session(session_id, |s| s.add_to_history(event, data))
            .is_some()
    }

    pub fn end_session(&self, session_id: &str) -> bool {
        let removed = self.sessions.write().remove(session_id).is_some();
        if removed {
            tracing::debug!(session_id, "Ended session");
        }
        removed
    }

    /// Remove sessions that have not been updated within `max_age`.
    pub fn cleanup_old_sessions(&self, max_age: Duration) -> usize {
        let mut sessions = self.sessions.write();
        let before = sessions.len();
        sessions.retain(|_, session| session.age() <= max_age);
        let removed = before - sessions.len();
        if removed > 0 {
            tracing::info!(removed, "Cleaned up old sessions");
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.sessions.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.read().is_empty()
    }

    pub fn get_session_stats(&self) -> SessionStats {
        let sessions = self.sessions.read();
        let mut active: Vec<SessionInfo> = sessions.values().map(Session::session_info).collect();
        active.sort_by(|a, b| a.created_at.cmp(&b.created_at));

        SessionStats {
            total_sessions: sessions.len(),
            oldest_session: active.first().map(|s| s.created_at),
            newest_session: active.last().map(|s| s.created_at),
            active_sessions: active,
        }
    }
}
