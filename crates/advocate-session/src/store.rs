//! # Session Store
//!
//! Read-through cache of the session summaries the backend knows about.

use std::sync::Arc;

use advocate_client::LegalBackend;
use advocate_core::{AssistantError, AssistantResult, Operation, SessionSummary};
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use tracing::debug;

/// Cached session list.
///
/// Each refresh replaces the list wholesale, in whatever order the backend
/// returned it.
pub struct SessionStore {
    backend: Arc<dyn LegalBackend>,
    sessions: RwLock<Vec<SessionSummary>>,
    refreshed_at: RwLock<Option<DateTime<Utc>>>,
}

impl SessionStore {
    pub fn new(backend: Arc<dyn LegalBackend>) -> Self {
        Self {
            backend,
            sessions: RwLock::new(Vec::new()),
            refreshed_at: RwLock::new(None),
        }
    }

    /// Fetch all summaries and replace the cache
    pub async fn refresh(&self) -> AssistantResult<Vec<SessionSummary>> {
        let sessions = self
            .backend
            .list_sessions()
            .await
            .map_err(|e| AssistantError::request_failed(Operation::ListSessions, e.to_string()))?;

        debug!("Session list refreshed: {} sessions", sessions.len());
        *self.sessions.write() = sessions.clone();
        *self.refreshed_at.write() = Some(Utc::now());
        Ok(sessions)
    }

    pub fn sessions(&self) -> Vec<SessionSummary> {
        self.sessions.read().clone()
    }

    pub fn get(&self, session_id: &str) -> Option<SessionSummary> {
        self.sessions
            .read()
            .iter()
            .find(|s| s.session_id == session_id)
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.sessions.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.read().is_empty()
    }

    /// When the cache was last replaced; `None` before the first refresh
    pub fn refreshed_at(&self) -> Option<DateTime<Utc>> {
        *self.refreshed_at.read()
    }
}
