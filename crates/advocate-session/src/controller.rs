//! # Conversation Controller
//!
//! Coordinates one user action at a time against the backend:
//! - sends questions with an optimistic local update, rolled back on failure
//! - creates, loads and deletes sessions
//! - tracks the user's location and the one-time welcome message
//!
//! Observers subscribe to [`ConversationSnapshot`]s and [`Notice`]s; they never
//! mutate the conversation themselves.

use std::sync::Arc;

use advocate_client::{LegalBackend, LegalRequest};
use advocate_config::ConversationConfig;
use advocate_core::{
    AssistantError, AssistantResult, ChatMessage, Location, Notice, Operation, SessionSummary,
    US_STATES,
};
use parking_lot::Mutex;
use tokio::sync::{broadcast, watch};
use tracing::{debug, error, info, warn};

use crate::state::{ConversationSnapshot, ConversationState};
use crate::store::SessionStore;
use crate::sync;

const NOTICE_CAPACITY: usize = 32;

/// What happened to a request that did not fail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Completed,
    Ignored(IgnoredReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoredReason {
    /// Nothing left after trimming
    EmptyMessage,
    /// Another request is still in flight
    Busy,
}

pub struct ConversationController {
    backend: Arc<dyn LegalBackend>,
    state: Mutex<ConversationState>,
    store: SessionStore,
    welcome_template: String,
    snapshots: watch::Sender<ConversationSnapshot>,
    notices: broadcast::Sender<Notice>,
}

/// Clears the busy flag however the request ends
struct BusyGuard<'a> {
    controller: &'a ConversationController,
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.controller.state.lock().busy = false;
        self.controller.publish();
    }
}

impl ConversationController {
    pub fn new(backend: Arc<dyn LegalBackend>, config: &ConversationConfig) -> Self {
        let mut state = ConversationState::new();
        if let Some(default_state) = config.default_state.as_deref() {
            state.location = Location::from_state(default_state);
            state.offer_welcome(&config.welcome_message);
        }

        let (snapshots, _) = watch::channel(state.snapshot());
        let (notices, _) = broadcast::channel(NOTICE_CAPACITY);

        Self {
            store: SessionStore::new(Arc::clone(&backend)),
            backend,
            state: Mutex::new(state),
            welcome_template: config.welcome_message.clone(),
            snapshots,
            notices,
        }
    }

    pub fn snapshot(&self) -> ConversationSnapshot {
        self.state.lock().snapshot()
    }

    /// Receive a fresh snapshot after every state change
    pub fn subscribe(&self) -> watch::Receiver<ConversationSnapshot> {
        self.snapshots.subscribe()
    }

    /// Receive user-visible notices
    pub fn notices(&self) -> broadcast::Receiver<Notice> {
        self.notices.subscribe()
    }

    pub fn session_store(&self) -> &SessionStore {
        &self.store
    }

    pub fn sessions(&self) -> Vec<SessionSummary> {
        self.store.sessions()
    }

    pub fn is_busy(&self) -> bool {
        self.state.lock().busy
    }

    /// Send a question in the active session (or start one).
    pub async fn send(&self, text: &str) -> AssistantResult<Outcome> {
        let question = text.trim();
        if question.is_empty() {
            return Ok(Outcome::Ignored(IgnoredReason::EmptyMessage));
        }

        let (request, optimistic) = {
            let mut state = self.state.lock();
            if state.busy {
                debug!("Send ignored: request in flight");
                return Ok(Outcome::Ignored(IgnoredReason::Busy));
            }
            if !state.location.has_state() {
                drop(state);
                return Err(self.report(AssistantError::LocationRequired));
            }

            let optimistic = ChatMessage::user(question);
            state.messages.push(optimistic.clone());
            state.busy = true;

            let request = LegalRequest {
                question: question.to_string(),
                location: state.location.clone(),
                session_id: state.session_id.clone(),
            };
            (request, optimistic)
        };
        let busy = BusyGuard { controller: self };
        self.publish();

        match self.backend.legal_response(&request).await {
            Ok(reply) => {
                {
                    let mut state = self.state.lock();
                    let merged = sync::reconcile(
                        &state.messages,
                        reply.conversation_history,
                        state.welcome_pending,
                    );
                    state.messages = merged.messages;
                    state.welcome_pending = merged.welcome_kept;
                    state.welcome_armed = false;
                    if state.session_id.as_deref() != Some(reply.session_id.as_str()) {
                        info!("Conversation bound to session {}", reply.session_id);
                    }
                    state.session_id = Some(reply.session_id);
                }
                drop(busy);
                self.refresh_quietly().await;
                Ok(Outcome::Completed)
            }
            Err(e) => {
                {
                    let mut state = self.state.lock();
                    if !sync::rollback(&mut state.messages, &optimistic) {
                        warn!("Optimistic message already gone during rollback");
                    }
                }
                drop(busy);
                Err(self.report(AssistantError::request_failed(
                    Operation::SendMessage,
                    e.to_string(),
                )))
            }
        }
    }

    /// Start a new backend session and clear the local conversation.
    pub async fn create_session(&self) -> AssistantResult<Outcome> {
        let Some(busy) = self.begin() else {
            return Ok(Outcome::Ignored(IgnoredReason::Busy));
        };

        let session_id = match self.backend.create_session().await {
            Ok(id) => id,
            Err(e) => {
                drop(busy);
                return Err(self.report(AssistantError::request_failed(
                    Operation::CreateSession,
                    e.to_string(),
                )));
            }
        };

        {
            let mut state = self.state.lock();
            state.reset();
            state.session_id = Some(session_id.clone());
            state.offer_welcome(&self.welcome_template);
        }
        drop(busy);

        info!("Created session {}", session_id);
        self.notify(Notice::info("New Session", "Started a new conversation"));
        self.refresh_quietly().await;
        Ok(Outcome::Completed)
    }

    /// Replace the local conversation with a stored session.
    pub async fn load_session(&self, session_id: &str) -> AssistantResult<Outcome> {
        let Some(busy) = self.begin() else {
            return Ok(Outcome::Ignored(IgnoredReason::Busy));
        };

        let session = match self.backend.get_session(session_id).await {
            Ok(session) => session,
            Err(e) => {
                drop(busy);
                return Err(self.report(AssistantError::request_failed(
                    Operation::LoadSession,
                    e.to_string(),
                )));
            }
        };

        {
            let mut state = self.state.lock();
            state.session_id = Some(session.summary.session_id);
            state.messages = session.history;
            state.welcome_pending = false;
            state.welcome_armed = false;
        }
        drop(busy);

        info!("Loaded session {}", session_id);
        Ok(Outcome::Completed)
    }

    /// Delete a session; clears the local conversation if it was active.
    pub async fn delete_session(&self, session_id: &str) -> AssistantResult<Outcome> {
        let Some(busy) = self.begin() else {
            return Ok(Outcome::Ignored(IgnoredReason::Busy));
        };

        if let Err(e) = self.backend.delete_session(session_id).await {
            drop(busy);
            return Err(self.report(AssistantError::request_failed(
                Operation::DeleteSession,
                e.to_string(),
            )));
        }

        {
            let mut state = self.state.lock();
            if state.session_id.as_deref() == Some(session_id) {
                state.reset();
                state.session_id = None;
            }
        }
        drop(busy);

        info!("Deleted session {}", session_id);
        self.refresh_quietly().await;
        Ok(Outcome::Completed)
    }

    /// Re-fetch the session list, reporting failures to the user
    pub async fn refresh_sessions(&self) -> AssistantResult<Vec<SessionSummary>> {
        self.store.refresh().await.map_err(|e| self.report(e))
    }

    /// Change the user's location; may show the welcome message.
    pub fn set_location(&self, location: Location) {
        {
            let mut state = self.state.lock();
            state.location = location;
            state.offer_welcome(&self.welcome_template);
        }
        self.publish();
    }

    /// Pick a state by name. Known state names are matched case-insensitively.
    pub fn select_state(&self, name: &str) {
        let name = name.trim();
        let state = US_STATES
            .iter()
            .find(|s| s.eq_ignore_ascii_case(name))
            .map(|s| s.to_string())
            .unwrap_or_else(|| name.to_string());

        self.notify(Notice::info(
            "Location Updated",
            format!("Legal information will be based on {} law", state),
        ));
        self.set_location(Location::from_state(state));
    }

    /// Resolve coordinates through the backend and adopt the result.
    pub async fn detect_location(&self, lat: f64, lon: f64) -> AssistantResult<Location> {
        let location = self.backend.resolve_location(lat, lon).await.map_err(|e| {
            self.report(AssistantError::request_failed(
                Operation::DetectLocation,
                e.to_string(),
            ))
        })?;

        // The state gates sending; a lookup without one must not replace it
        if !location.has_state() {
            return Err(self.report(AssistantError::request_failed(
                Operation::DetectLocation,
                format!("No state found for {}", location.city),
            )));
        }

        info!("Detected location: {}", location);
        self.notify(Notice::info(
            "Location Detected",
            format!("Your location has been set to {}", location),
        ));
        self.set_location(location.clone());
        Ok(location)
    }

    /// Mark busy unless a request is already in flight
    fn begin(&self) -> Option<BusyGuard<'_>> {
        {
            let mut state = self.state.lock();
            if state.busy {
                debug!("Request ignored: another request in flight");
                return None;
            }
            state.busy = true;
        }
        self.publish();
        Some(BusyGuard { controller: self })
    }

    async fn refresh_quietly(&self) {
        if let Err(e) = self.store.refresh().await {
            warn!("Session list refresh failed: {}", e);
        }
    }

    fn publish(&self) {
        let snapshot = self.state.lock().snapshot();
        self.snapshots.send_replace(snapshot);
    }

    fn notify(&self, notice: Notice) {
        // No subscribers is fine
        let _ = self.notices.send(notice);
    }

    /// Log an error, surface its notice and hand it back to the caller
    fn report(&self, err: AssistantError) -> AssistantError {
        match &err {
            AssistantError::LocationRequired => warn!("{}", err),
            _ => error!("{}", err),
        }
        if let Some(notice) = err.notice() {
            self.notify(notice);
        }
        err
    }
}
