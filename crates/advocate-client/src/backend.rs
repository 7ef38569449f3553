use advocate_core::{ChatMessage, Location, Session, SessionSummary};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{ClientError, Result};

/// Body of `POST /legal-response`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LegalRequest {
    pub question: String,
    pub location: Location,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
}

/// Reply of `POST /legal-response`; `conversation_history` is authoritative
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LegalResponse {
    pub response: String,
    pub session_id: String,
    #[serde(default)]
    pub conversation_history: Vec<ChatMessage>,
}

/// Reply of `POST /location`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LocationReply {
    pub city: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

impl LocationReply {
    /// An `error` field, or no city and no state, is a failed lookup
    pub fn into_location(self) -> Result<Location> {
        if let Some(error) = self.error {
            return Err(ClientError::Location(error));
        }
        let city = self.city.unwrap_or_default();
        let state = self.state.unwrap_or_default();
        if city.trim().is_empty() && state.trim().is_empty() {
            return Err(ClientError::Location(
                "Unable to determine city/state".to_string(),
            ));
        }
        Ok(Location::new(city, state))
    }
}

/// A finished recording, uploaded as a single unit
#[derive(Debug, Clone, PartialEq)]
pub struct AudioUpload {
    pub bytes: Vec<u8>,
    pub file_name: String,
    pub mime_type: String,
}

impl AudioUpload {
    pub fn new(bytes: Vec<u8>, file_name: impl Into<String>, mime_type: impl Into<String>) -> Self {
        Self {
            bytes,
            file_name: file_name.into(),
            mime_type: mime_type.into(),
        }
    }

    /// Browser recorders produce webm/opus; that is the default
    pub fn webm(bytes: Vec<u8>) -> Self {
        Self::new(bytes, "recording.webm", "audio/webm")
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Everything the client needs from the backend
#[async_trait]
pub trait LegalBackend: Send + Sync {
    /// Reverse-geocode coordinates
    async fn resolve_location(&self, lat: f64, lon: f64) -> Result<Location>;

    /// Ask a question; creates a session when `session_id` is absent
    async fn legal_response(&self, request: &LegalRequest) -> Result<LegalResponse>;

    async fn transcribe(&self, audio: &AudioUpload) -> Result<String>;

    /// Synthesize speech, returning encoded audio
    async fn speak(&self, text: &str) -> Result<Vec<u8>>;

    async fn list_sessions(&self) -> Result<Vec<SessionSummary>>;

    /// Returns the new session id
    async fn create_session(&self) -> Result<String>;

    async fn get_session(&self, session_id: &str) -> Result<Session>;

    async fn delete_session(&self, session_id: &str) -> Result<()>;
}
