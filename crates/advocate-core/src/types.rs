//! # Advocate Types
//!
//! Conversation messages, locations and sessions as exchanged with the
//! legal-response backend.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::timestamp;

/// Message author
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
        }
    }
}

/// A single conversation turn
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
    #[serde(
        default,
        deserialize_with = "timestamp::optional",
        skip_serializing_if = "Option::is_none"
    )]
    pub timestamp: Option<DateTime<Utc>>,
}

impl ChatMessage {
    /// Create a user message stamped with the current time
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            timestamp: Some(Utc::now()),
        }
    }

    /// Create an assistant message stamped with the current time
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            timestamp: Some(Utc::now()),
        }
    }

    pub fn is_user(&self) -> bool {
        self.role == Role::User
    }
}

/// Where the user is; decides which jurisdiction's law the backend answers for.
///
/// Both fields may be empty. Messaging is only allowed once `state` is set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub state: String,
}

impl Location {
    pub fn new(city: impl Into<String>, state: impl Into<String>) -> Self {
        Self {
            city: city.into(),
            state: state.into(),
        }
    }

    /// Location picked from the state list, without a city
    pub fn from_state(state: impl Into<String>) -> Self {
        Self::new("", state)
    }

    /// Whether the location is complete enough to converse
    pub fn has_state(&self) -> bool {
        !self.state.trim().is_empty()
    }
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let city = self.city.trim();
        let state = self.state.trim();
        match (city.is_empty(), state.is_empty()) {
            (false, false) => write!(f, "{}, {}", city, state),
            (true, false) => write!(f, "{}", state),
            (false, true) => write!(f, "{}", city),
            (true, true) => write!(f, "Unknown"),
        }
    }
}

/// Session metadata as listed by `GET /api/sessions`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub session_id: String,
    #[serde(deserialize_with = "timestamp::required")]
    pub created_at: DateTime<Utc>,
    #[serde(deserialize_with = "timestamp::required")]
    pub last_activity: DateTime<Utc>,
    #[serde(default)]
    pub message_count: u32,
}

/// Full session (metadata plus history) as returned by `GET /api/sessions/{id}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    #[serde(flatten)]
    pub summary: SessionSummary,
    #[serde(default, alias = "conversation_history")]
    pub history: Vec<ChatMessage>,
}

impl Session {
    pub fn id(&self) -> &str {
        &self.summary.session_id
    }
}

/// States offered for manual location selection
pub const US_STATES: &[&str] = &[
    "California",
    "New York",
    "Texas",
    "Florida",
    "Illinois",
    "Pennsylvania",
    "Ohio",
    "Georgia",
    "North Carolina",
    "Michigan",
    "New Jersey",
    "Virginia",
    "Washington",
    "Arizona",
    "Massachusetts",
    "Tennessee",
    "Indiana",
    "Maryland",
    "Missouri",
    "Wisconsin",
    "Colorado",
    "Minnesota",
    "South Carolina",
    "Alabama",
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_location_display() {
        assert_eq!(Location::new("Oakland", "California").to_string(), "Oakland, California");
        assert_eq!(Location::from_state("Texas").to_string(), "Texas");
        assert_eq!(Location::default().to_string(), "Unknown");
    }

    #[test]
    fn test_location_requires_state() {
        assert!(!Location::default().has_state());
        assert!(!Location::new("Austin", "   ").has_state());
        assert!(Location::from_state("Texas").has_state());
    }

    #[test]
    fn test_message_without_timestamp() {
        let msg: ChatMessage =
            serde_json::from_str(r#"{"role":"assistant","content":"Hi"}"#).unwrap();
        assert_eq!(msg.role, Role::Assistant);
        assert!(msg.timestamp.is_none());

        let json = serde_json::to_value(&msg).unwrap();
        assert!(json.get("timestamp").is_none());
    }

    #[test]
    fn test_session_accepts_conversation_history_alias() {
        let raw = r#"{
            "session_id": "s1",
            "created_at": "2025-10-18T12:00:00.000001",
            "last_activity": "2025-10-18T12:05:00",
            "message_count": 2,
            "conversation_history": [
                {"role": "user", "content": "What are my tenant rights?", "timestamp": "2025-10-18T12:04:00"},
                {"role": "assistant", "content": "In California..."}
            ]
        }"#;
        let session: Session = serde_json::from_str(raw).unwrap();
        assert_eq!(session.id(), "s1");
        assert_eq!(session.summary.message_count, 2);
        assert_eq!(session.history.len(), 2);
        assert!(session.history[0].is_user());
        assert!(session.history[0].timestamp.is_some());
    }

    #[test]
    fn test_summary_rejects_bad_timestamp() {
        let raw = r#"{"session_id":"s1","created_at":"soon","last_activity":"2025-10-18T12:05:00"}"#;
        assert!(serde_json::from_str::<SessionSummary>(raw).is_err());
    }
}
