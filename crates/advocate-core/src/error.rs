//! # Assistant Error Types
//!
//! The conditions surfaced to the user. None of them is fatal: every failure
//! becomes a transient notice and the client returns to an idle state.

use thiserror::Error;

use crate::notice::Notice;

/// User-initiated action that talks to the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    SendMessage,
    CreateSession,
    LoadSession,
    DeleteSession,
    ListSessions,
    DetectLocation,
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Operation::SendMessage => write!(f, "send message"),
            Operation::CreateSession => write!(f, "create session"),
            Operation::LoadSession => write!(f, "load session"),
            Operation::DeleteSession => write!(f, "delete session"),
            Operation::ListSessions => write!(f, "list sessions"),
            Operation::DetectLocation => write!(f, "detect location"),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AssistantError {
    /// No state selected; blocks sending until the user picks one
    #[error("a location with a state is required before sending messages")]
    LocationRequired,

    /// Network or backend failure
    #[error("{operation} failed: {message}")]
    RequestFailed { operation: Operation, message: String },

    /// Audio upload or processing failed
    #[error("transcription failed: {0}")]
    TranscriptionFailed(String),

    /// Microphone missing or permission denied
    #[error("audio device unavailable: {0}")]
    DeviceUnavailable(String),

    /// Remote speech synthesis failed; handled by local fallback
    #[error("speech synthesis failed: {0}")]
    SpeechSynthesisFailed(String),
}

impl AssistantError {
    pub fn request_failed(operation: Operation, message: impl Into<String>) -> Self {
        Self::RequestFailed {
            operation,
            message: message.into(),
        }
    }

    pub fn category(&self) -> &'static str {
        match self {
            Self::LocationRequired => "location_required",
            Self::RequestFailed { .. } => "request_failed",
            Self::TranscriptionFailed(_) => "transcription_failed",
            Self::DeviceUnavailable(_) => "device_unavailable",
            Self::SpeechSynthesisFailed(_) => "speech_synthesis_failed",
        }
    }

    /// The notice to show for this error.
    ///
    /// Speech synthesis failures fall back silently and yield `None`.
    pub fn notice(&self) -> Option<Notice> {
        let notice = match self {
            Self::LocationRequired => Notice::error(
                "Location Required",
                "Please select your state so answers match your local law",
            ),
            Self::RequestFailed { operation, .. } => match operation {
                Operation::SendMessage => {
                    Notice::error("Error", "Failed to get AI response. Please try again.")
                }
                Operation::DetectLocation => Notice::error(
                    "Location Detection Failed",
                    "Please select your location manually",
                ),
                other => Notice::error("Error", format!("Could not {}. Please try again.", other)),
            },
            Self::TranscriptionFailed(_) => Notice::error(
                "Recording Error",
                "Failed to transcribe audio. Please try again or use text input.",
            ),
            Self::DeviceUnavailable(_) => Notice::error(
                "Not Supported",
                "Voice input is not available on this device",
            ),
            Self::SpeechSynthesisFailed(_) => return None,
        };
        Some(notice)
    }
}

pub type AssistantResult<T> = Result<T, AssistantError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notice::NoticeLevel;

    #[test]
    fn test_speech_failure_is_silent() {
        let err = AssistantError::SpeechSynthesisFailed("503".to_string());
        assert!(err.notice().is_none());
    }

    #[test]
    fn test_send_failure_notice() {
        let err = AssistantError::request_failed(Operation::SendMessage, "connection refused");
        let notice = err.notice().unwrap();
        assert_eq!(notice.level, NoticeLevel::Error);
        assert_eq!(notice.title, "Error");
        assert_eq!(err.to_string(), "send message failed: connection refused");
    }

    #[test]
    fn test_other_operation_notice_mentions_action() {
        let err = AssistantError::request_failed(Operation::DeleteSession, "404");
        assert!(err.notice().unwrap().description.contains("delete session"));
        assert_eq!(err.category(), "request_failed");
    }
}
