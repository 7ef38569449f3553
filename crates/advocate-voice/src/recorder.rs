//! # Voice Capture
//!
//! One recording at a time, driven through an explicit state machine:
//!
//! ```text
//! Idle -> Recording -> Stopped -> Uploading -> Idle
//!             |           |           |
//!             +---------> Error <-----+ -> Idle
//! ```
//!
//! The finished recording is uploaded as a single unit and the transcript is
//! cleaned of filler words before it is handed back.

use std::sync::Arc;

use advocate_client::{AudioUpload, LegalBackend};
use advocate_core::{AssistantError, AssistantResult};
use tracing::{debug, info, warn};

use crate::device::{AudioDevice, DeviceLease};
use crate::text::TextCleaner;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecorderState {
    Idle,
    Recording,
    Stopped,
    Uploading,
    Error,
}

impl RecorderState {
    /// Transition table. `Recording -> Idle` is a cancelled recording.
    pub fn can_transition_to(self, next: RecorderState) -> bool {
        use RecorderState::*;
        matches!(
            (self, next),
            (Idle, Recording)
                | (Idle, Error)
                | (Recording, Stopped)
                | (Recording, Idle)
                | (Recording, Error)
                | (Stopped, Uploading)
                | (Stopped, Error)
                | (Uploading, Idle)
                | (Uploading, Error)
                | (Error, Idle)
        )
    }
}

pub struct VoiceCapture {
    backend: Arc<dyn LegalBackend>,
    device: Arc<dyn AudioDevice>,
    cleaner: TextCleaner,
    state: RecorderState,
    lease: Option<DeviceLease>,
}

impl VoiceCapture {
    pub fn new(
        backend: Arc<dyn LegalBackend>,
        device: Arc<dyn AudioDevice>,
        cleaner: TextCleaner,
    ) -> Self {
        Self {
            backend,
            device,
            cleaner,
            state: RecorderState::Idle,
            lease: None,
        }
    }

    pub fn state(&self) -> RecorderState {
        self.state
    }

    pub fn is_recording(&self) -> bool {
        self.state == RecorderState::Recording
    }

    /// Open the device and start recording.
    ///
    /// Returns `false` without touching the device when a recording is
    /// already running.
    pub async fn start(&mut self) -> AssistantResult<bool> {
        if self.state != RecorderState::Idle {
            debug!("Start ignored: recorder is {:?}", self.state);
            return Ok(false);
        }

        match self.device.open().await {
            Ok(stream) => {
                self.lease = Some(DeviceLease::new(stream));
                self.transition(RecorderState::Recording);
                info!("Recording from {}", self.device.name());
                Ok(true)
            }
            Err(e) => Err(self.fail(e)),
        }
    }

    /// Stop recording, upload the audio and return the cleaned transcript.
    ///
    /// `Ok(None)` when nothing was recording or the transcript held nothing
    /// but filler words.
    pub async fn stop(&mut self) -> AssistantResult<Option<String>> {
        if self.state != RecorderState::Recording {
            debug!("Stop ignored: recorder is {:?}", self.state);
            return Ok(None);
        }
        let Some(lease) = self.lease.take() else {
            return Err(self.fail(AssistantError::DeviceUnavailable(
                "recording has no open device".to_string(),
            )));
        };

        self.transition(RecorderState::Stopped);
        let file_name = lease.file_name().to_string();
        let mime_type = lease.mime_type().to_string();
        let audio = match lease.finish().await {
            Ok(audio) if audio.is_empty() => {
                return Err(self.fail(AssistantError::TranscriptionFailed(
                    "no audio captured".to_string(),
                )))
            }
            Ok(audio) => audio,
            Err(e) => return Err(self.fail(e)),
        };

        self.transition(RecorderState::Uploading);
        let upload = AudioUpload::new(audio, file_name, mime_type);
        let transcript = match self.backend.transcribe(&upload).await {
            Ok(text) => text,
            Err(e) => {
                return Err(self.fail(AssistantError::TranscriptionFailed(e.to_string())));
            }
        };

        self.transition(RecorderState::Idle);
        let cleaned = self.cleaner.clean_transcript(&transcript);
        debug!("Transcript: {:?} -> {:?}", transcript, cleaned);
        if cleaned.is_empty() {
            info!("Transcript contained no question");
            return Ok(None);
        }
        Ok(Some(cleaned))
    }

    /// Start, then stop immediately. Suits devices that replay finished audio.
    pub async fn record(&mut self) -> AssistantResult<Option<String>> {
        if !self.start().await? {
            return Ok(None);
        }
        self.stop().await
    }

    /// Abandon the current recording without uploading it
    pub fn cancel(&mut self) {
        if self.state != RecorderState::Recording {
            return;
        }
        self.lease = None;
        self.transition(RecorderState::Idle);
        info!("Recording cancelled");
    }

    fn transition(&mut self, next: RecorderState) {
        debug_assert!(
            self.state.can_transition_to(next),
            "invalid recorder transition {:?} -> {:?}",
            self.state,
            next
        );
        debug!("Recorder {:?} -> {:?}", self.state, next);
        self.state = next;
    }

    /// Release the device, pass through `Error` and settle back in `Idle`
    fn fail(&mut self, err: AssistantError) -> AssistantError {
        self.lease = None;
        warn!("Voice capture failed: {}", err);
        self.transition(RecorderState::Error);
        self.transition(RecorderState::Idle);
        err
    }
}

#[cfg(test)]
mod tests {
    use super::RecorderState::*;

    #[test]
    fn test_transition_table() {
        assert!(Idle.can_transition_to(Recording));
        assert!(Recording.can_transition_to(Stopped));
        assert!(Stopped.can_transition_to(Uploading));
        assert!(Uploading.can_transition_to(Idle));
        assert!(Error.can_transition_to(Idle));

        assert!(!Idle.can_transition_to(Uploading));
        assert!(!Idle.can_transition_to(Stopped));
        assert!(!Stopped.can_transition_to(Recording));
        assert!(!Uploading.can_transition_to(Recording));
        assert!(!Error.can_transition_to(Recording));
    }
}
