//! Reading replies aloud.
//!
//! The backend synthesizes audio for the cleaned reply text. When that fails
//! for any reason the same text goes to a [`LocalSynthesizer`] instead.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use advocate_client::LegalBackend;
use advocate_core::{AssistantError, AssistantResult};
use async_trait::async_trait;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::text::TextCleaner;

const LOCAL_SPEECH_TIMEOUT_SECS: u64 = 120;

/// Destination for synthesized audio
#[async_trait]
pub trait AudioSink: Send + Sync {
    async fn play(&self, audio: Vec<u8>) -> AssistantResult<()>;
}

/// On-device speech, used when the backend cannot synthesize
#[async_trait]
pub trait LocalSynthesizer: Send + Sync {
    async fn speak(&self, text: &str) -> AssistantResult<()>;
}

/// How a reply ended up being spoken
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Spoken {
    Remote,
    Local,
    Skipped,
}

pub struct SpeechOutput {
    backend: Arc<dyn LegalBackend>,
    sink: Arc<dyn AudioSink>,
    fallback: Arc<dyn LocalSynthesizer>,
    cleaner: TextCleaner,
    enabled: AtomicBool,
}

impl SpeechOutput {
    pub fn new(
        backend: Arc<dyn LegalBackend>,
        sink: Arc<dyn AudioSink>,
        fallback: Arc<dyn LocalSynthesizer>,
        cleaner: TextCleaner,
    ) -> Self {
        Self {
            backend,
            sink,
            fallback,
            cleaner,
            enabled: AtomicBool::new(true),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::SeqCst);
    }

    /// Flip speech on or off, returning the new setting
    pub fn toggle(&self) -> bool {
        !self.enabled.fetch_xor(true, Ordering::SeqCst)
    }

    pub async fn speak(&self, text: &str) -> AssistantResult<Spoken> {
        if !self.is_enabled() {
            return Ok(Spoken::Skipped);
        }
        let cleaned = self.cleaner.clean_for_speech(text);
        if cleaned.is_empty() {
            return Ok(Spoken::Skipped);
        }

        match self.speak_remote(&cleaned).await {
            Ok(()) => Ok(Spoken::Remote),
            Err(e) => {
                warn!("{}; falling back to local speech", e);
                self.fallback.speak(&cleaned).await?;
                Ok(Spoken::Local)
            }
        }
    }

    async fn speak_remote(&self, text: &str) -> AssistantResult<()> {
        let audio = self
            .backend
            .speak(text)
            .await
            .map_err(|e| AssistantError::SpeechSynthesisFailed(e.to_string()))?;
        if audio.is_empty() {
            return Err(AssistantError::SpeechSynthesisFailed(
                "backend returned no audio".to_string(),
            ));
        }

        debug!("Synthesized {} bytes of audio", audio.len());
        self.sink
            .play(audio)
            .await
            .map_err(|e| AssistantError::SpeechSynthesisFailed(e.to_string()))
    }
}

/// Writes synthesized audio to a file
#[derive(Debug, Clone)]
pub struct FileSink {
    path: PathBuf,
}

impl FileSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl AudioSink for FileSink {
    async fn play(&self, audio: Vec<u8>) -> AssistantResult<()> {
        tokio::fs::write(&self.path, &audio).await.map_err(|e| {
            AssistantError::SpeechSynthesisFailed(format!("{}: {}", self.path.display(), e))
        })?;
        info!("Saved speech audio to {}", self.path.display());
        Ok(())
    }
}

/// Runs an external text-to-speech program with the text as its last argument
#[derive(Debug, Clone)]
pub struct CommandSynthesizer {
    program: String,
    args: Vec<String>,
    timeout_secs: u64,
}

impl CommandSynthesizer {
    /// `command` is split on whitespace, e.g. `"espeak -s 150"`
    pub fn new(command: &str) -> AssistantResult<Self> {
        let mut parts = command.split_whitespace().map(str::to_string);
        let program = parts.next().ok_or_else(|| {
            AssistantError::SpeechSynthesisFailed("no local speech command configured".to_string())
        })?;
        Ok(Self {
            program,
            args: parts.collect(),
            timeout_secs: LOCAL_SPEECH_TIMEOUT_SECS,
        })
    }

    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }
}

/// Stand-in when no local speech command is configured; always fails
#[derive(Debug, Clone, Copy, Default)]
pub struct NoLocalSpeech;

#[async_trait]
impl LocalSynthesizer for NoLocalSpeech {
    async fn speak(&self, _text: &str) -> AssistantResult<()> {
        Err(AssistantError::SpeechSynthesisFailed(
            "no local speech command configured".to_string(),
        ))
    }
}

/// The configured speech command, or [`NoLocalSpeech`] when it is blank
pub fn local_synthesizer(command: &str) -> Arc<dyn LocalSynthesizer> {
    match CommandSynthesizer::new(command) {
        Ok(synth) => Arc::new(synth),
        Err(_) => {
            debug!("No local speech command configured");
            Arc::new(NoLocalSpeech)
        }
    }
}

#[async_trait]
impl LocalSynthesizer for CommandSynthesizer {
    async fn speak(&self, text: &str) -> AssistantResult<()> {
        let mut command = Command::new(&self.program);
        command.args(&self.args).arg(text).kill_on_drop(true);

        let output = timeout(Duration::from_secs(self.timeout_secs), command.output())
            .await
            .map_err(|_| {
                AssistantError::SpeechSynthesisFailed(format!(
                    "{} timed out after {} seconds",
                    self.program, self.timeout_secs
                ))
            })?
            .map_err(|e| {
                AssistantError::SpeechSynthesisFailed(format!("{}: {}", self.program, e))
            })?;

        if !output.status.success() {
            return Err(AssistantError::SpeechSynthesisFailed(format!(
                "{} exited with {}: {}",
                self.program,
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        Ok(())
    }
}
