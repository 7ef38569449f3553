use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use advocate_client::{
    AudioUpload, ClientError, LegalBackend, LegalRequest, LegalResponse, Result,
};
use advocate_core::{AssistantError, AssistantResult, Location, Session, SessionSummary};
use advocate_voice::{
    local_synthesizer, AudioDevice, AudioSink, AudioStream, LocalSynthesizer, RecorderState,
    SpeechOutput, Spoken, TextCleaner, VoiceCapture,
};
use async_trait::async_trait;

/// Device whose streams report how often their tracks were stopped
#[derive(Default)]
struct MockDevice {
    chunks: Vec<Vec<u8>>,
    unavailable: bool,
    opened: AtomicUsize,
    released: Arc<AtomicUsize>,
}

impl MockDevice {
    fn with_audio(chunks: &[&[u8]]) -> Self {
        Self {
            chunks: chunks.iter().map(|c| c.to_vec()).collect(),
            ..Default::default()
        }
    }

    fn unavailable() -> Self {
        Self {
            unavailable: true,
            ..Default::default()
        }
    }

    fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    fn released(&self) -> usize {
        self.released.load(Ordering::SeqCst)
    }
}

struct MockStream {
    chunks: Vec<Vec<u8>>,
    released: Arc<AtomicUsize>,
}

#[async_trait]
impl AudioDevice for MockDevice {
    fn name(&self) -> &str {
        "mock-mic"
    }

    async fn open(&self) -> AssistantResult<Box<dyn AudioStream>> {
        if self.unavailable {
            return Err(AssistantError::DeviceUnavailable("permission denied".to_string()));
        }
        self.opened.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MockStream {
            chunks: self.chunks.iter().rev().cloned().collect(),
            released: Arc::clone(&self.released),
        }))
    }
}

#[async_trait]
impl AudioStream for MockStream {
    fn file_name(&self) -> &str {
        "recording.webm"
    }

    fn mime_type(&self) -> &str {
        "audio/webm"
    }

    async fn next_chunk(&mut self) -> AssistantResult<Option<Vec<u8>>> {
        Ok(self.chunks.pop())
    }

    fn stop_tracks(&mut self) {
        self.released.fetch_add(1, Ordering::SeqCst);
    }
}

/// Backend that only answers the voice endpoints
#[derive(Default)]
struct VoiceBackend {
    transcript: Option<String>,
    audio: Option<Vec<u8>>,
    uploads: Mutex<Vec<AudioUpload>>,
    spoken: Mutex<Vec<String>>,
}

impl VoiceBackend {
    fn transcribing(text: &str) -> Self {
        Self {
            transcript: Some(text.to_string()),
            ..Default::default()
        }
    }

    fn speaking(audio: &[u8]) -> Self {
        Self {
            audio: Some(audio.to_vec()),
            ..Default::default()
        }
    }

    fn unavailable() -> ClientError {
        ClientError::Api {
            status: 500,
            message: "Internal Server Error".to_string(),
        }
    }
}

#[async_trait]
impl LegalBackend for VoiceBackend {
    async fn resolve_location(&self, _lat: f64, _lon: f64) -> Result<Location> {
        Err(Self::unavailable())
    }

    async fn legal_response(&self, _request: &LegalRequest) -> Result<LegalResponse> {
        Err(Self::unavailable())
    }

    async fn transcribe(&self, audio: &AudioUpload) -> Result<String> {
        self.uploads.lock().unwrap().push(audio.clone());
        self.transcript.clone().ok_or_else(Self::unavailable)
    }

    async fn speak(&self, text: &str) -> Result<Vec<u8>> {
        self.spoken.lock().unwrap().push(text.to_string());
        self.audio.clone().ok_or_else(Self::unavailable)
    }

    async fn list_sessions(&self) -> Result<Vec<SessionSummary>> {
        Err(Self::unavailable())
    }

    async fn create_session(&self) -> Result<String> {
        Err(Self::unavailable())
    }

    async fn get_session(&self, _session_id: &str) -> Result<Session> {
        Err(Self::unavailable())
    }

    async fn delete_session(&self, _session_id: &str) -> Result<()> {
        Err(Self::unavailable())
    }
}

fn capture(backend: Arc<VoiceBackend>, device: Arc<MockDevice>) -> VoiceCapture {
    VoiceCapture::new(backend, device, TextCleaner::new().unwrap())
}

#[tokio::test]
async fn test_recording_uploads_once_and_cleans_transcript() {
    let backend = Arc::new(VoiceBackend::transcribing("Um, can I, uh, break my lease?"));
    let device = Arc::new(MockDevice::with_audio(&[b"abc", b"def"]));
    let mut recorder = capture(backend.clone(), device.clone());

    assert!(recorder.start().await.unwrap());
    assert_eq!(recorder.state(), RecorderState::Recording);

    let transcript = recorder.stop().await.unwrap();
    assert_eq!(transcript.as_deref(), Some("can I, break my lease?"));
    assert_eq!(recorder.state(), RecorderState::Idle);

    let uploads = backend.uploads.lock().unwrap();
    assert_eq!(uploads.len(), 1);
    assert_eq!(uploads[0].bytes, b"abcdef");
    assert_eq!(uploads[0].mime_type, "audio/webm");
    assert_eq!(device.released(), 1);
}

#[tokio::test]
async fn test_start_while_recording_is_noop() {
    let backend = Arc::new(VoiceBackend::transcribing("hello"));
    let device = Arc::new(MockDevice::with_audio(&[b"abc"]));
    let mut recorder = capture(backend, device.clone());

    assert!(recorder.start().await.unwrap());
    assert!(!recorder.start().await.unwrap());
    assert_eq!(device.opened(), 1);
    assert!(recorder.is_recording());
}

#[tokio::test]
async fn test_stop_without_recording_does_nothing() {
    let backend = Arc::new(VoiceBackend::transcribing("hello"));
    let device = Arc::new(MockDevice::with_audio(&[b"abc"]));
    let mut recorder = capture(backend.clone(), device);

    assert_eq!(recorder.stop().await.unwrap(), None);
    assert!(backend.uploads.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_unavailable_device() {
    let backend = Arc::new(VoiceBackend::transcribing("hello"));
    let mut recorder = capture(backend, Arc::new(MockDevice::unavailable()));

    let err = recorder.start().await.unwrap_err();
    assert!(matches!(err, AssistantError::DeviceUnavailable(_)));
    assert_eq!(err.notice().unwrap().title, "Not Supported");
    assert_eq!(recorder.state(), RecorderState::Idle);
}

#[tokio::test]
async fn test_transcription_failure_releases_device() {
    let backend = Arc::new(VoiceBackend::default());
    let device = Arc::new(MockDevice::with_audio(&[b"abc"]));
    let mut recorder = capture(backend, device.clone());

    recorder.start().await.unwrap();
    let err = recorder.stop().await.unwrap_err();
    assert!(matches!(err, AssistantError::TranscriptionFailed(_)));
    assert_eq!(err.notice().unwrap().title, "Recording Error");
    assert_eq!(recorder.state(), RecorderState::Idle);
    assert_eq!(device.released(), 1);

    assert!(recorder.start().await.unwrap());
}

#[tokio::test]
async fn test_empty_recording_is_not_uploaded() {
    let backend = Arc::new(VoiceBackend::transcribing("hello"));
    let device = Arc::new(MockDevice::with_audio(&[]));
    let mut recorder = capture(backend.clone(), device.clone());

    recorder.start().await.unwrap();
    let err = recorder.stop().await.unwrap_err();
    assert!(matches!(err, AssistantError::TranscriptionFailed(_)));
    assert!(backend.uploads.lock().unwrap().is_empty());
    assert_eq!(device.released(), 1);
}

#[tokio::test]
async fn test_filler_only_transcript_yields_nothing() {
    let backend = Arc::new(VoiceBackend::transcribing("Umm, uh hmm"));
    let device = Arc::new(MockDevice::with_audio(&[b"abc"]));
    let mut recorder = capture(backend.clone(), device);

    assert_eq!(recorder.record().await.unwrap(), None);
    assert_eq!(backend.uploads.lock().unwrap().len(), 1);
    assert_eq!(recorder.state(), RecorderState::Idle);
}

#[tokio::test]
async fn test_cancel_and_drop_release_device() {
    let backend = Arc::new(VoiceBackend::transcribing("hello"));
    let device = Arc::new(MockDevice::with_audio(&[b"abc"]));

    let mut recorder = capture(backend.clone(), device.clone());
    recorder.start().await.unwrap();
    recorder.cancel();
    assert_eq!(recorder.state(), RecorderState::Idle);
    assert_eq!(device.released(), 1);

    recorder.start().await.unwrap();
    drop(recorder);
    assert_eq!(device.released(), 2);
    assert!(backend.uploads.lock().unwrap().is_empty());
}

#[derive(Default)]
struct RecordingSink {
    played: Mutex<Vec<Vec<u8>>>,
    broken: bool,
}

#[async_trait]
impl AudioSink for RecordingSink {
    async fn play(&self, audio: Vec<u8>) -> AssistantResult<()> {
        if self.broken {
            return Err(AssistantError::SpeechSynthesisFailed("no output device".to_string()));
        }
        self.played.lock().unwrap().push(audio);
        Ok(())
    }
}

#[derive(Default)]
struct RecordingSynth {
    spoken: Mutex<Vec<String>>,
}

#[async_trait]
impl LocalSynthesizer for RecordingSynth {
    async fn speak(&self, text: &str) -> AssistantResult<()> {
        self.spoken.lock().unwrap().push(text.to_string());
        Ok(())
    }
}

fn speech(
    backend: Arc<VoiceBackend>,
    sink: Arc<RecordingSink>,
    synth: Arc<RecordingSynth>,
) -> SpeechOutput {
    SpeechOutput::new(backend, sink, synth, TextCleaner::new().unwrap())
}

const REPLY: &str = "**Short answer:** your landlord *must* return the deposit.";
const SPOKEN: &str = "Short answer: your landlord must return the deposit.";

#[tokio::test]
async fn test_remote_speech_plays_audio() {
    let backend = Arc::new(VoiceBackend::speaking(b"mp3"));
    let sink = Arc::new(RecordingSink::default());
    let synth = Arc::new(RecordingSynth::default());
    let output = speech(backend.clone(), sink.clone(), synth.clone());

    assert_eq!(output.speak(REPLY).await.unwrap(), Spoken::Remote);
    assert_eq!(backend.spoken.lock().unwrap().as_slice(), [SPOKEN]);
    assert_eq!(sink.played.lock().unwrap().as_slice(), [b"mp3".to_vec()]);
    assert!(synth.spoken.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_backend_failure_falls_back_to_local() {
    let backend = Arc::new(VoiceBackend::default());
    let sink = Arc::new(RecordingSink::default());
    let synth = Arc::new(RecordingSynth::default());
    let output = speech(backend, sink.clone(), synth.clone());

    assert_eq!(output.speak(REPLY).await.unwrap(), Spoken::Local);
    assert_eq!(synth.spoken.lock().unwrap().as_slice(), [SPOKEN]);
    assert!(sink.played.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_playback_failure_falls_back_to_local() {
    let backend = Arc::new(VoiceBackend::speaking(b"mp3"));
    let sink = Arc::new(RecordingSink {
        broken: true,
        ..Default::default()
    });
    let synth = Arc::new(RecordingSynth::default());
    let output = speech(backend, sink, synth.clone());

    assert_eq!(output.speak(REPLY).await.unwrap(), Spoken::Local);
    assert_eq!(synth.spoken.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_disabled_speech_is_skipped() {
    let backend = Arc::new(VoiceBackend::speaking(b"mp3"));
    let sink = Arc::new(RecordingSink::default());
    let synth = Arc::new(RecordingSynth::default());
    let output = speech(backend.clone(), sink, synth);

    assert!(!output.toggle());
    assert!(!output.is_enabled());
    assert_eq!(output.speak(REPLY).await.unwrap(), Spoken::Skipped);
    assert!(backend.spoken.lock().unwrap().is_empty());

    assert!(output.toggle());
    assert_eq!(output.speak("  ** ").await.unwrap(), Spoken::Skipped);
}

#[tokio::test]
async fn test_blank_local_command_only_matters_on_fallback() {
    let sink = Arc::new(RecordingSink::default());
    let output = SpeechOutput::new(
        Arc::new(VoiceBackend::speaking(b"mp3")),
        sink.clone(),
        local_synthesizer(""),
        TextCleaner::new().unwrap(),
    );
    assert_eq!(output.speak(REPLY).await.unwrap(), Spoken::Remote);
    assert_eq!(sink.played.lock().unwrap().len(), 1);

    let output = SpeechOutput::new(
        Arc::new(VoiceBackend::default()),
        sink,
        local_synthesizer(""),
        TextCleaner::new().unwrap(),
    );
    let err = output.speak(REPLY).await.unwrap_err();
    assert!(matches!(err, AssistantError::SpeechSynthesisFailed(_)));
}
