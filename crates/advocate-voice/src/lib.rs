//! Voice input and output for the legal rights assistant.
//!
//! - [`VoiceCapture`]: record, upload, clean the transcript
//! - [`SpeechOutput`]: read replies aloud with a local fallback
//! - [`TextCleaner`]: filler-word and markdown stripping

pub mod device;
pub mod recorder;
pub mod speech;
pub mod text;

pub use device::{guess_audio_mime, AudioDevice, AudioStream, DeviceLease, FileAudioDevice};
pub use recorder::{RecorderState, VoiceCapture};
pub use speech::{
    local_synthesizer, AudioSink, CommandSynthesizer, FileSink, LocalSynthesizer, NoLocalSpeech,
    SpeechOutput, Spoken,
};
pub use text::{TextCleaner, FILLER_PHRASES};
