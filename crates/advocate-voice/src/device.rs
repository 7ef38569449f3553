//! Audio input devices.
//!
//! A device hands out an [`AudioStream`] once opened. The stream is held in a
//! [`DeviceLease`] so its tracks are stopped however the recording ends.

use std::path::{Path, PathBuf};

use advocate_core::{AssistantError, AssistantResult};
use async_trait::async_trait;
use tracing::debug;

const FILE_CHUNK_SIZE: usize = 16 * 1024;

#[async_trait]
pub trait AudioDevice: Send + Sync {
    fn name(&self) -> &str;

    /// Acquire the input. Fails with `DeviceUnavailable` when there is no
    /// input or access is refused.
    async fn open(&self) -> AssistantResult<Box<dyn AudioStream>>;
}

/// An open capture stream.
///
/// After [`stop_tracks`](AudioStream::stop_tracks), `next_chunk` yields any
/// audio still buffered and then `None`.
#[async_trait]
pub trait AudioStream: Send {
    fn file_name(&self) -> &str;

    fn mime_type(&self) -> &str;

    async fn next_chunk(&mut self) -> AssistantResult<Option<Vec<u8>>>;

    /// Stop capturing. Called at most once per stream.
    fn stop_tracks(&mut self);
}

/// Owns an open stream; dropping the lease stops its tracks
pub struct DeviceLease {
    stream: Option<Box<dyn AudioStream>>,
    file_name: String,
    mime_type: String,
}

impl DeviceLease {
    pub fn new(stream: Box<dyn AudioStream>) -> Self {
        Self {
            file_name: stream.file_name().to_string(),
            mime_type: stream.mime_type().to_string(),
            stream: Some(stream),
        }
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn is_active(&self) -> bool {
        self.stream.is_some()
    }

    /// Stop the tracks and collect everything captured
    pub async fn finish(mut self) -> AssistantResult<Vec<u8>> {
        let Some(mut stream) = self.stream.take() else {
            return Ok(Vec::new());
        };
        stream.stop_tracks();

        let mut audio = Vec::new();
        while let Some(chunk) = stream.next_chunk().await? {
            audio.extend_from_slice(&chunk);
        }
        debug!("Recording finished: {} bytes", audio.len());
        Ok(audio)
    }

    pub fn release(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            stream.stop_tracks();
            debug!("Released audio device");
        }
    }
}

impl Drop for DeviceLease {
    fn drop(&mut self) {
        self.release();
    }
}

/// Plays back an existing audio file as if it were being recorded
#[derive(Debug, Clone)]
pub struct FileAudioDevice {
    path: PathBuf,
    name: String,
}

impl FileAudioDevice {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        Self {
            name: format!("file:{}", path.display()),
            path,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl AudioDevice for FileAudioDevice {
    fn name(&self) -> &str {
        &self.name
    }

    async fn open(&self) -> AssistantResult<Box<dyn AudioStream>> {
        let data = tokio::fs::read(&self.path).await.map_err(|e| {
            AssistantError::DeviceUnavailable(format!("{}: {}", self.path.display(), e))
        })?;

        let file_name = self
            .path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("recording.webm")
            .to_string();

        Ok(Box::new(FileStream {
            mime_type: guess_audio_mime(&self.path).to_string(),
            file_name,
            data,
            position: 0,
        }))
    }
}

struct FileStream {
    file_name: String,
    mime_type: String,
    data: Vec<u8>,
    position: usize,
}

#[async_trait]
impl AudioStream for FileStream {
    fn file_name(&self) -> &str {
        &self.file_name
    }

    fn mime_type(&self) -> &str {
        &self.mime_type
    }

    async fn next_chunk(&mut self) -> AssistantResult<Option<Vec<u8>>> {
        if self.position >= self.data.len() {
            return Ok(None);
        }
        let end = (self.position + FILE_CHUNK_SIZE).min(self.data.len());
        let chunk = self.data[self.position..end].to_vec();
        self.position = end;
        Ok(Some(chunk))
    }

    fn stop_tracks(&mut self) {}
}

/// MIME type from the file extension; unknown types are sent as webm
pub fn guess_audio_mime(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    match extension.as_str() {
        "webm" => "audio/webm",
        "wav" => "audio/wav",
        "mp3" => "audio/mpeg",
        "ogg" | "oga" | "opus" => "audio/ogg",
        "m4a" | "mp4" => "audio/mp4",
        "flac" => "audio/flac",
        _ => "audio/webm",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_guess_audio_mime() {
        assert_eq!(guess_audio_mime(Path::new("note.WAV")), "audio/wav");
        assert_eq!(guess_audio_mime(Path::new("note.mp3")), "audio/mpeg");
        assert_eq!(guess_audio_mime(Path::new("note")), "audio/webm");
    }

    #[tokio::test]
    async fn test_file_device_reads_whole_file() {
        let mut file = tempfile::Builder::new().suffix(".wav").tempfile().unwrap();
        let bytes: Vec<u8> = (0..40_000u32).map(|i| (i % 251) as u8).collect();
        file.write_all(&bytes).unwrap();

        let device = FileAudioDevice::new(file.path());
        let lease = DeviceLease::new(device.open().await.unwrap());
        assert_eq!(lease.mime_type(), "audio/wav");
        assert!(lease.file_name().ends_with(".wav"));

        assert_eq!(lease.finish().await.unwrap(), bytes);
    }

    #[tokio::test]
    async fn test_missing_file_is_unavailable() {
        let device = FileAudioDevice::new("/nonexistent/recording.webm");
        let err = device.open().await.err().unwrap();
        assert!(matches!(err, AssistantError::DeviceUnavailable(_)));
    }
}
