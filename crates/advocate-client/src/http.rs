use std::time::Duration;

use advocate_config::BackendConfig;
use advocate_core::{Location, Session, SessionSummary};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response, Url};
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{policies::ExponentialBackoff, RetryTransientMiddleware};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::backend::{AudioUpload, LegalBackend, LegalRequest, LegalResponse, LocationReply};
use crate::error::{ClientError, Result};

#[derive(Debug, Serialize)]
struct LocationRequest {
    lat: f64,
    lon: f64,
}

#[derive(Debug, Serialize)]
struct SpeakRequest<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct TranscriptionResponse {
    transcription: String,
}

#[derive(Debug, Deserialize)]
struct NewSessionResponse {
    session_id: String,
}

/// reqwest-backed [`LegalBackend`].
///
/// GETs go through a retrying client; POST and DELETE are sent exactly once so
/// a question is never submitted twice.
#[derive(Clone)]
pub struct HttpBackend {
    base_url: String,
    client: Client,
    reads: ClientWithMiddleware,
}

impl std::fmt::Debug for HttpBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpBackend")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl HttpBackend {
    pub fn new(config: &BackendConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ClientError::Config(e.to_string()))?;

        let retry_policy = ExponentialBackoff::builder()
            .base(2)
            .build_with_max_retries(config.max_retries);
        let reads = ClientBuilder::new(client.clone())
            .with(RetryTransientMiddleware::new_with_policy(retry_policy))
            .build();

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            client,
            reads,
        })
    }

    /// Default settings against `base_url`
    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self> {
        let config = BackendConfig {
            base_url: base_url.into(),
            ..BackendConfig::default()
        };
        Self::new(&config)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// `/api/sessions/{id}` with the id percent-encoded as a single segment
    fn session_url(&self, session_id: &str) -> Result<Url> {
        if matches!(session_id.trim(), "" | "." | "..") {
            return Err(ClientError::Config(format!("invalid session id: {:?}", session_id)));
        }
        let mut url = Url::parse(&self.url("/api/sessions"))
            .map_err(|e| ClientError::Config(format!("invalid backend URL: {}", e)))?;
        url.path_segments_mut()
            .map_err(|_| ClientError::Config(format!("invalid backend URL: {}", self.base_url)))?
            .push(session_id);
        Ok(url)
    }

    /// Turn non-2xx responses into `ClientError::Api` carrying the body
    async fn check(response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let message = response.text().await.unwrap_or_default();
        Err(ClientError::Api {
            status: status.as_u16(),
            message,
        })
    }
}

#[async_trait]
impl LegalBackend for HttpBackend {
    async fn resolve_location(&self, lat: f64, lon: f64) -> Result<Location> {
        debug!("Resolving location for ({}, {})", lat, lon);
        let response = self
            .client
            .post(self.url("/location"))
            .json(&LocationRequest { lat, lon })
            .send()
            .await?;

        let reply: LocationReply = Self::check(response).await?.json().await?;
        reply.into_location()
    }

    async fn legal_response(&self, request: &LegalRequest) -> Result<LegalResponse> {
        debug!(
            "Requesting legal response (session: {:?}, state: {})",
            request.session_id, request.location.state
        );
        let response = self
            .client
            .post(self.url("/legal-response"))
            .json(request)
            .send()
            .await?;

        let reply: LegalResponse = Self::check(response).await?.json().await?;
        debug!(
            "Legal response for session {} with {} history entries",
            reply.session_id,
            reply.conversation_history.len()
        );
        Ok(reply)
    }

    async fn transcribe(&self, audio: &AudioUpload) -> Result<String> {
        debug!("Uploading {} bytes for transcription", audio.bytes.len());
        let part = Part::bytes(audio.bytes.clone())
            .file_name(audio.file_name.clone())
            .mime_str(&audio.mime_type)?;
        let form = Form::new().part("file", part);

        let response = self
            .client
            .post(self.url("/transcribe"))
            .multipart(form)
            .send()
            .await?;

        let reply: TranscriptionResponse = Self::check(response).await?.json().await?;
        Ok(reply.transcription)
    }

    async fn speak(&self, text: &str) -> Result<Vec<u8>> {
        let response = self
            .client
            .post(self.url("/speak"))
            .json(&SpeakRequest { text })
            .send()
            .await?;

        let audio = Self::check(response).await?.bytes().await?;
        debug!("Received {} bytes of synthesized audio", audio.len());
        Ok(audio.to_vec())
    }

    async fn list_sessions(&self) -> Result<Vec<SessionSummary>> {
        let response = self.reads.get(self.url("/api/sessions")).send().await?;
        let sessions: Vec<SessionSummary> = Self::check(response).await?.json().await?;
        Ok(sessions)
    }

    async fn create_session(&self) -> Result<String> {
        let response = self.client.post(self.url("/api/sessions/new")).send().await?;
        let reply: NewSessionResponse = Self::check(response).await?.json().await?;
        Ok(reply.session_id)
    }

    async fn get_session(&self, session_id: &str) -> Result<Session> {
        let url = self.session_url(session_id)?;
        let response = self.reads.get(url).send().await?;
        let session: Session = Self::check(response).await?.json().await?;
        Ok(session)
    }

    async fn delete_session(&self, session_id: &str) -> Result<()> {
        let url = self.session_url(session_id)?;
        let response = self.client.delete(url).send().await?;
        Self::check(response).await?;
        Ok(())
    }
}
