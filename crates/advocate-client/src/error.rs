use thiserror::Error;

/// Failure talking to the backend
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ClientError {
    #[error("network error: {0}")]
    Network(String),

    #[error("api error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("decode error: {0}")]
    Decode(String),

    /// The location service answered but could not resolve the coordinates
    #[error("location error: {0}")]
    Location(String),

    #[error("config error: {0}")]
    Config(String),
}

impl From<reqwest::Error> for ClientError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            ClientError::Decode(e.to_string())
        } else if e.is_builder() {
            ClientError::Config(e.to_string())
        } else {
            ClientError::Network(e.to_string())
        }
    }
}

impl From<reqwest_middleware::Error> for ClientError {
    fn from(e: reqwest_middleware::Error) -> Self {
        match e {
            reqwest_middleware::Error::Reqwest(e) => e.into(),
            reqwest_middleware::Error::Middleware(e) => ClientError::Network(e.to_string()),
        }
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(e: serde_json::Error) -> Self {
        ClientError::Decode(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ClientError>;
