//! Client side of the legal rights assistant HTTP API.
//!
//! [`LegalBackend`] is the seam the session controller and the voice pipeline
//! talk to; [`HttpBackend`] implements it over reqwest.

pub mod backend;
pub mod error;
pub mod http;

pub use backend::{AudioUpload, LegalBackend, LegalRequest, LegalResponse, LocationReply};
pub use error::{ClientError, Result};
pub use http::HttpBackend;
