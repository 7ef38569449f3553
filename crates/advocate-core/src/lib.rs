//! # Advocate Core
//!
//! Types shared by every Advocate crate: the conversation data model exchanged
//! with the legal-response backend, the error taxonomy surfaced to the user,
//! and the transient notices the front end displays.

pub mod error;
pub mod notice;
pub mod timestamp;
pub mod types;

pub use error::{AssistantError, AssistantResult, Operation};
pub use notice::{Notice, NoticeLevel};
pub use types::{ChatMessage, Location, Role, Session, SessionSummary, US_STATES};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
