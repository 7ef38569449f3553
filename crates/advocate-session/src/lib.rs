//! # Advocate Session
//!
//! The conversation session controller: everything between a user action and
//! the legal-response backend.
//!
//! - [`sync`]: merges optimistic local state with server-confirmed history
//! - [`SessionStore`]: cached list of session summaries
//! - [`ConversationController`]: one request at a time, busy flag, rollback
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use advocate_client::HttpBackend;
//! use advocate_config::ConversationConfig;
//! use advocate_core::Location;
//! use advocate_session::ConversationController;
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let backend = Arc::new(HttpBackend::with_base_url("http://localhost:8000")?);
//! let controller = ConversationController::new(backend, &ConversationConfig::default());
//!
//! controller.set_location(Location::from_state("California"));
//! controller.send("What are my tenant rights?").await?;
//!
//! for message in controller.snapshot().messages {
//!     println!("{}: {}", message.role, message.content);
//! }
//! # Ok(())
//! # }
//! ```

pub mod controller;
pub mod state;
pub mod store;
pub mod sync;

pub use controller::{ConversationController, IgnoredReason, Outcome};
pub use state::ConversationSnapshot;
pub use store::SessionStore;
pub use sync::{reconcile, rollback, Reconciled};
