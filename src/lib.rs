//! # ipo-status
//!
//! Client library that logs a user in and checks IPO allotment status for each
//! of their PAN numbers, one request at a time.
//!
//! ## Components
//!
//! - [`Authenticator`] submits credentials and hands the returned
//!   [`UserProfile`] to the status view through a [`SessionStore`].
//! - [`StatusPoller`] reads the PAN numbers back from the session and runs poll
//!   runs: strictly sequential status requests with a fixed pause between them,
//!   classifying each answer as "Not Applied", "Not Alloted" or
//!   "Alloted <quantity>".
//!
//! Both components report progress on a broadcast channel of [`Event`]s; a view
//! layer subscribes and shows [`Notice`]s and the [`PollState`] rows.
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use ipo_status::{Authenticator, Config, HttpClient, MemorySessionStore, StatusPoller};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::default();
//!     let api = Arc::new(HttpClient::new(&config.api)?);
//!     let store = MemorySessionStore::new();
//!
//!     let auth = Authenticator::new(api.clone(), Arc::new(store.clone()), &config.session);
//!     auth.authenticate("user@example.com", "secret").await?;
//!
//!     let poller = StatusPoller::mount(api, &store, config).await;
//!     poller.select_target("CAPITAL INFRA TRUST INVIT").await;
//!     poller.poll_selected().await?;
//!
//!     for row in poller.state().await.rows() {
//!         println!("{}: {:?}", row.identifier, row.status);
//!     }
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Login and profile handoff
pub mod auth;
/// HTTP client for the backend
pub mod client;
/// Configuration types
pub mod config;
/// Error types
pub mod error;
/// Sequential status poller
pub mod poller;
/// Session-scoped key-value handoff
pub mod session;
/// Core types and events
pub mod types;

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
pub(crate) mod test_helpers;

// Re-export commonly used types
pub use auth::{Authenticator, LoginForm};
pub use client::{HttpClient, StatusApi};
pub use config::{ApiConfig, Config, PollConfig, SessionConfig};
pub use error::{Error, ErrorCode, Result};
pub use poller::{PollState, Row, RowStatus, StatusPoller};
pub use session::{MemorySessionStore, SessionStore};
pub use types::{
    Classification, Event, Notice, PollReport, StatusQuery, StatusResult,
    UserProfile,
};
