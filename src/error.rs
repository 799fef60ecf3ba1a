//! Error types for ipo-status
//!
//! Every failure the client can run into is non-fatal: the component that hit
//! it stays usable and the user can retry by submitting again. Errors carry a
//! stable machine-readable code (see [`ErrorCode`]) so a view layer can decide
//! how to surface them without matching on message text.

use thiserror::Error;

/// Result type alias for ipo-status operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for ipo-status
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "base_url")
        key: Option<String>,
    },

    /// Network or DNS failure while talking to the backend
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The backend answered with something other than 202 Accepted
    #[error("{endpoint} returned HTTP {status}")]
    Protocol {
        /// Endpoint path that was called (e.g., "/login")
        endpoint: String,
        /// HTTP status code received
        status: u16,
    },

    /// The response body could not be decoded
    #[error("malformed response from {endpoint}: {message}")]
    Decode {
        /// Endpoint path that was called
        endpoint: String,
        /// Decoder error message
        message: String,
    },

    /// No usable profile in the session store
    #[error("missing session data: {0}")]
    MissingSessionData(String),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A poll run is already in flight on this poller
    #[error("a poll run is already in progress")]
    PollInProgress,

    /// The poll run was cancelled before it completed
    #[error("poll run cancelled")]
    Cancelled,
}

/// Machine-readable classification of errors
pub trait ErrorCode {
    /// Get the machine-readable error code
    fn error_code(&self) -> &str;

    /// Whether the error came from the backend or the path to it
    fn is_remote(&self) -> bool;
}

impl ErrorCode for Error {
    fn error_code(&self) -> &str {
        match self {
            Error::Config { .. } => "config_error",
            Error::Transport(_) => "transport_error",
            Error::Protocol { .. } => "protocol_error",
            Error::Decode { .. } => "decode_error",
            Error::MissingSessionData(_) => "missing_session_data",
            Error::Serialization(_) => "serialization_error",
            Error::PollInProgress => "poll_in_progress",
            Error::Cancelled => "cancelled",
        }
    }

    fn is_remote(&self) -> bool {
        matches!(
            self,
            Error::Transport(_) | Error::Protocol { .. } | Error::Decode { .. }
        )
    }
}
