//! Core types for ipo-status

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::time::Duration;

use crate::error::{Error, ErrorCode};

/// Response envelope the backend wraps every payload in
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Envelope<T> {
    /// The payload
    pub data: T,
}

/// Credentials sent to `/login`
#[derive(Clone, Serialize)]
pub struct Credentials {
    /// Account email, passed through unvalidated
    pub email: String,
    /// Account password, passed through unvalidated
    pub password: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Profile returned by a successful login
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    /// Account email
    pub email: String,
    /// Backend user ID
    pub id: String,
    /// Display name
    pub name: String,
    /// Phone number
    pub phone_number: String,
    /// PAN numbers tracked for this user, as sent by the backend
    pub pan_numbers: Vec<String>,
}

impl UserProfile {
    /// PAN numbers with duplicates removed, first occurrence wins
    pub fn identifiers(&self) -> Vec<String> {
        let mut seen = HashSet::with_capacity(self.pan_numbers.len());
        self.pan_numbers
            .iter()
            .filter(|pan| seen.insert(pan.as_str()))
            .cloned()
            .collect()
    }
}

/// Body of a `/get-ipo-status` request
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct StatusQuery {
    /// Offering name
    pub ipo_name: String,
    /// PAN number being checked
    pub pan_number: String,
}

impl StatusQuery {
    /// Build a query for one identifier
    pub fn new(target: impl Into<String>, identifier: impl Into<String>) -> Self {
        Self {
            ipo_name: target.into(),
            pan_number: identifier.into(),
        }
    }
}

/// Allotment status for one PAN number
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusResult {
    /// Offering name
    pub ipo_name: String,
    /// Whether securities were allotted
    pub is_alloted: bool,
    /// Whether the PAN applied at all
    pub is_applied: bool,
    /// PAN number the result is for
    pub pan_number: String,
    /// Number of securities allotted, as sent by the backend
    pub securities_alloted: String,
}

/// Display outcome of a status lookup
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Classification {
    /// The PAN did not apply
    NotApplied,
    /// Applied, nothing allotted
    NotAlloted,
    /// Allotted; carries the quantity string verbatim
    Alloted(String),
}

impl From<&StatusResult> for Classification {
    fn from(result: &StatusResult) -> Self {
        if !result.is_applied {
            Classification::NotApplied
        } else if !result.is_alloted {
            Classification::NotAlloted
        } else {
            Classification::Alloted(result.securities_alloted.clone())
        }
    }
}

impl std::fmt::Display for Classification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Classification::NotApplied => f.write_str("Not Applied"),
            Classification::NotAlloted => f.write_str("Not Alloted"),
            Classification::Alloted(quantity) => write!(f, "Alloted {quantity}"),
        }
    }
}

/// Transient, auto-dismissing message for the user
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    /// Text shown to the user
    pub message: String,
    /// Machine-readable cause, if the notice came from an error
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    /// How long the notice stays up
    pub auto_close: Duration,
}

/// How long failure notices stay visible
pub const NOTICE_AUTO_CLOSE: Duration = Duration::from_millis(3000);

impl From<&Error> for Notice {
    fn from(error: &Error) -> Self {
        let message = match error {
            Error::PollInProgress => "Status check already running".to_string(),
            _ => "Try again".to_string(),
        };
        Self {
            message,
            code: Some(error.error_code().to_string()),
            auto_close: NOTICE_AUTO_CLOSE,
        }
    }
}

/// Events emitted by the authenticator and the poller
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// Login succeeded and the profile was handed off; move to the status view
    Authenticated {
        /// The new profile
        profile: UserProfile,
    },

    /// Something the user should see briefly
    Notice(Notice),

    /// A poll run reset its state and is about to issue requests
    RunStarted {
        /// Offering being checked
        target: String,
        /// Identifiers in request order
        identifiers: Vec<String>,
    },

    /// One identifier resolved
    Resolved {
        /// The identifier
        identifier: String,
        /// Its outcome
        classification: Classification,
    },

    /// The run stopped early; the remaining identifiers stay loading
    RunAborted {
        /// Identifiers left loading, starting with the one that failed
        pending: Vec<String>,
        /// Error message
        error: String,
    },

    /// Every identifier resolved
    RunFinished {
        /// Offering checked
        target: String,
        /// Number of identifiers resolved
        resolved: usize,
    },
}

/// Summary of a completed poll run
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollReport {
    /// Offering checked
    pub target: String,
    /// Number of identifiers resolved
    pub resolved: usize,
    /// When the run reset its state
    pub started_at: DateTime<Utc>,
    /// When the last delay elapsed
    pub finished_at: DateTime<Utc>,
}
