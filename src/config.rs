//! Configuration types for ipo-status

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

/// Backend connection settings
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL of the backend (default: "http://localhost:9000")
    #[serde(default = "default_base_url")]
    pub base_url: Url,

    /// Per-request timeout (None = wait forever)
    ///
    /// A hung status request stalls the rest of the poll run when this is unset.
    #[serde(default)]
    pub request_timeout: Option<Duration>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            request_timeout: None,
        }
    }
}

/// Poll run settings
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PollConfig {
    /// Pause after each resolved identifier, including the last (default: 3s)
    #[serde(default = "default_poll_delay")]
    pub delay: Duration,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            delay: default_poll_delay(),
        }
    }
}

/// Session handoff settings
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Key the user profile is stored under (default: "userData")
    #[serde(default = "default_profile_key")]
    pub profile_key: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            profile_key: default_profile_key(),
        }
    }
}

/// Main configuration
///
/// Every field has a default, so `Config::default()` talks to a backend on
/// `localhost:9000` with the same pacing the hosted client uses.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    /// Backend connection settings
    #[serde(default)]
    pub api: ApiConfig,

    /// Poll run settings
    #[serde(default)]
    pub poll: PollConfig,

    /// Session handoff settings
    #[serde(default)]
    pub session: SessionConfig,

    /// Offerings a user can pick from
    #[serde(default = "default_offerings")]
    pub offerings: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api: ApiConfig::default(),
            poll: PollConfig::default(),
            session: SessionConfig::default(),
            offerings: default_offerings(),
        }
    }
}

impl Config {
    /// Check settings that serde cannot enforce on its own
    pub fn validate(&self) -> Result<()> {
        if self.api.base_url.cannot_be_a_base() {
            return Err(Error::Config {
                message: format!("'{}' cannot be used as a base URL", self.api.base_url),
                key: Some("base_url".to_string()),
            });
        }
        if self.session.profile_key.is_empty() {
            return Err(Error::Config {
                message: "profile key must not be empty".to_string(),
                key: Some("profile_key".to_string()),
            });
        }
        Ok(())
    }

    /// Whether `name` is one of the configured offerings
    pub fn is_known_offering(&self, name: &str) -> bool {
        self.offerings.iter().any(|o| o == name)
    }
}

#[allow(clippy::expect_used)]
fn default_base_url() -> Url {
    Url::parse("http://localhost:9000").expect("default base URL is valid")
}

fn default_poll_delay() -> Duration {
    Duration::from_millis(3000)
}

fn default_profile_key() -> String {
    "userData".to_string()
}

fn default_offerings() -> Vec<String> {
    [
        "CapitalNumbers Infotech Limited - SME IPO",
        "Rikhav Securities Limited - SME IPO",
        "CHAMUNDA ELECTRICAL LIMITED",
        "DR AGARWALS HEALTH CARE LIMITED",
        "MUTHOOT MERCANTILE LTD NCDS  TRANCHE IV ",
        "EDELWEISS FINANCIAL SERVICES LIMITED NCD JAN 2025",
        "LANDMARK IMMIGRATION CONSULTANTS LIMITED",
        "CHEMMANUR CREDITS AND INVESTMENTS LIMITED",
        "CAPITAL INFRA TRUST INVIT",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}
