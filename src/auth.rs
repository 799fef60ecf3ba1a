//! Login and profile handoff

use std::sync::Arc;

use tokio::sync::broadcast;

use crate::client::StatusApi;
use crate::config::SessionConfig;
use crate::error::Result;
use crate::session::{self, SessionStore};
use crate::types::{Credentials, Event, Notice, UserProfile};

/// Submits credentials and hands the resulting profile to the status view
#[derive(Clone)]
pub struct Authenticator {
    api: Arc<dyn StatusApi>,
    store: Arc<dyn SessionStore>,
    profile_key: String,
    event_tx: broadcast::Sender<Event>,
}

impl Authenticator {
    /// Create an authenticator writing the profile under `config.profile_key`
    pub fn new(
        api: Arc<dyn StatusApi>,
        store: Arc<dyn SessionStore>,
        config: &SessionConfig,
    ) -> Self {
        let (event_tx, _rx) = broadcast::channel(64);
        Self {
            api,
            store,
            profile_key: config.profile_key.clone(),
            event_tx,
        }
    }

    /// Subscribe to authentication events
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.event_tx.subscribe()
    }

    /// Log in and persist the profile for the poller
    ///
    /// Email and password go to the backend as typed; the server is the only
    /// validator. On any failure a "Try again" notice is emitted and nothing is
    /// written to the session.
    pub async fn authenticate(&self, email: &str, password: &str) -> Result<UserProfile> {
        let credentials = Credentials {
            email: email.to_string(),
            password: password.to_string(),
        };

        match self.login_and_store(&credentials).await {
            Ok(profile) => {
                tracing::info!(user_id = %profile.id, pans = profile.pan_numbers.len(), "login succeeded");
                self.event_tx
                    .send(Event::Authenticated {
                        profile: profile.clone(),
                    })
                    .ok();
                Ok(profile)
            }
            Err(e) => {
                tracing::error!(error = %e, "login failed");
                self.event_tx.send(Event::Notice(Notice::from(&e))).ok();
                Err(e)
            }
        }
    }

    async fn login_and_store(&self, credentials: &Credentials) -> Result<UserProfile> {
        let profile = self.api.login(credentials).await?;
        session::save_profile(self.store.as_ref(), &self.profile_key, &profile).await?;
        Ok(profile)
    }

    /// End the session by dropping the stored profile
    pub async fn logout(&self) -> Result<()> {
        tracing::info!("logging out");
        self.store.remove(&self.profile_key).await
    }
}

/// Login form state
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LoginForm {
    /// Email field
    pub email: String,
    /// Password field
    pub password: String,
}

impl LoginForm {
    /// Create a form with both fields filled in
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }

    /// Submit the form; the password field is cleared on failure, the email is kept
    pub async fn submit(&mut self, authenticator: &Authenticator) -> Result<UserProfile> {
        let result = authenticator
            .authenticate(&self.email, &self.password)
            .await;
        if result.is_err() {
            self.password.clear();
        }
        result
    }
}
