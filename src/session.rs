//! Session-scoped handoff between the authenticator and the poller
//!
//! The profile crosses from login to the status view through a plain
//! key-value store. [`MemorySessionStore`] lives exactly as long as the process
//! session; other backends only need to implement [`SessionStore`].

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::{Error, Result};
use crate::types::UserProfile;

/// One-shot string key-value contract
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Read a value
    async fn get(&self, key: &str) -> Option<String>;

    /// Write a value, replacing any previous one
    async fn set(&self, key: &str, value: String) -> Result<()>;

    /// Delete a value; deleting a missing key is not an error
    async fn remove(&self, key: &str) -> Result<()>;
}

/// In-memory session store (cloneable, clones share storage)
#[derive(Clone, Debug, Default)]
pub struct MemorySessionStore {
    entries: Arc<RwLock<HashMap<String, String>>>,
}

impl MemorySessionStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn get(&self, key: &str) -> Option<String> {
        self.entries.read().await.get(key).cloned()
    }

    async fn set(&self, key: &str, value: String) -> Result<()> {
        self.entries.write().await.insert(key.to_string(), value);
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        self.entries.write().await.remove(key);
        Ok(())
    }
}

/// Serialize `profile` under `key`
pub async fn save_profile(
    store: &dyn SessionStore,
    key: &str,
    profile: &UserProfile,
) -> Result<()> {
    let json = serde_json::to_string(profile)?;
    store.set(key, json).await
}

/// Read the profile stored under `key`
///
/// Absent and unparseable data both map to [`Error::MissingSessionData`].
pub async fn load_profile(store: &dyn SessionStore, key: &str) -> Result<UserProfile> {
    let Some(raw) = store.get(key).await else {
        tracing::error!(key, "no profile in session");
        return Err(Error::MissingSessionData(format!(
            "no value stored under '{key}'"
        )));
    };

    serde_json::from_str(&raw).map_err(|e| {
        tracing::error!(key, error = %e, "invalid profile data in session");
        Error::MissingSessionData(format!("invalid profile data under '{key}': {e}"))
    })
}
