//! Identity held for the lifetime of the process.
//!
//! The session is an explicit object shared by reference with every
//! component that needs auth. Only the login exchange in
//! [`crate::api::ApiClient`] writes a token into it.

use std::path::PathBuf;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, MutexGuard, RwLock};
use tracing::{debug, warn};

use crate::constants::{DEFAULT_JOIN_COUNT, DEFAULT_PRIZE_MULTIPLIER};
use crate::error::{Error, Result};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    #[serde(default)]
    pub token: String,
    #[serde(default)]
    pub user_id: String,
    #[serde(default = "default_join_count")]
    pub join_count: u32,
    #[serde(default = "default_prize_multiplier")]
    pub prize_multiplier: f64,
}

impl Default for Identity {
    fn default() -> Self {
        Self {
            token: String::new(),
            user_id: String::new(),
            join_count: DEFAULT_JOIN_COUNT,
            prize_multiplier: DEFAULT_PRIZE_MULTIPLIER,
        }
    }
}

fn default_join_count() -> u32 {
    DEFAULT_JOIN_COUNT
}

fn default_prize_multiplier() -> f64 {
    DEFAULT_PRIZE_MULTIPLIER
}

/// Produces the one-time code the backend exchanges for a token.
#[async_trait]
pub trait Authenticator: Send + Sync {
    async fn login_code(&self) -> Result<String>;
}

/// Hands out a fixed code, for hosts that obtain it out of band.
pub struct StaticCode(pub Option<String>);

#[async_trait]
impl Authenticator for StaticCode {
    async fn login_code(&self) -> Result<String> {
        self.0
            .clone()
            .filter(|code| !code.trim().is_empty())
            .ok_or_else(|| Error::LoginCode("no login code configured".to_string()))
    }
}

/// Persists the identity as JSON so a restart can reuse the token.
#[derive(Clone, Debug)]
pub struct CredentialStore {
    path: PathBuf,
}

impl CredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn load(&self) -> Result<Option<Identity>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let text = std::fs::read_to_string(&self.path)?;
        if text.trim().is_empty() {
            return Ok(None);
        }
        Ok(Some(serde_json::from_str(&text)?))
    }

    pub async fn save(&self, identity: &Identity) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        tokio::fs::write(&self.path, serde_json::to_vec_pretty(identity)?).await?;
        Ok(())
    }

    pub async fn clear(&self) -> Result<()> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

pub struct Session {
    identity: RwLock<Identity>,
    login_gate: Mutex<()>,
    store: Option<CredentialStore>,
}

impl Session {
    /// Restores persisted credentials when a store is given. A corrupt
    /// credential file is ignored; the next privileged call logs in again.
    pub fn new(store: Option<CredentialStore>) -> Self {
        let identity = store
            .as_ref()
            .and_then(|store| match store.load() {
                Ok(identity) => identity,
                Err(err) => {
                    warn!(?err, "ignoring unreadable credentials");
                    None
                }
            })
            .unwrap_or_default();
        Self::with_identity(identity, store)
    }

    pub fn with_identity(identity: Identity, store: Option<CredentialStore>) -> Self {
        Self {
            identity: RwLock::new(identity),
            login_gate: Mutex::new(()),
            store,
        }
    }

    pub async fn token(&self) -> Option<String> {
        let identity = self.identity.read().await;
        if identity.token.is_empty() {
            None
        } else {
            Some(identity.token.clone())
        }
    }

    pub async fn identity(&self) -> Identity {
        self.identity.read().await.clone()
    }

    /// Serialises login exchanges; held for the whole exchange.
    pub(crate) async fn login_gate(&self) -> MutexGuard<'_, ()> {
        self.login_gate.lock().await
    }

    pub async fn store_identity(&self, identity: Identity) {
        if let Some(store) = &self.store {
            if let Err(err) = store.save(&identity).await {
                warn!(?err, "failed to persist credentials");
            }
        }
        *self.identity.write().await = identity;
    }

    /// Applies counters reported by the profile endpoints. Zero or missing
    /// values keep what the session already holds.
    pub async fn update_counts(&self, join_count: Option<u32>, prize_multiplier: Option<f64>) {
        let snapshot = {
            let mut identity = self.identity.write().await;
            if let Some(count) = join_count {
                identity.join_count = count;
            }
            if let Some(multiplier) = prize_multiplier.filter(|value| value.is_finite()) {
                if multiplier > 0.0 {
                    identity.prize_multiplier = multiplier;
                }
            }
            identity.clone()
        };
        if let Some(store) = &self.store {
            if !snapshot.token.is_empty() {
                if let Err(err) = store.save(&snapshot).await {
                    warn!(?err, "failed to persist counters");
                }
            }
        }
    }

    pub async fn logout(&self) {
        if let Some(store) = &self.store {
            if let Err(err) = store.clear().await {
                warn!(?err, "failed to clear credentials");
            }
        }
        *self.identity.write().await = Identity::default();
        debug!("session cleared");
    }
}
