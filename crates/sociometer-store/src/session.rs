//! Per-platform cookie persistence.
//!
//! Sessions are advisory: a missing or corrupt file loads as `None` and the
//! scraper carries on anonymously. Writers for the same platform are
//! serialized through [`SessionStore::lock`].

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sociometer_core::Platform;
use tokio::sync::OwnedMutexGuard;

use crate::atomic::write_json_atomic;
use crate::StoreError;

/// A browser cookie in the shape rendering services accept.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cookie {
    pub name: String,
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// Unix seconds; `None` for session cookies.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires: Option<f64>,
    #[serde(default)]
    pub http_only: bool,
    #[serde(default)]
    pub secure: bool,
}

impl Cookie {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            domain: None,
            path: None,
            expires: None,
            http_only: false,
            secure: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub platform: Platform,
    pub cookies: Vec<Cookie>,
    pub saved_at: DateTime<Utc>,
}

impl Session {
    #[must_use]
    pub fn new(platform: Platform, cookies: Vec<Cookie>) -> Self {
        Self {
            platform,
            cookies,
            saved_at: Utc::now(),
        }
    }
}

#[derive(Debug)]
pub struct SessionStore {
    dir: PathBuf,
    locks: Mutex<HashMap<Platform, Arc<tokio::sync::Mutex<()>>>>,
}

impl SessionStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            locks: Mutex::new(HashMap::new()),
        }
    }

    fn path_for(&self, platform: Platform) -> PathBuf {
        self.dir.join(format!("{}.json", platform.as_str()))
    }

    /// Acquires the single-writer guard for `platform`. Hold it for the whole
    /// scrape so two scrapes of the same platform never interleave.
    pub async fn lock(&self, platform: Platform) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
            Arc::clone(locks.entry(platform).or_default())
        };
        lock.lock_owned().await
    }

    /// Reads the persisted session for `platform`. Absent and corrupt files
    /// both yield `None`; corruption is logged.
    pub async fn load(&self, platform: Platform) -> Option<Session> {
        let path = self.path_for(platform);
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
            Err(e) => {
                tracing::warn!(%platform, path = %path.display(), error = %e, "failed to read session file");
                return None;
            }
        };

        match serde_json::from_slice::<Session>(&bytes) {
            Ok(session) if session.platform == platform => Some(session),
            Ok(session) => {
                tracing::warn!(
                    %platform,
                    found = %session.platform,
                    "session file belongs to another platform; ignoring"
                );
                None
            }
            Err(e) => {
                tracing::warn!(%platform, path = %path.display(), error = %e, "corrupt session file; continuing without it");
                None
            }
        }
    }

    /// Persists `session` atomically.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the session cannot be serialized or written.
    pub async fn save(&self, platform: Platform, session: &Session) -> Result<(), StoreError> {
        let path = self.path_for(platform);
        write_json_atomic(&path, session).await?;
        tracing::debug!(%platform, cookies = session.cookies.len(), "session saved");
        Ok(())
    }
}
