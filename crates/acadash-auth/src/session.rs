//! Client-side session persistence
//!
//! The session lives in two string entries of a key/value store: the bearer
//! token and the JSON-serialized user. Both entries are always written and
//! removed together, so the store never holds one without the other.

use crate::config::SessionConfig;
use crate::providers::jwt::token_lifetime;
use crate::traits::SignIn;
use crate::user::User;
use crate::{AuthError, AuthResult};
use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// An authenticated context: user snapshot plus its bearer token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub user: User,
    pub token: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }
}

impl From<SignIn> for Session {
    fn from(sign_in: SignIn) -> Self {
        Self {
            user: sign_in.user,
            token: sign_in.token,
            issued_at: sign_in.issued_at,
            expires_at: sign_in.expires_at,
        }
    }
}

/// Key/value storage surviving reloads, in the shape of browser local storage
pub trait ClientStorage: Send + Sync {
    fn get_item(&self, key: &str) -> AuthResult<Option<String>>;

    /// Write every entry in a single step
    fn set_items(&self, items: &[(&str, &str)]) -> AuthResult<()>;

    /// Remove every key in a single step; absent keys are ignored
    fn remove_items(&self, keys: &[&str]) -> AuthResult<()>;
}

/// Process-local storage
#[derive(Debug, Default)]
pub struct MemoryStorage {
    items: RwLock<BTreeMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.items.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.read().is_empty()
    }
}

impl ClientStorage for MemoryStorage {
    fn get_item(&self, key: &str) -> AuthResult<Option<String>> {
        Ok(self.items.read().get(key).cloned())
    }

    fn set_items(&self, items: &[(&str, &str)]) -> AuthResult<()> {
        let mut guard = self.items.write();
        for (key, value) in items {
            guard.insert(key.to_string(), value.to_string());
        }
        Ok(())
    }

    fn remove_items(&self, keys: &[&str]) -> AuthResult<()> {
        let mut guard = self.items.write();
        for key in keys {
            guard.remove(*key);
        }
        Ok(())
    }
}

/// Storage backed by a JSON object on disk.
///
/// Writes go to a sibling temp file which is then renamed over the target.
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> AuthResult<BTreeMap<String, String>> {
        match fs::read_to_string(&self.path) {
            Ok(contents) if contents.trim().is_empty() => Ok(BTreeMap::new()),
            Ok(contents) => Ok(serde_json::from_str(&contents)?),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    fn write_all(&self, items: &BTreeMap<String, String>) -> AuthResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, serde_json::to_vec_pretty(items)?)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl ClientStorage for FileStorage {
    fn get_item(&self, key: &str) -> AuthResult<Option<String>> {
        let _guard = self.lock.lock();
        Ok(self.read_all()?.remove(key))
    }

    fn set_items(&self, items: &[(&str, &str)]) -> AuthResult<()> {
        let _guard = self.lock.lock();
        // A corrupt file is replaced rather than preserved
        let mut all = self.read_all().unwrap_or_default();
        for (key, value) in items {
            all.insert(key.to_string(), value.to_string());
        }
        self.write_all(&all)
    }

    fn remove_items(&self, keys: &[&str]) -> AuthResult<()> {
        let _guard = self.lock.lock();
        let mut all = self.read_all().unwrap_or_default();
        for key in keys {
            all.remove(*key);
        }
        if all.is_empty() {
            return match fs::remove_file(&self.path) {
                Err(e) if e.kind() != ErrorKind::NotFound => Err(e.into()),
                _ => Ok(()),
            };
        }
        self.write_all(&all)
    }
}

/// Persists the current session as a token/user pair
#[derive(Clone)]
pub struct SessionStore {
    storage: Arc<dyn ClientStorage>,
    token_key: String,
    user_key: String,
}

impl SessionStore {
    pub fn new(storage: Arc<dyn ClientStorage>, config: &SessionConfig) -> Self {
        Self {
            storage,
            token_key: config.token_key.clone(),
            user_key: config.user_key.clone(),
        }
    }

    /// Store with the default `token` / `user` keys
    pub fn with_storage(storage: Arc<dyn ClientStorage>) -> Self {
        Self::new(storage, &SessionConfig::default())
    }

    /// Build the storage named by the configuration
    pub fn from_config(config: &SessionConfig) -> Self {
        let storage: Arc<dyn ClientStorage> = match &config.storage_path {
            Some(path) => Arc::new(FileStorage::new(path)),
            None => Arc::new(MemoryStorage::new()),
        };
        Self::new(storage, config)
    }

    /// Read the persisted session, reporting corruption as an error
    pub fn try_load(&self) -> AuthResult<Option<Session>> {
        let token = self.storage.get_item(&self.token_key)?;
        let user = self.storage.get_item(&self.user_key)?;

        let (token, user) = match (token, user) {
            (None, None) => return Ok(None),
            (Some(token), Some(user)) => (token, user),
            (Some(_), None) => return Err(AuthError::storage_corrupt("token stored without user")),
            (None, Some(_)) => return Err(AuthError::storage_corrupt("user stored without token")),
        };

        let user: User = serde_json::from_str(&user)?;
        let (issued_at, expires_at) = token_lifetime(&token)?;

        Ok(Some(Session {
            user,
            token,
            issued_at,
            expires_at,
        }))
    }

    /// Read the persisted session.
    ///
    /// Anything unreadable counts as no session and is cleared; startup never
    /// fails because of storage contents. Expiry is left to the caller.
    pub fn load(&self) -> Option<Session> {
        match self.try_load() {
            Ok(session) => session,
            Err(err) => {
                tracing::warn!(error = %err, code = err.error_code(), "Discarding unreadable stored session");
                if let Err(clear_err) = self.clear() {
                    tracing::warn!(error = %clear_err, "Failed to clear unreadable stored session");
                }
                None
            }
        }
    }

    /// Persist token and user together
    pub fn save(&self, token: &str, user: &User) -> AuthResult<()> {
        let user_json = serde_json::to_string(user)
            .map_err(|e| AuthError::storage_corrupt(format!("cannot serialize user: {}", e)))?;
        self.storage
            .set_items(&[(self.token_key.as_str(), token), (self.user_key.as_str(), user_json.as_str())])
    }

    /// Remove both entries; safe when nothing is stored
    pub fn clear(&self) -> AuthResult<()> {
        self.storage
            .remove_items(&[self.token_key.as_str(), self.user_key.as_str()])
    }

    pub fn storage(&self) -> &Arc<dyn ClientStorage> {
        &self.storage
    }

    pub fn token_key(&self) -> &str {
        &self.token_key
    }

    pub fn user_key(&self) -> &str {
        &self.user_key
    }
}
