use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use super::StorageWriteError;
use crate::storage::{SecureStore, StoreError};

/// Storage key for the bearer token. Must stay stable across releases.
pub const AUTH_TOKEN_KEY: &str = "auth_token";

/// Storage key for the cached user record. Must stay stable across releases.
pub const USER_DATA_KEY: &str = "user_data";

/// Cached profile/session record, stored as JSON text.
pub type UserData = Map<String, Value>;

/// Names of the two entries a `CredentialStore` manages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageKeys {
    pub token: String,
    pub user_data: String,
}

impl Default for StorageKeys {
    fn default() -> Self {
        Self {
            token: AUTH_TOKEN_KEY.to_string(),
            user_data: USER_DATA_KEY.to_string(),
        }
    }
}

/// Result of a fail-open read.
///
/// `FailedOpen` means the backend (or the stored value) was unreadable; the
/// failure has already been logged and callers treat it like `Absent`.
#[derive(Debug, Clone, PartialEq)]
pub enum ReadOutcome<T> {
    Present(T),
    Absent,
    FailedOpen,
}

impl<T> ReadOutcome<T> {
    pub fn into_option(self) -> Option<T> {
        match self {
            ReadOutcome::Present(value) => Some(value),
            ReadOutcome::Absent | ReadOutcome::FailedOpen => None,
        }
    }

    pub fn is_failed_open(&self) -> bool {
        matches!(self, ReadOutcome::FailedOpen)
    }
}

/// Persists the auth token and user record in a `SecureStore`.
///
/// Writes and deletes propagate failures as `StorageWriteError`. Reads fail
/// open: an unreadable entry is logged and reported as absent, so a broken
/// keychain degrades to "signed out" instead of an error.
///
/// Backend calls block, so they run on tokio's blocking pool; the store must
/// be used from inside a tokio runtime. Clone is cheap.
#[derive(Clone)]
pub struct CredentialStore {
    backend: Arc<dyn SecureStore>,
    keys: StorageKeys,
}

impl CredentialStore {
    pub fn new(backend: Arc<dyn SecureStore>, keys: StorageKeys) -> Self {
        Self { backend, keys }
    }

    pub fn with_default_keys(backend: Arc<dyn SecureStore>) -> Self {
        Self::new(backend, StorageKeys::default())
    }

    pub fn keys(&self) -> &StorageKeys {
        &self.keys
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    // ===== Token =====

    /// Store the bearer token, replacing any previous one
    pub async fn store_token(&self, token: &str) -> Result<(), StorageWriteError> {
        self.put(&self.keys.token, token.to_string())
            .await
            .map_err(|e| StorageWriteError::new("Failed to store authentication token", e))
    }

    /// Read the token, keeping track of whether the read failed
    pub async fn read_token(&self) -> ReadOutcome<String> {
        match self.get(&self.keys.token).await {
            Ok(Some(token)) => ReadOutcome::Present(token),
            Ok(None) => ReadOutcome::Absent,
            Err(e) => {
                warn!(key = %self.keys.token, backend = self.backend.name(), error = %e, "Failed to read token, treating as signed out");
                ReadOutcome::FailedOpen
            }
        }
    }

    pub async fn get_token(&self) -> Option<String> {
        self.read_token().await.into_option()
    }

    pub async fn delete_token(&self) -> Result<(), StorageWriteError> {
        self.delete(&self.keys.token)
            .await
            .map_err(|e| StorageWriteError::new("Failed to delete authentication token", e))
    }

    // ===== User data =====

    /// Serialize and store the user record, replacing any previous one
    pub async fn store_user_data(&self, user: &UserData) -> Result<(), StorageWriteError> {
        let serialized = serde_json::to_string(user).map_err(|e| {
            StorageWriteError::new(
                "Failed to store user data",
                StoreError::InvalidData(e.to_string()),
            )
        })?;
        self.put(&self.keys.user_data, serialized)
            .await
            .map_err(|e| StorageWriteError::new("Failed to store user data", e))
    }

    /// Read and parse the user record. A value that does not parse as a JSON
    /// object counts as a failed read, not as absent.
    pub async fn read_user_data(&self) -> ReadOutcome<UserData> {
        let raw = match self.get(&self.keys.user_data).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return ReadOutcome::Absent,
            Err(e) => {
                warn!(key = %self.keys.user_data, backend = self.backend.name(), error = %e, "Failed to read user data");
                return ReadOutcome::FailedOpen;
            }
        };

        match serde_json::from_str::<UserData>(&raw) {
            Ok(user) => ReadOutcome::Present(user),
            Err(e) => {
                warn!(key = %self.keys.user_data, error = %e, "Stored user data is corrupt");
                ReadOutcome::FailedOpen
            }
        }
    }

    pub async fn get_user_data(&self) -> Option<UserData> {
        self.read_user_data().await.into_option()
    }

    pub async fn delete_user_data(&self) -> Result<(), StorageWriteError> {
        self.delete(&self.keys.user_data)
            .await
            .map_err(|e| StorageWriteError::new("Failed to delete user data", e))
    }

    // ===== Session-level helpers =====

    /// Delete both entries concurrently.
    ///
    /// Fails if either delete fails, even when the other one went through;
    /// after an error either entry may still be present.
    pub async fn clear_auth_data(&self) -> Result<(), StorageWriteError> {
        let (token, user) = futures::future::join(
            self.delete(&self.keys.token),
            self.delete(&self.keys.user_data),
        )
        .await;

        let mut failed = Vec::new();
        let mut first_error = None;
        for (key, result) in [(&self.keys.token, token), (&self.keys.user_data, user)] {
            if let Err(e) = result {
                warn!(key = %key, backend = self.backend.name(), error = %e, "Failed to delete entry while clearing auth data");
                failed.push(key.as_str());
                first_error.get_or_insert(e);
            }
        }

        match first_error {
            None => {
                debug!("Cleared auth data");
                Ok(())
            }
            Some(e) => Err(StorageWriteError::new(
                format!("Failed to clear authentication data ({} not removed)", failed.join(", ")),
                e,
            )),
        }
    }

    /// True when a non-empty token is stored. Read failures count as false.
    pub async fn is_authenticated(&self) -> bool {
        matches!(self.read_token().await, ReadOutcome::Present(token) if !token.is_empty())
    }

    // ===== Blocking backend calls =====

    async fn put(&self, key: &str, value: String) -> Result<(), StoreError> {
        let key = key.to_string();
        self.blocking(move |backend| backend.put(&key, &value)).await
    }

    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let key = key.to_string();
        self.blocking(move |backend| backend.get(&key)).await
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        let key = key.to_string();
        self.blocking(move |backend| backend.delete(&key)).await
    }

    async fn blocking<T, F>(&self, op: F) -> Result<T, StoreError>
    where
        T: Send + 'static,
        F: FnOnce(&dyn SecureStore) -> Result<T, StoreError> + Send + 'static,
    {
        let backend = Arc::clone(&self.backend);
        tokio::task::spawn_blocking(move || op(backend.as_ref()))
            .await
            .map_err(|e| StoreError::Backend(format!("storage task failed: {}", e)))?
    }
}

impl fmt::Debug for CredentialStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialStore")
            .field("backend", &self.backend.name())
            .field("keys", &self.keys)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use serde_json::json;

    fn setup() -> (Arc<MemoryStore>, CredentialStore) {
        let backend = Arc::new(MemoryStore::new());
        let store = CredentialStore::with_default_keys(backend.clone());
        (backend, store)
    }

    fn user(value: Value) -> UserData {
        match value {
            Value::Object(map) => map,
            other => panic!("expected object, got {}", other),
        }
    }

    #[test]
    fn test_default_keys_match_persisted_names() {
        let keys = StorageKeys::default();
        assert_eq!(keys.token, "auth_token");
        assert_eq!(keys.user_data, "user_data");
    }

    #[tokio::test]
    async fn test_store_and_read_token() {
        let (backend, store) = setup();
        assert_eq!(store.read_token().await, ReadOutcome::Absent);

        store.store_token("abc123").await.unwrap();
        assert!(backend.contains_key(AUTH_TOKEN_KEY));
        assert_eq!(store.read_token().await, ReadOutcome::Present("abc123".to_string()));
        assert!(store.is_authenticated().await);

        store.store_token("def456").await.unwrap();
        assert_eq!(store.get_token().await.as_deref(), Some("def456"));
    }

    #[tokio::test]
    async fn test_empty_token_is_stored_but_not_authenticated() {
        let (backend, store) = setup();
        store.store_token("").await.unwrap();

        assert!(backend.contains_key(AUTH_TOKEN_KEY));
        assert_eq!(store.get_token().await.as_deref(), Some(""));
        assert!(!store.is_authenticated().await);
    }

    #[tokio::test]
    async fn test_read_failure_is_failed_open() {
        let (backend, store) = setup();
        store.store_token("abc123").await.unwrap();
        backend.set_fail_reads(true);

        assert!(store.read_token().await.is_failed_open());
        assert_eq!(store.get_token().await, None);
        assert!(!store.is_authenticated().await);
    }

    #[tokio::test]
    async fn test_corrupt_user_data_is_failed_open() {
        let (backend, store) = setup();
        backend.put(USER_DATA_KEY, "{not json").unwrap();
        assert!(store.read_user_data().await.is_failed_open());

        backend.put(USER_DATA_KEY, "[1, 2, 3]").unwrap();
        assert!(store.read_user_data().await.is_failed_open());
        assert_eq!(store.get_user_data().await, None);
    }

    #[tokio::test]
    async fn test_user_data_round_trip_keeps_key_order() {
        let (_backend, store) = setup();
        let record = user(json!({
            "username": "alex",
            "email": "alex@example.com",
            "goals": {"weekly": 4, "focus": ["core", "cardio"]},
            "streak": null
        }));

        store.store_user_data(&record).await.unwrap();
        let loaded = store.get_user_data().await.unwrap();
        assert_eq!(loaded, record);
        let keys: Vec<&String> = loaded.keys().collect();
        assert_eq!(keys, ["username", "email", "goals", "streak"]);
    }

    #[tokio::test]
    async fn test_write_failure_propagates() {
        let (backend, store) = setup();
        store.store_token("old").await.unwrap();
        backend.set_fail_writes(true);

        let err = store.store_token("new").await.unwrap_err();
        assert_eq!(err.message(), "Failed to store authentication token");
        assert!(store.delete_token().await.is_err());
        assert!(store.store_user_data(&UserData::new()).await.is_err());
        assert!(store.delete_user_data().await.is_err());

        backend.set_fail_writes(false);
        assert_eq!(store.get_token().await.as_deref(), Some("old"));
    }

    #[tokio::test]
    async fn test_delete_missing_is_noop() {
        let (_backend, store) = setup();
        store.delete_token().await.unwrap();
        store.delete_user_data().await.unwrap();
        store.clear_auth_data().await.unwrap();
    }

    #[tokio::test]
    async fn test_clear_auth_data_partial_failure() {
        let (backend, store) = setup();
        store.store_token("abc123").await.unwrap();
        store
            .store_user_data(&user(json!({"username": "alex"})))
            .await
            .unwrap();
        backend.fail_deletes_for(USER_DATA_KEY).unwrap();

        let err = store.clear_auth_data().await.unwrap_err();
        assert!(err.message().contains("user_data"));
        assert!(!err.message().contains("auth_token"));

        // The token leg still went through
        assert!(!backend.contains_key(AUTH_TOKEN_KEY));
        assert!(backend.contains_key(USER_DATA_KEY));
        assert!(!store.is_authenticated().await);
    }

    #[tokio::test]
    async fn test_custom_keys() {
        let backend = Arc::new(MemoryStore::new());
        let keys = StorageKeys {
            token: "legacy_token".to_string(),
            user_data: "legacy_user".to_string(),
        };
        let store = CredentialStore::new(backend.clone(), keys);

        store.store_token("abc123").await.unwrap();
        assert!(backend.contains_key("legacy_token"));
        assert!(!backend.contains_key(AUTH_TOKEN_KEY));
    }
}
