use keyring::Entry;
use tracing::debug;

use super::{SecureStore, StoreError};

/// Default keyring service name entries are filed under
pub const DEFAULT_SERVICE_NAME: &str = "shukuma";

/// `SecureStore` backed by the OS credential store.
///
/// Each key becomes one keyring entry under `service`, so the stored
/// values are encrypted at rest by the platform.
#[derive(Debug, Clone)]
pub struct KeyringStore {
    service: String,
}

impl KeyringStore {
    pub fn new(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
        }
    }

    pub fn service(&self) -> &str {
        &self.service
    }

    fn entry(&self, key: &str) -> Result<Entry, StoreError> {
        Entry::new(&self.service, key).map_err(map_keyring_error)
    }
}

impl Default for KeyringStore {
    fn default() -> Self {
        Self::new(DEFAULT_SERVICE_NAME)
    }
}

impl SecureStore for KeyringStore {
    fn put(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.entry(key)?
            .set_password(value)
            .map_err(map_keyring_error)
    }

    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        match self.entry(key)?.get_password() {
            Ok(value) => Ok(Some(value)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(map_keyring_error(e)),
        }
    }

    fn delete(&self, key: &str) -> Result<(), StoreError> {
        match self.entry(key)?.delete_credential() {
            Ok(()) => Ok(()),
            Err(keyring::Error::NoEntry) => {
                debug!(service = %self.service, key = key, "Nothing to delete");
                Ok(())
            }
            Err(e) => Err(map_keyring_error(e)),
        }
    }

    fn name(&self) -> &'static str {
        "keyring"
    }
}

fn map_keyring_error(error: keyring::Error) -> StoreError {
    match error {
        keyring::Error::NoStorageAccess(e) => StoreError::AccessDenied(e.to_string()),
        keyring::Error::PlatformFailure(e) => StoreError::Unavailable(e.to_string()),
        keyring::Error::BadEncoding(_) => {
            StoreError::InvalidData("keychain entry is not UTF-8".to_string())
        }
        other => StoreError::Backend(other.to_string()),
    }
}
