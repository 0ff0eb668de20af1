use thiserror::Error;

use crate::storage::StoreError;

/// The single error kind surfaced by `CredentialStore` writes and deletes.
///
/// Reads never produce it: they fail open to "absent".
#[derive(Error, Debug)]
#[error("{message}: {source}")]
pub struct StorageWriteError {
    message: String,
    #[source]
    source: StoreError,
}

impl StorageWriteError {
    pub fn new(message: impl Into<String>, source: StoreError) -> Self {
        Self {
            message: message.into(),
            source,
        }
    }

    /// Human-readable description of what was being written
    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn store_error(&self) -> &StoreError {
        &self.source
    }
}
