//! Secure key-value storage backends.
//!
//! Everything durable goes through the `SecureStore` trait: a minimal
//! `put` / `get` / `delete` contract over UTF-8 text values. Backends:
//! - `KeyringStore`: OS credential store (Keychain, Credential Manager, kernel keyring)
//! - `EncryptedFileStore`: passphrase-protected vault file for devices without a keychain
//! - `MemoryStore`: process-local map, used for tests and throwaway sessions
//!
//! Implementations are blocking; async callers run them on the blocking pool.

pub mod encrypted_file;
pub mod error;
pub mod keychain;
pub mod memory;

pub use encrypted_file::EncryptedFileStore;
pub use error::StoreError;
pub use keychain::KeyringStore;
pub use memory::MemoryStore;

/// Minimal contract of an encrypted on-device key-value store.
pub trait SecureStore: Send + Sync {
    /// Store `value` under `key`, replacing any previous value.
    fn put(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Read the value under `key`. A missing key is `Ok(None)`, not an error.
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Remove `key`. Removing a key that does not exist succeeds.
    fn delete(&self, key: &str) -> Result<(), StoreError>;

    /// Short backend name for log lines
    fn name(&self) -> &'static str;
}
