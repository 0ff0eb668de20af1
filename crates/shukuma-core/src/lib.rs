//! Core library for the Shukuma fitness client.
//!
//! - `storage`: secure key-value backends (OS keyring, encrypted vault file, memory)
//! - `auth`: credential persistence, form validation, and the session flows
//! - `api`: endpoint table and HTTP client for the backend
//! - `config`: on-disk configuration and environment overrides

pub mod api;
pub mod auth;
pub mod config;
pub mod storage;

pub use api::{ApiClient, ApiError, Endpoints, ExerciseFilter};
pub use auth::{
    CredentialStore, LoginForm, ReadOutcome, RegistrationForm, Session, StorageKeys,
    StorageWriteError, UserData, ValidationError,
};
pub use config::{Config, StorageBackend};
pub use storage::{EncryptedFileStore, KeyringStore, MemoryStore, SecureStore, StoreError};
