//! Authentication module for persisting and managing the signed-in user.
//!
//! This module provides:
//! - `CredentialStore`: token and user-record persistence over a `SecureStore`
//! - `Session`: login, registration, resume, and logout flows
//! - Form validation for the login and registration inputs
//!
//! Credential writes surface `StorageWriteError`; credential reads fail open
//! to "signed out".

pub mod credentials;
pub mod error;
pub mod session;
pub mod validation;

pub use credentials::{
    CredentialStore, ReadOutcome, StorageKeys, UserData, AUTH_TOKEN_KEY, USER_DATA_KEY,
};
pub use error::StorageWriteError;
pub use session::Session;
pub use validation::{LoginForm, RegistrationForm, ValidationError};
