use thiserror::Error;

/// Failure reported by a `SecureStore` backend.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Secure storage unavailable: {0}")]
    Unavailable(String),

    #[error("Access to secure storage denied: {0}")]
    AccessDenied(String),

    #[error("Stored value is not valid: {0}")]
    InvalidData(String),

    #[error("Vault encryption error: {0}")]
    Crypto(String),

    #[error("Vault I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Storage backend error: {0}")]
    Backend(String),
}
