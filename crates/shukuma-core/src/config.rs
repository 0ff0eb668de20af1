//! Application configuration management.
//!
//! This module handles loading and saving the application configuration:
//! API base URL, which secure storage backend to use, the storage key names,
//! and the last used username.
//!
//! Configuration is stored at `~/.config/shukuma/config.json`. A few values
//! can be overridden from the environment (see `apply_env`).

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

use anyhow::{anyhow, bail, Context, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::api::{ApiClient, DEFAULT_API_BASE_URL};
use crate::auth::{CredentialStore, Session, StorageKeys};
use crate::storage::keychain::DEFAULT_SERVICE_NAME;
use crate::storage::{EncryptedFileStore, KeyringStore, MemoryStore, SecureStore};

/// Application name used for config/data directory paths
const APP_NAME: &str = "shukuma";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Vault file name for the encrypted-file backend
const VAULT_FILE: &str = "vault.skv";

pub const ENV_API_URL: &str = "SHUKUMA_API_URL";
pub const ENV_BACKEND: &str = "SHUKUMA_BACKEND";
pub const ENV_VAULT_PASSPHRASE: &str = "SHUKUMA_VAULT_PASSPHRASE";

/// Which `SecureStore` holds the credentials
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StorageBackend {
    #[default]
    Keyring,
    EncryptedFile,
    Memory,
}

impl FromStr for StorageBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "keyring" => Ok(StorageBackend::Keyring),
            "encrypted-file" | "file" => Ok(StorageBackend::EncryptedFile),
            "memory" => Ok(StorageBackend::Memory),
            other => bail!("Unknown storage backend: {}", other),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api_base_url: String,
    pub backend: StorageBackend,
    pub keyring_service: String,
    /// Vault location for the encrypted-file backend; defaults to the
    /// local data directory
    pub vault_path: Option<PathBuf>,
    pub keys: StorageKeys,
    pub last_username: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            backend: StorageBackend::default(),
            keyring_service: DEFAULT_SERVICE_NAME.to_string(),
            vault_path: None,
            keys: StorageKeys::default(),
            last_username: None,
        }
    }
}

impl Config {
    /// Load from the default location; a missing file yields defaults
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file {}", path.display()))?;
            serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse config file {}", path.display()))
        } else {
            debug!(path = %path.display(), "No config file, using defaults");
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Apply overrides from an environment lookup (`std::env::var` in practice)
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(ENV_API_URL).filter(|v| !v.is_empty()) {
            self.api_base_url = url;
        }
        if let Some(backend) = lookup(ENV_BACKEND).filter(|v| !v.is_empty()) {
            self.backend = backend
                .parse()
                .with_context(|| format!("Invalid {}", ENV_BACKEND))?;
        }
        Ok(())
    }

    pub fn config_path() -> Result<PathBuf> {
        let config_dir =
            dirs::config_dir().ok_or_else(|| anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    pub fn vault_path(&self) -> Result<PathBuf> {
        if let Some(ref path) = self.vault_path {
            return Ok(path.clone());
        }
        let data_dir =
            dirs::data_local_dir().ok_or_else(|| anyhow!("Could not find data directory"))?;
        Ok(data_dir.join(APP_NAME).join(VAULT_FILE))
    }

    /// Build the configured backend. The encrypted-file backend needs a
    /// passphrase; the others ignore it.
    pub fn open_backend(&self, passphrase: Option<&str>) -> Result<Arc<dyn SecureStore>> {
        let backend: Arc<dyn SecureStore> = match self.backend {
            StorageBackend::Keyring => Arc::new(KeyringStore::new(&self.keyring_service)),
            StorageBackend::EncryptedFile => {
                let passphrase = passphrase.filter(|p| !p.is_empty()).ok_or_else(|| {
                    anyhow!(
                        "The encrypted-file backend needs a passphrase ({})",
                        ENV_VAULT_PASSPHRASE
                    )
                })?;
                let path = self.vault_path()?;
                Arc::new(
                    EncryptedFileStore::open(&path, passphrase)
                        .with_context(|| format!("Failed to open vault {}", path.display()))?,
                )
            }
            StorageBackend::Memory => Arc::new(MemoryStore::new()),
        };
        debug!(backend = backend.name(), "Opened secure storage");
        Ok(backend)
    }

    pub fn credential_store(&self, passphrase: Option<&str>) -> Result<CredentialStore> {
        Ok(CredentialStore::new(
            self.open_backend(passphrase)?,
            self.keys.clone(),
        ))
    }

    pub fn api_client(&self) -> Result<ApiClient> {
        ApiClient::new(&self.api_base_url)
    }

    pub fn session(&self, passphrase: Option<&str>) -> Result<Session> {
        Ok(Session::new(
            self.api_client()?,
            self.credential_store(passphrase)?,
        ))
    }
}
