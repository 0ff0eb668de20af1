use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use argon2::Argon2;
use chacha20poly1305::aead::{Aead, KeyInit};
use chacha20poly1305::{ChaCha20Poly1305, Key, Nonce};
use rand::rngs::OsRng;
use rand::RngCore;
use tracing::debug;

use super::{SecureStore, StoreError};

/// File signature and format version
const MAGIC: &[u8; 4] = b"SKV1";

const SALT_LEN: usize = 16;
const NONCE_LEN: usize = 12;
const KEY_LEN: usize = 32;
const HEADER_LEN: usize = MAGIC.len() + SALT_LEN + NONCE_LEN;

/// `SecureStore` kept in a single passphrase-protected file.
///
/// The whole entry map is serialized to JSON and sealed with
/// ChaCha20-Poly1305. The key comes from the passphrase via Argon2id with a
/// per-vault random salt. On disk:
///
/// ```text
/// "SKV1" | salt (16) | nonce (12) | ciphertext + tag
/// ```
///
/// Every save draws a fresh nonce and replaces the file through a rename,
/// so a failed write leaves the previous vault intact.
pub struct EncryptedFileStore {
    path: PathBuf,
    salt: [u8; SALT_LEN],
    cipher: ChaCha20Poly1305,
    // Serializes read-modify-write cycles
    lock: Mutex<()>,
}

impl EncryptedFileStore {
    /// Open the vault at `path`, or prepare a new one if the file does not
    /// exist yet. The file is only created by the first `put`.
    pub fn open(path: impl Into<PathBuf>, passphrase: &str) -> Result<Self, StoreError> {
        let path = path.into();

        let salt = match fs::read(&path) {
            Ok(bytes) => read_salt(&bytes)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let mut salt = [0u8; SALT_LEN];
                OsRng.fill_bytes(&mut salt);
                salt
            }
            Err(e) => return Err(e.into()),
        };

        let mut key = [0u8; KEY_LEN];
        Argon2::default()
            .hash_password_into(passphrase.as_bytes(), &salt, &mut key)
            .map_err(|e| StoreError::Crypto(format!("key derivation failed: {}", e)))?;
        let cipher = ChaCha20Poly1305::new(Key::from_slice(&key));

        debug!(path = %path.display(), "Opened encrypted vault");

        Ok(Self {
            path,
            salt,
            cipher,
            lock: Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn guard(&self) -> Result<MutexGuard<'_, ()>, StoreError> {
        self.lock
            .lock()
            .map_err(|_| StoreError::Backend("vault lock poisoned".to_string()))
    }

    fn load(&self) -> Result<BTreeMap<String, String>, StoreError> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(e) => return Err(e.into()),
        };

        if read_salt(&bytes)? != self.salt {
            return Err(StoreError::Crypto(
                "vault was re-created with a different salt".to_string(),
            ));
        }

        let nonce = Nonce::from_slice(&bytes[MAGIC.len() + SALT_LEN..HEADER_LEN]);
        let plaintext = self
            .cipher
            .decrypt(nonce, &bytes[HEADER_LEN..])
            .map_err(|_| StoreError::Crypto("wrong passphrase or corrupted vault".to_string()))?;

        serde_json::from_slice(&plaintext)
            .map_err(|e| StoreError::InvalidData(format!("vault contents: {}", e)))
    }

    fn save(&self, entries: &BTreeMap<String, String>) -> Result<(), StoreError> {
        let plaintext = serde_json::to_vec(entries)
            .map_err(|e| StoreError::InvalidData(format!("vault contents: {}", e)))?;

        let mut nonce = [0u8; NONCE_LEN];
        OsRng.fill_bytes(&mut nonce);
        let ciphertext = self
            .cipher
            .encrypt(Nonce::from_slice(&nonce), plaintext.as_slice())
            .map_err(|_| StoreError::Crypto("encryption failed".to_string()))?;

        let mut contents = Vec::with_capacity(HEADER_LEN + ciphertext.len());
        contents.extend_from_slice(MAGIC);
        contents.extend_from_slice(&self.salt);
        contents.extend_from_slice(&nonce);
        contents.extend_from_slice(&ciphertext);

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let tmp_path = temp_path(&self.path);
        if let Err(e) = write_private(&tmp_path, &contents)
            .and_then(|()| fs::rename(&tmp_path, &self.path))
        {
            let _ = fs::remove_file(&tmp_path);
            return Err(e.into());
        }
        Ok(())
    }
}

/// Sibling path the vault is staged at before the rename. Appends to the
/// full file name so it never equals the vault path.
fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".tmp");
    PathBuf::from(name)
}

fn write_private(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    fs::write(path, contents)?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(0o600))?;
    }
    Ok(())
}

fn read_salt(bytes: &[u8]) -> Result<[u8; SALT_LEN], StoreError> {
    if bytes.len() < HEADER_LEN || &bytes[..MAGIC.len()] != MAGIC {
        return Err(StoreError::InvalidData("not a shukuma vault file".to_string()));
    }
    let mut salt = [0u8; SALT_LEN];
    salt.copy_from_slice(&bytes[MAGIC.len()..MAGIC.len() + SALT_LEN]);
    Ok(salt)
}

impl fmt::Debug for EncryptedFileStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EncryptedFileStore")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

impl SecureStore for EncryptedFileStore {
    fn put(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let _guard = self.guard()?;
        let mut entries = self.load()?;
        entries.insert(key.to_string(), value.to_string());
        self.save(&entries)
    }

    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let _guard = self.guard()?;
        Ok(self.load()?.remove(key))
    }

    fn delete(&self, key: &str) -> Result<(), StoreError> {
        let _guard = self.guard()?;
        let mut entries = self.load()?;
        if entries.remove(key).is_some() {
            self.save(&entries)?;
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "encrypted-file"
    }
}
