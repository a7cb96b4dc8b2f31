//! Directory-backed ed25519 key store.
//!
//! Loads keys by `key_id = hex(SHA256(raw_public_key_bytes))` from a
//! directory, indexed by filename convention
//! `<hex-sha256-of-pubkey>.pub` / `<name>.key` (`spec.md` §6). Accepts
//! PKCS#8 PEM private keys, SubjectPublicKeyInfo PEM public keys, and raw
//! 32-byte NaCl key files (agent telemetry). Never mutates the directory.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use ed25519_dalek::pkcs8::{DecodePrivateKey, DecodePublicKey};
use ed25519_dalek::{SigningKey, VerifyingKey};

use crate::key_id_for_public_bytes;

pub type KeyId = String;

#[derive(Debug, thiserror::Error)]
pub enum KeyStoreError {
    #[error("key directory does not exist: {0}")]
    DirectoryNotFound(PathBuf),
    #[error("unknown key id: {0}")]
    UnknownKeyId(KeyId),
    #[error("private key file {path} has insecure permissions (must be 0600)")]
    InsecurePrivateKeyPermissions { path: PathBuf },
    #[error("malformed key file {path}: {reason}")]
    MalformedKeyFile { path: PathBuf, reason: String },
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Read-only view over a directory of ed25519 key files.
///
/// Public keys are discovered by scanning the directory once at
/// construction time (`spec.md` §4.2: "public key files discovered by
/// scanning the directory are admissible for verification"). Private keys
/// are loaded lazily by id, since most processes hold only their own.
pub struct KeyStore {
    dir: PathBuf,
    public_keys: HashMap<KeyId, VerifyingKey>,
}

impl KeyStore {
    /// Scan `dir` for `*.pub` files (PEM or raw 32-byte), indexing each by
    /// its derived key id.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self, KeyStoreError> {
        let dir = dir.as_ref().to_path_buf();
        if !dir.is_dir() {
            return Err(KeyStoreError::DirectoryNotFound(dir));
        }
        let mut public_keys = HashMap::new();
        for entry in fs::read_dir(&dir).map_err(|source| KeyStoreError::Io {
            path: dir.clone(),
            source,
        })? {
            let entry = entry.map_err(|source| KeyStoreError::Io {
                path: dir.clone(),
                source,
            })?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("pub") {
                continue;
            }
            let verifying_key = load_public_key_file(&path)?;
            let key_id = key_id_for_public_bytes(verifying_key.as_bytes());
            public_keys.insert(key_id, verifying_key);
        }
        Ok(Self { dir, public_keys })
    }

    /// Look up an already-scanned public key by id.
    pub fn load_public(&self, key_id: &str) -> Result<VerifyingKey, KeyStoreError> {
        self.public_keys
            .get(key_id)
            .copied()
            .ok_or_else(|| KeyStoreError::UnknownKeyId(key_id.to_string()))
    }

    /// Load a private key by id, failing closed if its file permissions are
    /// not owner-only (mode 0600 on Unix).
    pub fn load_private(&self, key_id: &str) -> Result<SigningKey, KeyStoreError> {
        let path = self.dir.join(format!("{key_id}.key"));
        if !path.exists() {
            return Err(KeyStoreError::UnknownKeyId(key_id.to_string()));
        }
        check_private_key_permissions(&path)?;
        load_private_key_file(&path)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn known_key_ids(&self) -> Vec<KeyId> {
        self.public_keys.keys().cloned().collect()
    }
}

#[cfg(unix)]
fn check_private_key_permissions(path: &Path) -> Result<(), KeyStoreError> {
    use std::os::unix::fs::PermissionsExt;
    let metadata = fs::metadata(path).map_err(|source| KeyStoreError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let mode = metadata.permissions().mode() & 0o777;
    if mode != 0o600 {
        return Err(KeyStoreError::InsecurePrivateKeyPermissions {
            path: path.to_path_buf(),
        });
    }
    Ok(())
}

#[cfg(not(unix))]
fn check_private_key_permissions(_path: &Path) -> Result<(), KeyStoreError> {
    Ok(())
}

fn load_public_key_file(path: &Path) -> Result<VerifyingKey, KeyStoreError> {
    let bytes = fs::read(path).map_err(|source| KeyStoreError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    if let Ok(text) = std::str::from_utf8(&bytes) {
        if text.contains("BEGIN PUBLIC KEY") {
            return VerifyingKey::from_public_key_pem(text).map_err(|e| {
                KeyStoreError::MalformedKeyFile {
                    path: path.to_path_buf(),
                    reason: e.to_string(),
                }
            });
        }
    }
    raw_verifying_key(&bytes, path)
}

fn load_private_key_file(path: &Path) -> Result<SigningKey, KeyStoreError> {
    let bytes = fs::read(path).map_err(|source| KeyStoreError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    if let Ok(text) = std::str::from_utf8(&bytes) {
        if text.contains("BEGIN PRIVATE KEY") {
            return SigningKey::from_pkcs8_pem(text).map_err(|e| KeyStoreError::MalformedKeyFile {
                path: path.to_path_buf(),
                reason: e.to_string(),
            });
        }
    }
    if bytes.len() != 32 {
        return Err(KeyStoreError::MalformedKeyFile {
            path: path.to_path_buf(),
            reason: format!("expected 32 raw bytes, got {}", bytes.len()),
        });
    }
    let mut raw = [0u8; 32];
    raw.copy_from_slice(&bytes);
    Ok(SigningKey::from_bytes(&raw))
}

fn raw_verifying_key(bytes: &[u8], path: &Path) -> Result<VerifyingKey, KeyStoreError> {
    if bytes.len() != 32 {
        return Err(KeyStoreError::MalformedKeyFile {
            path: path.to_path_buf(),
            reason: format!("expected 32 raw bytes, got {}", bytes.len()),
        });
    }
    let mut raw = [0u8; 32];
    raw.copy_from_slice(bytes);
    VerifyingKey::from_bytes(&raw).map_err(|e| KeyStoreError::MalformedKeyFile {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ed25519_dalek::pkcs8::EncodePrivateKey;
    use rand::rngs::OsRng;
    use std::os::unix::fs::PermissionsExt;

    fn write_raw_key_pair(dir: &Path) -> (String, SigningKey) {
        let signing_key = SigningKey::generate(&mut OsRng);
        let verifying_key = signing_key.verifying_key();
        let key_id = key_id_for_public_bytes(verifying_key.as_bytes());

        fs::write(dir.join(format!("{key_id}.pub")), verifying_key.as_bytes()).unwrap();
        let key_path = dir.join(format!("{key_id}.key"));
        fs::write(&key_path, signing_key.to_bytes()).unwrap();
        fs::set_permissions(&key_path, fs::Permissions::from_mode(0o600)).unwrap();

        (key_id, signing_key)
    }

    #[test]
    fn loads_raw_key_pair_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let (key_id, signing_key) = write_raw_key_pair(dir.path());

        let store = KeyStore::open(dir.path()).unwrap();
        let public = store.load_public(&key_id).unwrap();
        assert_eq!(public, signing_key.verifying_key());

        let private = store.load_private(&key_id).unwrap();
        assert_eq!(private.to_bytes(), signing_key.to_bytes());
    }

    #[test]
    fn rejects_world_readable_private_key() {
        let dir = tempfile::tempdir().unwrap();
        let (key_id, _) = write_raw_key_pair(dir.path());
        let key_path = dir.path().join(format!("{key_id}.key"));
        fs::set_permissions(&key_path, fs::Permissions::from_mode(0o644)).unwrap();

        let store = KeyStore::open(dir.path()).unwrap();
        let err = store.load_private(&key_id).unwrap_err();
        assert!(matches!(
            err,
            KeyStoreError::InsecurePrivateKeyPermissions { .. }
        ));
    }

    #[test]
    fn unknown_key_id_errors() {
        let dir = tempfile::tempdir().unwrap();
        let store = KeyStore::open(dir.path()).unwrap();
        assert!(matches!(
            store.load_public("deadbeef"),
            Err(KeyStoreError::UnknownKeyId(_))
        ));
    }

    #[test]
    fn loads_pkcs8_pem_private_key() {
        let dir = tempfile::tempdir().unwrap();
        let signing_key = SigningKey::generate(&mut OsRng);
        let pem = signing_key
            .to_pkcs8_pem(pkcs8::LineEnding::LF)
            .unwrap()
            .to_string();
        let verifying_key = signing_key.verifying_key();
        let key_id = key_id_for_public_bytes(verifying_key.as_bytes());

        let key_path = dir.path().join(format!("{key_id}.key"));
        fs::write(&key_path, pem).unwrap();
        fs::set_permissions(&key_path, fs::Permissions::from_mode(0o600)).unwrap();
        fs::write(dir.path().join(format!("{key_id}.pub")), verifying_key.as_bytes()).unwrap();

        let store = KeyStore::open(dir.path()).unwrap();
        let private = store.load_private(&key_id).unwrap();
        assert_eq!(private.verifying_key(), verifying_key);
    }
}
