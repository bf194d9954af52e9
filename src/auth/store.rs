use std::collections::HashMap;
use std::fs;
use std::io::Write;
#[cfg(unix)]
use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error::AuthError;
use super::identity::AccountIdentity;
use super::token::CombinedCredential;

const STORE_FILE_VERSION: u32 = 1;

/// Persistence behind the [`CredentialStore`].
pub trait CredentialBackend: Send + Sync {
    fn load(&self, identity: &AccountIdentity) -> Result<Option<CombinedCredential>, AuthError>;
    fn save(&self, identity: &AccountIdentity, credential: &CombinedCredential)
        -> Result<(), AuthError>;
    fn clear(&self, identity: &AccountIdentity) -> Result<(), AuthError>;
}

/// One TOML file per account slot.
///
/// # Example
/// ```no_run
/// use duolink::auth::{AccountIdentity, CredentialBackend, FileCredentialBackend};
///
/// let backend = FileCredentialBackend::new(std::path::PathBuf::from("/tmp/duolink"));
/// let stored = backend.load(&AccountIdentity::Default)?;
/// # Ok::<(), duolink::auth::AuthError>(())
/// ```
#[derive(Debug, Clone)]
pub struct FileCredentialBackend {
    base_dir: PathBuf,
}

impl FileCredentialBackend {
    pub fn new(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    fn credential_path(&self, identity: &AccountIdentity) -> PathBuf {
        self.base_dir
            .join("credentials")
            .join(format!("{}.toml", identity.storage_label()))
    }

    fn ensure_parent(path: &Path) -> Result<(), AuthError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        Ok(())
    }
}

impl CredentialBackend for FileCredentialBackend {
    fn load(&self, identity: &AccountIdentity) -> Result<Option<CombinedCredential>, AuthError> {
        let path = self.credential_path(identity);
        let raw = match fs::read_to_string(&path) {
            Ok(data) => data,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(AuthError::Io(err.to_string())),
        };
        let file: CredentialFile = toml::from_str(&raw)?;
        Ok(Some(file.credential))
    }

    fn save(
        &self,
        identity: &AccountIdentity,
        credential: &CombinedCredential,
    ) -> Result<(), AuthError> {
        let path = self.credential_path(identity);
        Self::ensure_parent(&path)?;
        let file = CredentialFile {
            version: STORE_FILE_VERSION,
            saved_at: Utc::now(),
            identity: identity.clone(),
            credential: credential.clone(),
        };
        let serialized = toml::to_string(&file)?;
        atomic_write(&path, serialized.as_bytes())
    }

    fn clear(&self, identity: &AccountIdentity) -> Result<(), AuthError> {
        let path = self.credential_path(identity);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(AuthError::Io(err.to_string())),
        }
    }
}

/// Write through a temp file and rename, so readers never see a partial file.
fn atomic_write(path: &Path, data: &[u8]) -> Result<(), AuthError> {
    let file_name = path.file_name().ok_or_else(|| {
        AuthError::Io(format!("Credential path {} has no file name", path.display()))
    })?;
    let temp_path = path.with_file_name(format!(
        ".{}.tmp-{}-{}",
        file_name.to_string_lossy(),
        std::process::id(),
        Uuid::new_v4().simple()
    ));

    let mut options = fs::OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    options.mode(0o600);

    let write_result = (|| -> std::io::Result<()> {
        let mut temp_file = options.open(&temp_path)?;
        temp_file.write_all(data)?;
        temp_file.sync_all()?;
        Ok(())
    })();
    if let Err(err) = write_result {
        let _ = fs::remove_file(&temp_path);
        return Err(err.into());
    }
    if let Err(err) = fs::rename(&temp_path, path) {
        let _ = fs::remove_file(&temp_path);
        return Err(err.into());
    }

    #[cfg(unix)]
    fs::set_permissions(path, fs::Permissions::from_mode(0o600))?;
    Ok(())
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct CredentialFile {
    version: u32,
    saved_at: DateTime<Utc>,
    identity: AccountIdentity,
    credential: CombinedCredential,
}

/// Process-wide credential state, keyed by account slot.
///
/// Readers always see a whole [`CombinedCredential`]: every write replaces the
/// slot's value in one insert under the write lock. Only the login
/// orchestrator and the revocation manager write.
pub struct CredentialStore {
    entries: RwLock<HashMap<AccountIdentity, CombinedCredential>>,
    backend: Option<Arc<dyn CredentialBackend>>,
}

impl CredentialStore {
    pub fn new(backend: Arc<dyn CredentialBackend>) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            backend: Some(backend),
        }
    }

    /// Store with no persistence.
    pub fn in_memory() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            backend: None,
        }
    }

    /// Current credential for `identity`; the empty value when none is stored.
    pub fn get_credential(&self, identity: &AccountIdentity) -> CombinedCredential {
        if let Some(found) = self
            .entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(identity)
        {
            return found.clone();
        }

        let loaded = match &self.backend {
            Some(backend) => backend.load(identity).unwrap_or_else(|error| {
                tracing::error!(identity = %identity, error = %error, "Failed to load credential");
                None
            }),
            None => None,
        }
        .unwrap_or_default();

        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(identity.clone())
            .or_insert(loaded)
            .clone()
    }

    /// Stored refresh tokens for `identity` in login order, duplicates kept.
    pub fn refresh_tokens(&self, identity: &AccountIdentity) -> Vec<String> {
        self.get_credential(identity).refresh_tokens()
    }

    /// Replace the slot, then persist. The in-memory value is replaced even
    /// when persistence fails.
    pub(crate) fn replace(
        &self,
        identity: &AccountIdentity,
        credential: CombinedCredential,
    ) -> Result<(), AuthError> {
        let persisted = credential.clone();
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(identity.clone(), credential);
        self.persist(identity, &persisted)
    }

    pub(crate) fn clear(&self, identity: &AccountIdentity) -> Result<(), AuthError> {
        self.replace(identity, CombinedCredential::empty())
    }

    /// Write every cached slot to the backend.
    pub fn flush(&self) -> Result<(), AuthError> {
        let snapshot: Vec<(AccountIdentity, CombinedCredential)> = self
            .entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(identity, credential)| (identity.clone(), credential.clone()))
            .collect();
        for (identity, credential) in &snapshot {
            self.persist(identity, credential)?;
        }
        Ok(())
    }

    fn persist(
        &self,
        identity: &AccountIdentity,
        credential: &CombinedCredential,
    ) -> Result<(), AuthError> {
        let Some(backend) = &self.backend else {
            return Ok(());
        };
        if credential.is_empty() {
            backend.clear(identity)
        } else {
            backend.save(identity, credential)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::token::Credential;
    use chrono::Duration;
    use tempfile::TempDir;

    fn temp_backend() -> (TempDir, FileCredentialBackend) {
        let dir = TempDir::new().unwrap();
        let backend = FileCredentialBackend::new(dir.path().to_path_buf());
        (dir, backend)
    }

    fn pair(tag: &str) -> CombinedCredential {
        let expires = Utc::now() + Duration::hours(1);
        CombinedCredential::new(
            Credential {
                access_token: format!("{tag}-tv-access"),
                refresh_token: format!("{tag}-tv-refresh"),
                expires_at: expires,
            },
            Credential {
                access_token: format!("{tag}-access"),
                refresh_token: format!("{tag}-refresh"),
                expires_at: expires,
            },
        )
    }

    #[test]
    fn file_backend_round_trip_keeps_pair_order() {
        let (_dir, backend) = temp_backend();
        let credential = pair("a");
        backend.save(&AccountIdentity::Default, &credential).unwrap();
        let loaded = backend.load(&AccountIdentity::Default).unwrap().unwrap();
        assert_eq!(loaded.secondary.access_token, "a-tv-access");
        assert_eq!(loaded.primary.refresh_token, "a-refresh");
        assert_eq!(
            loaded.primary.expires_at.timestamp(),
            credential.primary.expires_at.timestamp()
        );
    }

    #[test]
    fn file_backend_clear_is_idempotent() {
        let (_dir, backend) = temp_backend();
        backend.save(&AccountIdentity::Default, &pair("a")).unwrap();
        backend.clear(&AccountIdentity::Default).unwrap();
        backend.clear(&AccountIdentity::Default).unwrap();
        assert!(backend.load(&AccountIdentity::Default).unwrap().is_none());
    }

    #[cfg(unix)]
    #[test]
    fn file_backend_restricts_permissions() {
        let (dir, backend) = temp_backend();
        backend.save(&AccountIdentity::Default, &pair("a")).unwrap();
        let path = dir.path().join("credentials").join("default.toml");
        let mode = fs::metadata(path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn identities_are_stored_independently() {
        let (_dir, backend) = temp_backend();
        let store = CredentialStore::new(Arc::new(backend));
        let external = AccountIdentity::External("companion".to_string());
        store.replace(&AccountIdentity::Default, pair("d")).unwrap();
        store.replace(&external, pair("e")).unwrap();

        store.clear(&external).unwrap();

        assert_eq!(
            store.get_credential(&AccountIdentity::Default).primary.access_token,
            "d-access"
        );
        assert!(store.get_credential(&external).is_empty());
    }

    #[test]
    fn store_lazily_loads_from_backend() {
        let (dir, backend) = temp_backend();
        backend.save(&AccountIdentity::Default, &pair("p")).unwrap();

        let store = CredentialStore::new(Arc::new(FileCredentialBackend::new(
            dir.path().to_path_buf(),
        )));
        assert_eq!(
            store.refresh_tokens(&AccountIdentity::Default),
            vec!["p-tv-refresh".to_string(), "p-refresh".to_string()]
        );
    }

    #[test]
    fn replace_overwrites_instead_of_merging() {
        let store = CredentialStore::in_memory();
        store.replace(&AccountIdentity::Default, pair("old")).unwrap();
        let fresh = CombinedCredential::new(
            Credential::issued("tv", "", None, Utc::now()),
            Credential::issued("main", "", None, Utc::now()),
        );
        store.replace(&AccountIdentity::Default, fresh.clone()).unwrap();
        assert_eq!(store.get_credential(&AccountIdentity::Default), fresh);
        assert!(store.refresh_tokens(&AccountIdentity::Default).is_empty());
    }

    #[test]
    fn flush_persists_cached_entries() {
        let (dir, backend) = temp_backend();
        let backend = Arc::new(backend);
        let store = CredentialStore::new(backend.clone());
        store.replace(&AccountIdentity::Default, pair("f")).unwrap();
        fs::remove_dir_all(dir.path().join("credentials")).unwrap();

        store.flush().unwrap();

        assert!(backend.load(&AccountIdentity::Default).unwrap().is_some());
    }
}
