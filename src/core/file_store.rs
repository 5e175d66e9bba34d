//! Per-user credential store kept in an owner-only directory.
//!
//! All records live in one `credstore.toml`. Readers hold a shared flock on
//! `credstore.lock`, writers an exclusive one; saves go through a temp file
//! and rename so a crash never leaves a torn store.

use crate::constants;
use crate::core::file_lock::FileLock;
use crate::core::hex;
use crate::core::paths::StorePaths;
use crate::core::store::{filter_records, CredentialStore, StoreError, ERROR_INVALID_DATA};
use crate::models::credential::{Credential, Persist};
use crate::models::credential_type::CredentialType;
use crate::util::fs as store_fs;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use tracing::debug;
use zeroize::{Zeroize, Zeroizing};

#[derive(Default, Serialize, Deserialize)]
struct StoreFile {
    #[serde(default, rename = "credential")]
    credentials: Vec<StoredCredential>,
}

#[derive(Serialize, Deserialize)]
struct StoredCredential {
    target_name: String,
    #[serde(rename = "type")]
    credential_type: CredentialType,
    user_name: String,
    /// Hex-encoded blob.
    secret: String,
    #[serde(default)]
    persist: Persist,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    last_written: Option<DateTime<Utc>>,
}

impl Drop for StoredCredential {
    fn drop(&mut self) {
        self.secret.zeroize();
    }
}

impl StoredCredential {
    fn from_credential(cred: &Credential, now: DateTime<Utc>) -> Self {
        Self {
            target_name: cred.target_name.clone(),
            credential_type: cred.credential_type,
            user_name: cred.user_name.clone(),
            secret: hex::encode(&cred.secret),
            persist: cred.persist,
            last_written: Some(now),
        }
    }

    fn to_credential(&self) -> Result<Credential, StoreError> {
        let secret = hex::decode(&self.secret).map_err(|e| {
            StoreError::other(
                ERROR_INVALID_DATA,
                format!("corrupt secret for {}: {}", self.target_name, e),
            )
        })?;
        Ok(Credential {
            target_name: self.target_name.clone(),
            credential_type: self.credential_type,
            user_name: self.user_name.clone(),
            secret: Zeroizing::new(secret),
            persist: self.persist,
            last_written: self.last_written,
        })
    }

    fn matches_key(&self, target_name: &str, credential_type: CredentialType) -> bool {
        self.credential_type == credential_type
            && self.target_name.eq_ignore_ascii_case(target_name)
    }
}

#[derive(Debug, Clone)]
pub struct FileCredentialStore {
    paths: StorePaths,
}

impl FileCredentialStore {
    pub fn new(paths: StorePaths) -> Self {
        Self { paths }
    }

    pub fn paths(&self) -> &StorePaths {
        &self.paths
    }

    fn lock_shared(&self) -> Result<Option<FileLock>, StoreError> {
        if !self.paths.root.is_dir() {
            return Ok(None);
        }
        FileLock::shared(&self.paths.store_lock)
            .map(Some)
            .map_err(|e| StoreError::from_io(&e, "acquire store lock"))
    }

    fn lock_exclusive(&self) -> Result<FileLock, StoreError> {
        store_fs::ensure_dir(&self.paths.root, constants::STORE_DIR_MODE)
            .map_err(|e| StoreError::from_io(&e, "create store directory"))?;
        FileLock::exclusive(&self.paths.store_lock)
            .map_err(|e| StoreError::from_io(&e, "acquire store lock"))
    }

    /// Load the store file; `None` when it has never been written.
    fn load(&self) -> Result<Option<StoreFile>, StoreError> {
        let path = &self.paths.store_file;
        if !path.exists() {
            return Ok(None);
        }
        let content = Zeroizing::new(
            fs::read_to_string(path).map_err(|e| StoreError::from_io(&e, "read credential store"))?,
        );
        let file: StoreFile = toml::from_str(&content).map_err(|e| {
            StoreError::other(
                ERROR_INVALID_DATA,
                format!("parse credential store {}: {}", path.display(), e),
            )
        })?;
        debug!(path = %path.display(), records = file.credentials.len(), "loaded store");
        Ok(Some(file))
    }

    fn save(&self, file: &StoreFile) -> Result<(), StoreError> {
        let content = Zeroizing::new(toml::to_string_pretty(file).map_err(|e| {
            StoreError::other(ERROR_INVALID_DATA, format!("serialize credential store: {}", e))
        })?);
        let mut tmp = tempfile::Builder::new()
            .prefix(".credstore-")
            .tempfile_in(&self.paths.root)
            .map_err(|e| StoreError::from_io(&e, "create temp store file"))?;
        store_fs::set_file_mode(tmp.path(), constants::STORE_FILE_MODE)
            .map_err(|e| StoreError::from_io(&e, "set permissions on temp store file"))?;
        tmp.write_all(content.as_bytes())
            .and_then(|_| tmp.flush())
            .map_err(|e| StoreError::from_io(&e, "write temp store file"))?;
        tmp.persist(&self.paths.store_file)
            .map_err(|e| StoreError::from_io(&e.error, "persist credential store"))?;
        debug!(path = %self.paths.store_file.display(), records = file.credentials.len(), "saved store");
        Ok(())
    }
}

impl CredentialStore for FileCredentialStore {
    fn enumerate(&self, filter: Option<&str>) -> Result<Vec<Credential>, StoreError> {
        let _lock = self.lock_shared()?;
        let file = self.load()?.ok_or(StoreError::NotFound)?;
        let creds = file
            .credentials
            .iter()
            .map(StoredCredential::to_credential)
            .collect::<Result<Vec<_>, _>>()?;
        filter_records(&creds, filter)
    }

    fn read(
        &self,
        target_name: &str,
        credential_type: CredentialType,
    ) -> Result<Credential, StoreError> {
        let _lock = self.lock_shared()?;
        let file = self.load()?.ok_or(StoreError::NotFound)?;
        file.credentials
            .iter()
            .find(|c| c.matches_key(target_name, credential_type))
            .ok_or(StoreError::NotFound)?
            .to_credential()
    }

    fn write(&self, credential: &Credential) -> Result<(), StoreError> {
        let _lock = self.lock_exclusive()?;
        let mut file = self.load()?.unwrap_or_default();
        let record = StoredCredential::from_credential(credential, Utc::now());
        match file
            .credentials
            .iter_mut()
            .find(|c| c.matches_key(&credential.target_name, credential.credential_type))
        {
            Some(existing) => *existing = record,
            None => file.credentials.push(record),
        }
        self.save(&file)
    }

    fn delete(
        &self,
        target_name: &str,
        credential_type: CredentialType,
    ) -> Result<(), StoreError> {
        if !self.paths.store_file.exists() {
            return Err(StoreError::NotFound);
        }
        let _lock = self.lock_exclusive()?;
        let mut file = self.load()?.ok_or(StoreError::NotFound)?;
        let before = file.credentials.len();
        file.credentials
            .retain(|c| !c.matches_key(target_name, credential_type));
        if file.credentials.len() == before {
            return Err(StoreError::NotFound);
        }
        self.save(&file)
    }
}
