//! Store directory resolution.

use crate::constants;
use anyhow::{bail, Result};
use std::env;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct StorePaths {
    pub root: PathBuf,
    pub store_file: PathBuf,
    pub store_lock: PathBuf,
    pub config: PathBuf,
}

impl StorePaths {
    /// Resolve the per-user store directory from `CREDS_STORE_DIR`, then XDG, then `$HOME`.
    pub fn resolve() -> Result<Self> {
        Self::resolve_from(|key| env::var(key).ok().filter(|v| !v.is_empty()))
    }

    fn resolve_from(var: impl Fn(&str) -> Option<String>) -> Result<Self> {
        if let Some(dir) = var(constants::STORE_DIR_ENV) {
            return Ok(Self::from_root(PathBuf::from(dir)));
        }
        if let Some(data) = var("XDG_DATA_HOME") {
            return Ok(Self::from_root(
                PathBuf::from(data).join(constants::PROGRAM_NAME),
            ));
        }
        if let Some(home) = var("HOME") {
            return Ok(Self::from_root(
                PathBuf::from(home)
                    .join(".local/share")
                    .join(constants::PROGRAM_NAME),
            ));
        }
        bail!(
            "cannot locate credential store: set {} or HOME",
            constants::STORE_DIR_ENV
        );
    }

    pub fn from_root(root: PathBuf) -> Self {
        let store_file = root.join(constants::STORE_FILE);
        let store_lock = root.join(constants::STORE_LOCK_FILE);
        let config = root.join(constants::CONFIG_FILE);
        Self {
            root,
            store_file,
            store_lock,
            config,
        }
    }
}

impl std::fmt::Display for StorePaths {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "credstore@{}", self.root.display())
    }
}
