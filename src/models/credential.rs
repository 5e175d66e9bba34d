use crate::models::credential_type::CredentialType;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use zeroize::Zeroizing;

/// Where the store keeps a credential. `creds` itself only writes
/// `LocalMachine`; `Session` records written by other tools are kept as-is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Persist {
    Session,
    #[default]
    LocalMachine,
}

/// A credential record. Copies are owned by the caller for one operation.
#[derive(Clone)]
pub struct Credential {
    pub target_name: String,
    pub credential_type: CredentialType,
    pub user_name: String,
    pub secret: Zeroizing<Vec<u8>>,
    pub persist: Persist,
    pub last_written: Option<DateTime<Utc>>,
}

impl Credential {
    pub fn new(
        target_name: impl Into<String>,
        credential_type: CredentialType,
        user_name: impl Into<String>,
        secret: Vec<u8>,
    ) -> Self {
        Self {
            target_name: target_name.into(),
            credential_type,
            user_name: user_name.into(),
            secret: Zeroizing::new(secret),
            persist: Persist::LocalMachine,
            last_written: None,
        }
    }

    /// Whether this credential is stored under (`target_name`, `credential_type`).
    pub fn matches_key(&self, target_name: &str, credential_type: CredentialType) -> bool {
        self.credential_type == credential_type
            && self.target_name.eq_ignore_ascii_case(target_name)
    }
}

// Never print the secret.
impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("target_name", &self.target_name)
            .field("credential_type", &self.credential_type)
            .field("user_name", &self.user_name)
            .field("secret_len", &self.secret.len())
            .field("persist", &self.persist)
            .field("last_written", &self.last_written)
            .finish()
    }
}
