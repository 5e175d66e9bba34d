//! Credential store boundary.
//!
//! The core only talks to a [`CredentialStore`]; providers decide where the
//! records live. Every credential handed back is an owned copy.

use crate::models::credential::Credential;
use crate::models::credential_type::CredentialType;
use glob::{MatchOptions, Pattern};
use thiserror::Error;

/// Platform code for a lookup miss.
pub const ERROR_NOT_FOUND: u32 = 0x490;
/// Platform code when no logon session exists.
pub const ERROR_NO_SUCH_LOGON_SESSION: u32 = 0x520;
/// Platform code for unsupported flags.
pub const ERROR_INVALID_FLAGS: u32 = 0x3ec;
/// Platform code for a corrupt record.
pub const ERROR_INVALID_DATA: u32 = 0xd;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("credential not found")]
    NotFound,

    #[error("no logon session")]
    NoLogonSession,

    #[error("invalid flags")]
    InvalidFlags,

    #[error("store error 0x{code:x}: {message}")]
    Other { code: u32, message: String },
}

impl StoreError {
    pub fn other(code: u32, message: impl Into<String>) -> Self {
        Self::Other {
            code,
            message: message.into(),
        }
    }

    pub fn from_io(err: &std::io::Error, context: &str) -> Self {
        let code = err
            .raw_os_error()
            .and_then(|c| u32::try_from(c).ok())
            .filter(|c| *c != 0)
            .unwrap_or(1);
        Self::other(code, format!("{}: {}", context, err))
    }

    /// Platform error code for this failure.
    pub fn code(&self) -> u32 {
        match self {
            StoreError::NotFound => ERROR_NOT_FOUND,
            StoreError::NoLogonSession => ERROR_NO_SUCH_LOGON_SESSION,
            StoreError::InvalidFlags => ERROR_INVALID_FLAGS,
            StoreError::Other { code, .. } => *code,
        }
    }
}

pub trait CredentialStore {
    /// All credentials, or those whose target name matches `filter`.
    /// An empty match may be reported as `NotFound`.
    fn enumerate(&self, filter: Option<&str>) -> Result<Vec<Credential>, StoreError>;

    fn read(&self, target_name: &str, credential_type: CredentialType)
        -> Result<Credential, StoreError>;

    /// Create or replace the credential keyed by its target name and type.
    fn write(&self, credential: &Credential) -> Result<(), StoreError>;

    fn delete(&self, target_name: &str, credential_type: CredentialType)
        -> Result<(), StoreError>;
}

/// Target name filter. A filter without wildcards matches as a prefix.
#[derive(Debug, Clone)]
pub struct TargetFilter {
    pattern: Pattern,
}

impl TargetFilter {
    pub fn new(filter: &str) -> Result<Self, StoreError> {
        let source = if filter.contains(['*', '?']) {
            let mut source = Pattern::escape(filter)
                .replace("[*]", "*")
                .replace("[?]", "?");
            // glob only accepts `**` as a whole path component
            while source.contains("**") {
                source = source.replace("**", "*");
            }
            source
        } else {
            format!("{}*", Pattern::escape(filter))
        };
        let pattern = Pattern::new(&source).map_err(|_| StoreError::InvalidFlags)?;
        Ok(Self { pattern })
    }

    pub fn matches(&self, target_name: &str) -> bool {
        self.pattern.matches_with(
            target_name,
            MatchOptions {
                case_sensitive: false,
                require_literal_separator: false,
                require_literal_leading_dot: false,
            },
        )
    }
}

/// Apply an optional filter to `records`, reporting an empty result as `NotFound`.
pub fn filter_records<'a, I>(records: I, filter: Option<&str>) -> Result<Vec<Credential>, StoreError>
where
    I: IntoIterator<Item = &'a Credential>,
{
    let filter = filter.map(TargetFilter::new).transpose()?;
    let found: Vec<Credential> = records
        .into_iter()
        .filter(|c| filter.as_ref().map_or(true, |f| f.matches(&c.target_name)))
        .cloned()
        .collect();
    if found.is_empty() {
        return Err(StoreError::NotFound);
    }
    Ok(found)
}
