//! Credential kinds known to the store and their display names.

use crate::constants;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
#[repr(u32)]
pub enum CredentialType {
    Undefined = 0,
    Generic = 1,
    DomainPassword = 2,
    DomainCertificate = 3,
    DomainVisiblePassword = 4,
    GenericCertificate = 5,
    DomainExtended = 6,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UnknownType {
    #[error("unknown credential type index {0}")]
    Index(u32),
    #[error("Unknown credential type {0}")]
    Name(String),
}

/// Name table, indexed by the numeric type value.
static NAMES: [(CredentialType, &str); 7] = [
    (CredentialType::Undefined, "Undefined"),
    (CredentialType::Generic, "Generic"),
    (CredentialType::DomainPassword, "DomainPassword"),
    (CredentialType::DomainCertificate, "DomainCertificate"),
    (CredentialType::DomainVisiblePassword, "DomainVisiblePassword"),
    (CredentialType::GenericCertificate, "GenericCertificate"),
    (CredentialType::DomainExtended, "DomainExtended"),
];

impl CredentialType {
    pub fn name(self) -> &'static str {
        NAMES[self as usize].1
    }

    pub fn index(self) -> u32 {
        self as u32
    }

    pub fn from_index(index: u32) -> Result<Self, UnknownType> {
        NAMES
            .get(index as usize)
            .map(|(t, _)| *t)
            .ok_or(UnknownType::Index(index))
    }

    /// Resolve a user-supplied name. `Undefined` is display-only and never matches.
    pub fn from_name(name: &str) -> Result<Self, UnknownType> {
        Self::selectable()
            .find(|t| t.name().eq_ignore_ascii_case(name))
            .ok_or_else(|| UnknownType::Name(name.to_string()))
    }

    /// Types a caller may select, in index order.
    pub fn selectable() -> impl Iterator<Item = CredentialType> {
        NAMES.iter().skip(1).map(|(t, _)| *t)
    }

    pub fn max_target_length(self) -> usize {
        match self {
            CredentialType::Generic => constants::MAX_GENERIC_TARGET_NAME_LENGTH,
            _ => constants::MAX_DOMAIN_TARGET_NAME_LENGTH,
        }
    }
}

/// Name for a raw type index.
pub fn name_of(index: u32) -> Result<&'static str, UnknownType> {
    CredentialType::from_index(index).map(CredentialType::name)
}

/// Type for a case-insensitive name.
pub fn type_of(name: &str) -> Result<CredentialType, UnknownType> {
    CredentialType::from_name(name)
}

impl fmt::Display for CredentialType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl TryFrom<u32> for CredentialType {
    type Error = UnknownType;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::from_index(value)
    }
}

impl From<CredentialType> for u32 {
    fn from(value: CredentialType) -> Self {
        value.index()
    }
}
