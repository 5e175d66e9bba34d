//! Errors surfaced to the user, one stderr line each.

use crate::core::hex::HexError;
use crate::core::store::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CredsError {
    /// Bad, duplicate or conflicting flags, or a missing argument.
    #[error("{0}")]
    Usage(String),

    #[error("{0}")]
    InvalidCombination(&'static str),

    #[error(transparent)]
    Encoding(#[from] HexError),

    #[error("{0}")]
    SizeLimitExceeded(String),

    /// Lookup or delete miss, reported with operation-specific wording.
    #[error("{message}")]
    StoreNotFound { message: String },

    #[error("{message}")]
    Store { message: String, source: StoreError },

    #[error("write output: {0}")]
    Output(#[from] std::io::Error),
}

impl CredsError {
    pub fn usage(msg: impl Into<String>) -> Self {
        Self::Usage(msg.into())
    }

    /// Wrap a store failure, keeping `NotFound` distinct.
    pub fn store(source: StoreError, message: impl Into<String>) -> Self {
        match source {
            StoreError::NotFound => Self::StoreNotFound {
                message: message.into(),
            },
            source => Self::Store {
                message: message.into(),
                source,
            },
        }
    }

    /// Platform-level code: 1 for validation failures, the store code otherwise.
    pub fn code(&self) -> u32 {
        match self {
            CredsError::Usage(_)
            | CredsError::InvalidCombination(_)
            | CredsError::Encoding(_)
            | CredsError::SizeLimitExceeded(_)
            | CredsError::Output(_) => 1,
            CredsError::StoreNotFound { .. } => StoreError::NotFound.code(),
            CredsError::Store { source, .. } => source.code(),
        }
    }

    /// Process exit status: the low byte of `code()`, never zero.
    pub fn exit_code(&self) -> u8 {
        exit_status(self.code())
    }
}

pub fn exit_status(code: u32) -> u8 {
    match (code & 0xff) as u8 {
        0 => 1,
        low => low,
    }
}
