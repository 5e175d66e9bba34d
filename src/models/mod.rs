//! Data structures.

pub mod config;
pub mod credential;
pub mod credential_type;
