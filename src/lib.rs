//! Per-user credential store CLI.
//!
//! Lists, shows, adds, and deletes named credentials. Secrets travel on the
//! command line as hex blobs; the store behind [`core::store::CredentialStore`]
//! owns all durable state.
//!
//! ## Modules
//! - `cli` — Option grammar and command dispatch
//! - `core` — Hex codec, store trait and providers, config loading
//! - `models` — Credential, credential types, config file
//! - `util` — Filesystem, logging, journald helpers

pub mod cli;
pub mod constants;
pub mod core;
pub mod error;
pub mod models;
pub mod util;
