//! Core modules: codec, store boundary, providers.

pub mod config;
pub mod file_lock;
pub mod file_store;
pub mod hex;
pub mod memory_store;
pub mod paths;
pub mod store;
