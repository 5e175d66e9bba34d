//! Utility modules for filesystem, logging, and journald.

pub mod fs;
pub mod journald;
pub mod logging;
