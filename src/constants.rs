//! Centralized constants for store limits, paths, and permissions.

/// Maximum secret blob size in bytes (5 * 512).
pub const MAX_CREDENTIAL_BLOB_SIZE: usize = 5 * 512;

/// Maximum target name length for generic credentials, in UTF-16 units.
pub const MAX_GENERIC_TARGET_NAME_LENGTH: usize = 32_767;

/// Maximum target name length for domain credentials (dns name + '\' + netbios name).
pub const MAX_DOMAIN_TARGET_NAME_LENGTH: usize = 256 + 1 + 80;

/// User name recorded on every credential written by this tool.
pub const CREDS_USER_NAME: &str = "creds";

/// Program name used in usage and journald tags.
pub const PROGRAM_NAME: &str = "creds";

/// Overrides the store directory.
pub const STORE_DIR_ENV: &str = "CREDS_STORE_DIR";

/// Log filter directive (tracing `EnvFilter` syntax).
pub const LOG_ENV: &str = "CREDS_LOG";

/// Filter used when neither `CREDS_LOG` nor the config file set one.
pub const DEFAULT_LOG_FILTER: &str = "warn";

/// File holding every stored credential.
pub const STORE_FILE: &str = "credstore.toml";

/// Lock file guarding the store file.
pub const STORE_LOCK_FILE: &str = "credstore.lock";

/// Optional configuration file inside the store directory.
pub const CONFIG_FILE: &str = "creds.toml";

/// Permission mode for the store directory.
pub const STORE_DIR_MODE: u32 = 0o700;

/// Permission mode for the store file.
pub const STORE_FILE_MODE: u32 = 0o600;
