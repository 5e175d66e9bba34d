//! Optional `creds.toml` configuration file model.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CredsConfig {
    #[serde(default)]
    pub log: LogSection,
    #[serde(default)]
    pub audit: AuditSection,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LogSection {
    /// `EnvFilter` directive used when `CREDS_LOG` is unset.
    #[serde(default)]
    pub filter: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuditSection {
    /// Forward add/delete audit lines to journald.
    #[serde(default)]
    pub journald_audit: bool,
}
