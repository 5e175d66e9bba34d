use crate::models::config::CredsConfig;
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

/// Load `creds.toml`; a missing file yields the defaults.
pub fn load(path: &Path) -> Result<CredsConfig> {
    if !path.exists() {
        return Ok(CredsConfig::default());
    }
    let content =
        fs::read_to_string(path).with_context(|| format!("read config {}", path.display()))?;
    toml::from_str(&content).with_context(|| format!("parse config {}", path.display()))
}

/// Load the config, keeping a warning instead of failing.
pub fn load_or_default(path: &Path) -> (CredsConfig, Option<String>) {
    match load(path) {
        Ok(cfg) => (cfg, None),
        Err(e) => (
            CredsConfig::default(),
            Some(format!("ignoring config: {:#}", e)),
        ),
    }
}
