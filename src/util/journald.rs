//! Optional journald audit of store mutations, sent through `systemd-cat`.
//!
//! Best-effort: failure to forward must not fail the operation.

use crate::constants;
use crate::models::credential_type::CredentialType;
use std::io::Write;
use std::process::{Command, Stdio};
use tracing::debug;

/// JSON audit record for a store mutation. Never includes the secret.
fn audit_line(action: &str, target_name: &str, credential_type: CredentialType) -> String {
    serde_json::json!({
        "action": action,
        "target": target_name,
        "type": credential_type.name(),
    })
    .to_string()
}

/// Send one audit record to journald, tagged with the program name.
pub fn forward_audit(action: &str, target_name: &str, credential_type: CredentialType) {
    let line = audit_line(action, target_name, credential_type);
    let spawned = Command::new("systemd-cat")
        .args(["-t", constants::PROGRAM_NAME])
        .stdin(Stdio::piped())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn();
    let mut child = match spawned {
        Ok(child) => child,
        Err(e) => {
            debug!(error = %e, action, "journald audit skipped");
            return;
        }
    };
    if let Some(mut stdin) = child.stdin.take() {
        if let Err(e) = writeln!(stdin, "{}", line) {
            debug!(error = %e, action, "journald audit write failed");
        }
    }
    if let Err(e) = child.wait() {
        debug!(error = %e, "systemd-cat did not exit cleanly");
    }
}
