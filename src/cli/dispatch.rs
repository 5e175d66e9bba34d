//! Runs a parsed request against a credential store.

use crate::cli::options::{Command, CommandRequest};
use crate::constants;
use crate::core::hex;
use crate::core::store::{CredentialStore, StoreError};
use crate::error::CredsError;
use crate::models::credential::{Credential, Persist};
use crate::models::credential_type::CredentialType;
use crate::util::journald;
use std::io::Write;
use tracing::{debug, info};

pub struct CommandDispatcher<'a, S: ?Sized, W> {
    store: &'a S,
    out: W,
    journald_audit: bool,
}

impl<'a, S, W> CommandDispatcher<'a, S, W>
where
    S: CredentialStore + ?Sized,
    W: Write,
{
    pub fn new(store: &'a S, out: W) -> Self {
        Self {
            store,
            out,
            journald_audit: false,
        }
    }

    pub fn with_journald_audit(mut self, enabled: bool) -> Self {
        self.journald_audit = enabled;
        self
    }

    pub fn into_output(self) -> W {
        self.out
    }

    pub fn dispatch(&mut self, request: &CommandRequest) -> Result<(), CredsError> {
        debug!(command = ?request.command, "dispatch");
        let result = match request.command {
            Command::List => self.list(),
            Command::Show => self.show(request),
            Command::Add => self.add(request),
            Command::Delete => self.delete(request),
        };
        self.out.flush()?;
        result
    }

    /// Print every credential without its secret.
    fn list(&mut self) -> Result<(), CredsError> {
        for cred in self.enumerate(None)? {
            write_credential(&mut self.out, &cred, false)?;
        }
        Ok(())
    }

    fn show(&mut self, request: &CommandRequest) -> Result<(), CredsError> {
        let credential_type = check_filter_and_type(request)?;
        let target = required_target(request)?;

        if request.use_filter {
            for cred in self.enumerate(Some(target))? {
                write_credential(&mut self.out, &cred, true)?;
            }
            return Ok(());
        }

        check_target_length(target, credential_type)?;
        let cred = self
            .store
            .read(target, credential_type)
            .map_err(read_error)?;
        write_credential(&mut self.out, &cred, true)?;
        Ok(())
    }

    fn add(&mut self, request: &CommandRequest) -> Result<(), CredsError> {
        if request.use_filter {
            return Err(CredsError::InvalidCombination(
                "Cannot use -g switch when adding credential",
            ));
        }
        let secret_hex = request
            .secret_hex
            .as_deref()
            .ok_or_else(|| CredsError::usage("Must specify password using -p switch"))?;
        hex::validate(secret_hex)?;

        let credential_type = request.effective_type();
        let target = required_target(request)?;
        check_target_length(target, credential_type)?;

        let mut credential = Credential::new(
            target,
            credential_type,
            constants::CREDS_USER_NAME,
            hex::decode(secret_hex)?,
        );
        credential.persist = Persist::LocalMachine;

        if credential.secret.len() > constants::MAX_CREDENTIAL_BLOB_SIZE {
            return Err(CredsError::SizeLimitExceeded(format!(
                "Password is too long, must be no more than {} bytes",
                constants::MAX_CREDENTIAL_BLOB_SIZE
            )));
        }

        self.store.write(&credential).map_err(|e| {
            let message = format!("Error writing to credential store, error code 0x{:x}", e.code());
            CredsError::store(e, message)
        })?;
        self.audit("add", target, credential_type);
        Ok(())
    }

    fn delete(&mut self, request: &CommandRequest) -> Result<(), CredsError> {
        let credential_type = check_filter_and_type(request)?;
        let target = required_target(request)?;

        if request.use_filter {
            // stop at the first failure; earlier deletions stay done
            for cred in self.enumerate(Some(target))? {
                self.delete_one(&cred.target_name, cred.credential_type)?;
            }
            return Ok(());
        }

        check_target_length(target, credential_type)?;
        self.delete_one(target, credential_type)
    }

    fn delete_one(
        &mut self,
        target: &str,
        credential_type: CredentialType,
    ) -> Result<(), CredsError> {
        debug!(target_name = target, credential_type = %credential_type, "delete");
        self.store.delete(target, credential_type).map_err(|e| {
            let message = match &e {
                StoreError::NotFound => format!(
                    "The credential target name {} with type {} was not found",
                    target, credential_type
                ),
                other => format!("Unable to delete credential, error code 0x{:x}", other.code()),
            };
            CredsError::store(e, message)
        })?;
        self.audit("delete", target, credential_type);
        Ok(())
    }

    /// Enumerate, treating `NotFound` as an empty result.
    fn enumerate(&self, filter: Option<&str>) -> Result<Vec<Credential>, CredsError> {
        match self.store.enumerate(filter) {
            Ok(creds) => {
                debug!(filter, found = creds.len(), "enumerated");
                Ok(creds)
            }
            Err(StoreError::NotFound) => {
                debug!(filter, "no matching credentials");
                Ok(Vec::new())
            }
            Err(e) => {
                let message = format!(
                    "Could not enumerate credentials in store, error code 0x{:x}",
                    e.code()
                );
                Err(CredsError::store(e, message))
            }
        }
    }

    fn audit(&self, action: &str, target: &str, credential_type: CredentialType) {
        info!(action, target_name = target, credential_type = %credential_type, "credential store updated");
        if self.journald_audit {
            journald::forward_audit(action, target, credential_type);
        }
    }
}

/// Reject `-g` with `-y`, then apply the default type.
fn check_filter_and_type(request: &CommandRequest) -> Result<CredentialType, CredsError> {
    if request.use_filter && request.credential_type.is_some() {
        return Err(CredsError::InvalidCombination(
            "Cannot specify -g and -y switches together",
        ));
    }
    Ok(request.effective_type())
}

fn required_target(request: &CommandRequest) -> Result<&str, CredsError> {
    request
        .target_name
        .as_deref()
        .ok_or_else(|| CredsError::usage("Must specify TargetName parameter (-t switch)"))
}

/// Target names are measured in UTF-16 units, as the store counts them.
fn check_target_length(target: &str, credential_type: CredentialType) -> Result<(), CredsError> {
    let len = target.encode_utf16().count();
    let max = credential_type.max_target_length();
    if len > max {
        return Err(CredsError::SizeLimitExceeded(format!(
            "Target name is too long, target is {} characters, max is {}",
            len, max
        )));
    }
    Ok(())
}

fn read_error(e: StoreError) -> CredsError {
    let message = match &e {
        StoreError::NotFound => "Credential not found".to_string(),
        StoreError::NoLogonSession => "No login session".to_string(),
        StoreError::InvalidFlags => "INVALID FLAGS".to_string(),
        StoreError::Other { code, .. } => format!("Unexpected error code 0x{:x}", code),
    };
    CredsError::store(e, message)
}

/// Write one record followed by a blank line.
pub fn write_credential<W: Write>(
    out: &mut W,
    cred: &Credential,
    include_secret: bool,
) -> std::io::Result<()> {
    writeln!(out, "Target Name: {}", cred.target_name)?;
    writeln!(out, "Type: {}", cred.credential_type)?;
    writeln!(out, "User Name: {}", cred.user_name)?;
    if include_secret {
        writeln!(out, "Credential: {}", hex::encode(&cred.secret))?;
    }
    writeln!(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::memory_store::InMemoryCredentialStore;

    fn request(command: Command, target: Option<&str>) -> CommandRequest {
        CommandRequest {
            command,
            credential_type: None,
            target_name: target.map(str::to_string),
            secret_hex: None,
            use_filter: false,
        }
    }

    fn add_request(target: &str, hex: &str) -> CommandRequest {
        CommandRequest {
            secret_hex: Some(hex.to_string()),
            ..request(Command::Add, Some(target))
        }
    }

    fn run(store: &InMemoryCredentialStore, req: &CommandRequest) -> (Result<(), CredsError>, String) {
        let mut dispatcher = CommandDispatcher::new(store, Vec::new());
        let result = dispatcher.dispatch(req);
        let out = String::from_utf8(dispatcher.into_output()).unwrap();
        (result, out)
    }

    fn cred(name: &str, t: CredentialType, secret: &[u8]) -> Credential {
        Credential::new(name, t, "creds", secret.to_vec())
    }

    #[test]
    fn test_list_prints_without_secret() {
        let store = InMemoryCredentialStore::with_records(vec![
            cred("a", CredentialType::Generic, &[0x41]),
            cred("b", CredentialType::DomainPassword, &[0x42]),
        ]);
        let (result, out) = run(&store, &request(Command::List, None));
        result.unwrap();
        assert_eq!(
            out,
            "Target Name: a\nType: Generic\nUser Name: creds\n\n\
             Target Name: b\nType: DomainPassword\nUser Name: creds\n\n"
        );
    }

    #[test]
    fn test_list_empty_store_succeeds() {
        let store = InMemoryCredentialStore::default();
        let (result, out) = run(&store, &request(Command::List, None));
        result.unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn test_add_then_show() {
        let store = InMemoryCredentialStore::default();
        run(&store, &add_request("foo", "41")).0.unwrap();

        let stored = store.read("foo", CredentialType::Generic).unwrap();
        assert_eq!(stored.user_name, "creds");
        assert_eq!(*stored.secret, vec![0x41]);
        assert_eq!(stored.persist, Persist::LocalMachine);

        let (result, out) = run(&store, &request(Command::Show, Some("foo")));
        result.unwrap();
        assert_eq!(
            out,
            "Target Name: foo\nType: Generic\nUser Name: creds\nCredential: 41\n\n"
        );
    }

    #[test]
    fn test_add_lowercases_secret_on_show() {
        let store = InMemoryCredentialStore::default();
        run(&store, &add_request("foo", "ABcd")).0.unwrap();
        let (_, out) = run(&store, &request(Command::Show, Some("foo")));
        assert!(out.contains("Credential: abcd\n"));
    }

    #[test]
    fn test_add_with_filter_rejected_without_write() {
        let store = InMemoryCredentialStore::default();
        let req = CommandRequest {
            use_filter: true,
            ..add_request("foo", "41")
        };
        let err = run(&store, &req).0.unwrap_err();
        assert!(matches!(err, CredsError::InvalidCombination(_)));
        assert_eq!(err.exit_code(), 1);
        assert_eq!(store.write_count(), 0);
    }

    #[test]
    fn test_add_requires_secret() {
        let store = InMemoryCredentialStore::default();
        let err = run(&store, &request(Command::Add, Some("foo"))).0.unwrap_err();
        assert_eq!(err.to_string(), "Must specify password using -p switch");
        assert_eq!(store.write_count(), 0);
    }

    #[test]
    fn test_add_rejects_bad_hex() {
        let store = InMemoryCredentialStore::default();
        let err = run(&store, &add_request("foo", "4g")).0.unwrap_err();
        assert!(matches!(err, CredsError::Encoding(_)));
        let err = run(&store, &add_request("foo", "414")).0.unwrap_err();
        assert!(matches!(err, CredsError::Encoding(_)));
        assert_eq!(store.write_count(), 0);
    }

    #[test]
    fn test_add_empty_secret_allowed() {
        let store = InMemoryCredentialStore::default();
        run(&store, &add_request("foo", "")).0.unwrap();
        assert!(store.read("foo", CredentialType::Generic).unwrap().secret.is_empty());
    }

    #[test]
    fn test_add_blob_size_limit() {
        let store = InMemoryCredentialStore::default();
        let max = "ab".repeat(constants::MAX_CREDENTIAL_BLOB_SIZE);
        run(&store, &add_request("ok", &max)).0.unwrap();

        let over = "ab".repeat(constants::MAX_CREDENTIAL_BLOB_SIZE + 1);
        let err = run(&store, &add_request("big", &over)).0.unwrap_err();
        assert!(matches!(err, CredsError::SizeLimitExceeded(_)));
        assert_eq!(err.to_string(), "Password is too long, must be no more than 2560 bytes");
        assert_eq!(store.write_count(), 1);
    }

    #[test]
    fn test_target_length_limits_by_type() {
        let store = InMemoryCredentialStore::default();
        let generic_over = "x".repeat(constants::MAX_GENERIC_TARGET_NAME_LENGTH + 1);
        let err = run(&store, &add_request(&generic_over, "41")).0.unwrap_err();
        assert!(matches!(err, CredsError::SizeLimitExceeded(_)));

        let domain_over = "x".repeat(constants::MAX_DOMAIN_TARGET_NAME_LENGTH + 1);
        run(&store, &add_request(&domain_over, "41")).0.unwrap();
        let req = CommandRequest {
            credential_type: Some(CredentialType::DomainPassword),
            ..add_request(&domain_over, "41")
        };
        let err = run(&store, &req).0.unwrap_err();
        assert_eq!(
            err.to_string(),
            "Target name is too long, target is 338 characters, max is 337"
        );
        assert_eq!(store.write_count(), 1);
    }

    #[test]
    fn test_show_missing_is_store_not_found() {
        let store = InMemoryCredentialStore::default();
        let err = run(&store, &request(Command::Show, Some("nope"))).0.unwrap_err();
        assert!(matches!(err, CredsError::StoreNotFound { .. }));
        assert_eq!(err.to_string(), "Credential not found");
        assert_eq!(err.code(), 0x490);
    }

    #[test]
    fn test_show_with_filter_prints_all_matches() {
        let store = InMemoryCredentialStore::with_records(vec![
            cred("foo1", CredentialType::Generic, &[1]),
            cred("bar", CredentialType::Generic, &[2]),
            cred("foo2", CredentialType::DomainPassword, &[3]),
        ]);
        let req = CommandRequest {
            use_filter: true,
            ..request(Command::Show, Some("foo"))
        };
        let (result, out) = run(&store, &req);
        result.unwrap();
        assert!(out.contains("Target Name: foo1\nType: Generic\nUser Name: creds\nCredential: 01\n\n"));
        assert!(out.contains("Target Name: foo2\nType: DomainPassword\nUser Name: creds\nCredential: 03\n\n"));
        assert!(!out.contains("bar"));
    }

    #[test]
    fn test_show_with_filter_no_match_succeeds() {
        let store = InMemoryCredentialStore::default();
        let req = CommandRequest {
            use_filter: true,
            ..request(Command::Show, Some("foo"))
        };
        let (result, out) = run(&store, &req);
        result.unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn test_filter_with_type_rejected() {
        let store = InMemoryCredentialStore::with_records(vec![cred("foo", CredentialType::Generic, &[1])]);
        for command in [Command::Show, Command::Delete] {
            let req = CommandRequest {
                use_filter: true,
                credential_type: Some(CredentialType::Generic),
                ..request(command, Some("foo"))
            };
            let err = run(&store, &req).0.unwrap_err();
            assert_eq!(err.to_string(), "Cannot specify -g and -y switches together");
            assert_eq!(err.exit_code(), 1);
        }
        assert_eq!(store.target_names(), vec!["foo"]);
    }

    #[test]
    fn test_delete_by_key() {
        let store = InMemoryCredentialStore::with_records(vec![
            cred("foo", CredentialType::Generic, &[1]),
            cred("foo", CredentialType::DomainPassword, &[2]),
        ]);
        let req = CommandRequest {
            credential_type: Some(CredentialType::DomainPassword),
            ..request(Command::Delete, Some("foo"))
        };
        run(&store, &req).0.unwrap();
        assert!(store.read("foo", CredentialType::Generic).is_ok());
        assert!(store.read("foo", CredentialType::DomainPassword).is_err());
    }

    #[test]
    fn test_delete_missing_reports_target_and_type() {
        let store = InMemoryCredentialStore::default();
        let err = run(&store, &request(Command::Delete, Some("nope"))).0.unwrap_err();
        assert_eq!(
            err.to_string(),
            "The credential target name nope with type Generic was not found"
        );
        assert_eq!(err.exit_code(), 0x90);
    }

    #[test]
    fn test_delete_with_filter_deletes_each_by_own_key() {
        let store = InMemoryCredentialStore::with_records(vec![
            cred("foo1", CredentialType::Generic, &[1]),
            cred("foo2", CredentialType::DomainPassword, &[2]),
            cred("bar", CredentialType::Generic, &[3]),
        ]);
        let req = CommandRequest {
            use_filter: true,
            ..request(Command::Delete, Some("foo"))
        };
        run(&store, &req).0.unwrap();
        assert_eq!(store.target_names(), vec!["bar"]);
    }

    #[test]
    fn test_delete_with_filter_stops_at_first_failure() {
        let store = InMemoryCredentialStore::with_records(vec![
            cred("foo1", CredentialType::Generic, &[1]),
            cred("foo2", CredentialType::Generic, &[2]),
            cred("foo3", CredentialType::Generic, &[3]),
        ]);
        store.fail_delete_of("foo2", StoreError::other(0x5, "access denied"));
        let req = CommandRequest {
            use_filter: true,
            ..request(Command::Delete, Some("foo"))
        };
        let err = run(&store, &req).0.unwrap_err();
        assert_eq!(err.to_string(), "Unable to delete credential, error code 0x5");
        assert_eq!(err.exit_code(), 5);
        assert_eq!(store.target_names(), vec!["foo2", "foo3"]);
    }

    struct BrokenStore(StoreError);

    impl CredentialStore for BrokenStore {
        fn enumerate(&self, _: Option<&str>) -> Result<Vec<Credential>, StoreError> {
            Err(self.0.clone())
        }
        fn read(&self, _: &str, _: CredentialType) -> Result<Credential, StoreError> {
            Err(self.0.clone())
        }
        fn write(&self, _: &Credential) -> Result<(), StoreError> {
            Err(self.0.clone())
        }
        fn delete(&self, _: &str, _: CredentialType) -> Result<(), StoreError> {
            Err(self.0.clone())
        }
    }

    fn run_broken(err: StoreError, req: &CommandRequest) -> CredsError {
        let store = BrokenStore(err);
        let mut dispatcher = CommandDispatcher::new(&store, Vec::new());
        dispatcher.dispatch(req).unwrap_err()
    }

    #[test]
    fn test_enumerate_error_propagates() {
        let err = run_broken(StoreError::other(0x1f, "device"), &request(Command::List, None));
        assert_eq!(err.to_string(), "Could not enumerate credentials in store, error code 0x1f");
        assert_eq!(err.exit_code(), 0x1f);
    }

    #[test]
    fn test_read_error_messages() {
        let show = request(Command::Show, Some("x"));
        assert_eq!(run_broken(StoreError::NoLogonSession, &show).to_string(), "No login session");
        assert_eq!(run_broken(StoreError::InvalidFlags, &show).to_string(), "INVALID FLAGS");
        assert_eq!(
            run_broken(StoreError::other(0x57, "bad"), &show).to_string(),
            "Unexpected error code 0x57"
        );
    }

    #[test]
    fn test_show_and_delete_check_length_before_store() {
        let over = "x".repeat(constants::MAX_DOMAIN_TARGET_NAME_LENGTH + 1);
        for command in [Command::Show, Command::Delete] {
            let req = CommandRequest {
                credential_type: Some(CredentialType::DomainPassword),
                ..request(command, Some(over.as_str()))
            };
            // any store call would surface the store's own error instead
            let err = run_broken(StoreError::other(0x1f, "device"), &req);
            assert!(matches!(err, CredsError::SizeLimitExceeded(_)), "{:?}", command);
            assert_eq!(
                err.to_string(),
                "Target name is too long, target is 338 characters, max is 337"
            );
            assert_eq!(err.exit_code(), 1);
        }
    }

    #[test]
    fn test_target_at_domain_limit_accepted() {
        let store = InMemoryCredentialStore::default();
        let max = "x".repeat(constants::MAX_DOMAIN_TARGET_NAME_LENGTH);
        let typed = |command| CommandRequest {
            credential_type: Some(CredentialType::DomainPassword),
            ..request(command, Some(max.as_str()))
        };

        let err = run(&store, &typed(Command::Show)).0.unwrap_err();
        assert!(matches!(err, CredsError::StoreNotFound { .. }));

        let add = CommandRequest {
            credential_type: Some(CredentialType::DomainPassword),
            ..add_request(&max, "41")
        };
        run(&store, &add).0.unwrap();
        let (result, out) = run(&store, &typed(Command::Show));
        result.unwrap();
        assert!(out.ends_with("Credential: 41\n\n"));

        run(&store, &typed(Command::Delete)).0.unwrap();
        assert!(store.target_names().is_empty());
    }

    #[test]
    fn test_write_error_code_propagates() {
        let err = run_broken(StoreError::other(0x70, "disk full"), &add_request("x", "41"));
        assert_eq!(err.to_string(), "Error writing to credential store, error code 0x70");
        assert_eq!(err.exit_code(), 0x70);
    }
}
