use crate::core::store::{filter_records, CredentialStore, StoreError};
use crate::models::credential::Credential;
use crate::models::credential_type::CredentialType;
use chrono::Utc;
use std::cell::RefCell;

/// Process-local store, used in tests.
#[derive(Default)]
pub struct InMemoryCredentialStore {
    records: RefCell<Vec<Credential>>,
    fail_delete: RefCell<Option<(String, StoreError)>>,
    writes: RefCell<usize>,
}

impl InMemoryCredentialStore {
    pub fn with_records(records: Vec<Credential>) -> Self {
        Self {
            records: RefCell::new(records),
            ..Default::default()
        }
    }

    /// Make the next delete of `target_name` fail with `err`.
    pub fn fail_delete_of(&self, target_name: &str, err: StoreError) {
        *self.fail_delete.borrow_mut() = Some((target_name.to_string(), err));
    }

    pub fn target_names(&self) -> Vec<String> {
        self.records
            .borrow()
            .iter()
            .map(|c| c.target_name.clone())
            .collect()
    }

    pub fn write_count(&self) -> usize {
        *self.writes.borrow()
    }
}

impl CredentialStore for InMemoryCredentialStore {
    fn enumerate(&self, filter: Option<&str>) -> Result<Vec<Credential>, StoreError> {
        filter_records(self.records.borrow().iter(), filter)
    }

    fn read(
        &self,
        target_name: &str,
        credential_type: CredentialType,
    ) -> Result<Credential, StoreError> {
        self.records
            .borrow()
            .iter()
            .find(|c| c.matches_key(target_name, credential_type))
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    fn write(&self, credential: &Credential) -> Result<(), StoreError> {
        *self.writes.borrow_mut() += 1;
        let mut stored = credential.clone();
        stored.last_written = Some(Utc::now());
        let mut records = self.records.borrow_mut();
        match records
            .iter_mut()
            .find(|c| c.matches_key(&credential.target_name, credential.credential_type))
        {
            Some(existing) => *existing = stored,
            None => records.push(stored),
        }
        Ok(())
    }

    fn delete(
        &self,
        target_name: &str,
        credential_type: CredentialType,
    ) -> Result<(), StoreError> {
        {
            let mut fail = self.fail_delete.borrow_mut();
            if fail
                .as_ref()
                .is_some_and(|(name, _)| name.eq_ignore_ascii_case(target_name))
            {
                if let Some((_, err)) = fail.take() {
                    return Err(err);
                }
            }
        }
        let mut records = self.records.borrow_mut();
        let before = records.len();
        records.retain(|c| !c.matches_key(target_name, credential_type));
        if records.len() == before {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }
}
