use std::collections::HashMap;
use std::sync::Mutex;

use super::{StorageError, UserRecord, UserRepository};

/// Process-local user store. Nothing survives a restart.
#[derive(Default)]
pub struct MemoryRepository {
    users: Mutex<HashMap<String, UserRecord>>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn users(&self) -> std::sync::MutexGuard<'_, HashMap<String, UserRecord>> {
        self.users
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl UserRepository for MemoryRepository {
    fn get(&self, username: &str) -> Result<Option<UserRecord>, StorageError> {
        Ok(self.users().get(username).cloned())
    }

    fn insert(&self, record: UserRecord) -> Result<(), StorageError> {
        let mut users = self.users();
        if users.contains_key(&record.username) {
            return Err(StorageError::AlreadyExists(record.username));
        }
        users.insert(record.username.clone(), record);
        Ok(())
    }

    fn update(&self, record: UserRecord) -> Result<(), StorageError> {
        match self.users().get_mut(&record.username) {
            Some(existing) => {
                *existing = record;
                Ok(())
            }
            None => Err(StorageError::NotFound(record.username)),
        }
    }
}
