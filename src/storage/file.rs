use atomic_write_file::AtomicWriteFile;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use super::{StorageError, UserRecord, UserRepository};

/// Get the default user store path (~/.config/path-finder/users.json)
pub fn get_users_path() -> PathBuf {
    crate::config::get_config_dir().join("users.json")
}

/// Username -> record. Usernames live only in the keys.
type UserStore = BTreeMap<String, UserRecord>;

/// All users in one JSON object keyed by username, rewritten atomically on every change.
pub struct JsonFileRepository {
    path: PathBuf,
    // Serializes read-modify-write cycles within this process
    lock: Mutex<()>,
}

impl JsonFileRepository {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> StorageError {
        StorageError::Io {
            path: self.path.clone(),
            source,
        }
    }

    /// Load the store. A missing file is an empty store.
    fn load(&self) -> Result<UserStore, StorageError> {
        if !self.path.exists() {
            return Ok(UserStore::new());
        }

        let file = File::open(&self.path).map_err(|e| self.io_error(e))?;
        let mut store: UserStore =
            serde_json::from_reader(file).map_err(|source| StorageError::Corrupt {
                path: self.path.clone(),
                source,
            })?;

        for (username, record) in store.iter_mut() {
            record.username = username.clone();
        }
        Ok(store)
    }

    fn save(&self, store: &UserStore) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;
        }

        let mut file = AtomicWriteFile::open(&self.path).map_err(|e| self.io_error(e))?;
        serde_json::to_writer_pretty(&mut file, store).map_err(|source| StorageError::Corrupt {
            path: self.path.clone(),
            source,
        })?;
        file.write_all(b"\n").map_err(|e| self.io_error(e))?;
        file.commit().map_err(|e| self.io_error(e))?;

        tracing::trace!(path = %self.path.display(), users = store.len(), "saved user store");
        Ok(())
    }

    fn modify<F>(&self, f: F) -> Result<(), StorageError>
    where
        F: FnOnce(&mut UserStore) -> Result<(), StorageError>,
    {
        let _guard = self.lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let mut store = self.load()?;
        f(&mut store)?;
        self.save(&store)
    }
}

impl UserRepository for JsonFileRepository {
    fn get(&self, username: &str) -> Result<Option<UserRecord>, StorageError> {
        let _guard = self.lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        Ok(self.load()?.remove(username))
    }

    fn insert(&self, record: UserRecord) -> Result<(), StorageError> {
        self.modify(|store| {
            if store.contains_key(&record.username) {
                return Err(StorageError::AlreadyExists(record.username));
            }
            store.insert(record.username.clone(), record);
            Ok(())
        })
    }

    fn update(&self, record: UserRecord) -> Result<(), StorageError> {
        self.modify(|store| match store.get_mut(&record.username) {
            Some(existing) => {
                *existing = record;
                Ok(())
            }
            None => Err(StorageError::NotFound(record.username)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quiz::Answer;

    fn repo_in(dir: &tempfile::TempDir) -> JsonFileRepository {
        JsonFileRepository::new(dir.path().join("data").join("users.json"))
    }

    #[test]
    fn test_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let repo = repo_in(&dir);
        assert!(repo.get("ada").unwrap().is_none());
        assert!(!repo.path().exists());
    }

    #[test]
    fn test_insert_then_get_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let repo = repo_in(&dir);

        let mut record = UserRecord::with_password("ada", "$argon2id$fake".to_string());
        record.answers = vec![Answer::new(1, "Uncertain or unknowable")];
        repo.insert(record.clone()).unwrap();

        // A fresh handle reads what the first one wrote
        let reopened = JsonFileRepository::new(repo.path().to_path_buf());
        assert_eq!(reopened.get("ada").unwrap(), Some(record));
    }

    #[test]
    fn test_insert_duplicate_fails() {
        let dir = tempfile::tempdir().unwrap();
        let repo = repo_in(&dir);
        repo.insert(UserRecord::with_password("ada", "h".to_string()))
            .unwrap();

        let err = repo
            .insert(UserRecord::with_password("ada", "other".to_string()))
            .unwrap_err();
        assert!(matches!(err, StorageError::AlreadyExists(name) if name == "ada"));
    }

    #[test]
    fn test_update_unknown_fails() {
        let dir = tempfile::tempdir().unwrap();
        let repo = repo_in(&dir);
        let err = repo
            .update(UserRecord::with_password("ghost", "h".to_string()))
            .unwrap_err();
        assert!(matches!(err, StorageError::NotFound(_)));
    }

    #[test]
    fn test_update_replaces_record() {
        let dir = tempfile::tempdir().unwrap();
        let repo = repo_in(&dir);
        repo.insert(UserRecord::with_password("ada", "old".to_string()))
            .unwrap();
        repo.insert(UserRecord::with_password("bob", "bob".to_string()))
            .unwrap();

        repo.update(UserRecord::with_password("ada", "new".to_string()))
            .unwrap();

        assert_eq!(
            repo.get("ada").unwrap().unwrap().password.as_deref(),
            Some("new")
        );
        assert!(repo.get("bob").unwrap().is_some());
    }

    #[test]
    fn test_corrupt_file_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("users.json");
        std::fs::write(&path, "not json").unwrap();

        let repo = JsonFileRepository::new(path);
        assert!(matches!(repo.get("ada"), Err(StorageError::Corrupt { .. })));
    }

    #[test]
    fn test_reads_flat_user_object() {
        // Written by the web app before hashing and stored keys existed
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("users_data.json");
        std::fs::write(
            &path,
            r#"{
  "ada": {"password": "hunter2", "answers": [], "results": []},
  "bob": {
    "password": "pbkdf2:sha256:600000$salt$hash",
    "answers": [{"question_id": 1, "answer": "Uncertain or unknowable"}],
    "results": [{"name": "Agnosticism", "description": "d", "practices": "p", "core_beliefs": "c", "score": 3, "percentage": 13}]
  }
}"#,
        )
        .unwrap();

        let repo = JsonFileRepository::new(path);
        let ada = repo.get("ada").unwrap().unwrap();
        assert_eq!(ada.username, "ada");
        assert_eq!(ada.password.as_deref(), Some("hunter2"));

        let bob = repo.get("bob").unwrap().unwrap();
        assert_eq!(bob.username, "bob");
        assert_eq!(bob.results[0].name, "Agnosticism");
        assert_eq!(bob.results[0].key, "");
    }

    #[test]
    fn test_writes_flat_user_object() {
        let dir = tempfile::tempdir().unwrap();
        let repo = repo_in(&dir);
        repo.insert(UserRecord::with_password("ada", "h".to_string()))
            .unwrap();

        let raw: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(repo.path()).unwrap()).unwrap();
        assert_eq!(raw["ada"]["password"], "h");
        assert!(raw["ada"].get("username").is_none());
        assert!(raw.get("version").is_none());
    }
}
