pub mod file;
pub mod memory;
pub mod session;

pub use file::{get_users_path, JsonFileRepository};
pub use memory::MemoryRepository;
pub use session::{clear_session, get_session_path, load_session, save_session, Session};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

use crate::config::{StorageBackend, StorageConfig};
use crate::quiz::{Answer, Recommendation};

/// Identity-provider account link for users without a password
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LinkedIdentity {
    pub provider: String,
    pub subject: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserRecord {
    /// Stores key records by username, so it is not part of the record body
    #[serde(skip)]
    pub username: String,

    /// Argon2 PHC string. Older records may hold plaintext until next login.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identity: Option<LinkedIdentity>,

    #[serde(default)]
    pub answers: Vec<Answer>,

    #[serde(default)]
    pub results: Vec<Recommendation>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assessed_at: Option<DateTime<Utc>>,
}

impl UserRecord {
    pub fn with_password(username: impl Into<String>, password_hash: String) -> Self {
        Self {
            username: username.into(),
            password: Some(password_hash),
            identity: None,
            answers: Vec::new(),
            results: Vec::new(),
            assessed_at: None,
        }
    }

    pub fn with_identity(username: impl Into<String>, identity: LinkedIdentity) -> Self {
        Self {
            username: username.into(),
            password: None,
            identity: Some(identity),
            answers: Vec::new(),
            results: Vec::new(),
            assessed_at: None,
        }
    }

    pub fn has_results(&self) -> bool {
        !self.results.is_empty()
    }
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("user '{0}' already exists")]
    AlreadyExists(String),

    #[error("user '{0}' not found")]
    NotFound(String),

    #[error("failed to access user store at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid user store data at {path}: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Persistence for user accounts and their latest assessment.
pub trait UserRepository: Send + Sync {
    fn get(&self, username: &str) -> Result<Option<UserRecord>, StorageError>;

    /// Store a new user; fails if the username is taken
    fn insert(&self, record: UserRecord) -> Result<(), StorageError>;

    /// Replace an existing user; fails if the username is unknown
    fn update(&self, record: UserRecord) -> Result<(), StorageError>;
}

/// Build the repository selected by configuration
pub fn open_repository(config: &StorageConfig) -> Arc<dyn UserRepository> {
    match config.backend {
        StorageBackend::File => {
            let path = config.path.clone().unwrap_or_else(get_users_path);
            tracing::debug!(path = %path.display(), "using file user store");
            Arc::new(JsonFileRepository::new(path))
        }
        StorageBackend::Memory => {
            tracing::debug!("using in-memory user store");
            Arc::new(MemoryRepository::new())
        }
    }
}
