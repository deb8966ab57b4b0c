pub mod identity;
pub mod password;

pub use identity::{GoogleIdentityVerifier, IdentityVerifier, VerifiedIdentity};
pub use password::{check_password, hash_password, PasswordCheck};

use std::sync::Arc;
use thiserror::Error;

use crate::storage::{LinkedIdentity, StorageError, UserRecord, UserRepository};

#[derive(Debug, Error)]
pub enum AccountError {
    #[error("Username and password required!")]
    MissingCredentials,

    #[error("Username already exists!")]
    UsernameTaken,

    #[error("Invalid credentials!")]
    InvalidCredentials,

    #[error("Identity token rejected: {0}")]
    IdentityRejected(String),

    #[error("Identity provider unavailable: {0}")]
    IdentityUnavailable(String),

    #[error("Failed to hash password: {0}")]
    Hashing(String),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Signup and login against a user repository.
pub struct AccountService {
    repo: Arc<dyn UserRepository>,
}

impl AccountService {
    pub fn new(repo: Arc<dyn UserRepository>) -> Self {
        Self { repo }
    }

    /// Create a password account. Returns the stored (trimmed) username.
    pub fn signup(&self, username: &str, password: &str) -> Result<String, AccountError> {
        let username = username.trim();
        if username.is_empty() || password.is_empty() {
            return Err(AccountError::MissingCredentials);
        }

        let record = UserRecord::with_password(username, hash_password(password)?);
        self.repo.insert(record).map_err(|e| match e {
            StorageError::AlreadyExists(_) => AccountError::UsernameTaken,
            other => AccountError::Storage(other),
        })?;

        tracing::info!(username, "account created");
        Ok(username.to_string())
    }

    /// Check a username/password pair. Plaintext passwords from older
    /// records are upgraded to a hash on successful login.
    pub fn login(&self, username: &str, password: &str) -> Result<String, AccountError> {
        let username = username.trim();
        let Some(mut record) = self.repo.get(username)? else {
            tracing::debug!(username, "login for unknown user");
            return Err(AccountError::InvalidCredentials);
        };
        let Some(stored) = record.password.as_deref() else {
            // Identity-provider account
            return Err(AccountError::InvalidCredentials);
        };

        match check_password(password, stored) {
            PasswordCheck::Match => {}
            PasswordCheck::LegacyMatch => {
                record.password = Some(hash_password(password)?);
                self.repo.update(record)?;
                tracing::info!(username, "upgraded legacy plaintext password");
            }
            PasswordCheck::Mismatch => {
                tracing::debug!(username, "password mismatch");
                return Err(AccountError::InvalidCredentials);
            }
        }

        Ok(username.to_string())
    }

    /// Log in with a provider ID token. The account is keyed by the verified
    /// email and created on first login. An unlinked password account under
    /// the same email becomes an identity account.
    pub async fn login_with_identity(
        &self,
        verifier: &dyn IdentityVerifier,
        id_token: &str,
    ) -> Result<String, AccountError> {
        let verified = verifier.verify(id_token).await?;
        let linked = LinkedIdentity {
            provider: verified.provider.clone(),
            subject: verified.subject.clone(),
        };

        match self.repo.get(&verified.email)? {
            None => {
                self.repo
                    .insert(UserRecord::with_identity(verified.email.clone(), linked))?;
                tracing::info!(username = %verified.email, provider = %verified.provider, "account created");
            }
            Some(record) if record.identity.as_ref() == Some(&linked) => {}
            Some(mut record) if record.identity.is_none() => {
                // Anyone could have signed up under this email with a password,
                // so the provider's owner takes the account over and the password goes
                record.identity = Some(linked);
                record.password = None;
                self.repo.update(record)?;
                tracing::info!(username = %verified.email, "linked identity to existing account, password cleared");
            }
            Some(_) => {
                return Err(AccountError::IdentityRejected(
                    "account is linked to a different identity".to_string(),
                ));
            }
        }

        Ok(verified.email)
    }
}
