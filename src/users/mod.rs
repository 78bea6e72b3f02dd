//! User accounts: signup validation, password hashing and the account store.

pub mod password;
pub mod validation;

use async_trait::async_trait;

use crate::auth::token_service::Identity;
use crate::storage::StoreError;

/// An account as persisted. Only the argon2 PHC string of the password is kept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredUser {
    pub email: String,
    pub firstname: String,
    pub lastname: String,
    pub password_hash: String,
}

impl StoredUser {
    pub fn identity(&self) -> Identity {
        Identity {
            email: self.email.clone(),
            firstname: self.firstname.clone(),
            lastname: self.lastname.clone(),
        }
    }
}

#[async_trait]
pub trait UserStore: Send + Sync {
    /// `StoreError::Duplicate` when the email is already registered.
    async fn insert(&self, user: &StoredUser) -> Result<(), StoreError>;

    /// `StoreError::NotFound` when no account uses `email`.
    async fn find_by_email(&self, email: &str) -> Result<StoredUser, StoreError>;
}
