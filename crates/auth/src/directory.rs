//! User lookup contract used to resolve an identity to a registered account.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use bazaar_core::UserId;

use crate::Role;

/// A registered marketplace account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserAccount {
    pub id: UserId,
    pub display_name: String,
    pub role: Role,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DirectoryError {
    #[error("user directory unavailable: {0}")]
    Backend(String),
}

/// Source of registered accounts (database, identity service, in-memory for tests).
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Look up an account by id. `Ok(None)` means no such user.
    async fn find_user(&self, id: UserId) -> Result<Option<UserAccount>, DirectoryError>;

    /// Register or replace an account.
    async fn register(&self, account: UserAccount) -> Result<(), DirectoryError>;
}

#[async_trait]
impl<D> UserDirectory for std::sync::Arc<D>
where
    D: UserDirectory + ?Sized,
{
    async fn find_user(&self, id: UserId) -> Result<Option<UserAccount>, DirectoryError> {
        (**self).find_user(id).await
    }

    async fn register(&self, account: UserAccount) -> Result<(), DirectoryError> {
        (**self).register(account).await
    }
}
