use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use bazaar_auth::{DirectoryError, UserAccount, UserDirectory};
use bazaar_core::UserId;

/// In-memory account directory for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryUserDirectory {
    accounts: RwLock<HashMap<UserId, UserAccount>>,
}

impl InMemoryUserDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a directory pre-populated with `accounts`.
    pub fn with_accounts(accounts: impl IntoIterator<Item = UserAccount>) -> Self {
        Self {
            accounts: RwLock::new(accounts.into_iter().map(|a| (a.id, a)).collect()),
        }
    }
}

#[async_trait]
impl UserDirectory for InMemoryUserDirectory {
    async fn find_user(&self, id: UserId) -> Result<Option<UserAccount>, DirectoryError> {
        let accounts = self
            .accounts
            .read()
            .map_err(|_| DirectoryError::Backend("user directory lock poisoned".to_string()))?;
        Ok(accounts.get(&id).cloned())
    }

    async fn register(&self, account: UserAccount) -> Result<(), DirectoryError> {
        let mut accounts = self
            .accounts
            .write()
            .map_err(|_| DirectoryError::Backend("user directory lock poisoned".to_string()))?;
        accounts.insert(account.id, account);
        Ok(())
    }
}
