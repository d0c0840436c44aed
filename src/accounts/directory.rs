use super::{Account, AccountId};
use crate::error::Result;
use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Arc;

/// Read-only account lookup.
#[async_trait]
pub trait AccountDirectory: Send + Sync {
    /// Find an account by id, active or not.
    async fn find(&self, id: &AccountId) -> Result<Option<Account>>;

    /// Check if the directory backend is reachable.
    fn is_healthy(&self) -> bool {
        true
    }
}

/// Checks login credentials.
///
/// Credential storage and hashing live outside this crate; the login endpoint
/// only needs to know which account a set of credentials belongs to.
#[async_trait]
pub trait CredentialVerifier: Send + Sync {
    /// Return the account the credentials authenticate, or `None`.
    async fn verify(&self, account_id: &AccountId, secret: &str) -> Result<Option<AccountId>>;
}

/// In-memory account directory.
///
/// Suitable for development and testing.
#[derive(Clone, Default)]
pub struct InMemoryAccountDirectory {
    accounts: Arc<DashMap<AccountId, Account>>,
}

impl InMemoryAccountDirectory {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a directory pre-populated with `accounts`.
    #[must_use]
    pub fn with_accounts(accounts: impl IntoIterator<Item = Account>) -> Self {
        let directory = Self::new();
        for account in accounts {
            directory.insert(account);
        }
        directory
    }

    /// Insert or replace an account.
    pub fn insert(&self, account: Account) {
        self.accounts.insert(account.id.clone(), account);
    }

    pub fn remove(&self, id: &AccountId) -> Option<Account> {
        self.accounts.remove(id).map(|(_, account)| account)
    }

    /// Flip the active flag on an existing account.
    pub fn set_active(&self, id: &AccountId, active: bool) -> bool {
        match self.accounts.get_mut(id) {
            Some(mut account) => {
                account.active = active;
                true
            }
            None => false,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }
}

#[async_trait]
impl AccountDirectory for InMemoryAccountDirectory {
    async fn find(&self, id: &AccountId) -> Result<Option<Account>> {
        Ok(self.accounts.get(id).map(|entry| entry.value().clone()))
    }
}

#[async_trait]
impl<T: AccountDirectory + ?Sized> AccountDirectory for Arc<T> {
    async fn find(&self, id: &AccountId) -> Result<Option<Account>> {
        (**self).find(id).await
    }

    fn is_healthy(&self) -> bool {
        (**self).is_healthy()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_find() {
        let directory = InMemoryAccountDirectory::with_accounts([
            Account::new("1", "super_admin"),
            Account::new("42", "facility_admin"),
        ]);

        let found = directory.find(&AccountId::from("42")).await.unwrap();
        assert_eq!(found.unwrap().role, "facility_admin");
        assert!(directory.find(&AccountId::from("9")).await.unwrap().is_none());
        assert_eq!(directory.len(), 2);
    }

    #[tokio::test]
    async fn test_set_active() {
        let directory = InMemoryAccountDirectory::with_accounts([Account::new("1", "staff")]);
        let id = AccountId::from("1");

        assert!(directory.set_active(&id, false));
        assert!(!directory.find(&id).await.unwrap().unwrap().active);
        assert!(!directory.set_active(&AccountId::from("2"), false));
    }

    #[tokio::test]
    async fn test_remove() {
        let directory = InMemoryAccountDirectory::with_accounts([Account::new("1", "staff")]);
        let id = AccountId::from("1");

        assert!(directory.remove(&id).is_some());
        assert!(directory.find(&id).await.unwrap().is_none());
        assert!(directory.is_empty());
    }
}
