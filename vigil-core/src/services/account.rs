//! Account management service.

use crate::{
    Account, AccountId, Error,
    account::NewAccount,
    error::{AuthError, ValidationError},
    repositories::{AccountRepository, TokenRepository},
};
use std::sync::Arc;

/// Thin coordinator over the account repository. Deletion also removes the
/// account's tokens explicitly, so no token outlives its account even on a
/// backend without foreign key enforcement.
pub struct AccountService<A: AccountRepository, T: TokenRepository> {
    account_repository: Arc<A>,
    token_repository: Arc<T>,
}

impl<A: AccountRepository, T: TokenRepository> AccountService<A, T> {
    pub fn new(account_repository: Arc<A>, token_repository: Arc<T>) -> Self {
        Self {
            account_repository,
            token_repository,
        }
    }

    /// Register a new, not-yet-verified account.
    pub async fn create_account(&self, email: &str) -> Result<Account, Error> {
        if !email.contains('@') {
            return Err(ValidationError::InvalidEmail(email.to_string()).into());
        }

        // Cheap pre-check; the unique index on email is authoritative under races
        if self.account_repository.find_by_email(email).await?.is_some() {
            return Err(AuthError::AccountAlreadyExists.into());
        }

        self.account_repository
            .create(NewAccount::new(email.to_string()))
            .await
    }

    pub async fn get_account(&self, id: &AccountId) -> Result<Option<Account>, Error> {
        self.account_repository.find_by_id(id).await
    }

    pub async fn get_account_by_email(&self, email: &str) -> Result<Option<Account>, Error> {
        self.account_repository.find_by_email(email).await
    }

    pub async fn mark_verified(&self, id: &AccountId) -> Result<(), Error> {
        self.account_repository.mark_verified(id).await
    }

    /// Delete an account and every token bound to it.
    pub async fn delete_account(&self, id: &AccountId) -> Result<(), Error> {
        let removed = self.token_repository.delete_tokens_for_account(id).await?;
        if removed > 0 {
            tracing::debug!(account_id = %id, count = removed, "removed tokens with account");
        }
        self.account_repository.delete(id).await
    }
}
