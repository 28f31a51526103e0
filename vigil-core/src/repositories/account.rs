use crate::{Account, AccountId, Error, account::NewAccount};
use async_trait::async_trait;

/// Repository for account data access.
#[async_trait]
pub trait AccountRepository: Send + Sync + 'static {
    /// Register a new account. Fails with `AuthError::AccountAlreadyExists`
    /// when the email is taken.
    async fn create(&self, account: NewAccount) -> Result<Account, Error>;

    async fn find_by_id(&self, id: &AccountId) -> Result<Option<Account>, Error>;

    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, Error>;

    /// Record a completed email verification: sets `enabled` and
    /// `email_verified_at`. A no-op for unknown accounts.
    async fn mark_verified(&self, id: &AccountId) -> Result<(), Error>;

    /// Delete an account. Tokens bound to it must not survive; backends
    /// enforce this with a cascading foreign key.
    async fn delete(&self, id: &AccountId) -> Result<(), Error>;
}
