use crate::{
    AccountId, Error,
    token::{SecureToken, TokenPurpose, TokenRedemption, TokenValidation},
};
use async_trait::async_trait;
use chrono::Duration;

/// Repository for single-use token data access.
///
/// At most one live token exists per `(account, purpose)`; issuing replaces
/// any predecessor outright, and consumption deletes the row, so a replayed or
/// superseded value is indistinguishable from one that never existed.
#[async_trait]
pub trait TokenRepository: Send + Sync + 'static {
    /// Issue a new token for the account and purpose, replacing any existing
    /// token of that purpose. The returned instance carries the plaintext
    /// value; only its hash is persisted.
    ///
    /// Fails with `AuthError::AccountNotFound` when the account does not
    /// exist.
    async fn create_token(
        &self,
        account_id: &AccountId,
        purpose: TokenPurpose,
        expires_in: Duration,
    ) -> Result<SecureToken, Error>;

    /// Check a token value without consuming it.
    ///
    /// A found-but-expired token is deleted as a side effect and reported
    /// `Expired`; every later check of the same value reports `Invalid`.
    async fn check_token(
        &self,
        token: &str,
        purpose: TokenPurpose,
    ) -> Result<TokenValidation, Error>;

    /// Atomically consume a token: delete it and return the bound account id.
    ///
    /// Under concurrent redemption of the same value, at most one caller
    /// observes `Redeemed`; the rest observe `Invalid`. Expired tokens are
    /// lazily deleted and reported `Expired` once, like `check_token`.
    async fn consume_token(
        &self,
        token: &str,
        purpose: TokenPurpose,
    ) -> Result<TokenRedemption, Error>;

    /// Delete every token bound to an account, any purpose. Returns the
    /// number removed.
    async fn delete_tokens_for_account(&self, account_id: &AccountId) -> Result<u64, Error>;

    /// Delete tokens past their expiry, any purpose. Returns the number
    /// removed.
    async fn cleanup_expired_tokens(&self) -> Result<u64, Error>;
}
