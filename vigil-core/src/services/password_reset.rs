//! Password reset flow.
//!
//! Issues reset tokens by email and redeems them into the bound account.
//! Completing a reset also clears the account's lockout state: proof of
//! mailbox control is the unlock mechanism for a locked-out user. Storing the
//! new credential is the caller's business.

use crate::{
    Account, Error,
    repositories::{AccountRepository, LockoutRepository, TokenRepository},
    services::{LockoutService, TokenService},
    token::{AccountRedemption, SecureToken, TokenPurpose, TokenRedemption, TokenValidation},
};
use std::sync::Arc;

/// Service for password reset operations.
pub struct PasswordResetService<A, L, T>
where
    A: AccountRepository,
    L: LockoutRepository,
    T: TokenRepository,
{
    account_repository: Arc<A>,
    lockout_service: Arc<LockoutService<L>>,
    token_service: Arc<TokenService<T>>,
}

impl<A, L, T> PasswordResetService<A, L, T>
where
    A: AccountRepository,
    L: LockoutRepository,
    T: TokenRepository,
{
    pub fn new(
        account_repository: Arc<A>,
        lockout_service: Arc<LockoutService<L>>,
        token_service: Arc<TokenService<T>>,
    ) -> Self {
        Self {
            account_repository,
            lockout_service,
            token_service,
        }
    }

    /// Request a password reset for an email address.
    ///
    /// Returns the account and a fresh token when the email is known, `None`
    /// otherwise — the caller answers identically in both cases so the
    /// endpoint cannot be used to probe which emails are registered.
    pub async fn request_reset(
        &self,
        email: &str,
    ) -> Result<Option<(Account, SecureToken)>, Error> {
        let Some(account) = self.account_repository.find_by_email(email).await? else {
            return Ok(None);
        };

        let token = self
            .token_service
            .issue_token(&account.id, TokenPurpose::PasswordReset)
            .await?;

        Ok(Some((account, token)))
    }

    /// Check a reset token without consuming it, e.g. before rendering the
    /// reset form.
    pub async fn check_token(&self, token: &str) -> Result<TokenValidation, Error> {
        self.token_service
            .check_token(token, TokenPurpose::PasswordReset)
            .await
    }

    /// Consume the reset token and return the bound account.
    ///
    /// On success the account's failed-attempt counter and any lock are
    /// cleared; the caller then stores the new credential.
    pub async fn complete_reset(&self, token: &str) -> Result<AccountRedemption, Error> {
        match self
            .token_service
            .consume_token(token, TokenPurpose::PasswordReset)
            .await?
        {
            TokenRedemption::Redeemed(account_id) => {
                self.lockout_service.record_login_success(&account_id).await?;
                match self.account_repository.find_by_id(&account_id).await? {
                    Some(account) => Ok(AccountRedemption::Redeemed(account)),
                    // Account deleted between consume and fetch; reveal nothing
                    None => Ok(AccountRedemption::Invalid),
                }
            }
            TokenRedemption::Expired => Ok(AccountRedemption::Expired),
            TokenRedemption::Invalid => Ok(AccountRedemption::Invalid),
        }
    }
}
