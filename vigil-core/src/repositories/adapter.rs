//! Adapters that narrow a [`RepositoryProvider`] to a single repository trait,
//! so services can be generic over one repository while the application wires
//! everything from one provider.

use crate::{
    Account, AccountId, Error,
    account::NewAccount,
    lockout::AttemptSnapshot,
    repositories::{
        AccountRepository, LockoutRepository, RepositoryProvider, TokenRepository,
    },
    token::{SecureToken, TokenPurpose, TokenRedemption, TokenValidation},
};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;

pub struct AccountRepositoryAdapter<R: RepositoryProvider> {
    provider: Arc<R>,
}

impl<R: RepositoryProvider> AccountRepositoryAdapter<R> {
    pub fn new(provider: Arc<R>) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl<R: RepositoryProvider> AccountRepository for AccountRepositoryAdapter<R> {
    async fn create(&self, account: NewAccount) -> Result<Account, Error> {
        self.provider.account().create(account).await
    }

    async fn find_by_id(&self, id: &AccountId) -> Result<Option<Account>, Error> {
        self.provider.account().find_by_id(id).await
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, Error> {
        self.provider.account().find_by_email(email).await
    }

    async fn mark_verified(&self, id: &AccountId) -> Result<(), Error> {
        self.provider.account().mark_verified(id).await
    }

    async fn delete(&self, id: &AccountId) -> Result<(), Error> {
        self.provider.account().delete(id).await
    }
}

pub struct LockoutRepositoryAdapter<R: RepositoryProvider> {
    provider: Arc<R>,
}

impl<R: RepositoryProvider> LockoutRepositoryAdapter<R> {
    pub fn new(provider: Arc<R>) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl<R: RepositoryProvider> LockoutRepository for LockoutRepositoryAdapter<R> {
    async fn record_failure(
        &self,
        account_id: &AccountId,
        threshold: u32,
        now: DateTime<Utc>,
    ) -> Result<AttemptSnapshot, Error> {
        self.provider
            .lockout()
            .record_failure(account_id, threshold, now)
            .await
    }

    async fn clear_failures(&self, account_id: &AccountId) -> Result<(), Error> {
        self.provider.lockout().clear_failures(account_id).await
    }

    async fn get_attempt_state(&self, account_id: &AccountId) -> Result<AttemptSnapshot, Error> {
        self.provider.lockout().get_attempt_state(account_id).await
    }

    async fn clear_expired_lock(
        &self,
        account_id: &AccountId,
        locked_before: DateTime<Utc>,
    ) -> Result<bool, Error> {
        self.provider
            .lockout()
            .clear_expired_lock(account_id, locked_before)
            .await
    }
}

pub struct TokenRepositoryAdapter<R: RepositoryProvider> {
    provider: Arc<R>,
}

impl<R: RepositoryProvider> TokenRepositoryAdapter<R> {
    pub fn new(provider: Arc<R>) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl<R: RepositoryProvider> TokenRepository for TokenRepositoryAdapter<R> {
    async fn create_token(
        &self,
        account_id: &AccountId,
        purpose: TokenPurpose,
        expires_in: Duration,
    ) -> Result<SecureToken, Error> {
        self.provider
            .token()
            .create_token(account_id, purpose, expires_in)
            .await
    }

    async fn check_token(
        &self,
        token: &str,
        purpose: TokenPurpose,
    ) -> Result<TokenValidation, Error> {
        self.provider.token().check_token(token, purpose).await
    }

    async fn consume_token(
        &self,
        token: &str,
        purpose: TokenPurpose,
    ) -> Result<TokenRedemption, Error> {
        self.provider.token().consume_token(token, purpose).await
    }

    async fn delete_tokens_for_account(&self, account_id: &AccountId) -> Result<u64, Error> {
        self.provider
            .token()
            .delete_tokens_for_account(account_id)
            .await
    }

    async fn cleanup_expired_tokens(&self) -> Result<u64, Error> {
        self.provider.token().cleanup_expired_tokens().await
    }
}
