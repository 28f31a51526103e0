//! Single-use token store.
//!
//! Issues, checks, and consumes time-bounded tokens bound to one account and
//! one purpose. Expiry is detected lazily at read time; an optional background
//! sweep bounds table growth.

use std::sync::Arc;

use chrono::Duration;

use crate::{
    AccountId, Error,
    repositories::TokenRepository,
    services::with_contention_retry,
    token::{SecureToken, TokenConfig, TokenPurpose, TokenRedemption, TokenValidation},
};

/// Service for issuing and redeeming single-use tokens.
///
/// # Concurrency
///
/// Consumption is atomic at the repository: under concurrent redemption of one
/// value, at most one caller observes `Redeemed` and all others observe
/// `Invalid`. Issue replaces any live token of the same purpose for the
/// account in the same atomic step.
pub struct TokenService<T: TokenRepository> {
    repository: Arc<T>,
    config: TokenConfig,
}

impl<T: TokenRepository> TokenService<T> {
    pub fn new(repository: Arc<T>, config: TokenConfig) -> Self {
        Self { repository, config }
    }

    pub fn config(&self) -> &TokenConfig {
        &self.config
    }

    /// Issue a token with the configured TTL for its purpose, superseding any
    /// live token of that purpose for the account. The superseded value
    /// becomes `Invalid`, indistinguishable from a value never issued.
    pub async fn issue_token(
        &self,
        account_id: &AccountId,
        purpose: TokenPurpose,
    ) -> Result<SecureToken, Error> {
        self.issue_token_with_expiration(account_id, purpose, self.config.ttl_for(purpose))
            .await
    }

    /// Issue a token with a custom expiration time.
    pub async fn issue_token_with_expiration(
        &self,
        account_id: &AccountId,
        purpose: TokenPurpose,
        expires_in: Duration,
    ) -> Result<SecureToken, Error> {
        with_contention_retry(|| self.repository.create_token(account_id, purpose, expires_in))
            .await
    }

    /// Check a token value without consuming it.
    ///
    /// Empty input is `Invalid` without a storage round trip. A found-but-
    /// expired token is deleted and reported `Expired` once; thereafter the
    /// value is `Invalid`.
    pub async fn check_token(
        &self,
        token: &str,
        purpose: TokenPurpose,
    ) -> Result<TokenValidation, Error> {
        if token.trim().is_empty() {
            return Ok(TokenValidation::Invalid);
        }
        self.repository.check_token(token, purpose).await
    }

    /// Atomically consume a token and return the bound account id.
    pub async fn consume_token(
        &self,
        token: &str,
        purpose: TokenPurpose,
    ) -> Result<TokenRedemption, Error> {
        if token.trim().is_empty() {
            return Ok(TokenRedemption::Invalid);
        }
        with_contention_retry(|| self.repository.consume_token(token, purpose)).await
    }

    /// Delete tokens past their expiry. Returns the number removed.
    pub async fn cleanup_expired_tokens(&self) -> Result<u64, Error> {
        self.repository.cleanup_expired_tokens().await
    }

    /// Start the background cleanup task.
    ///
    /// Lazy expiry already keeps behavior correct; the sweep only bounds how
    /// long dead rows linger.
    ///
    /// # Arguments
    ///
    /// * `shutdown` - A watch receiver that signals when to stop the task
    pub fn start_cleanup_task(
        &self,
        mut shutdown: tokio::sync::watch::Receiver<bool>,
    ) -> tokio::task::JoinHandle<()> {
        let repository = Arc::clone(&self.repository);

        const CLEANUP_INTERVAL: std::time::Duration = std::time::Duration::from_secs(3600);

        tokio::spawn(async move {
            let mut interval_timer = tokio::time::interval(CLEANUP_INTERVAL);

            loop {
                tokio::select! {
                    _ = interval_timer.tick() => {
                        match repository.cleanup_expired_tokens().await {
                            Ok(count) if count > 0 => {
                                tracing::info!(count = count, "Cleaned up expired tokens");
                            }
                            Err(e) => {
                                tracing::warn!(error = %e, "Failed to clean up expired tokens");
                            }
                            _ => {}
                        }
                    }
                    _ = shutdown.changed() => {
                        tracing::info!("Shutting down token cleanup task");
                        break;
                    }
                }
            }
        })
    }
}
