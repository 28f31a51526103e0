//! Account lockout guard.
//!
//! Tracks failed login attempts per account and locks the account once the
//! configured threshold is reached. Locks lapse after a fixed duration;
//! expiry is lazy, applied on the next read or write, so no background sweep
//! is needed and a lapsed lock is never reported as locked.
//!
//! # Example
//!
//! ```rust,ignore
//! use vigil_core::services::LockoutService;
//! use vigil_core::LockoutConfig;
//!
//! let guard = LockoutService::new(repository, LockoutConfig::default());
//!
//! // Consult before accepting credentials
//! if guard.is_locked(&account_id).await? {
//!     // Answer with the same generic failure as a bad password
//! }
//!
//! // Report the outcome of each authentication attempt
//! let status = guard.record_login_failure(&account_id).await?;
//! ```

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::{
    AccountId, Error,
    lockout::{AttemptSnapshot, LockoutConfig, LockoutStatus},
    repositories::LockoutRepository,
    services::with_contention_retry,
};

/// Service coordinating login-attempt tracking and account lockout.
///
/// # Concurrency
///
/// Failure reports for one account may race. The repository performs the
/// increment-and-maybe-lock atomically, so exactly one report can observe the
/// transition into the locked state and the counter never undercounts;
/// transient serialization conflicts are retried here a bounded number of
/// times.
pub struct LockoutService<R: LockoutRepository> {
    repository: Arc<R>,
    config: LockoutConfig,
}

impl<R: LockoutRepository> LockoutService<R> {
    pub fn new(repository: Arc<R>, config: LockoutConfig) -> Self {
        Self { repository, config }
    }

    pub fn config(&self) -> &LockoutConfig {
        &self.config
    }

    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    /// The configured threshold, so callers need not hardcode it.
    pub fn max_failed_attempts(&self) -> u32 {
        self.config.max_failed_attempts
    }

    /// Current lock state for an account.
    ///
    /// Unknown accounts report unlocked with zero attempts; existence checks
    /// are the authentication caller's concern.
    pub async fn get_lockout_status(&self, account_id: &AccountId) -> Result<LockoutStatus, Error> {
        if !self.config.enabled {
            return Ok(LockoutStatus::unlocked(account_id.clone()));
        }

        let now = Utc::now();
        self.expire_lapsed_lock(account_id, now).await?;
        let snapshot = self.repository.get_attempt_state(account_id).await?;
        Ok(self.status_from(account_id, &snapshot, now))
    }

    /// Check if an account is currently locked (convenience method).
    pub async fn is_locked(&self, account_id: &AccountId) -> Result<bool, Error> {
        Ok(self.get_lockout_status(account_id).await?.is_locked)
    }

    /// Record one failed login attempt and return the updated status.
    ///
    /// Safe to call for an already-locked account: the counter stays at the
    /// threshold and no new lock transition fires. If protection is disabled,
    /// this is a no-op that returns an unlocked status.
    pub async fn record_login_failure(
        &self,
        account_id: &AccountId,
    ) -> Result<LockoutStatus, Error> {
        if !self.config.enabled {
            return Ok(LockoutStatus::unlocked(account_id.clone()));
        }

        let now = Utc::now();
        self.expire_lapsed_lock(account_id, now).await?;

        let threshold = self.config.max_failed_attempts;
        let snapshot = with_contention_retry(|| {
            self.repository.record_failure(account_id, threshold, now)
        })
        .await?;

        Ok(self.status_from(account_id, &snapshot, now))
    }

    /// Reset the failure counter and clear any lock after a successful login.
    ///
    /// Always safe to call, whatever the prior state.
    pub async fn record_login_success(&self, account_id: &AccountId) -> Result<(), Error> {
        with_contention_retry(|| self.repository.clear_failures(account_id)).await
    }

    /// Explicitly unlock an account (admin action or completed password
    /// reset). Returns whether the account had been locked.
    pub async fn unlock_account(&self, account_id: &AccountId) -> Result<bool, Error> {
        let was_locked = self.is_locked(account_id).await?;
        with_contention_retry(|| self.repository.clear_failures(account_id)).await?;
        Ok(was_locked)
    }

    /// Clear a lock whose duration has elapsed, so stale locks never surface.
    async fn expire_lapsed_lock(
        &self,
        account_id: &AccountId,
        now: DateTime<Utc>,
    ) -> Result<(), Error> {
        let cutoff = now - self.config.lockout_duration;
        let cleared =
            with_contention_retry(|| self.repository.clear_expired_lock(account_id, cutoff))
                .await?;
        if cleared {
            tracing::info!(account_id = %account_id, "lockout lapsed, attempt counter reset");
        }
        Ok(())
    }

    fn status_from(
        &self,
        account_id: &AccountId,
        snapshot: &AttemptSnapshot,
        now: DateTime<Utc>,
    ) -> LockoutStatus {
        let locked_until = snapshot
            .locked_at
            .map(|at| at + self.config.lockout_duration);
        let is_locked = locked_until.is_some_and(|until| until > now);

        LockoutStatus {
            account_id: account_id.clone(),
            failed_attempts: snapshot.failed_attempts,
            is_locked,
            locked_until: if is_locked { locked_until } else { None },
        }
    }
}
