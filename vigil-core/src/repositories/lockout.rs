//! Repository trait for login-attempt tracking and account lockout.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::{AccountId, Error, lockout::AttemptSnapshot};

/// Storage operations backing the lockout guard.
///
/// Failure counting and the lock transition race under concurrent logins, so
/// `record_failure` must be atomic: implementations perform the increment and
/// the conditional lock in a single serialized step (one SQL statement, a row
/// lock, or an equivalent). Exactly one concurrent caller can observe the
/// transition into the locked state.
///
/// All operations treat unknown accounts as empty state rather than erroring,
/// so callers reveal nothing about which accounts exist.
#[async_trait]
pub trait LockoutRepository: Send + Sync + 'static {
    /// Record one failed login attempt.
    ///
    /// Increments the account's failure counter unless it is already locked;
    /// when the post-increment count reaches `threshold`, sets `locked_at` to
    /// `now` in the same atomic step. Returns the resulting state. Safe to
    /// call on a locked account (the counter is left at the threshold).
    async fn record_failure(
        &self,
        account_id: &AccountId,
        threshold: u32,
        now: DateTime<Utc>,
    ) -> Result<AttemptSnapshot, Error>;

    /// Reset the failure counter to zero and clear any lock.
    ///
    /// Called on successful login and on explicit unlock.
    async fn clear_failures(&self, account_id: &AccountId) -> Result<(), Error>;

    /// Read the current counter and lock timestamp.
    async fn get_attempt_state(&self, account_id: &AccountId) -> Result<AttemptSnapshot, Error>;

    /// Clear a lock whose timestamp is at or before `locked_before`, resetting
    /// the counter with it. Returns whether a lapsed lock was cleared.
    ///
    /// This is the lazy half of lock expiry: the guard calls it before every
    /// read and increment so a lapsed lock never reports as locked.
    async fn clear_expired_lock(
        &self,
        account_id: &AccountId,
        locked_before: DateTime<Utc>,
    ) -> Result<bool, Error>;
}
