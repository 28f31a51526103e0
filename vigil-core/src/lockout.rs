//! Lockout configuration and status types.

use crate::AccountId;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Configuration for the account lockout guard.
#[derive(Debug, Clone)]
pub struct LockoutConfig {
    /// Whether lockout tracking is active. When disabled, every status read
    /// reports unlocked and failure reports are not recorded.
    pub enabled: bool,

    /// Failed attempts that trigger a lock.
    pub max_failed_attempts: u32,

    /// How long a lock holds before it lapses.
    pub lockout_duration: Duration,
}

impl Default for LockoutConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_failed_attempts: 3,
            lockout_duration: Duration::minutes(30),
        }
    }
}

impl LockoutConfig {
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }
}

/// Computed lock state for an account at a point in time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LockoutStatus {
    pub account_id: AccountId,
    pub failed_attempts: u32,
    pub is_locked: bool,
    pub locked_until: Option<DateTime<Utc>>,
}

impl LockoutStatus {
    pub(crate) fn unlocked(account_id: AccountId) -> Self {
        Self {
            account_id,
            failed_attempts: 0,
            is_locked: false,
            locked_until: None,
        }
    }

    /// Seconds until the lock lapses, if currently locked.
    pub fn retry_after_seconds(&self) -> Option<i64> {
        self.locked_until
            .map(|until| (until - Utc::now()).num_seconds().max(0))
    }
}

/// Storage-level view of an account's attempt counter and lock timestamp.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttemptSnapshot {
    pub failed_attempts: u32,
    pub locked_at: Option<DateTime<Utc>>,
}
