//! Account state tracked by the lockout guard and token store.
//!
//! Accounts are owned by an external user-management system; this crate only
//! tracks the fields the login-attempt and token lifecycles mutate:
//!
//! | Field                   | Type               | Description                                        |
//! | ----------------------- | ------------------ | -------------------------------------------------- |
//! | `id`                    | `AccountId`        | Opaque unique identifier (`acct_` prefixed).       |
//! | `email`                 | `String`           | Unique email the account was registered with.      |
//! | `enabled`               | `bool`             | Set once the email has been verified.              |
//! | `email_verified_at`     | `Option<DateTime>` | When verification completed, if it has.            |
//! | `failed_login_attempts` | `u32`              | Consecutive failed logins since the last success.  |
//! | `locked_at`             | `Option<DateTime>` | When the lockout threshold was reached, if locked. |

use crate::{
    Error,
    crypto::{generate_prefixed_id, validate_prefixed_id},
    error::ValidationError,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A unique, stable identifier for a specific account.
/// This value should be treated as opaque.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct AccountId(String);

impl AccountId {
    pub fn new(id: &str) -> Self {
        AccountId(id.to_string())
    }

    pub fn new_random() -> Self {
        AccountId(generate_prefixed_id("acct"))
    }

    pub fn into_inner(self) -> String {
        self.0
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Validate that this ID has the correct format for an account ID
    pub fn is_valid(&self) -> bool {
        validate_prefixed_id(&self.0, "acct")
    }
}

impl Default for AccountId {
    fn default() -> Self {
        Self::new_random()
    }
}

impl From<String> for AccountId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for AccountId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl std::fmt::Display for AccountId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An account as seen by the lockout guard and token store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub id: AccountId,

    pub email: String,

    // False until the email has been verified.
    pub enabled: bool,

    pub email_verified_at: Option<DateTime<Utc>>,

    // Reset to 0 on every successful login; frozen at the threshold while locked.
    pub failed_login_attempts: u32,

    // Set iff the account is locked, so `locked == true` always has a timestamp.
    pub locked_at: Option<DateTime<Utc>>,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

impl Account {
    pub fn builder() -> AccountBuilder {
        AccountBuilder::default()
    }

    /// Raw lock state as persisted. The lockout guard applies the lockout
    /// duration on top of this; use `LockoutService::is_locked` for the
    /// authoritative answer.
    pub fn locked(&self) -> bool {
        self.locked_at.is_some()
    }

    pub fn is_email_verified(&self) -> bool {
        self.email_verified_at.is_some()
    }
}

#[derive(Default)]
pub struct AccountBuilder {
    id: Option<AccountId>,
    email: Option<String>,
    enabled: bool,
    email_verified_at: Option<DateTime<Utc>>,
    failed_login_attempts: u32,
    locked_at: Option<DateTime<Utc>>,
    created_at: Option<DateTime<Utc>>,
    updated_at: Option<DateTime<Utc>>,
}

impl AccountBuilder {
    pub fn id(mut self, id: AccountId) -> Self {
        self.id = Some(id);
        self
    }

    pub fn email(mut self, email: String) -> Self {
        self.email = Some(email);
        self
    }

    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn email_verified_at(mut self, email_verified_at: Option<DateTime<Utc>>) -> Self {
        self.email_verified_at = email_verified_at;
        self
    }

    pub fn failed_login_attempts(mut self, failed_login_attempts: u32) -> Self {
        self.failed_login_attempts = failed_login_attempts;
        self
    }

    pub fn locked_at(mut self, locked_at: Option<DateTime<Utc>>) -> Self {
        self.locked_at = locked_at;
        self
    }

    pub fn created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = Some(created_at);
        self
    }

    pub fn updated_at(mut self, updated_at: DateTime<Utc>) -> Self {
        self.updated_at = Some(updated_at);
        self
    }

    pub fn build(self) -> Result<Account, Error> {
        let now = Utc::now();
        Ok(Account {
            id: self.id.unwrap_or_default(),
            email: self.email.ok_or(ValidationError::MissingField(
                "Email is required".to_string(),
            ))?,
            enabled: self.enabled,
            email_verified_at: self.email_verified_at,
            failed_login_attempts: self.failed_login_attempts,
            locked_at: self.locked_at,
            created_at: self.created_at.unwrap_or(now),
            updated_at: self.updated_at.unwrap_or(now),
        })
    }
}

/// Fields needed to register a new account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewAccount {
    pub id: AccountId,
    pub email: String,
    pub enabled: bool,
}

impl NewAccount {
    pub fn new(email: String) -> Self {
        Self {
            id: AccountId::new_random(),
            email,
            enabled: false,
        }
    }

    pub fn with_id(id: AccountId, email: String) -> Self {
        Self {
            id,
            email,
            enabled: false,
        }
    }
}
