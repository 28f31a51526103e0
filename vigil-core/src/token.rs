//! Single-use token types and outcome enums.
//!
//! A token is bound to exactly one account and one purpose, carries an expiry
//! timestamp, and is deleted the moment it is consumed or found expired. Only
//! the SHA256 hash of the value is ever stored; the plaintext exists once, on
//! the instance returned at issue time, to be handed to the delivery channel.

use crate::{
    AccountId, Error,
    crypto::{generate_token_value, hash_token, verify_token_hash},
    error::ValidationError,
};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// What a token may be redeemed for. Tokens are isolated per purpose: a value
/// issued for one purpose is invalid for the other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TokenPurpose {
    EmailVerification,
    PasswordReset,
}

impl TokenPurpose {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenPurpose::EmailVerification => "email_verification",
            TokenPurpose::PasswordReset => "password_reset",
        }
    }
}

impl FromStr for TokenPurpose {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "email_verification" => Ok(TokenPurpose::EmailVerification),
            "password_reset" => Ok(TokenPurpose::PasswordReset),
            other => Err(ValidationError::InvalidField(format!(
                "Unknown token purpose: {other}"
            ))
            .into()),
        }
    }
}

impl std::fmt::Display for TokenPurpose {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Time-to-live per token purpose.
#[derive(Debug, Clone)]
pub struct TokenConfig {
    pub verification_ttl: Duration,
    pub password_reset_ttl: Duration,
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            verification_ttl: Duration::hours(24),
            password_reset_ttl: Duration::hours(24),
        }
    }
}

impl TokenConfig {
    pub fn ttl_for(&self, purpose: TokenPurpose) -> Duration {
        match purpose {
            TokenPurpose::EmailVerification => self.verification_ttl,
            TokenPurpose::PasswordReset => self.password_reset_ttl,
        }
    }
}

/// A single-use token bound to an account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecureToken {
    pub account_id: AccountId,

    // Plaintext value, present only on the instance returned at issue time.
    // Never serialized and never stored.
    #[serde(skip)]
    token: Option<String>,

    pub token_hash: String,
    pub purpose: TokenPurpose,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl SecureToken {
    /// Issue a fresh token with a newly generated value.
    pub fn issue(account_id: AccountId, purpose: TokenPurpose, expires_in: Duration) -> Self {
        let value = generate_token_value();
        let token_hash = hash_token(&value);
        let now = Utc::now();
        Self {
            account_id,
            token: Some(value),
            token_hash,
            purpose,
            expires_at: now + expires_in,
            created_at: now,
        }
    }

    /// Rehydrate a token from its stored form. The plaintext is gone.
    pub fn from_storage(
        account_id: AccountId,
        token_hash: String,
        purpose: TokenPurpose,
        expires_at: DateTime<Utc>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            account_id,
            token: None,
            token_hash,
            purpose,
            expires_at,
            created_at,
        }
    }

    /// The plaintext value, available only on a freshly issued token.
    pub fn value(&self) -> Option<&str> {
        self.token.as_deref()
    }

    /// Constant-time check of a candidate value against the stored hash.
    pub fn verify(&self, candidate: &str) -> bool {
        verify_token_hash(candidate, &self.token_hash)
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

/// Outcome of a read-only token check.
///
/// `Invalid` deliberately covers never-issued, consumed, and superseded
/// values alike, so a caller cannot probe which tokens once existed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenValidation {
    Valid,
    Expired,
    Invalid,
}

/// Outcome of an atomic consume at the storage layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenRedemption {
    Redeemed(AccountId),
    Expired,
    Invalid,
}

/// Outcome of a consume resolved to the bound account.
#[derive(Debug, Clone)]
pub enum AccountRedemption {
    Redeemed(crate::Account),
    Expired,
    Invalid,
}
