//! SQLite implementation of the token repository.
//!
//! Tokens are stored by SHA256 hash only. Consumption is a single
//! `DELETE … RETURNING`, so under concurrent redemption of one value exactly
//! one caller gets the row back; issue is an upsert against the
//! `(account_id, purpose)` uniqueness, which deletes-and-replaces any live
//! predecessor in the same statement.

use async_trait::async_trait;
use chrono::{Duration, Utc};
use sqlx::SqlitePool;
use vigil_core::{
    AccountId, Error,
    crypto::{hash_token, verify_token_hash},
    error::AuthError,
    repositories::TokenRepository,
    token::{SecureToken, TokenPurpose, TokenRedemption, TokenValidation},
};

use super::map_db_error;

pub struct SqliteTokenRepository {
    pool: SqlitePool,
}

impl SqliteTokenRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

/// Internal struct for query results
#[derive(Debug, sqlx::FromRow)]
struct SqliteTokenRow {
    token_hash: String,
    expires_at: i64,
}

#[async_trait]
impl TokenRepository for SqliteTokenRepository {
    async fn create_token(
        &self,
        account_id: &AccountId,
        purpose: TokenPurpose,
        expires_in: Duration,
    ) -> Result<SecureToken, Error> {
        let token = SecureToken::issue(account_id.clone(), purpose, expires_in);

        // The upsert IS the supersede: any live token for this account and
        // purpose is overwritten, and its old value dies with the old hash.
        sqlx::query(
            r#"
            INSERT INTO tokens (token_hash, account_id, purpose, expires_at, created_at)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT (account_id, purpose) DO UPDATE SET
                token_hash = excluded.token_hash,
                expires_at = excluded.expires_at,
                created_at = excluded.created_at
            "#,
        )
        .bind(&token.token_hash)
        .bind(token.account_id.as_str())
        .bind(token.purpose.as_str())
        .bind(token.expires_at.timestamp())
        .bind(token.created_at.timestamp())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            // Minting a token for a nonexistent account is a caller bug
            if e.as_database_error()
                .is_some_and(|db| db.is_foreign_key_violation())
            {
                return AuthError::AccountNotFound.into();
            }
            map_db_error("Failed to create token", e)
        })?;

        Ok(token)
    }

    async fn check_token(
        &self,
        token: &str,
        purpose: TokenPurpose,
    ) -> Result<TokenValidation, Error> {
        let token_hash = hash_token(token);
        let now = Utc::now().timestamp();

        let row = sqlx::query_as::<_, SqliteTokenRow>(
            "SELECT token_hash, expires_at FROM tokens WHERE token_hash = ? AND purpose = ?",
        )
        .bind(&token_hash)
        .bind(purpose.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_db_error("Failed to check token", e))?;

        let Some(row) = row else {
            return Ok(TokenValidation::Invalid);
        };

        // Constant-time double check on top of the indexed lookup
        if !verify_token_hash(token, &row.token_hash) {
            return Ok(TokenValidation::Invalid);
        }

        if row.expires_at <= now {
            // Lazy cleanup: the expired row is reported once, then gone
            sqlx::query("DELETE FROM tokens WHERE token_hash = ? AND purpose = ?")
                .bind(&token_hash)
                .bind(purpose.as_str())
                .execute(&self.pool)
                .await
                .map_err(|e| map_db_error("Failed to delete expired token", e))?;
            return Ok(TokenValidation::Expired);
        }

        Ok(TokenValidation::Valid)
    }

    async fn consume_token(
        &self,
        token: &str,
        purpose: TokenPurpose,
    ) -> Result<TokenRedemption, Error> {
        let token_hash = hash_token(token);
        let now = Utc::now().timestamp();

        // One statement, one winner: whoever deletes the live row redeems it
        let redeemed: Option<(String,)> = sqlx::query_as(
            r#"
            DELETE FROM tokens
            WHERE token_hash = ? AND purpose = ? AND expires_at > ?
            RETURNING account_id
            "#,
        )
        .bind(&token_hash)
        .bind(purpose.as_str())
        .bind(now)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_db_error("Failed to consume token", e))?;

        if let Some((account_id,)) = redeemed {
            return Ok(TokenRedemption::Redeemed(AccountId::new(&account_id)));
        }

        // Not redeemable: either expired (delete it now, report once) or gone
        let expired: Option<(String,)> = sqlx::query_as(
            "DELETE FROM tokens WHERE token_hash = ? AND purpose = ? RETURNING account_id",
        )
        .bind(&token_hash)
        .bind(purpose.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_db_error("Failed to delete expired token", e))?;

        if expired.is_some() {
            Ok(TokenRedemption::Expired)
        } else {
            Ok(TokenRedemption::Invalid)
        }
    }

    async fn delete_tokens_for_account(&self, account_id: &AccountId) -> Result<u64, Error> {
        let result = sqlx::query("DELETE FROM tokens WHERE account_id = ?")
            .bind(account_id.as_str())
            .execute(&self.pool)
            .await
            .map_err(|e| map_db_error("Failed to delete tokens for account", e))?;

        Ok(result.rows_affected())
    }

    async fn cleanup_expired_tokens(&self) -> Result<u64, Error> {
        let result = sqlx::query("DELETE FROM tokens WHERE expires_at <= ?")
            .bind(Utc::now().timestamp())
            .execute(&self.pool)
            .await
            .map_err(|e| map_db_error("Failed to cleanup expired tokens", e))?;

        Ok(result.rows_affected())
    }
}
