//! SQLite implementation of the lockout repository.
//!
//! The failure counter and lock timestamp live on the accounts row. Every
//! mutation is a single `UPDATE`, which SQLite executes atomically, so
//! concurrent failure reports cannot lose an increment or fire the lock
//! transition twice.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use vigil_core::{AccountId, Error, lockout::AttemptSnapshot, repositories::LockoutRepository};

use super::map_db_error;

pub struct SqliteLockoutRepository {
    pool: SqlitePool,
}

impl SqliteLockoutRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

/// Internal struct for query results
#[derive(Debug, sqlx::FromRow)]
struct SqliteAttemptRow {
    failed_login_attempts: i64,
    locked_at: Option<i64>,
}

impl From<SqliteAttemptRow> for AttemptSnapshot {
    fn from(row: SqliteAttemptRow) -> Self {
        AttemptSnapshot {
            failed_attempts: row.failed_login_attempts as u32,
            locked_at: row.locked_at.and_then(|ts| DateTime::from_timestamp(ts, 0)),
        }
    }
}

#[async_trait]
impl LockoutRepository for SqliteLockoutRepository {
    async fn record_failure(
        &self,
        account_id: &AccountId,
        threshold: u32,
        now: DateTime<Utc>,
    ) -> Result<AttemptSnapshot, Error> {
        let now_ts = now.timestamp();

        // Both CASE arms read the pre-update row, so the increment and the
        // conditional lock happen against the same observed state. A locked
        // row passes through unchanged except for updated_at.
        let row = sqlx::query_as::<_, SqliteAttemptRow>(
            r#"
            UPDATE accounts
            SET failed_login_attempts = CASE
                    WHEN locked_at IS NULL THEN failed_login_attempts + 1
                    ELSE failed_login_attempts
                END,
                locked_at = CASE
                    WHEN locked_at IS NULL AND failed_login_attempts + 1 >= ? THEN ?
                    ELSE locked_at
                END,
                updated_at = ?
            WHERE id = ?
            RETURNING failed_login_attempts, locked_at
            "#,
        )
        .bind(threshold)
        .bind(now_ts)
        .bind(now_ts)
        .bind(account_id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_db_error("Failed to record login failure", e))?;

        // Unknown account: report empty state rather than an error
        Ok(row.map(Into::into).unwrap_or_default())
    }

    async fn clear_failures(&self, account_id: &AccountId) -> Result<(), Error> {
        sqlx::query(
            "UPDATE accounts SET failed_login_attempts = 0, locked_at = NULL, updated_at = ? WHERE id = ?",
        )
        .bind(Utc::now().timestamp())
        .bind(account_id.as_str())
        .execute(&self.pool)
        .await
        .map_err(|e| map_db_error("Failed to clear login failures", e))?;

        Ok(())
    }

    async fn get_attempt_state(&self, account_id: &AccountId) -> Result<AttemptSnapshot, Error> {
        let row = sqlx::query_as::<_, SqliteAttemptRow>(
            "SELECT failed_login_attempts, locked_at FROM accounts WHERE id = ?",
        )
        .bind(account_id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_db_error("Failed to get attempt state", e))?;

        Ok(row.map(Into::into).unwrap_or_default())
    }

    async fn clear_expired_lock(
        &self,
        account_id: &AccountId,
        locked_before: DateTime<Utc>,
    ) -> Result<bool, Error> {
        let result = sqlx::query(
            r#"
            UPDATE accounts
            SET failed_login_attempts = 0, locked_at = NULL, updated_at = ?
            WHERE id = ? AND locked_at IS NOT NULL AND locked_at <= ?
            "#,
        )
        .bind(Utc::now().timestamp())
        .bind(account_id.as_str())
        .bind(locked_before.timestamp())
        .execute(&self.pool)
        .await
        .map_err(|e| map_db_error("Failed to clear expired lock", e))?;

        Ok(result.rows_affected() > 0)
    }
}
