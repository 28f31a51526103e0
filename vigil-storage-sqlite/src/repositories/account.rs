//! SQLite implementation of the account repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use vigil_core::{
    Account, AccountId, Error,
    account::NewAccount,
    error::AuthError,
    repositories::AccountRepository,
};

use super::map_db_error;

pub struct SqliteAccountRepository {
    pool: SqlitePool,
}

impl SqliteAccountRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

/// Internal struct for query results
#[derive(Debug, sqlx::FromRow)]
struct SqliteAccountRow {
    id: String,
    email: String,
    enabled: bool,
    email_verified_at: Option<i64>,
    failed_login_attempts: i64,
    locked_at: Option<i64>,
    created_at: i64,
    updated_at: i64,
}

impl From<SqliteAccountRow> for Account {
    fn from(row: SqliteAccountRow) -> Self {
        Account {
            id: AccountId::new(&row.id),
            email: row.email,
            enabled: row.enabled,
            email_verified_at: row
                .email_verified_at
                .and_then(|ts| DateTime::from_timestamp(ts, 0)),
            failed_login_attempts: row.failed_login_attempts as u32,
            locked_at: row.locked_at.and_then(|ts| DateTime::from_timestamp(ts, 0)),
            created_at: DateTime::from_timestamp(row.created_at, 0).expect("Invalid timestamp"),
            updated_at: DateTime::from_timestamp(row.updated_at, 0).expect("Invalid timestamp"),
        }
    }
}

const ACCOUNT_COLUMNS: &str =
    "id, email, enabled, email_verified_at, failed_login_attempts, locked_at, created_at, updated_at";

#[async_trait]
impl AccountRepository for SqliteAccountRepository {
    async fn create(&self, new_account: NewAccount) -> Result<Account, Error> {
        let now = Utc::now().timestamp();

        let row = sqlx::query_as::<_, SqliteAccountRow>(&format!(
            r#"
            INSERT INTO accounts (id, email, enabled, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?)
            RETURNING {ACCOUNT_COLUMNS}
            "#,
        ))
        .bind(new_account.id.as_str())
        .bind(&new_account.email)
        .bind(new_account.enabled)
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            // The unique index on email is the authoritative duplicate check
            if e.as_database_error()
                .is_some_and(|db| db.is_unique_violation())
            {
                return AuthError::AccountAlreadyExists.into();
            }
            map_db_error("Failed to create account", e)
        })?;

        Ok(row.into())
    }

    async fn find_by_id(&self, id: &AccountId) -> Result<Option<Account>, Error> {
        let row = sqlx::query_as::<_, SqliteAccountRow>(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE id = ?"
        ))
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_db_error("Failed to find account by id", e))?;

        Ok(row.map(Into::into))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, Error> {
        let row = sqlx::query_as::<_, SqliteAccountRow>(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE email = ?"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_db_error("Failed to find account by email", e))?;

        Ok(row.map(Into::into))
    }

    async fn mark_verified(&self, id: &AccountId) -> Result<(), Error> {
        let now = Utc::now().timestamp();

        // No-op for unknown accounts
        sqlx::query("UPDATE accounts SET enabled = 1, email_verified_at = ?, updated_at = ? WHERE id = ?")
            .bind(now)
            .bind(now)
            .bind(id.as_str())
            .execute(&self.pool)
            .await
            .map_err(|e| map_db_error("Failed to mark account verified", e))?;

        Ok(())
    }

    async fn delete(&self, id: &AccountId) -> Result<(), Error> {
        // Tokens go with the account via ON DELETE CASCADE
        sqlx::query("DELETE FROM accounts WHERE id = ?")
            .bind(id.as_str())
            .execute(&self.pool)
            .await
            .map_err(|e| map_db_error("Failed to delete account", e))?;

        Ok(())
    }
}
