//! Repository implementations for SQLite storage.

pub mod account;
pub mod lockout;
pub mod token;

pub use account::SqliteAccountRepository;
pub use lockout::SqliteLockoutRepository;
pub use token::SqliteTokenRepository;

use async_trait::async_trait;
use sqlx::SqlitePool;
use std::sync::Arc;
use vigil_core::{
    Error,
    error::StorageError,
    repositories::{
        AccountRepositoryProvider, LockoutRepositoryProvider, RepositoryProvider,
        TokenRepositoryProvider,
    },
};
use crate::migrations::SqliteMigrator;

/// Translate a sqlx error into the core taxonomy.
///
/// Busy/locked conditions become `Contention` so the service layer can retry
/// them; everything else is logged here and reported as an opaque database
/// failure.
pub(crate) fn map_db_error(context: &str, e: sqlx::Error) -> Error {
    if let Some(db_err) = e.as_database_error() {
        let message = db_err.message();
        if message.contains("database is locked") || message.contains("database table is locked") {
            return StorageError::Contention(context.to_string()).into();
        }
    }
    tracing::error!(error = %e, "{context}");
    StorageError::Database(context.to_string()).into()
}

/// Repository provider implementation for SQLite.
///
/// Implements the individual repository provider traits as well as the
/// unified `RepositoryProvider` trait.
pub struct SqliteRepositoryProvider {
    pool: SqlitePool,
    account: Arc<SqliteAccountRepository>,
    lockout: Arc<SqliteLockoutRepository>,
    token: Arc<SqliteTokenRepository>,
}

impl SqliteRepositoryProvider {
    pub fn new(pool: SqlitePool) -> Self {
        let account = Arc::new(SqliteAccountRepository::new(pool.clone()));
        let lockout = Arc::new(SqliteLockoutRepository::new(pool.clone()));
        let token = Arc::new(SqliteTokenRepository::new(pool.clone()));

        Self {
            pool,
            account,
            lockout,
            token,
        }
    }
}

impl AccountRepositoryProvider for SqliteRepositoryProvider {
    type AccountRepo = SqliteAccountRepository;

    fn account(&self) -> &Self::AccountRepo {
        &self.account
    }
}

impl LockoutRepositoryProvider for SqliteRepositoryProvider {
    type LockoutRepo = SqliteLockoutRepository;

    fn lockout(&self) -> &Self::LockoutRepo {
        &self.lockout
    }
}

impl TokenRepositoryProvider for SqliteRepositoryProvider {
    type TokenRepo = SqliteTokenRepository;

    fn token(&self) -> &Self::TokenRepo {
        &self.token
    }
}

#[async_trait]
impl RepositoryProvider for SqliteRepositoryProvider {
    async fn migrate(&self) -> Result<(), Error> {
        SqliteMigrator::new(self.pool.clone()).run().await
    }

    async fn health_check(&self) -> Result<(), Error> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| Error::Storage(StorageError::Connection(e.to_string())))?;
        Ok(())
    }
}
