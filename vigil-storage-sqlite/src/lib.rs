//! SQLite storage backend for the vigil account-lifecycle library.
//!
//! Implements every `vigil-core` repository trait over a `sqlx::SqlitePool`
//! and exposes them through [`SqliteRepositoryProvider`]. Timestamps are
//! stored as integer Unix seconds. Atomicity relies on single-statement
//! `UPDATE … RETURNING` / `DELETE … RETURNING` forms, which SQLite serializes,
//! so the lockout transition and token consumption need no explicit locking.

pub mod migrations;
pub mod repositories;

pub use migrations::SqliteMigrator;
pub use repositories::{
    SqliteAccountRepository, SqliteLockoutRepository, SqliteRepositoryProvider,
    SqliteTokenRepository,
};

use sqlx::{
    SqlitePool,
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
};
use std::str::FromStr;
use vigil_core::{Error, error::StorageError};

/// Open a pool with the options the repositories assume: foreign keys on (the
/// tokens table cascades from accounts) and the database file created on
/// first use.
pub async fn connect(url: &str) -> Result<SqlitePool, Error> {
    let options = SqliteConnectOptions::from_str(url)
        .map_err(|e| Error::Storage(StorageError::Connection(e.to_string())))?
        .create_if_missing(true)
        .foreign_keys(true);

    SqlitePoolOptions::new()
        .connect_with(options)
        .await
        .map_err(|e| Error::Storage(StorageError::Connection(e.to_string())))
}
