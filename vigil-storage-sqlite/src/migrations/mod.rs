//! Schema migrations for the SQLite backend.
//!
//! The schema is small enough to express as an ordered list of SQL steps
//! rather than a pluggable migration framework. Applied versions are tracked
//! in `_vigil_migrations` so reruns are idempotent, and each step applies
//! inside its own transaction.

use sqlx::SqlitePool;
use vigil_core::{Error, error::StorageError};

const MIGRATIONS_TABLE: &str = "_vigil_migrations";

/// One versioned schema change, applied in a single transaction.
struct SchemaStep {
    version: i64,
    name: &'static str,
    statements: &'static [&'static str],
}

const SCHEMA: &[SchemaStep] = &[
    SchemaStep {
        version: 1,
        name: "create_accounts",
        statements: &[
            // Lockout state lives on the account row so failure counting and
            // the lock transition can be one atomic UPDATE.
            r#"
            CREATE TABLE IF NOT EXISTS accounts (
                id TEXT PRIMARY KEY,
                email TEXT NOT NULL UNIQUE,
                enabled INTEGER NOT NULL DEFAULT 0,
                email_verified_at INTEGER,
                failed_login_attempts INTEGER NOT NULL DEFAULT 0,
                locked_at INTEGER,
                created_at INTEGER NOT NULL,
                updated_at INTEGER NOT NULL
            )
            "#,
        ],
    },
    SchemaStep {
        version: 2,
        name: "create_tokens",
        statements: &[
            // token_hash is the lookup key; plaintext values are never
            // stored. The (account_id, purpose) uniqueness is what makes
            // issue supersede.
            r#"
            CREATE TABLE IF NOT EXISTS tokens (
                token_hash TEXT PRIMARY KEY,
                account_id TEXT NOT NULL REFERENCES accounts(id) ON DELETE CASCADE,
                purpose TEXT NOT NULL,
                expires_at INTEGER NOT NULL,
                created_at INTEGER NOT NULL,
                UNIQUE (account_id, purpose)
            )
            "#,
        ],
    },
    SchemaStep {
        version: 3,
        name: "create_token_indexes",
        statements: &[
            "CREATE INDEX IF NOT EXISTS idx_tokens_account_id ON tokens(account_id)",
            "CREATE INDEX IF NOT EXISTS idx_tokens_expires_at ON tokens(expires_at)",
        ],
    },
];

/// Brings a database up to the current schema, tracking what has already run.
pub struct SqliteMigrator {
    pool: SqlitePool,
}

impl SqliteMigrator {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Apply every pending schema step. Idempotent across restarts.
    pub async fn run(&self) -> Result<(), Error> {
        sqlx::query(&format!(
            r#"
            CREATE TABLE IF NOT EXISTS {MIGRATIONS_TABLE} (
                version INTEGER PRIMARY KEY,
                name TEXT NOT NULL,
                applied_at INTEGER NOT NULL DEFAULT (unixepoch())
            )
            "#
        ))
        .execute(&self.pool)
        .await
        .map_err(migration_error)?;

        for step in SCHEMA {
            if self.is_applied(step.version).await? {
                continue;
            }

            tracing::info!("Applying migration {} ({})", step.name, step.version);

            let mut tx = self.pool.begin().await.map_err(migration_error)?;
            for statement in step.statements {
                sqlx::query(statement)
                    .execute(&mut *tx)
                    .await
                    .map_err(migration_error)?;
            }
            sqlx::query(&format!(
                "INSERT INTO {MIGRATIONS_TABLE} (version, name) VALUES (?, ?)"
            ))
            .bind(step.version)
            .bind(step.name)
            .execute(&mut *tx)
            .await
            .map_err(migration_error)?;
            tx.commit().await.map_err(migration_error)?;
        }

        Ok(())
    }

    /// Versions recorded as applied, in order.
    pub async fn applied_versions(&self) -> Result<Vec<i64>, Error> {
        let versions: Vec<i64> = sqlx::query_scalar(&format!(
            "SELECT version FROM {MIGRATIONS_TABLE} ORDER BY version"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(migration_error)?;

        Ok(versions)
    }

    async fn is_applied(&self, version: i64) -> Result<bool, Error> {
        let applied: bool = sqlx::query_scalar(&format!(
            "SELECT EXISTS(SELECT 1 FROM {MIGRATIONS_TABLE} WHERE version = ?)"
        ))
        .bind(version)
        .fetch_one(&self.pool)
        .await
        .map_err(migration_error)?;

        Ok(applied)
    }
}

fn migration_error(e: sqlx::Error) -> Error {
    StorageError::Migration(e.to_string()).into()
}
