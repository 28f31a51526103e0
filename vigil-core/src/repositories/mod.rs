//! Repository traits for the data access layer.
//!
//! Services interact with storage exclusively through these traits. Individual
//! `*Repository` traits define the operations for each data domain; matching
//! `*RepositoryProvider` traits expose each repository from a backend; and
//! [`RepositoryProvider`] combines the provider traits with lifecycle methods
//! so an application can hand one object to the whole service layer.

pub mod account;
pub mod adapter;
pub mod lockout;
pub mod token;

pub use account::AccountRepository;
pub use adapter::{AccountRepositoryAdapter, LockoutRepositoryAdapter, TokenRepositoryAdapter};
pub use lockout::LockoutRepository;
pub use token::TokenRepository;

use async_trait::async_trait;

use crate::Error;

/// Provider trait for account repository access.
pub trait AccountRepositoryProvider: Send + Sync + 'static {
    /// The account repository implementation type
    type AccountRepo: AccountRepository;

    /// Get the account repository
    fn account(&self) -> &Self::AccountRepo;
}

/// Provider trait for lockout repository access.
pub trait LockoutRepositoryProvider: Send + Sync + 'static {
    /// The lockout repository implementation type
    type LockoutRepo: LockoutRepository;

    /// Get the lockout repository
    fn lockout(&self) -> &Self::LockoutRepo;
}

/// Provider trait for token repository access.
pub trait TokenRepositoryProvider: Send + Sync + 'static {
    /// The token repository implementation type
    type TokenRepo: TokenRepository;

    /// Get the token repository
    fn token(&self) -> &Self::TokenRepo;
}

/// Provider trait storage backends implement to supply every repository.
///
/// # Implementing a Custom Storage Backend
///
/// 1. Implement each individual `*Repository` trait for your backend
/// 2. Implement each individual `*RepositoryProvider` trait
/// 3. Implement `RepositoryProvider` with `migrate()` and `health_check()`
#[async_trait]
pub trait RepositoryProvider:
    AccountRepositoryProvider + LockoutRepositoryProvider + TokenRepositoryProvider
{
    /// Run migrations for all repositories
    async fn migrate(&self) -> Result<(), Error>;

    /// Health check for all repositories
    async fn health_check(&self) -> Result<(), Error>;
}
