//! # Vigil
//!
//! Vigil is the account-lifecycle core a login system leans on: a lockout
//! guard that counts failed attempts and locks accounts past a threshold, and
//! a single-use token store for email verification and password-reset links.
//! It deliberately stops there — credential checking, session handling, and
//! email delivery belong to the application; Vigil keeps the state machine
//! underneath them correct under concurrency.
//!
//! Properties the library holds under arbitrary concurrent use:
//! - exactly one lock transition per lockout, with no lost counter updates
//! - at most one successful redemption per token value
//! - superseded, consumed, and never-issued tokens are indistinguishable
//! - expired locks and tokens are cleaned up lazily on the next touch
//!
//! ## Storage Support
//!
//! Storage is pluggable through `RepositoryProvider`. A SQLite backend ships
//! in `vigil-storage-sqlite` (enabled by the default `sqlite` feature).
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use vigil::{SqliteRepositoryProvider, Vigil};
//!
//! #[tokio::main]
//! async fn main() {
//!     let pool = vigil_storage_sqlite::connect("sqlite:vigil.db").await.unwrap();
//!     let vigil = Vigil::new(Arc::new(SqliteRepositoryProvider::new(pool)));
//!     vigil.migrate().await.unwrap();
//!
//!     let account = vigil.create_account("user@example.com").await.unwrap();
//!     let token = vigil.issue_verification_token(&account.id).await.unwrap();
//!     // hand token.value() to the mailer...
//! }
//! ```

use std::sync::Arc;

use vigil_core::{
    repositories::{
        AccountRepositoryAdapter, LockoutRepositoryAdapter, TokenRepositoryAdapter,
    },
    services::{
        AccountService, LockoutService, PasswordResetService, TokenService, VerificationService,
    },
};

/// Re-export core types from vigil_core
///
/// These types are commonly used when working with the Vigil API.
pub use vigil_core::{
    Account, AccountId, AccountRedemption, LockoutConfig, LockoutStatus, NewAccount,
    RepositoryProvider, SecureToken, TokenConfig, TokenPurpose, TokenRedemption, TokenValidation,
};

/// Re-export storage backends
///
/// These storage implementations are available when the corresponding feature
/// is enabled.
#[cfg(feature = "sqlite")]
pub use vigil_storage_sqlite::SqliteRepositoryProvider;

/// Errors surfaced by the Vigil facade.
#[derive(Debug, thiserror::Error)]
pub enum VigilError {
    /// Error in account or token handling
    #[error("Auth error: {0}")]
    Auth(String),
    /// Rejected input
    #[error("Validation error: {0}")]
    Validation(String),
    /// Error when interacting with storage
    #[error("Storage error: {0}")]
    Storage(String),
}

impl From<vigil_core::Error> for VigilError {
    fn from(e: vigil_core::Error) -> Self {
        match &e {
            vigil_core::Error::Auth(_) => VigilError::Auth(e.to_string()),
            vigil_core::Error::Validation(_) => VigilError::Validation(e.to_string()),
            vigil_core::Error::Storage(_) => VigilError::Storage(e.to_string()),
        }
    }
}

/// The main entry point, wiring every service to one repository provider.
///
/// ```rust,no_run
/// use std::sync::Arc;
/// use vigil::{LockoutConfig, SqliteRepositoryProvider, Vigil};
///
/// # async fn demo() {
/// let pool = vigil_storage_sqlite::connect("sqlite::memory:").await.unwrap();
/// let vigil = Vigil::new(Arc::new(SqliteRepositoryProvider::new(pool)))
///     .with_lockout_config(LockoutConfig {
///         max_failed_attempts: 5,
///         ..LockoutConfig::default()
///     });
/// # }
/// ```
pub struct Vigil<R: RepositoryProvider> {
    repositories: Arc<R>,
    account_service: Arc<AccountService<AccountRepositoryAdapter<R>, TokenRepositoryAdapter<R>>>,
    lockout_service: Arc<LockoutService<LockoutRepositoryAdapter<R>>>,
    token_service: Arc<TokenService<TokenRepositoryAdapter<R>>>,
    verification_service:
        Arc<VerificationService<AccountRepositoryAdapter<R>, TokenRepositoryAdapter<R>>>,
    password_reset_service: Arc<
        PasswordResetService<
            AccountRepositoryAdapter<R>,
            LockoutRepositoryAdapter<R>,
            TokenRepositoryAdapter<R>,
        >,
    >,
    lockout_config: LockoutConfig,
    token_config: TokenConfig,
}

impl<R: RepositoryProvider> Vigil<R> {
    /// Create a new Vigil instance with default lockout and token
    /// configuration.
    pub fn new(repositories: Arc<R>) -> Self {
        Self::with_configs(repositories, LockoutConfig::default(), TokenConfig::default())
    }

    /// Create a Vigil instance with explicit configuration.
    pub fn with_configs(
        repositories: Arc<R>,
        lockout_config: LockoutConfig,
        token_config: TokenConfig,
    ) -> Self {
        let account_repo = Arc::new(AccountRepositoryAdapter::new(repositories.clone()));
        let lockout_repo = Arc::new(LockoutRepositoryAdapter::new(repositories.clone()));
        let token_repo = Arc::new(TokenRepositoryAdapter::new(repositories.clone()));

        let account_service = Arc::new(AccountService::new(account_repo.clone(), token_repo.clone()));
        let lockout_service = Arc::new(LockoutService::new(lockout_repo, lockout_config.clone()));
        let token_service = Arc::new(TokenService::new(token_repo, token_config.clone()));
        let verification_service = Arc::new(VerificationService::new(
            account_repo.clone(),
            token_service.clone(),
        ));
        let password_reset_service = Arc::new(PasswordResetService::new(
            account_repo,
            lockout_service.clone(),
            token_service.clone(),
        ));

        Self {
            repositories,
            account_service,
            lockout_service,
            token_service,
            verification_service,
            password_reset_service,
            lockout_config,
            token_config,
        }
    }

    /// Replace the lockout configuration.
    pub fn with_lockout_config(self, config: LockoutConfig) -> Self {
        Self::with_configs(self.repositories, config, self.token_config)
    }

    /// Replace the token configuration.
    pub fn with_token_config(self, config: TokenConfig) -> Self {
        Self::with_configs(self.repositories, self.lockout_config, config)
    }

    /// Run migrations for all repositories
    pub async fn migrate(&self) -> Result<(), VigilError> {
        self.repositories.migrate().await.map_err(Into::into)
    }

    /// Health check for all repositories
    pub async fn health_check(&self) -> Result<(), VigilError> {
        self.repositories.health_check().await.map_err(Into::into)
    }

    // ------------------------------------------------------------------
    // Accounts
    // ------------------------------------------------------------------

    /// Register a new, not-yet-verified account.
    pub async fn create_account(&self, email: &str) -> Result<Account, VigilError> {
        self.account_service
            .create_account(email)
            .await
            .map_err(Into::into)
    }

    /// Get an account by its ID, if it exists.
    pub async fn get_account(&self, account_id: &AccountId) -> Result<Option<Account>, VigilError> {
        self.account_service
            .get_account(account_id)
            .await
            .map_err(Into::into)
    }

    /// Get an account by email, if it exists.
    pub async fn get_account_by_email(&self, email: &str) -> Result<Option<Account>, VigilError> {
        self.account_service
            .get_account_by_email(email)
            .await
            .map_err(Into::into)
    }

    /// Delete an account together with every token bound to it.
    pub async fn delete_account(&self, account_id: &AccountId) -> Result<(), VigilError> {
        self.account_service
            .delete_account(account_id)
            .await
            .map_err(Into::into)
    }

    // ------------------------------------------------------------------
    // Lockout guard
    // ------------------------------------------------------------------

    /// Report a failed login attempt and get the updated lockout status.
    pub async fn report_login_failure(
        &self,
        account_id: &AccountId,
    ) -> Result<LockoutStatus, VigilError> {
        self.lockout_service
            .record_login_failure(account_id)
            .await
            .map_err(Into::into)
    }

    /// Report a successful login: the failure counter resets and any lock is
    /// cleared.
    pub async fn report_login_success(&self, account_id: &AccountId) -> Result<(), VigilError> {
        self.lockout_service
            .record_login_success(account_id)
            .await
            .map_err(Into::into)
    }

    /// Whether the account is currently locked out. Consult this before
    /// checking credentials.
    pub async fn is_locked(&self, account_id: &AccountId) -> Result<bool, VigilError> {
        self.lockout_service
            .is_locked(account_id)
            .await
            .map_err(Into::into)
    }

    /// Full lockout status for an account.
    pub async fn lockout_status(
        &self,
        account_id: &AccountId,
    ) -> Result<LockoutStatus, VigilError> {
        self.lockout_service
            .get_lockout_status(account_id)
            .await
            .map_err(Into::into)
    }

    /// The configured failure threshold.
    pub fn max_failed_login_attempts(&self) -> u32 {
        self.lockout_service.max_failed_attempts()
    }

    /// Explicitly unlock an account. Returns whether it had been locked.
    pub async fn unlock_account(&self, account_id: &AccountId) -> Result<bool, VigilError> {
        self.lockout_service
            .unlock_account(account_id)
            .await
            .map_err(Into::into)
    }

    // ------------------------------------------------------------------
    // Email verification
    // ------------------------------------------------------------------

    /// Issue an email verification token, superseding any earlier one.
    pub async fn issue_verification_token(
        &self,
        account_id: &AccountId,
    ) -> Result<SecureToken, VigilError> {
        self.verification_service
            .issue_token(account_id)
            .await
            .map_err(Into::into)
    }

    /// Consume a verification token and mark the bound account verified.
    pub async fn verify_email(&self, token: &str) -> Result<AccountRedemption, VigilError> {
        self.verification_service
            .verify_email(token)
            .await
            .map_err(Into::into)
    }

    // ------------------------------------------------------------------
    // Password reset
    // ------------------------------------------------------------------

    /// Request a password reset token for an email address. Returns `None`
    /// for an unknown email so the endpoint cannot be used to probe which
    /// addresses are registered.
    pub async fn request_password_reset(
        &self,
        email: &str,
    ) -> Result<Option<(Account, SecureToken)>, VigilError> {
        self.password_reset_service
            .request_reset(email)
            .await
            .map_err(Into::into)
    }

    /// Consume a reset token, clear the account's lockout state, and return
    /// the account whose credential the caller should now replace.
    pub async fn complete_password_reset(
        &self,
        token: &str,
    ) -> Result<AccountRedemption, VigilError> {
        self.password_reset_service
            .complete_reset(token)
            .await
            .map_err(Into::into)
    }

    // ------------------------------------------------------------------
    // Tokens
    // ------------------------------------------------------------------

    /// Check a token value of either purpose without consuming it.
    pub async fn check_token(
        &self,
        token: &str,
        purpose: TokenPurpose,
    ) -> Result<TokenValidation, VigilError> {
        self.token_service
            .check_token(token, purpose)
            .await
            .map_err(Into::into)
    }

    /// Sweep expired tokens now. Returns the number removed.
    pub async fn cleanup_expired_tokens(&self) -> Result<u64, VigilError> {
        self.token_service
            .cleanup_expired_tokens()
            .await
            .map_err(Into::into)
    }

    /// Start the hourly background sweep of expired tokens.
    pub fn start_token_cleanup_task(
        &self,
        shutdown: tokio::sync::watch::Receiver<bool>,
    ) -> tokio::task::JoinHandle<()> {
        self.token_service.start_cleanup_task(shutdown)
    }
}
