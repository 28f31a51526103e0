//! Service layer for the account lockout and token lifecycles.
//!
//! Services hold configuration and coordinate repositories; all shared mutable
//! state lives behind the repository traits, so every service is safe to share
//! across tasks.

pub mod account;
pub mod lockout;
pub mod password_reset;
pub mod token;
pub mod verification;

pub use account::AccountService;
pub use lockout::LockoutService;
pub use password_reset::PasswordResetService;
pub use token::TokenService;
pub use verification::VerificationService;

use crate::Error;

/// Bounded retries for transient serialization conflicts before the error is
/// surfaced to the caller.
const MAX_CONTENTION_RETRIES: u32 = 3;

/// Re-run `op` while it fails with `StorageError::Contention`, up to
/// [`MAX_CONTENTION_RETRIES`] times, with a short linear backoff.
pub(crate) async fn with_contention_retry<T, F, Fut>(mut op: F) -> Result<T, Error>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, Error>>,
{
    let mut attempt = 0;
    loop {
        match op().await {
            Err(err) if err.is_contention() && attempt < MAX_CONTENTION_RETRIES => {
                attempt += 1;
                tracing::debug!(attempt, error = %err, "retrying after serialization conflict");
                tokio::time::sleep(std::time::Duration::from_millis(10 * attempt as u64)).await;
            }
            other => return other,
        }
    }
}
