use std::str::FromStr;
use std::sync::Arc;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use vigil::{AccountRedemption, SqliteRepositoryProvider, Vigil};

// In-memory SQLite hands each pooled connection its own database, so the
// pool is pinned to one connection.
async fn setup() -> Vigil<SqliteRepositoryProvider> {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")
        .unwrap()
        .foreign_keys(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await
        .unwrap();

    let vigil = Vigil::new(Arc::new(SqliteRepositoryProvider::new(pool)));
    vigil.migrate().await.unwrap();
    vigil
}

#[tokio::test]
async fn test_lockout_after_threshold_failures() {
    let vigil = setup().await;
    let account = vigil.create_account("user@example.com").await.unwrap();

    let threshold = vigil.max_failed_login_attempts();
    assert_eq!(threshold, 3);

    for _ in 0..threshold - 1 {
        let status = vigil.report_login_failure(&account.id).await.unwrap();
        assert!(!status.is_locked);
    }

    let status = vigil.report_login_failure(&account.id).await.unwrap();
    assert!(status.is_locked);
    assert_eq!(status.failed_attempts, threshold);
    assert!(status.locked_until.is_some());

    assert!(vigil.is_locked(&account.id).await.unwrap());

    // The persisted row reflects the lock
    let stored = vigil.get_account(&account.id).await.unwrap().unwrap();
    assert!(stored.locked());
    assert!(stored.locked_at.is_some());
    assert_eq!(stored.failed_login_attempts, threshold);
}

#[tokio::test]
async fn test_success_resets_lockout_state() {
    let vigil = setup().await;
    let account = vigil.create_account("user@example.com").await.unwrap();

    for _ in 0..3 {
        vigil.report_login_failure(&account.id).await.unwrap();
    }
    assert!(vigil.is_locked(&account.id).await.unwrap());

    vigil.report_login_success(&account.id).await.unwrap();

    assert!(!vigil.is_locked(&account.id).await.unwrap());
    let stored = vigil.get_account(&account.id).await.unwrap().unwrap();
    assert_eq!(stored.failed_login_attempts, 0);
    assert!(stored.locked_at.is_none());
}

#[tokio::test]
async fn test_failure_reports_past_lock_never_error() {
    let vigil = setup().await;
    let account = vigil.create_account("user@example.com").await.unwrap();

    for _ in 0..10 {
        vigil.report_login_failure(&account.id).await.unwrap();
    }

    let status = vigil.lockout_status(&account.id).await.unwrap();
    assert!(status.is_locked);
    assert_eq!(status.failed_attempts, 3);
}

#[tokio::test]
async fn test_concurrent_failures_lock_once_without_errors() {
    let vigil = Arc::new(setup().await);
    let account = vigil.create_account("user@example.com").await.unwrap();

    let mut handles = Vec::new();
    for _ in 0..10 {
        let vigil = Arc::clone(&vigil);
        let account_id = account.id.clone();
        handles.push(tokio::spawn(async move {
            vigil.report_login_failure(&account_id).await
        }));
    }

    for handle in handles {
        handle.await.expect("task panicked").expect("report failed");
    }

    let stored = vigil.get_account(&account.id).await.unwrap().unwrap();
    assert!(stored.locked());
    assert!(stored.failed_login_attempts >= 3);
}

#[tokio::test]
async fn test_password_reset_unlocks_account() {
    let vigil = setup().await;
    let account = vigil.create_account("user@example.com").await.unwrap();

    for _ in 0..3 {
        vigil.report_login_failure(&account.id).await.unwrap();
    }
    assert!(vigil.is_locked(&account.id).await.unwrap());

    let (_, token) = vigil
        .request_password_reset("user@example.com")
        .await
        .unwrap()
        .expect("account exists");

    let outcome = vigil
        .complete_password_reset(token.value().unwrap())
        .await
        .unwrap();
    assert!(matches!(outcome, AccountRedemption::Redeemed(_)));

    assert!(!vigil.is_locked(&account.id).await.unwrap());
}

#[tokio::test]
async fn test_explicit_unlock() {
    let vigil = setup().await;
    let account = vigil.create_account("user@example.com").await.unwrap();

    for _ in 0..3 {
        vigil.report_login_failure(&account.id).await.unwrap();
    }

    assert!(vigil.unlock_account(&account.id).await.unwrap());
    assert!(!vigil.unlock_account(&account.id).await.unwrap());
    assert!(!vigil.is_locked(&account.id).await.unwrap());
}

#[tokio::test]
async fn test_unknown_account_is_unlocked_and_harmless() {
    let vigil = setup().await;
    let ghost = vigil::AccountId::new_random();

    assert!(!vigil.is_locked(&ghost).await.unwrap());
    let status = vigil.report_login_failure(&ghost).await.unwrap();
    assert!(!status.is_locked);
    assert_eq!(status.failed_attempts, 0);
    vigil.report_login_success(&ghost).await.unwrap();
}
