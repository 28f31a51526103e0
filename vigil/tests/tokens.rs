use std::str::FromStr;
use std::sync::Arc;

use chrono::Duration;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use vigil::{
    AccountRedemption, SqliteRepositoryProvider, TokenConfig, TokenPurpose, TokenValidation,
    Vigil,
};

// In-memory SQLite hands each pooled connection its own database, so the
// pool is pinned to one connection.
async fn setup_with_token_config(config: TokenConfig) -> Vigil<SqliteRepositoryProvider> {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")
        .unwrap()
        .foreign_keys(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await
        .unwrap();

    let vigil =
        Vigil::new(Arc::new(SqliteRepositoryProvider::new(pool))).with_token_config(config);
    vigil.migrate().await.unwrap();
    vigil
}

async fn setup() -> Vigil<SqliteRepositoryProvider> {
    setup_with_token_config(TokenConfig::default()).await
}

#[tokio::test]
async fn test_email_verification_flow() {
    let vigil = setup().await;
    let account = vigil.create_account("user@example.com").await.unwrap();
    assert!(!account.enabled);

    let token = vigil.issue_verification_token(&account.id).await.unwrap();
    let value = token.value().expect("freshly issued token has a value");
    assert_eq!(value.len(), 43);

    assert_eq!(
        vigil
            .check_token(value, TokenPurpose::EmailVerification)
            .await
            .unwrap(),
        TokenValidation::Valid
    );

    let outcome = vigil.verify_email(value).await.unwrap();
    let verified = match outcome {
        AccountRedemption::Redeemed(account) => account,
        other => panic!("expected redemption, got {other:?}"),
    };
    assert_eq!(verified.id, account.id);
    assert!(verified.enabled);
    assert!(verified.is_email_verified());

    // The link is single-use; a replay looks like it never existed
    assert!(matches!(
        vigil.verify_email(value).await.unwrap(),
        AccountRedemption::Invalid
    ));
}

#[tokio::test]
async fn test_expired_token_reported_once_then_invalid() {
    let vigil = setup_with_token_config(TokenConfig {
        verification_ttl: Duration::seconds(0),
        ..TokenConfig::default()
    })
    .await;
    let account = vigil.create_account("user@example.com").await.unwrap();

    let token = vigil.issue_verification_token(&account.id).await.unwrap();
    let value = token.value().unwrap();

    assert_eq!(
        vigil
            .check_token(value, TokenPurpose::EmailVerification)
            .await
            .unwrap(),
        TokenValidation::Expired
    );
    assert_eq!(
        vigil
            .check_token(value, TokenPurpose::EmailVerification)
            .await
            .unwrap(),
        TokenValidation::Invalid
    );

    // Redemption of the (now deleted) value is likewise invalid
    assert!(matches!(
        vigil.verify_email(value).await.unwrap(),
        AccountRedemption::Invalid
    ));
}

#[tokio::test]
async fn test_reissue_supersedes_previous_token() {
    let vigil = setup().await;
    let account = vigil.create_account("user@example.com").await.unwrap();

    let first = vigil.issue_verification_token(&account.id).await.unwrap();
    let second = vigil.issue_verification_token(&account.id).await.unwrap();

    // The old value reports Invalid, not Expired
    assert_eq!(
        vigil
            .check_token(first.value().unwrap(), TokenPurpose::EmailVerification)
            .await
            .unwrap(),
        TokenValidation::Invalid
    );
    assert!(matches!(
        vigil.verify_email(second.value().unwrap()).await.unwrap(),
        AccountRedemption::Redeemed(_)
    ));
}

#[tokio::test]
async fn test_token_purposes_are_isolated() {
    let vigil = setup().await;
    let account = vigil.create_account("user@example.com").await.unwrap();

    let verification = vigil.issue_verification_token(&account.id).await.unwrap();
    let (_, reset) = vigil
        .request_password_reset("user@example.com")
        .await
        .unwrap()
        .unwrap();

    assert_eq!(
        vigil
            .check_token(verification.value().unwrap(), TokenPurpose::PasswordReset)
            .await
            .unwrap(),
        TokenValidation::Invalid
    );
    assert_eq!(
        vigil
            .check_token(reset.value().unwrap(), TokenPurpose::EmailVerification)
            .await
            .unwrap(),
        TokenValidation::Invalid
    );

    // Each remains valid for its own purpose
    assert_eq!(
        vigil
            .check_token(
                verification.value().unwrap(),
                TokenPurpose::EmailVerification
            )
            .await
            .unwrap(),
        TokenValidation::Valid
    );
    assert_eq!(
        vigil
            .check_token(reset.value().unwrap(), TokenPurpose::PasswordReset)
            .await
            .unwrap(),
        TokenValidation::Valid
    );
}

#[tokio::test]
async fn test_tampered_value_is_invalid_and_original_survives() {
    let vigil = setup().await;
    let account = vigil.create_account("user@example.com").await.unwrap();

    let token = vigil.issue_verification_token(&account.id).await.unwrap();
    let value = token.value().unwrap().to_string();

    let mut tampered = value.clone();
    let last = tampered.pop().unwrap();
    tampered.push(if last == 'A' { 'B' } else { 'A' });

    assert_eq!(
        vigil
            .check_token(&tampered, TokenPurpose::EmailVerification)
            .await
            .unwrap(),
        TokenValidation::Invalid
    );
    assert_eq!(
        vigil
            .check_token(&value, TokenPurpose::EmailVerification)
            .await
            .unwrap(),
        TokenValidation::Valid
    );
}

#[tokio::test]
async fn test_unknown_email_reset_request_reveals_nothing() {
    let vigil = setup().await;

    let result = vigil
        .request_password_reset("nobody@example.com")
        .await
        .unwrap();
    assert!(result.is_none());
}

#[tokio::test]
async fn test_concurrent_redemption_has_single_winner() {
    let vigil = Arc::new(setup().await);
    vigil.create_account("user@example.com").await.unwrap();

    let (_, token) = vigil
        .request_password_reset("user@example.com")
        .await
        .unwrap()
        .unwrap();
    let value = token.value().unwrap().to_string();

    let mut handles = Vec::new();
    for _ in 0..8 {
        let vigil = Arc::clone(&vigil);
        let value = value.clone();
        handles.push(tokio::spawn(async move {
            vigil.complete_password_reset(&value).await
        }));
    }

    let mut redeemed = 0;
    let mut invalid = 0;
    for handle in handles {
        match handle.await.expect("task panicked").expect("redeem failed") {
            AccountRedemption::Redeemed(_) => redeemed += 1,
            AccountRedemption::Invalid => invalid += 1,
            AccountRedemption::Expired => panic!("token was not expired"),
        }
    }

    assert_eq!(redeemed, 1);
    assert_eq!(invalid, 7);
}

#[tokio::test]
async fn test_delete_account_invalidates_tokens() {
    let vigil = setup().await;
    let account = vigil.create_account("user@example.com").await.unwrap();

    let token = vigil.issue_verification_token(&account.id).await.unwrap();
    vigil.delete_account(&account.id).await.unwrap();

    assert_eq!(
        vigil
            .check_token(token.value().unwrap(), TokenPurpose::EmailVerification)
            .await
            .unwrap(),
        TokenValidation::Invalid
    );
    assert!(vigil.get_account(&account.id).await.unwrap().is_none());
}

#[tokio::test]
async fn test_empty_input_is_invalid() {
    let vigil = setup().await;

    assert_eq!(
        vigil
            .check_token("", TokenPurpose::EmailVerification)
            .await
            .unwrap(),
        TokenValidation::Invalid
    );
    assert!(matches!(
        vigil.verify_email("").await.unwrap(),
        AccountRedemption::Invalid
    ));
    assert!(matches!(
        vigil.complete_password_reset("   ").await.unwrap(),
        AccountRedemption::Invalid
    ));
}

#[tokio::test]
async fn test_manual_cleanup_sweeps_expired() {
    let vigil = setup_with_token_config(TokenConfig {
        verification_ttl: Duration::seconds(0),
        ..TokenConfig::default()
    })
    .await;
    let account = vigil.create_account("user@example.com").await.unwrap();

    vigil.issue_verification_token(&account.id).await.unwrap();
    let (_, live) = vigil
        .request_password_reset("user@example.com")
        .await
        .unwrap()
        .unwrap();

    assert_eq!(vigil.cleanup_expired_tokens().await.unwrap(), 1);
    assert_eq!(
        vigil
            .check_token(live.value().unwrap(), TokenPurpose::PasswordReset)
            .await
            .unwrap(),
        TokenValidation::Valid
    );
}
