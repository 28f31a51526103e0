//! Email verification flow.
//!
//! Issues verification tokens and redeems them into a verified, enabled
//! account. The redeem path reports `Expired`/`Invalid` as plain values so
//! the caller can answer a stale link with the same generic message as a
//! forged one.

use crate::{
    AccountId, Error,
    error::AuthError,
    repositories::{AccountRepository, TokenRepository},
    services::TokenService,
    token::{AccountRedemption, SecureToken, TokenPurpose, TokenRedemption, TokenValidation},
};
use std::sync::Arc;

/// Service for email verification operations.
pub struct VerificationService<A: AccountRepository, T: TokenRepository> {
    account_repository: Arc<A>,
    token_service: Arc<TokenService<T>>,
}

impl<A: AccountRepository, T: TokenRepository> VerificationService<A, T> {
    pub fn new(account_repository: Arc<A>, token_service: Arc<TokenService<T>>) -> Self {
        Self {
            account_repository,
            token_service,
        }
    }

    /// Issue a verification token for an account, superseding any earlier one.
    ///
    /// Existence is the caller's contract; an unknown account fails fast
    /// rather than minting an orphan token.
    pub async fn issue_token(&self, account_id: &AccountId) -> Result<SecureToken, Error> {
        self.account_repository
            .find_by_id(account_id)
            .await?
            .ok_or(AuthError::AccountNotFound)?;

        self.token_service
            .issue_token(account_id, TokenPurpose::EmailVerification)
            .await
    }

    /// Check a verification token without consuming it, e.g. before rendering
    /// a confirmation page.
    pub async fn check_token(&self, token: &str) -> Result<TokenValidation, Error> {
        self.token_service
            .check_token(token, TokenPurpose::EmailVerification)
            .await
    }

    /// Consume the token and mark the bound account's email as verified.
    pub async fn verify_email(&self, token: &str) -> Result<AccountRedemption, Error> {
        match self
            .token_service
            .consume_token(token, TokenPurpose::EmailVerification)
            .await?
        {
            TokenRedemption::Redeemed(account_id) => {
                self.account_repository.mark_verified(&account_id).await?;
                match self.account_repository.find_by_id(&account_id).await? {
                    Some(account) => Ok(AccountRedemption::Redeemed(account)),
                    // Account deleted between consume and fetch; reveal nothing
                    None => Ok(AccountRedemption::Invalid),
                }
            }
            TokenRedemption::Expired => Ok(AccountRedemption::Expired),
            TokenRedemption::Invalid => Ok(AccountRedemption::Invalid),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Account, account::NewAccount, token::TokenConfig};
    use async_trait::async_trait;
    use chrono::{Duration, Utc};
    use std::collections::HashMap;
    use std::sync::Mutex;

    #[derive(Default)]
    struct MockAccountRepository {
        accounts: Mutex<HashMap<AccountId, Account>>,
    }

    #[async_trait]
    impl AccountRepository for MockAccountRepository {
        async fn create(&self, new_account: NewAccount) -> Result<Account, Error> {
            let account = Account::builder()
                .id(new_account.id.clone())
                .email(new_account.email)
                .build()?;
            self.accounts
                .lock()
                .unwrap()
                .insert(new_account.id, account.clone());
            Ok(account)
        }

        async fn find_by_id(&self, id: &AccountId) -> Result<Option<Account>, Error> {
            Ok(self.accounts.lock().unwrap().get(id).cloned())
        }

        async fn find_by_email(&self, email: &str) -> Result<Option<Account>, Error> {
            Ok(self
                .accounts
                .lock()
                .unwrap()
                .values()
                .find(|a| a.email == email)
                .cloned())
        }

        async fn mark_verified(&self, id: &AccountId) -> Result<(), Error> {
            if let Some(account) = self.accounts.lock().unwrap().get_mut(id) {
                account.enabled = true;
                account.email_verified_at = Some(Utc::now());
            }
            Ok(())
        }

        async fn delete(&self, id: &AccountId) -> Result<(), Error> {
            self.accounts.lock().unwrap().remove(id);
            Ok(())
        }
    }

    #[derive(Clone)]
    struct StoredToken {
        account_id: AccountId,
        purpose: TokenPurpose,
        expires_at: chrono::DateTime<Utc>,
    }

    #[derive(Default)]
    struct MockTokenRepository {
        tokens: Mutex<HashMap<String, StoredToken>>,
    }

    #[async_trait]
    impl TokenRepository for MockTokenRepository {
        async fn create_token(
            &self,
            account_id: &AccountId,
            purpose: TokenPurpose,
            expires_in: Duration,
        ) -> Result<SecureToken, Error> {
            let token = SecureToken::issue(account_id.clone(), purpose, expires_in);
            let mut tokens = self.tokens.lock().unwrap();
            tokens.retain(|_, t| !(t.account_id == *account_id && t.purpose == purpose));
            tokens.insert(
                token.token_hash.clone(),
                StoredToken {
                    account_id: account_id.clone(),
                    purpose,
                    expires_at: token.expires_at,
                },
            );
            Ok(token)
        }

        async fn check_token(
            &self,
            token: &str,
            purpose: TokenPurpose,
        ) -> Result<TokenValidation, Error> {
            let hash = crate::crypto::hash_token(token);
            let mut tokens = self.tokens.lock().unwrap();
            match tokens.get(&hash) {
                Some(stored) if stored.purpose == purpose => {
                    if stored.expires_at <= Utc::now() {
                        tokens.remove(&hash);
                        Ok(TokenValidation::Expired)
                    } else {
                        Ok(TokenValidation::Valid)
                    }
                }
                _ => Ok(TokenValidation::Invalid),
            }
        }

        async fn consume_token(
            &self,
            token: &str,
            purpose: TokenPurpose,
        ) -> Result<TokenRedemption, Error> {
            let hash = crate::crypto::hash_token(token);
            let mut tokens = self.tokens.lock().unwrap();
            match tokens.get(&hash) {
                Some(stored) if stored.purpose == purpose => {
                    let stored = stored.clone();
                    tokens.remove(&hash);
                    if stored.expires_at <= Utc::now() {
                        Ok(TokenRedemption::Expired)
                    } else {
                        Ok(TokenRedemption::Redeemed(stored.account_id))
                    }
                }
                _ => Ok(TokenRedemption::Invalid),
            }
        }

        async fn delete_tokens_for_account(&self, account_id: &AccountId) -> Result<u64, Error> {
            let mut tokens = self.tokens.lock().unwrap();
            let before = tokens.len();
            tokens.retain(|_, t| t.account_id != *account_id);
            Ok((before - tokens.len()) as u64)
        }

        async fn cleanup_expired_tokens(&self) -> Result<u64, Error> {
            Ok(0)
        }
    }

    fn setup() -> (
        Arc<MockAccountRepository>,
        VerificationService<MockAccountRepository, MockTokenRepository>,
    ) {
        let account_repo = Arc::new(MockAccountRepository::default());
        let token_service = Arc::new(TokenService::new(
            Arc::new(MockTokenRepository::default()),
            TokenConfig::default(),
        ));
        let service = VerificationService::new(account_repo.clone(), token_service);
        (account_repo, service)
    }

    async fn create_account(repo: &MockAccountRepository, email: &str) -> Account {
        repo.create(NewAccount::new(email.to_string())).await.unwrap()
    }

    #[tokio::test]
    async fn test_verify_email_marks_account() {
        let (account_repo, service) = setup();
        let account = create_account(&account_repo, "test@example.com").await;

        let token = service.issue_token(&account.id).await.unwrap();
        let value = token.value().unwrap();

        assert_eq!(
            service.check_token(value).await.unwrap(),
            TokenValidation::Valid
        );

        let outcome = service.verify_email(value).await.unwrap();
        let verified = match outcome {
            AccountRedemption::Redeemed(account) => account,
            other => panic!("expected redemption, got {other:?}"),
        };
        assert!(verified.enabled);
        assert!(verified.is_email_verified());

        // The link is single-use
        assert!(matches!(
            service.verify_email(value).await.unwrap(),
            AccountRedemption::Invalid
        ));
    }

    #[tokio::test]
    async fn test_issue_token_unknown_account_fails_fast() {
        let (_, service) = setup();

        let err = service
            .issue_token(&AccountId::new_random())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Auth(AuthError::AccountNotFound)));
    }

    #[tokio::test]
    async fn test_verify_email_bogus_token() {
        let (_, service) = setup();

        assert!(matches!(
            service.verify_email("bogus").await.unwrap(),
            AccountRedemption::Invalid
        ));
    }
}
