//! Authentication service
//!
//! Registration, login and refresh over a [`UserStore`] and a
//! [`TokenManager`].

use std::sync::Arc;

use chrono::Duration;
use thiserror::Error;
use validator::Validate;

use crate::models::{Account, LoginRequest, RegisterRequest};
use crate::store::{StoreError, UserStore};

use super::jwt::{Claims, JwtError, TokenKind, TokenManager};
use super::password::{hash_password, verify_password, PasswordError};

/// Auth service errors
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Password error: {0}")]
    Password(#[from] PasswordError),

    #[error("Token error: {0}")]
    Token(#[from] JwtError),

    #[error("Account creation failed: {0}")]
    AccountCreationFailed(String),

    #[error("Account not found")]
    AccountNotFound,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Store error: {0}")]
    Store(StoreError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<StoreError> for AuthError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound => AuthError::AccountNotFound,
            other => AuthError::Store(other),
        }
    }
}

impl From<validator::ValidationErrors> for AuthError {
    fn from(e: validator::ValidationErrors) -> Self {
        AuthError::Validation(e.to_string())
    }
}

/// A freshly issued access/refresh pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// Authentication service
#[derive(Clone)]
pub struct AuthService {
    store: Arc<dyn UserStore>,
    tokens: Arc<dyn TokenManager>,
    access_token_ttl: Duration,
    refresh_token_ttl: Duration,
    bcrypt_cost: u32,
}

impl AuthService {
    /// Create a new AuthService
    pub fn new(
        store: Arc<dyn UserStore>,
        tokens: Arc<dyn TokenManager>,
        access_token_ttl: Duration,
        refresh_token_ttl: Duration,
        bcrypt_cost: u32,
    ) -> Self {
        Self {
            store,
            tokens,
            access_token_ttl,
            refresh_token_ttl,
            bcrypt_cost,
        }
    }

    /// Hash the submitted password and create the account.
    ///
    /// Registration never logs the caller in.
    pub async fn register(&self, request: RegisterRequest) -> Result<Account, AuthError> {
        request.validate()?;

        let RegisterRequest {
            username,
            email,
            password,
        } = request;

        let cost = self.bcrypt_cost;
        let password_hash = tokio::task::spawn_blocking(move || hash_password(&password, cost))
            .await
            .map_err(|e| AuthError::Internal(e.to_string()))??;

        let account = Account::new(username, email, password_hash);
        self.store.create(&account).await.map_err(|e| match e {
            StoreError::Duplicate(constraint) => AuthError::AccountCreationFailed(constraint),
            other => AuthError::Store(other),
        })?;

        tracing::info!(account_id = %account.id, username = %account.username, "Account registered");

        Ok(account)
    }

    /// Check an email/password pair and issue a token pair.
    pub async fn authorize_email(&self, request: &LoginRequest) -> Result<TokenPair, AuthError> {
        let account = self.store.get_user(&request.email).await?;

        let plaintext = request.password.clone();
        let stored_hash = account.password_hash.clone();
        let matches = tokio::task::spawn_blocking(move || verify_password(&plaintext, &stored_hash))
            .await
            .map_err(|e| AuthError::Internal(e.to_string()))??;

        if !matches {
            tracing::debug!(account_id = %account.id, "Password mismatch");
            return Err(AuthError::InvalidCredentials);
        }

        let tokens = self.issue_pair(&account)?;
        tracing::info!(account_id = %account.id, "Login succeeded");

        Ok(tokens)
    }

    /// Look up the account by email and issue a token pair for it.
    pub async fn generate_tokens(&self, email: &str) -> Result<TokenPair, AuthError> {
        let account = self.store.get_user(email).await?;
        self.issue_pair(&account)
    }

    /// Exchange the claims of an already validated refresh token for a new
    /// pair. The account must still exist.
    pub async fn refresh(&self, claims: &Claims) -> Result<TokenPair, AuthError> {
        let tokens = self.generate_tokens(&claims.email).await?;
        tracing::info!(username = %claims.username, "Tokens refreshed");
        Ok(tokens)
    }

    /// Validate a token of the given kind.
    pub fn parse_token(&self, token: &str, kind: TokenKind) -> Result<Claims, AuthError> {
        Ok(self.tokens.parse_token(token, kind)?)
    }

    fn issue_pair(&self, account: &Account) -> Result<TokenPair, AuthError> {
        let access_token = self.tokens.create_token(
            &account.username,
            &account.email,
            self.access_token_ttl,
            TokenKind::Access,
        )?;
        let refresh_token = self.tokens.create_token(
            &account.username,
            &account.email,
            self.refresh_token_ttl,
            TokenKind::Refresh,
        )?;

        Ok(TokenPair {
            access_token,
            refresh_token,
        })
    }

    /// Get an account by email
    pub async fn get_user(&self, email: &str) -> Result<Account, AuthError> {
        Ok(self.store.get_user(email).await?)
    }

    /// List all accounts
    pub async fn get_all(&self) -> Result<Vec<Account>, AuthError> {
        Ok(self.store.get_all().await?)
    }

    /// Update an account as-is; `password_hash` must already be a hash
    pub async fn update(&self, account: &Account) -> Result<(), AuthError> {
        Ok(self.store.update(account).await?)
    }

    /// Create an account as-is; `password_hash` must already be a hash
    pub async fn create(&self, account: &Account) -> Result<(), AuthError> {
        Ok(self.store.create(account).await?)
    }

    /// Delete an account by username
    pub async fn delete(&self, username: &str) -> Result<(), AuthError> {
        Ok(self.store.delete(username).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::JwtTokenManager;
    use crate::config::TokenSecrets;
    use crate::store::InMemoryUserStore;

    const TEST_COST: u32 = 4;

    /// Token manager that refuses to sign anything
    struct FailingTokenManager;

    impl TokenManager for FailingTokenManager {
        fn create_token(
            &self,
            _username: &str,
            _email: &str,
            _ttl: Duration,
            _kind: TokenKind,
        ) -> Result<String, JwtError> {
            Err(JwtError::SigningFailed("unavailable".to_string()))
        }

        fn parse_token(&self, _token: &str, _kind: TokenKind) -> Result<Claims, JwtError> {
            Err(JwtError::InvalidSignature)
        }
    }

    fn service_with(store: InMemoryUserStore) -> AuthService {
        AuthService::new(
            Arc::new(store),
            Arc::new(JwtTokenManager::new(&TokenSecrets::new("acc", "ref"))),
            Duration::seconds(900),
            Duration::hours(1),
            TEST_COST,
        )
    }

    fn register_request() -> RegisterRequest {
        RegisterRequest {
            username: "a".to_string(),
            email: "a@x.com".to_string(),
            password: "pw123".to_string(),
        }
    }

    fn login(password: &str) -> LoginRequest {
        LoginRequest {
            email: "a@x.com".to_string(),
            password: password.to_string(),
        }
    }

    #[tokio::test]
    async fn test_register_stores_hash() {
        let store = InMemoryUserStore::new();
        let service = service_with(store.clone());

        service.register(register_request()).await.unwrap();

        let stored = store.get_user("a@x.com").await.unwrap();
        assert_ne!(stored.password_hash, "pw123");
        assert!(verify_password("pw123", &stored.password_hash).unwrap());
    }

    #[tokio::test]
    async fn test_register_rejects_invalid_input() {
        let store = InMemoryUserStore::new();
        let service = service_with(store.clone());
        let request = RegisterRequest {
            email: "not-an-email".to_string(),
            ..register_request()
        };

        let result = service.register(request).await;
        assert!(matches!(result, Err(AuthError::Validation(_))));
        assert!(store.get_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_register_duplicate() {
        let service = service_with(InMemoryUserStore::new());
        service.register(register_request()).await.unwrap();

        let result = service.register(register_request()).await;
        assert!(matches!(result, Err(AuthError::AccountCreationFailed(_))));
    }

    #[tokio::test]
    async fn test_login_and_refresh_flow() {
        let service = service_with(InMemoryUserStore::new());
        service.register(register_request()).await.unwrap();

        let first = service.authorize_email(&login("pw123")).await.unwrap();
        assert!(!first.access_token.is_empty());
        assert_ne!(first.access_token, first.refresh_token);

        let claims = service
            .parse_token(&first.refresh_token, TokenKind::Refresh)
            .unwrap();
        assert_eq!(claims.email, "a@x.com");
        assert_eq!(claims.username, "a");

        let second = service.refresh(&claims).await.unwrap();
        assert_ne!(second.access_token, first.access_token);
        assert_ne!(second.refresh_token, first.refresh_token);
        assert!(service
            .parse_token(&second.access_token, TokenKind::Access)
            .is_ok());
    }

    #[tokio::test]
    async fn test_login_wrong_password() {
        let service = service_with(InMemoryUserStore::new());
        service.register(register_request()).await.unwrap();

        let result = service.authorize_email(&login("wrong")).await;
        assert!(matches!(result, Err(AuthError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn test_login_unknown_account() {
        let service = service_with(InMemoryUserStore::new());

        let result = service.authorize_email(&login("pw123")).await;
        assert!(matches!(result, Err(AuthError::AccountNotFound)));
    }

    #[tokio::test]
    async fn test_login_with_corrupt_hash() {
        let store = InMemoryUserStore::new();
        store
            .create(&Account::new(
                "a".to_string(),
                "a@x.com".to_string(),
                "plaintext-by-mistake".to_string(),
            ))
            .await
            .unwrap();
        let service = service_with(store);

        let result = service.authorize_email(&login("pw123")).await;
        assert!(matches!(
            result,
            Err(AuthError::Password(PasswordError::MalformedHash))
        ));
    }

    #[tokio::test]
    async fn test_refresh_for_deleted_account() {
        let service = service_with(InMemoryUserStore::new());
        service.register(register_request()).await.unwrap();
        let tokens = service.authorize_email(&login("pw123")).await.unwrap();
        let claims = service
            .parse_token(&tokens.refresh_token, TokenKind::Refresh)
            .unwrap();

        service.delete("a").await.unwrap();

        let result = service.refresh(&claims).await;
        assert!(matches!(result, Err(AuthError::AccountNotFound)));
    }

    #[tokio::test]
    async fn test_signing_failure_propagates() {
        let store = InMemoryUserStore::new();
        let service = AuthService::new(
            Arc::new(store),
            Arc::new(FailingTokenManager),
            Duration::seconds(900),
            Duration::hours(1),
            TEST_COST,
        );
        service.register(register_request()).await.unwrap();

        let result = service.authorize_email(&login("pw123")).await;
        assert!(matches!(
            result,
            Err(AuthError::Token(JwtError::SigningFailed(_)))
        ));
    }

    #[tokio::test]
    async fn test_oversized_lifetime_fails_login() {
        let service = AuthService::new(
            Arc::new(InMemoryUserStore::new()),
            Arc::new(JwtTokenManager::new(&TokenSecrets::new("acc", "ref"))),
            Duration::seconds(900),
            Duration::seconds(1_000_000_000_000_000),
            TEST_COST,
        );
        service.register(register_request()).await.unwrap();

        let result = service.authorize_email(&login("pw123")).await;
        assert!(matches!(
            result,
            Err(AuthError::Token(JwtError::SigningFailed(_)))
        ));
    }

    #[tokio::test]
    async fn test_pass_through_administration() {
        let service = service_with(InMemoryUserStore::new());
        let mut account = service.register(register_request()).await.unwrap();

        let hash = hash_password("other-pw", TEST_COST).unwrap();
        let second = Account::new("b".to_string(), "b@x.com".to_string(), hash);
        service.create(&second).await.unwrap();

        let clash = Account::new("b".to_string(), "b2@x.com".to_string(), "x".to_string());
        assert!(matches!(
            service.create(&clash).await,
            Err(AuthError::Store(StoreError::Duplicate(_)))
        ));
        let created = service.get_user("b@x.com").await.unwrap();
        assert!(verify_password("other-pw", &created.password_hash).unwrap());

        account.username = "renamed".to_string();
        service.update(&account).await.unwrap();
        assert_eq!(
            service.get_user("a@x.com").await.unwrap().username,
            "renamed"
        );
        assert_eq!(service.get_all().await.unwrap().len(), 2);

        service.delete("renamed").await.unwrap();
        assert!(matches!(
            service.get_user("a@x.com").await,
            Err(AuthError::AccountNotFound)
        ));
    }
}
