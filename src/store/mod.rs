//! Account persistence
//!
//! The orchestrator only ever talks to a [`UserStore`]; Postgres backs it in
//! production and an in-memory map backs it in tests.

use async_trait::async_trait;
use thiserror::Error;

use crate::models::Account;

mod memory;
mod postgres;

pub use memory::InMemoryUserStore;
pub use postgres::PgUserStore;

/// User store errors
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Account not found")]
    NotFound,

    #[error("Account already exists: {0}")]
    Duplicate(String),

    #[error("Database error: {0}")]
    Database(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::RowNotFound => StoreError::NotFound,
            sqlx::Error::Database(ref db) if db.code().as_deref() == Some("23505") => {
                StoreError::Duplicate(db.constraint().unwrap_or("unique").to_string())
            }
            _ => StoreError::Database(e.to_string()),
        }
    }
}

/// CRUD persistence of account records
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Look up an account by email.
    async fn get_user(&self, email: &str) -> Result<Account, StoreError>;

    /// All accounts, oldest first.
    async fn get_all(&self) -> Result<Vec<Account>, StoreError>;

    /// Overwrite username, email and hash of the account with `account.id`.
    async fn update(&self, account: &Account) -> Result<(), StoreError>;

    /// Insert a new account; email and username must be unused.
    async fn create(&self, account: &Account) -> Result<(), StoreError>;

    /// Remove the account with the given username.
    async fn delete(&self, username: &str) -> Result<(), StoreError>;
}
