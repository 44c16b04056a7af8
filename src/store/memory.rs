//! In-memory user store for tests and local runs without a database

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{StoreError, UserStore};
use crate::models::Account;

#[derive(Clone, Default)]
pub struct InMemoryUserStore {
    accounts: Arc<RwLock<HashMap<Uuid, Account>>>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn conflict(existing: &Account, candidate: &Account) -> Option<&'static str> {
    if existing.id == candidate.id {
        return None;
    }
    if existing.email == candidate.email {
        Some("users_email_key")
    } else if existing.username == candidate.username {
        Some("users_username_key")
    } else {
        None
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn get_user(&self, email: &str) -> Result<Account, StoreError> {
        let accounts = self.accounts.read().await;
        accounts
            .values()
            .find(|a| a.email == email)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn get_all(&self) -> Result<Vec<Account>, StoreError> {
        let accounts = self.accounts.read().await;
        let mut all: Vec<Account> = accounts.values().cloned().collect();
        all.sort_by_key(|a| a.created_at);
        Ok(all)
    }

    async fn update(&self, account: &Account) -> Result<(), StoreError> {
        let mut accounts = self.accounts.write().await;
        if !accounts.contains_key(&account.id) {
            return Err(StoreError::NotFound);
        }
        if let Some(constraint) = accounts.values().find_map(|a| conflict(a, account)) {
            return Err(StoreError::Duplicate(constraint.to_string()));
        }

        let mut updated = account.clone();
        updated.updated_at = Utc::now();
        accounts.insert(account.id, updated);
        Ok(())
    }

    async fn create(&self, account: &Account) -> Result<(), StoreError> {
        let mut accounts = self.accounts.write().await;
        if accounts.contains_key(&account.id) {
            return Err(StoreError::Duplicate("users_pkey".to_string()));
        }
        if let Some(constraint) = accounts.values().find_map(|a| conflict(a, account)) {
            return Err(StoreError::Duplicate(constraint.to_string()));
        }

        accounts.insert(account.id, account.clone());
        Ok(())
    }

    async fn delete(&self, username: &str) -> Result<(), StoreError> {
        let mut accounts = self.accounts.write().await;
        let id = accounts
            .values()
            .find(|a| a.username == username)
            .map(|a| a.id)
            .ok_or(StoreError::NotFound)?;

        accounts.remove(&id);
        Ok(())
    }
}
