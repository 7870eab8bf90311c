//! In-memory store adapters
//!
//! Used in tests and when no DATABASE_URL is configured. The version check
//! on update matches the Postgres adapter so concurrency behavior is the
//! same in both.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::models::{Account, ImageRecord};

use super::{AccountStore, ImageStore, StoreError};

/// Accounts keyed by normalized email
#[derive(Default)]
pub struct InMemoryAccountStore {
    accounts: RwLock<HashMap<String, Account>>,
}

impl InMemoryAccountStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AccountStore for InMemoryAccountStore {
    async fn insert(&self, account: Account) -> Result<Account, StoreError> {
        let mut accounts = self.accounts.write().await;
        if accounts.contains_key(&account.email) {
            return Err(StoreError::Duplicate);
        }
        accounts.insert(account.email.clone(), account.clone());
        Ok(account)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, StoreError> {
        Ok(self.accounts.read().await.get(email).cloned())
    }

    async fn exists_by_email(&self, email: &str) -> Result<bool, StoreError> {
        Ok(self.accounts.read().await.contains_key(email))
    }

    async fn update(&self, mut account: Account) -> Result<Account, StoreError> {
        let mut accounts = self.accounts.write().await;
        let stored = accounts
            .get(&account.email)
            .ok_or(StoreError::NotFound)?;
        if stored.version != account.version {
            return Err(StoreError::VersionConflict);
        }
        account.version += 1;
        account.updated_at = chrono::Utc::now();
        accounts.insert(account.email.clone(), account.clone());
        Ok(account)
    }
}

/// Image metadata keyed by id
#[derive(Default)]
pub struct InMemoryImageStore {
    images: RwLock<HashMap<Uuid, ImageRecord>>,
}

impl InMemoryImageStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ImageStore for InMemoryImageStore {
    async fn insert(&self, image: ImageRecord) -> Result<ImageRecord, StoreError> {
        let mut images = self.images.write().await;
        if images.contains_key(&image.id) {
            return Err(StoreError::Duplicate);
        }
        images.insert(image.id, image.clone());
        Ok(image)
    }

    async fn find(&self, id: Uuid) -> Result<Option<ImageRecord>, StoreError> {
        Ok(self.images.read().await.get(&id).cloned())
    }

    async fn list_by_owner(&self, owner_id: Uuid) -> Result<Vec<ImageRecord>, StoreError> {
        let images = self.images.read().await;
        let mut owned: Vec<ImageRecord> = images
            .values()
            .filter(|img| img.owner_id == owner_id)
            .cloned()
            .collect();
        owned.sort_by(|a, b| b.uploaded_at.cmp(&a.uploaded_at));
        Ok(owned)
    }

    async fn delete(&self, id: Uuid) -> Result<(), StoreError> {
        let mut images = self.images.write().await;
        images.remove(&id).ok_or(StoreError::NotFound)?;
        Ok(())
    }
}
