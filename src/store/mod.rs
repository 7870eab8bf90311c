//! Durable store ports for accounts and image metadata
//!
//! The services only ever talk to these traits; `memory` backs tests and
//! development, `postgres` backs deployments. Both enforce the identity-key
//! unique constraint on insert and a version check on update.

mod memory;
mod postgres;

pub use memory::{InMemoryAccountStore, InMemoryImageStore};
pub use postgres::{PostgresAccountStore, PostgresImageStore};

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{Account, ImageRecord};

/// Store errors
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("record already exists")]
    Duplicate,

    #[error("record not found")]
    NotFound,

    #[error("concurrent update conflict")]
    VersionConflict,

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::RowNotFound => StoreError::NotFound,
            sqlx::Error::Database(dbe)
                if matches!(dbe.kind(), sqlx::error::ErrorKind::UniqueViolation) =>
            {
                StoreError::Duplicate
            }
            _ => StoreError::Unavailable(err.to_string()),
        }
    }
}

/// Durable mapping from identity key (normalized email) to account record.
///
/// `update` is conditional on the account's `version` field: the write only
/// lands if the stored version still matches, and the returned account
/// carries the bumped version. Callers retry on `VersionConflict`.
#[async_trait]
pub trait AccountStore: Send + Sync {
    async fn insert(&self, account: Account) -> Result<Account, StoreError>;
    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, StoreError>;
    async fn exists_by_email(&self, email: &str) -> Result<bool, StoreError>;
    async fn update(&self, account: Account) -> Result<Account, StoreError>;
}

/// Durable store for uploaded-image metadata.
#[async_trait]
pub trait ImageStore: Send + Sync {
    async fn insert(&self, image: ImageRecord) -> Result<ImageRecord, StoreError>;
    async fn find(&self, id: Uuid) -> Result<Option<ImageRecord>, StoreError>;
    /// Images for one owner, newest first.
    async fn list_by_owner(&self, owner_id: Uuid) -> Result<Vec<ImageRecord>, StoreError>;
    async fn delete(&self, id: Uuid) -> Result<(), StoreError>;
}
