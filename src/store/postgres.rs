//! Postgres store adapters
//!
//! Accounts carry a `version` column; updates are conditional on it
//! (`WHERE id = .. AND version = ..`) so concurrent writers cannot lose
//! each other's OTP attempt counts or verification flips.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{Account, ImageRecord, PendingOtp, ProcessingStatus, UserRole};

use super::{AccountStore, ImageStore, StoreError};

/// Account store backed by the `accounts` table
#[derive(Clone)]
pub struct PostgresAccountStore {
    pool: PgPool,
}

impl PostgresAccountStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Flat row shape; the OTP sub-record is reassembled from its nullable
/// columns on the way out.
#[derive(sqlx::FromRow)]
struct AccountRow {
    id: Uuid,
    username: String,
    email: String,
    password_hash: String,
    email_verified: bool,
    role: String,
    otp_hash: Option<String>,
    otp_expires_at: Option<DateTime<Utc>>,
    otp_attempts: i32,
    last_otp_sent_at: Option<DateTime<Utc>>,
    last_login_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    version: i64,
}

impl TryFrom<AccountRow> for Account {
    type Error = StoreError;

    fn try_from(row: AccountRow) -> Result<Self, StoreError> {
        let role = UserRole::parse(&row.role)
            .ok_or_else(|| StoreError::Unavailable(format!("unknown role '{}'", row.role)))?;

        let pending_otp = match (row.otp_hash, row.otp_expires_at, row.last_otp_sent_at) {
            (Some(otp_hash), Some(expires_at), Some(last_sent_at)) => Some(PendingOtp {
                otp_hash,
                expires_at,
                attempts: row.otp_attempts as u32,
                last_sent_at,
            }),
            (None, None, _) => None,
            _ => {
                return Err(StoreError::Unavailable(format!(
                    "inconsistent OTP columns for account {}",
                    row.id
                )))
            }
        };

        Ok(Account {
            id: row.id,
            username: row.username,
            email: row.email,
            password_hash: row.password_hash,
            email_verified: row.email_verified,
            role,
            pending_otp,
            last_login_at: row.last_login_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
            version: row.version,
        })
    }
}

const ACCOUNT_COLUMNS: &str = "id, username, email, password_hash, email_verified, role, \
     otp_hash, otp_expires_at, otp_attempts, last_otp_sent_at, last_login_at, \
     created_at, updated_at, version";

#[async_trait]
impl AccountStore for PostgresAccountStore {
    async fn insert(&self, account: Account) -> Result<Account, StoreError> {
        let otp = account.pending_otp.as_ref();

        sqlx::query(
            r#"
            INSERT INTO accounts
                (id, username, email, password_hash, email_verified, role,
                 otp_hash, otp_expires_at, otp_attempts, last_otp_sent_at,
                 last_login_at, created_at, updated_at, version)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            "#,
        )
        .bind(account.id)
        .bind(&account.username)
        .bind(&account.email)
        .bind(&account.password_hash)
        .bind(account.email_verified)
        .bind(account.role.as_str())
        .bind(otp.map(|o| o.otp_hash.clone()))
        .bind(otp.map(|o| o.expires_at))
        .bind(otp.map(|o| o.attempts as i32).unwrap_or(0))
        .bind(otp.map(|o| o.last_sent_at))
        .bind(account.last_login_at)
        .bind(account.created_at)
        .bind(account.updated_at)
        .bind(account.version)
        .execute(&self.pool)
        .await?;

        Ok(account)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, StoreError> {
        let row: Option<AccountRow> = sqlx::query_as(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Account::try_from).transpose()
    }

    async fn exists_by_email(&self, email: &str) -> Result<bool, StoreError> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM accounts WHERE email = $1)")
                .bind(email)
                .fetch_one(&self.pool)
                .await?;

        Ok(exists)
    }

    async fn update(&self, mut account: Account) -> Result<Account, StoreError> {
        let otp = account.pending_otp.as_ref();
        let now = Utc::now();

        let rows_affected = sqlx::query(
            r#"
            UPDATE accounts
            SET username = $1, password_hash = $2, email_verified = $3, role = $4,
                otp_hash = $5, otp_expires_at = $6, otp_attempts = $7,
                last_otp_sent_at = $8, last_login_at = $9, updated_at = $10,
                version = version + 1
            WHERE id = $11 AND version = $12
            "#,
        )
        .bind(&account.username)
        .bind(&account.password_hash)
        .bind(account.email_verified)
        .bind(account.role.as_str())
        .bind(otp.map(|o| o.otp_hash.clone()))
        .bind(otp.map(|o| o.expires_at))
        .bind(otp.map(|o| o.attempts as i32).unwrap_or(0))
        .bind(otp.map(|o| o.last_sent_at))
        .bind(account.last_login_at)
        .bind(now)
        .bind(account.id)
        .bind(account.version)
        .execute(&self.pool)
        .await?
        .rows_affected();

        // No rows means another request updated the account first
        if rows_affected == 0 {
            return Err(StoreError::VersionConflict);
        }

        account.version += 1;
        account.updated_at = now;
        Ok(account)
    }
}

/// Image metadata store backed by the `images` table
#[derive(Clone)]
pub struct PostgresImageStore {
    pool: PgPool,
}

impl PostgresImageStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct ImageRow {
    id: Uuid,
    owner_id: Uuid,
    url: String,
    public_id: String,
    original_filename: Option<String>,
    file_size: i64,
    format: String,
    status: String,
    uploaded_at: DateTime<Utc>,
}

impl TryFrom<ImageRow> for ImageRecord {
    type Error = StoreError;

    fn try_from(row: ImageRow) -> Result<Self, StoreError> {
        let status = ProcessingStatus::parse(&row.status)
            .ok_or_else(|| StoreError::Unavailable(format!("unknown status '{}'", row.status)))?;

        Ok(ImageRecord {
            id: row.id,
            owner_id: row.owner_id,
            url: row.url,
            public_id: row.public_id,
            original_filename: row.original_filename,
            file_size: row.file_size,
            format: row.format,
            status,
            uploaded_at: row.uploaded_at,
        })
    }
}

const IMAGE_COLUMNS: &str =
    "id, owner_id, url, public_id, original_filename, file_size, format, status, uploaded_at";

#[async_trait]
impl ImageStore for PostgresImageStore {
    async fn insert(&self, image: ImageRecord) -> Result<ImageRecord, StoreError> {
        sqlx::query(
            r#"
            INSERT INTO images
                (id, owner_id, url, public_id, original_filename, file_size,
                 format, status, uploaded_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(image.id)
        .bind(image.owner_id)
        .bind(&image.url)
        .bind(&image.public_id)
        .bind(&image.original_filename)
        .bind(image.file_size)
        .bind(&image.format)
        .bind(image.status.as_str())
        .bind(image.uploaded_at)
        .execute(&self.pool)
        .await?;

        Ok(image)
    }

    async fn find(&self, id: Uuid) -> Result<Option<ImageRecord>, StoreError> {
        let row: Option<ImageRow> =
            sqlx::query_as(&format!("SELECT {IMAGE_COLUMNS} FROM images WHERE id = $1"))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        row.map(ImageRecord::try_from).transpose()
    }

    async fn list_by_owner(&self, owner_id: Uuid) -> Result<Vec<ImageRecord>, StoreError> {
        let rows: Vec<ImageRow> = sqlx::query_as(&format!(
            "SELECT {IMAGE_COLUMNS} FROM images WHERE owner_id = $1 ORDER BY uploaded_at DESC"
        ))
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(ImageRecord::try_from).collect()
    }

    async fn delete(&self, id: Uuid) -> Result<(), StoreError> {
        let rows_affected = sqlx::query("DELETE FROM images WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?
            .rows_affected();

        if rows_affected == 0 {
            return Err(StoreError::NotFound);
        }

        Ok(())
    }
}
