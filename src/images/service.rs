//! Image service
//!
//! Validates payloads before they ever reach the media host, keeps the
//! metadata record, and enforces ownership on deletion.

use std::sync::Arc;

use chrono::Utc;
use thiserror::Error;
use uuid::Uuid;

use crate::media::{MediaError, MediaHost};
use crate::models::{ImageRecord, ImageResponse, ProcessingStatus};
use crate::store::{AccountStore, ImageStore, StoreError};

/// Accepted upload content types
pub const ALLOWED_CONTENT_TYPES: &[&str] = &["image/jpeg", "image/png"];
/// Maximum accepted payload size (10 MiB)
pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Image service errors
#[derive(Debug, Error)]
pub enum ImageError {
    #[error("User not found!")]
    UserNotFound,

    #[error("Image not found")]
    ImageNotFound,

    #[error("Unauthorized to delete this image")]
    NotOwner,

    #[error("Only JPEG and PNG images are allowed")]
    UnsupportedType,

    #[error("File size exceeds 10MB limit")]
    TooLarge,

    #[error("Empty file")]
    EmptyFile,

    #[error(transparent)]
    Media(#[from] MediaError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// An upload as received from the HTTP layer
#[derive(Debug)]
pub struct UploadPayload {
    pub data: Vec<u8>,
    pub content_type: String,
    pub original_filename: Option<String>,
}

/// Image service
pub struct ImageService {
    image_store: Arc<dyn ImageStore>,
    account_store: Arc<dyn AccountStore>,
    media_host: Arc<dyn MediaHost>,
    folder_prefix: String,
}

impl ImageService {
    pub fn new(
        image_store: Arc<dyn ImageStore>,
        account_store: Arc<dyn AccountStore>,
        media_host: Arc<dyn MediaHost>,
        folder_prefix: String,
    ) -> Self {
        Self {
            image_store,
            account_store,
            media_host,
            folder_prefix,
        }
    }

    /// Upload an image on behalf of the authenticated account.
    pub async fn upload(
        &self,
        payload: UploadPayload,
        owner_email: &str,
    ) -> Result<ImageResponse, ImageError> {
        let account = self
            .account_store
            .find_by_email(owner_email)
            .await?
            .ok_or(ImageError::UserNotFound)?;

        if payload.data.is_empty() {
            return Err(ImageError::EmptyFile);
        }
        if !ALLOWED_CONTENT_TYPES.contains(&payload.content_type.as_str()) {
            return Err(ImageError::UnsupportedType);
        }
        if payload.data.len() > MAX_UPLOAD_BYTES {
            return Err(ImageError::TooLarge);
        }

        // Per-owner folder at the media host
        let folder = format!("{}/user_{}", self.folder_prefix, account.id);

        let uploaded = self
            .media_host
            .upload(payload.data, &payload.content_type, &folder)
            .await?;

        let image = self
            .image_store
            .insert(ImageRecord {
                id: Uuid::new_v4(),
                owner_id: account.id,
                url: uploaded.url,
                public_id: uploaded.public_id,
                original_filename: payload.original_filename,
                file_size: uploaded.bytes,
                format: uploaded.format,
                status: ProcessingStatus::Pending,
                uploaded_at: Utc::now(),
            })
            .await?;

        tracing::info!(owner = %account.email, image_id = %image.id, "image uploaded");

        Ok(image.into())
    }

    /// List the requester's images, newest first.
    pub async fn list(&self, owner_email: &str) -> Result<Vec<ImageResponse>, ImageError> {
        let account = self
            .account_store
            .find_by_email(owner_email)
            .await?
            .ok_or(ImageError::UserNotFound)?;

        let images = self.image_store.list_by_owner(account.id).await?;

        Ok(images.into_iter().map(ImageResponse::from).collect())
    }

    /// Delete an image. The requesting identity must own it; the media
    /// host destroy runs before the metadata record is removed.
    pub async fn delete(&self, image_id: Uuid, owner_email: &str) -> Result<(), ImageError> {
        let account = self
            .account_store
            .find_by_email(owner_email)
            .await?
            .ok_or(ImageError::UserNotFound)?;

        let image = self
            .image_store
            .find(image_id)
            .await?
            .ok_or(ImageError::ImageNotFound)?;

        if image.owner_id != account.id {
            return Err(ImageError::NotOwner);
        }

        self.media_host.delete(&image.public_id).await?;
        self.image_store.delete(image.id).await?;

        tracing::info!(owner = %account.email, image_id = %image.id, "image deleted");

        Ok(())
    }
}
