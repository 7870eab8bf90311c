//! Image HTTP handlers
//!
//! Authenticated upload, listing, and deletion. Uploads arrive as
//! multipart form data with the payload in a `file` field.

use axum::{
    extract::{Multipart, Path, State},
    Json,
};
use uuid::Uuid;

use crate::error::ApiError;
use crate::images::{ImageError, UploadPayload};
use crate::middleware::AuthenticatedUser;
use crate::models::{ImageResponse, MessageResponse};
use crate::state::AppState;

impl From<ImageError> for ApiError {
    fn from(err: ImageError) -> Self {
        let message = err.to_string();
        match err {
            ImageError::UserNotFound | ImageError::ImageNotFound => ApiError::NotFound(message),
            ImageError::NotOwner => ApiError::Forbidden(message),
            ImageError::UnsupportedType | ImageError::TooLarge | ImageError::EmptyFile => {
                ApiError::BadRequest(message)
            }
            ImageError::Media(e) => ApiError::ExternalServiceError(e.to_string()),
            ImageError::Store(e) => ApiError::DatabaseError(e.to_string()),
        }
    }
}

/// POST /api/images/upload - Upload an image for the authenticated account
pub async fn upload_image(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    mut multipart: Multipart,
) -> Result<Json<ImageResponse>, ApiError> {
    let mut payload: Option<UploadPayload> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Invalid multipart body: {e}")))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let original_filename = field.file_name().map(str::to_string);
        let content_type = field
            .content_type()
            .map(str::to_string)
            .unwrap_or_else(|| "application/octet-stream".to_string());
        let data = field
            .bytes()
            .await
            .map_err(|e| ApiError::BadRequest(format!("Failed to read file field: {e}")))?
            .to_vec();

        payload = Some(UploadPayload {
            data,
            content_type,
            original_filename,
        });
    }

    let payload =
        payload.ok_or_else(|| ApiError::BadRequest("Missing 'file' field".to_string()))?;

    let response = state.image_service.upload(payload, &user.email).await?;

    Ok(Json(response))
}

/// GET /api/images/my-images - List the authenticated account's images
pub async fn my_images(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<Json<Vec<ImageResponse>>, ApiError> {
    let images = state.image_service.list(&user.email).await?;

    Ok(Json(images))
}

/// DELETE /api/images/:id - Delete an owned image
pub async fn delete_image(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(image_id): Path<Uuid>,
) -> Result<Json<MessageResponse>, ApiError> {
    state.image_service.delete(image_id, &user.email).await?;

    Ok(Json(MessageResponse {
        success: true,
        message: "Image deleted successfully".to_string(),
    }))
}
