//! Image models and response DTOs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Processing state of an uploaded image
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ProcessingStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl ProcessingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProcessingStatus::Pending => "PENDING",
            ProcessingStatus::Processing => "PROCESSING",
            ProcessingStatus::Completed => "COMPLETED",
            ProcessingStatus::Failed => "FAILED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "PENDING" => Some(ProcessingStatus::Pending),
            "PROCESSING" => Some(ProcessingStatus::Processing),
            "COMPLETED" => Some(ProcessingStatus::Completed),
            "FAILED" => Some(ProcessingStatus::Failed),
            _ => None,
        }
    }
}

impl Default for ProcessingStatus {
    fn default() -> Self {
        ProcessingStatus::Pending
    }
}

/// An uploaded image owned by an account.
///
/// `public_id` is the media host's opaque storage identifier; deletion at
/// the host goes through it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageRecord {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub url: String,
    pub public_id: String,
    pub original_filename: Option<String>,
    pub file_size: i64,
    pub format: String,
    pub status: ProcessingStatus,
    pub uploaded_at: DateTime<Utc>,
}

/// Image response (sanitized for API, no owner or public_id leak)
#[derive(Debug, Serialize)]
pub struct ImageResponse {
    pub id: Uuid,
    pub url: String,
    pub original_filename: Option<String>,
    pub file_size: i64,
    pub format: String,
    pub status: ProcessingStatus,
    pub uploaded_at: DateTime<Utc>,
}

impl From<ImageRecord> for ImageResponse {
    fn from(image: ImageRecord) -> Self {
        ImageResponse {
            id: image.id,
            url: image.url,
            original_filename: image.original_filename,
            file_size: image.file_size,
            format: image.format,
            status: image.status,
            uploaded_at: image.uploaded_at,
        }
    }
}
