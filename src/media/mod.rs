//! Media host boundary
//!
//! Binary payloads never live in this backend: uploads are delegated to a
//! Cloudinary-style host which returns a stable URL plus an opaque storage
//! identifier used for later deletion.

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::Deserialize;
use sha2::{Digest, Sha256};
use thiserror::Error;

/// Media host errors
#[derive(Debug, Error)]
pub enum MediaError {
    #[error("media host transport error: {0}")]
    Transport(String),

    #[error("media host rejected the request: {0}")]
    Rejected(String),

    #[error("media host returned an invalid response: {0}")]
    InvalidResponse(String),
}

/// Result of a successful upload at the media host
#[derive(Debug, Clone)]
pub struct MediaUpload {
    /// Stable, publicly servable URL
    pub url: String,
    /// Opaque storage identifier, required for deletion
    pub public_id: String,
    /// Format as detected by the host (e.g. "jpg", "png")
    pub format: String,
    /// Stored size in bytes
    pub bytes: i64,
}

/// External media host collaborator
#[async_trait]
pub trait MediaHost: Send + Sync {
    async fn upload(
        &self,
        data: Vec<u8>,
        content_type: &str,
        folder: &str,
    ) -> Result<MediaUpload, MediaError>;

    async fn delete(&self, public_id: &str) -> Result<(), MediaError>;
}

/// Cloudinary client using signed upload/destroy requests
pub struct CloudinaryClient {
    http_client: Client,
    base_url: String,
    cloud_name: String,
    api_key: String,
    api_secret: String,
}

#[derive(Deserialize)]
struct CloudinaryUploadResponse {
    secure_url: String,
    public_id: String,
    format: Option<String>,
    bytes: Option<i64>,
}

#[derive(Deserialize)]
struct CloudinaryDestroyResponse {
    result: String,
}

impl CloudinaryClient {
    pub fn new(cloud_name: String, api_key: String, api_secret: String) -> Self {
        Self {
            http_client: Client::new(),
            base_url: "https://api.cloudinary.com/v1_1".to_string(),
            cloud_name,
            api_key,
            api_secret,
        }
    }

    /// Sign the request parameters the Cloudinary way: the parameters in
    /// alphabetical order joined with '&', with the API secret appended,
    /// hashed. SHA-256 is declared through `signature_algorithm`.
    fn sign(&self, params_sorted: &[(&str, &str)]) -> String {
        let joined = params_sorted
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join("&");

        let mut hasher = Sha256::new();
        hasher.update(joined.as_bytes());
        hasher.update(self.api_secret.as_bytes());
        let digest = hasher.finalize();

        digest.iter().map(|b| format!("{:02x}", b)).collect()
    }
}

#[async_trait]
impl MediaHost for CloudinaryClient {
    async fn upload(
        &self,
        data: Vec<u8>,
        content_type: &str,
        folder: &str,
    ) -> Result<MediaUpload, MediaError> {
        let url = format!("{}/{}/image/upload", self.base_url, self.cloud_name);
        let timestamp = chrono::Utc::now().timestamp().to_string();

        let signature = self.sign(&[
            ("folder", folder),
            ("signature_algorithm", "sha256"),
            ("timestamp", &timestamp),
        ]);

        let file_part = Part::bytes(data)
            .file_name("upload")
            .mime_str(content_type)
            .map_err(|e| MediaError::Transport(e.to_string()))?;

        let form = Form::new()
            .part("file", file_part)
            .text("api_key", self.api_key.clone())
            .text("timestamp", timestamp)
            .text("folder", folder.to_string())
            .text("signature_algorithm", "sha256".to_string())
            .text("signature", signature);

        let response = self
            .http_client
            .post(url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| MediaError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(MediaError::Rejected(format!("{status}: {body}")));
        }

        let upload: CloudinaryUploadResponse = response
            .json()
            .await
            .map_err(|e| MediaError::InvalidResponse(e.to_string()))?;

        Ok(MediaUpload {
            url: upload.secure_url,
            public_id: upload.public_id,
            format: upload.format.unwrap_or_else(|| "unknown".to_string()),
            bytes: upload.bytes.unwrap_or(0),
        })
    }

    async fn delete(&self, public_id: &str) -> Result<(), MediaError> {
        let url = format!("{}/{}/image/destroy", self.base_url, self.cloud_name);
        let timestamp = chrono::Utc::now().timestamp().to_string();

        let signature = self.sign(&[
            ("public_id", public_id),
            ("signature_algorithm", "sha256"),
            ("timestamp", &timestamp),
        ]);

        let form = Form::new()
            .text("public_id", public_id.to_string())
            .text("api_key", self.api_key.clone())
            .text("timestamp", timestamp)
            .text("signature_algorithm", "sha256".to_string())
            .text("signature", signature);

        let response = self
            .http_client
            .post(url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| MediaError::Transport(e.to_string()))?
            .error_for_status()
            .map_err(|e| MediaError::Rejected(e.to_string()))?;

        let destroy: CloudinaryDestroyResponse = response
            .json()
            .await
            .map_err(|e| MediaError::InvalidResponse(e.to_string()))?;

        // "not found" is treated as already gone
        if destroy.result != "ok" && destroy.result != "not found" {
            return Err(MediaError::Rejected(destroy.result));
        }

        Ok(())
    }
}
