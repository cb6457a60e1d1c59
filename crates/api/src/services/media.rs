//! Media-storage API client for product and catalog images.
//!
//! Staff upload images through the API; the binary payload is forwarded to
//! the third-party media-storage service, which returns a stable asset ID
//! and public URL. Deleting an asset removes it upstream.

use reqwest::header::{HeaderMap, HeaderValue};
use secrecy::ExposeSecret;
use serde::Deserialize;
use thiserror::Error;

use crate::config::MediaConfig;

/// Maximum accepted image size in bytes (5 MiB).
pub const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;

/// Content types the media service accepts.
pub const ALLOWED_CONTENT_TYPES: &[&str] = &["image/jpeg", "image/png", "image/webp"];

/// Errors that can occur when interacting with the media-storage API.
#[derive(Debug, Error)]
pub enum MediaError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned an error response.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Failed to build the client or parse a response.
    #[error("Parse error: {0}")]
    Parse(String),
}

/// A stored media asset.
#[derive(Debug, Clone, Deserialize)]
pub struct MediaAsset {
    /// Stable asset identifier, used for deletion.
    pub asset_id: String,
    /// Public URL serving the asset.
    pub url: String,
}

/// Media-storage API client.
#[derive(Clone)]
pub struct MediaClient {
    client: reqwest::Client,
    base_url: String,
}

impl MediaClient {
    /// Create a new media-storage client.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(config: &MediaConfig) -> Result<Self, MediaError> {
        let mut headers = HeaderMap::new();

        let auth_value = format!("Bearer {}", config.api_key.expose_secret());
        headers.insert(
            "Authorization",
            HeaderValue::from_str(&auth_value)
                .map_err(|e| MediaError::Parse(format!("Invalid API key format: {e}")))?,
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            base_url: config.api_url.trim_end_matches('/').to_owned(),
        })
    }

    /// Upload an image and return its asset ID and public URL.
    ///
    /// # Errors
    ///
    /// Returns `MediaError::Api` if the service rejects the upload and
    /// `MediaError::Http` on transport failures.
    pub async fn upload_image(
        &self,
        file_name: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<MediaAsset, MediaError> {
        let part = reqwest::multipart::Part::bytes(bytes)
            .file_name(file_name.to_owned())
            .mime_str(content_type)
            .map_err(|e| MediaError::Parse(format!("invalid content type: {e}")))?;
        let form = reqwest::multipart::Form::new().part("file", part);

        let response = self
            .client
            .post(format!("{}/v1/images", self.base_url))
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(MediaError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let asset = response
            .json::<MediaAsset>()
            .await
            .map_err(|e| MediaError::Parse(format!("invalid upload response: {e}")))?;
        Ok(asset)
    }

    /// Delete an asset by ID. Deleting an unknown asset is not an error.
    ///
    /// # Errors
    ///
    /// Returns `MediaError::Api` if the service fails the deletion and
    /// `MediaError::Http` on transport failures.
    pub async fn delete_image(&self, asset_id: &str) -> Result<(), MediaError> {
        let response = self
            .client
            .delete(format!("{}/v1/images/{asset_id}", self.base_url))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() && status.as_u16() != 404 {
            let message = response.text().await.unwrap_or_default();
            return Err(MediaError::Api {
                status: status.as_u16(),
                message,
            });
        }
        Ok(())
    }
}

/// Check that an uploaded part is an acceptable image.
///
/// # Errors
///
/// Returns a human-readable rejection reason.
pub fn validate_upload(content_type: &str, size: usize) -> Result<(), String> {
    if !ALLOWED_CONTENT_TYPES.contains(&content_type) {
        return Err(format!(
            "unsupported content type '{content_type}' (expected one of: {})",
            ALLOWED_CONTENT_TYPES.join(", ")
        ));
    }
    if size > MAX_IMAGE_BYTES {
        return Err(format!(
            "image too large ({size} bytes, max {MAX_IMAGE_BYTES})"
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_upload_accepts_jpeg() {
        assert!(validate_upload("image/jpeg", 1024).is_ok());
    }

    #[test]
    fn test_validate_upload_rejects_type() {
        assert!(validate_upload("application/pdf", 1024).is_err());
    }

    #[test]
    fn test_validate_upload_rejects_oversize() {
        assert!(validate_upload("image/png", MAX_IMAGE_BYTES + 1).is_err());
    }
}
