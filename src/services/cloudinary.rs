// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Cloudinary API client for hosting trip images.
//!
//! Handles:
//! - Signed image uploads
//! - Image deletion by public ID
//! - Resource lookup via the Admin API
//!
//! Requests are signed with SHA-256, so the Cloudinary account must have
//! SHA-256 signatures enabled.

use async_trait::async_trait;
use serde::Deserialize;
use sha2::{Digest, Sha256};

use crate::config::CloudinaryConfig;
use crate::services::media::{ImageUpload, MediaError, MediaStore, StoredImage};

/// Cloudinary API client.
#[derive(Clone)]
pub struct CloudinaryMediaStore {
    http: reqwest::Client,
    base_url: String,
    config: CloudinaryConfig,
}

#[derive(Deserialize)]
struct UploadResponse {
    public_id: String,
    secure_url: String,
}

#[derive(Deserialize)]
struct DestroyResponse {
    result: String,
}

impl CloudinaryMediaStore {
    pub fn new(config: CloudinaryConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: format!("https://api.cloudinary.com/v1_1/{}", config.cloud_name),
            config,
        }
    }

    fn timestamp() -> String {
        chrono::Utc::now().timestamp().to_string()
    }

    /// Map a non-success response to a media error.
    async fn error_for(response: reqwest::Response) -> MediaError {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();

        if status.is_client_error() && status.as_u16() != 401 && status.as_u16() != 429 {
            MediaError::Rejected(format!("HTTP {}: {}", status, body))
        } else {
            MediaError::Api(format!("HTTP {}: {}", status, body))
        }
    }
}

/// Sign request parameters: sorted `key=value` pairs joined by `&`,
/// followed by the API secret, hashed with SHA-256.
pub fn sign_params(params: &[(&str, &str)], api_secret: &str) -> String {
    let mut sorted: Vec<&(&str, &str)> = params.iter().collect();
    sorted.sort_by(|a, b| a.0.cmp(b.0));

    let to_sign = sorted
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&");

    let mut hasher = Sha256::new();
    hasher.update(to_sign.as_bytes());
    hasher.update(api_secret.as_bytes());
    hex::encode(hasher.finalize())
}

#[async_trait]
impl MediaStore for CloudinaryMediaStore {
    async fn upload(&self, image: &ImageUpload) -> Result<StoredImage, MediaError> {
        let timestamp = Self::timestamp();
        let signature = sign_params(
            &[
                ("folder", self.config.folder.as_str()),
                ("timestamp", timestamp.as_str()),
            ],
            &self.config.api_secret,
        );

        let part = reqwest::multipart::Part::bytes(image.bytes.clone())
            .file_name(image.file_name.clone())
            .mime_str(&image.content_type)
            .map_err(|e| MediaError::Rejected(format!("invalid content type: {}", e)))?;

        let form = reqwest::multipart::Form::new()
            .part("file", part)
            .text("api_key", self.config.api_key.clone())
            .text("folder", self.config.folder.clone())
            .text("timestamp", timestamp)
            .text("signature_algorithm", "sha256")
            .text("signature", signature);

        let response = self
            .http
            .post(format!("{}/image/upload", self.base_url))
            .multipart(form)
            .send()
            .await
            .map_err(|e| MediaError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            return Err(Self::error_for(response).await);
        }

        let body: UploadResponse = response
            .json()
            .await
            .map_err(|e| MediaError::Api(format!("invalid upload response: {}", e)))?;

        tracing::debug!(public_id = %body.public_id, "Image uploaded to Cloudinary");

        Ok(StoredImage {
            url: body.secure_url,
            public_id: body.public_id,
        })
    }

    async fn delete(&self, public_id: &str) -> Result<(), MediaError> {
        let timestamp = Self::timestamp();
        let signature = sign_params(
            &[("public_id", public_id), ("timestamp", timestamp.as_str())],
            &self.config.api_secret,
        );

        let response = self
            .http
            .post(format!("{}/image/destroy", self.base_url))
            .form(&[
                ("public_id", public_id),
                ("api_key", self.config.api_key.as_str()),
                ("timestamp", timestamp.as_str()),
                ("signature_algorithm", "sha256"),
                ("signature", signature.as_str()),
            ])
            .send()
            .await
            .map_err(|e| MediaError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            return Err(Self::error_for(response).await);
        }

        let body: DestroyResponse = response
            .json()
            .await
            .map_err(|e| MediaError::Api(format!("invalid destroy response: {}", e)))?;

        match body.result.as_str() {
            "ok" => Ok(()),
            // Already gone counts as deleted
            "not found" => {
                tracing::debug!(public_id, "Image already absent from Cloudinary");
                Ok(())
            }
            other => Err(MediaError::Api(format!("destroy returned '{}'", other))),
        }
    }

    async fn fetch(&self, public_id: &str) -> Result<Option<StoredImage>, MediaError> {
        let encoded: Vec<String> = public_id
            .split('/')
            .map(|segment| urlencoding::encode(segment).into_owned())
            .collect();
        let url = format!(
            "{}/resources/image/upload/{}",
            self.base_url,
            encoded.join("/")
        );

        let response = self
            .http
            .get(&url)
            .basic_auth(&self.config.api_key, Some(&self.config.api_secret))
            .send()
            .await
            .map_err(|e| MediaError::Transport(e.to_string()))?;

        if response.status().as_u16() == 404 {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(Self::error_for(response).await);
        }

        let body: UploadResponse = response
            .json()
            .await
            .map_err(|e| MediaError::Api(format!("invalid resource response: {}", e)))?;

        Ok(Some(StoredImage {
            url: body.secure_url,
            public_id: body.public_id,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signature_sorts_params() {
        let a = sign_params(&[("timestamp", "1315060510"), ("folder", "trips")], "secret");
        let b = sign_params(&[("folder", "trips"), ("timestamp", "1315060510")], "secret");
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
    }

    #[test]
    fn test_signature_matches_manual_digest() {
        let expected = {
            let mut hasher = Sha256::new();
            hasher.update(b"public_id=trips/abc&timestamp=42secret");
            hex::encode(hasher.finalize())
        };
        assert_eq!(
            sign_params(&[("public_id", "trips/abc"), ("timestamp", "42")], "secret"),
            expected
        );
    }
}
