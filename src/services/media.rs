// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Media store abstraction for hosted trip images.

use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use crate::models::TripImage;

/// An image file received from a client.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// An image held by the media host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredImage {
    pub url: String,
    pub public_id: String,
}

impl From<StoredImage> for TripImage {
    fn from(image: StoredImage) -> Self {
        TripImage {
            url: image.url,
            public_id: Some(image.public_id),
        }
    }
}

/// Media host errors.
#[derive(Debug, Clone, thiserror::Error)]
pub enum MediaError {
    /// The host refused this particular file. Other files may still succeed.
    #[error("upload rejected: {0}")]
    Rejected(String),

    /// The host could not be reached.
    #[error("transport error: {0}")]
    Transport(String),

    /// The host answered with an unexpected status or body.
    #[error("media API error: {0}")]
    Api(String),
}

impl MediaError {
    /// Whether the error applies only to the file that triggered it.
    pub fn is_per_file(&self) -> bool {
        matches!(self, MediaError::Rejected(_))
    }
}

/// Hosted image storage.
#[async_trait]
pub trait MediaStore: Send + Sync {
    /// Upload an image and return where it is hosted.
    async fn upload(&self, image: &ImageUpload) -> Result<StoredImage, MediaError>;

    /// Remove a hosted image by resource ID.
    async fn delete(&self, public_id: &str) -> Result<(), MediaError>;

    /// Look up a hosted image by resource ID.
    async fn fetch(&self, public_id: &str) -> Result<Option<StoredImage>, MediaError>;
}

/// In-memory media host for tests and local development.
#[derive(Default)]
pub struct MemoryMediaStore {
    images: DashMap<String, StoredImage>,
    next_id: AtomicU64,
    deletions: Mutex<Vec<String>>,
}

impl MemoryMediaStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resource IDs currently hosted, sorted.
    pub fn public_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.images.iter().map(|e| e.key().clone()).collect();
        ids.sort();
        ids
    }

    /// Every delete call received, in order.
    pub fn deletions(&self) -> Vec<String> {
        self.deletions
            .lock()
            .map(|d| d.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl MediaStore for MemoryMediaStore {
    async fn upload(&self, image: &ImageUpload) -> Result<StoredImage, MediaError> {
        if image.bytes.is_empty() {
            return Err(MediaError::Rejected(format!("{} is empty", image.file_name)));
        }

        let n = self.next_id.fetch_add(1, Ordering::Relaxed);
        let public_id = format!("trips/img_{n}");
        let extension = image
            .file_name
            .rsplit_once('.')
            .map(|(_, ext)| ext)
            .unwrap_or("jpg");
        let stored = StoredImage {
            url: format!("memory://media/{public_id}.{extension}"),
            public_id: public_id.clone(),
        };
        self.images.insert(public_id, stored.clone());
        Ok(stored)
    }

    async fn delete(&self, public_id: &str) -> Result<(), MediaError> {
        if let Ok(mut deletions) = self.deletions.lock() {
            deletions.push(public_id.to_string());
        }
        self.images.remove(public_id);
        Ok(())
    }

    async fn fetch(&self, public_id: &str) -> Result<Option<StoredImage>, MediaError> {
        Ok(self.images.get(public_id).map(|i| i.clone()))
    }
}
