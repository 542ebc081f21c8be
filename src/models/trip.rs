// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Trip model for storage and API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A hosted image attached to a trip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TripImage {
    /// Public URL on the media host
    pub url: String,
    /// Media host resource ID, recorded at upload time.
    /// Older records only carry the URL.
    #[serde(default)]
    pub public_id: Option<String>,
}

impl TripImage {
    /// Resource ID to use when removing this image from the media host.
    ///
    /// Falls back to the last URL path segment without its extension.
    pub fn resource_id(&self) -> String {
        match &self.public_id {
            Some(id) => id.clone(),
            None => public_id_from_url(&self.url),
        }
    }
}

/// Derive a media resource ID from a hosted URL
/// (`.../upload/v123/abc.jpg` -> `abc`).
pub fn public_id_from_url(url: &str) -> String {
    let last = url.rsplit('/').next().unwrap_or(url);
    last.split('.').next().unwrap_or(last).to_string()
}

/// Trip record stored in Firestore.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trip {
    /// Trip ID (also used as document ID)
    pub id: String,
    /// User ID (owner), fixed at creation
    pub owner_id: String,
    /// Assigned guide ID
    #[serde(default)]
    pub guide_id: Option<String>,
    pub location: String,
    pub description: String,
    /// Always >= 0
    pub cost: f64,
    /// Ordered hosted images; at least one once created
    pub images: Vec<TripImage>,
    #[serde(default)]
    pub hashtags: Vec<String>,
    /// Referenced blog entry IDs
    #[serde(default)]
    pub blog_references: Vec<String>,
    #[serde(with = "firestore::serialize_as_timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "firestore::serialize_as_timestamp")]
    pub updated_at: DateTime<Utc>,
}

impl Trip {
    /// Hosted URLs in display order.
    pub fn image_urls(&self) -> Vec<String> {
        self.images.iter().map(|image| image.url.clone()).collect()
    }
}
