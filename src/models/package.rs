// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Tour packages offered by guides.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A bookable package published by a guide.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Package {
    /// Package ID (also used as document ID)
    pub id: String,
    /// Guide ID (owner)
    pub guide_id: String,
    pub title: String,
    pub description: String,
    /// Price per person
    pub price: f64,
    pub duration_days: u32,
    #[serde(default)]
    pub locations: Vec<String>,
    #[serde(with = "firestore::serialize_as_timestamp")]
    pub created_at: DateTime<Utc>,
}
