// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Guide account model for storage and API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// What a one-time code was issued for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OtpPurpose {
    Verification,
    PasswordReset,
}

/// Outstanding one-time code. Only the SHA-256 digest is stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OtpChallenge {
    pub code_hash: String,
    pub purpose: OtpPurpose,
    #[serde(with = "firestore::serialize_as_timestamp")]
    pub expires_at: DateTime<Utc>,
}

/// Guide account stored in Firestore.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Guide {
    /// Guide ID (also used as document ID)
    pub id: String,
    pub name: String,
    /// Login email, unique across guides
    pub email: String,
    /// Argon2 PHC string
    pub password_hash: String,
    #[serde(default)]
    pub profile_image: Option<String>,
    /// Set once the signup code has been confirmed
    #[serde(default)]
    pub verified: bool,
    #[serde(default)]
    pub otp: Option<OtpChallenge>,
    #[serde(with = "firestore::serialize_as_timestamp")]
    pub created_at: DateTime<Utc>,
}

/// Public guide profile returned by the guide endpoints.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct GuideProfile {
    pub id: String,
    pub guide_name: String,
    pub guide_email: String,
    pub profile_image: Option<String>,
    pub verified: bool,
    pub created_at: String,
}

impl From<&Guide> for GuideProfile {
    fn from(guide: &Guide) -> Self {
        Self {
            id: guide.id.clone(),
            guide_name: guide.name.clone(),
            guide_email: guide.email.clone(),
            profile_image: guide.profile_image.clone(),
            verified: guide.verified,
            created_at: crate::time_utils::format_utc_rfc3339(guide.created_at),
        }
    }
}

/// Guide fields expanded into trip responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct GuideDetails {
    pub guide_name: String,
    pub guide_email: String,
    pub profile_image: Option<String>,
}

impl From<&Guide> for GuideDetails {
    fn from(guide: &Guide) -> Self {
        Self {
            guide_name: guide.name.clone(),
            guide_email: guide.email.clone(),
            profile_image: guide.profile_image.clone(),
        }
    }
}
