//! User model for storage and API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Traveller account stored in Firestore.
///
/// Accounts are created by the user-facing auth service; this crate only
/// resolves them by email and reads the email back for trip owners.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// User ID (also used as document ID)
    pub id: String,
    /// Login email, unique across users
    pub email: String,
    /// Display name
    #[serde(default)]
    pub name: Option<String>,
    /// When the account was created
    #[serde(with = "firestore::serialize_as_timestamp")]
    pub created_at: DateTime<Utc>,
}
