// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Trip lifecycle: lookup, listing, creation with image upload, partial
//! update and deletion with image cleanup.
//!
//! The database and the media host are not transactional with each other.
//! Creation removes every image it uploaded if the trip record cannot be
//! written, so a failed create never leaves hosted images behind. Deletion
//! removes the record first and then cleans up images best-effort.

use chrono::Utc;
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

use crate::db::{GuideDirectory, TripRepository, UserDirectory};
use crate::error::{AppError, Result};
use crate::middleware::auth::AuthenticatedPrincipal;
use crate::models::{GuideDetails, Trip, TripImage};
use crate::services::media::{ImageUpload, MediaStore};

/// Fields supplied when creating a trip, as received from the client.
#[derive(Debug, Default, Clone)]
pub struct NewTrip {
    pub location: Option<String>,
    pub description: Option<String>,
    /// Raw cost text; validated as a non-negative number
    pub cost: Option<String>,
    /// Empty means no guide
    pub guide_id: Option<String>,
    pub hashtags: Vec<String>,
    pub blog_references: Vec<String>,
}

/// Partial trip update. Absent fields are left unchanged.
#[derive(Debug, Default, Deserialize)]
pub struct TripUpdate {
    #[serde(rename = "tripLocation")]
    pub location: Option<String>,
    #[serde(rename = "tripDescription")]
    pub description: Option<String>,
    /// Number or numeric string
    pub cost: Option<Value>,
    /// Replaced only when an array of strings is supplied
    pub hashtags: Option<Value>,
    #[serde(rename = "blogId")]
    pub blog_references: Option<Value>,
    /// `null` clears the guide, a string assigns it
    #[serde(default, with = "serde_with::rust::double_option")]
    pub guide: Option<Option<String>>,
}

/// A trip with its references expanded for display.
#[derive(Debug, Clone)]
pub struct TripView {
    pub trip: Trip,
    /// Owner email, only filled in for single-trip lookups
    pub owner_email: Option<String>,
    /// `None` when no guide is assigned or the guide no longer exists
    pub guide: Option<GuideDetails>,
}

/// Result of a trip deletion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteOutcome {
    pub deleted_images: usize,
    /// Resource IDs that could not be removed from the media host
    pub failed_image_cleanups: Vec<String>,
}

/// Trip lifecycle operations over injected collaborators.
#[derive(Clone)]
pub struct TripService {
    trips: Arc<dyn TripRepository>,
    users: Arc<dyn UserDirectory>,
    guides: Arc<dyn GuideDirectory>,
    media: Arc<dyn MediaStore>,
}

impl TripService {
    pub fn new(
        trips: Arc<dyn TripRepository>,
        users: Arc<dyn UserDirectory>,
        guides: Arc<dyn GuideDirectory>,
        media: Arc<dyn MediaStore>,
    ) -> Self {
        Self {
            trips,
            users,
            guides,
            media,
        }
    }

    /// Fetch one trip with owner email and guide details expanded.
    pub async fn get_trip(&self, trip_id: &str) -> Result<TripView> {
        if trip_id.trim().is_empty() {
            return Err(AppError::InvalidInput("Trip ID is required".to_string()));
        }

        let trip = self
            .trips
            .get_trip(trip_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Trip not found".to_string()))?;

        let owner_email = self
            .users
            .get_user(&trip.owner_id)
            .await?
            .map(|user| user.email);

        let mut cache = HashMap::new();
        let guide = self.guide_details(trip.guide_id.as_deref(), &mut cache).await?;

        Ok(TripView {
            trip,
            owner_email,
            guide,
        })
    }

    /// All trips of the caller, most recent first, with guides expanded.
    pub async fn list_trips(&self, principal: &AuthenticatedPrincipal) -> Result<Vec<TripView>> {
        if principal.id.is_empty() {
            return Err(AppError::InvalidInput(
                "User ID is required to fetch trips".to_string(),
            ));
        }

        let trips = self.trips.list_trips_for_owner(&principal.id).await?;

        tracing::debug!(
            owner_id = %principal.id,
            count = trips.len(),
            "Fetched trips for user"
        );

        // Many trips share a guide
        let mut cache = HashMap::new();
        let mut views = Vec::with_capacity(trips.len());
        for trip in trips {
            let guide = self.guide_details(trip.guide_id.as_deref(), &mut cache).await?;
            views.push(TripView {
                trip,
                owner_email: None,
                guide,
            });
        }

        Ok(views)
    }

    /// Validate, upload images, then store the trip.
    ///
    /// Nothing is sent to the media host unless every field is valid and at
    /// least one file was supplied.
    pub async fn create_trip(
        &self,
        principal: &AuthenticatedPrincipal,
        fields: NewTrip,
        files: Vec<ImageUpload>,
    ) -> Result<Trip> {
        let location = required_text(fields.location.as_deref());
        let description = required_text(fields.description.as_deref());
        let (Some(location), Some(description), Some(raw_cost)) =
            (location, description, fields.cost.as_deref())
        else {
            return Err(AppError::InvalidInput(
                "Trip location, description, and cost are required".to_string(),
            ));
        };
        let cost = parse_cost(&Value::String(raw_cost.to_string()))?;

        if files.is_empty() {
            return Err(AppError::InvalidInput(
                "At least one trip image must be uploaded".to_string(),
            ));
        }

        let trip_id = uuid::Uuid::new_v4().to_string();
        let images = self.upload_images(&trip_id, &files).await?;

        let now = Utc::now();
        let trip = Trip {
            id: trip_id,
            owner_id: principal.id.clone(),
            guide_id: fields.guide_id.filter(|g| !g.trim().is_empty()),
            location,
            description,
            cost,
            images,
            hashtags: fields.hashtags,
            blog_references: fields.blog_references,
            created_at: now,
            updated_at: now,
        };

        if let Err(e) = self.trips.insert_trip(&trip).await {
            tracing::error!(
                trip_id = %trip.id,
                error = %e,
                images = trip.images.len(),
                "Trip creation failed, removing uploaded images"
            );
            let failed = self.remove_images(&trip.id, &trip.images).await;
            if !failed.is_empty() {
                tracing::error!(
                    trip_id = %trip.id,
                    orphaned = ?failed,
                    "Compensating image deletion incomplete"
                );
            }
            return Err(AppError::CreateFailed(e.to_string()));
        }

        tracing::info!(
            trip_id = %trip.id,
            owner_id = %trip.owner_id,
            images = trip.images.len(),
            "Trip created"
        );

        Ok(trip)
    }

    /// Apply the supplied fields to a trip owned by the caller.
    pub async fn update_trip(
        &self,
        principal: &AuthenticatedPrincipal,
        trip_id: &str,
        update: TripUpdate,
    ) -> Result<Trip> {
        require_ids(trip_id, principal)?;

        let mut trip = self
            .trips
            .get_trip_for_owner(trip_id, &principal.id)
            .await?
            .ok_or_else(|| AppError::NotFoundOrUnauthorized("Trip".to_string()))?;

        // Validate everything before touching the record
        let location = update
            .location
            .map(|v| {
                required_text(Some(&v)).ok_or_else(|| {
                    AppError::InvalidInput("Trip location cannot be empty".to_string())
                })
            })
            .transpose()?;
        let description = update
            .description
            .map(|v| {
                required_text(Some(&v)).ok_or_else(|| {
                    AppError::InvalidInput("Trip description cannot be empty".to_string())
                })
            })
            .transpose()?;
        let cost = update.cost.as_ref().map(parse_cost).transpose()?;

        if let Some(location) = location {
            trip.location = location;
        }
        if let Some(description) = description {
            trip.description = description;
        }
        if let Some(cost) = cost {
            trip.cost = cost;
        }
        if let Some(hashtags) = update.hashtags.as_ref().and_then(string_list) {
            trip.hashtags = hashtags;
        }
        if let Some(blogs) = update.blog_references.as_ref().and_then(string_list) {
            trip.blog_references = blogs;
        }
        if let Some(guide) = update.guide {
            trip.guide_id = guide.filter(|g| !g.trim().is_empty());
        }
        trip.updated_at = Utc::now();

        self.trips.update_trip(&trip).await?;

        tracing::info!(trip_id = %trip.id, owner_id = %principal.id, "Trip updated");

        Ok(trip)
    }

    /// Delete a trip owned by the caller, then remove its images.
    ///
    /// Image cleanup failures are reported in the outcome but do not fail
    /// the call once the record is gone.
    pub async fn delete_trip(
        &self,
        principal: &AuthenticatedPrincipal,
        trip_id: &str,
    ) -> Result<DeleteOutcome> {
        require_ids(trip_id, principal)?;

        let trip = self
            .trips
            .get_trip_for_owner(trip_id, &principal.id)
            .await?
            .ok_or_else(|| AppError::NotFoundOrUnauthorized("Trip".to_string()))?;

        self.trips
            .delete_trip(&trip.id)
            .await
            .map_err(|e| AppError::DeleteFailed(e.to_string()))?;

        let failed = self.remove_images(&trip.id, &trip.images).await;

        tracing::info!(
            trip_id = %trip.id,
            owner_id = %principal.id,
            images = trip.images.len(),
            cleanup_failures = failed.len(),
            "Trip deleted"
        );

        Ok(DeleteOutcome {
            deleted_images: trip.images.len() - failed.len(),
            failed_image_cleanups: failed,
        })
    }

    // ─── Helper Methods ────────────────────────────────────────────

    /// Upload files one at a time.
    ///
    /// A file the host rejects is skipped. A transport or API failure stops
    /// the loop and removes what was already uploaded.
    async fn upload_images(
        &self,
        trip_id: &str,
        files: &[ImageUpload],
    ) -> Result<Vec<TripImage>> {
        let mut uploaded: Vec<TripImage> = Vec::with_capacity(files.len());

        for file in files {
            match self.media.upload(file).await {
                Ok(stored) => uploaded.push(stored.into()),
                Err(e) if e.is_per_file() => {
                    tracing::warn!(
                        trip_id,
                        file = %file.file_name,
                        error = %e,
                        "Image rejected by media host"
                    );
                }
                Err(e) => {
                    tracing::error!(
                        trip_id,
                        file = %file.file_name,
                        error = %e,
                        "Image upload failed, removing images already uploaded"
                    );
                    self.remove_images(trip_id, &uploaded).await;
                    return Err(AppError::UploadFailed(e.to_string()));
                }
            }
        }

        if uploaded.is_empty() {
            return Err(AppError::UploadFailed(
                "Failed to upload any trip images".to_string(),
            ));
        }

        Ok(uploaded)
    }

    /// Delete every image, continuing past failures.
    /// Returns the resource IDs that could not be deleted.
    async fn remove_images(&self, trip_id: &str, images: &[TripImage]) -> Vec<String> {
        let mut failed = Vec::new();

        for image in images {
            let public_id = image.resource_id();
            if let Err(e) = self.media.delete(&public_id).await {
                tracing::warn!(
                    trip_id,
                    public_id = %public_id,
                    error = %e,
                    "Failed to delete image from media host"
                );
                failed.push(public_id);
            }
        }

        failed
    }

    async fn guide_details(
        &self,
        guide_id: Option<&str>,
        cache: &mut HashMap<String, Option<GuideDetails>>,
    ) -> Result<Option<GuideDetails>> {
        let Some(guide_id) = guide_id else {
            return Ok(None);
        };

        if let Some(cached) = cache.get(guide_id) {
            return Ok(cached.clone());
        }

        let details = self
            .guides
            .get_guide(guide_id)
            .await?
            .map(|guide| GuideDetails::from(&guide));
        cache.insert(guide_id.to_string(), details.clone());
        Ok(details)
    }
}

fn require_ids(trip_id: &str, principal: &AuthenticatedPrincipal) -> Result<()> {
    if trip_id.trim().is_empty() || principal.id.is_empty() {
        return Err(AppError::InvalidInput(
            "Trip ID and User ID are required".to_string(),
        ));
    }
    Ok(())
}

/// Trimmed text, or `None` when missing or blank.
fn required_text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Parse a cost given as a JSON number or numeric string.
pub fn parse_cost(raw: &Value) -> Result<f64> {
    let parsed = match raw {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };

    match parsed {
        Some(cost) if cost.is_finite() && cost >= 0.0 => Ok(cost.abs()),
        _ => Err(AppError::InvalidInput(
            "Cost must be a non-negative number".to_string(),
        )),
    }
}

/// Accept only arrays of strings.
fn string_list(value: &Value) -> Option<Vec<String>> {
    value.as_array().map(|items| {
        items
            .iter()
            .filter_map(|item| item.as_str().map(str::to_string))
            .collect()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_cost_boundaries() {
        assert_eq!(parse_cost(&json!(0)).unwrap(), 0.0);
        assert_eq!(parse_cost(&json!("0")).unwrap(), 0.0);
        assert_eq!(parse_cost(&json!(" 149.5 ")).unwrap(), 149.5);
        assert_eq!(parse_cost(&json!("-0")).unwrap(), 0.0);

        for bad in [json!(-1), json!("-0.01"), json!("abc"), json!("NaN"), json!(true), json!([])] {
            assert!(
                matches!(parse_cost(&bad), Err(AppError::InvalidInput(_))),
                "{bad} should be rejected"
            );
        }
    }

    #[test]
    fn test_required_text_trims() {
        assert_eq!(required_text(Some("  Lisbon ")), Some("Lisbon".to_string()));
        assert_eq!(required_text(Some("   ")), None);
        assert_eq!(required_text(None), None);
    }

    #[test]
    fn test_update_distinguishes_null_guide_from_absent() {
        let absent: TripUpdate = serde_json::from_value(json!({"cost": 5})).unwrap();
        assert!(absent.guide.is_none());

        let cleared: TripUpdate = serde_json::from_value(json!({"guide": null})).unwrap();
        assert_eq!(cleared.guide, Some(None));

        let assigned: TripUpdate = serde_json::from_value(json!({"guide": "g1"})).unwrap();
        assert_eq!(assigned.guide, Some(Some("g1".to_string())));
    }

    #[test]
    fn test_string_list_ignores_non_arrays() {
        assert_eq!(string_list(&json!("solo")), None);
        assert_eq!(
            string_list(&json!(["a", 1, "b"])),
            Some(vec!["a".to_string(), "b".to_string()])
        );
    }
}
