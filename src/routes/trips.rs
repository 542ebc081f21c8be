// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Trip routes.

use crate::error::AppError;
use crate::middleware::auth::AuthenticatedPrincipal;
use crate::models::{GuideDetails, Trip};
use crate::response::{self, ApiResult};
use crate::services::{ImageUpload, NewTrip, TripUpdate, TripView};
use crate::time_utils::format_utc_rfc3339;
use crate::AppState;
use axum::{
    extract::{multipart::Field, rejection::JsonRejection, DefaultBodyLimit, Multipart, Path, State},
    routing::{get, patch, post},
    Extension, Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Multipart field carrying image files.
const IMAGE_FIELD: &str = "tripImages";

/// Routes readable without a session.
pub fn public_routes() -> Router<Arc<AppState>> {
    Router::new().route("/api/trips/{trip_id}", get(get_trip))
}

/// Routes for the signed-in traveller.
/// The auth middleware is applied in routes/mod.rs for these routes.
pub fn protected_routes(max_upload_bytes: usize) -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/trips/mine", get(list_my_trips))
        .route(
            "/api/trips",
            post(create_trip).layer(DefaultBodyLimit::max(max_upload_bytes)),
        )
        .route(
            "/api/trips/{trip_id}",
            patch(update_trip).delete(delete_trip),
        )
}

// ─── Response Types ──────────────────────────────────────────

/// Trip owner: an ID, or ID and email when expanded.
#[derive(Serialize, Debug, Clone)]
#[serde(untagged)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub enum OwnerRef {
    Id(String),
    Expanded { id: String, email: String },
}

#[derive(Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct TripResponse {
    pub id: String,
    pub user: OwnerRef,
    pub guide: Option<String>,
    pub trip_location: String,
    pub trip_description: String,
    pub cost: f64,
    pub trip_images: Vec<String>,
    pub hashtags: Vec<String>,
    pub blog_id: Vec<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl TripResponse {
    fn from_trip(trip: &Trip) -> Self {
        Self {
            id: trip.id.clone(),
            user: OwnerRef::Id(trip.owner_id.clone()),
            guide: trip.guide_id.clone(),
            trip_location: trip.location.clone(),
            trip_description: trip.description.clone(),
            cost: trip.cost,
            trip_images: trip.image_urls(),
            hashtags: trip.hashtags.clone(),
            blog_id: trip.blog_references.clone(),
            created_at: format_utc_rfc3339(trip.created_at),
            updated_at: format_utc_rfc3339(trip.updated_at),
        }
    }
}

/// Trip with the guide expanded next to its ID.
#[derive(Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct TripDetailsResponse {
    #[serde(flatten)]
    pub trip: TripResponse,
    pub guide_details: Option<GuideDetails>,
}

impl From<TripView> for TripDetailsResponse {
    fn from(view: TripView) -> Self {
        let mut trip = TripResponse::from_trip(&view.trip);
        if let Some(email) = view.owner_email {
            trip.user = OwnerRef::Expanded {
                id: view.trip.owner_id.clone(),
                email,
            };
        }
        // A dangling guide reference is reported as no guide
        if view.guide.is_none() {
            trip.guide = None;
        }
        Self {
            trip,
            guide_details: view.guide,
        }
    }
}

#[derive(Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct DeleteTripResponse {
    pub deleted_images: usize,
    pub failed_image_cleanups: Vec<String>,
}

// ─── Handlers ────────────────────────────────────────────────

async fn get_trip(
    State(state): State<Arc<AppState>>,
    Path(trip_id): Path<String>,
) -> ApiResult<TripDetailsResponse> {
    let view = state.trip_service.get_trip(&trip_id).await?;
    response::ok("Trip fetched successfully", view.into())
}

async fn list_my_trips(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<AuthenticatedPrincipal>,
) -> ApiResult<Vec<TripDetailsResponse>> {
    let views = state.trip_service.list_trips(&principal).await?;
    response::ok(
        "User's trips fetched successfully",
        views.into_iter().map(TripDetailsResponse::from).collect(),
    )
}

async fn create_trip(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<AuthenticatedPrincipal>,
    mut multipart: Multipart,
) -> ApiResult<TripResponse> {
    let (fields, files) = read_trip_form(&mut multipart).await?;

    tracing::debug!(
        owner_id = %principal.id,
        files = files.len(),
        "Creating trip"
    );

    let trip = state
        .trip_service
        .create_trip(&principal, fields, files)
        .await?;
    response::created("Trip created successfully", TripResponse::from_trip(&trip))
}

async fn update_trip(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<AuthenticatedPrincipal>,
    Path(trip_id): Path<String>,
    payload: Result<Json<TripUpdate>, JsonRejection>,
) -> ApiResult<TripResponse> {
    let Json(update) =
        payload.map_err(|e| AppError::InvalidInput(format!("Invalid request body: {}", e)))?;

    let trip = state
        .trip_service
        .update_trip(&principal, &trip_id, update)
        .await?;
    response::ok("Trip updated successfully", TripResponse::from_trip(&trip))
}

async fn delete_trip(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<AuthenticatedPrincipal>,
    Path(trip_id): Path<String>,
) -> ApiResult<DeleteTripResponse> {
    let outcome = state.trip_service.delete_trip(&principal, &trip_id).await?;
    response::ok(
        "Trip deleted successfully",
        DeleteTripResponse {
            deleted_images: outcome.deleted_images,
            failed_image_cleanups: outcome.failed_image_cleanups,
        },
    )
}

// ─── Multipart Parsing ───────────────────────────────────────

fn malformed(e: impl std::fmt::Display) -> AppError {
    AppError::InvalidInput(format!("Malformed multipart body: {}", e))
}

async fn field_text(field: Field<'_>) -> crate::error::Result<String> {
    field.text().await.map_err(malformed)
}

/// Collect text fields and image files from a trip creation form.
///
/// `hashtags` and `blogId` may repeat; each occurrence adds one entry.
async fn read_trip_form(
    multipart: &mut Multipart,
) -> crate::error::Result<(NewTrip, Vec<ImageUpload>)> {
    let mut fields = NewTrip::default();
    let mut files = Vec::new();

    while let Some(field) = multipart.next_field().await.map_err(malformed)? {
        let name = field.name().unwrap_or_default().to_string();

        match name.as_str() {
            IMAGE_FIELD => {
                let file_name = field.file_name().unwrap_or("image").to_string();
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                if !content_type.starts_with("image/") {
                    return Err(AppError::InvalidInput(format!(
                        "{} is not an image",
                        file_name
                    )));
                }
                let bytes = field.bytes().await.map_err(malformed)?;
                files.push(ImageUpload {
                    file_name,
                    content_type,
                    bytes: bytes.to_vec(),
                });
            }
            "tripLocation" => fields.location = Some(field_text(field).await?),
            "tripDescription" => fields.description = Some(field_text(field).await?),
            "cost" => fields.cost = Some(field_text(field).await?),
            "guide" => fields.guide_id = Some(field_text(field).await?),
            "hashtags" | "hashtags[]" => fields.hashtags.push(field_text(field).await?),
            "blogId" | "blogId[]" => fields.blog_references.push(field_text(field).await?),
            other => {
                tracing::debug!(field = other, "Ignoring unknown form field");
            }
        }
    }

    Ok((fields, files))
}
