// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Trip lifecycle tests against in-memory collaborators.
//!
//! These tests verify that:
//! 1. A failed trip insert leaves no hosted images behind
//! 2. Invalid input never reaches the media host
//! 3. Ownership is enforced for update and delete
//! 4. Deletion removes every image and reports cleanup failures

use async_trait::async_trait;
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use travel_booking::db::{MemoryDb, TripRepository};
use travel_booking::error::AppError;
use travel_booking::middleware::AuthenticatedPrincipal;
use travel_booking::models::Trip;
use travel_booking::services::{
    ImageUpload, MediaError, MediaStore, MemoryMediaStore, NewTrip, StoredImage, TripService,
    TripUpdate,
};

mod common;

use common::image;

fn principal(id: &str) -> AuthenticatedPrincipal {
    AuthenticatedPrincipal {
        id: id.to_string(),
        email: format!("{id}@example.com"),
    }
}

fn new_trip(cost: &str) -> NewTrip {
    NewTrip {
        location: Some("Kyoto".to_string()),
        description: Some("Temples in autumn".to_string()),
        cost: Some(cost.to_string()),
        guide_id: None,
        hashtags: vec!["japan".to_string()],
        blog_references: vec![],
    }
}

fn service(db: Arc<MemoryDb>, media: Arc<dyn MediaStore>) -> TripService {
    TripService::new(db.clone(), db.clone(), db, media)
}

/// Trip store that can fail inserts or deletes; everything else delegates.
struct FlakyTrips {
    inner: Arc<MemoryDb>,
    fail_insert: bool,
    fail_delete: bool,
}

impl FlakyTrips {
    fn failing_insert(inner: Arc<MemoryDb>) -> Self {
        Self {
            inner,
            fail_insert: true,
            fail_delete: false,
        }
    }

    fn failing_delete(inner: Arc<MemoryDb>) -> Self {
        Self {
            inner,
            fail_insert: false,
            fail_delete: true,
        }
    }
}

#[async_trait]
impl TripRepository for FlakyTrips {
    async fn insert_trip(&self, trip: &Trip) -> Result<(), AppError> {
        if self.fail_insert {
            return Err(AppError::Database("write quota exceeded".to_string()));
        }
        self.inner.insert_trip(trip).await
    }

    async fn get_trip(&self, trip_id: &str) -> Result<Option<Trip>, AppError> {
        self.inner.get_trip(trip_id).await
    }

    async fn get_trip_for_owner(
        &self,
        trip_id: &str,
        owner_id: &str,
    ) -> Result<Option<Trip>, AppError> {
        self.inner.get_trip_for_owner(trip_id, owner_id).await
    }

    async fn list_trips_for_owner(&self, owner_id: &str) -> Result<Vec<Trip>, AppError> {
        self.inner.list_trips_for_owner(owner_id).await
    }

    async fn update_trip(&self, trip: &Trip) -> Result<(), AppError> {
        self.inner.update_trip(trip).await
    }

    async fn delete_trip(&self, trip_id: &str) -> Result<(), AppError> {
        if self.fail_delete {
            return Err(AppError::Database("deadline exceeded".to_string()));
        }
        self.inner.delete_trip(trip_id).await
    }
}

/// Media host that counts calls and can fail on demand.
#[derive(Default)]
struct ScriptedMedia {
    inner: MemoryMediaStore,
    uploads: AtomicUsize,
    /// Upload number (1-based) that fails with a transport error
    fail_upload_at: Option<usize>,
    /// Deletes of this resource ID fail
    fail_delete_of: Option<String>,
}

#[async_trait]
impl MediaStore for ScriptedMedia {
    async fn upload(&self, image: &ImageUpload) -> Result<StoredImage, MediaError> {
        let n = self.uploads.fetch_add(1, Ordering::SeqCst) + 1;
        if self.fail_upload_at == Some(n) {
            return Err(MediaError::Transport("connection reset".to_string()));
        }
        self.inner.upload(image).await
    }

    async fn delete(&self, public_id: &str) -> Result<(), MediaError> {
        if self.fail_delete_of.as_deref() == Some(public_id) {
            return Err(MediaError::Api("HTTP 500".to_string()));
        }
        self.inner.delete(public_id).await
    }

    async fn fetch(&self, public_id: &str) -> Result<Option<StoredImage>, MediaError> {
        self.inner.fetch(public_id).await
    }
}

#[tokio::test]
async fn test_failed_insert_removes_uploaded_images() {
    let db = Arc::new(MemoryDb::new());
    let media = Arc::new(MemoryMediaStore::new());
    let svc = TripService::new(
        Arc::new(FlakyTrips::failing_insert(db.clone())),
        db.clone(),
        db.clone(),
        media.clone(),
    );

    let before = media.public_ids();
    let err = svc
        .create_trip(
            &principal("u1"),
            new_trip("100"),
            vec![image("a.jpg"), image("b.jpg"), image("c.jpg")],
        )
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::CreateFailed(_)));
    assert_eq!(media.public_ids(), before);
    assert_eq!(media.deletions().len(), 3);
    assert_eq!(db.trip_count(), 0);
}

#[tokio::test]
async fn test_transport_failure_mid_upload_removes_earlier_images() {
    let db = Arc::new(MemoryDb::new());
    let media = Arc::new(ScriptedMedia {
        fail_upload_at: Some(2),
        ..Default::default()
    });
    let svc = service(db.clone(), media.clone());

    let err = svc
        .create_trip(
            &principal("u1"),
            new_trip("10"),
            vec![image("a.jpg"), image("b.jpg"), image("c.jpg")],
        )
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::UploadFailed(_)));
    assert!(media.inner.public_ids().is_empty());
    // Third file never attempted
    assert_eq!(media.uploads.load(Ordering::SeqCst), 2);
    assert_eq!(db.trip_count(), 0);
}

#[tokio::test]
async fn test_rejected_file_is_skipped() {
    let db = Arc::new(MemoryDb::new());
    let media = Arc::new(MemoryMediaStore::new());
    let svc = service(db.clone(), media.clone());

    let mut empty = image("empty.jpg");
    empty.bytes.clear();

    let trip = svc
        .create_trip(&principal("u1"), new_trip("10"), vec![empty, image("ok.jpg")])
        .await
        .unwrap();

    assert_eq!(trip.images.len(), 1);
    assert_eq!(media.public_ids().len(), 1);
}

#[tokio::test]
async fn test_all_files_rejected_fails_upload() {
    let db = Arc::new(MemoryDb::new());
    let media = Arc::new(MemoryMediaStore::new());
    let svc = service(db.clone(), media.clone());

    let mut empty = image("empty.jpg");
    empty.bytes.clear();

    let err = svc
        .create_trip(&principal("u1"), new_trip("10"), vec![empty])
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::UploadFailed(_)));
    assert_eq!(db.trip_count(), 0);
}

#[tokio::test]
async fn test_invalid_input_makes_no_media_calls() {
    let db = Arc::new(MemoryDb::new());
    let media = Arc::new(ScriptedMedia::default());
    let svc = service(db.clone(), media.clone());
    let owner = principal("u1");

    // No files
    let err = svc
        .create_trip(&owner, new_trip("10"), vec![])
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidInput(_)));

    // Bad costs
    for cost in ["-1", "abc", ""] {
        let err = svc
            .create_trip(&owner, new_trip(cost), vec![image("a.jpg")])
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)), "cost {cost:?}");
    }

    // Blank location
    let mut blank = new_trip("10");
    blank.location = Some("   ".to_string());
    let err = svc
        .create_trip(&owner, blank, vec![image("a.jpg")])
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidInput(_)));

    assert_eq!(media.uploads.load(Ordering::SeqCst), 0);
    assert_eq!(db.trip_count(), 0);
}

#[tokio::test]
async fn test_zero_cost_accepted() {
    let db = Arc::new(MemoryDb::new());
    let svc = service(db.clone(), Arc::new(MemoryMediaStore::new()));

    let trip = svc
        .create_trip(&principal("u1"), new_trip("0"), vec![image("a.jpg")])
        .await
        .unwrap();
    assert_eq!(trip.cost, 0.0);
}

#[tokio::test]
async fn test_update_is_partial_and_owner_only() {
    let db = Arc::new(MemoryDb::new());
    let svc = service(db.clone(), Arc::new(MemoryMediaStore::new()));
    let owner = principal("u1");

    let trip = svc
        .create_trip(&owner, new_trip("50"), vec![image("a.jpg")])
        .await
        .unwrap();

    let update: TripUpdate = serde_json::from_value(json!({"cost": "75.5"})).unwrap();
    let updated = svc.update_trip(&owner, &trip.id, update).await.unwrap();
    assert_eq!(updated.cost, 75.5);
    assert_eq!(updated.location, "Kyoto");
    assert_eq!(updated.description, "Temples in autumn");
    assert_eq!(updated.hashtags, vec!["japan".to_string()]);
    assert_eq!(updated.images, trip.images);
    assert!(updated.updated_at >= trip.updated_at);

    // Another user sees the same error as for a missing trip
    let update: TripUpdate = serde_json::from_value(json!({"cost": 1})).unwrap();
    let err = svc
        .update_trip(&principal("u2"), &trip.id, update)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFoundOrUnauthorized(_)));

    let stored = db.get_trip(&trip.id).await.unwrap().unwrap();
    assert_eq!(stored.cost, 75.5);
}

#[tokio::test]
async fn test_update_rejects_bad_cost_without_writing() {
    let db = Arc::new(MemoryDb::new());
    let svc = service(db.clone(), Arc::new(MemoryMediaStore::new()));
    let owner = principal("u1");

    let trip = svc
        .create_trip(&owner, new_trip("50"), vec![image("a.jpg")])
        .await
        .unwrap();

    for bad in [json!(-5), json!("lots"), json!({"amount": 5})] {
        let update: TripUpdate = serde_json::from_value(json!({
            "tripLocation": "Osaka",
            "cost": bad,
        }))
        .unwrap();
        let err = svc.update_trip(&owner, &trip.id, update).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
    }

    let stored = db.get_trip(&trip.id).await.unwrap().unwrap();
    assert_eq!(stored.location, "Kyoto");
    assert_eq!(stored.cost, 50.0);
}

#[tokio::test]
async fn test_delete_removes_every_image() {
    let db = Arc::new(MemoryDb::new());
    let media = Arc::new(MemoryMediaStore::new());
    let svc = service(db.clone(), media.clone());
    let owner = principal("u1");

    let trip = svc
        .create_trip(
            &owner,
            new_trip("20"),
            vec![image("a.jpg"), image("b.jpg"), image("c.jpg")],
        )
        .await
        .unwrap();

    // Another user cannot delete it
    let err = svc
        .delete_trip(&principal("u2"), &trip.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFoundOrUnauthorized(_)));
    assert_eq!(db.trip_count(), 1);

    let outcome = svc.delete_trip(&owner, &trip.id).await.unwrap();
    assert_eq!(outcome.deleted_images, 3);
    assert!(outcome.failed_image_cleanups.is_empty());
    assert_eq!(media.deletions().len(), 3);
    assert!(media.public_ids().is_empty());
    assert_eq!(db.trip_count(), 0);
}

#[tokio::test]
async fn test_delete_reports_cleanup_failures() {
    let db = Arc::new(MemoryDb::new());
    let media = Arc::new(ScriptedMedia {
        // Ids are assigned in upload order starting at zero
        fail_delete_of: Some("trips/img_1".to_string()),
        ..Default::default()
    });
    let svc = service(db.clone(), media.clone());
    let owner = principal("u1");

    let trip = svc
        .create_trip(
            &owner,
            new_trip("20"),
            vec![image("a.jpg"), image("b.jpg"), image("c.jpg")],
        )
        .await
        .unwrap();

    let outcome = svc.delete_trip(&owner, &trip.id).await.unwrap();
    assert_eq!(outcome.deleted_images, 2);
    assert_eq!(outcome.failed_image_cleanups, vec!["trips/img_1".to_string()]);
    // The record is gone even though one image remains hosted
    assert_eq!(db.trip_count(), 0);
    assert_eq!(media.inner.public_ids(), vec!["trips/img_1".to_string()]);
}

#[tokio::test]
async fn test_failed_record_delete_keeps_images() {
    let db = Arc::new(MemoryDb::new());
    let media = Arc::new(MemoryMediaStore::new());
    let svc = TripService::new(
        Arc::new(FlakyTrips::failing_delete(db.clone())),
        db.clone(),
        db.clone(),
        media.clone(),
    );
    let owner = principal("u1");

    let trip = svc
        .create_trip(&owner, new_trip("60"), vec![image("a.jpg")])
        .await
        .unwrap();

    let err = svc.delete_trip(&owner, &trip.id).await.unwrap_err();
    assert!(matches!(err, AppError::DeleteFailed(_)));
    assert!(media.deletions().is_empty());
    assert_eq!(media.public_ids(), vec!["trips/img_0".to_string()]);
    assert_eq!(svc.get_trip(&trip.id).await.unwrap().trip.id, trip.id);
}

#[tokio::test]
async fn test_list_returns_own_trips_newest_first() {
    let db = Arc::new(MemoryDb::new());
    let svc = service(db.clone(), Arc::new(MemoryMediaStore::new()));
    let owner = principal("u1");

    let first = svc
        .create_trip(&owner, new_trip("1"), vec![image("a.jpg")])
        .await
        .unwrap();
    tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    let second = svc
        .create_trip(&owner, new_trip("2"), vec![image("b.jpg")])
        .await
        .unwrap();
    tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    let third = svc
        .create_trip(&owner, new_trip("3"), vec![image("c.jpg")])
        .await
        .unwrap();
    svc.create_trip(&principal("u2"), new_trip("4"), vec![image("d.jpg")])
        .await
        .unwrap();

    let views = svc.list_trips(&owner).await.unwrap();
    let ids: Vec<&str> = views.iter().map(|v| v.trip.id.as_str()).collect();
    assert_eq!(
        ids,
        vec![third.id.as_str(), second.id.as_str(), first.id.as_str()]
    );
}

#[tokio::test]
async fn test_get_unknown_trip_is_not_found() {
    let db = Arc::new(MemoryDb::new());
    let svc = service(db, Arc::new(MemoryMediaStore::new()));

    let err = svc.get_trip("missing").await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));

    let err = svc.get_trip("").await.unwrap_err();
    assert!(matches!(err, AppError::InvalidInput(_)));
}
