// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore client wrapper with typed operations.
//!
//! Provides high-level operations for:
//! - Trips (owned by users, sorted by creation time)
//! - Users (lookup only)
//! - Guides (accounts and profiles)
//! - Packages (lookup by guide)

use crate::db::{collections, GuideDirectory, PackageRepository, TripRepository, UserDirectory};
use crate::error::AppError;
use crate::models::{Guide, Package, Trip, User};
use async_trait::async_trait;

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreDb {
    client: firestore::FirestoreDb,
}

impl FirestoreDb {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self, AppError> {
        // If the emulator environment variable is set, use unauthenticated connection
        // to avoid local credential warnings and leakage.
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self { client })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self, AppError> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            AppError::Database(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self { client })
    }

    /// Write a whole document, replacing any previous version.
    async fn put<T>(&self, collection: &str, id: &str, object: &T) -> Result<(), AppError>
    where
        T: serde::Serialize + for<'de> serde::Deserialize<'de> + Send + Sync,
    {
        let _: T = self
            .client
            .fluent()
            .update()
            .in_col(collection)
            .document_id(id)
            .object(object)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    async fn get<T>(&self, collection: &str, id: &str) -> Result<Option<T>, AppError>
    where
        T: for<'de> serde::Deserialize<'de> + Send,
    {
        self.client
            .fluent()
            .select()
            .by_id_in(collection)
            .obj()
            .one(id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// First document whose `field` equals `value`.
    async fn find_one_by<T>(
        &self,
        collection: &str,
        field: &'static str,
        value: &str,
    ) -> Result<Option<T>, AppError>
    where
        T: for<'de> serde::Deserialize<'de> + Send,
    {
        let value = value.to_string();
        let mut found: Vec<T> = self
            .client
            .fluent()
            .select()
            .from(collection)
            .filter(move |q| q.field(field).eq(value.clone()))
            .limit(1)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(found.pop())
    }
}

// ─── Trip Operations ─────────────────────────────────────────

#[async_trait]
impl TripRepository for FirestoreDb {
    async fn insert_trip(&self, trip: &Trip) -> Result<(), AppError> {
        let _: () = self
            .client
            .fluent()
            .insert()
            .into(collections::TRIPS)
            .document_id(&trip.id)
            .object(trip)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        tracing::debug!(trip_id = %trip.id, owner_id = %trip.owner_id, "Trip stored");
        Ok(())
    }

    async fn get_trip(&self, trip_id: &str) -> Result<Option<Trip>, AppError> {
        self.get(collections::TRIPS, trip_id).await
    }

    async fn get_trip_for_owner(
        &self,
        trip_id: &str,
        owner_id: &str,
    ) -> Result<Option<Trip>, AppError> {
        Ok(self
            .get_trip(trip_id)
            .await?
            .filter(|trip| trip.owner_id == owner_id))
    }

    async fn list_trips_for_owner(&self, owner_id: &str) -> Result<Vec<Trip>, AppError> {
        let owner_id = owner_id.to_string();
        self.client
            .fluent()
            .select()
            .from(collections::TRIPS)
            .filter(move |q| q.field("owner_id").eq(owner_id.clone()))
            .order_by([("created_at", firestore::FirestoreQueryDirection::Descending)])
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn update_trip(&self, trip: &Trip) -> Result<(), AppError> {
        self.put(collections::TRIPS, &trip.id, trip).await
    }

    async fn delete_trip(&self, trip_id: &str) -> Result<(), AppError> {
        self.client
            .fluent()
            .delete()
            .from(collections::TRIPS)
            .document_id(trip_id)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }
}

// ─── User Operations ─────────────────────────────────────────

#[async_trait]
impl UserDirectory for FirestoreDb {
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        self.find_one_by(collections::USERS, "email", email).await
    }

    async fn get_user(&self, user_id: &str) -> Result<Option<User>, AppError> {
        self.get(collections::USERS, user_id).await
    }
}

// ─── Guide Operations ────────────────────────────────────────

#[async_trait]
impl GuideDirectory for FirestoreDb {
    async fn insert_guide(&self, guide: &Guide) -> Result<(), AppError> {
        let _: () = self
            .client
            .fluent()
            .insert()
            .into(collections::GUIDES)
            .document_id(&guide.id)
            .object(guide)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    async fn get_guide(&self, guide_id: &str) -> Result<Option<Guide>, AppError> {
        self.get(collections::GUIDES, guide_id).await
    }

    async fn find_guide_by_email(&self, email: &str) -> Result<Option<Guide>, AppError> {
        self.find_one_by(collections::GUIDES, "email", email).await
    }

    async fn list_guides(&self) -> Result<Vec<Guide>, AppError> {
        self.client
            .fluent()
            .select()
            .from(collections::GUIDES)
            .order_by([("name", firestore::FirestoreQueryDirection::Ascending)])
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn update_guide(&self, guide: &Guide) -> Result<(), AppError> {
        self.put(collections::GUIDES, &guide.id, guide).await
    }
}

// ─── Package Operations ──────────────────────────────────────

#[async_trait]
impl PackageRepository for FirestoreDb {
    async fn list_packages_for_guide(&self, guide_id: &str) -> Result<Vec<Package>, AppError> {
        let guide_id = guide_id.to_string();
        self.client
            .fluent()
            .select()
            .from(collections::PACKAGES)
            .filter(move |q| q.field("guide_id").eq(guide_id.clone()))
            .order_by([("created_at", firestore::FirestoreQueryDirection::Descending)])
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}
