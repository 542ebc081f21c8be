// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Database layer.
//!
//! Handlers depend on the collaborator traits below rather than on a
//! concrete client, so the same service code runs against Firestore in
//! production and against [`MemoryDb`] in tests and local development.

pub mod firestore;
pub mod memory;

pub use firestore::FirestoreDb;
pub use memory::MemoryDb;

use crate::error::AppError;
use crate::models::{Guide, Package, Trip, User};
use async_trait::async_trait;

/// Collection names as constants.
pub mod collections {
    pub const USERS: &str = "users";
    pub const GUIDES: &str = "guides";
    pub const TRIPS: &str = "trips";
    pub const PACKAGES: &str = "packages";
}

/// Trip documents keyed by trip ID.
#[async_trait]
pub trait TripRepository: Send + Sync {
    async fn insert_trip(&self, trip: &Trip) -> Result<(), AppError>;

    async fn get_trip(&self, trip_id: &str) -> Result<Option<Trip>, AppError>;

    /// Fetch a trip only if it belongs to `owner_id`.
    async fn get_trip_for_owner(
        &self,
        trip_id: &str,
        owner_id: &str,
    ) -> Result<Option<Trip>, AppError>;

    /// All trips owned by a user, most recent first.
    async fn list_trips_for_owner(&self, owner_id: &str) -> Result<Vec<Trip>, AppError>;

    async fn update_trip(&self, trip: &Trip) -> Result<(), AppError>;

    async fn delete_trip(&self, trip_id: &str) -> Result<(), AppError>;
}

/// Read access to traveller accounts.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError>;

    async fn get_user(&self, user_id: &str) -> Result<Option<User>, AppError>;
}

/// Guide account storage.
#[async_trait]
pub trait GuideDirectory: Send + Sync {
    async fn insert_guide(&self, guide: &Guide) -> Result<(), AppError>;

    async fn get_guide(&self, guide_id: &str) -> Result<Option<Guide>, AppError>;

    async fn find_guide_by_email(&self, email: &str) -> Result<Option<Guide>, AppError>;

    async fn list_guides(&self) -> Result<Vec<Guide>, AppError>;

    async fn update_guide(&self, guide: &Guide) -> Result<(), AppError>;
}

/// Read access to guide packages.
#[async_trait]
pub trait PackageRepository: Send + Sync {
    /// Packages published by a guide, most recent first.
    async fn list_packages_for_guide(&self, guide_id: &str) -> Result<Vec<Package>, AppError>;
}

/// Convenience bound for a backend that provides every collection.
pub trait Store: TripRepository + UserDirectory + GuideDirectory + PackageRepository {}

impl<T> Store for T where T: TripRepository + UserDirectory + GuideDirectory + PackageRepository {}
