// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Process-local store used for tests and `STORAGE_BACKEND=memory`.

use crate::db::{GuideDirectory, PackageRepository, TripRepository, UserDirectory};
use crate::error::AppError;
use crate::models::{Guide, Package, Trip, User};
use async_trait::async_trait;
use dashmap::DashMap;

/// In-memory implementation of every collection.
#[derive(Default)]
pub struct MemoryDb {
    trips: DashMap<String, Trip>,
    users: DashMap<String, User>,
    guides: DashMap<String, Guide>,
    packages: DashMap<String, Package>,
}

impl MemoryDb {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a user account. User signup lives outside this service.
    pub fn insert_user(&self, user: User) {
        self.users.insert(user.id.clone(), user);
    }

    /// Seed a guide package.
    pub fn insert_package(&self, package: Package) {
        self.packages.insert(package.id.clone(), package);
    }

    pub fn trip_count(&self) -> usize {
        self.trips.len()
    }
}

#[async_trait]
impl TripRepository for MemoryDb {
    async fn insert_trip(&self, trip: &Trip) -> Result<(), AppError> {
        if self.trips.contains_key(&trip.id) {
            return Err(AppError::Database(format!("Trip {} already exists", trip.id)));
        }
        self.trips.insert(trip.id.clone(), trip.clone());
        Ok(())
    }

    async fn get_trip(&self, trip_id: &str) -> Result<Option<Trip>, AppError> {
        Ok(self.trips.get(trip_id).map(|t| t.clone()))
    }

    async fn get_trip_for_owner(
        &self,
        trip_id: &str,
        owner_id: &str,
    ) -> Result<Option<Trip>, AppError> {
        Ok(self
            .trips
            .get(trip_id)
            .filter(|t| t.owner_id == owner_id)
            .map(|t| t.clone()))
    }

    async fn list_trips_for_owner(&self, owner_id: &str) -> Result<Vec<Trip>, AppError> {
        let mut trips: Vec<Trip> = self
            .trips
            .iter()
            .filter(|t| t.owner_id == owner_id)
            .map(|t| t.value().clone())
            .collect();
        trips.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(trips)
    }

    async fn update_trip(&self, trip: &Trip) -> Result<(), AppError> {
        match self.trips.get_mut(&trip.id) {
            Some(mut existing) => {
                *existing = trip.clone();
                Ok(())
            }
            None => Err(AppError::Database(format!("Trip {} does not exist", trip.id))),
        }
    }

    async fn delete_trip(&self, trip_id: &str) -> Result<(), AppError> {
        self.trips.remove(trip_id);
        Ok(())
    }
}

#[async_trait]
impl UserDirectory for MemoryDb {
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        Ok(self
            .users
            .iter()
            .find(|u| u.email == email)
            .map(|u| u.value().clone()))
    }

    async fn get_user(&self, user_id: &str) -> Result<Option<User>, AppError> {
        Ok(self.users.get(user_id).map(|u| u.clone()))
    }
}

#[async_trait]
impl GuideDirectory for MemoryDb {
    async fn insert_guide(&self, guide: &Guide) -> Result<(), AppError> {
        if self.guides.contains_key(&guide.id) {
            return Err(AppError::Database(format!("Guide {} already exists", guide.id)));
        }
        self.guides.insert(guide.id.clone(), guide.clone());
        Ok(())
    }

    async fn get_guide(&self, guide_id: &str) -> Result<Option<Guide>, AppError> {
        Ok(self.guides.get(guide_id).map(|g| g.clone()))
    }

    async fn find_guide_by_email(&self, email: &str) -> Result<Option<Guide>, AppError> {
        Ok(self
            .guides
            .iter()
            .find(|g| g.email == email)
            .map(|g| g.value().clone()))
    }

    async fn list_guides(&self) -> Result<Vec<Guide>, AppError> {
        let mut guides: Vec<Guide> = self.guides.iter().map(|g| g.value().clone()).collect();
        guides.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(guides)
    }

    async fn update_guide(&self, guide: &Guide) -> Result<(), AppError> {
        self.guides.insert(guide.id.clone(), guide.clone());
        Ok(())
    }
}

#[async_trait]
impl PackageRepository for MemoryDb {
    async fn list_packages_for_guide(&self, guide_id: &str) -> Result<Vec<Package>, AppError> {
        let mut packages: Vec<Package> = self
            .packages
            .iter()
            .filter(|p| p.guide_id == guide_id)
            .map(|p| p.value().clone())
            .collect();
        packages.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(packages)
    }
}
