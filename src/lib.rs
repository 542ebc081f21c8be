// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Travel booking backend.
//!
//! This crate provides the API for travellers to record trips (with images
//! hosted on an external media service) and for guides to manage their
//! accounts.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod response;
pub mod routes;
pub mod services;
pub mod time_utils;

use config::Config;
use db::{GuideDirectory, Store, UserDirectory};
use services::{GuideService, MediaStore, OtpNotifier, TripService};
use std::sync::Arc;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    /// Resolves traveller tokens to accounts
    pub users: Arc<dyn UserDirectory>,
    /// Resolves guide tokens to accounts
    pub guides: Arc<dyn GuideDirectory>,
    pub trip_service: TripService,
    pub guide_service: GuideService,
}

impl AppState {
    /// Wire services over a single backend that holds every collection.
    pub fn new<S>(
        config: Config,
        store: Arc<S>,
        media: Arc<dyn MediaStore>,
        notifier: Arc<dyn OtpNotifier>,
    ) -> Self
    where
        S: Store + 'static,
    {
        let trip_service =
            TripService::new(store.clone(), store.clone(), store.clone(), media);
        let guide_service = GuideService::new(store.clone(), store.clone(), notifier, &config);

        Self {
            config,
            users: store.clone(),
            guides: store,
            trip_service,
            guide_service,
        }
    }
}
