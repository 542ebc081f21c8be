// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Travel Booking API Server
//!
//! Travellers record trips with hosted images; guides manage accounts and
//! publish packages.

use travel_booking::{
    config::{Config, StorageBackend},
    db::{FirestoreDb, MemoryDb},
    services::{CloudinaryMediaStore, MediaStore, MemoryMediaStore, TracingOtpNotifier},
    AppState,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging for GCP
    init_logging()?;

    // Load configuration from environment
    let config = Config::from_env()?;
    tracing::info!(port = config.port, "Starting Travel Booking API");

    let media: Arc<dyn MediaStore> = match &config.cloudinary {
        Some(cloudinary) => {
            tracing::info!(
                cloud = %cloudinary.cloud_name,
                folder = %cloudinary.folder,
                "Cloudinary media store initialized"
            );
            Arc::new(CloudinaryMediaStore::new(cloudinary.clone()))
        }
        None => {
            tracing::warn!("CLOUDINARY_CLOUD_NAME not set, trip images are kept in memory");
            Arc::new(MemoryMediaStore::new())
        }
    };
    let notifier = Arc::new(TracingOtpNotifier);

    // Build shared state over the configured backend
    let state = match config.storage_backend {
        StorageBackend::Firestore => {
            let db = FirestoreDb::new(&config.gcp_project_id).await?;
            tracing::info!(project = %config.gcp_project_id, "Firestore initialized");
            AppState::new(config.clone(), Arc::new(db), media, notifier)
        }
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory storage, data is lost on restart");
            AppState::new(config.clone(), Arc::new(MemoryDb::new()), media, notifier)
        }
    };

    // Build router
    let app = travel_booking::routes::create_router(Arc::new(state));

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging (GCP-compliant).
fn init_logging() -> Result<(), Box<dyn std::error::Error>> {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("travel_booking=debug".parse()?)
                .add_directive("info".parse()?),
        )
        .with(format)
        .init();
    Ok(())
}
