// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod cloudinary;
pub mod guides;
pub mod media;
pub mod otp;
pub mod password;
pub mod trips;

pub use cloudinary::CloudinaryMediaStore;
pub use guides::GuideService;
pub use media::{ImageUpload, MediaError, MediaStore, MemoryMediaStore, StoredImage};
pub use otp::{OtpNotifier, TracingOtpNotifier};
pub use trips::{DeleteOutcome, NewTrip, TripService, TripUpdate, TripView};
