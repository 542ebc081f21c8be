// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod guide;
pub mod package;
pub mod trip;
pub mod user;

pub use guide::{Guide, GuideDetails, GuideProfile, OtpChallenge, OtpPurpose};
pub use package::Package;
pub use trip::{Trip, TripImage};
pub use user::User;
