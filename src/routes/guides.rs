// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Guide account routes.

use crate::error::AppError;
use crate::middleware::auth::{AuthenticatedPrincipal, AUTH_COOKIE};
use crate::models::{GuideProfile, Package};
use crate::response::{self, ApiResult};
use crate::services::guides::{
    ChangePasswordRequest, EmailRequest, LoginRequest, ResetPasswordRequest, SignupRequest,
    UpdateGuideRequest, VerifyRequest,
};
use crate::time_utils::format_utc_rfc3339;
use crate::AppState;
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    routing::{get, patch, post},
    Extension, Json, Router,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::Serialize;
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Signup, login, recovery and directory lookups.
pub fn public_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/guides", get(list_guides))
        .route("/api/guides/signup", post(signup))
        .route("/api/guides/verify", post(verify))
        .route("/api/guides/resend-otp", post(resend_otp))
        .route("/api/guides/login", post(login))
        .route("/api/guides/forget-password", post(forget_password))
        .route("/api/guides/reset-password", post(reset_password))
        .route("/api/guides/{guide_id}", get(get_guide))
        .route("/api/guides/{guide_id}/packages", get(list_packages))
}

/// Routes for the signed-in guide.
pub fn protected_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/guides/change-password", post(change_password))
        .route("/api/guides/update", patch(update_account))
}

#[derive(Serialize, Debug)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct LoginResponse {
    pub token: String,
    pub guide: GuideProfile,
}

/// Updated profile, plus a replacement token when the email changed.
#[derive(Serialize, Debug)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct UpdateAccountResponse {
    #[serde(flatten)]
    pub guide: GuideProfile,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct PackageResponse {
    pub id: String,
    pub guide_id: String,
    pub title: String,
    pub description: String,
    pub price: f64,
    pub duration_days: u32,
    pub locations: Vec<String>,
    pub created_at: String,
}

impl From<Package> for PackageResponse {
    fn from(p: Package) -> Self {
        Self {
            id: p.id,
            guide_id: p.guide_id,
            title: p.title,
            description: p.description,
            price: p.price,
            duration_days: p.duration_days,
            locations: p.locations,
            created_at: format_utc_rfc3339(p.created_at),
        }
    }
}

fn session_cookie(token: String) -> Cookie<'static> {
    Cookie::build((AUTH_COOKIE, token))
        .path("/")
        .http_only(true)
        .secure(true)
        .same_site(SameSite::Lax)
        .build()
}

/// Unwrap a JSON body, reporting malformed input as a 400.
fn body<T>(payload: Result<Json<T>, JsonRejection>) -> crate::error::Result<T> {
    payload
        .map(|Json(value)| value)
        .map_err(|e| AppError::InvalidInput(format!("Invalid request body: {}", e)))
}

async fn signup(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<SignupRequest>, JsonRejection>,
) -> ApiResult<GuideProfile> {
    let guide = state.guide_service.signup(body(payload)?).await?;
    response::created(
        "Guide registered. Check your email for the verification code",
        guide,
    )
}

async fn verify(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<VerifyRequest>, JsonRejection>,
) -> ApiResult<GuideProfile> {
    let guide = state.guide_service.verify(body(payload)?).await?;
    response::ok("Guide verified successfully", guide)
}

async fn resend_otp(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<EmailRequest>, JsonRejection>,
) -> ApiResult<()> {
    state.guide_service.resend_otp(body(payload)?).await?;
    response::message("Verification code sent")
}

async fn login(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> crate::error::Result<(CookieJar, axum::response::Response)> {
    use axum::response::IntoResponse;

    let session = state.guide_service.login(body(payload)?).await?;

    let cookie = session_cookie(session.token.clone());

    let response = response::ok(
        "Login successful",
        LoginResponse {
            token: session.token,
            guide: session.guide,
        },
    )?;

    Ok((jar.add(cookie), response.into_response()))
}

/// Always succeeds so callers cannot learn which emails are registered.
async fn forget_password(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<EmailRequest>, JsonRejection>,
) -> ApiResult<()> {
    state.guide_service.forget_password(body(payload)?).await?;
    response::message("If the email is registered, a reset code has been sent")
}

async fn reset_password(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ResetPasswordRequest>, JsonRejection>,
) -> ApiResult<()> {
    state.guide_service.reset_password(body(payload)?).await?;
    response::message("Password reset successfully")
}

async fn get_guide(
    State(state): State<Arc<AppState>>,
    Path(guide_id): Path<String>,
) -> ApiResult<GuideProfile> {
    let guide = state.guide_service.get_guide(&guide_id).await?;
    response::ok("Guide fetched successfully", guide)
}

async fn list_guides(State(state): State<Arc<AppState>>) -> ApiResult<Vec<GuideProfile>> {
    let guides = state.guide_service.list_guides().await?;
    response::ok("Guides fetched successfully", guides)
}

async fn list_packages(
    State(state): State<Arc<AppState>>,
    Path(guide_id): Path<String>,
) -> ApiResult<Vec<PackageResponse>> {
    let packages = state.guide_service.list_packages(&guide_id).await?;
    response::ok(
        "Packages fetched successfully",
        packages.into_iter().map(PackageResponse::from).collect(),
    )
}

async fn change_password(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<AuthenticatedPrincipal>,
    payload: Result<Json<ChangePasswordRequest>, JsonRejection>,
) -> ApiResult<()> {
    state
        .guide_service
        .change_password(&principal, body(payload)?)
        .await?;
    response::message("Password changed successfully")
}

/// Changing the email re-issues the session, since tokens name the email.
async fn update_account(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<AuthenticatedPrincipal>,
    jar: CookieJar,
    payload: Result<Json<UpdateGuideRequest>, JsonRejection>,
) -> crate::error::Result<(CookieJar, axum::response::Response)> {
    use axum::response::IntoResponse;

    let update = state
        .guide_service
        .update_account(&principal, body(payload)?)
        .await?;

    let jar = match &update.token {
        Some(token) => jar.add(session_cookie(token.clone())),
        None => jar,
    };

    let response = response::ok(
        "Guide updated successfully",
        UpdateAccountResponse {
            guide: update.guide,
            token: update.token,
        },
    )?;

    Ok((jar, response.into_response()))
}
