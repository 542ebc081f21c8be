// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Guide accounts: signup with email verification, login, password
//! recovery and profile maintenance.

use chrono::Utc;
use serde::Deserialize;
use std::sync::Arc;
use validator::Validate;

use crate::db::{GuideDirectory, PackageRepository};
use crate::error::{AppError, Result};
use crate::middleware::auth::{create_jwt, AuthenticatedPrincipal, Role};
use crate::models::{Guide, GuideProfile, OtpPurpose, Package};
use crate::services::otp::{self, OtpNotifier};
use crate::services::password::{hash_password, verify_password};

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SignupRequest {
    #[validate(length(min = 1, max = 100))]
    pub guide_name: String,
    #[validate(email)]
    pub guide_email: String,
    #[validate(length(min = 8, max = 128))]
    pub password: String,
    #[validate(url)]
    pub profile_image: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct VerifyRequest {
    #[validate(email)]
    pub guide_email: String,
    #[validate(length(min = 1, max = 12))]
    pub otp: String,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct EmailRequest {
    #[validate(email)]
    pub guide_email: String,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    #[validate(email)]
    pub guide_email: String,
    #[validate(length(min = 1))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordRequest {
    #[validate(email)]
    pub guide_email: String,
    #[validate(length(min = 1, max = 12))]
    pub otp: String,
    #[validate(length(min = 8, max = 128))]
    pub new_password: String,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    #[validate(length(min = 1))]
    pub old_password: String,
    #[validate(length(min = 8, max = 128))]
    pub new_password: String,
}

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateGuideRequest {
    #[validate(length(min = 1, max = 100))]
    pub guide_name: Option<String>,
    #[validate(email)]
    pub guide_email: Option<String>,
    #[validate(url)]
    pub profile_image: Option<String>,
}

/// Successful login.
#[derive(Debug, Clone)]
pub struct GuideSession {
    pub token: String,
    pub guide: GuideProfile,
}

/// Result of an account update. `token` is a fresh session token, issued
/// only when the email (the token subject) changed.
#[derive(Debug, Clone)]
pub struct GuideUpdate {
    pub guide: GuideProfile,
    pub token: Option<String>,
}

fn validate<T: Validate>(request: &T) -> Result<()> {
    request
        .validate()
        .map_err(|e| AppError::InvalidInput(e.to_string()))
}

fn normalize_email(email: &str) -> String {
    email.trim().to_ascii_lowercase()
}

/// Guide account operations.
#[derive(Clone)]
pub struct GuideService {
    guides: Arc<dyn GuideDirectory>,
    packages: Arc<dyn PackageRepository>,
    notifier: Arc<dyn OtpNotifier>,
    otp_ttl_minutes: i64,
    jwt_signing_key: Vec<u8>,
    jwt_ttl_hours: u64,
}

impl GuideService {
    pub fn new(
        guides: Arc<dyn GuideDirectory>,
        packages: Arc<dyn PackageRepository>,
        notifier: Arc<dyn OtpNotifier>,
        config: &crate::config::Config,
    ) -> Self {
        Self {
            guides,
            packages,
            notifier,
            otp_ttl_minutes: config.otp_ttl_minutes,
            jwt_signing_key: config.jwt_signing_key.clone(),
            jwt_ttl_hours: config.jwt_ttl_hours,
        }
    }

    async fn guide_by_email(&self, email: &str) -> Result<Guide> {
        self.guides
            .find_guide_by_email(&normalize_email(email))
            .await?
            .ok_or_else(|| AppError::NotFound("Guide not found".to_string()))
    }

    /// Store a fresh code on the guide and deliver it.
    async fn issue_otp(&self, guide: &mut Guide, purpose: OtpPurpose) -> Result<()> {
        let (code, challenge) = otp::issue(purpose, self.otp_ttl_minutes, Utc::now())?;
        guide.otp = Some(challenge);
        self.guides.update_guide(guide).await?;
        self.notifier.send_otp(&guide.email, &code, purpose).await
    }

    /// Consume a code if it matches, otherwise fail without changing state.
    fn take_otp(guide: &mut Guide, submitted: &str, purpose: OtpPurpose) -> Result<()> {
        let valid = guide
            .otp
            .as_ref()
            .map(|challenge| otp::matches(challenge, submitted, purpose, Utc::now()))
            .unwrap_or(false);

        if !valid {
            return Err(AppError::InvalidInput("Invalid or expired OTP".to_string()));
        }
        guide.otp = None;
        Ok(())
    }

    // ─── Unauthenticated ─────────────────────────────────────────

    pub async fn signup(&self, request: SignupRequest) -> Result<GuideProfile> {
        validate(&request)?;
        let email = normalize_email(&request.guide_email);
        let name = request.guide_name.trim().to_string();
        if name.is_empty() {
            return Err(AppError::InvalidInput("Guide name is required".to_string()));
        }

        if self.guides.find_guide_by_email(&email).await?.is_some() {
            return Err(AppError::Conflict(
                "A guide with this email already exists".to_string(),
            ));
        }

        let now = Utc::now();
        let (code, challenge) = otp::issue(OtpPurpose::Verification, self.otp_ttl_minutes, now)?;
        let guide = Guide {
            id: uuid::Uuid::new_v4().to_string(),
            name,
            email,
            password_hash: hash_password(&request.password)?,
            profile_image: request.profile_image,
            verified: false,
            otp: Some(challenge),
            created_at: now,
        };
        self.guides.insert_guide(&guide).await?;
        self.notifier
            .send_otp(&guide.email, &code, OtpPurpose::Verification)
            .await?;

        tracing::info!(guide_id = %guide.id, "Guide signed up, awaiting verification");

        Ok(GuideProfile::from(&guide))
    }

    pub async fn verify(&self, request: VerifyRequest) -> Result<GuideProfile> {
        validate(&request)?;
        let mut guide = self.guide_by_email(&request.guide_email).await?;
        if guide.verified {
            return Err(AppError::InvalidInput("Guide is already verified".to_string()));
        }

        Self::take_otp(&mut guide, &request.otp, OtpPurpose::Verification)?;
        guide.verified = true;
        self.guides.update_guide(&guide).await?;

        tracing::info!(guide_id = %guide.id, "Guide verified");

        Ok(GuideProfile::from(&guide))
    }

    pub async fn resend_otp(&self, request: EmailRequest) -> Result<()> {
        validate(&request)?;
        let mut guide = self.guide_by_email(&request.guide_email).await?;
        if guide.verified {
            return Err(AppError::InvalidInput("Guide is already verified".to_string()));
        }
        self.issue_otp(&mut guide, OtpPurpose::Verification).await
    }

    pub async fn login(&self, request: LoginRequest) -> Result<GuideSession> {
        validate(&request)?;
        let guide = self
            .guides
            .find_guide_by_email(&normalize_email(&request.guide_email))
            .await?
            .filter(|guide| verify_password(&request.password, &guide.password_hash))
            .ok_or(AppError::Unauthorized)?;

        if !guide.verified {
            return Err(AppError::Forbidden(
                "Verify your email before logging in".to_string(),
            ));
        }

        let token = self.issue_token(&guide)?;

        tracing::info!(guide_id = %guide.id, "Guide logged in");

        Ok(GuideSession {
            token,
            guide: GuideProfile::from(&guide),
        })
    }

    fn issue_token(&self, guide: &Guide) -> Result<String> {
        create_jwt(
            &guide.email,
            Role::Guide,
            &self.jwt_signing_key,
            self.jwt_ttl_hours,
        )
        .map_err(|e| AppError::Internal(anyhow::anyhow!("JWT creation failed: {}", e)))
    }

    /// Start password recovery. Succeeds whether or not the email is known.
    pub async fn forget_password(&self, request: EmailRequest) -> Result<()> {
        validate(&request)?;
        match self
            .guides
            .find_guide_by_email(&normalize_email(&request.guide_email))
            .await?
        {
            Some(mut guide) => self.issue_otp(&mut guide, OtpPurpose::PasswordReset).await,
            None => {
                tracing::debug!("Password reset requested for unknown email");
                Ok(())
            }
        }
    }

    pub async fn reset_password(&self, request: ResetPasswordRequest) -> Result<()> {
        validate(&request)?;
        let mut guide = self.guide_by_email(&request.guide_email).await?;

        Self::take_otp(&mut guide, &request.otp, OtpPurpose::PasswordReset)?;
        guide.password_hash = hash_password(&request.new_password)?;
        self.guides.update_guide(&guide).await?;

        tracing::info!(guide_id = %guide.id, "Guide password reset");
        Ok(())
    }

    pub async fn get_guide(&self, guide_id: &str) -> Result<GuideProfile> {
        self.guides
            .get_guide(guide_id)
            .await?
            .map(|guide| GuideProfile::from(&guide))
            .ok_or_else(|| AppError::NotFound("Guide not found".to_string()))
    }

    /// Verified guides, sorted by name.
    pub async fn list_guides(&self) -> Result<Vec<GuideProfile>> {
        let mut guides: Vec<GuideProfile> = self
            .guides
            .list_guides()
            .await?
            .iter()
            .filter(|guide| guide.verified)
            .map(GuideProfile::from)
            .collect();
        guides.sort_by(|a, b| a.guide_name.cmp(&b.guide_name));
        Ok(guides)
    }

    pub async fn list_packages(&self, guide_id: &str) -> Result<Vec<Package>> {
        if self.guides.get_guide(guide_id).await?.is_none() {
            return Err(AppError::NotFound("Guide not found".to_string()));
        }
        self.packages.list_packages_for_guide(guide_id).await
    }

    // ─── Authenticated ───────────────────────────────────────────

    pub async fn change_password(
        &self,
        principal: &AuthenticatedPrincipal,
        request: ChangePasswordRequest,
    ) -> Result<()> {
        validate(&request)?;
        let mut guide = self
            .guides
            .get_guide(&principal.id)
            .await?
            .ok_or_else(|| AppError::NotFound("Guide not found".to_string()))?;

        if !verify_password(&request.old_password, &guide.password_hash) {
            return Err(AppError::InvalidInput("Invalid old password".to_string()));
        }

        guide.password_hash = hash_password(&request.new_password)?;
        self.guides.update_guide(&guide).await?;

        tracing::info!(guide_id = %guide.id, "Guide password changed");
        Ok(())
    }

    pub async fn update_account(
        &self,
        principal: &AuthenticatedPrincipal,
        request: UpdateGuideRequest,
    ) -> Result<GuideUpdate> {
        validate(&request)?;
        let mut guide = self
            .guides
            .get_guide(&principal.id)
            .await?
            .ok_or_else(|| AppError::NotFound("Guide not found".to_string()))?;

        if let Some(name) = request.guide_name {
            let name = name.trim().to_string();
            if name.is_empty() {
                return Err(AppError::InvalidInput("Guide name cannot be empty".to_string()));
            }
            guide.name = name;
        }

        let mut email_changed = false;
        if let Some(email) = request.guide_email {
            let email = normalize_email(&email);
            if email != guide.email {
                if self.guides.find_guide_by_email(&email).await?.is_some() {
                    return Err(AppError::Conflict(
                        "A guide with this email already exists".to_string(),
                    ));
                }
                guide.email = email;
                email_changed = true;
            }
        }

        if let Some(profile_image) = request.profile_image {
            guide.profile_image = Some(profile_image);
        }

        self.guides.update_guide(&guide).await?;

        tracing::info!(guide_id = %guide.id, email_changed, "Guide account updated");

        let token = if email_changed {
            Some(self.issue_token(&guide)?)
        } else {
            None
        };

        Ok(GuideUpdate {
            guide: GuideProfile::from(&guide),
            token,
        })
    }
}
