// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! One-time codes for guide email verification and password reset.
//!
//! Codes are six decimal digits drawn from the system RNG. Only a SHA-256
//! digest is persisted; delivery goes through an [`OtpNotifier`].

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use ring::rand::{SecureRandom, SystemRandom};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

use crate::error::AppError;
use crate::models::{OtpChallenge, OtpPurpose};

const OTP_DIGITS: u32 = 6;

/// Delivers one-time codes to account holders.
#[async_trait]
pub trait OtpNotifier: Send + Sync {
    async fn send_otp(&self, email: &str, code: &str, purpose: OtpPurpose)
        -> Result<(), AppError>;
}

/// Writes codes to the log. Used where no mail relay is configured.
pub struct TracingOtpNotifier;

#[async_trait]
impl OtpNotifier for TracingOtpNotifier {
    async fn send_otp(
        &self,
        email: &str,
        code: &str,
        purpose: OtpPurpose,
    ) -> Result<(), AppError> {
        tracing::info!(email, ?purpose, "One-time code issued");
        tracing::debug!(email, code, "One-time code value");
        Ok(())
    }
}

/// Generate a fresh code and the challenge to store alongside the account.
pub fn issue(
    purpose: OtpPurpose,
    ttl_minutes: i64,
    now: DateTime<Utc>,
) -> Result<(String, OtpChallenge), AppError> {
    let rng = SystemRandom::new();
    let mut buf = [0u8; 4];
    rng.fill(&mut buf)
        .map_err(|_| AppError::Internal(anyhow::anyhow!("System RNG unavailable")))?;

    let code = format!(
        "{:0width$}",
        u32::from_be_bytes(buf) % 10u32.pow(OTP_DIGITS),
        width = OTP_DIGITS as usize
    );

    let challenge = OtpChallenge {
        code_hash: digest(&code),
        purpose,
        expires_at: now + Duration::minutes(ttl_minutes),
    };

    Ok((code, challenge))
}

/// Check a submitted code against a stored challenge.
pub fn matches(
    challenge: &OtpChallenge,
    submitted: &str,
    purpose: OtpPurpose,
    now: DateTime<Utc>,
) -> bool {
    if challenge.purpose != purpose || now > challenge.expires_at {
        return false;
    }
    let submitted = digest(submitted.trim());
    submitted
        .as_bytes()
        .ct_eq(challenge.code_hash.as_bytes())
        .into()
}

fn digest(code: &str) -> String {
    hex::encode(Sha256::digest(code.as_bytes()))
}
