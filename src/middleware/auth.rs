// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! JWT authentication middleware.
//!
//! The gate validates the session token, then resolves the token's email to
//! an account and hands the handler an [`AuthenticatedPrincipal`].

use crate::error::AppError;
use crate::AppState;
use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Session cookie name.
pub const AUTH_COOKIE: &str = "travel_token";

/// Kind of account a token was issued to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Guide,
}

/// JWT claims structure.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject (account email)
    pub sub: String,
    /// Tokens without a role were issued to users
    #[serde(default)]
    pub role: Role,
    /// Expiration time (Unix timestamp)
    pub exp: usize,
    /// Issued at (Unix timestamp)
    pub iat: usize,
}

/// Authenticated account resolved from the session token.
#[derive(Debug, Clone)]
pub struct AuthenticatedPrincipal {
    pub id: String,
    pub email: String,
}

/// Extract and validate the session token, requiring `role`.
fn authenticate(
    state: &AppState,
    jar: &CookieJar,
    request: &Request,
    role: Role,
) -> Result<Claims, AppError> {
    // Try cookie first, then header
    let token = if let Some(cookie) = jar.get(AUTH_COOKIE) {
        cookie.value().to_string()
    } else {
        let auth_header = request
            .headers()
            .get(header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok());

        match auth_header {
            Some(h) if h.starts_with("Bearer ") => h[7..].to_string(),
            _ => return Err(AppError::Unauthorized),
        }
    };

    let key = DecodingKey::from_secret(&state.config.jwt_signing_key);
    let validation = Validation::new(Algorithm::HS256);

    let claims = decode::<Claims>(&token, &key, &validation)
        .map_err(|_| AppError::InvalidToken)?
        .claims;

    if claims.role != role {
        tracing::debug!(expected = ?role, actual = ?claims.role, "Token role mismatch");
        return Err(AppError::InvalidToken);
    }

    Ok(claims)
}

/// Middleware for traveller routes.
///
/// A valid token whose email matches no user is reported as invalid input,
/// the same as a request missing its user ID.
pub async fn require_user(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let claims = authenticate(&state, &jar, &request, Role::User)?;

    let user = state
        .users
        .find_user_by_email(&claims.sub)
        .await?
        .ok_or_else(|| {
            tracing::warn!(email = %claims.sub, "Token email does not match any user");
            AppError::InvalidInput("User ID is required".to_string())
        })?;

    request.extensions_mut().insert(AuthenticatedPrincipal {
        id: user.id,
        email: user.email,
    });

    Ok(next.run(request).await)
}

/// Middleware for guide account routes.
pub async fn require_guide(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let claims = authenticate(&state, &jar, &request, Role::Guide)?;

    let guide = state
        .guides
        .find_guide_by_email(&claims.sub)
        .await?
        .ok_or_else(|| {
            tracing::warn!(email = %claims.sub, "Token email does not match any guide");
            AppError::InvalidInput("Guide ID is required".to_string())
        })?;

    request.extensions_mut().insert(AuthenticatedPrincipal {
        id: guide.id,
        email: guide.email,
    });

    Ok(next.run(request).await)
}

/// Create a JWT for a session.
pub fn create_jwt(
    email: &str,
    role: Role,
    signing_key: &[u8],
    ttl_hours: u64,
) -> anyhow::Result<String> {
    use jsonwebtoken::{encode, EncodingKey, Header};
    use std::time::{SystemTime, UNIX_EPOCH};

    let now = SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs() as usize;

    let claims = Claims {
        sub: email.to_string(),
        role,
        iat: now,
        exp: now + (ttl_hours as usize) * 60 * 60,
    };

    Ok(encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(signing_key),
    )?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_jwt_round_trip_keeps_role() {
        let key = b"test_jwt_key_32_bytes_minimum!!";
        let token = create_jwt("guide@example.com", Role::Guide, key, 1).unwrap();

        let data = decode::<Claims>(
            &token,
            &DecodingKey::from_secret(key),
            &Validation::new(Algorithm::HS256),
        )
        .unwrap();

        assert_eq!(data.claims.sub, "guide@example.com");
        assert_eq!(data.claims.role, Role::Guide);
    }

    #[test]
    fn test_missing_role_defaults_to_user() {
        let claims: Claims =
            serde_json::from_str(r#"{"sub":"a@b.c","exp":1,"iat":0}"#).unwrap();
        assert_eq!(claims.role, Role::User);
    }
}
