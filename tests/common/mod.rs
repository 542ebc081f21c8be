// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use async_trait::async_trait;
use chrono::Utc;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde::Serialize;
use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};
use travel_booking::config::Config;
use travel_booking::db::{FirestoreDb, MemoryDb};
use travel_booking::error::AppError;
use travel_booking::models::{OtpPurpose, User};
use travel_booking::routes::create_router;
use travel_booking::services::{ImageUpload, MemoryMediaStore, OtpNotifier};
use travel_booking::AppState;

/// Check if emulator is available via environment variable.
#[allow(dead_code)]
pub fn emulator_available() -> bool {
    std::env::var("FIRESTORE_EMULATOR_HOST").is_ok()
}

/// Skip test with message if emulator not available.
#[macro_export]
macro_rules! require_emulator {
    () => {
        if !crate::common::emulator_available() {
            eprintln!("⚠️  Skipping: FIRESTORE_EMULATOR_HOST not set");
            return;
        }
    };
}

/// Create a test database connection.
#[allow(dead_code)]
pub async fn test_db() -> FirestoreDb {
    FirestoreDb::new("test-project")
        .await
        .expect("Failed to connect to Firestore emulator")
}

/// Captures every code sent so tests can complete OTP flows.
#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<(String, String, OtpPurpose)>>,
}

#[allow(dead_code)]
impl RecordingNotifier {
    /// Most recent code sent to `email` for `purpose`.
    pub fn last_code(&self, email: &str, purpose: OtpPurpose) -> Option<String> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|(e, _, p)| e == email && *p == purpose)
            .map(|(_, code, _)| code.clone())
    }

    pub fn sent_count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }
}

#[async_trait]
impl OtpNotifier for RecordingNotifier {
    async fn send_otp(
        &self,
        email: &str,
        code: &str,
        purpose: OtpPurpose,
    ) -> Result<(), AppError> {
        self.sent
            .lock()
            .unwrap()
            .push((email.to_string(), code.to_string(), purpose));
        Ok(())
    }
}

/// Handles to everything behind a test router.
#[allow(dead_code)]
pub struct TestApp {
    pub router: axum::Router,
    pub state: Arc<AppState>,
    pub db: Arc<MemoryDb>,
    pub media: Arc<MemoryMediaStore>,
    pub notifier: Arc<RecordingNotifier>,
}

/// Create a test app over in-memory storage and media.
#[allow(dead_code)]
pub fn create_test_app() -> TestApp {
    let config = Config::test_default();
    let db = Arc::new(MemoryDb::new());
    let media = Arc::new(MemoryMediaStore::new());
    let notifier = Arc::new(RecordingNotifier::default());

    let state = Arc::new(AppState::new(
        config,
        db.clone(),
        media.clone(),
        notifier.clone(),
    ));

    TestApp {
        router: create_router(state.clone()),
        state,
        db,
        media,
        notifier,
    }
}

/// Seed a traveller account and return its ID.
#[allow(dead_code)]
pub fn seed_user(db: &MemoryDb, email: &str) -> String {
    let id = uuid::Uuid::new_v4().to_string();
    db.insert_user(User {
        id: id.clone(),
        email: email.to_string(),
        name: None,
        created_at: Utc::now(),
    });
    id
}

/// Create a test JWT token. `role` of `None` omits the claim entirely.
#[allow(dead_code)]
pub fn create_test_jwt(email: &str, role: Option<&str>, signing_key: &[u8]) -> String {
    #[derive(Serialize)]
    struct Claims<'a> {
        sub: &'a str,
        #[serde(skip_serializing_if = "Option::is_none")]
        role: Option<&'a str>,
        exp: usize,
        iat: usize,
    }

    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs() as usize;

    let claims = Claims {
        sub: email,
        role,
        exp: now + 86400,
        iat: now,
    };

    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(signing_key),
    )
    .unwrap()
}

#[allow(dead_code)]
pub fn image(name: &str) -> ImageUpload {
    ImageUpload {
        file_name: name.to_string(),
        content_type: "image/jpeg".to_string(),
        bytes: vec![0xff, 0xd8, 0xff, 0xe0],
    }
}

pub const BOUNDARY: &str = "travel-test-boundary";

/// Hand-built multipart body.
#[allow(dead_code)]
#[derive(Default)]
pub struct MultipartBody {
    buf: Vec<u8>,
}

#[allow(dead_code)]
impl MultipartBody {
    pub fn text(mut self, name: &str, value: &str) -> Self {
        self.buf.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
        self
    }

    pub fn file(mut self, name: &str, file_name: &str, content_type: &str, bytes: &[u8]) -> Self {
        self.buf.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"; filename=\"{file_name}\"\r\nContent-Type: {content_type}\r\n\r\n"
            )
            .as_bytes(),
        );
        self.buf.extend_from_slice(bytes);
        self.buf.extend_from_slice(b"\r\n");
        self
    }

    pub fn finish(mut self) -> Vec<u8> {
        self.buf
            .extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
        self.buf
    }

    pub fn content_type() -> String {
        format!("multipart/form-data; boundary={BOUNDARY}")
    }
}

/// Read a JSON response body.
#[allow(dead_code)]
pub async fn json_body(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}
