#![allow(dead_code)]

use attendance_service::config::AttendanceConfig;
use attendance_service::services::gate::fakes::AlwaysPass;
use attendance_service::services::gate::{ActivenessVerifier, IdentityVerifier};
use attendance_service::services::ManualClock;
use attendance_service::startup::{build_router, AppState, Stores, Verifiers};
use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use chrono::{Duration, Utc};
use http_body_util::BodyExt;
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

pub const FACULTY: &str = "faculty_1";
pub const CLASSROOM_ORIGIN: &str = "10.0.0.5";

pub struct TestApp {
    pub router: Router,
    pub clock: Arc<ManualClock>,
    pub state: AppState,
}

impl TestApp {
    /// In-memory app whose gate accepts everyone.
    pub fn spawn() -> Self {
        Self::with_verifiers(Arc::new(AlwaysPass), Arc::new(AlwaysPass))
    }

    pub fn with_verifiers(
        activeness: Arc<dyn ActivenessVerifier>,
        identity: Arc<dyn IdentityVerifier>,
    ) -> Self {
        Self::build(
            AttendanceConfig::default(),
            Verifiers {
                activeness,
                identity,
            },
        )
    }

    /// In-memory app using the configured production verifiers.
    pub fn with_config(config: AttendanceConfig) -> Self {
        let verifiers = Verifiers::from_config(&config);
        Self::build(config, verifiers)
    }

    fn build(config: AttendanceConfig, verifiers: Verifiers) -> Self {
        let clock = Arc::new(ManualClock::new(Utc::now()));
        let state = AppState::new(config, Stores::in_memory(), verifiers, clock.clone());
        TestApp {
            router: build_router(state.clone()),
            clock,
            state,
        }
    }

    pub fn advance(&self, seconds: i64) {
        self.clock.advance(Duration::seconds(seconds));
    }

    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible");
        let status = response.status();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("body collects")
            .to_bytes();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                Value::String(String::from_utf8_lossy(&bytes).into_owned())
            })
        };
        (status, body)
    }

    pub async fn get(&self, uri: &str, user: &str, role: &str) -> (StatusCode, Value) {
        let request = Request::builder()
            .method("GET")
            .uri(uri)
            .header("X-User-ID", user)
            .header("X-User-Role", role)
            .body(Body::empty())
            .unwrap();
        self.send(request).await
    }

    pub async fn post(&self, uri: &str, user: &str, role: &str, body: Value) -> (StatusCode, Value) {
        let request = Request::builder()
            .method("POST")
            .uri(uri)
            .header("X-User-ID", user)
            .header("X-User-Role", role)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        self.send(request).await
    }

    /// Open a two-minute session as [`FACULTY`] from [`CLASSROOM_ORIGIN`].
    pub async fn open_session(&self) -> String {
        let (status, body) = self
            .post(
                "/sessions",
                FACULTY,
                "faculty",
                serde_json::json!({
                    "subject": "OS",
                    "origin_fingerprint": CLASSROOM_ORIGIN,
                    "duration_minutes": 2
                }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "create failed: {body}");
        body["session_id"]
            .as_str()
            .expect("session_id in response")
            .to_string()
    }

    pub async fn redeem(&self, session_id: &str, student: &str, origin: &str) -> (StatusCode, Value) {
        self.post(
            "/attendance",
            student,
            "student",
            serde_json::json!({
                "session_id": session_id,
                "origin_fingerprint": origin,
                "challenge_type": "blink",
                "challenge_response": "ok"
            }),
        )
        .await
    }
}
