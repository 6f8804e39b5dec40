mod common;

use attendance_service::services::SessionStore;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use common::{TestApp, CLASSROOM_ORIGIN, FACULTY};
use serde_json::json;

#[tokio::test]
async fn faculty_creates_session_with_default_duration() {
    let app = TestApp::spawn();

    let (status, body) = app
        .post(
            "/sessions",
            FACULTY,
            "faculty",
            json!({ "subject": "OS", "origin_fingerprint": CLASSROOM_ORIGIN }),
        )
        .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["status"], "active");
    assert_eq!(body["owner"], FACULTY);
    assert_eq!(body["subject"], "OS");
    assert_eq!(body["seconds_remaining"], 120);
}

#[tokio::test]
async fn origin_falls_back_to_forwarded_for() {
    let app = TestApp::spawn();

    let request = Request::builder()
        .method("POST")
        .uri("/sessions")
        .header("X-User-ID", FACULTY)
        .header("X-User-Role", "faculty")
        .header("X-Forwarded-For", "10.0.0.5, 172.16.0.1")
        .header("content-type", "application/json")
        .body(Body::from(json!({ "subject": "OS" }).to_string()))
        .unwrap();
    let (status, body) = app.send(request).await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["origin_fingerprint"], "10.0.0.5");
}

#[tokio::test]
async fn create_rejects_missing_fields_and_wrong_role() {
    let app = TestApp::spawn();

    let (status, body) = app
        .post("/sessions", FACULTY, "faculty", json!({ "subject": "OS" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "MISSING_FIELD");

    let (status, _) = app
        .post(
            "/sessions",
            FACULTY,
            "faculty",
            json!({ "origin_fingerprint": CLASSROOM_ORIGIN }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = app
        .post(
            "/sessions",
            "S1",
            "student",
            json!({ "subject": "OS", "origin_fingerprint": CLASSROOM_ORIGIN }),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "ROLE_REQUIRED");

    let (status, body) = app
        .post(
            "/sessions",
            FACULTY,
            "faculty",
            json!({ "subject": "OS", "origin_fingerprint": CLASSROOM_ORIGIN, "duration_minutes": 0 }),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["code"], "INVALID_FIELD");
}

#[tokio::test]
async fn requests_without_identity_headers_are_unauthorized() {
    let app = TestApp::spawn();
    let request = Request::builder()
        .uri("/sessions/anything")
        .body(Body::empty())
        .unwrap();

    let (status, _) = app.send(request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn overdue_session_reads_as_expired() {
    let app = TestApp::spawn();
    let session_id = app.open_session().await;
    let uri = format!("/sessions/{session_id}");

    app.advance(60);
    let (status, body) = app.get(&uri, "S1", "student").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "active");
    assert_eq!(body["seconds_remaining"], 60);

    app.advance(90);
    let (status, body) = app.get(&uri, "S1", "student").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "expired");
    assert_eq!(body["seconds_remaining"], 0);

    // The correction was persisted.
    let stored = app
        .state
        .session_store
        .get(&session_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.status.as_str(), "expired");
}

#[tokio::test]
async fn unknown_session_is_not_found() {
    let app = TestApp::spawn();
    let (status, body) = app.get("/sessions/missing", "S1", "student").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "SESSION_NOT_FOUND");
}

#[tokio::test]
async fn owner_completes_session_once() {
    let app = TestApp::spawn();
    let session_id = app.open_session().await;
    let uri = format!("/sessions/{session_id}/complete");

    let (status, body) = app.post(&uri, "faculty_2", "faculty", json!({})).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "NOT_SESSION_OWNER");

    let (status, body) = app.post(&uri, FACULTY, "faculty", json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "completed");

    let (status, body) = app.post(&uri, FACULTY, "faculty", json!({})).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "SESSION_CLOSED");
}

#[tokio::test]
async fn owner_cap_limits_live_sessions() {
    let app = TestApp::spawn();
    for _ in 0..5 {
        app.open_session().await;
    }

    let (status, body) = app
        .post(
            "/sessions",
            FACULTY,
            "faculty",
            json!({ "subject": "OS", "origin_fingerprint": CLASSROOM_ORIGIN }),
        )
        .await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(body["code"], "ACTIVE_SESSION_LIMIT");

    app.advance(180);
    app.open_session().await;
}

#[tokio::test]
async fn roster_is_visible_to_owner_only() {
    let app = TestApp::spawn();
    let session_id = app.open_session().await;
    app.redeem(&session_id, "S1", CLASSROOM_ORIGIN).await;
    app.advance(1);
    app.redeem(&session_id, "S2", CLASSROOM_ORIGIN).await;

    let uri = format!("/sessions/{session_id}/attendance");
    let (status, body) = app.get(&uri, FACULTY, "faculty").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 2);
    assert_eq!(body["records"][0]["participant"], "S2");
    assert_eq!(body["records"][1]["participant"], "S1");

    let (status, _) = app.get(&uri, "faculty_2", "faculty").await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app.get(&uri, "S1", "student").await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}
