use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use validator::Validate;

use crate::dtos::{AttendanceListResponse, CreateSessionRequest, SessionResponse};
use crate::middleware::{Caller, ForwardedOrigin, Role};
use crate::services::error::AttendanceError;
use crate::services::lifecycle::NewSession;
use crate::startup::AppState;

#[tracing::instrument(skip(state, origin, request), fields(owner = %caller.user_id))]
pub async fn create_session(
    State(state): State<AppState>,
    caller: Caller,
    origin: ForwardedOrigin,
    Json(request): Json<CreateSessionRequest>,
) -> Result<impl IntoResponse, AttendanceError> {
    caller.require(Role::Faculty)?;
    request.validate()?;

    let origin_fingerprint = origin
        .resolve(request.origin_fingerprint)
        .ok_or(AttendanceError::MissingField("origin_fingerprint"))?;

    let session = state
        .sessions
        .create_session(NewSession {
            owner: caller.user_id,
            subject: request.subject.unwrap_or_default(),
            origin_fingerprint,
            duration_minutes: request.duration_minutes,
        })
        .await?;

    tracing::info!(
        session_id = %session.id,
        subject = %session.subject,
        expires_at = %session.expires_at,
        "Session created"
    );

    Ok((
        StatusCode::CREATED,
        Json(SessionResponse::from_session(session, state.clock.now())),
    ))
}

#[tracing::instrument(skip(state, _caller))]
pub async fn get_session(
    State(state): State<AppState>,
    _caller: Caller,
    Path(session_id): Path<String>,
) -> Result<impl IntoResponse, AttendanceError> {
    let session = state.sessions.get_session_status(&session_id).await?;
    Ok(Json(SessionResponse::from_session(session, state.clock.now())))
}

#[tracing::instrument(skip(state), fields(owner = %caller.user_id))]
pub async fn complete_session(
    State(state): State<AppState>,
    caller: Caller,
    Path(session_id): Path<String>,
) -> Result<impl IntoResponse, AttendanceError> {
    caller.require(Role::Faculty)?;

    let session = state
        .sessions
        .complete_session(&session_id, &caller.user_id)
        .await?;
    tracing::info!(session_id = %session.id, "Session completed");

    Ok(Json(SessionResponse::from_session(session, state.clock.now())))
}

#[tracing::instrument(skip(state), fields(owner = %caller.user_id))]
pub async fn list_session_attendance(
    State(state): State<AppState>,
    caller: Caller,
    Path(session_id): Path<String>,
) -> Result<impl IntoResponse, AttendanceError> {
    caller.require(Role::Faculty)?;

    let records = state
        .redemption
        .list_for_session(&session_id, &caller.user_id)
        .await?;
    Ok(Json(AttendanceListResponse::from(records)))
}
