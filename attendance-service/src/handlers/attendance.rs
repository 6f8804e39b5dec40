use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use validator::Validate;

use crate::dtos::{AttendanceListResponse, AttendanceResponse, MarkAttendanceRequest};
use crate::middleware::{Caller, ForwardedOrigin, Role};
use crate::services::error::AttendanceError;
use crate::services::redemption::RedemptionRequest;
use crate::startup::AppState;

#[tracing::instrument(skip(state, origin, request), fields(participant = %caller.user_id))]
pub async fn mark_attendance(
    State(state): State<AppState>,
    caller: Caller,
    origin: ForwardedOrigin,
    Json(request): Json<MarkAttendanceRequest>,
) -> Result<impl IntoResponse, AttendanceError> {
    caller.require(Role::Student)?;
    request.validate()?;

    let evidence = request.evidence();
    // Blank values fall through so the engine reports fields in its own order.
    let record = state
        .redemption
        .redeem(RedemptionRequest {
            session_id: request.session_id.unwrap_or_default(),
            participant: caller.user_id,
            origin_fingerprint: origin.resolve(request.origin_fingerprint).unwrap_or_default(),
            evidence,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(AttendanceResponse::from(record))))
}

#[tracing::instrument(skip(state), fields(participant = %caller.user_id))]
pub async fn my_attendance(
    State(state): State<AppState>,
    caller: Caller,
) -> Result<impl IntoResponse, AttendanceError> {
    caller.require(Role::Student)?;

    let records = state.redemption.list_for_participant(&caller.user_id).await?;
    Ok(Json(AttendanceListResponse::from(records)))
}
