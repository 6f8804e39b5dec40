use axum::{extract::State, response::IntoResponse, Json};
use validator::Validate;

use crate::dtos::{
    ActivityValidateRequest, ActivityValidateResponse, EnrollTemplateRequest,
    EnrollTemplateResponse, VerifyIdentityRequest, VerifyIdentityResponse,
};
use crate::middleware::Caller;
use crate::services::error::AttendanceError;
use crate::services::gate::GateStage;
use crate::startup::AppState;

#[tracing::instrument(skip(state, request), fields(participant = %caller.user_id))]
pub async fn enroll_template(
    State(state): State<AppState>,
    caller: Caller,
    Json(request): Json<EnrollTemplateRequest>,
) -> Result<impl IntoResponse, AttendanceError> {
    request.validate()?;
    let template = request
        .face_vector
        .ok_or(AttendanceError::MissingField("face_vector"))?;

    let template_count = state.gate.enroll(&caller.user_id, template).await?;

    Ok(Json(EnrollTemplateResponse {
        participant: caller.user_id,
        template_count,
        max_templates: state.gate.max_templates(),
    }))
}

#[tracing::instrument(skip(state, request), fields(participant = %caller.user_id))]
pub async fn verify_identity(
    State(state): State<AppState>,
    caller: Caller,
    Json(request): Json<VerifyIdentityRequest>,
) -> Result<impl IntoResponse, AttendanceError> {
    request.validate()?;
    if request.face_vector.is_none() {
        return Err(AttendanceError::MissingField("face_vector"));
    }

    let outcome = state
        .gate
        .check_identity(&caller.user_id, &request.evidence())
        .await?;

    Ok(Json(VerifyIdentityResponse {
        verified: outcome.pass,
        confidence: outcome.confidence,
        stage: GateStage::Identity,
    }))
}

#[tracing::instrument(skip(state, request), fields(participant = %caller.user_id))]
pub async fn validate_activity(
    State(state): State<AppState>,
    caller: Caller,
    Json(request): Json<ActivityValidateRequest>,
) -> Result<impl IntoResponse, AttendanceError> {
    request.validate()?;

    let outcome = state.gate.check_activeness(&request.evidence()).await?;

    Ok(Json(ActivityValidateResponse {
        valid: outcome.pass,
        stage: GateStage::Activeness,
    }))
}
