//! Error taxonomy for session and attendance operations.
//!
//! Every kind calls for a different corrective action from the client, so each
//! one renders with its own status and a stable `code`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use service_core::error::AppError;
use thiserror::Error;

use crate::middleware::Role;
use crate::services::gate::GateStage;

#[derive(Debug, Error)]
pub enum AttendanceError {
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("Invalid value for {field}: {reason}")]
    InvalidField { field: &'static str, reason: String },

    #[error("Session not found: {0}")]
    SessionNotFound(String),

    #[error("Session has expired")]
    SessionExpired { session_id: String },

    #[error("Session is already completed")]
    SessionClosed { session_id: String },

    #[error("Network mismatch. Please connect to the session network.")]
    OriginMismatch { required: String, observed: String },

    #[error("Attendance already marked for this session")]
    DuplicateRedemption {
        session_id: String,
        participant: String,
    },

    #[error("{stage} check failed")]
    IdentityCheckFailed {
        stage: GateStage,
        confidence: Option<f64>,
    },

    #[error("Invalid identity template: {0}")]
    InvalidTemplate(String),

    #[error("Owner already holds {limit} active sessions")]
    ActiveSessionLimit { limit: u32 },

    #[error("Only the session owner may do this")]
    NotSessionOwner,

    #[error("This action requires the {0} role")]
    RoleRequired(Role),

    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("Database error: {0}")]
    Database(#[from] mongodb::error::Error),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AttendanceError {
    /// Stable machine-readable identifier for the error kind.
    pub fn code(&self) -> &'static str {
        match self {
            Self::MissingField(_) => "MISSING_FIELD",
            Self::InvalidField { .. } => "INVALID_FIELD",
            Self::SessionNotFound(_) => "SESSION_NOT_FOUND",
            Self::SessionExpired { .. } => "SESSION_EXPIRED",
            Self::SessionClosed { .. } => "SESSION_CLOSED",
            Self::OriginMismatch { .. } => "ORIGIN_MISMATCH",
            Self::DuplicateRedemption { .. } => "DUPLICATE_REDEMPTION",
            Self::IdentityCheckFailed { .. } => "IDENTITY_CHECK_FAILED",
            Self::InvalidTemplate(_) => "INVALID_TEMPLATE",
            Self::ActiveSessionLimit { .. } => "ACTIVE_SESSION_LIMIT",
            Self::NotSessionOwner => "NOT_SESSION_OWNER",
            Self::RoleRequired(_) => "ROLE_REQUIRED",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::Database(_) => "DATABASE_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::MissingField(_) | Self::InvalidTemplate(_) => StatusCode::BAD_REQUEST,
            Self::InvalidField { .. } | Self::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::SessionNotFound(_) => StatusCode::NOT_FOUND,
            Self::SessionExpired { .. } => StatusCode::GONE,
            Self::SessionClosed { .. } | Self::DuplicateRedemption { .. } => StatusCode::CONFLICT,
            Self::OriginMismatch { .. } | Self::NotSessionOwner | Self::RoleRequired(_) => {
                StatusCode::FORBIDDEN
            }
            Self::IdentityCheckFailed { .. } => StatusCode::UNAUTHORIZED,
            Self::ActiveSessionLimit { .. } => StatusCode::TOO_MANY_REQUESTS,
            Self::Database(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Debug, Serialize)]
struct AttendanceErrorBody {
    error: String,
    code: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    required_origin: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    observed_origin: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stage: Option<GateStage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    confidence: Option<f64>,
}

impl IntoResponse for AttendanceError {
    fn into_response(self) -> Response {
        let status = self.status();
        let code = self.code();

        let mut body = AttendanceErrorBody {
            error: self.to_string(),
            code,
            required_origin: None,
            observed_origin: None,
            stage: None,
            confidence: None,
        };

        match self {
            // Infrastructure failures share the generic rendering.
            Self::Validation(err) => return AppError::ValidationError(err).into_response(),
            Self::Database(err) => return AppError::from(err).into_response(),
            Self::Internal(err) => return AppError::InternalError(err).into_response(),
            Self::OriginMismatch { required, observed } => {
                body.required_origin = Some(required);
                body.observed_origin = Some(observed);
            }
            Self::IdentityCheckFailed { stage, confidence } => {
                body.stage = Some(stage);
                body.confidence = confidence;
            }
            _ => {}
        }

        (status, Json(body)).into_response()
    }
}

impl From<AppError> for AttendanceError {
    fn from(err: AppError) -> Self {
        match err {
            AppError::ValidationError(e) => Self::Validation(e),
            other => Self::Internal(anyhow::Error::new(other)),
        }
    }
}
