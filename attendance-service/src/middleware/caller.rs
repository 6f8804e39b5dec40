//! Caller identity extracted from request headers.
//!
//! The gateway in front of this service authenticates the user and forwards
//! the id and role as `X-User-ID` and `X-User-Role`. Those headers are
//! trusted as-is, so this service must not be exposed without that gateway.

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use serde::{Deserialize, Serialize};
use service_core::error::AppError;
use std::str::FromStr;

use crate::services::error::AttendanceError;

pub const USER_ID_HEADER: &str = "x-user-id";
pub const USER_ROLE_HEADER: &str = "x-user-role";

const MAX_USER_ID_LEN: usize = 128;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Presenter: opens and closes sessions.
    Faculty,
    /// Participant: redeems sessions and enrolls templates.
    Student,
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "faculty" => Ok(Role::Faculty),
            "student" => Ok(Role::Student),
            _ => Err(format!("Invalid role: {}", s)),
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Faculty => write!(f, "faculty"),
            Role::Student => write!(f, "student"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Caller {
    pub user_id: String,
    pub role: Role,
}

impl Caller {
    pub fn require(&self, role: Role) -> Result<&Self, AttendanceError> {
        if self.role == role {
            Ok(self)
        } else {
            Err(AttendanceError::RoleRequired(role))
        }
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for Caller
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user_id = parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty() && v.len() <= MAX_USER_ID_LEN)
            .ok_or_else(|| AppError::Unauthorized(anyhow::anyhow!("Missing X-User-ID header")))?;

        let role = parts
            .headers
            .get(USER_ROLE_HEADER)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| AppError::Unauthorized(anyhow::anyhow!("Missing X-User-Role header")))?
            .parse::<Role>()
            .map_err(|e| AppError::Unauthorized(anyhow::anyhow!(e)))?;

        tracing::Span::current().record("user_id", user_id);

        Ok(Caller {
            user_id: user_id.to_string(),
            role,
        })
    }
}
