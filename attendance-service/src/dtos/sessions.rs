use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::{Session, SessionStatus};

#[derive(Debug, Default, Deserialize, Validate)]
pub struct CreateSessionRequest {
    #[validate(length(max = 200, message = "Subject must be at most 200 characters"))]
    pub subject: Option<String>,

    /// Ignored when the proxy supplies an `X-Forwarded-For` hop.
    #[validate(length(max = 256, message = "Origin fingerprint must be at most 256 characters"))]
    pub origin_fingerprint: Option<String>,

    pub duration_minutes: Option<u32>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SessionResponse {
    pub session_id: String,
    pub owner: String,
    pub subject: String,
    pub origin_fingerprint: String,
    pub status: SessionStatus,
    pub created_at: String,
    pub expires_at: String,
    pub seconds_remaining: i64,
}

impl SessionResponse {
    pub fn from_session(session: Session, now: DateTime<Utc>) -> Self {
        let seconds_remaining = match session.status {
            SessionStatus::Active => session.seconds_remaining(now),
            _ => 0,
        };
        Self {
            session_id: session.id,
            owner: session.owner,
            subject: session.subject,
            origin_fingerprint: session.origin_fingerprint,
            status: session.status,
            created_at: session.created_at.to_rfc3339(),
            expires_at: session.expires_at.to_rfc3339(),
            seconds_remaining,
        }
    }
}
