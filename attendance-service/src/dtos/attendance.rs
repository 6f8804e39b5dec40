use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::{AttendanceRecord, AttendanceStatus, Template};
use crate::services::gate::Evidence;

#[derive(Debug, Default, Deserialize, Validate)]
pub struct MarkAttendanceRequest {
    #[validate(length(max = 128, message = "Session id must be at most 128 characters"))]
    pub session_id: Option<String>,

    /// Ignored when the proxy supplies an `X-Forwarded-For` hop.
    #[validate(length(max = 256, message = "Origin fingerprint must be at most 256 characters"))]
    pub origin_fingerprint: Option<String>,

    #[validate(length(max = 64))]
    pub challenge_type: Option<String>,

    #[validate(length(max = 1024))]
    pub challenge_response: Option<String>,

    #[validate(length(max = 4096))]
    pub face_vector: Option<Template>,
}

impl MarkAttendanceRequest {
    pub fn evidence(&self) -> Evidence {
        Evidence {
            challenge_type: self.challenge_type.clone(),
            challenge_response: self.challenge_response.clone(),
            face_vector: self.face_vector.clone(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AttendanceResponse {
    pub id: String,
    pub participant: String,
    pub session_id: String,
    pub subject: String,
    pub origin_fingerprint: String,
    pub status: AttendanceStatus,
    pub verified_at: String,
}

impl From<AttendanceRecord> for AttendanceResponse {
    fn from(record: AttendanceRecord) -> Self {
        Self {
            id: record.id,
            participant: record.participant,
            session_id: record.session_id,
            subject: record.subject,
            origin_fingerprint: record.origin_fingerprint,
            status: record.status,
            verified_at: record.verified_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AttendanceListResponse {
    pub records: Vec<AttendanceResponse>,
    pub total: usize,
}

impl From<Vec<AttendanceRecord>> for AttendanceListResponse {
    fn from(records: Vec<AttendanceRecord>) -> Self {
        let records: Vec<AttendanceResponse> = records.into_iter().map(Into::into).collect();
        Self {
            total: records.len(),
            records,
        }
    }
}
