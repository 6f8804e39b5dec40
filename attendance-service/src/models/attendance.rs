//! Attendance ledger record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Session;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AttendanceStatus {
    /// Reserved for a lower-assurance marking path; redemption never produces it.
    Present,
    /// Passed the identity gate.
    Verified,
}

/// Immutable proof that `participant` redeemed `session_id`.
///
/// At most one record exists per `(participant, session_id)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttendanceRecord {
    #[serde(rename = "_id")]
    pub id: String,
    pub participant: String,
    pub session_id: String,
    /// Snapshot of the session subject at redemption time.
    pub subject: String,
    /// Participant's observed origin at redemption time.
    pub origin_fingerprint: String,
    pub status: AttendanceStatus,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub verified_at: DateTime<Utc>,
}

impl AttendanceRecord {
    pub fn verified(
        participant: String,
        session: &Session,
        origin_fingerprint: String,
        verified_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            participant,
            session_id: session.id.clone(),
            subject: session.subject.clone(),
            origin_fingerprint,
            status: AttendanceStatus::Verified,
            verified_at,
        }
    }
}
