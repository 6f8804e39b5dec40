//! Attendance session model.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Active,
    Completed,
    Expired,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Completed => "completed",
            Self::Expired => "expired",
        }
    }

    /// No transition leaves a terminal status.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Active)
    }
}

impl std::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A time-boxed, origin-bound permission to redeem attendance for one subject.
///
/// The stored `status` can lag behind the clock: a session past `expires_at`
/// is expired whatever the document says, and the lifecycle manager writes
/// the correction back the next time the session is read.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    #[serde(rename = "_id")]
    pub id: String,
    /// Presenter who opened the session.
    pub owner: String,
    pub subject: String,
    /// Presenter's network origin at creation time.
    pub origin_fingerprint: String,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub expires_at: DateTime<Utc>,
    pub status: SessionStatus,
}

impl Session {
    /// Open a new active session. `duration_minutes` must be positive so that
    /// `expires_at > created_at`.
    pub fn new(
        owner: String,
        subject: String,
        origin_fingerprint: String,
        created_at: DateTime<Utc>,
        duration_minutes: u32,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            owner,
            subject,
            origin_fingerprint,
            created_at,
            expires_at: created_at + Duration::minutes(i64::from(duration_minutes)),
            status: SessionStatus::Active,
        }
    }

    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }

    /// Seconds until `expires_at`, clamped at zero.
    pub fn seconds_remaining(&self, now: DateTime<Utc>) -> i64 {
        (self.expires_at - now).num_seconds().max(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session_at(now: DateTime<Utc>, minutes: u32) -> Session {
        Session::new(
            "faculty_1".to_string(),
            "Operating Systems".to_string(),
            "10.0.0.5".to_string(),
            now,
            minutes,
        )
    }

    #[test]
    fn new_session_is_active_and_expires_after_duration() {
        let now = Utc::now();
        let session = session_at(now, 2);

        assert_eq!(session.status, SessionStatus::Active);
        assert_eq!(session.expires_at - session.created_at, Duration::seconds(120));
        assert!(session.expires_at > session.created_at);
    }

    #[test]
    fn overdue_only_strictly_after_deadline() {
        let now = Utc::now();
        let session = session_at(now, 2);

        assert!(!session.is_overdue(now + Duration::seconds(120)));
        assert!(session.is_overdue(now + Duration::seconds(121)));
        assert_eq!(session.seconds_remaining(now + Duration::seconds(150)), 0);
        assert_eq!(session.seconds_remaining(now + Duration::seconds(30)), 90);
    }

    #[test]
    fn status_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&SessionStatus::Expired).expect("serialize"),
            "\"expired\""
        );
        assert!(SessionStatus::Completed.is_terminal());
        assert!(!SessionStatus::Active.is_terminal());
    }
}
