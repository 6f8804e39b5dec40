//! Session lifecycle: creation, lazily-applied expiry and explicit completion.
//!
//! `active -> expired` happens when an overdue session is observed (or swept);
//! `active -> completed` only on the owner's request. Both are terminal.

use std::sync::Arc;

use crate::models::{Session, SessionStatus};
use crate::services::clock::Clock;
use crate::services::error::AttendanceError;
use crate::services::metrics;
use crate::services::store::SessionStore;

pub const DEFAULT_SESSION_MINUTES: u32 = 2;
pub const MAX_SESSION_MINUTES: u32 = 120;
pub const MAX_ACTIVE_SESSIONS_PER_OWNER: u32 = 5;

#[derive(Debug, Clone)]
pub struct SessionPolicy {
    pub default_duration_minutes: u32,
    pub max_duration_minutes: u32,
    /// `None` disables the per-owner cap.
    pub max_active_per_owner: Option<u32>,
}

impl Default for SessionPolicy {
    fn default() -> Self {
        Self {
            default_duration_minutes: DEFAULT_SESSION_MINUTES,
            max_duration_minutes: MAX_SESSION_MINUTES,
            max_active_per_owner: Some(MAX_ACTIVE_SESSIONS_PER_OWNER),
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewSession {
    pub owner: String,
    pub subject: String,
    pub origin_fingerprint: String,
    pub duration_minutes: Option<u32>,
}

#[derive(Clone)]
pub struct SessionManager {
    store: Arc<dyn SessionStore>,
    clock: Arc<dyn Clock>,
    policy: SessionPolicy,
}

impl SessionManager {
    pub fn new(store: Arc<dyn SessionStore>, clock: Arc<dyn Clock>, policy: SessionPolicy) -> Self {
        Self {
            store,
            clock,
            policy,
        }
    }

    pub fn policy(&self) -> &SessionPolicy {
        &self.policy
    }

    pub async fn create_session(&self, request: NewSession) -> Result<Session, AttendanceError> {
        let owner = non_empty(&request.owner, "owner")?;
        let subject = non_empty(&request.subject, "subject")?;
        let origin = non_empty(&request.origin_fingerprint, "origin_fingerprint")?;
        let duration = self.resolve_duration(request.duration_minutes)?;

        let now = self.clock.now();

        // Soft cap: two concurrent creations may both pass the count.
        if let Some(limit) = self.policy.max_active_per_owner {
            let live = self.store.count_live_for_owner(owner, now).await?;
            if live >= u64::from(limit) {
                return Err(AttendanceError::ActiveSessionLimit { limit });
            }
        }

        let session = Session::new(
            owner.to_string(),
            subject.to_string(),
            origin.to_string(),
            now,
            duration,
        );
        self.store.insert(&session).await?;
        metrics::record_session_created();

        Ok(session)
    }

    /// Fetch a session, expiring it first if its deadline has passed.
    ///
    /// This read writes: an overdue session still stored as `active` is
    /// transitioned to `expired` before it is returned, so every later reader
    /// sees the corrected status.
    pub async fn get_session_status(&self, session_id: &str) -> Result<Session, AttendanceError> {
        let mut session = self
            .store
            .get(session_id)
            .await?
            .ok_or_else(|| AttendanceError::SessionNotFound(session_id.to_string()))?;

        if session.status == SessionStatus::Active && session.is_overdue(self.clock.now()) {
            let transitioned = self.store.mark_expired(session_id).await?;
            session.status = if transitioned {
                metrics::record_session_expired("read");
                tracing::debug!(session_id = %session_id, "Session expired on read");
                SessionStatus::Expired
            } else {
                // Another writer got there first; report what it stored.
                self.store
                    .get(session_id)
                    .await?
                    .map(|s| s.status)
                    .filter(SessionStatus::is_terminal)
                    .unwrap_or(SessionStatus::Expired)
            };
        }

        Ok(session)
    }

    /// Owner-initiated `active -> completed`.
    pub async fn complete_session(
        &self,
        session_id: &str,
        owner: &str,
    ) -> Result<Session, AttendanceError> {
        let mut session = self.get_session_status(session_id).await?;
        if session.owner != owner {
            return Err(AttendanceError::NotSessionOwner);
        }

        match session.status {
            SessionStatus::Expired => Err(AttendanceError::SessionExpired {
                session_id: session.id,
            }),
            SessionStatus::Completed => Err(AttendanceError::SessionClosed {
                session_id: session.id,
            }),
            SessionStatus::Active => {
                if self.store.mark_completed(session_id).await? {
                    session.status = SessionStatus::Completed;
                    Ok(session)
                } else {
                    // Lost a race with expiry or a second completion.
                    let current = self.get_session_status(session_id).await?;
                    match current.status {
                        SessionStatus::Completed => Err(AttendanceError::SessionClosed {
                            session_id: current.id,
                        }),
                        _ => Err(AttendanceError::SessionExpired {
                            session_id: current.id,
                        }),
                    }
                }
            }
        }
    }

    /// Expire every overdue active session. Lazy expiry makes this optional.
    pub async fn sweep_expired(&self) -> Result<u64, AttendanceError> {
        let expired = self.store.expire_overdue(self.clock.now()).await?;
        if expired > 0 {
            metrics::record_sessions_swept(expired);
        }
        Ok(expired)
    }

    fn resolve_duration(&self, requested: Option<u32>) -> Result<u32, AttendanceError> {
        let minutes = requested.unwrap_or(self.policy.default_duration_minutes);
        if minutes == 0 {
            return Err(AttendanceError::InvalidField {
                field: "duration_minutes",
                reason: "must be at least 1".to_string(),
            });
        }
        if minutes > self.policy.max_duration_minutes {
            return Err(AttendanceError::InvalidField {
                field: "duration_minutes",
                reason: format!("must not exceed {}", self.policy.max_duration_minutes),
            });
        }
        Ok(minutes)
    }
}

fn non_empty<'a>(value: &'a str, field: &'static str) -> Result<&'a str, AttendanceError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(AttendanceError::MissingField(field))
    } else {
        Ok(trimmed)
    }
}
