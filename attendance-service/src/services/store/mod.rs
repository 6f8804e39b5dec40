//! Persistence contracts for sessions, the attendance ledger and enrolled
//! identity templates.
//!
//! Status transitions are conditional writes (`status = active` guard), so
//! repeating one is a no-op rather than an error. Callers should expect
//! [`SessionStore::mark_expired`] to be issued from read paths: the lifecycle
//! manager corrects stale statuses when it observes an overdue session.

mod memory;
mod mongo;

pub use memory::{InMemoryAttendanceLedger, InMemorySessionStore, InMemoryTemplateStore};
pub use mongo::is_duplicate_key;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::models::{AttendanceRecord, Session, Template};
use crate::services::error::AttendanceError;

#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn insert(&self, session: &Session) -> Result<(), AttendanceError>;

    async fn get(&self, id: &str) -> Result<Option<Session>, AttendanceError>;

    /// `active -> expired`. Returns `true` only if this call made the change.
    async fn mark_expired(&self, id: &str) -> Result<bool, AttendanceError>;

    /// `active -> completed`. Returns `true` only if this call made the change.
    async fn mark_completed(&self, id: &str) -> Result<bool, AttendanceError>;

    /// Active sessions of `owner` whose deadline has not passed at `now`.
    async fn count_live_for_owner(
        &self,
        owner: &str,
        now: DateTime<Utc>,
    ) -> Result<u64, AttendanceError>;

    /// Bulk `active -> expired` for every session overdue at `now`.
    async fn expire_overdue(&self, now: DateTime<Utc>) -> Result<u64, AttendanceError>;

    async fn health_check(&self) -> Result<(), AttendanceError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted,
    /// A record for the same `(participant, session_id)` already exists.
    Duplicate,
}

/// Append-only attendance records, unique per `(participant, session_id)`.
#[async_trait]
pub trait AttendanceLedger: Send + Sync {
    /// Insert unless a record for the pair exists. The uniqueness check and the
    /// write are one atomic step.
    async fn insert_if_absent(
        &self,
        record: &AttendanceRecord,
    ) -> Result<InsertOutcome, AttendanceError>;

    async fn find(
        &self,
        participant: &str,
        session_id: &str,
    ) -> Result<Option<AttendanceRecord>, AttendanceError>;

    /// Newest first.
    async fn list_for_participant(
        &self,
        participant: &str,
    ) -> Result<Vec<AttendanceRecord>, AttendanceError>;

    /// Newest first.
    async fn list_for_session(
        &self,
        session_id: &str,
    ) -> Result<Vec<AttendanceRecord>, AttendanceError>;
}

#[async_trait]
pub trait TemplateStore: Send + Sync {
    /// Put `template` at the head of the participant's list and keep at most
    /// `bound` entries, dropping the oldest. Returns the stored count.
    async fn push_front_bounded(
        &self,
        participant: &str,
        template: Template,
        bound: usize,
    ) -> Result<usize, AttendanceError>;

    /// Most recent first; empty when nothing is enrolled.
    async fn templates(&self, participant: &str) -> Result<Vec<Template>, AttendanceError>;
}
