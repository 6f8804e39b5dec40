//! Attendance redemption: turns a participant's request into at most one
//! verified ledger record per session.
//!
//! Checks run in a fixed order and the first failure decides the outcome:
//! session lookup, expiry, origin, duplicate, identity gate, then the insert.
//! The duplicate pre-check is an early exit only; the ledger's atomic
//! insert-if-absent is what guarantees a single record under concurrency.

use std::sync::Arc;

use crate::models::{AttendanceRecord, SessionStatus};
use crate::services::clock::Clock;
use crate::services::error::AttendanceError;
use crate::services::gate::{Evidence, GateDecision, IdentityGate};
use crate::services::lifecycle::SessionManager;
use crate::services::metrics;
use crate::services::store::{AttendanceLedger, InsertOutcome};

#[derive(Debug, Clone)]
pub struct RedemptionRequest {
    pub session_id: String,
    pub participant: String,
    pub origin_fingerprint: String,
    pub evidence: Evidence,
}

#[derive(Clone)]
pub struct RedemptionEngine {
    sessions: SessionManager,
    ledger: Arc<dyn AttendanceLedger>,
    gate: IdentityGate,
    clock: Arc<dyn Clock>,
}

impl RedemptionEngine {
    pub fn new(
        sessions: SessionManager,
        ledger: Arc<dyn AttendanceLedger>,
        gate: IdentityGate,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            sessions,
            ledger,
            gate,
            clock,
        }
    }

    pub async fn redeem(
        &self,
        request: RedemptionRequest,
    ) -> Result<AttendanceRecord, AttendanceError> {
        let result = self.try_redeem(request).await;
        metrics::record_redemption(match &result {
            Ok(_) => "verified",
            Err(e) => outcome_label(e),
        });
        result
    }

    async fn try_redeem(
        &self,
        request: RedemptionRequest,
    ) -> Result<AttendanceRecord, AttendanceError> {
        let session_id = required(&request.session_id, "session_id")?;
        let participant = required(&request.participant, "participant")?;
        let origin = required(&request.origin_fingerprint, "origin_fingerprint")?;

        // Lifecycle read applies lazy expiry, so an overdue session shows up
        // here as `expired`.
        let session = self.sessions.get_session_status(session_id).await?;
        if session.status != SessionStatus::Active {
            return Err(AttendanceError::SessionExpired {
                session_id: session.id,
            });
        }

        if session.origin_fingerprint != origin {
            tracing::info!(
                session_id = %session.id,
                required = %session.origin_fingerprint,
                observed = %origin,
                "Redemption from foreign origin rejected"
            );
            return Err(AttendanceError::OriginMismatch {
                required: session.origin_fingerprint,
                observed: origin.to_string(),
            });
        }

        if self.ledger.find(participant, session_id).await?.is_some() {
            return Err(duplicate(session_id, participant));
        }

        let confidence = match self.gate.verify(participant, &request.evidence).await? {
            GateDecision::Passed { confidence } => confidence,
            GateDecision::Rejected { stage, confidence } => {
                tracing::info!(
                    session_id = %session_id,
                    participant = %participant,
                    stage = %stage,
                    "Identity gate rejected redemption"
                );
                return Err(AttendanceError::IdentityCheckFailed { stage, confidence });
            }
        };

        let record = AttendanceRecord::verified(
            participant.to_string(),
            &session,
            origin.to_string(),
            self.clock.now(),
        );

        match self.ledger.insert_if_absent(&record).await? {
            InsertOutcome::Inserted => {
                tracing::info!(
                    session_id = %session_id,
                    participant = %participant,
                    confidence = ?confidence,
                    "Attendance verified"
                );
                Ok(record)
            }
            InsertOutcome::Duplicate => Err(duplicate(session_id, participant)),
        }
    }

    /// The participant's own attendance history, newest first.
    pub async fn list_for_participant(
        &self,
        participant: &str,
    ) -> Result<Vec<AttendanceRecord>, AttendanceError> {
        let participant = required(participant, "participant")?;
        self.ledger.list_for_participant(participant).await
    }

    /// Roster of a session, newest first. Only the session owner may read it.
    pub async fn list_for_session(
        &self,
        session_id: &str,
        owner: &str,
    ) -> Result<Vec<AttendanceRecord>, AttendanceError> {
        let session = self.sessions.get_session_status(session_id).await?;
        if session.owner != owner {
            return Err(AttendanceError::NotSessionOwner);
        }
        self.ledger.list_for_session(&session.id).await
    }
}

fn required<'a>(value: &'a str, field: &'static str) -> Result<&'a str, AttendanceError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(AttendanceError::MissingField(field))
    } else {
        Ok(trimmed)
    }
}

fn duplicate(session_id: &str, participant: &str) -> AttendanceError {
    AttendanceError::DuplicateRedemption {
        session_id: session_id.to_string(),
        participant: participant.to_string(),
    }
}

fn outcome_label(error: &AttendanceError) -> &'static str {
    match error {
        AttendanceError::MissingField(_) => "missing_field",
        AttendanceError::SessionNotFound(_) => "not_found",
        AttendanceError::SessionExpired { .. } => "expired",
        AttendanceError::OriginMismatch { .. } => "origin_mismatch",
        AttendanceError::DuplicateRedemption { .. } => "duplicate",
        AttendanceError::IdentityCheckFailed { .. } => "identity_failed",
        _ => "error",
    }
}
