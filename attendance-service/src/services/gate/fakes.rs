//! Deterministic verifiers for tests and local development.

use async_trait::async_trait;

use super::{
    ActivenessOutcome, ActivenessVerifier, Evidence, IdentityOutcome, IdentityVerifier,
};
use crate::models::Template;
use crate::services::error::AttendanceError;

/// Passes every check with full confidence.
#[derive(Debug, Default, Clone, Copy)]
pub struct AlwaysPass;

#[async_trait]
impl ActivenessVerifier for AlwaysPass {
    async fn check_activeness(&self, _: &Evidence) -> Result<ActivenessOutcome, AttendanceError> {
        Ok(ActivenessOutcome { pass: true })
    }
}

#[async_trait]
impl IdentityVerifier for AlwaysPass {
    async fn check_identity(
        &self,
        _: &Evidence,
        _: &[Template],
    ) -> Result<IdentityOutcome, AttendanceError> {
        Ok(IdentityOutcome {
            pass: true,
            confidence: Some(1.0),
        })
    }
}

/// Fails every check.
#[derive(Debug, Default, Clone, Copy)]
pub struct AlwaysFail;

#[async_trait]
impl ActivenessVerifier for AlwaysFail {
    async fn check_activeness(&self, _: &Evidence) -> Result<ActivenessOutcome, AttendanceError> {
        Ok(ActivenessOutcome { pass: false })
    }
}

#[async_trait]
impl IdentityVerifier for AlwaysFail {
    async fn check_identity(
        &self,
        _: &Evidence,
        _: &[Template],
    ) -> Result<IdentityOutcome, AttendanceError> {
        Ok(IdentityOutcome {
            pass: false,
            confidence: Some(0.0),
        })
    }
}

/// Reports a fixed confidence and passes iff it reaches `threshold`.
#[derive(Debug, Clone, Copy)]
pub struct FixedConfidence {
    pub confidence: f64,
    pub threshold: f64,
}

impl FixedConfidence {
    pub fn new(confidence: f64, threshold: f64) -> Self {
        Self {
            confidence,
            threshold,
        }
    }
}

#[async_trait]
impl IdentityVerifier for FixedConfidence {
    async fn check_identity(
        &self,
        _: &Evidence,
        _: &[Template],
    ) -> Result<IdentityOutcome, AttendanceError> {
        Ok(IdentityOutcome {
            pass: self.confidence >= self.threshold,
            confidence: Some(self.confidence),
        })
    }
}
