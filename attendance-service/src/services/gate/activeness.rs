use async_trait::async_trait;

use super::{ActivenessOutcome, ActivenessVerifier, Evidence};
use crate::services::error::AttendanceError;

/// Stand-in liveness check for deployments without a challenge service.
///
/// A non-empty challenge response is required; beyond that the check passes
/// with probability `accept_rate`. With the default rate of 1.0 it is
/// deterministic.
#[derive(Debug, Clone, Copy)]
pub struct AcceptRateActivenessVerifier {
    accept_rate: f64,
}

impl AcceptRateActivenessVerifier {
    pub fn new(accept_rate: f64) -> Self {
        let accept_rate = if accept_rate.is_nan() {
            0.0
        } else {
            accept_rate.clamp(0.0, 1.0)
        };
        Self { accept_rate }
    }

    pub fn accept_rate(&self) -> f64 {
        self.accept_rate
    }
}

impl Default for AcceptRateActivenessVerifier {
    fn default() -> Self {
        Self::new(1.0)
    }
}

#[async_trait]
impl ActivenessVerifier for AcceptRateActivenessVerifier {
    async fn check_activeness(
        &self,
        evidence: &Evidence,
    ) -> Result<ActivenessOutcome, AttendanceError> {
        let answered = evidence
            .challenge_response
            .as_deref()
            .is_some_and(|r| !r.trim().is_empty());
        if !answered {
            return Ok(ActivenessOutcome { pass: false });
        }

        let pass = self.accept_rate >= 1.0 || rand::random::<f64>() < self.accept_rate;
        Ok(ActivenessOutcome { pass })
    }
}
