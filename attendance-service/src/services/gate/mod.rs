//! Identity/activeness gate consulted before an attendance record is written.
//!
//! The redemption engine only sees the [`GateDecision`]; how liveness and
//! identity are judged is up to the injected verifiers.

mod activeness;
pub mod fakes;
mod similarity;
mod templates;

pub use activeness::AcceptRateActivenessVerifier;
pub use similarity::{cosine_similarity, TemplateIdentityVerifier, DEFAULT_MATCH_THRESHOLD};
pub use templates::{
    validate_template, TemplateRegistry, DEFAULT_MAX_TEMPLATES, MAX_TEMPLATE_DIMENSIONS,
};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::models::Template;
use crate::services::error::AttendanceError;

/// Evidence submitted by a participant alongside a redemption.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Evidence {
    pub challenge_type: Option<String>,
    pub challenge_response: Option<String>,
    pub face_vector: Option<Template>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ActivenessOutcome {
    pub pass: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IdentityOutcome {
    pub pass: bool,
    pub confidence: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GateStage {
    Activeness,
    Identity,
}

impl std::fmt::Display for GateStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Activeness => write!(f, "Activeness"),
            Self::Identity => write!(f, "Identity"),
        }
    }
}

/// Liveness / anti-replay challenge check.
#[async_trait]
pub trait ActivenessVerifier: Send + Sync {
    async fn check_activeness(&self, evidence: &Evidence)
        -> Result<ActivenessOutcome, AttendanceError>;
}

/// Biometric match of the evidence against the participant's enrolled templates.
#[async_trait]
pub trait IdentityVerifier: Send + Sync {
    async fn check_identity(
        &self,
        evidence: &Evidence,
        enrolled: &[Template],
    ) -> Result<IdentityOutcome, AttendanceError>;
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GateDecision {
    Passed { confidence: Option<f64> },
    Rejected {
        stage: GateStage,
        confidence: Option<f64>,
    },
}

#[derive(Clone)]
pub struct IdentityGate {
    activeness: Arc<dyn ActivenessVerifier>,
    identity: Arc<dyn IdentityVerifier>,
    registry: TemplateRegistry,
}

impl IdentityGate {
    pub fn new(
        activeness: Arc<dyn ActivenessVerifier>,
        identity: Arc<dyn IdentityVerifier>,
        registry: TemplateRegistry,
    ) -> Self {
        Self {
            activeness,
            identity,
            registry,
        }
    }

    /// Activeness first, then identity; the first failing stage decides.
    pub async fn verify(
        &self,
        participant: &str,
        evidence: &Evidence,
    ) -> Result<GateDecision, AttendanceError> {
        if !self.check_activeness(evidence).await?.pass {
            return Ok(GateDecision::Rejected {
                stage: GateStage::Activeness,
                confidence: None,
            });
        }

        let identity = self.check_identity(participant, evidence).await?;
        if identity.pass {
            Ok(GateDecision::Passed {
                confidence: identity.confidence,
            })
        } else {
            Ok(GateDecision::Rejected {
                stage: GateStage::Identity,
                confidence: identity.confidence,
            })
        }
    }

    pub async fn check_activeness(
        &self,
        evidence: &Evidence,
    ) -> Result<ActivenessOutcome, AttendanceError> {
        self.activeness.check_activeness(evidence).await
    }

    pub async fn check_identity(
        &self,
        participant: &str,
        evidence: &Evidence,
    ) -> Result<IdentityOutcome, AttendanceError> {
        let enrolled = self.registry.templates(participant).await?;
        self.identity.check_identity(evidence, &enrolled).await
    }

    pub async fn enroll(&self, participant: &str, template: Template) -> Result<usize, AttendanceError> {
        self.registry.enroll(participant, template).await
    }

    pub fn max_templates(&self) -> usize {
        self.registry.max_templates()
    }
}
