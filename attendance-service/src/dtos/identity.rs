use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::Template;
use crate::services::gate::{Evidence, GateStage};

#[derive(Debug, Default, Deserialize, Validate)]
pub struct EnrollTemplateRequest {
    #[validate(length(max = 4096))]
    pub face_vector: Option<Template>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct EnrollTemplateResponse {
    pub participant: String,
    pub template_count: usize,
    pub max_templates: usize,
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct VerifyIdentityRequest {
    #[validate(length(max = 4096))]
    pub face_vector: Option<Template>,
}

impl VerifyIdentityRequest {
    pub fn evidence(&self) -> Evidence {
        Evidence {
            face_vector: self.face_vector.clone(),
            ..Evidence::default()
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct VerifyIdentityResponse {
    pub verified: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    pub stage: GateStage,
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct ActivityValidateRequest {
    #[validate(length(max = 64))]
    pub challenge_type: Option<String>,

    #[validate(length(max = 1024))]
    pub challenge_response: Option<String>,
}

impl ActivityValidateRequest {
    pub fn evidence(&self) -> Evidence {
        Evidence {
            challenge_type: self.challenge_type.clone(),
            challenge_response: self.challenge_response.clone(),
            face_vector: None,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ActivityValidateResponse {
    pub valid: bool,
    pub stage: GateStage,
}
