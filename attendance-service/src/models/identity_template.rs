use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Biometric reference vector.
pub type Template = Vec<f64>;

/// Enrolled templates for one participant, most recent first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityTemplates {
    #[serde(rename = "_id")]
    pub participant: String,
    #[serde(default)]
    pub templates: Vec<Template>,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
}
