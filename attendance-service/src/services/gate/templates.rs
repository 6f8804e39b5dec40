use std::sync::Arc;

use crate::models::Template;
use crate::services::error::AttendanceError;
use crate::services::metrics;
use crate::services::store::TemplateStore;

pub const DEFAULT_MAX_TEMPLATES: usize = 10;
pub const MAX_TEMPLATE_DIMENSIONS: usize = 4096;

/// Reject templates that could never produce a meaningful similarity score.
pub fn validate_template(template: &[f64]) -> Result<(), AttendanceError> {
    if template.is_empty() {
        return Err(AttendanceError::InvalidTemplate(
            "template must not be empty".to_string(),
        ));
    }
    if template.len() > MAX_TEMPLATE_DIMENSIONS {
        return Err(AttendanceError::InvalidTemplate(format!(
            "template has {} components, at most {} allowed",
            template.len(),
            MAX_TEMPLATE_DIMENSIONS
        )));
    }
    if template.iter().any(|v| !v.is_finite()) {
        return Err(AttendanceError::InvalidTemplate(
            "template components must be finite numbers".to_string(),
        ));
    }
    if template.iter().all(|v| *v == 0.0) {
        return Err(AttendanceError::InvalidTemplate(
            "template must not be the zero vector".to_string(),
        ));
    }
    Ok(())
}

/// Bounded most-recent-first template cache per participant.
#[derive(Clone)]
pub struct TemplateRegistry {
    store: Arc<dyn TemplateStore>,
    max_templates: usize,
}

impl TemplateRegistry {
    pub fn new(store: Arc<dyn TemplateStore>, max_templates: usize) -> Self {
        Self {
            store,
            max_templates: max_templates.max(1),
        }
    }

    /// Store `template` at the head, evicting the oldest past the bound.
    /// Returns how many templates the participant now has.
    pub async fn enroll(&self, participant: &str, template: Template) -> Result<usize, AttendanceError> {
        validate_template(&template)?;
        let count = self
            .store
            .push_front_bounded(participant, template, self.max_templates)
            .await?;
        metrics::record_template_enrolled();
        tracing::info!(participant = %participant, template_count = count, "Identity template enrolled");
        Ok(count)
    }

    pub async fn templates(&self, participant: &str) -> Result<Vec<Template>, AttendanceError> {
        self.store.templates(participant).await
    }

    pub fn max_templates(&self) -> usize {
        self.max_templates
    }
}
