use async_trait::async_trait;

use super::{Evidence, IdentityOutcome, IdentityVerifier};
use crate::models::Template;
use crate::services::error::AttendanceError;

pub const DEFAULT_MATCH_THRESHOLD: f64 = 0.85;

/// Cosine similarity of two vectors. Vectors of different length, empty
/// vectors and zero vectors score 0.
pub fn cosine_similarity(a: &[f64], b: &[f64]) -> f64 {
    if a.is_empty() || a.len() != b.len() {
        return 0.0;
    }

    let (dot, norm_a, norm_b) = a
        .iter()
        .zip(b)
        .fold((0.0, 0.0, 0.0), |(dot, na, nb), (x, y)| {
            (dot + x * y, na + x * x, nb + y * y)
        });

    let denominator = norm_a.sqrt() * norm_b.sqrt();
    if denominator == 0.0 {
        0.0
    } else {
        dot / denominator
    }
}

/// Best cosine match of the submitted vector against every enrolled template.
#[derive(Debug, Clone, Copy)]
pub struct TemplateIdentityVerifier {
    threshold: f64,
}

impl TemplateIdentityVerifier {
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }
}

impl Default for TemplateIdentityVerifier {
    fn default() -> Self {
        Self::new(DEFAULT_MATCH_THRESHOLD)
    }
}

#[async_trait]
impl IdentityVerifier for TemplateIdentityVerifier {
    async fn check_identity(
        &self,
        evidence: &Evidence,
        enrolled: &[Template],
    ) -> Result<IdentityOutcome, AttendanceError> {
        let Some(probe) = evidence.face_vector.as_deref() else {
            return Ok(IdentityOutcome {
                pass: false,
                confidence: None,
            });
        };
        if enrolled.is_empty() {
            tracing::debug!("No enrolled templates to compare against");
            return Ok(IdentityOutcome {
                pass: false,
                confidence: None,
            });
        }

        let best = enrolled
            .iter()
            .map(|template| cosine_similarity(probe, template))
            .fold(0.0_f64, f64::max);

        Ok(IdentityOutcome {
            pass: best >= self.threshold,
            confidence: Some(best),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn similarity_of_parallel_and_orthogonal_vectors() {
        assert!((cosine_similarity(&[1.0, 2.0], &[2.0, 4.0]) - 1.0).abs() < 1e-12);
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]), 0.0);
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[1.0, 0.0, 0.0]), 0.0);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
    }

    #[tokio::test]
    async fn best_enrolled_template_decides() {
        let verifier = TemplateIdentityVerifier::default();
        let enrolled = vec![vec![0.0, 1.0], vec![1.0, 0.1]];
        let evidence = Evidence {
            face_vector: Some(vec![1.0, 0.0]),
            ..Evidence::default()
        };

        let outcome = verifier.check_identity(&evidence, &enrolled).await.unwrap();
        assert!(outcome.pass);
        let confidence = outcome.confidence.unwrap();
        assert!(confidence > 0.99 && confidence < 1.0);
    }

    #[tokio::test]
    async fn threshold_is_inclusive() {
        // cos(theta) == 0.85 exactly for (0.85, sqrt(1 - 0.85^2)) against (1, 0).
        let y = (1.0_f64 - 0.85 * 0.85).sqrt();
        let evidence = Evidence {
            face_vector: Some(vec![0.85, y]),
            ..Evidence::default()
        };
        let score = cosine_similarity(&[0.85, y], &[1.0, 0.0]);

        let at_score = TemplateIdentityVerifier::new(score);
        let outcome = at_score
            .check_identity(&evidence, &[vec![1.0, 0.0]])
            .await
            .unwrap();
        assert!(outcome.pass);

        let above_score = TemplateIdentityVerifier::new(score + 1e-9);
        let outcome = above_score
            .check_identity(&evidence, &[vec![1.0, 0.0]])
            .await
            .unwrap();
        assert!(!outcome.pass);
    }

    #[tokio::test]
    async fn default_threshold_splits_near_scores() {
        let verifier = TemplateIdentityVerifier::default();
        let enrolled = [vec![1.0, 0.0]];
        let at_cosine = |c: f64| Evidence {
            face_vector: Some(vec![c, (1.0 - c * c).sqrt()]),
            ..Evidence::default()
        };

        let above = verifier.check_identity(&at_cosine(0.86), &enrolled).await.unwrap();
        assert!(above.pass);

        let below = verifier.check_identity(&at_cosine(0.84), &enrolled).await.unwrap();
        assert!(!below.pass);
        assert!((below.confidence.unwrap() - 0.84).abs() < 1e-9);
    }

    #[tokio::test]
    async fn missing_probe_fails_without_confidence() {
        let verifier = TemplateIdentityVerifier::default();
        let outcome = verifier
            .check_identity(&Evidence::default(), &[vec![1.0]])
            .await
            .unwrap();
        assert_eq!(
            outcome,
            IdentityOutcome {
                pass: false,
                confidence: None
            }
        );
    }
}
