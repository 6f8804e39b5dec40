//! Metrics collection and Prometheus export.
//!
//! Installs the Prometheus recorder and names the domain counters so call
//! sites do not repeat metric names and label keys.

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};
use std::sync::OnceLock;

pub const SESSIONS_CREATED: &str = "attendance_sessions_created_total";
pub const SESSIONS_EXPIRED: &str = "attendance_sessions_expired_total";
pub const REDEMPTIONS: &str = "attendance_redemptions_total";
pub const TEMPLATES_ENROLLED: &str = "attendance_templates_enrolled_total";

/// Global handle to the Prometheus recorder.
pub static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Install the process-wide recorder. Later calls are no-ops.
pub fn init_metrics() -> Result<(), BuildError> {
    if METRICS_HANDLE.get().is_some() {
        return Ok(());
    }

    let handle = PrometheusBuilder::new().install_recorder()?;
    if METRICS_HANDLE.set(handle).is_err() {
        tracing::debug!("Metrics recorder already initialized");
    }
    Ok(())
}

/// Current metrics in Prometheus text format.
pub fn get_metrics() -> String {
    METRICS_HANDLE
        .get()
        .map(|handle| handle.render())
        .unwrap_or_else(|| "# Metrics recorder not initialized".to_string())
}

pub fn record_session_created() {
    ::metrics::counter!(SESSIONS_CREATED).increment(1);
}

/// `trigger` is `read` for lazy expiry, `sweep` for the background sweeper.
pub fn record_session_expired(trigger: &'static str) {
    ::metrics::counter!(SESSIONS_EXPIRED, "trigger" => trigger).increment(1);
}

pub fn record_sessions_swept(count: u64) {
    ::metrics::counter!(SESSIONS_EXPIRED, "trigger" => "sweep").increment(count);
}

pub fn record_redemption(outcome: &'static str) {
    ::metrics::counter!(REDEMPTIONS, "outcome" => outcome).increment(1);
}

pub fn record_template_enrolled() {
    ::metrics::counter!(TEMPLATES_ENROLLED).increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_without_recorder_are_noops() {
        record_session_created();
        record_session_expired("read");
        record_sessions_swept(3);
        record_redemption("verified");
        record_template_enrolled();
    }
}
