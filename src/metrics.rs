//! Metrics collection for the onboarding flow.
//!
//! Counter and histogram names are centralized here so the sequencer and
//! flow record them consistently. With no recorder installed the macros are
//! no-ops, which is the default for tests and the CLI.

use std::time::Duration;

/// Metric name constants and recording helpers.
#[derive(Debug, Clone, Copy, Default)]
pub struct MetricsCollector;

/// Backend operations issued, labeled by operation and status.
pub const BACKEND_OPERATIONS_TOTAL: &str = "parapluie_backend_operations_total";
/// Backend operation latency in seconds.
pub const BACKEND_OPERATION_DURATION: &str = "parapluie_backend_operation_duration_seconds";
/// Profile-insert retry attempts performed.
pub const PROFILE_INSERT_ATTEMPTS: &str = "parapluie_profile_insert_attempts";
/// Onboarding step transitions, labeled by step.
pub const STEP_TRANSITIONS_TOTAL: &str = "parapluie_step_transitions_total";
/// Onboarding runs completed, labeled by whether a contact was invited.
pub const ONBOARDING_COMPLETED_TOTAL: &str = "parapluie_onboarding_completed_total";
/// Errors, labeled by class.
pub const ERRORS_TOTAL: &str = "parapluie_errors_total";

impl MetricsCollector {
    /// Record a backend operation outcome.
    pub fn record_backend_operation(operation: &'static str, duration: Duration, success: bool) {
        let status = if success { "success" } else { "error" };
        metrics::counter!(BACKEND_OPERATIONS_TOTAL, "operation" => operation, "status" => status)
            .increment(1);
        metrics::histogram!(BACKEND_OPERATION_DURATION, "operation" => operation)
            .record(duration.as_secs_f64());
    }

    /// Record how many attempts one profile insert took.
    pub fn record_profile_attempts(attempts: u32) {
        metrics::histogram!(PROFILE_INSERT_ATTEMPTS).record(f64::from(attempts));
    }

    /// Record a step transition.
    pub fn record_step_transition(step: &'static str) {
        metrics::counter!(STEP_TRANSITIONS_TOTAL, "step" => step).increment(1);
    }

    /// Record a completed onboarding run.
    pub fn record_completion(has_trusted_contact: bool) {
        let invited = if has_trusted_contact { "yes" } else { "no" };
        metrics::counter!(ONBOARDING_COMPLETED_TOTAL, "trusted_contact" => invited).increment(1);
    }

    /// Record an error by taxonomy class.
    pub fn record_error(class: &'static str) {
        metrics::counter!(ERRORS_TOTAL, "class" => class).increment(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metric_names_are_prefixed() {
        assert!(BACKEND_OPERATIONS_TOTAL.starts_with("parapluie_"));
        assert!(STEP_TRANSITIONS_TOTAL.starts_with("parapluie_"));
        assert!(ERRORS_TOTAL.starts_with("parapluie_"));
    }

    #[test]
    fn test_recording_without_recorder_is_noop() {
        // No global recorder installed; calls must not panic
        MetricsCollector::record_backend_operation("insert_profile", Duration::from_millis(5), true);
        MetricsCollector::record_profile_attempts(3);
        MetricsCollector::record_step_transition("welcome");
        MetricsCollector::record_completion(true);
        MetricsCollector::record_error("validation");
    }
}
