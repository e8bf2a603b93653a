use std::sync::Arc;

use super::MetricsRegistry;
use crate::modules::auth::interface::AuthError;

/// Collector for auth operation outcomes
#[derive(Clone)]
pub struct AuthMetricsCollector {
    metrics: Arc<MetricsRegistry>,
}

impl AuthMetricsCollector {
    pub fn new(metrics: Arc<MetricsRegistry>) -> Self {
        Self { metrics }
    }

    pub fn record_success(&self, operation: &str) {
        self.metrics
            .auth_events_total
            .with_label_values(&[operation, "ok"])
            .inc();
    }

    pub fn record_failure(&self, operation: &str, error: &AuthError) {
        self.metrics
            .auth_events_total
            .with_label_values(&[operation, error.kind()])
            .inc();
    }

    pub fn record_swept(&self, kind: &str, count: u64) {
        self.metrics
            .tokens_swept_total
            .with_label_values(&[kind])
            .inc_by(count);
    }
}
