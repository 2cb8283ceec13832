use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;
use tracing::{debug, info};

/// Workflow counters
#[derive(Debug, Default)]
pub struct WorkflowMetrics {
    pub transitions_applied: AtomicU64,
    pub transitions_denied: AtomicU64,
    pub invalid_requests: AtomicU64,
    pub persistence_failures: AtomicU64,
    pub unrecorded_audits: AtomicU64,
}

impl WorkflowMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_applied(&self) {
        self.transitions_applied.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_denied(&self) {
        self.transitions_denied.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_invalid(&self) {
        self.invalid_requests.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_persistence_failure(&self) {
        self.persistence_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_unrecorded_audit(&self) {
        self.unrecorded_audits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn get_stats(&self) -> WorkflowStats {
        WorkflowStats {
            transitions_applied: self.transitions_applied.load(Ordering::Relaxed),
            transitions_denied: self.transitions_denied.load(Ordering::Relaxed),
            invalid_requests: self.invalid_requests.load(Ordering::Relaxed),
            persistence_failures: self.persistence_failures.load(Ordering::Relaxed),
            unrecorded_audits: self.unrecorded_audits.load(Ordering::Relaxed),
        }
    }

    pub fn log_stats(&self) {
        let stats = self.get_stats();
        info!(
            applied = stats.transitions_applied,
            denied = stats.transitions_denied,
            invalid = stats.invalid_requests,
            persistence_failures = stats.persistence_failures,
            unrecorded_audits = stats.unrecorded_audits,
            "Workflow metrics"
        );
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkflowStats {
    pub transitions_applied: u64,
    pub transitions_denied: u64,
    pub invalid_requests: u64,
    pub persistence_failures: u64,
    pub unrecorded_audits: u64,
}

/// Global metrics instance
static WORKFLOW_METRICS: std::sync::LazyLock<WorkflowMetrics> =
    std::sync::LazyLock::new(WorkflowMetrics::new);

pub fn workflow_metrics() -> &'static WorkflowMetrics {
    &WORKFLOW_METRICS
}

/// Time an operation and log its duration when finished
pub struct OperationTimer {
    operation: String,
    start: Instant,
}

impl OperationTimer {
    pub fn new(operation: &str) -> Self {
        Self {
            operation: operation.to_string(),
            start: Instant::now(),
        }
    }

    pub fn finish(self) {
        let duration = self.start.elapsed();
        debug!(
            operation = %self.operation,
            duration_ms = duration.as_millis(),
            "Operation completed"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_accumulate() {
        let metrics = WorkflowMetrics::new();
        metrics.record_applied();
        metrics.record_applied();
        metrics.record_denied();
        metrics.record_unrecorded_audit();

        let stats = metrics.get_stats();
        assert_eq!(stats.transitions_applied, 2);
        assert_eq!(stats.transitions_denied, 1);
        assert_eq!(stats.invalid_requests, 0);
        assert_eq!(stats.unrecorded_audits, 1);
    }
}
