use std::sync::OnceLock;

use metrics::{counter, gauge};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

use crate::join::JoinViolation;

static HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Install the Prometheus exporter and register all application metrics.
/// Safe to call more than once; the recorder is installed on the first call
/// and later calls return the same handle.
pub fn init_metrics() -> PrometheusHandle {
    HANDLE
        .get_or_init(|| {
            let handle = PrometheusBuilder::new()
                .install_recorder()
                .expect("failed to install Prometheus recorder");

            // Pre-register counters so they appear even before the first increment.
            counter!("join_matched_total").absolute(0);
            counter!("join_queued_total").absolute(0);
            counter!("join_failed_total").absolute(0);
            for reason in JoinViolation::CODES {
                counter!("join_rejected_total", "reason" => reason).absolute(0);
            }
            counter!("query_failures_total").absolute(0);

            gauge!("open_join_sessions").set(0.0);

            handle
        })
        .clone()
}
