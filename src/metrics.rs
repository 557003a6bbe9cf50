//! Request and emission metrics.
//!
//! Helpers record through the `metrics` facade; without an installed
//! recorder they are no-ops, so library callers never pay for an exporter
//! they did not ask for.

use std::sync::Once;

use tracing::{info, warn};

static INIT: Once = Once::new();

/// Install the Prometheus exporter when `AMP_METRICS_ADDR` is set.
/// Idempotent; the binary calls this once at startup.
pub fn init_metrics() {
    INIT.call_once(|| {
        let Ok(addr_str) = std::env::var("AMP_METRICS_ADDR") else {
            return;
        };
        match addr_str.parse::<std::net::SocketAddr>() {
            Ok(addr) => {
                match metrics_exporter_prometheus::PrometheusBuilder::new()
                    .with_http_listener(addr)
                    .install()
                {
                    Ok(()) => info!("Prometheus exporter listening at http://{}/metrics", addr),
                    Err(e) => warn!("failed to install Prometheus exporter: {}", e),
                }
            }
            Err(_) => warn!("invalid AMP_METRICS_ADDR '{}', metrics disabled", addr_str),
        }
    });
}

pub fn request_success(duration_secs: f64, payload_bytes: usize) {
    ::metrics::counter!("amp_source_requests_success_total").increment(1);
    ::metrics::histogram!("amp_source_request_duration_seconds").record(duration_secs);
    ::metrics::histogram!("amp_source_payload_bytes").record(payload_bytes as f64);
}

pub fn request_error() {
    ::metrics::counter!("amp_source_requests_error_total").increment(1);
}

pub fn records_emitted(stream: &'static str, count: usize) {
    ::metrics::counter!("amp_source_records_emitted_total", "stream" => stream)
        .increment(count as u64);
}
