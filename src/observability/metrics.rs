//! Metrics collection and exposition.
//!
//! # Metrics
//! - `relay_requests_total` (counter): relay attempts by method and status class
//! - `relay_bytes_total` (counter): bytes streamed to callers
//! - `relay_redirects_total` (counter): redirect hops followed
//! - `relay_stalls_total` (counter): transfers cancelled by the watchdog
//!
//! Recording without an installed exporter is a no-op, so library users and
//! tests pay nothing for these call sites.

use std::net::SocketAddr;

use metrics::{counter, describe_counter};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter on its own listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => {
            describe_counter!(
                "relay_requests_total",
                "Total relay attempts by method and status class"
            );
            describe_counter!("relay_bytes_total", "Total bytes streamed to callers");
            describe_counter!("relay_redirects_total", "Total redirect hops followed");
            describe_counter!(
                "relay_stalls_total",
                "Total transfers cancelled by the stall watchdog"
            );
            tracing::info!(address = %addr, "Metrics exporter listening");
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to install metrics exporter");
        }
    }
}

/// Record one relay attempt and the status it answered with.
pub fn record_relay(method: &str, status: u16) {
    let status_class = match status {
        200..=299 => "2xx",
        300..=399 => "3xx",
        400..=499 => "4xx",
        500..=599 => "5xx",
        _ => "other",
    };
    counter!(
        "relay_requests_total",
        "method" => method.to_string(),
        "status" => status_class
    )
    .increment(1);
}

pub fn record_relayed_bytes(bytes: u64) {
    counter!("relay_bytes_total").increment(bytes);
}

pub fn record_redirect() {
    counter!("relay_redirects_total").increment(1);
}

pub fn record_stall() {
    counter!("relay_stalls_total").increment(1);
}
