//! Request metrics.
//!
//! # Metrics
//! - `strata_requests_total` (counter): requests by method and status
//! - `strata_request_duration_seconds` (histogram): dispatch latency
//!
//! # Design Decisions
//! - Labels use the effective method, so an overridden POST counts
//!   under the method it dispatched as

use std::time::Instant;

use metrics::{counter, histogram};

/// Record one completed dispatch.
pub fn record_request(method: &str, status: u16, started: Instant) {
    counter!(
        "strata_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    histogram!(
        "strata_request_duration_seconds",
        "method" => method.to_string()
    )
    .record(started.elapsed().as_secs_f64());
}
