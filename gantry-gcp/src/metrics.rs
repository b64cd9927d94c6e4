//! Prometheus metrics for Google API calls
//!
//! - Histograms for latency measurements with defined buckets
//! - Counters for request outcomes and provisioning results

use lazy_static::lazy_static;
use prometheus::{register_histogram_vec, register_int_counter_vec, HistogramVec, IntCounterVec};

lazy_static! {
    /// Duration of a single API round trip in seconds
    ///
    /// Labels:
    /// - service: "cloudtasks", "pubsub", "cloudscheduler", "sqladmin", "drive"
    /// - method: HTTP method
    ///
    /// Buckets: 0.01s to 30s
    pub static ref REQUEST_DURATION: HistogramVec = register_histogram_vec!(
        "gantry_request_duration_seconds",
        "Duration of Google API requests",
        &["service", "method"],
        vec![0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0]
    )
    .expect("gantry_request_duration_seconds metric registration");

    /// Total number of API requests by outcome
    ///
    /// Labels:
    /// - service
    /// - outcome: "success", "not_found", "unauthorized", "client_error",
    ///   "server_error", "auth_error", "transport_error"
    pub static ref REQUEST_TOTAL: IntCounterVec = register_int_counter_vec!(
        "gantry_requests_total",
        "Total number of Google API requests",
        &["service", "outcome"]
    )
    .expect("gantry_requests_total metric registration");

    /// Duration of token acquisition in seconds
    ///
    /// Buckets: 0.01s to 10s
    pub static ref TOKEN_ACQUISITION_DURATION: HistogramVec = register_histogram_vec!(
        "gantry_token_acquisition_duration_seconds",
        "Duration of OAuth2 token acquisition",
        &["cache_hit"],
        vec![0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]
    )
    .expect("gantry_token_acquisition_duration_seconds metric registration");

    /// Results of get-or-create provisioning
    ///
    /// Labels:
    /// - kind: resource kind ("queue", "topic", ...)
    /// - outcome: "found", "created", "failed"
    pub static ref PROVISION_TOTAL: IntCounterVec = register_int_counter_vec!(
        "gantry_provision_total",
        "Total number of get-or-create provisioning calls",
        &["kind", "outcome"]
    )
    .expect("gantry_provision_total metric registration");
}

/// Outcome label for a completed HTTP exchange
pub fn outcome_for_status(status: u16) -> &'static str {
    match status {
        200..=299 => "success",
        401 => "unauthorized",
        404 => "not_found",
        400..=499 => "client_error",
        _ => "server_error",
    }
}
