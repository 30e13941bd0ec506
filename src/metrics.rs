/// Metrics and telemetry for the credential relay
///
/// Provides Prometheus-compatible metrics for monitoring:
/// - HTTP request counts and latencies
/// - Calls to the remote issuer and verifier applications
/// - Presentation verification outcomes
/// - Auth token rotations
/// - Realtime connections

use lazy_static::lazy_static;
use prometheus::{
    register_histogram_vec, register_int_counter_vec, register_int_gauge, Encoder, HistogramVec,
    IntCounterVec, IntGauge, TextEncoder,
};

lazy_static! {
    // ========== HTTP Metrics ==========

    /// Total HTTP requests by method, path, and status
    pub static ref HTTP_REQUESTS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "relay_http_requests_total",
        "Total number of HTTP requests",
        &["method", "path", "status"]
    )
    .expect("register relay_http_requests_total");

    /// HTTP request duration in seconds
    pub static ref HTTP_REQUEST_DURATION_SECONDS: HistogramVec = register_histogram_vec!(
        "relay_http_request_duration_seconds",
        "HTTP request latencies in seconds",
        &["method", "path"],
        vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]
    )
    .expect("register relay_http_request_duration_seconds");

    // ========== Remote Metrics ==========

    /// Outbound calls by remote service, endpoint, and outcome
    pub static ref REMOTE_CALLS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "relay_remote_calls_total",
        "Total number of calls to remote issuer/verifier applications",
        &["service", "endpoint", "outcome"]
    )
    .expect("register relay_remote_calls_total");

    /// Outbound call duration in seconds
    pub static ref REMOTE_CALL_DURATION_SECONDS: HistogramVec = register_histogram_vec!(
        "relay_remote_call_duration_seconds",
        "Remote call latencies in seconds",
        &["service", "endpoint"],
        vec![0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0]
    )
    .expect("register relay_remote_call_duration_seconds");

    /// Auth tokens reissued by a remote application, by owner kind
    pub static ref AUTH_TOKEN_ROTATIONS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "relay_auth_token_rotations_total",
        "Total number of stored auth tokens replaced after a remote reissue",
        &["kind"]
    )
    .expect("register relay_auth_token_rotations_total");

    // ========== Presentation Metrics ==========

    /// Presentation verifications by protocol version and outcome
    pub static ref PRESENTATIONS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "relay_presentations_total",
        "Total number of presentations relayed for verification",
        &["version", "outcome"]
    )
    .expect("register relay_presentations_total");

    /// Shared credentials persisted from verified presentations
    pub static ref SHARED_CREDENTIALS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "relay_shared_credentials_total",
        "Total number of shared credentials stored",
        &["version"]
    )
    .expect("register relay_shared_credentials_total");

    // ========== Realtime Metrics ==========

    /// Open realtime connections
    pub static ref REALTIME_CONNECTIONS: IntGauge = register_int_gauge!(
        "relay_realtime_connections",
        "Number of open realtime WebSocket connections"
    )
    .expect("register relay_realtime_connections");

    /// Events published to realtime channels
    pub static ref REALTIME_EVENTS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "relay_realtime_events_total",
        "Total number of events published to realtime channels",
        &["event", "delivered"]
    )
    .expect("register relay_realtime_events_total");
}

/// Render metrics in Prometheus text format
pub fn render_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!("Failed to encode metrics: {}", e);
        return String::new();
    }
    String::from_utf8(buffer).unwrap_or_default()
}

/// Record an HTTP request
pub fn record_http_request(method: &str, path: &str, status: u16, duration: f64) {
    HTTP_REQUESTS_TOTAL
        .with_label_values(&[method, path, &status.to_string()])
        .inc();
    HTTP_REQUEST_DURATION_SECONDS
        .with_label_values(&[method, path])
        .observe(duration);
}

/// Record a call to a remote application
pub fn record_remote_call(service: &str, endpoint: &str, outcome: &str, duration: f64) {
    REMOTE_CALLS_TOTAL
        .with_label_values(&[service, endpoint, outcome])
        .inc();
    REMOTE_CALL_DURATION_SECONDS
        .with_label_values(&[service, endpoint])
        .observe(duration);
}

/// Record an auth token rotation
pub fn record_auth_token_rotation(kind: &str) {
    AUTH_TOKEN_ROTATIONS_TOTAL.with_label_values(&[kind]).inc();
}

/// Record a presentation verification outcome
pub fn record_presentation(version: &str, outcome: &str) {
    PRESENTATIONS_TOTAL
        .with_label_values(&[version, outcome])
        .inc();
}

/// Record a stored shared credential
pub fn record_shared_credential(version: &str) {
    SHARED_CREDENTIALS_TOTAL.with_label_values(&[version]).inc();
}

/// Record a realtime publication
pub fn record_realtime_event(event: &str, delivered: bool) {
    REALTIME_EVENTS_TOTAL
        .with_label_values(&[event, if delivered { "true" } else { "false" }])
        .inc();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_http_request() {
        record_http_request("GET", "/company", 200, 0.05);
        let metrics = render_metrics();
        assert!(metrics.contains("relay_http_requests_total"));
        assert!(metrics.contains("relay_http_request_duration_seconds"));
    }

    #[test]
    fn test_record_remote_call() {
        record_remote_call("verifier", "/api/verifyPresentation", "success", 0.2);
        let metrics = render_metrics();
        assert!(metrics.contains("relay_remote_calls_total"));
        assert!(metrics.contains("/api/verifyPresentation"));
    }

    #[test]
    fn test_record_presentation_and_rotation() {
        record_presentation("v3", "verified");
        record_auth_token_rotation("verifier");
        let metrics = render_metrics();
        assert!(metrics.contains("relay_presentations_total"));
        assert!(metrics.contains("relay_auth_token_rotations_total"));
    }

    #[test]
    fn test_realtime_gauge() {
        REALTIME_CONNECTIONS.inc();
        REALTIME_CONNECTIONS.dec();
        record_realtime_event("presentation", false);
        assert!(render_metrics().contains("relay_realtime_events_total"));
    }
}
