// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Prometheus metrics for sambacar
//!
//! This module provides metrics for monitoring the Samba AD DC API server:
//! - HTTP request metrics (count, duration, status codes)
//! - Directory operation metrics (creates, deletes, moves, etc. per domain)
//! - samba-tool command execution metrics
//! - Query cache metrics (hit/stale/miss)

use lazy_static::lazy_static;
use prometheus::{
    opts, register_counter_vec, register_histogram_vec, CounterVec, Encoder, HistogramVec,
    TextEncoder,
};

lazy_static! {
    /// HTTP request counter by method, path, and status code
    pub static ref HTTP_REQUESTS_TOTAL: CounterVec = register_counter_vec!(
        opts!(
            "sambacar_http_requests_total",
            "Total number of HTTP requests processed"
        ),
        &["method", "path", "status"]
    )
    .expect("Failed to create HTTP_REQUESTS_TOTAL metric");

    /// HTTP request duration histogram
    pub static ref HTTP_REQUEST_DURATION_SECONDS: HistogramVec = register_histogram_vec!(
        "sambacar_http_request_duration_seconds",
        "HTTP request duration in seconds",
        &["method", "path"],
        vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]
    )
    .expect("Failed to create HTTP_REQUEST_DURATION_SECONDS metric");

    /// Directory operations counter by domain, operation, and result
    pub static ref DIRECTORY_OPERATIONS_TOTAL: CounterVec = register_counter_vec!(
        opts!(
            "sambacar_directory_operations_total",
            "Total number of directory operations"
        ),
        &["domain", "operation", "result"]
    )
    .expect("Failed to create DIRECTORY_OPERATIONS_TOTAL metric");

    /// samba-tool command counter by subcommand and result
    pub static ref SAMBA_COMMANDS_TOTAL: CounterVec = register_counter_vec!(
        opts!(
            "sambacar_samba_commands_total",
            "Total number of samba-tool commands executed"
        ),
        &["command", "result"]
    )
    .expect("Failed to create SAMBA_COMMANDS_TOTAL metric");

    /// samba-tool command duration histogram
    pub static ref SAMBA_COMMAND_DURATION_SECONDS: HistogramVec = register_histogram_vec!(
        "sambacar_samba_command_duration_seconds",
        "samba-tool command execution duration in seconds",
        &["command"],
        vec![0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]
    )
    .expect("Failed to create SAMBA_COMMAND_DURATION_SECONDS metric");

    /// Query cache accesses by outcome (hit, stale, miss)
    pub static ref CACHE_ACCESSES_TOTAL: CounterVec = register_counter_vec!(
        opts!(
            "sambacar_cache_accesses_total",
            "Total number of query cache accesses"
        ),
        &["outcome"]
    )
    .expect("Failed to create CACHE_ACCESSES_TOTAL metric");

    /// Application info metric
    pub static ref APP_INFO: CounterVec = register_counter_vec!(
        opts!(
            "sambacar_app_info",
            "Application information"
        ),
        &["version"]
    )
    .expect("Failed to create APP_INFO metric");

    /// Rate limit counter by result
    pub static ref RATE_LIMIT_REQUESTS_TOTAL: CounterVec = register_counter_vec!(
        opts!(
            "sambacar_rate_limit_requests_total",
            "Total number of rate limit checks"
        ),
        &["result"]
    )
    .expect("Failed to create RATE_LIMIT_REQUESTS_TOTAL metric");
}

/// Initialize metrics with application info
pub fn init_metrics() {
    APP_INFO
        .with_label_values(&[env!("CARGO_PKG_VERSION")])
        .inc();
}

/// Generate metrics output in Prometheus format
pub fn gather_metrics() -> Result<String, Box<dyn std::error::Error>> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    Ok(String::from_utf8(buffer)?)
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

/// Record a directory operation (e.g., domain "user", operation "create")
pub fn record_directory_operation(domain: &str, operation: &str, success: bool) {
    let result = if success { "success" } else { "error" };
    DIRECTORY_OPERATIONS_TOTAL
        .with_label_values(&[domain, operation, result])
        .inc();
}

/// Record a samba-tool command execution
pub fn record_samba_command(command: &str, success: bool, duration: f64) {
    let result = if success { "success" } else { "error" };
    SAMBA_COMMANDS_TOTAL
        .with_label_values(&[command, result])
        .inc();
    SAMBA_COMMAND_DURATION_SECONDS
        .with_label_values(&[command])
        .observe(duration);
}

/// Record a query cache access ("hit", "stale", or "miss")
pub fn record_cache_access(outcome: &str) {
    CACHE_ACCESSES_TOTAL.with_label_values(&[outcome]).inc();
}

/// Record a rate limit check
pub fn record_rate_limit(allowed: bool) {
    let result = if allowed { "allowed" } else { "rejected" };
    RATE_LIMIT_REQUESTS_TOTAL
        .with_label_values(&[result])
        .inc();
}
