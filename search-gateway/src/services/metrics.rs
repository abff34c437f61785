//! Prometheus metrics for search-gateway.
//!
//! Provides HTTP, search, credential and provider metrics for observability.

use axum::{
    extract::{MatchedPath, Request},
    middleware::Next,
    response::Response,
};
use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounterVec, IntGauge, Opts, Registry, TextEncoder,
};
use std::sync::{Once, OnceLock};
use std::time::Instant;

// Global registry
pub static REGISTRY: OnceLock<Registry> = OnceLock::new();

// HTTP metrics
pub static HTTP_REQUESTS_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();
pub static HTTP_REQUEST_DURATION_SECONDS: OnceLock<HistogramVec> = OnceLock::new();

// Search metrics
pub static SEARCH_REQUESTS_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();
pub static SESSIONS_REGISTERED: OnceLock<IntGauge> = OnceLock::new();

// Credential metrics
pub static CREDENTIAL_ATTEMPTS_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();

// Provider metrics
pub static PROVIDER_LATENCY_SECONDS: OnceLock<HistogramVec> = OnceLock::new();
pub static PROVIDER_ERRORS_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();

static INIT: Once = Once::new();

/// Path label for requests that matched no route.
pub const UNMATCHED_PATH: &str = "unmatched";

/// Initialize all metrics. Calls after the first are no-ops.
pub fn init_metrics() {
    INIT.call_once(register_metrics);
}

fn register_metrics() {
    let registry = Registry::new();

    let http_requests = IntCounterVec::new(
        Opts::new("http_requests_total", "Total number of HTTP requests"),
        &["method", "path", "status"],
    )
    .expect("Failed to create http_requests_total metric");

    let http_duration = HistogramVec::new(
        HistogramOpts::new(
            "http_request_duration_seconds",
            "HTTP request duration in seconds",
        ),
        &["method", "path"],
    )
    .expect("Failed to create http_request_duration_seconds metric");

    // mode: single_turn | multi_turn
    let search_requests = IntCounterVec::new(
        Opts::new("search_requests_total", "Total search requests"),
        &["mode", "outcome"],
    )
    .expect("Failed to create search_requests_total metric");

    let sessions_registered = IntGauge::new(
        "sessions_registered",
        "Number of sessions held in the local registry",
    )
    .expect("Failed to create sessions_registered metric");

    let credential_attempts = IntCounterVec::new(
        Opts::new(
            "credential_attempts_total",
            "Credential source attempts by strategy and outcome",
        ),
        &["strategy", "outcome"],
    )
    .expect("Failed to create credential_attempts_total metric");

    let provider_latency = HistogramVec::new(
        HistogramOpts::new(
            "provider_latency_seconds",
            "Search provider API latency in seconds",
        )
        .buckets(vec![0.1, 0.25, 0.5, 1.0, 2.0, 5.0, 10.0, 30.0, 60.0]),
        &["provider", "operation"],
    )
    .expect("Failed to create provider_latency_seconds metric");

    let provider_errors = IntCounterVec::new(
        Opts::new("provider_errors_total", "Total search provider errors"),
        &["provider", "error_type"],
    )
    .expect("Failed to create provider_errors_total metric");

    registry
        .register(Box::new(http_requests.clone()))
        .expect("Failed to register http_requests_total");
    registry
        .register(Box::new(http_duration.clone()))
        .expect("Failed to register http_request_duration_seconds");
    registry
        .register(Box::new(search_requests.clone()))
        .expect("Failed to register search_requests_total");
    registry
        .register(Box::new(sessions_registered.clone()))
        .expect("Failed to register sessions_registered");
    registry
        .register(Box::new(credential_attempts.clone()))
        .expect("Failed to register credential_attempts_total");
    registry
        .register(Box::new(provider_latency.clone()))
        .expect("Failed to register provider_latency_seconds");
    registry
        .register(Box::new(provider_errors.clone()))
        .expect("Failed to register provider_errors_total");

    // Initialize globals
    let _ = REGISTRY.set(registry);
    let _ = HTTP_REQUESTS_TOTAL.set(http_requests);
    let _ = HTTP_REQUEST_DURATION_SECONDS.set(http_duration);
    let _ = SEARCH_REQUESTS_TOTAL.set(search_requests);
    let _ = SESSIONS_REGISTERED.set(sessions_registered);
    let _ = CREDENTIAL_ATTEMPTS_TOTAL.set(credential_attempts);
    let _ = PROVIDER_LATENCY_SECONDS.set(provider_latency);
    let _ = PROVIDER_ERRORS_TOTAL.set(provider_errors);

    tracing::info!("Prometheus metrics initialized");
}

/// Get metrics in Prometheus text format.
pub fn get_metrics() -> String {
    let mut buffer = Vec::new();
    let encoder = TextEncoder::new();

    let registry = match REGISTRY.get() {
        Some(r) => r,
        None => {
            tracing::error!("Metrics registry not initialized");
            return "# Metrics registry not initialized\n".to_string();
        }
    };

    let metric_families = registry.gather();

    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!(error = %e, "Failed to encode metrics");
        return format!("# Failed to encode metrics: {}\n", e);
    }

    match String::from_utf8(buffer) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!(error = %e, "Failed to convert metrics to UTF-8");
            format!("# Failed to convert metrics to UTF-8: {}\n", e)
        }
    }
}

/// Middleware recording request counts and latency per route.
pub async fn http_metrics_middleware(req: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = req.method().to_string();
    // Route templates only; raw paths would let clients mint new series.
    let path = req
        .extensions()
        .get::<MatchedPath>()
        .map(|matched| matched.as_str().to_string())
        .unwrap_or_else(|| UNMATCHED_PATH.to_string());

    let response = next.run(req).await;

    let status = response.status().as_u16().to_string();
    if let Some(counter) = HTTP_REQUESTS_TOTAL.get() {
        counter.with_label_values(&[&method, &path, &status]).inc();
    }
    if let Some(histogram) = HTTP_REQUEST_DURATION_SECONDS.get() {
        histogram
            .with_label_values(&[&method, &path])
            .observe(start.elapsed().as_secs_f64());
    }

    response
}

// Helper functions for recording metrics

/// Record a finished search.
pub fn record_search(mode: &str, outcome: &str) {
    if let Some(counter) = SEARCH_REQUESTS_TOTAL.get() {
        counter.with_label_values(&[mode, outcome]).inc();
    }
}

/// Record one credential source attempt.
pub fn record_credential_attempt(strategy: &str, outcome: &str) {
    if let Some(counter) = CREDENTIAL_ATTEMPTS_TOTAL.get() {
        counter.with_label_values(&[strategy, outcome]).inc();
    }
}

/// Record provider latency.
pub fn record_provider_latency(provider: &str, operation: &str, duration_secs: f64) {
    if let Some(histogram) = PROVIDER_LATENCY_SECONDS.get() {
        histogram
            .with_label_values(&[provider, operation])
            .observe(duration_secs);
    }
}

/// Record a provider error.
pub fn record_provider_error(provider: &str, error_type: &str) {
    if let Some(counter) = PROVIDER_ERRORS_TOTAL.get() {
        counter.with_label_values(&[provider, error_type]).inc();
    }
}

/// Update the registered sessions gauge.
pub fn set_sessions_registered(count: usize) {
    if let Some(gauge) = SESSIONS_REGISTERED.get() {
        gauge.set(count as i64);
    }
}
