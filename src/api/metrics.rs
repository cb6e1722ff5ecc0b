//! Prometheus scrape endpoint for the `email_*` send pipeline metrics.

use axum::{http::StatusCode, response::IntoResponse};

use crate::metrics;

/// GET /metrics - sends by outcome, send latency, render failures, language
/// fallbacks and unfinalized send logs, in text exposition format
pub async fn prometheus_metrics() -> impl IntoResponse {
    match metrics::encode_metrics() {
        Ok(output) => (
            StatusCode::OK,
            [(axum::http::header::CONTENT_TYPE, "text/plain; version=0.0.4; charset=utf-8")],
            output,
        ),
        Err(e) => {
            tracing::error!(error = %e, "Failed to encode Prometheus metrics");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                [(axum::http::header::CONTENT_TYPE, "text/plain")],
                format!("Failed to encode metrics: {}", e),
            )
        }
    }
}
