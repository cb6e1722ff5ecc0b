use axum::{
    routing::{get, post},
    Router,
};

use crate::server::AppState;

use super::health::health;
use super::logs::{get_send_log, list_send_logs};
use super::metrics::prometheus_metrics;
use super::send::{send_email, send_email_async};
use super::templates::{
    create_template, delete_template, get_template, list_templates, preview_template,
    test_send_template, update_template,
};
use super::triggers::{get_trigger, get_trigger_params, list_triggers};

/// Unauthenticated operational endpoints.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/metrics", get(prometheus_metrics))
}

/// Endpoints served under `/api/v1`.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        // Triggers
        .route("/triggers", get(list_triggers))
        .route("/triggers/{code}", get(get_trigger))
        .route("/triggers/{code}/params", get(get_trigger_params))
        // Templates
        .route("/templates", get(list_templates).post(create_template))
        .route(
            "/templates/{id}",
            get(get_template).put(update_template).delete(delete_template),
        )
        .route("/templates/{id}/preview", get(preview_template))
        .route("/templates/{id}/test-send", post(test_send_template))
        // Sending
        .route("/send", post(send_email))
        .route("/send/async", post(send_email_async))
        // Send logs
        .route("/logs", get(list_send_logs))
        .route("/logs/{id}", get(get_send_log))
}
