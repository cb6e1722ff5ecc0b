//! Send log query endpoints.

use axum::{
    extract::{Path, Query, State},
    Json,
};

use crate::error::Result;
use crate::pagination::PageResult;
use crate::send_log::{LogFilter, SendLog};
use crate::server::AppState;

/// GET /api/v1/logs - filter by trigger_code, status, start_time / end_time (RFC 3339)
#[tracing::instrument(name = "http.list_send_logs", skip(state))]
pub async fn list_send_logs(
    State(state): State<AppState>,
    Query(filter): Query<LogFilter>,
) -> Result<Json<PageResult<SendLog>>> {
    state.service.get_send_logs(&filter).await.map(Json)
}

/// GET /api/v1/logs/{id}
#[tracing::instrument(name = "http.get_send_log", skip(state))]
pub async fn get_send_log(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<SendLog>> {
    state.service.get_send_log(id).await.map(Json)
}
