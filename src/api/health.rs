//! Health check endpoint.

use axum::{extract::State, Json};
use serde::Serialize;

use crate::server::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
    pub storage: StorageHealthResponse,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub postgres: Option<PostgresHealthResponse>,
    pub transport: String,
    pub triggers: usize,
}

#[derive(Debug, Serialize)]
pub struct StorageHealthResponse {
    pub templates: String,
    pub logs: String,
}

#[derive(Debug, Serialize)]
pub struct PostgresHealthResponse {
    pub connected: bool,
    pub pool_size: u32,
    pub idle_connections: u32,
}

pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let (templates, logs, transport) = state.service.backends();

    let postgres = match state.postgres_pool {
        Some(ref pool) => {
            let connected = match pool.ping().await {
                Ok(()) => true,
                Err(e) => {
                    tracing::warn!(error = %e, "PostgreSQL health check failed");
                    false
                }
            };
            let inner_pool = pool.pool();
            Some(PostgresHealthResponse {
                connected,
                pool_size: inner_pool.size(),
                idle_connections: inner_pool.num_idle() as u32,
            })
        }
        None => None,
    };

    let healthy = postgres.as_ref().map_or(true, |pg| pg.connected);
    let status = if healthy { "healthy" } else { "degraded" };

    Json(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
        storage: StorageHealthResponse {
            templates: templates.to_string(),
            logs: logs.to_string(),
        },
        postgres,
        transport: transport.to_string(),
        triggers: state.service.registry().len(),
    })
}
