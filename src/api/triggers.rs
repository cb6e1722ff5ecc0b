//! Trigger catalog endpoints.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};

use crate::error::Result;
use crate::server::AppState;
use crate::trigger::{Param, TriggerDefinition};

/// GET /api/v1/triggers
#[tracing::instrument(name = "http.list_triggers", skip(state))]
pub async fn list_triggers(State(state): State<AppState>) -> Json<Vec<Arc<TriggerDefinition>>> {
    Json(state.service.list_triggers())
}

/// GET /api/v1/triggers/{code}
#[tracing::instrument(name = "http.get_trigger", skip(state))]
pub async fn get_trigger(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Json<Arc<TriggerDefinition>>> {
    state.service.get_trigger(&code).map(Json)
}

/// GET /api/v1/triggers/{code}/params - common params followed by the trigger's own
#[tracing::instrument(name = "http.get_trigger_params", skip(state))]
pub async fn get_trigger_params(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Json<Vec<Param>> {
    Json(state.service.get_trigger_params(&code))
}
