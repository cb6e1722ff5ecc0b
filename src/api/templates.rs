//! Template CRUD, preview and test-send endpoints.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;

use super::send::SuccessResponse;
use crate::error::Result;
use crate::pagination::PageResult;
use crate::server::AppState;
use crate::template::{
    CreateTemplateInput, PreviewResult, Template, TemplateFilter, UpdateTemplateInput,
};

#[derive(Debug, Deserialize)]
pub struct TestSendRequest {
    #[serde(default)]
    pub recipient: String,
}

/// GET /api/v1/templates - filtered, paginated, newest first
#[tracing::instrument(name = "http.list_templates", skip(state))]
pub async fn list_templates(
    State(state): State<AppState>,
    Query(filter): Query<TemplateFilter>,
) -> Result<Json<PageResult<Template>>> {
    state.service.list_templates(&filter).await.map(Json)
}

/// POST /api/v1/templates - Create a new template
#[tracing::instrument(
    name = "http.create_template",
    skip(state, request),
    fields(trigger_code = %request.trigger_code)
)]
pub async fn create_template(
    State(state): State<AppState>,
    Json(request): Json<CreateTemplateInput>,
) -> Result<(StatusCode, Json<Template>)> {
    let created = state.service.create_template(request).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// GET /api/v1/templates/{id}
#[tracing::instrument(name = "http.get_template", skip(state))]
pub async fn get_template(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Template>> {
    state.service.get_template(id).await.map(Json)
}

/// PUT /api/v1/templates/{id} - partial update
#[tracing::instrument(name = "http.update_template", skip(state, request))]
pub async fn update_template(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(request): Json<UpdateTemplateInput>,
) -> Result<Json<Template>> {
    state.service.update_template(id, request).await.map(Json)
}

/// DELETE /api/v1/templates/{id}
#[tracing::instrument(name = "http.delete_template", skip(state))]
pub async fn delete_template(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode> {
    state.service.delete_template(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/templates/{id}/preview
#[tracing::instrument(name = "http.preview_template", skip(state))]
pub async fn preview_template(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<PreviewResult>> {
    state.service.preview_template(id).await.map(Json)
}

/// POST /api/v1/templates/{id}/test-send
#[tracing::instrument(name = "http.test_send_template", skip(state, request))]
pub async fn test_send_template(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(request): Json<TestSendRequest>,
) -> Result<(StatusCode, Json<SuccessResponse>)> {
    state.service.test_send(id, &request.recipient).await?;
    Ok((StatusCode::ACCEPTED, Json(SuccessResponse::ok())))
}
