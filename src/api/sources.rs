//! Content source management endpoints (admin)
//!
//! - GET    /api/v1/admin/sources
//! - POST   /api/v1/admin/sources
//! - PUT    /api/v1/admin/sources/{id}
//! - DELETE /api/v1/admin/sources/{id}

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::api::middleware::{ApiError, AppState};
use crate::models::{ContentSource, CreateSourceInput, UpdateSourceInput};

pub async fn list_sources(
    State(state): State<AppState>,
) -> Result<Json<Vec<ContentSource>>, ApiError> {
    Ok(Json(state.sources.list().await?))
}

pub async fn create_source(
    State(state): State<AppState>,
    Json(input): Json<CreateSourceInput>,
) -> Result<(StatusCode, Json<ContentSource>), ApiError> {
    let source = state.sources.add(input).await?;
    Ok((StatusCode::CREATED, Json(source)))
}

pub async fn update_source(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(input): Json<UpdateSourceInput>,
) -> Result<Json<ContentSource>, ApiError> {
    let source = state.sources.update(&id, input).await?;
    Ok(Json(source))
}

pub async fn delete_source(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.sources.remove(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}
