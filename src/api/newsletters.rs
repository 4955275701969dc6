//! Newsletter workflow endpoints (admin)
//!
//! - POST /api/v1/admin/newsletters/generate
//! - GET  /api/v1/admin/newsletters
//! - GET  /api/v1/admin/newsletters/{id}
//! - PUT  /api/v1/admin/newsletters/{id}
//! - POST /api/v1/admin/newsletters/{id}/publish

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;

use crate::api::middleware::{ApiError, AppState};
use crate::models::{Newsletter, Section};

pub async fn generate_newsletter(
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<Newsletter>), ApiError> {
    let newsletter = state.newsletters.generate().await?;
    Ok((StatusCode::CREATED, Json(newsletter)))
}

pub async fn list_newsletters(
    State(state): State<AppState>,
) -> Result<Json<Vec<Newsletter>>, ApiError> {
    Ok(Json(state.newsletters.list().await?))
}

pub async fn get_newsletter(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Newsletter>, ApiError> {
    Ok(Json(state.newsletters.get(&id).await?))
}

/// Body for a full-document save. Only title and sections are writable;
/// status and timestamps are managed server-side.
#[derive(Debug, Deserialize)]
pub struct SaveNewsletterRequest {
    pub title: String,
    pub sections: Vec<Section>,
}

pub async fn save_newsletter(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<SaveNewsletterRequest>,
) -> Result<Json<Newsletter>, ApiError> {
    let newsletter = state
        .newsletters
        .save(&id, body.title, body.sections)
        .await?;
    Ok(Json(newsletter))
}

pub async fn publish_newsletter(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Newsletter>, ApiError> {
    Ok(Json(state.newsletters.publish(&id).await?))
}
