//! Subscriber endpoints
//!
//! Public:
//! - POST /api/v1/newsletter/subscribe
//! - POST /api/v1/newsletter/unsubscribe
//! - GET  /api/v1/newsletter/latest?category=
//!
//! Admin:
//! - GET /api/v1/admin/subscribers?limit&offset

use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::api::common::PaginationQuery;
use crate::api::middleware::{ApiError, AppState};
use crate::models::{Newsletter, Subscriber};
use crate::services::SubscribeOutcome;

#[derive(Debug, Deserialize)]
pub struct SubscribeRequest {
    pub email: String,
    #[serde(default)]
    pub categories: Vec<String>,
    pub source: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SubscribeResponse {
    pub status: SubscribeOutcome,
}

pub async fn subscribe(
    State(state): State<AppState>,
    Json(body): Json<SubscribeRequest>,
) -> Result<Json<SubscribeResponse>, ApiError> {
    let status = state
        .subscribers
        .subscribe(&body.email, body.categories, body.source)
        .await?;
    Ok(Json(SubscribeResponse { status }))
}

#[derive(Debug, Deserialize)]
pub struct UnsubscribeRequest {
    pub email: String,
}

pub async fn unsubscribe(
    State(state): State<AppState>,
    Json(body): Json<UnsubscribeRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    state.subscribers.unsubscribe(&body.email).await?;
    Ok(Json(serde_json::json!({ "success": true })))
}

#[derive(Debug, Deserialize)]
pub struct LatestQuery {
    pub category: Option<String>,
}

pub async fn latest_newsletter(
    State(state): State<AppState>,
    Query(query): Query<LatestQuery>,
) -> Result<Json<Newsletter>, ApiError> {
    let newsletter = state
        .newsletters
        .latest_published(query.category.as_deref())
        .await?;
    Ok(Json(newsletter))
}

#[derive(Debug, Serialize)]
pub struct SubscriberListResponse {
    pub subscribers: Vec<Subscriber>,
    pub total: i64,
}

pub async fn list_subscribers(
    State(state): State<AppState>,
    Query(query): Query<PaginationQuery>,
) -> Result<Json<SubscriberListResponse>, ApiError> {
    let (subscribers, total) = state.subscribers.list(query.limit, query.offset).await?;
    Ok(Json(SubscriberListResponse { subscribers, total }))
}
