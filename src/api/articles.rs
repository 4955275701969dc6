//! Article endpoints (admin)
//!
//! - POST /api/v1/admin/articles - manual article entry, optionally passing
//!   the raw content through the summarizer first
//! - POST /api/v1/admin/articles/search - web-search for candidate articles

use axum::{extract::State, http::StatusCode, Json};
use serde::Deserialize;

use crate::api::middleware::{ApiError, AppState};
use crate::models::Article;
use crate::services::NewArticleInput;

fn default_max_length() -> u32 {
    150
}

#[derive(Debug, Deserialize)]
pub struct CreateArticleRequest {
    pub title: String,
    pub source_url: String,
    /// Pre-written summary. When absent, `content` is summarized instead.
    pub summary: Option<String>,
    /// Raw article text to run through the summarizer.
    pub content: Option<String>,
    pub category: String,
    #[serde(default = "default_max_length")]
    pub max_length: u32,
    #[serde(default)]
    pub interest_score: f64,
}

pub async fn create_article(
    State(state): State<AppState>,
    Json(body): Json<CreateArticleRequest>,
) -> Result<(StatusCode, Json<Article>), ApiError> {
    let article = state
        .articles
        .create(NewArticleInput {
            title: body.title,
            source_url: body.source_url,
            summary: body.summary,
            content: body.content,
            category: body.category,
            max_length: body.max_length,
            interest_score: body.interest_score,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(article)))
}

#[derive(Debug, Deserialize)]
pub struct SearchArticlesRequest {
    pub topic: String,
}

/// Candidate articles for a topic. Results are not persisted; the admin
/// picks which ones to enter.
pub async fn search_articles(
    State(state): State<AppState>,
    Json(body): Json<SearchArticlesRequest>,
) -> Result<Json<Vec<Article>>, ApiError> {
    let articles = state.articles.search(&body.topic).await?;
    Ok(Json(articles))
}
