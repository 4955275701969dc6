//! API middleware
//!
//! Admin token validation and the shared error envelope returned by every
//! failing endpoint.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::services::{
    ArticleError, ArticleService, AuthError, AuthService, NewsletterError, NewsletterService,
    SourceError, SourceService, SubscriberError, SubscriberService, SummarizerError,
};

/// Shared application state passed to all handlers
#[derive(Clone)]
pub struct AppState {
    pub auth: Arc<AuthService>,
    pub sources: Arc<SourceService>,
    pub newsletters: Arc<NewsletterService>,
    pub subscribers: Arc<SubscriberService>,
    pub articles: Arc<ArticleService>,
}

/// Uniform error envelope: `{"error": {"code", "message"}}`
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiError {
    pub error: ApiErrorDetail,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiErrorDetail {
    pub code: String,
    pub message: String,
}

impl ApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: ApiErrorDetail {
                code: code.into(),
                message: message.into(),
            },
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new("UNAUTHORIZED", message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new("NOT_FOUND", message)
    }

    pub fn validation_error(message: impl Into<String>) -> Self {
        Self::new("VALIDATION_ERROR", message)
    }

    pub fn unreachable_source(message: impl Into<String>) -> Self {
        Self::new("UNREACHABLE_SOURCE", message)
    }

    pub fn upstream_failure(message: impl Into<String>) -> Self {
        Self::new("UPSTREAM_FAILURE", message)
    }

    pub fn config_error(message: impl Into<String>) -> Self {
        Self::new("CONFIG_ERROR", message)
    }

    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::new("INTERNAL_ERROR", message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self.error.code.as_str() {
            "UNAUTHORIZED" => StatusCode::UNAUTHORIZED,
            "NOT_FOUND" => StatusCode::NOT_FOUND,
            "VALIDATION_ERROR" => StatusCode::BAD_REQUEST,
            "UNREACHABLE_SOURCE" => StatusCode::UNPROCESSABLE_ENTITY,
            "UPSTREAM_FAILURE" => StatusCode::BAD_GATEWAY,
            "CONFIG_ERROR" => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        (status, Json(self)).into_response()
    }
}

impl From<AuthError> for ApiError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::InvalidCredentials => ApiError::unauthorized("Invalid credentials"),
            AuthError::NotConfigured => {
                ApiError::config_error("Admin authentication is not configured")
            }
            AuthError::Internal(err) => ApiError::internal_error(err.to_string()),
        }
    }
}

impl From<SourceError> for ApiError {
    fn from(e: SourceError) -> Self {
        match e {
            SourceError::InvalidInput(msg) => ApiError::validation_error(msg),
            SourceError::Unreachable(msg) => ApiError::unreachable_source(msg),
            SourceError::NotFound => ApiError::not_found("Source not found"),
            SourceError::Internal(err) => ApiError::internal_error(err.to_string()),
        }
    }
}

impl From<NewsletterError> for ApiError {
    fn from(e: NewsletterError) -> Self {
        match e {
            NewsletterError::NotFound => ApiError::not_found("Newsletter not found"),
            NewsletterError::Internal(err) => ApiError::internal_error(err.to_string()),
        }
    }
}

impl From<SubscriberError> for ApiError {
    fn from(e: SubscriberError) -> Self {
        match e {
            SubscriberError::InvalidEmail => ApiError::validation_error("Invalid email address"),
            SubscriberError::NotFound => {
                ApiError::not_found("No subscription found for that email")
            }
            SubscriberError::Internal(err) => ApiError::internal_error(err.to_string()),
        }
    }
}

impl From<SummarizerError> for ApiError {
    fn from(e: SummarizerError) -> Self {
        match e {
            SummarizerError::Failed(msg) => ApiError::upstream_failure(msg),
        }
    }
}

impl From<ArticleError> for ApiError {
    fn from(e: ArticleError) -> Self {
        match e {
            ArticleError::InvalidInput(msg) => ApiError::validation_error(msg),
            ArticleError::Upstream(e) => e.into(),
            ArticleError::Internal(e) => ApiError::internal_error(e.to_string()),
        }
    }
}

/// Extract a bearer token from the Authorization header
fn extract_bearer_token(request: &Request) -> Option<String> {
    let auth_header = request.headers().get(header::AUTHORIZATION)?;
    let auth_str = auth_header.to_str().ok()?;
    auth_str.strip_prefix("Bearer ").map(|t| t.to_string())
}

/// Admin gate: every privileged route passes through here before any
/// handler side effect. Token verification fails closed.
pub async fn require_admin(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_bearer_token(&request)
        .ok_or_else(|| ApiError::unauthorized("Missing authentication token"))?;

    if !state.auth.verify_token(&token).await {
        return Err(ApiError::unauthorized("Invalid or expired session"));
    }

    Ok(next.run(request).await)
}
