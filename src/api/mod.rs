//! API layer - HTTP handlers and routing
//!
//! Route map (all JSON):
//! - `POST /api/v1/admin/login` — password for token exchange
//! - `/api/v1/admin/*` — token-gated management surface
//! - `/api/v1/newsletter/*` — public subscribe/unsubscribe/latest

pub mod articles;
pub mod auth;
pub mod common;
pub mod middleware;
pub mod newsletters;
pub mod sources;
pub mod subscribers;

use axum::{
    http::{header, HeaderValue, Method},
    middleware as axum_middleware,
    routing::{delete, get, post, put},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use middleware::{ApiError, AppState};

/// CORS policy for the configured origin; `*` opens the API up, anything
/// else is pinned to that single origin. An unparseable origin falls back
/// to same-origin only rather than failing startup.
fn cors_layer(cors_origin: &str) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    if cors_origin == "*" {
        return cors.allow_origin(Any);
    }
    match cors_origin.parse::<HeaderValue>() {
        Ok(origin) => cors.allow_origin(origin),
        Err(_) => {
            tracing::warn!("Invalid CORS origin {:?}, allowing none", cors_origin);
            cors
        }
    }
}

/// Build the full application router
pub fn build_router(state: AppState, cors_origin: &str) -> Router {
    let admin_routes = Router::new()
        .route("/admin/sources", get(sources::list_sources))
        .route("/admin/sources", post(sources::create_source))
        .route("/admin/sources/{id}", put(sources::update_source))
        .route("/admin/sources/{id}", delete(sources::delete_source))
        .route("/admin/subscribers", get(subscribers::list_subscribers))
        .route("/admin/articles", post(articles::create_article))
        .route("/admin/articles/search", post(articles::search_articles))
        .route(
            "/admin/newsletters/generate",
            post(newsletters::generate_newsletter),
        )
        .route("/admin/newsletters", get(newsletters::list_newsletters))
        .route("/admin/newsletters/{id}", get(newsletters::get_newsletter))
        .route("/admin/newsletters/{id}", put(newsletters::save_newsletter))
        .route(
            "/admin/newsletters/{id}/publish",
            post(newsletters::publish_newsletter),
        )
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::require_admin,
        ));

    let public_routes = Router::new()
        .route("/admin/login", post(auth::login))
        .route("/newsletter/subscribe", post(subscribers::subscribe))
        .route("/newsletter/unsubscribe", post(subscribers::unsubscribe))
        .route("/newsletter/latest", get(subscribers::latest_newsletter));

    Router::new()
        .nest("/api/v1", public_routes.merge(admin_routes))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(cors_origin))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LlmConfig;
    use crate::db::repositories::{
        ArticleRepository, SqlxArticleRepository, SqlxContentSourceRepository,
        SqlxNewsletterRepository, SqlxSessionRepository, SqlxSubscriberRepository,
    };
    use crate::db::{create_test_pool, run_migrations};
    use crate::services::summarizer::{ChatApi, ChatCompletion, ChatRequest};
    use crate::services::{
        ArticleService, AuthService, NewsletterService, SourceService, SubscriberService,
        SummarizerError, SummarizerService, UrlProbe,
    };
    use async_trait::async_trait;
    use axum_test::TestServer;
    use serde_json::{json, Value};
    use std::sync::Arc;

    struct AlwaysUp;

    #[async_trait]
    impl UrlProbe for AlwaysUp {
        async fn check(&self, _url: &str) -> Result<(), String> {
            Ok(())
        }
    }

    struct EchoApi;

    #[async_trait]
    impl ChatApi for EchoApi {
        async fn chat(&self, _request: ChatRequest) -> Result<ChatCompletion, SummarizerError> {
            Ok(ChatCompletion {
                content: "A brief summary.".to_string(),
                model: "test/model".to_string(),
            })
        }
    }

    async fn test_server() -> TestServer {
        let pool = create_test_pool().await.unwrap();
        run_migrations(&pool).await.unwrap();

        let article_repo: Arc<dyn ArticleRepository> =
            Arc::new(SqlxArticleRepository::new(pool.clone()));
        let summarizer = Arc::new(SummarizerService::new(
            Arc::new(EchoApi),
            LlmConfig::default(),
        ));

        let state = AppState {
            auth: Arc::new(AuthService::new(
                Arc::new(SqlxSessionRepository::new(pool.clone())),
                Some("test-secret".to_string()),
                24,
            )),
            sources: Arc::new(SourceService::new(
                Arc::new(SqlxContentSourceRepository::new(pool.clone())),
                Arc::new(AlwaysUp),
            )),
            newsletters: Arc::new(NewsletterService::new(
                Arc::new(SqlxNewsletterRepository::new(pool.clone())),
                article_repo.clone(),
            )),
            subscribers: Arc::new(SubscriberService::new(Arc::new(
                SqlxSubscriberRepository::new(pool),
            ))),
            articles: Arc::new(ArticleService::new(article_repo, summarizer)),
        };

        TestServer::new(build_router(state, "*")).unwrap()
    }

    async fn login(server: &TestServer) -> String {
        let response = server
            .post("/api/v1/admin/login")
            .json(&json!({ "password": "test-secret" }))
            .await;
        response.assert_status_ok();
        response.json::<Value>()["token"]
            .as_str()
            .unwrap()
            .to_string()
    }

    #[tokio::test]
    async fn test_login_rejects_bad_password() {
        let server = test_server().await;

        let response = server
            .post("/api/v1/admin/login")
            .json(&json!({ "password": "wrong" }))
            .await;
        response.assert_status_unauthorized();

        let body = response.json::<Value>();
        assert_eq!(body["error"]["code"], "UNAUTHORIZED");
    }

    #[tokio::test]
    async fn test_admin_routes_require_token() {
        let server = test_server().await;

        let response = server.get("/api/v1/admin/sources").await;
        response.assert_status_unauthorized();

        let response = server
            .get("/api/v1/admin/sources")
            .authorization_bearer("bogus-token")
            .await;
        response.assert_status_unauthorized();
    }

    #[tokio::test]
    async fn test_source_crud_over_http() {
        let server = test_server().await;
        let token = login(&server).await;

        let response = server
            .post("/api/v1/admin/sources")
            .authorization_bearer(&token)
            .json(&json!({ "name": "USGS", "url": "https://usgs.example/feed" }))
            .await;
        response.assert_status(axum::http::StatusCode::CREATED);
        let id = response.json::<Value>()["id"].as_str().unwrap().to_string();

        let response = server
            .put(&format!("/api/v1/admin/sources/{}", id))
            .authorization_bearer(&token)
            .json(&json!({ "name": "USGS Feeds" }))
            .await;
        response.assert_status_ok();
        assert_eq!(response.json::<Value>()["name"], "USGS Feeds");

        let response = server
            .delete(&format!("/api/v1/admin/sources/{}", id))
            .authorization_bearer(&token)
            .await;
        response.assert_status(axum::http::StatusCode::NO_CONTENT);
    }

    #[tokio::test]
    async fn test_subscribe_flow_and_validation() {
        let server = test_server().await;

        let response = server
            .post("/api/v1/newsletter/subscribe")
            .json(&json!({ "email": "ada@example.com" }))
            .await;
        response.assert_status_ok();
        assert_eq!(response.json::<Value>()["status"], "subscribed");

        let response = server
            .post("/api/v1/newsletter/subscribe")
            .json(&json!({ "email": "ada@example.com" }))
            .await;
        response.assert_status_ok();
        assert_eq!(response.json::<Value>()["status"], "already_subscribed");

        let response = server
            .post("/api/v1/newsletter/subscribe")
            .json(&json!({ "email": "not-an-email" }))
            .await;
        response.assert_status_bad_request();

        let response = server
            .post("/api/v1/newsletter/unsubscribe")
            .json(&json!({ "email": "ghost@example.com" }))
            .await;
        response.assert_status_not_found();
    }

    #[tokio::test]
    async fn test_article_search_degrades_to_empty_list() {
        let server = test_server().await;
        let token = login(&server).await;

        // EchoApi replies with prose, not JSON, so the search yields nothing.
        let response = server
            .post("/api/v1/admin/articles/search")
            .authorization_bearer(&token)
            .json(&json!({ "topic": "volcanoes" }))
            .await;
        response.assert_status_ok();
        assert_eq!(response.json::<Value>().as_array().unwrap().len(), 0);

        let response = server
            .post("/api/v1/admin/articles/search")
            .authorization_bearer(&token)
            .json(&json!({ "topic": "  " }))
            .await;
        response.assert_status_bad_request();
    }

    #[tokio::test]
    async fn test_newsletter_lifecycle_end_to_end() {
        let server = test_server().await;
        let token = login(&server).await;

        // Manual article entry; content goes through the summarizer.
        let response = server
            .post("/api/v1/admin/articles")
            .authorization_bearer(&token)
            .json(&json!({
                "title": "Subduction zone imaged in detail",
                "source_url": "https://example.com/subduction",
                "content": "Long article body ...",
                "category": "seismology"
            }))
            .await;
        response.assert_status(axum::http::StatusCode::CREATED);
        assert_eq!(response.json::<Value>()["summary"], "A brief summary.");

        let response = server
            .post("/api/v1/admin/newsletters/generate")
            .authorization_bearer(&token)
            .await;
        response.assert_status(axum::http::StatusCode::CREATED);
        let newsletter = response.json::<Value>();
        let id = newsletter["id"].as_str().unwrap().to_string();
        assert_eq!(newsletter["status"], "draft");

        let response = server
            .post(&format!("/api/v1/admin/newsletters/{}/publish", id))
            .authorization_bearer(&token)
            .await;
        response.assert_status_ok();
        assert_eq!(response.json::<Value>()["status"], "published");

        let response = server
            .get(&format!("/api/v1/admin/newsletters/{}", id))
            .authorization_bearer(&token)
            .await;
        response.assert_status_ok();
        let fetched = response.json::<Value>();
        assert_eq!(fetched["status"], "published");
        assert!(!fetched["published_at"].is_null());

        // The published issue is now publicly visible.
        let response = server
            .get("/api/v1/newsletter/latest")
            .add_query_param("category", "seismology")
            .await;
        response.assert_status_ok();
        assert_eq!(response.json::<Value>()["id"], id.as_str());
    }
}
