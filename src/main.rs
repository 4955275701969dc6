//! GeoBit - Newsletter content management backend

use anyhow::Result;
use std::path::Path;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use geobit::{
    api::{self, AppState},
    config::Config,
    db::{
        self,
        repositories::{
            ArticleRepository, SqlxArticleRepository, SqlxContentSourceRepository,
            SqlxNewsletterRepository, SqlxSessionRepository, SqlxSubscriberRepository,
        },
    },
    services::{
        summarizer::HttpChatApi, ArticleService, AuthService, HttpProbe, NewsletterService,
        SourceService, SubscriberService, SummarizerService,
    },
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "geobit=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting GeoBit backend...");

    // Load configuration (file + GEOBIT_* environment overrides)
    let config = Config::load_with_env(Path::new("config.yml"))?;
    tracing::info!("Configuration loaded");

    if config.admin.secret.is_none() {
        tracing::warn!("No admin secret configured; development password is active");
    }

    // Initialize database
    let pool = db::create_pool(&config.database).await?;
    tracing::info!("Database connected: {:?}", config.database.driver);

    // Run migrations
    db::run_migrations(&pool).await?;
    tracing::info!("Database migrations completed");

    // Create repositories
    let session_repo = Arc::new(SqlxSessionRepository::new(pool.clone()));
    let source_repo = Arc::new(SqlxContentSourceRepository::new(pool.clone()));
    let newsletter_repo = Arc::new(SqlxNewsletterRepository::new(pool.clone()));
    let subscriber_repo = Arc::new(SqlxSubscriberRepository::new(pool.clone()));
    let article_repo: Arc<dyn ArticleRepository> = Arc::new(SqlxArticleRepository::new(pool));

    // Initialize services
    let auth = Arc::new(AuthService::new(
        session_repo,
        config.admin.secret.clone(),
        config.admin.session_ttl_hours,
    ));
    let sources = Arc::new(SourceService::new(source_repo, Arc::new(HttpProbe::new())));
    let summarizer = Arc::new(SummarizerService::new(
        Arc::new(HttpChatApi::new(&config.llm)),
        config.llm.clone(),
    ));
    let newsletters = Arc::new(
        NewsletterService::new(newsletter_repo, article_repo.clone())
            .with_summarizer(summarizer.clone()),
    );
    let subscribers = Arc::new(SubscriberService::new(subscriber_repo));
    let articles = Arc::new(ArticleService::new(article_repo, summarizer));

    let state = AppState {
        auth,
        sources,
        newsletters,
        subscribers,
        articles,
    };

    // Build router
    let app = api::build_router(state, &config.server.cors_origin);

    // Start server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
