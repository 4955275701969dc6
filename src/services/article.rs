use std::sync::Arc;

use thiserror::Error;

use crate::db::repositories::ArticleRepository;
use crate::models::Article;
use crate::services::summarizer::{SummarizerError, SummarizerService};

#[derive(Debug, Error)]
pub enum ArticleError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error(transparent)]
    Upstream(#[from] SummarizerError),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

/// Input for manual article entry. Supply either a ready summary or raw
/// content; raw content goes through the summarizer.
#[derive(Debug, Clone)]
pub struct NewArticleInput {
    pub title: String,
    pub source_url: String,
    pub summary: Option<String>,
    pub content: Option<String>,
    pub category: String,
    pub max_length: u32,
    pub interest_score: f64,
}

/// Article entry and lookup, backed by the summarizer for raw content and
/// topic search.
pub struct ArticleService {
    articles: Arc<dyn ArticleRepository>,
    summarizer: Arc<SummarizerService>,
}

impl ArticleService {
    pub fn new(articles: Arc<dyn ArticleRepository>, summarizer: Arc<SummarizerService>) -> Self {
        Self {
            articles,
            summarizer,
        }
    }

    /// Validate and store a manually entered article, summarizing raw
    /// content when no summary was supplied.
    pub async fn create(&self, input: NewArticleInput) -> Result<Article, ArticleError> {
        if input.title.trim().is_empty() {
            return Err(ArticleError::InvalidInput("Title cannot be empty".to_string()));
        }

        let summary = match (input.summary, input.content) {
            (Some(summary), _) => summary,
            (None, Some(content)) => {
                self.summarizer
                    .summarize(&content, input.max_length)
                    .await?
                    .summary
            }
            (None, None) => {
                return Err(ArticleError::InvalidInput(
                    "Either summary or content is required".to_string(),
                ));
            }
        };

        let article = Article::new(input.title, input.source_url, summary, input.category)
            .with_interest_score(input.interest_score);
        let article = self.articles.create(&article).await?;

        tracing::info!("Stored article {} ({})", article.id, article.category);
        Ok(article)
    }

    /// Web-search for candidate articles on a topic. Results are not
    /// persisted; unusable model output comes back as an empty list.
    pub async fn search(&self, topic: &str) -> Result<Vec<Article>, ArticleError> {
        let topic = topic.trim();
        if topic.is_empty() {
            return Err(ArticleError::InvalidInput("Topic cannot be empty".to_string()));
        }
        Ok(self.summarizer.search(topic).await?)
    }
}
