use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Utc;
use thiserror::Error;

use crate::db::repositories::{ArticleRepository, NewsletterRepository};
use crate::models::{Article, Newsletter, NewsletterStatus, Section};
use crate::services::summarizer::SummarizerService;

/// How many recent articles a generated draft draws from.
const GENERATE_ARTICLE_LIMIT: i64 = 20;

#[derive(Debug, Error)]
pub enum NewsletterError {
    #[error("Newsletter not found")]
    NotFound,

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

/// Draft/publish workflow for newsletter issues.
pub struct NewsletterService {
    newsletters: Arc<dyn NewsletterRepository>,
    articles: Arc<dyn ArticleRepository>,
    summarizer: Option<Arc<SummarizerService>>,
}

impl NewsletterService {
    pub fn new(
        newsletters: Arc<dyn NewsletterRepository>,
        articles: Arc<dyn ArticleRepository>,
    ) -> Self {
        Self {
            newsletters,
            articles,
            summarizer: None,
        }
    }

    /// Attach a summarizer used for title suggestions during generation.
    pub fn with_summarizer(mut self, summarizer: Arc<SummarizerService>) -> Self {
        self.summarizer = Some(summarizer);
        self
    }

    /// Assemble a new draft from recently summarized articles. With no
    /// articles on hand the draft still gets a placeholder section so the
    /// editor has something to work from.
    pub async fn generate(&self) -> Result<Newsletter, NewsletterError> {
        let articles = self.articles.recent(GENERATE_ARTICLE_LIMIT).await?;

        let sections = if articles.is_empty() {
            vec![Section::new(
                "Editor's note",
                "No summarized articles were available for this issue.",
            )]
        } else {
            sections_from_articles(&articles)
        };
        let mut newsletter = Newsletter::draft(default_title(), sections);

        if let Some(summarizer) = &self.summarizer {
            if !articles.is_empty() {
                match summarizer.suggest_title(&articles).await {
                    Ok(title) if !title.is_empty() => newsletter.title = title,
                    Ok(_) => {}
                    Err(e) => tracing::warn!("Title suggestion failed, using default: {}", e),
                }
            }
        }

        self.newsletters.create(&newsletter).await?;
        tracing::info!(
            "Generated newsletter draft {} with {} sections",
            newsletter.id,
            newsletter.sections.len()
        );
        Ok(newsletter)
    }

    pub async fn get(&self, id: &str) -> Result<Newsletter, NewsletterError> {
        self.newsletters
            .get_by_id(id)
            .await?
            .ok_or(NewsletterError::NotFound)
    }

    pub async fn list(&self) -> Result<Vec<Newsletter>, NewsletterError> {
        Ok(self.newsletters.list().await?)
    }

    /// Full-document save of title and sections. Last writer wins; there is
    /// no merge of concurrent edits. Status and publish timestamp are kept
    /// from the stored copy.
    pub async fn save(
        &self,
        id: &str,
        title: String,
        sections: Vec<Section>,
    ) -> Result<Newsletter, NewsletterError> {
        let mut newsletter = self
            .newsletters
            .get_by_id(id)
            .await?
            .ok_or(NewsletterError::NotFound)?;

        newsletter.title = title;
        newsletter.sections = sections;
        newsletter.updated_at = Utc::now();
        self.newsletters.update(&newsletter).await?;
        Ok(newsletter)
    }

    /// Mark a draft as published. Publishing an already-published issue
    /// succeeds without touching the original publish timestamp.
    pub async fn publish(&self, id: &str) -> Result<Newsletter, NewsletterError> {
        let mut newsletter = self
            .newsletters
            .get_by_id(id)
            .await?
            .ok_or(NewsletterError::NotFound)?;

        if newsletter.status == NewsletterStatus::Published {
            return Ok(newsletter);
        }

        newsletter.status = NewsletterStatus::Published;
        newsletter.published_at = Some(Utc::now());
        newsletter.updated_at = Utc::now();
        self.newsletters.update(&newsletter).await?;

        tracing::info!("Published newsletter {}", newsletter.id);
        Ok(newsletter)
    }

    /// Most recently published issue, optionally restricted to issues with
    /// a section matching the category.
    pub async fn latest_published(
        &self,
        category: Option<&str>,
    ) -> Result<Newsletter, NewsletterError> {
        self.newsletters
            .latest_published(category)
            .await?
            .ok_or(NewsletterError::NotFound)
    }
}

fn default_title() -> String {
    format!("GeoBit Weekly — {}", Utc::now().format("%B %-d, %Y"))
}

/// Group articles by category, one section per category in alphabetical
/// order, highest-interest articles first within a section.
fn sections_from_articles(articles: &[Article]) -> Vec<Section> {
    let mut by_category: BTreeMap<String, Vec<&Article>> = BTreeMap::new();
    for article in articles {
        by_category
            .entry(article.category.clone())
            .or_default()
            .push(article);
    }

    by_category
        .into_iter()
        .map(|(category, mut group)| {
            group.sort_by(|a, b| {
                b.interest_score
                    .partial_cmp(&a.interest_score)
                    .unwrap_or(std::cmp::Ordering::Equal)
            });
            let content = group
                .iter()
                .map(|a| format!("{}\n{}\n{}", a.title, a.summary, a.source_url))
                .collect::<Vec<_>>()
                .join("\n\n");
            Section::new(category, content)
        })
        .collect()
}
