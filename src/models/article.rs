//! Article model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A summarized article, produced by manual admin entry or by the summarizer.
/// Referenced by id from newsletter sections.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Article {
    /// Unique identifier
    #[serde(default = "new_article_id")]
    pub id: String,
    /// Article title
    pub title: String,
    /// Original source URL
    pub source_url: String,
    /// Summary text
    pub summary: String,
    /// Category tag
    pub category: String,
    /// Original publication timestamp
    #[serde(default = "Utc::now")]
    pub published_at: DateTime<Utc>,
    /// Relevance score assigned at ingestion, 0.0..=1.0
    #[serde(default)]
    pub interest_score: f64,
}

fn new_article_id() -> String {
    Uuid::new_v4().to_string()
}

impl Article {
    pub fn new(
        title: impl Into<String>,
        source_url: impl Into<String>,
        summary: impl Into<String>,
        category: impl Into<String>,
    ) -> Self {
        Self {
            id: new_article_id(),
            title: title.into(),
            source_url: source_url.into(),
            summary: summary.into(),
            category: category.into(),
            published_at: Utc::now(),
            interest_score: 0.0,
        }
    }

    pub fn with_interest_score(mut self, score: f64) -> Self {
        self.interest_score = score.clamp(0.0, 1.0);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interest_score_clamped() {
        let article = Article::new("t", "https://example.com", "s", "volcanology")
            .with_interest_score(1.7);
        assert_eq!(article.interest_score, 1.0);

        let article = Article::new("t", "https://example.com", "s", "volcanology")
            .with_interest_score(-0.3);
        assert_eq!(article.interest_score, 0.0);
    }

    #[test]
    fn test_deserialize_fills_defaults() {
        let article: Article = serde_json::from_str(
            r#"{"title":"Quake swarm","source_url":"https://example.com/a","summary":"...","category":"seismology"}"#,
        )
        .expect("should parse");
        assert!(!article.id.is_empty());
        assert_eq!(article.interest_score, 0.0);
    }
}
