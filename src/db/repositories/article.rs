//! Article repository
//!
//! Database operations for summarized articles, the raw material newsletter
//! drafts are assembled from.

use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use crate::models::Article;
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{MySqlPool, Row, SqlitePool};
use std::sync::Arc;

/// Article repository trait
#[async_trait]
pub trait ArticleRepository: Send + Sync {
    /// Persist a new article
    async fn create(&self, article: &Article) -> Result<Article>;

    /// Most recent articles, publication time descending
    async fn recent(&self, limit: i64) -> Result<Vec<Article>>;
}

/// SQLx-based article repository implementation
pub struct SqlxArticleRepository {
    pool: DynDatabasePool,
}

impl SqlxArticleRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn ArticleRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl ArticleRepository for SqlxArticleRepository {
    async fn create(&self, article: &Article) -> Result<Article> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                create_article_sqlite(self.pool.as_sqlite().unwrap(), article).await
            }
            DatabaseDriver::Mysql => {
                create_article_mysql(self.pool.as_mysql().unwrap(), article).await
            }
        }
    }

    async fn recent(&self, limit: i64) -> Result<Vec<Article>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                recent_articles_sqlite(self.pool.as_sqlite().unwrap(), limit).await
            }
            DatabaseDriver::Mysql => {
                recent_articles_mysql(self.pool.as_mysql().unwrap(), limit).await
            }
        }
    }
}

const SELECT_COLUMNS: &str =
    "id, title, source_url, summary, category, published_at, interest_score";

// ============================================================================
// SQLite implementations
// ============================================================================

async fn create_article_sqlite(pool: &SqlitePool, article: &Article) -> Result<Article> {
    sqlx::query(
        r#"
        INSERT INTO articles (id, title, source_url, summary, category, published_at, interest_score)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&article.id)
    .bind(&article.title)
    .bind(&article.source_url)
    .bind(&article.summary)
    .bind(&article.category)
    .bind(article.published_at)
    .bind(article.interest_score)
    .execute(pool)
    .await
    .context("Failed to create article")?;

    Ok(article.clone())
}

async fn recent_articles_sqlite(pool: &SqlitePool, limit: i64) -> Result<Vec<Article>> {
    let rows = sqlx::query(&format!(
        "SELECT {SELECT_COLUMNS} FROM articles ORDER BY published_at DESC LIMIT ?"
    ))
    .bind(limit)
    .fetch_all(pool)
    .await
    .context("Failed to list recent articles")?;

    rows.iter().map(row_to_article_sqlite).collect()
}

fn row_to_article_sqlite(row: &sqlx::sqlite::SqliteRow) -> Result<Article> {
    Ok(Article {
        id: row.get("id"),
        title: row.get("title"),
        source_url: row.get("source_url"),
        summary: row.get("summary"),
        category: row.get("category"),
        published_at: row.get("published_at"),
        interest_score: row.get("interest_score"),
    })
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn create_article_mysql(pool: &MySqlPool, article: &Article) -> Result<Article> {
    sqlx::query(
        r#"
        INSERT INTO articles (id, title, source_url, summary, category, published_at, interest_score)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&article.id)
    .bind(&article.title)
    .bind(&article.source_url)
    .bind(&article.summary)
    .bind(&article.category)
    .bind(article.published_at)
    .bind(article.interest_score)
    .execute(pool)
    .await
    .context("Failed to create article")?;

    Ok(article.clone())
}

async fn recent_articles_mysql(pool: &MySqlPool, limit: i64) -> Result<Vec<Article>> {
    let rows = sqlx::query(&format!(
        "SELECT {SELECT_COLUMNS} FROM articles ORDER BY published_at DESC LIMIT ?"
    ))
    .bind(limit)
    .fetch_all(pool)
    .await
    .context("Failed to list recent articles")?;

    rows.iter().map(row_to_article_mysql).collect()
}

fn row_to_article_mysql(row: &sqlx::mysql::MySqlRow) -> Result<Article> {
    let published_at: DateTime<Utc> = row.get("published_at");

    Ok(Article {
        id: row.get("id"),
        title: row.get("title"),
        source_url: row.get("source_url"),
        summary: row.get("summary"),
        category: row.get("category"),
        published_at,
        interest_score: row.get("interest_score"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_test_pool, migrations};

    async fn setup_test_repo() -> SqlxArticleRepository {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        SqlxArticleRepository::new(pool)
    }

    #[tokio::test]
    async fn test_create_and_recent() {
        let repo = setup_test_repo().await;

        for i in 0..3 {
            let mut article = Article::new(
                format!("Article {}", i),
                format!("https://example.com/{}", i),
                "summary",
                "seismology",
            )
            .with_interest_score(0.5);
            article.published_at = Utc::now() - chrono::Duration::hours(i);
            repo.create(&article).await.expect("Failed to create");
        }

        let recent = repo.recent(2).await.expect("Failed to query");
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].title, "Article 0");
        assert_eq!(recent[0].interest_score, 0.5);
    }

    #[tokio::test]
    async fn test_recent_empty_store() {
        let repo = setup_test_repo().await;
        let recent = repo.recent(10).await.expect("Failed to query");
        assert!(recent.is_empty());
    }
}
