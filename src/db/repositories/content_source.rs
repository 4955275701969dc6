//! Content source repository
//!
//! Database operations for registered scrape/feed sources.

use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use crate::models::ContentSource;
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{MySqlPool, Row, SqlitePool};
use std::sync::Arc;

/// Content source repository trait
#[async_trait]
pub trait ContentSourceRepository: Send + Sync {
    /// List all sources, newest first
    async fn list(&self) -> Result<Vec<ContentSource>>;

    /// Get a source by id
    async fn get_by_id(&self, id: &str) -> Result<Option<ContentSource>>;

    /// Persist a new source
    async fn create(&self, source: &ContentSource) -> Result<ContentSource>;

    /// Replace a source's mutable fields
    async fn update(&self, source: &ContentSource) -> Result<ContentSource>;

    /// Delete by id; deleting a nonexistent id is a no-op
    async fn delete(&self, id: &str) -> Result<()>;
}

/// SQLx-based content source repository implementation
pub struct SqlxContentSourceRepository {
    pool: DynDatabasePool,
}

impl SqlxContentSourceRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn ContentSourceRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl ContentSourceRepository for SqlxContentSourceRepository {
    async fn list(&self) -> Result<Vec<ContentSource>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => list_sources_sqlite(self.pool.as_sqlite().unwrap()).await,
            DatabaseDriver::Mysql => list_sources_mysql(self.pool.as_mysql().unwrap()).await,
        }
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<ContentSource>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => get_source_sqlite(self.pool.as_sqlite().unwrap(), id).await,
            DatabaseDriver::Mysql => get_source_mysql(self.pool.as_mysql().unwrap(), id).await,
        }
    }

    async fn create(&self, source: &ContentSource) -> Result<ContentSource> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                create_source_sqlite(self.pool.as_sqlite().unwrap(), source).await
            }
            DatabaseDriver::Mysql => {
                create_source_mysql(self.pool.as_mysql().unwrap(), source).await
            }
        }
    }

    async fn update(&self, source: &ContentSource) -> Result<ContentSource> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                update_source_sqlite(self.pool.as_sqlite().unwrap(), source).await
            }
            DatabaseDriver::Mysql => {
                update_source_mysql(self.pool.as_mysql().unwrap(), source).await
            }
        }
    }

    async fn delete(&self, id: &str) -> Result<()> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                sqlx::query("DELETE FROM content_sources WHERE id = ?")
                    .bind(id)
                    .execute(self.pool.as_sqlite().unwrap())
                    .await
                    .context("Failed to delete content source")?;
            }
            DatabaseDriver::Mysql => {
                sqlx::query("DELETE FROM content_sources WHERE id = ?")
                    .bind(id)
                    .execute(self.pool.as_mysql().unwrap())
                    .await
                    .context("Failed to delete content source")?;
            }
        }
        Ok(())
    }
}

const SELECT_COLUMNS: &str =
    "id, name, url, category, scrape_selector, active, created_at, updated_at";

// ============================================================================
// SQLite implementations
// ============================================================================

async fn list_sources_sqlite(pool: &SqlitePool) -> Result<Vec<ContentSource>> {
    let rows = sqlx::query(&format!(
        "SELECT {SELECT_COLUMNS} FROM content_sources ORDER BY created_at DESC"
    ))
    .fetch_all(pool)
    .await
    .context("Failed to list content sources")?;

    rows.iter().map(row_to_source_sqlite).collect()
}

async fn get_source_sqlite(pool: &SqlitePool, id: &str) -> Result<Option<ContentSource>> {
    let row = sqlx::query(&format!(
        "SELECT {SELECT_COLUMNS} FROM content_sources WHERE id = ?"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await
    .context("Failed to get content source by id")?;

    row.as_ref().map(row_to_source_sqlite).transpose()
}

async fn create_source_sqlite(pool: &SqlitePool, source: &ContentSource) -> Result<ContentSource> {
    sqlx::query(
        r#"
        INSERT INTO content_sources (id, name, url, category, scrape_selector, active, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&source.id)
    .bind(&source.name)
    .bind(&source.url)
    .bind(&source.category)
    .bind(&source.scrape_selector)
    .bind(source.active)
    .bind(source.created_at)
    .bind(source.updated_at)
    .execute(pool)
    .await
    .context("Failed to create content source")?;

    Ok(source.clone())
}

async fn update_source_sqlite(pool: &SqlitePool, source: &ContentSource) -> Result<ContentSource> {
    sqlx::query(
        r#"
        UPDATE content_sources
        SET name = ?, url = ?, category = ?, scrape_selector = ?, active = ?, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(&source.name)
    .bind(&source.url)
    .bind(&source.category)
    .bind(&source.scrape_selector)
    .bind(source.active)
    .bind(source.updated_at)
    .bind(&source.id)
    .execute(pool)
    .await
    .context("Failed to update content source")?;

    Ok(source.clone())
}

fn row_to_source_sqlite(row: &sqlx::sqlite::SqliteRow) -> Result<ContentSource> {
    Ok(ContentSource {
        id: row.get("id"),
        name: row.get("name"),
        url: row.get("url"),
        category: row.get("category"),
        scrape_selector: row.get("scrape_selector"),
        active: row.get("active"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn list_sources_mysql(pool: &MySqlPool) -> Result<Vec<ContentSource>> {
    let rows = sqlx::query(&format!(
        "SELECT {SELECT_COLUMNS} FROM content_sources ORDER BY created_at DESC"
    ))
    .fetch_all(pool)
    .await
    .context("Failed to list content sources")?;

    rows.iter().map(row_to_source_mysql).collect()
}

async fn get_source_mysql(pool: &MySqlPool, id: &str) -> Result<Option<ContentSource>> {
    let row = sqlx::query(&format!(
        "SELECT {SELECT_COLUMNS} FROM content_sources WHERE id = ?"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await
    .context("Failed to get content source by id")?;

    row.as_ref().map(row_to_source_mysql).transpose()
}

async fn create_source_mysql(pool: &MySqlPool, source: &ContentSource) -> Result<ContentSource> {
    sqlx::query(
        r#"
        INSERT INTO content_sources (id, name, url, category, scrape_selector, active, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&source.id)
    .bind(&source.name)
    .bind(&source.url)
    .bind(&source.category)
    .bind(&source.scrape_selector)
    .bind(source.active)
    .bind(source.created_at)
    .bind(source.updated_at)
    .execute(pool)
    .await
    .context("Failed to create content source")?;

    Ok(source.clone())
}

async fn update_source_mysql(pool: &MySqlPool, source: &ContentSource) -> Result<ContentSource> {
    sqlx::query(
        r#"
        UPDATE content_sources
        SET name = ?, url = ?, category = ?, scrape_selector = ?, active = ?, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(&source.name)
    .bind(&source.url)
    .bind(&source.category)
    .bind(&source.scrape_selector)
    .bind(source.active)
    .bind(source.updated_at)
    .bind(&source.id)
    .execute(pool)
    .await
    .context("Failed to update content source")?;

    Ok(source.clone())
}

fn row_to_source_mysql(row: &sqlx::mysql::MySqlRow) -> Result<ContentSource> {
    let created_at: DateTime<Utc> = row.get("created_at");
    let updated_at: DateTime<Utc> = row.get("updated_at");

    Ok(ContentSource {
        id: row.get("id"),
        name: row.get("name"),
        url: row.get("url"),
        category: row.get("category"),
        scrape_selector: row.get("scrape_selector"),
        active: row.get("active"),
        created_at,
        updated_at,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_test_pool, migrations};
    use crate::models::{CreateSourceInput, UpdateSourceInput};

    async fn setup_test_repo() -> SqlxContentSourceRepository {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        SqlxContentSourceRepository::new(pool)
    }

    fn sample_source(name: &str) -> ContentSource {
        ContentSource::new(CreateSourceInput {
            name: name.to_string(),
            url: format!("https://{}.example.com", name),
            category: Some("journals".to_string()),
            scrape_selector: None,
        })
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let repo = setup_test_repo().await;
        let source = sample_source("nature");

        repo.create(&source).await.expect("Failed to create");

        let found = repo
            .get_by_id(&source.id)
            .await
            .expect("Failed to get")
            .expect("Source not found");
        assert_eq!(found.name, "nature");
        assert!(found.active);
    }

    #[tokio::test]
    async fn test_list_newest_first() {
        let repo = setup_test_repo().await;

        let mut older = sample_source("older");
        older.created_at = Utc::now() - chrono::Duration::hours(2);
        let newer = sample_source("newer");

        repo.create(&older).await.expect("Failed to create older");
        repo.create(&newer).await.expect("Failed to create newer");

        let sources = repo.list().await.expect("Failed to list");
        assert_eq!(sources.len(), 2);
        assert_eq!(sources[0].name, "newer");
    }

    #[tokio::test]
    async fn test_update_persists_changes() {
        let repo = setup_test_repo().await;
        let mut source = sample_source("nature");
        repo.create(&source).await.expect("Failed to create");

        source.apply(UpdateSourceInput {
            name: Some("Nature Geoscience".to_string()),
            active: Some(false),
            ..Default::default()
        });
        repo.update(&source).await.expect("Failed to update");

        let found = repo
            .get_by_id(&source.id)
            .await
            .expect("Failed to get")
            .expect("Source not found");
        assert_eq!(found.name, "Nature Geoscience");
        assert!(!found.active);
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let repo = setup_test_repo().await;
        let source = sample_source("nature");
        repo.create(&source).await.expect("Failed to create");

        repo.delete(&source.id).await.expect("Failed to delete");
        assert!(repo.get_by_id(&source.id).await.unwrap().is_none());

        // Second delete of the same id succeeds
        repo.delete(&source.id).await.expect("Repeat delete should succeed");
        // So does deleting an id that never existed
        repo.delete("never-existed").await.expect("Unknown delete should succeed");
    }
}
