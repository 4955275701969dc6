//! Newsletter repository
//!
//! Database operations for newsletter issues. Sections are stored as a JSON
//! array in the row; save replaces the whole array (last write wins).

use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use crate::models::{Newsletter, NewsletterStatus, Section};
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{MySqlPool, Row, SqlitePool};
use std::sync::Arc;

/// Newsletter repository trait
#[async_trait]
pub trait NewsletterRepository: Send + Sync {
    /// Persist a new newsletter
    async fn create(&self, newsletter: &Newsletter) -> Result<Newsletter>;

    /// Get a newsletter by id
    async fn get_by_id(&self, id: &str) -> Result<Option<Newsletter>>;

    /// List all newsletters, creation time descending
    async fn list(&self) -> Result<Vec<Newsletter>>;

    /// Replace title/sections/status/timestamps of an existing newsletter
    async fn update(&self, newsletter: &Newsletter) -> Result<Newsletter>;

    /// Latest published newsletter, optionally filtered to issues containing
    /// a section whose title matches `category`
    async fn latest_published(&self, category: Option<&str>) -> Result<Option<Newsletter>>;
}

/// SQLx-based newsletter repository implementation
pub struct SqlxNewsletterRepository {
    pool: DynDatabasePool,
}

impl SqlxNewsletterRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn NewsletterRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl NewsletterRepository for SqlxNewsletterRepository {
    async fn create(&self, newsletter: &Newsletter) -> Result<Newsletter> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                create_newsletter_sqlite(self.pool.as_sqlite().unwrap(), newsletter).await
            }
            DatabaseDriver::Mysql => {
                create_newsletter_mysql(self.pool.as_mysql().unwrap(), newsletter).await
            }
        }
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<Newsletter>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                get_newsletter_sqlite(self.pool.as_sqlite().unwrap(), id).await
            }
            DatabaseDriver::Mysql => get_newsletter_mysql(self.pool.as_mysql().unwrap(), id).await,
        }
    }

    async fn list(&self) -> Result<Vec<Newsletter>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => list_newsletters_sqlite(self.pool.as_sqlite().unwrap()).await,
            DatabaseDriver::Mysql => list_newsletters_mysql(self.pool.as_mysql().unwrap()).await,
        }
    }

    async fn update(&self, newsletter: &Newsletter) -> Result<Newsletter> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                update_newsletter_sqlite(self.pool.as_sqlite().unwrap(), newsletter).await
            }
            DatabaseDriver::Mysql => {
                update_newsletter_mysql(self.pool.as_mysql().unwrap(), newsletter).await
            }
        }
    }

    async fn latest_published(&self, category: Option<&str>) -> Result<Option<Newsletter>> {
        // Category filtering happens over the decoded sections; published
        // issues are few, so scanning the list is fine. "Latest" means the
        // most recent publish timestamp, which can differ from creation
        // order when an older draft is published late.
        let all = self.list().await?;
        Ok(all
            .into_iter()
            .filter(|n| {
                n.status == NewsletterStatus::Published
                    && match category {
                        Some(cat) => n
                            .sections
                            .iter()
                            .any(|s| s.title.eq_ignore_ascii_case(cat)),
                        None => true,
                    }
            })
            .max_by_key(|n| n.published_at))
    }
}

fn encode_sections(sections: &[Section]) -> Result<String> {
    serde_json::to_string(sections).context("Failed to encode newsletter sections")
}

fn decode_sections(raw: &str) -> Vec<Section> {
    serde_json::from_str(raw).unwrap_or_default()
}

const SELECT_COLUMNS: &str = "id, title, sections, status, created_at, updated_at, published_at";

// ============================================================================
// SQLite implementations
// ============================================================================

async fn create_newsletter_sqlite(pool: &SqlitePool, n: &Newsletter) -> Result<Newsletter> {
    sqlx::query(
        r#"
        INSERT INTO newsletters (id, title, sections, status, created_at, updated_at, published_at)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&n.id)
    .bind(&n.title)
    .bind(encode_sections(&n.sections)?)
    .bind(n.status.as_str())
    .bind(n.created_at)
    .bind(n.updated_at)
    .bind(n.published_at)
    .execute(pool)
    .await
    .context("Failed to create newsletter")?;

    Ok(n.clone())
}

async fn get_newsletter_sqlite(pool: &SqlitePool, id: &str) -> Result<Option<Newsletter>> {
    let row = sqlx::query(&format!(
        "SELECT {SELECT_COLUMNS} FROM newsletters WHERE id = ?"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await
    .context("Failed to get newsletter by id")?;

    row.as_ref().map(row_to_newsletter_sqlite).transpose()
}

async fn list_newsletters_sqlite(pool: &SqlitePool) -> Result<Vec<Newsletter>> {
    let rows = sqlx::query(&format!(
        "SELECT {SELECT_COLUMNS} FROM newsletters ORDER BY created_at DESC"
    ))
    .fetch_all(pool)
    .await
    .context("Failed to list newsletters")?;

    rows.iter().map(row_to_newsletter_sqlite).collect()
}

async fn update_newsletter_sqlite(pool: &SqlitePool, n: &Newsletter) -> Result<Newsletter> {
    sqlx::query(
        r#"
        UPDATE newsletters
        SET title = ?, sections = ?, status = ?, updated_at = ?, published_at = ?
        WHERE id = ?
        "#,
    )
    .bind(&n.title)
    .bind(encode_sections(&n.sections)?)
    .bind(n.status.as_str())
    .bind(n.updated_at)
    .bind(n.published_at)
    .bind(&n.id)
    .execute(pool)
    .await
    .context("Failed to update newsletter")?;

    Ok(n.clone())
}

fn row_to_newsletter_sqlite(row: &sqlx::sqlite::SqliteRow) -> Result<Newsletter> {
    let sections: String = row.get("sections");
    let status: String = row.get("status");

    Ok(Newsletter {
        id: row.get("id"),
        title: row.get("title"),
        sections: decode_sections(&sections),
        status: NewsletterStatus::parse(&status)
            .ok_or_else(|| anyhow!("Unknown newsletter status: {}", status))?,
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
        published_at: row.get("published_at"),
    })
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn create_newsletter_mysql(pool: &MySqlPool, n: &Newsletter) -> Result<Newsletter> {
    sqlx::query(
        r#"
        INSERT INTO newsletters (id, title, sections, status, created_at, updated_at, published_at)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&n.id)
    .bind(&n.title)
    .bind(encode_sections(&n.sections)?)
    .bind(n.status.as_str())
    .bind(n.created_at)
    .bind(n.updated_at)
    .bind(n.published_at)
    .execute(pool)
    .await
    .context("Failed to create newsletter")?;

    Ok(n.clone())
}

async fn get_newsletter_mysql(pool: &MySqlPool, id: &str) -> Result<Option<Newsletter>> {
    let row = sqlx::query(&format!(
        "SELECT {SELECT_COLUMNS} FROM newsletters WHERE id = ?"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await
    .context("Failed to get newsletter by id")?;

    row.as_ref().map(row_to_newsletter_mysql).transpose()
}

async fn list_newsletters_mysql(pool: &MySqlPool) -> Result<Vec<Newsletter>> {
    let rows = sqlx::query(&format!(
        "SELECT {SELECT_COLUMNS} FROM newsletters ORDER BY created_at DESC"
    ))
    .fetch_all(pool)
    .await
    .context("Failed to list newsletters")?;

    rows.iter().map(row_to_newsletter_mysql).collect()
}

async fn update_newsletter_mysql(pool: &MySqlPool, n: &Newsletter) -> Result<Newsletter> {
    sqlx::query(
        r#"
        UPDATE newsletters
        SET title = ?, sections = ?, status = ?, updated_at = ?, published_at = ?
        WHERE id = ?
        "#,
    )
    .bind(&n.title)
    .bind(encode_sections(&n.sections)?)
    .bind(n.status.as_str())
    .bind(n.updated_at)
    .bind(n.published_at)
    .bind(&n.id)
    .execute(pool)
    .await
    .context("Failed to update newsletter")?;

    Ok(n.clone())
}

fn row_to_newsletter_mysql(row: &sqlx::mysql::MySqlRow) -> Result<Newsletter> {
    let sections: String = row.get("sections");
    let status: String = row.get("status");
    let created_at: DateTime<Utc> = row.get("created_at");
    let updated_at: DateTime<Utc> = row.get("updated_at");
    let published_at: Option<DateTime<Utc>> = row.get("published_at");

    Ok(Newsletter {
        id: row.get("id"),
        title: row.get("title"),
        sections: decode_sections(&sections),
        status: NewsletterStatus::parse(&status)
            .ok_or_else(|| anyhow!("Unknown newsletter status: {}", status))?,
        created_at,
        updated_at,
        published_at,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_test_pool, migrations};

    async fn setup_test_repo() -> SqlxNewsletterRepository {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        SqlxNewsletterRepository::new(pool)
    }

    fn sample_newsletter(title: &str) -> Newsletter {
        Newsletter::draft(
            title,
            vec![
                Section::new("Seismology", "quakes this week"),
                Section::new("Volcanology", "eruption watch"),
            ],
        )
    }

    #[tokio::test]
    async fn test_create_and_get_roundtrips_sections() {
        let repo = setup_test_repo().await;
        let newsletter = sample_newsletter("GeoBit Weekly #1");

        repo.create(&newsletter).await.expect("Failed to create");

        let found = repo
            .get_by_id(&newsletter.id)
            .await
            .expect("Failed to get")
            .expect("Newsletter not found");
        assert_eq!(found.sections, newsletter.sections);
        assert_eq!(found.status, NewsletterStatus::Draft);
        assert!(found.published_at.is_none());
    }

    #[tokio::test]
    async fn test_list_creation_time_descending() {
        let repo = setup_test_repo().await;

        let mut first = sample_newsletter("older");
        first.created_at = Utc::now() - chrono::Duration::days(1);
        first.updated_at = first.created_at;
        let second = sample_newsletter("newer");

        repo.create(&first).await.expect("Failed to create");
        repo.create(&second).await.expect("Failed to create");

        let all = repo.list().await.expect("Failed to list");
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].title, "newer");
        assert_eq!(all[1].title, "older");
    }

    #[tokio::test]
    async fn test_update_replaces_sections_whole() {
        let repo = setup_test_repo().await;
        let mut newsletter = sample_newsletter("issue");
        repo.create(&newsletter).await.expect("Failed to create");

        let victim = newsletter.sections[0].id.clone();
        newsletter.remove_section(&victim);
        newsletter.title = "issue (edited)".to_string();
        newsletter.updated_at = Utc::now();
        repo.update(&newsletter).await.expect("Failed to update");

        let found = repo.get_by_id(&newsletter.id).await.unwrap().unwrap();
        assert_eq!(found.title, "issue (edited)");
        assert_eq!(found.sections.len(), 1);
    }

    #[tokio::test]
    async fn test_latest_published_filters_drafts() {
        let repo = setup_test_repo().await;

        let draft = sample_newsletter("draft issue");
        repo.create(&draft).await.expect("Failed to create");

        assert!(repo.latest_published(None).await.unwrap().is_none());

        let mut published = sample_newsletter("published issue");
        published.status = NewsletterStatus::Published;
        published.published_at = Some(Utc::now());
        repo.create(&published).await.expect("Failed to create");

        let latest = repo
            .latest_published(None)
            .await
            .unwrap()
            .expect("Should find published issue");
        assert_eq!(latest.title, "published issue");
    }

    #[tokio::test]
    async fn test_latest_published_orders_by_publish_time() {
        let repo = setup_test_repo().await;
        let now = Utc::now();

        // Created second, published first.
        let mut early_publish = sample_newsletter("published early");
        early_publish.status = NewsletterStatus::Published;
        early_publish.published_at = Some(now - chrono::Duration::days(2));
        repo.create(&early_publish).await.expect("Failed to create");

        // Created first, but the draft sat around and was published last.
        let mut late_publish = sample_newsletter("published late");
        late_publish.created_at = now - chrono::Duration::days(7);
        late_publish.updated_at = late_publish.created_at;
        late_publish.status = NewsletterStatus::Published;
        late_publish.published_at = Some(now);
        repo.create(&late_publish).await.expect("Failed to create");

        let latest = repo
            .latest_published(None)
            .await
            .unwrap()
            .expect("Should find published issue");
        assert_eq!(latest.title, "published late");
    }

    #[tokio::test]
    async fn test_latest_published_category_filter() {
        let repo = setup_test_repo().await;

        let mut published = sample_newsletter("issue");
        published.status = NewsletterStatus::Published;
        published.published_at = Some(Utc::now());
        repo.create(&published).await.expect("Failed to create");

        assert!(repo
            .latest_published(Some("seismology"))
            .await
            .unwrap()
            .is_some());
        assert!(repo
            .latest_published(Some("glaciology"))
            .await
            .unwrap()
            .is_none());
    }
}
