//! Subscriber repository
//!
//! Database operations for subscriber email records. Email uniqueness is
//! backed by a store-level UNIQUE index; `create` surfaces violations as a
//! dedicated error so the service can report `already_subscribed` even when
//! two signups race past the existence check.

use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use crate::models::{Subscriber, SubscriberStatus};
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{MySqlPool, Row, SqlitePool};
use std::sync::Arc;

/// Error kind for unique-constraint violations on email
#[derive(Debug, thiserror::Error)]
#[error("Subscriber email already exists")]
pub struct DuplicateEmail;

/// Subscriber repository trait
#[async_trait]
pub trait SubscriberRepository: Send + Sync {
    /// Insert a new subscriber; fails with a `DuplicateEmail` source error
    /// when the email is already registered.
    async fn create(&self, subscriber: &Subscriber) -> Result<Subscriber>;

    /// Look up a subscriber by exact email match
    async fn get_by_email(&self, email: &str) -> Result<Option<Subscriber>>;

    /// Replace a subscriber's mutable fields
    async fn update(&self, subscriber: &Subscriber) -> Result<Subscriber>;

    /// Paginated list ordered by subscription time descending
    async fn list(&self, limit: i64, offset: i64) -> Result<Vec<Subscriber>>;

    /// Total number of subscriber records
    async fn count(&self) -> Result<i64>;
}

/// SQLx-based subscriber repository implementation
pub struct SqlxSubscriberRepository {
    pool: DynDatabasePool,
}

impl SqlxSubscriberRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn SubscriberRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl SubscriberRepository for SqlxSubscriberRepository {
    async fn create(&self, subscriber: &Subscriber) -> Result<Subscriber> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                create_subscriber_sqlite(self.pool.as_sqlite().unwrap(), subscriber).await
            }
            DatabaseDriver::Mysql => {
                create_subscriber_mysql(self.pool.as_mysql().unwrap(), subscriber).await
            }
        }
    }

    async fn get_by_email(&self, email: &str) -> Result<Option<Subscriber>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                get_by_email_sqlite(self.pool.as_sqlite().unwrap(), email).await
            }
            DatabaseDriver::Mysql => get_by_email_mysql(self.pool.as_mysql().unwrap(), email).await,
        }
    }

    async fn update(&self, subscriber: &Subscriber) -> Result<Subscriber> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                update_subscriber_sqlite(self.pool.as_sqlite().unwrap(), subscriber).await
            }
            DatabaseDriver::Mysql => {
                update_subscriber_mysql(self.pool.as_mysql().unwrap(), subscriber).await
            }
        }
    }

    async fn list(&self, limit: i64, offset: i64) -> Result<Vec<Subscriber>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                list_subscribers_sqlite(self.pool.as_sqlite().unwrap(), limit, offset).await
            }
            DatabaseDriver::Mysql => {
                list_subscribers_mysql(self.pool.as_mysql().unwrap(), limit, offset).await
            }
        }
    }

    async fn count(&self) -> Result<i64> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                let row = sqlx::query("SELECT COUNT(*) as cnt FROM subscribers")
                    .fetch_one(self.pool.as_sqlite().unwrap())
                    .await
                    .context("Failed to count subscribers")?;
                Ok(row.get("cnt"))
            }
            DatabaseDriver::Mysql => {
                let row = sqlx::query("SELECT COUNT(*) as cnt FROM subscribers")
                    .fetch_one(self.pool.as_mysql().unwrap())
                    .await
                    .context("Failed to count subscribers")?;
                Ok(row.get("cnt"))
            }
        }
    }
}

/// Translate a sqlx error into `DuplicateEmail` when it is a unique violation
fn map_insert_error(e: sqlx::Error) -> anyhow::Error {
    if let sqlx::Error::Database(ref db_err) = e {
        if db_err.is_unique_violation() {
            return anyhow!(DuplicateEmail);
        }
    }
    anyhow::Error::new(e).context("Failed to create subscriber")
}

const SELECT_COLUMNS: &str =
    "id, email, categories, source, status, subscribed_at, unsubscribed_at";

// ============================================================================
// SQLite implementations
// ============================================================================

async fn create_subscriber_sqlite(pool: &SqlitePool, sub: &Subscriber) -> Result<Subscriber> {
    let categories =
        serde_json::to_string(&sub.categories).context("Failed to encode categories")?;

    sqlx::query(
        r#"
        INSERT INTO subscribers (id, email, categories, source, status, subscribed_at, unsubscribed_at)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&sub.id)
    .bind(&sub.email)
    .bind(categories)
    .bind(&sub.source)
    .bind(sub.status.as_str())
    .bind(sub.subscribed_at)
    .bind(sub.unsubscribed_at)
    .execute(pool)
    .await
    .map_err(map_insert_error)?;

    Ok(sub.clone())
}

async fn get_by_email_sqlite(pool: &SqlitePool, email: &str) -> Result<Option<Subscriber>> {
    let row = sqlx::query(&format!(
        "SELECT {SELECT_COLUMNS} FROM subscribers WHERE email = ?"
    ))
    .bind(email)
    .fetch_optional(pool)
    .await
    .context("Failed to get subscriber by email")?;

    row.as_ref().map(row_to_subscriber_sqlite).transpose()
}

async fn update_subscriber_sqlite(pool: &SqlitePool, sub: &Subscriber) -> Result<Subscriber> {
    let categories =
        serde_json::to_string(&sub.categories).context("Failed to encode categories")?;

    sqlx::query(
        r#"
        UPDATE subscribers
        SET categories = ?, source = ?, status = ?, unsubscribed_at = ?
        WHERE id = ?
        "#,
    )
    .bind(categories)
    .bind(&sub.source)
    .bind(sub.status.as_str())
    .bind(sub.unsubscribed_at)
    .bind(&sub.id)
    .execute(pool)
    .await
    .context("Failed to update subscriber")?;

    Ok(sub.clone())
}

async fn list_subscribers_sqlite(
    pool: &SqlitePool,
    limit: i64,
    offset: i64,
) -> Result<Vec<Subscriber>> {
    let rows = sqlx::query(&format!(
        "SELECT {SELECT_COLUMNS} FROM subscribers ORDER BY subscribed_at DESC LIMIT ? OFFSET ?"
    ))
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await
    .context("Failed to list subscribers")?;

    rows.iter().map(row_to_subscriber_sqlite).collect()
}

fn row_to_subscriber_sqlite(row: &sqlx::sqlite::SqliteRow) -> Result<Subscriber> {
    let categories: String = row.get("categories");
    let status: String = row.get("status");

    Ok(Subscriber {
        id: row.get("id"),
        email: row.get("email"),
        categories: serde_json::from_str(&categories).unwrap_or_default(),
        source: row.get("source"),
        status: SubscriberStatus::parse(&status)
            .ok_or_else(|| anyhow!("Unknown subscriber status: {}", status))?,
        subscribed_at: row.get("subscribed_at"),
        unsubscribed_at: row.get("unsubscribed_at"),
    })
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn create_subscriber_mysql(pool: &MySqlPool, sub: &Subscriber) -> Result<Subscriber> {
    let categories =
        serde_json::to_string(&sub.categories).context("Failed to encode categories")?;

    sqlx::query(
        r#"
        INSERT INTO subscribers (id, email, categories, source, status, subscribed_at, unsubscribed_at)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&sub.id)
    .bind(&sub.email)
    .bind(categories)
    .bind(&sub.source)
    .bind(sub.status.as_str())
    .bind(sub.subscribed_at)
    .bind(sub.unsubscribed_at)
    .execute(pool)
    .await
    .map_err(map_insert_error)?;

    Ok(sub.clone())
}

async fn get_by_email_mysql(pool: &MySqlPool, email: &str) -> Result<Option<Subscriber>> {
    let row = sqlx::query(&format!(
        "SELECT {SELECT_COLUMNS} FROM subscribers WHERE email = ?"
    ))
    .bind(email)
    .fetch_optional(pool)
    .await
    .context("Failed to get subscriber by email")?;

    row.as_ref().map(row_to_subscriber_mysql).transpose()
}

async fn update_subscriber_mysql(pool: &MySqlPool, sub: &Subscriber) -> Result<Subscriber> {
    let categories =
        serde_json::to_string(&sub.categories).context("Failed to encode categories")?;

    sqlx::query(
        r#"
        UPDATE subscribers
        SET categories = ?, source = ?, status = ?, unsubscribed_at = ?
        WHERE id = ?
        "#,
    )
    .bind(categories)
    .bind(&sub.source)
    .bind(sub.status.as_str())
    .bind(sub.unsubscribed_at)
    .bind(&sub.id)
    .execute(pool)
    .await
    .context("Failed to update subscriber")?;

    Ok(sub.clone())
}

async fn list_subscribers_mysql(
    pool: &MySqlPool,
    limit: i64,
    offset: i64,
) -> Result<Vec<Subscriber>> {
    let rows = sqlx::query(&format!(
        "SELECT {SELECT_COLUMNS} FROM subscribers ORDER BY subscribed_at DESC LIMIT ? OFFSET ?"
    ))
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await
    .context("Failed to list subscribers")?;

    rows.iter().map(row_to_subscriber_mysql).collect()
}

fn row_to_subscriber_mysql(row: &sqlx::mysql::MySqlRow) -> Result<Subscriber> {
    let categories: String = row.get("categories");
    let status: String = row.get("status");
    let subscribed_at: DateTime<Utc> = row.get("subscribed_at");
    let unsubscribed_at: Option<DateTime<Utc>> = row.get("unsubscribed_at");

    Ok(Subscriber {
        id: row.get("id"),
        email: row.get("email"),
        categories: serde_json::from_str(&categories).unwrap_or_default(),
        source: row.get("source"),
        status: SubscriberStatus::parse(&status)
            .ok_or_else(|| anyhow!("Unknown subscriber status: {}", status))?,
        subscribed_at,
        unsubscribed_at,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_test_pool, migrations};

    async fn setup_test_repo() -> SqlxSubscriberRepository {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        SqlxSubscriberRepository::new(pool)
    }

    #[tokio::test]
    async fn test_create_and_get_by_email() {
        let repo = setup_test_repo().await;
        let sub = Subscriber::new(
            "reader@example.com",
            vec!["seismology".to_string()],
            Some("landing".to_string()),
        );

        repo.create(&sub).await.expect("Failed to create");

        let found = repo
            .get_by_email("reader@example.com")
            .await
            .expect("Failed to query")
            .expect("Subscriber not found");
        assert_eq!(found.id, sub.id);
        assert_eq!(found.categories, vec!["seismology".to_string()]);
        assert_eq!(found.source.as_deref(), Some("landing"));
    }

    #[tokio::test]
    async fn test_duplicate_email_maps_to_typed_error() {
        let repo = setup_test_repo().await;
        let first = Subscriber::new("dup@example.com", vec![], None);
        let second = Subscriber::new("dup@example.com", vec![], None);

        repo.create(&first).await.expect("First insert should succeed");
        let err = repo.create(&second).await.expect_err("Second insert should fail");
        assert!(err.downcast_ref::<DuplicateEmail>().is_some());
    }

    #[tokio::test]
    async fn test_update_deactivates() {
        let repo = setup_test_repo().await;
        let mut sub = Subscriber::new("reader@example.com", vec![], None);
        repo.create(&sub).await.expect("Failed to create");

        sub.status = SubscriberStatus::Inactive;
        sub.unsubscribed_at = Some(Utc::now());
        repo.update(&sub).await.expect("Failed to update");

        let found = repo
            .get_by_email("reader@example.com")
            .await
            .unwrap()
            .expect("Subscriber not found");
        assert_eq!(found.status, SubscriberStatus::Inactive);
        assert!(found.unsubscribed_at.is_some());
    }

    #[tokio::test]
    async fn test_list_and_count_paginate() {
        let repo = setup_test_repo().await;

        for i in 0..5 {
            let mut sub = Subscriber::new(format!("r{}@example.com", i), vec![], None);
            sub.subscribed_at = Utc::now() - chrono::Duration::minutes(i);
            repo.create(&sub).await.expect("Failed to create");
        }

        let total = repo.count().await.expect("Failed to count");
        assert_eq!(total, 5);

        let page = repo.list(2, 0).await.expect("Failed to list");
        assert_eq!(page.len(), 2);
        // newest first
        assert_eq!(page[0].email, "r0@example.com");

        let rest = repo.list(10, 4).await.expect("Failed to list");
        assert_eq!(rest.len(), 1);
    }
}
