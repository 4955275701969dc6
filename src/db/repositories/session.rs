//! Admin session repository
//!
//! Database operations for admin bearer-token sessions.
//!
//! This module provides:
//! - `SessionRepository` trait defining the interface for session data access
//! - `SqlxSessionRepository` implementing the trait for SQLite and MySQL
//!
//! Sessions are created on login and read on every privileged call. They are
//! never deleted; expired rows simply fail verification.

use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use crate::models::AdminSession;
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{MySqlPool, Row, SqlitePool};
use std::sync::Arc;

/// Session repository trait
#[async_trait]
pub trait SessionRepository: Send + Sync {
    /// Persist a new session
    async fn create(&self, session: &AdminSession) -> Result<AdminSession>;

    /// Get session by token
    async fn get_by_token(&self, token: &str) -> Result<Option<AdminSession>>;
}

/// SQLx-based session repository implementation
pub struct SqlxSessionRepository {
    pool: DynDatabasePool,
}

impl SqlxSessionRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a shared repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn SessionRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl SessionRepository for SqlxSessionRepository {
    async fn create(&self, session: &AdminSession) -> Result<AdminSession> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                create_session_sqlite(self.pool.as_sqlite().unwrap(), session).await
            }
            DatabaseDriver::Mysql => {
                create_session_mysql(self.pool.as_mysql().unwrap(), session).await
            }
        }
    }

    async fn get_by_token(&self, token: &str) -> Result<Option<AdminSession>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                get_session_sqlite(self.pool.as_sqlite().unwrap(), token).await
            }
            DatabaseDriver::Mysql => get_session_mysql(self.pool.as_mysql().unwrap(), token).await,
        }
    }
}

// ============================================================================
// SQLite implementations
// ============================================================================

async fn create_session_sqlite(pool: &SqlitePool, session: &AdminSession) -> Result<AdminSession> {
    sqlx::query(
        r#"
        INSERT INTO admin_sessions (token, created_at, expires_at)
        VALUES (?, ?, ?)
        "#,
    )
    .bind(&session.token)
    .bind(session.created_at)
    .bind(session.expires_at)
    .execute(pool)
    .await
    .context("Failed to create admin session")?;

    Ok(session.clone())
}

async fn get_session_sqlite(pool: &SqlitePool, token: &str) -> Result<Option<AdminSession>> {
    let row = sqlx::query(
        r#"
        SELECT token, created_at, expires_at
        FROM admin_sessions
        WHERE token = ?
        "#,
    )
    .bind(token)
    .fetch_optional(pool)
    .await
    .context("Failed to get admin session by token")?;

    match row {
        Some(row) => Ok(Some(AdminSession {
            token: row.get("token"),
            created_at: row.get("created_at"),
            expires_at: row.get("expires_at"),
        })),
        None => Ok(None),
    }
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn create_session_mysql(pool: &MySqlPool, session: &AdminSession) -> Result<AdminSession> {
    sqlx::query(
        r#"
        INSERT INTO admin_sessions (token, created_at, expires_at)
        VALUES (?, ?, ?)
        "#,
    )
    .bind(&session.token)
    .bind(session.created_at)
    .bind(session.expires_at)
    .execute(pool)
    .await
    .context("Failed to create admin session")?;

    Ok(session.clone())
}

async fn get_session_mysql(pool: &MySqlPool, token: &str) -> Result<Option<AdminSession>> {
    let row = sqlx::query(
        r#"
        SELECT token, created_at, expires_at
        FROM admin_sessions
        WHERE token = ?
        "#,
    )
    .bind(token)
    .fetch_optional(pool)
    .await
    .context("Failed to get admin session by token")?;

    match row {
        Some(row) => {
            let created_at: DateTime<Utc> = row.get("created_at");
            let expires_at: DateTime<Utc> = row.get("expires_at");
            Ok(Some(AdminSession {
                token: row.get("token"),
                created_at,
                expires_at,
            }))
        }
        None => Ok(None),
    }
}
