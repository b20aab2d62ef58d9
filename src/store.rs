use std::str::FromStr;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use thiserror::Error;
use tokio::sync::OnceCell;
use tracing::info;
use uuid::Uuid;

use crate::models::{NewWebsite, Website};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("document store unavailable: {0}")]
    Unavailable(String),
    #[error("invalid website id: {0}")]
    InvalidId(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        StoreError::Unavailable(e.to_string())
    }
}

/// CRUD access to stored websites. A trait so handler tests can substitute
/// an in-memory double and count calls.
#[async_trait]
pub trait WebsiteStore: Send + Sync {
    /// Assigns an id and timestamps, returns the new id.
    async fn create(&self, site: NewWebsite) -> Result<String, StoreError>;
    /// `Ok(None)` on a well-formed id with no record; malformed ids are
    /// `InvalidId` so callers can tell bad input from absence.
    async fn get(&self, id: &str) -> Result<Option<Website>, StoreError>;
    /// Up to `limit` records, newest first.
    async fn list(&self, limit: i64) -> Result<Vec<Website>, StoreError>;
    /// `false` (not an error) when the id did not exist.
    async fn delete(&self, id: &str) -> Result<bool, StoreError>;
}

/// SQLite-backed store. The pool is created lazily on first use and reused
/// by every request thereafter; there is no teardown hook.
pub struct SqliteStore {
    url: String,
    pool: OnceCell<SqlitePool>,
}

impl SqliteStore {
    pub fn new(url: String) -> Self {
        Self { url, pool: OnceCell::new() }
    }

    async fn pool(&self) -> Result<&SqlitePool, StoreError> {
        self.pool
            .get_or_try_init(|| async {
                let opts = SqliteConnectOptions::from_str(&self.url)
                    .map_err(|e| StoreError::Unavailable(e.to_string()))?
                    .journal_mode(SqliteJournalMode::Wal)
                    .create_if_missing(true);
                let pool = SqlitePoolOptions::new()
                    .max_connections(5)
                    .connect_with(opts)
                    .await?;
                migrate(&pool).await?;
                info!("📦 Connected to website store");
                Ok(pool)
            })
            .await
    }
}

async fn migrate(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS websites (
            id TEXT PRIMARY KEY,
            title TEXT NOT NULL,
            description TEXT NOT NULL,
            prompt TEXT NOT NULL,
            website_type TEXT NOT NULL,
            html_code TEXT NOT NULL,
            css_code TEXT NOT NULL,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )",
    )
    .execute(pool)
    .await?;
    Ok(())
}

/// Canonicalizes a caller-supplied id, rejecting anything that is not a
/// UUID before it reaches the database.
fn parse_id(id: &str) -> Result<String, StoreError> {
    Uuid::parse_str(id)
        .map(|u| u.to_string())
        .map_err(|_| StoreError::InvalidId(id.to_string()))
}

#[async_trait]
impl WebsiteStore for SqliteStore {
    async fn create(&self, site: NewWebsite) -> Result<String, StoreError> {
        let pool = self.pool().await?;
        let id = Uuid::new_v4().to_string();
        let now = Utc::now();
        sqlx::query(
            "INSERT INTO websites
                (id, title, description, prompt, website_type, html_code, css_code, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(&site.title)
        .bind(&site.description)
        .bind(&site.prompt)
        .bind(&site.website_type)
        .bind(&site.html_code)
        .bind(&site.css_code)
        .bind(now)
        .bind(now)
        .execute(pool)
        .await?;
        Ok(id)
    }

    async fn get(&self, id: &str) -> Result<Option<Website>, StoreError> {
        let id = parse_id(id)?;
        let pool = self.pool().await?;
        Ok(sqlx::query_as("SELECT * FROM websites WHERE id = ?")
            .bind(id)
            .fetch_optional(pool)
            .await?)
    }

    async fn list(&self, limit: i64) -> Result<Vec<Website>, StoreError> {
        let pool = self.pool().await?;
        // rowid breaks created_at ties for records inserted in the same
        // instant.
        Ok(sqlx::query_as(
            "SELECT * FROM websites ORDER BY created_at DESC, rowid DESC LIMIT ?",
        )
        .bind(limit)
        .fetch_all(pool)
        .await?)
    }

    async fn delete(&self, id: &str) -> Result<bool, StoreError> {
        let id = parse_id(id)?;
        let pool = self.pool().await?;
        let result = sqlx::query("DELETE FROM websites WHERE id = ?")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    async fn memory_store() -> SqliteStore {
        // A single connection keeps every query on the same in-memory
        // database.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        migrate(&pool).await.unwrap();
        SqliteStore {
            url: "sqlite::memory:".into(),
            pool: OnceCell::new_with(Some(pool)),
        }
    }

    fn site(title: &str) -> NewWebsite {
        NewWebsite {
            title: title.to_string(),
            description: "a prompt".into(),
            prompt: "a prompt".into(),
            website_type: "general".into(),
            html_code: "<!DOCTYPE html><html></html>".into(),
            css_code: String::new(),
        }
    }

    #[tokio::test]
    async fn create_then_get_round_trips_the_record() {
        let store = memory_store().await;
        let id = store.create(site("first")).await.unwrap();
        let found = store.get(&id).await.unwrap().unwrap();
        assert_eq!(found.id, id);
        assert_eq!(found.title, "first");
        assert_eq!(found.website_type, "general");
        assert_eq!(found.created_at, found.updated_at);
    }

    #[tokio::test]
    async fn get_unknown_id_is_none_not_an_error() {
        let store = memory_store().await;
        let missing = Uuid::new_v4().to_string();
        assert!(store.get(&missing).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn malformed_id_is_rejected_before_the_query() {
        let store = memory_store().await;
        assert!(matches!(
            store.get("not-a-uuid").await,
            Err(StoreError::InvalidId(_))
        ));
        assert!(matches!(
            store.delete("12345").await,
            Err(StoreError::InvalidId(_))
        ));
    }

    #[tokio::test]
    async fn delete_reports_whether_a_record_existed() {
        let store = memory_store().await;
        let id = store.create(site("doomed")).await.unwrap();
        assert!(store.delete(&id).await.unwrap());
        assert!(store.get(&id).await.unwrap().is_none());
        assert!(!store.delete(&id).await.unwrap());
    }

    #[tokio::test]
    async fn list_returns_newest_first_up_to_the_limit() {
        let store = memory_store().await;
        for i in 1..=5 {
            store.create(site(&format!("site-{i}"))).await.unwrap();
        }
        let listed = store.list(2).await.unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].title, "site-5");
        assert_eq!(listed[1].title, "site-4");
    }
}
