use super::{insert_error, CREATE_NEWS_TABLE};
use crate::traits::HeadlineStore;
use crate::types::{DuplicatePolicy, NewsItem, Result, StoreOutcome};
use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::Row;
use std::str::FromStr;
use tracing::debug;

pub struct SqliteHeadlineStore {
    pool: SqlitePool,
}

impl SqliteHeadlineStore {
    /// Open a SQLite database, creating the file if needed.
    ///
    /// # Example URLs
    /// - `sqlite::memory:` - in-memory database (ephemeral)
    /// - `sqlite://news.db` - file-based database
    pub async fn new(database_url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);

        // Every connection to `:memory:` is a separate database, so keep exactly one alive.
        let pool = if is_in_memory(database_url) {
            SqlitePoolOptions::new()
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
                .connect_with(options)
                .await?
        } else {
            SqlitePoolOptions::new()
                .max_connections(5)
                .connect_with(options)
                .await?
        };

        Ok(Self { pool })
    }

    /// In-memory store with the schema already created.
    pub async fn in_memory() -> Result<Self> {
        let store = Self::new("sqlite::memory:").await?;
        store.init_schema().await?;
        Ok(store)
    }
}

fn is_in_memory(database_url: &str) -> bool {
    database_url.contains(":memory:") || database_url.contains("mode=memory")
}

#[async_trait]
impl HeadlineStore for SqliteHeadlineStore {
    fn backend(&self) -> &'static str {
        "sqlite"
    }

    async fn init_schema(&self) -> Result<()> {
        sqlx::query(CREATE_NEWS_TABLE).execute(&self.pool).await?;
        Ok(())
    }

    async fn store_item(&self, item: &NewsItem, policy: DuplicatePolicy) -> Result<StoreOutcome> {
        if policy == DuplicatePolicy::Reject {
            sqlx::query("INSERT INTO news (title, url) VALUES (?, ?)")
                .bind(&item.title)
                .bind(&item.url)
                .execute(&self.pool)
                .await
                .map_err(|e| insert_error(e, &item.title))?;
            return Ok(StoreOutcome::Inserted);
        }

        let inserted = sqlx::query("INSERT INTO news (title, url) VALUES (?, ?) ON CONFLICT (title) DO NOTHING")
            .bind(&item.title)
            .bind(&item.url)
            .execute(&self.pool)
            .await?
            .rows_affected();

        if inserted == 1 {
            return Ok(StoreOutcome::Inserted);
        }
        if policy == DuplicatePolicy::Skip {
            debug!(title = %item.title, "Headline already stored");
            return Ok(StoreOutcome::Skipped);
        }

        let updated = sqlx::query("UPDATE news SET url = ? WHERE title = ? AND url <> ?")
            .bind(&item.url)
            .bind(&item.title)
            .bind(&item.url)
            .execute(&self.pool)
            .await?
            .rows_affected();

        Ok(if updated == 1 { StoreOutcome::Updated } else { StoreOutcome::Skipped })
    }

    async fn get(&self, title: &str) -> Result<Option<NewsItem>> {
        let row = sqlx::query("SELECT title, url FROM news WHERE title = ?")
            .bind(title)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => Ok(Some(NewsItem {
                title: row.try_get("title")?,
                url: row.try_get("url")?,
            })),
            None => Ok(None),
        }
    }

    async fn count(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM news")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}
