use super::{insert_error, CREATE_NEWS_TABLE};
use crate::traits::HeadlineStore;
use crate::types::{DuplicatePolicy, NewsItem, Result, StoreOutcome};
use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::Row;
use tracing::debug;

pub struct PgHeadlineStore {
    db: PgPool,
}

impl PgHeadlineStore {
    pub async fn new(database_url: &str) -> Result<Self> {
        let db = PgPoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await?;

        Ok(Self { db })
    }

    pub fn from_pool(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl HeadlineStore for PgHeadlineStore {
    fn backend(&self) -> &'static str {
        "postgres"
    }

    async fn init_schema(&self) -> Result<()> {
        sqlx::query(CREATE_NEWS_TABLE).execute(&self.db).await?;
        Ok(())
    }

    async fn store_item(&self, item: &NewsItem, policy: DuplicatePolicy) -> Result<StoreOutcome> {
        if policy == DuplicatePolicy::Reject {
            sqlx::query("INSERT INTO news (title, url) VALUES ($1, $2)")
                .bind(&item.title)
                .bind(&item.url)
                .execute(&self.db)
                .await
                .map_err(|e| insert_error(e, &item.title))?;
            return Ok(StoreOutcome::Inserted);
        }

        let inserted = sqlx::query("INSERT INTO news (title, url) VALUES ($1, $2) ON CONFLICT (title) DO NOTHING")
            .bind(&item.title)
            .bind(&item.url)
            .execute(&self.db)
            .await?
            .rows_affected();

        if inserted == 1 {
            return Ok(StoreOutcome::Inserted);
        }
        if policy == DuplicatePolicy::Skip {
            debug!(title = %item.title, "Headline already stored");
            return Ok(StoreOutcome::Skipped);
        }

        let updated = sqlx::query("UPDATE news SET url = $2 WHERE title = $1 AND url <> $2")
            .bind(&item.title)
            .bind(&item.url)
            .execute(&self.db)
            .await?
            .rows_affected();

        Ok(if updated == 1 { StoreOutcome::Updated } else { StoreOutcome::Skipped })
    }

    async fn get(&self, title: &str) -> Result<Option<NewsItem>> {
        let row = sqlx::query("SELECT title, url FROM news WHERE title = $1")
            .bind(title)
            .fetch_optional(&self.db)
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
            .fetch_one(&self.db)
            .await?;
        Ok(count)
    }
}
